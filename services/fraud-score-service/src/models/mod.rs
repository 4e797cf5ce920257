//! Core data model: transactions, rules, and rule specifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Kind of financial movement a submitted transaction represents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Payment,
    Withdrawal,
    Transfer,
    Deposit,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Payment => "payment",
            Self::Withdrawal => "withdrawal",
            Self::Transfer => "transfer",
            Self::Deposit => "deposit",
        };
        write!(f, "{s}")
    }
}

/// Lifecycle state of a persisted transaction. Transitions only
/// `Queued -> Processed` or `Queued -> Alerted`; never reverses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Queued,
    Processed,
    Alerted,
}

/// Raw client submission, validated by the ingest gate before it becomes a [`Transaction`]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransactionSubmission {
    #[validate(length(min = 1, max = 64))]
    pub sender_account: String,

    #[validate(length(min = 1, max = 64))]
    pub receiver_account: String,

    #[validate(range(min = 0.000001))]
    pub amount: f64,

    pub transaction_type: TransactionType,

    /// Test hook: replay a previously-seen id to exercise duplicate detection.
    /// Absent in normal client traffic, where the gate assigns a fresh one.
    pub correlation_id: Option<String>,
}

/// A transaction as tracked through ingest, evaluation, and persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub correlation_id: String,
    pub sender_account: String,
    pub receiver_account: String,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub timestamp: DateTime<Utc>,
    pub status: TransactionStatus,
    pub alerts: Vec<String>,
}

impl Transaction {
    pub fn from_submission(submission: TransactionSubmission, correlation_id: String) -> Self {
        Self {
            correlation_id,
            sender_account: submission.sender_account,
            receiver_account: submission.receiver_account,
            amount: submission.amount,
            transaction_type: submission.transaction_type,
            timestamp: Utc::now(),
            status: TransactionStatus::Queued,
            alerts: Vec::new(),
        }
    }

    /// `alerts` joined in firing order, the form persisted in the store
    pub fn alerts_joined(&self) -> String {
        self.alerts.join("; ")
    }
}

/// A rule definition as exposed to administrators: a name, a type, and a single
/// numeric knob. The richer per-type configuration lives in [`RuleSpec`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Threshold,
    Pattern,
    Composite,
    Ml,
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Threshold => "threshold",
            Self::Pattern => "pattern",
            Self::Composite => "composite",
            Self::Ml => "ml",
        };
        write!(f, "{s}")
    }
}

/// Comparison operator for a threshold rule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Operator {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Ne,
}

impl Operator {
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Gt => lhs > rhs,
            Self::Gte => lhs >= rhs,
            Self::Lt => lhs < rhs,
            Self::Lte => lhs <= rhs,
            Self::Eq => (lhs - rhs).abs() < f64::EPSILON,
            Self::Ne => (lhs - rhs).abs() >= f64::EPSILON,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Eq => "==",
            Self::Ne => "!=",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdSpec {
    pub field: String,
    pub operator: Operator,
    pub value: f64,
}

impl Default for ThresholdSpec {
    fn default() -> Self {
        Self {
            field: "amount".to_string(),
            operator: Operator::Gt,
            value: 100_000.0,
        }
    }
}

/// Which extended statistic a `pattern` rule checks, beyond the basic
/// "N in T minutes" count that always takes precedence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "pattern_type", rename_all = "snake_case")]
pub enum PatternKind {
    Series {
        series_window_minutes: i64,
        max_interval_minutes: i64,
        min_series_count: usize,
    },
    Aggregates {
        window_minutes: i64,
        min_count: usize,
        statistic: AggregateStatistic,
        amount_threshold: f64,
    },
    MicroTransactions {
        max_amount: f64,
        min_count: usize,
        min_total: f64,
    },
    Burst {
        burst_window_minutes: i64,
        burst_threshold: usize,
        normal_window_minutes: i64,
        normal_multiplier: f64,
    },
    RoundAmounts {
        round_threshold: f64,
        min_count: usize,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateStatistic {
    Sum,
    Avg,
    Median,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSpec {
    /// Minimum count of prior transactions from the same sender within `minutes`
    pub count: usize,
    pub minutes: i64,
    /// Extended dispatch, evaluated only once the basic count check misses
    pub kind: Option<PatternKind>,
}

impl Default for PatternSpec {
    fn default() -> Self {
        Self {
            count: 3,
            minutes: 5,
            kind: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlSpec {
    pub threshold: f64,
}

impl Default for MlSpec {
    fn default() -> Self {
        Self { threshold: 0.8 }
    }
}

/// A named sub-rule referenced from a composite's boolean expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedRuleSpec {
    pub name: String,
    pub spec: RuleSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeSpec {
    /// Expression mode: a boolean expression over `rules`' names
    pub expression: Option<String>,
    pub rules: Vec<NamedRuleSpec>,
    /// Fallback mode: AND of exactly these two when `expression` is absent
    pub fallback_threshold: Option<Box<RuleSpec>>,
    pub fallback_pattern: Option<Box<RuleSpec>>,
}

impl Default for CompositeSpec {
    fn default() -> Self {
        Self {
            expression: None,
            rules: Vec::new(),
            fallback_threshold: None,
            fallback_pattern: None,
        }
    }
}

/// The parsed, tagged-variant form of a rule's configuration. Produced once
/// when a rule enters the store rather than re-parsed on every evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "rule_type", rename_all = "lowercase")]
pub enum RuleSpec {
    Threshold(ThresholdSpec),
    Pattern(PatternSpec),
    Composite(CompositeSpec),
    Ml(MlSpec),
}

impl RuleSpec {
    pub fn rule_type(&self) -> RuleType {
        match self {
            Self::Threshold(_) => RuleType::Threshold,
            Self::Pattern(_) => RuleType::Pattern,
            Self::Composite(_) => RuleType::Composite,
            Self::Ml(_) => RuleType::Ml,
        }
    }

    /// Build the spec the minimal admin CRUD surface can express: a single
    /// numeric knob interpreted per rule type.
    pub fn from_single_value(rule_type: RuleType, value: f64) -> Self {
        match rule_type {
            RuleType::Threshold => RuleSpec::Threshold(ThresholdSpec {
                field: "amount".to_string(),
                operator: Operator::Gt,
                value,
            }),
            RuleType::Pattern => RuleSpec::Pattern(PatternSpec {
                count: value.max(0.0) as usize,
                minutes: 5,
                kind: None,
            }),
            RuleType::Ml => RuleSpec::Ml(MlSpec { threshold: value }),
            RuleType::Composite => RuleSpec::Composite(CompositeSpec::default()),
        }
    }
}

/// A rule as stored and offered to the evaluator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: Uuid,
    pub name: String,
    pub enabled: bool,
    pub spec: RuleSpec,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Create,
    Update,
    Delete,
}

/// Append-only audit record of a rule mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleHistory {
    pub id: Uuid,
    pub rule_id: Uuid,
    pub action: RuleAction,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub changed_by: String,
    pub timestamp: DateTime<Utc>,
}

impl RuleHistory {
    pub fn new(
        rule_id: Uuid,
        action: RuleAction,
        old_values: Option<serde_json::Value>,
        new_values: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            rule_id,
            action,
            old_values,
            new_values,
            changed_by: "admin".to_string(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_single_value_builds_threshold_spec() {
        let spec = RuleSpec::from_single_value(RuleType::Threshold, 1000.0);
        match spec {
            RuleSpec::Threshold(t) => {
                assert_eq!(t.operator.as_str(), ">");
                assert_eq!(t.value, 1000.0);
            }
            _ => panic!("expected threshold spec"),
        }
    }

    #[test]
    fn transaction_alerts_joined_uses_semicolons() {
        let mut tx = Transaction::from_submission(
            TransactionSubmission {
                sender_account: "A".to_string(),
                receiver_account: "B".to_string(),
                amount: 10.0,
                transaction_type: TransactionType::Payment,
                correlation_id: None,
            },
            "id-1".to_string(),
        );
        tx.alerts.push("reason one".to_string());
        tx.alerts.push("reason two".to_string());
        assert_eq!(tx.alerts_joined(), "reason one; reason two");
    }
}
