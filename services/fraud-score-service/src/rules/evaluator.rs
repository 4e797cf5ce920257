//! Rule evaluation: given a rule, a transaction, and a history snapshot,
//! decide whether the rule fires and produce its reason string.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::models::{
    AggregateStatistic, CompositeSpec, MlSpec, PatternKind, PatternSpec, Rule, RuleSpec,
    ThresholdSpec, Transaction,
};

use super::expr::evaluate_expression;

/// The one realistic evaluation failure: an admin-supplied time window too
/// large to turn into a `chrono::Duration`, or a composite expression that
/// fails to parse or reference a known sub-rule.
#[derive(Debug, Error, Clone)]
pub enum RuleEvalError {
    #[error("time window of {minutes} minutes is out of range")]
    InvalidTimeWindow { minutes: i64 },

    #[error("{0}")]
    ExpressionError(String),
}

/// Evaluate one rule against a transaction and its history snapshot.
///
/// Composite rules never propagate a sub-rule fault: any `Err` raised while
/// evaluating a sub-rule is folded into a `(false, "Composite rule error: ...")`
/// result, so only a composite's own malformed setup can still bubble an `Err`
/// out of this function for the caller (the worker) to isolate.
pub fn evaluate(
    rule: &Rule,
    tx: &Transaction,
    history: &[Transaction],
) -> Result<(bool, String), RuleEvalError> {
    evaluate_spec(&rule.spec, tx, history)
}

fn evaluate_spec(
    spec: &RuleSpec,
    tx: &Transaction,
    history: &[Transaction],
) -> Result<(bool, String), RuleEvalError> {
    match spec {
        RuleSpec::Threshold(t) => Ok(eval_threshold(t, tx)),
        RuleSpec::Pattern(p) => eval_pattern(p, tx, history),
        RuleSpec::Ml(m) => Ok(eval_ml(m, tx)),
        RuleSpec::Composite(c) => Ok(eval_composite(c, tx, history)),
    }
}

fn field_value(tx: &Transaction, field: &str) -> f64 {
    match field {
        "amount" => tx.amount,
        _ => 0.0,
    }
}

/// Numbers that happen to be whole print without a decimal point (as a
/// hand-typed rule value would); the transaction amount always carries one,
/// mirroring the source data's float/int distinction.
fn format_natural(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn eval_threshold(spec: &ThresholdSpec, tx: &Transaction) -> (bool, String) {
    let v = field_value(tx, &spec.field);
    let fired = spec.operator.apply(v, spec.value);
    let reason = format!(
        "{} {:?} {} {}",
        spec.field,
        v,
        spec.operator.as_str(),
        format_natural(spec.value)
    );
    (fired, reason)
}

fn eval_ml(spec: &MlSpec, tx: &Transaction) -> (bool, String) {
    let score = (tx.amount / 200_000.0).min(1.0);
    let fired = score > spec.threshold;
    (fired, format!("ML probability {score:.2} > {}", spec.threshold))
}

fn checked_cutoff(reference: DateTime<Utc>, minutes: i64) -> Result<DateTime<Utc>, RuleEvalError> {
    let duration = Duration::try_minutes(minutes)
        .ok_or(RuleEvalError::InvalidTimeWindow { minutes })?;
    reference
        .checked_sub_signed(duration)
        .ok_or(RuleEvalError::InvalidTimeWindow { minutes })
}

/// Excludes `tx` itself: `history` is a snapshot taken after insert-at-ingest
/// already persisted `tx`, so without this it would always count against itself.
fn recent_for_sender<'a>(
    history: &'a [Transaction],
    tx: &Transaction,
    cutoff: DateTime<Utc>,
) -> Vec<&'a Transaction> {
    history
        .iter()
        .filter(|t| {
            t.sender_account == tx.sender_account
                && t.correlation_id != tx.correlation_id
                && t.timestamp > cutoff
        })
        .collect()
}

fn eval_pattern(
    spec: &PatternSpec,
    tx: &Transaction,
    history: &[Transaction],
) -> Result<(bool, String), RuleEvalError> {
    let cutoff = checked_cutoff(tx.timestamp, spec.minutes)?;
    let recent = recent_for_sender(history, tx, cutoff);

    // Basic count check always takes precedence over pattern_type dispatch.
    if recent.len() >= spec.count {
        return Ok((
            true,
            format!("{} tx in last {} min", recent.len(), spec.minutes),
        ));
    }

    match &spec.kind {
        None => Ok((false, format!("{} tx in last {} min", recent.len(), spec.minutes))),
        Some(kind) => eval_pattern_kind(kind, spec, tx, history, &recent),
    }
}

fn eval_pattern_kind(
    kind: &PatternKind,
    spec: &PatternSpec,
    tx: &Transaction,
    history: &[Transaction],
    basic_recent: &[&Transaction],
) -> Result<(bool, String), RuleEvalError> {
    match kind {
        PatternKind::Series {
            series_window_minutes,
            max_interval_minutes,
            min_series_count,
        } => {
            let cutoff = checked_cutoff(tx.timestamp, *series_window_minutes)?;
            let mut recent = recent_for_sender(history, tx, cutoff);
            recent.sort_by_key(|t| t.timestamp);

            let max_gap = Duration::try_minutes(*max_interval_minutes)
                .ok_or(RuleEvalError::InvalidTimeWindow {
                    minutes: *max_interval_minutes,
                })?;

            let mut best_run = if recent.is_empty() { 0 } else { 1 };
            let mut current_run = best_run;
            for window in recent.windows(2) {
                let gap = window[1].timestamp - window[0].timestamp;
                if gap <= max_gap {
                    current_run += 1;
                } else {
                    current_run = 1;
                }
                best_run = best_run.max(current_run);
            }

            let fired = best_run >= *min_series_count;
            Ok((
                fired,
                format!("series run of {best_run} within {max_interval_minutes} min intervals"),
            ))
        }

        PatternKind::Aggregates {
            window_minutes,
            min_count,
            statistic,
            amount_threshold,
        } => {
            let cutoff = checked_cutoff(tx.timestamp, *window_minutes)?;
            let recent = recent_for_sender(history, tx, cutoff);
            if recent.len() < *min_count {
                return Ok((false, format!("{} tx in last {window_minutes} min", recent.len())));
            }
            let mut amounts: Vec<f64> = recent.iter().map(|t| t.amount).collect();
            let (stat_name, value) = match statistic {
                AggregateStatistic::Sum => ("sum", amounts.iter().sum()),
                AggregateStatistic::Avg => {
                    ("avg", amounts.iter().sum::<f64>() / amounts.len() as f64)
                }
                AggregateStatistic::Median => {
                    amounts.sort_by(|a, b| a.partial_cmp(b).unwrap());
                    let mid = amounts.len() / 2;
                    let median = if amounts.len() % 2 == 0 {
                        (amounts[mid - 1] + amounts[mid]) / 2.0
                    } else {
                        amounts[mid]
                    };
                    ("median", median)
                }
            };
            let fired = value > *amount_threshold;
            Ok((
                fired,
                format!("{stat_name} {value:.2} > {amount_threshold}"),
            ))
        }

        PatternKind::MicroTransactions {
            max_amount,
            min_count,
            min_total,
        } => {
            let micro: Vec<&&Transaction> = basic_recent
                .iter()
                .filter(|t| t.amount <= *max_amount)
                .collect();
            let total: f64 = micro.iter().map(|t| t.amount).sum();
            let fired = micro.len() >= *min_count && total >= *min_total;
            Ok((
                fired,
                format!(
                    "{} micro-transactions totaling {total:.2} >= {min_total}",
                    micro.len()
                ),
            ))
        }

        PatternKind::Burst {
            burst_window_minutes,
            burst_threshold,
            normal_window_minutes,
            normal_multiplier,
        } => {
            let burst_cutoff = checked_cutoff(tx.timestamp, *burst_window_minutes)?;
            let normal_cutoff = checked_cutoff(tx.timestamp, *normal_window_minutes)?;
            let burst_count = recent_for_sender(history, tx, burst_cutoff).len();
            let preceding_count = history
                .iter()
                .filter(|t| {
                    t.sender_account == tx.sender_account
                        && t.correlation_id != tx.correlation_id
                        && t.timestamp > normal_cutoff
                        && t.timestamp <= burst_cutoff
                })
                .count();

            let preceding_minutes = (normal_window_minutes - burst_window_minutes).max(1) as f64;
            let burst_rate = burst_count as f64 / (*burst_window_minutes).max(1) as f64;
            let preceding_rate = preceding_count as f64 / preceding_minutes;

            let fired = burst_count >= *burst_threshold
                && burst_rate > preceding_rate * normal_multiplier;
            Ok((
                fired,
                format!(
                    "burst of {burst_count} in {burst_window_minutes} min (rate {burst_rate:.2} vs baseline {preceding_rate:.2})"
                ),
            ))
        }

        PatternKind::RoundAmounts {
            round_threshold,
            min_count,
        } => {
            let round_count = basic_recent
                .iter()
                .filter(|t| trailing_zero_fraction(t.amount) >= *round_threshold)
                .count();
            let fired = round_count >= *min_count;
            Ok((
                fired,
                format!("{round_count} round-amount tx >= threshold {round_threshold}"),
            ))
        }
    }
}

fn trailing_zero_fraction(amount: f64) -> f64 {
    let floor = amount.abs().floor() as i64;
    let digits = floor.to_string();
    if digits == "0" {
        return 1.0;
    }
    let trailing = digits.chars().rev().take_while(|&c| c == '0').count();
    trailing as f64 / digits.len() as f64
}

fn eval_composite(spec: &CompositeSpec, tx: &Transaction, history: &[Transaction]) -> (bool, String) {
    match &spec.expression {
        Some(expression) => {
            let mut resolve = |name: &str| -> Result<(bool, String), RuleEvalError> {
                let named = spec
                    .rules
                    .iter()
                    .find(|r| r.name == name)
                    .ok_or_else(|| RuleEvalError::ExpressionError(format!("unknown sub-rule '{name}'")))?;
                evaluate_spec(&named.spec, tx, history)
                    .map_err(|e| RuleEvalError::ExpressionError(e.to_string()))
            };
            match evaluate_expression(expression, &mut resolve) {
                Ok(result) => result,
                Err(e) => (false, format!("Composite rule error: {e}")),
            }
        }
        None => {
            let (threshold_spec, pattern_spec) =
                match (&spec.fallback_threshold, &spec.fallback_pattern) {
                    (Some(t), Some(p)) => (t, p),
                    _ => {
                        return (
                            false,
                            "Composite rule error: no expression and no fallback threshold/pattern configured".to_string(),
                        )
                    }
                };

            let threshold_result = evaluate_spec(threshold_spec, tx, history);
            let pattern_result = evaluate_spec(pattern_spec, tx, history);

            match (threshold_result, pattern_result) {
                (Ok(t), Ok(p)) => (
                    t.0 && p.0,
                    format!("Composite Alert: {} + {}", t.1, p.1),
                ),
                (Err(e), _) | (_, Err(e)) => (false, format!("Composite rule error: {e}")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Operator, TransactionType};
    use chrono::Duration as ChronoDuration;

    fn tx(amount: f64) -> Transaction {
        Transaction {
            correlation_id: uuid::Uuid::new_v4().to_string(),
            sender_account: "A".to_string(),
            receiver_account: "B".to_string(),
            amount,
            transaction_type: TransactionType::Payment,
            timestamp: Utc::now(),
            status: crate::models::TransactionStatus::Queued,
            alerts: Vec::new(),
        }
    }

    fn rule(spec: RuleSpec) -> Rule {
        Rule {
            id: uuid::Uuid::new_v4(),
            name: "r".to_string(),
            enabled: true,
            spec,
        }
    }

    #[test]
    fn threshold_fires_above_value() {
        let r = rule(RuleSpec::Threshold(ThresholdSpec {
            field: "amount".to_string(),
            operator: Operator::Gt,
            value: 1000.0,
        }));
        let (fired, reason) = evaluate(&r, &tx(1500.0), &[]).unwrap();
        assert!(fired);
        assert_eq!(reason, "amount 1500.0 > 1000");
    }

    #[test]
    fn threshold_misses_below_value() {
        let r = rule(RuleSpec::Threshold(ThresholdSpec {
            field: "amount".to_string(),
            operator: Operator::Gt,
            value: 1000.0,
        }));
        let (fired, _) = evaluate(&r, &tx(500.0), &[]).unwrap();
        assert!(!fired);
    }

    #[test]
    fn pattern_basic_count_fires() {
        let current = tx(10.0);
        let mut history = Vec::new();
        for _ in 0..3 {
            let mut h = tx(10.0);
            h.timestamp = current.timestamp - ChronoDuration::minutes(1);
            history.push(h);
        }
        let r = rule(RuleSpec::Pattern(PatternSpec {
            count: 3,
            minutes: 5,
            kind: None,
        }));
        let (fired, reason) = evaluate(&r, &current, &history).unwrap();
        assert!(fired);
        assert!(reason.contains("3 tx in last 5 min"));
    }

    #[test]
    fn composite_expression_combines_sub_rules() {
        let t1 = RuleSpec::Threshold(ThresholdSpec {
            field: "amount".to_string(),
            operator: Operator::Gt,
            value: 1000.0,
        });
        let p1 = RuleSpec::Pattern(PatternSpec {
            count: 99,
            minutes: 5,
            kind: None,
        });
        let p2 = p1.clone();

        let composite = RuleSpec::Composite(CompositeSpec {
            expression: Some("t1 AND (p1 OR NOT p2)".to_string()),
            rules: vec![
                crate::models::NamedRuleSpec {
                    name: "t1".to_string(),
                    spec: t1,
                },
                crate::models::NamedRuleSpec {
                    name: "p1".to_string(),
                    spec: p1,
                },
                crate::models::NamedRuleSpec {
                    name: "p2".to_string(),
                    spec: p2,
                },
            ],
            fallback_threshold: None,
            fallback_pattern: None,
        });

        let r = rule(composite);
        let (fired, _) = evaluate(&r, &tx(1500.0), &[]).unwrap();
        assert!(fired);
    }

    #[test]
    fn composite_sub_rule_fault_is_isolated() {
        let broken_expression = RuleSpec::Composite(CompositeSpec {
            expression: Some("nonexistent".to_string()),
            rules: vec![],
            fallback_threshold: None,
            fallback_pattern: None,
        });
        let r = rule(broken_expression);
        let (fired, reason) = evaluate(&r, &tx(10.0), &[]).unwrap();
        assert!(!fired);
        assert!(reason.starts_with("Composite rule error:"));
    }

    #[test]
    fn pattern_with_overflowing_window_reports_invalid_time_window() {
        let r = rule(RuleSpec::Pattern(PatternSpec {
            count: 1,
            minutes: i64::MAX,
            kind: None,
        }));
        let result = evaluate(&r, &tx(10.0), &[]);
        assert!(matches!(result, Err(RuleEvalError::InvalidTimeWindow { .. })));
    }
}
