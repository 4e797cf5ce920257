//! Structured event logging matching the platform's fixed log schema:
//! one JSON object per line carrying `timestamp, stage, component,
//! correlation_id, sender, receiver, amount, transaction_type, status,
//! alerts` plus any caller-supplied `extra` fields.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One pipeline log event, built incrementally then emitted via [`LogEvent::emit`].
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub stage: String,
    pub component: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LogEvent {
    pub fn new(stage: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            stage: stage.into(),
            component: component.into(),
            correlation_id: None,
            sender: None,
            receiver: None,
            amount: None,
            transaction_type: None,
            status: None,
            alerts: None,
            extra: Map::new(),
        }
    }

    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn receiver(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = Some(receiver.into());
        self
    }

    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn transaction_type(mut self, transaction_type: impl Into<String>) -> Self {
        self.transaction_type = Some(transaction_type.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn alerts(mut self, alerts: Vec<String>) -> Self {
        self.alerts = Some(alerts);
        self
    }

    pub fn extra(mut self, key: &str, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.extra.insert(key.to_string(), value);
        }
        self
    }

    /// Serialize to a single JSON line and emit it through `tracing` at the
    /// given level, so it still participates in env-filter routing.
    pub fn emit(mut self, level: LogLevel) {
        let level_str = match level {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        self.extra.insert("level".to_string(), Value::String(level_str.to_string()));

        let line = serde_json::to_string(&self).unwrap_or_else(|_| "{}".to_string());
        match level {
            LogLevel::Info => info!("{line}"),
            LogLevel::Warn => warn!("{line}"),
            LogLevel::Error => error!("{line}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_serializes_expected_fields() {
        let event = LogEvent::new("rule_eval", "worker")
            .correlation_id("abc-123")
            .sender("ACC1")
            .receiver("ACC2")
            .amount(1500.0)
            .transaction_type("payment")
            .status("alerted")
            .alerts(vec!["amount 1500 > 1000".to_string()]);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["stage"], "rule_eval");
        assert_eq!(json["component"], "worker");
        assert_eq!(json["correlation_id"], "abc-123");
        assert_eq!(json["amount"], 1500.0);
        assert_eq!(json["alerts"][0], "amount 1500 > 1000");
    }

    #[test]
    fn omits_unset_optional_fields() {
        let event = LogEvent::new("ingest", "gate");
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("correlation_id").is_none());
        assert!(json.get("amount").is_none());
    }
}
