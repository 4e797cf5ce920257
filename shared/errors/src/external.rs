//! Conversions from transport-layer errors into the platform error type

use crate::types::FraudScoreError;

/// Convert reqwest errors into a notify-transport error, the only outbound HTTP
/// call surface this crate has (the chat and mail notifier transports).
impl From<reqwest::Error> for FraudScoreError {
    fn from(error: reqwest::Error) -> Self {
        let channel = error
            .url()
            .map(|u| u.host_str().unwrap_or("unknown").to_string())
            .unwrap_or_else(|| "unknown".to_string());

        if error.is_timeout() {
            FraudScoreError::NotifyTransport {
                channel,
                message: "request timed out".to_string(),
                code: "NOTIFY_TIMEOUT".to_string(),
            }
        } else if error.is_connect() {
            FraudScoreError::NotifyTransport {
                channel,
                message: format!("connection error: {}", error),
                code: "NOTIFY_CONNECTION_ERROR".to_string(),
            }
        } else if let Some(status) = error.status() {
            FraudScoreError::NotifyTransport {
                channel,
                message: format!("transport returned status {}", status.as_u16()),
                code: "NOTIFY_HTTP_ERROR".to_string(),
            }
        } else {
            FraudScoreError::NotifyTransport {
                channel,
                message: error.to_string(),
                code: "NOTIFY_UNKNOWN_ERROR".to_string(),
            }
        }
    }
}

/// Convert serde_json errors into the internal variant; at-rest `params` and
/// `old_values`/`new_values` audit columns round-trip through JSON.
impl From<serde_json::Error> for FraudScoreError {
    fn from(error: serde_json::Error) -> Self {
        FraudScoreError::Internal {
            message: format!("JSON error: {}", error),
            source: Some("serde_json".to_string()),
            code: "JSON_ERROR".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_error_maps_to_internal() {
        let bad: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: FraudScoreError = bad.unwrap_err().into();
        assert_eq!(err.code(), "JSON_ERROR");
    }
}
