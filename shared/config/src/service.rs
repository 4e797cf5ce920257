//! Fraud scoring service configuration

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Service-specific configuration for the fraud scoring pipeline
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FraudScoreServiceConfig {
    #[validate(range(min = 1024, max = 65535))]
    pub port: u16,

    #[validate(range(min = 1024, max = 65535))]
    pub metrics_port: u16,

    /// How often the worker polls the queue when it finds it empty
    #[validate(range(min = 1, max = 60000))]
    pub poll_interval_ms: u64,

    /// Default `threshold` used by the `ml` rule when a rule omits its own
    #[validate(range(min = 0.0, max = 1.0))]
    pub default_ml_threshold: f64,
}

impl Default for FraudScoreServiceConfig {
    fn default() -> Self {
        Self {
            port: 8084,
            metrics_port: 9094,
            poll_interval_ms: 100,
            default_ml_threshold: 0.8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_service_config() {
        let config = FraudScoreServiceConfig::default();
        assert_eq!(config.port, 8084);
        assert_eq!(config.poll_interval_ms, 100);
    }
}
