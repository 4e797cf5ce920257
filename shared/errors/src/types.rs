//! Core error types for the fraud scoring platform

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Main error type shared across the ingest, rule, and worker layers
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum FraudScoreError {
    /// Submission failed validation before it reached the queue
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        code: String,
    },

    /// A rule or transaction lookup by id found nothing
    #[error("Resource not found: {resource_type} with ID {resource_id}")]
    NotFound {
        resource_type: String,
        resource_id: String,
        code: String,
    },

    /// A correlation id was already present in the queue
    #[error("Duplicate in queue: {correlation_id}")]
    DuplicateInQueue {
        correlation_id: String,
        code: String,
    },

    /// A correlation id was already present in the transaction store
    #[error("Duplicate in store: {correlation_id}")]
    DuplicateInStore {
        correlation_id: String,
        code: String,
    },

    /// The boolean expression for a composite rule failed to parse or reference a known sub-rule
    #[error("Rule parse error: {message}")]
    RuleParse { message: String, code: String },

    /// A rule's evaluation logic could not run to completion (e.g. an overflowing time window)
    #[error("Rule evaluation error: {message}")]
    RuleEvaluation {
        rule_id: String,
        message: String,
        code: String,
    },

    /// The transaction or rule store rejected a write
    #[error("Store error: {message}")]
    Store { message: String, code: String },

    /// Typed configuration failed to load or validate
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        key: Option<String>,
        code: String,
    },

    /// A notification transport call failed
    #[error("Notification transport error: {channel} - {message}")]
    NotifyTransport {
        channel: String,
        message: String,
        code: String,
    },

    /// Anything else that should not normally happen
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        source: Option<String>,
        code: String,
    },
}

impl FraudScoreError {
    /// Get the error code
    pub fn code(&self) -> &str {
        match self {
            Self::Validation { code, .. } => code,
            Self::NotFound { code, .. } => code,
            Self::DuplicateInQueue { code, .. } => code,
            Self::DuplicateInStore { code, .. } => code,
            Self::RuleParse { code, .. } => code,
            Self::RuleEvaluation { code, .. } => code,
            Self::Store { code, .. } => code,
            Self::Configuration { code, .. } => code,
            Self::NotifyTransport { code, .. } => code,
            Self::Internal { code, .. } => code,
        }
    }

    /// Is this a condition the ingest gate should report as a 409 rather than a 400/500?
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateInQueue { .. } | Self::DuplicateInStore { .. })
    }

    /// Is this a client error (bad input), as opposed to a server/environment fault?
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::NotFound { .. }
                | Self::DuplicateInQueue { .. }
                | Self::DuplicateInStore { .. }
        )
    }

    /// Is this worth retrying with backoff (transport-layer faults only)?
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotifyTransport { .. })
    }
}

/// Error context for additional debugging information, attached to log events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    pub request_id: Uuid,
    pub correlation_id: Option<String>,
    pub component: String,
    pub operation: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ErrorContext {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            correlation_id: None,
            component: component.to_string(),
            operation: operation.to_string(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Detailed error response with context, suitable for an admin-facing error surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: FraudScoreError,
    pub context: ErrorContext,
}

impl ErrorResponse {
    pub fn new(error: FraudScoreError, context: ErrorContext) -> Self {
        Self { error, context }
    }
}

/// Result type alias used throughout the platform
pub type Result<T> = std::result::Result<T, FraudScoreError>;

#[macro_export]
macro_rules! validation_error {
    ($message:expr) => {
        $crate::FraudScoreError::Validation {
            message: $message.to_string(),
            field: None,
            code: "VALIDATION_ERROR".to_string(),
        }
    };
    ($message:expr, $field:expr) => {
        $crate::FraudScoreError::Validation {
            message: $message.to_string(),
            field: Some($field.to_string()),
            code: "VALIDATION_ERROR".to_string(),
        }
    };
}

#[macro_export]
macro_rules! not_found_error {
    ($resource_type:expr, $resource_id:expr) => {
        $crate::FraudScoreError::NotFound {
            resource_type: $resource_type.to_string(),
            resource_id: $resource_id.to_string(),
            code: "RESOURCE_NOT_FOUND".to_string(),
        }
    };
}

#[macro_export]
macro_rules! internal_error {
    ($message:expr) => {
        $crate::FraudScoreError::Internal {
            message: $message.to_string(),
            source: None,
            code: "INTERNAL_ERROR".to_string(),
        }
    };
    ($message:expr, $source:expr) => {
        $crate::FraudScoreError::Internal {
            message: $message.to_string(),
            source: Some($source.to_string()),
            code: "INTERNAL_ERROR".to_string(),
        }
    };
}
