//! Validation error handling utilities

use validator::ValidationErrors;

use crate::types::FraudScoreError;

/// Convert validator::ValidationErrors to FraudScoreError
impl From<ValidationErrors> for FraudScoreError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages = Vec::new();
        let mut first_field = None;

        for (field, field_errors) in errors.field_errors() {
            if first_field.is_none() {
                first_field = Some(field.to_string());
            }
            for error in field_errors {
                messages.push(
                    error
                        .message
                        .as_ref()
                        .map(|msg| msg.to_string())
                        .unwrap_or_else(|| format!("invalid value for field '{}'", field)),
                );
            }
        }

        FraudScoreError::Validation {
            message: if messages.len() == 1 {
                messages[0].clone()
            } else {
                format!("multiple validation errors: {}", messages.join(", "))
            },
            field: if errors.field_errors().len() == 1 {
                first_field
            } else {
                None
            },
            code: "VALIDATION_ERROR".to_string(),
        }
    }
}

/// Hand-rolled checks for request fields that `validator` attributes can't express
/// (cross-field and business-rule checks used by the ingest gate)
pub mod validators {
    use super::*;

    pub fn validate_not_empty(value: &str, field_name: &str) -> Result<(), FraudScoreError> {
        if value.trim().is_empty() {
            Err(FraudScoreError::Validation {
                message: format!("{} cannot be empty", field_name),
                field: Some(field_name.to_string()),
                code: "FIELD_REQUIRED".to_string(),
            })
        } else {
            Ok(())
        }
    }

    pub fn validate_in_list<T>(
        value: &T,
        field_name: &str,
        allowed_values: &[T],
    ) -> Result<(), FraudScoreError>
    where
        T: PartialEq + std::fmt::Display,
    {
        if allowed_values.contains(value) {
            Ok(())
        } else {
            Err(FraudScoreError::Validation {
                message: format!("{} must be one of the allowed values", field_name),
                field: Some(field_name.to_string()),
                code: "INVALID_VALUE".to_string(),
            })
        }
    }
}
