//! Error handling for the fraud scoring platform
//!
//! Provides the shared [`FraudScoreError`] taxonomy used by the ingest gate,
//! rule engine, stores, and notifier, along with conversions from the
//! third-party error types those components hit at their edges.

pub mod types;
pub mod validation;
pub mod external;

pub use types::*;

// Re-export external dependencies for consistency
pub use anyhow::{anyhow, Context, Result as AnyhowResult};
pub use thiserror::Error;
