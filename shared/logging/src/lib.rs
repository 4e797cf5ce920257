//! Structured logging for the fraud scoring platform
//!
//! Every stage of the pipeline (ingest, worker, notifier) reports through
//! [`logger::log_event`], which emits one JSON object per line carrying the
//! fixed schema the platform's log shippers expect.

pub mod logger;
pub mod tracing_setup;
pub mod correlation;

pub use logger::*;
pub use tracing_setup::*;
pub use correlation::*;

// Re-export external dependencies
pub use tracing::{debug, error, info, trace, warn, event, span, Level, Span};
pub use uuid::Uuid;
