//! Common types and utilities shared across the fraud scoring platform

pub mod types;
pub mod utils;

pub use types::*;
pub use utils::*;

// Re-export external dependencies for consistency
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use uuid::Uuid;
pub use validator::Validate;
