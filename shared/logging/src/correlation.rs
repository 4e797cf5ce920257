//! Correlation id helpers
//!
//! The ingest gate assigns a fresh id unless the caller supplies one through
//! the replay test hook; this is the single place that decides between them.

use uuid::Uuid;

/// A server-assigned id, or the caller's own if they supplied one (used by
/// tests that need to replay a known id to exercise duplicate detection).
pub fn resolve_correlation_id(supplied: Option<String>) -> String {
    supplied.unwrap_or_else(|| Uuid::new_v4().to_string())
}
