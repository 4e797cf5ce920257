//! Ingest Gate: validates submissions, assigns correlation ids, and rejects duplicates

use std::sync::Arc;

use fraudscore_errors::{validation::validators, FraudScoreError};
use fraudscore_logging::correlation::resolve_correlation_id;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;
use validator::Validate;

use crate::models::{Transaction, TransactionSubmission};
use crate::queue::FifoQueue;
use crate::store::TransactionStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestAck {
    pub status: String,
    pub correlation_id: String,
}

/// Validates a submission, assigns its correlation id, and admits it to the
/// store and queue in one critical section so a concurrent ingest can't slip
/// a matching id between the duplicate check and the enqueue.
pub struct IngestGate {
    store: Arc<dyn TransactionStore>,
    queue: Arc<FifoQueue>,
    critical_section: Mutex<()>,
}

impl IngestGate {
    pub fn new(store: Arc<dyn TransactionStore>, queue: Arc<FifoQueue>) -> Self {
        Self {
            store,
            queue,
            critical_section: Mutex::new(()),
        }
    }

    pub async fn submit(&self, submission: TransactionSubmission) -> Result<IngestAck, FraudScoreError> {
        submission.validate()?;
        validators::validate_not_empty(&submission.sender_account, "sender_account")?;
        validators::validate_not_empty(&submission.receiver_account, "receiver_account")?;
        validate_account_format(&submission.sender_account, "sender_account")?;
        validate_account_format(&submission.receiver_account, "receiver_account")?;

        let correlation_id = resolve_correlation_id(submission.correlation_id.clone());

        let _guard = self.critical_section.lock().await;

        // Queue membership is checked first: insert-at-ingest means a still-queued
        // id is always already in the store too, so checking the store first would
        // make `DuplicateInQueue` unreachable. A store hit with no queue hit means
        // the transaction was already dequeued and processed.
        if self.queue.contains(&correlation_id).await {
            return Err(FraudScoreError::DuplicateInQueue {
                correlation_id,
                code: "DUPLICATE_IN_QUEUE".to_string(),
            });
        }
        if self.store.exists(&correlation_id).await? {
            return Err(FraudScoreError::DuplicateInStore {
                correlation_id,
                code: "DUPLICATE_IN_STORE".to_string(),
            });
        }

        let tx = Transaction::from_submission(submission, correlation_id.clone());
        self.store.insert(tx.clone()).await?;
        self.queue.push(tx).await;

        info!(correlation_id = %correlation_id, "transaction queued");

        Ok(IngestAck {
            status: "queued".to_string(),
            correlation_id,
        })
    }
}

/// `[A-Z0-9]{5,34}` without pulling in a regex dependency for one shape check
fn validate_account_format(value: &str, field_name: &str) -> Result<(), FraudScoreError> {
    let len_ok = (5..=34).contains(&value.len());
    let chars_ok = value.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if len_ok && chars_ok {
        Ok(())
    } else {
        Err(FraudScoreError::Validation {
            message: format!("{field_name} must match [A-Z0-9]{{5,34}}"),
            field: Some(field_name.to_string()),
            code: "INVALID_VALUE".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use crate::store::InMemoryTransactionStore;

    fn submission(correlation_id: Option<String>) -> TransactionSubmission {
        TransactionSubmission {
            sender_account: "ACCT1".to_string(),
            receiver_account: "ACCT2".to_string(),
            amount: 100.0,
            transaction_type: TransactionType::Payment,
            correlation_id,
        }
    }

    fn gate() -> IngestGate {
        let store: Arc<dyn TransactionStore> = Arc::new(InMemoryTransactionStore::new());
        let queue = Arc::new(FifoQueue::new());
        IngestGate::new(store, queue)
    }

    #[tokio::test]
    async fn accepted_submissions_get_distinct_ids() {
        let gate = gate();
        let a = gate.submit(submission(None)).await.unwrap();
        let b = gate.submit(submission(None)).await.unwrap();
        assert_ne!(a.correlation_id, b.correlation_id);
    }

    #[tokio::test]
    async fn replaying_a_queued_id_is_rejected_as_duplicate_in_queue() {
        let gate = gate();
        let first = gate.submit(submission(None)).await.unwrap();
        let err = gate
            .submit(submission(Some(first.correlation_id)))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn invalid_amount_is_rejected() {
        let gate = gate();
        let mut bad = submission(None);
        bad.amount = -5.0;
        let err = gate.submit(bad).await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn malformed_account_is_rejected() {
        let gate = gate();
        let mut bad = submission(None);
        bad.sender_account = "ab".to_string();
        let err = gate.submit(bad).await.unwrap_err();
        assert!(matches!(err, FraudScoreError::Validation { .. }));
    }
}
