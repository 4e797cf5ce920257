//! History Provider: a read-only, point-in-time snapshot of prior transactions

use std::sync::Arc;

use async_trait::async_trait;
use fraudscore_errors::FraudScoreError;

use crate::models::Transaction;
use crate::store::TransactionStore;

/// Supplies the snapshot the Rule Evaluator filters by sender and time
/// window. Sender/time filtering is deliberately left to the evaluator (see
/// `rules::evaluator`); this component's only job is a consistent read.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn snapshot(&self) -> Result<Vec<Transaction>, FraudScoreError>;
}

/// Backed directly by the transaction store. Because `list_all` takes the
/// store's read lock for the whole copy, the returned snapshot is consistent
/// under concurrent writes from the worker.
///
/// A real index on `(sender_account, timestamp)` would let this component
/// narrow the scan before handing data to the evaluator; the in-memory store
/// here does a linear scan instead, annotated at the evaluator call site.
pub struct StoreBackedHistory {
    store: Arc<dyn TransactionStore>,
}

impl StoreBackedHistory {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HistoryProvider for StoreBackedHistory {
    async fn snapshot(&self) -> Result<Vec<Transaction>, FraudScoreError> {
        self.store.list_all().await
    }
}
