//! Transaction Store: durable (in-memory) record of submitted transactions

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fraudscore_common::{PaginatedResponse, PaginationParams, SortOrder};
use fraudscore_errors::FraudScoreError;
use tokio::sync::RwLock;
use tracing::warn;

use crate::models::{Transaction, TransactionStatus};

/// Durable transaction record keyed by correlation id, with a unique-insert
/// guarantee and status-update semantics for the worker's outcome commit.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn exists(&self, correlation_id: &str) -> Result<bool, FraudScoreError>;

    /// Fails with `FraudScoreError::DuplicateInStore` if the id is already present
    async fn insert(&self, tx: Transaction) -> Result<(), FraudScoreError>;

    /// Updates the existing record only; fails with `NotFound` if absent
    async fn update_outcome(
        &self,
        correlation_id: &str,
        status: TransactionStatus,
        alerts_joined: String,
    ) -> Result<(), FraudScoreError>;

    async fn list_all(&self) -> Result<Vec<Transaction>, FraudScoreError>;

    async fn list_by(
        &self,
        status: Option<TransactionStatus>,
        params: PaginationParams,
    ) -> Result<PaginatedResponse<Transaction>, FraudScoreError>;

    async fn get(&self, correlation_id: &str) -> Result<Option<Transaction>, FraudScoreError>;
}

#[derive(Default)]
struct StoreState {
    by_id: HashMap<String, Transaction>,
    /// Insertion order, preserved for FIFO-consistent `list_all`/snapshot reads
    order: Vec<String>,
}

pub struct InMemoryTransactionStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
        }
    }
}

impl Default for InMemoryTransactionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn exists(&self, correlation_id: &str) -> Result<bool, FraudScoreError> {
        let state = self.state.read().await;
        Ok(state.by_id.contains_key(correlation_id))
    }

    async fn insert(&self, tx: Transaction) -> Result<(), FraudScoreError> {
        let mut state = self.state.write().await;
        if state.by_id.contains_key(&tx.correlation_id) {
            return Err(FraudScoreError::DuplicateInStore {
                correlation_id: tx.correlation_id,
                code: "DUPLICATE_IN_STORE".to_string(),
            });
        }
        state.order.push(tx.correlation_id.clone());
        state.by_id.insert(tx.correlation_id.clone(), tx);
        Ok(())
    }

    async fn update_outcome(
        &self,
        correlation_id: &str,
        status: TransactionStatus,
        alerts_joined: String,
    ) -> Result<(), FraudScoreError> {
        let mut state = self.state.write().await;
        let Some(tx) = state.by_id.get_mut(correlation_id) else {
            warn!(correlation_id, "update_outcome on unknown transaction");
            return Err(FraudScoreError::NotFound {
                resource_type: "transaction".to_string(),
                resource_id: correlation_id.to_string(),
                code: "RESOURCE_NOT_FOUND".to_string(),
            });
        };
        tx.status = status;
        tx.alerts = if alerts_joined.is_empty() {
            Vec::new()
        } else {
            alerts_joined.split("; ").map(str::to_string).collect()
        };
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Transaction>, FraudScoreError> {
        let state = self.state.read().await;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.by_id.get(id).cloned())
            .collect())
    }

    async fn list_by(
        &self,
        status: Option<TransactionStatus>,
        params: PaginationParams,
    ) -> Result<PaginatedResponse<Transaction>, FraudScoreError> {
        let state = self.state.read().await;
        let mut matching: Vec<Transaction> = state
            .order
            .iter()
            .filter_map(|id| state.by_id.get(id).cloned())
            .filter(|tx| status.map(|s| s == tx.status).unwrap_or(true))
            .collect();

        match params.sort_order.unwrap_or(SortOrder::Desc) {
            SortOrder::Desc => matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
            SortOrder::Asc => matching.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
        }

        let total_count = matching.len() as u64;
        let limit = params.limit.unwrap_or(50);
        let offset = params.offset.unwrap_or(0);
        let page: Vec<Transaction> = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok(PaginatedResponse::new(page, total_count, limit, offset))
    }

    async fn get(&self, correlation_id: &str) -> Result<Option<Transaction>, FraudScoreError> {
        let state = self.state.read().await;
        Ok(state.by_id.get(correlation_id).cloned())
    }
}
