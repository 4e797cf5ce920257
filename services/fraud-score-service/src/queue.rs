//! In-memory FIFO queue between the ingest gate and the worker loop

use std::collections::VecDeque;

use tokio::sync::Mutex;

use crate::models::Transaction;

/// Single-consumer, many-producer FIFO buffer. Ephemeral: a process restart
/// loses whatever is still queued, which is accepted per the worker's
/// daemon-thread cancellation semantics.
pub struct FifoQueue {
    inner: Mutex<VecDeque<Transaction>>,
}

impl FifoQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Non-blocking from the caller's perspective
    pub async fn push(&self, tx: Transaction) {
        self.inner.lock().await.push_back(tx);
    }

    /// Used by the ingest gate's duplicate check before enqueueing
    pub async fn contains(&self, correlation_id: &str) -> bool {
        self.inner
            .lock()
            .await
            .iter()
            .any(|tx| tx.correlation_id == correlation_id)
    }

    /// Non-blocking pop; the worker polls this on a fixed cadence
    pub async fn try_pop(&self) -> Option<Transaction> {
        self.inner.lock().await.pop_front()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

impl Default for FifoQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TransactionStatus, TransactionType};
    use chrono::Utc;

    fn tx(id: &str) -> Transaction {
        Transaction {
            correlation_id: id.to_string(),
            sender_account: "A".to_string(),
            receiver_account: "B".to_string(),
            amount: 10.0,
            transaction_type: TransactionType::Payment,
            timestamp: Utc::now(),
            status: TransactionStatus::Queued,
            alerts: Vec::new(),
        }
    }

    #[tokio::test]
    async fn fifo_order_is_preserved() {
        let queue = FifoQueue::new();
        queue.push(tx("c1")).await;
        queue.push(tx("c2")).await;
        assert_eq!(queue.try_pop().await.unwrap().correlation_id, "c1");
        assert_eq!(queue.try_pop().await.unwrap().correlation_id, "c2");
        assert!(queue.try_pop().await.is_none());
    }

    #[tokio::test]
    async fn contains_detects_queued_duplicate() {
        let queue = FifoQueue::new();
        queue.push(tx("c1")).await;
        assert!(queue.contains("c1").await);
        assert!(!queue.contains("c2").await);
    }
}
