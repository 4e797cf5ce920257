//! Worker Loop: dequeues transactions, runs every enabled rule, persists the
//! outcome, and dispatches notifications.

use std::sync::Arc;
use std::time::Duration;

use fraudscore_logging::logger::{LogEvent, LogLevel};

use crate::history::HistoryProvider;
use crate::models::{Transaction, TransactionStatus};
use crate::notifier::Notifier;
use crate::queue::FifoQueue;
use crate::rules::evaluate;
use crate::store::{RuleStore, TransactionStore};

pub struct Worker {
    queue: Arc<FifoQueue>,
    transaction_store: Arc<dyn TransactionStore>,
    rule_store: Arc<dyn RuleStore>,
    history: Arc<dyn HistoryProvider>,
    chat_notifier: Arc<Notifier>,
    mail_notifier: Arc<Notifier>,
    poll_interval: Duration,
}

impl Worker {
    pub fn new(
        queue: Arc<FifoQueue>,
        transaction_store: Arc<dyn TransactionStore>,
        rule_store: Arc<dyn RuleStore>,
        history: Arc<dyn HistoryProvider>,
        chat_notifier: Arc<Notifier>,
        mail_notifier: Arc<Notifier>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue,
            transaction_store,
            rule_store,
            history,
            chat_notifier,
            mail_notifier,
            poll_interval,
        }
    }

    /// Runs until the process is terminated; acceptable loss on shutdown is
    /// at most one in-flight transaction and anything still queued.
    pub async fn run(&self) {
        loop {
            match self.queue.try_pop().await {
                Some(tx) => self.process(tx).await,
                None => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }

    /// Single dequeue-evaluate-persist-notify cycle, isolated for tests
    pub async fn process(&self, mut tx: Transaction) {
        // Insert-at-ingest already persisted this row as `queued`. A prior
        // worker cycle that already committed an outcome for it (replay,
        // double-enqueue) would have moved it past `queued`; catch that here
        // rather than re-evaluating and re-notifying.
        if let Ok(Some(existing)) = self.transaction_store.get(&tx.correlation_id).await {
            if existing.status != TransactionStatus::Queued {
                self.log_tx(&tx, "duplicate_skipped", LogLevel::Info, None);
                return;
            }
        }

        let rules = match self.rule_store.list_enabled().await {
            Ok(rules) => rules,
            Err(e) => {
                self.log_tx(&tx, "rule_store_error", LogLevel::Error, Some(&e.to_string()));
                return;
            }
        };

        let history = match self.history.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.log_tx(&tx, "history_error", LogLevel::Error, Some(&e.to_string()));
                return;
            }
        };

        let mut alerts = Vec::new();
        for rule in &rules {
            match evaluate(rule, &tx, &history) {
                Ok((true, reason)) => alerts.push(reason),
                Ok((false, _)) => {}
                Err(e) => {
                    LogEvent::new("rule_error", "worker")
                        .correlation_id(tx.correlation_id.clone())
                        .extra("rule_id", rule.id.to_string())
                        .extra("error", e.to_string())
                        .emit(LogLevel::Error);
                }
            }
        }

        tx.alerts = alerts;
        tx.status = if tx.alerts.is_empty() {
            TransactionStatus::Processed
        } else {
            TransactionStatus::Alerted
        };

        let commit = self
            .transaction_store
            .update_outcome(&tx.correlation_id, tx.status, tx.alerts_joined())
            .await;

        match commit {
            Ok(()) => {
                self.log_tx(&tx, "db_commit", LogLevel::Info, None);
            }
            Err(e) if e.is_duplicate() => {
                self.log_tx(&tx, "duplicate_constraint_violation", LogLevel::Warn, Some(&e.to_string()));
                return;
            }
            Err(e) => {
                self.log_tx(&tx, "db_error", LogLevel::Error, Some(&e.to_string()));
                return;
            }
        }

        if tx.status == TransactionStatus::Alerted {
            for reason in tx.alerts.clone() {
                self.chat_notifier.send(&tx, &reason).await;
                self.mail_notifier.send(&tx, &reason).await;
            }
        }
    }

    fn log_tx(&self, tx: &Transaction, stage: &str, level: LogLevel, error: Option<&str>) {
        let mut event = LogEvent::new(stage, "worker")
            .correlation_id(tx.correlation_id.clone())
            .sender(tx.sender_account.clone())
            .receiver(tx.receiver_account.clone())
            .amount(tx.amount)
            .transaction_type(tx.transaction_type.to_string())
            .status(format!("{:?}", tx.status).to_lowercase());
        if let Some(error) = error {
            event = event.extra("error", error);
        }
        event.emit(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::StoreBackedHistory;
    use crate::models::{Operator, RuleSpec, ThresholdSpec, TransactionType};
    use crate::notifier::NotificationTransport;
    use crate::store::{InMemoryRuleStore, InMemoryTransactionStore};
    use async_trait::async_trait;
    use chrono::Utc;
    use fraudscore_errors::FraudScoreError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    struct CountingTransport {
        calls: AtomicU32,
    }

    #[async_trait]
    impl NotificationTransport for CountingTransport {
        async fn deliver(&self, _tx: &Transaction, _reason: &str) -> Result<(), FraudScoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn submitted_tx(amount: f64) -> Transaction {
        Transaction {
            correlation_id: Uuid::new_v4().to_string(),
            sender_account: "A".to_string(),
            receiver_account: "B".to_string(),
            amount,
            transaction_type: TransactionType::Payment,
            timestamp: Utc::now(),
            status: TransactionStatus::Queued,
            alerts: Vec::new(),
        }
    }

    async fn build_worker() -> (Worker, Arc<dyn TransactionStore>, Arc<dyn RuleStore>) {
        let tx_store: Arc<dyn TransactionStore> = Arc::new(InMemoryTransactionStore::new());
        let rule_store: Arc<dyn RuleStore> = Arc::new(InMemoryRuleStore::new());
        let history: Arc<dyn HistoryProvider> = Arc::new(StoreBackedHistory::new(tx_store.clone()));

        let chat_transport = Arc::new(CountingTransport { calls: AtomicU32::new(0) });
        let mail_transport = Arc::new(CountingTransport { calls: AtomicU32::new(0) });

        let chat_notifier = Arc::new(Notifier::new("chat", chat_transport.clone(), Duration::from_millis(1), 3));
        let mail_notifier = Arc::new(Notifier::new("mail", mail_transport, Duration::from_millis(1), 3));

        let queue = Arc::new(FifoQueue::new());
        let worker = Worker::new(
            queue,
            tx_store.clone(),
            rule_store.clone(),
            history,
            chat_notifier,
            mail_notifier,
            Duration::from_millis(10),
        );
        (worker, tx_store, rule_store)
    }

    #[tokio::test]
    async fn threshold_fires_and_commits_alerted_status() {
        let (worker, tx_store, rule_store) = build_worker().await;
        rule_store
            .put(
                "big".to_string(),
                true,
                RuleSpec::Threshold(ThresholdSpec {
                    field: "amount".to_string(),
                    operator: Operator::Gt,
                    value: 1000.0,
                }),
            )
            .await
            .unwrap();

        let tx = submitted_tx(1500.0);
        tx_store.insert(tx.clone()).await.unwrap();
        worker.process(tx.clone()).await;

        let persisted = tx_store.get(&tx.correlation_id).await.unwrap().unwrap();
        assert_eq!(persisted.status, TransactionStatus::Alerted);
        assert_eq!(persisted.alerts, vec!["amount 1500.0 > 1000"]);
    }

    #[tokio::test]
    async fn threshold_misses_and_commits_processed_status() {
        let (worker, tx_store, rule_store) = build_worker().await;
        rule_store
            .put(
                "big".to_string(),
                true,
                RuleSpec::Threshold(ThresholdSpec {
                    field: "amount".to_string(),
                    operator: Operator::Gt,
                    value: 1000.0,
                }),
            )
            .await
            .unwrap();

        let tx = submitted_tx(500.0);
        tx_store.insert(tx.clone()).await.unwrap();
        worker.process(tx.clone()).await;

        let persisted = tx_store.get(&tx.correlation_id).await.unwrap().unwrap();
        assert_eq!(persisted.status, TransactionStatus::Processed);
        assert!(persisted.alerts.is_empty());
    }

    #[tokio::test]
    async fn a_failing_rule_does_not_block_other_rules() {
        let (worker, tx_store, rule_store) = build_worker().await;

        // A pattern rule with an out-of-range window: evaluation errors and is skipped.
        rule_store
            .put(
                "broken".to_string(),
                true,
                RuleSpec::Pattern(crate::models::PatternSpec {
                    count: 1,
                    minutes: i64::MAX,
                    kind: None,
                }),
            )
            .await
            .unwrap();
        rule_store
            .put(
                "big".to_string(),
                true,
                RuleSpec::Threshold(ThresholdSpec {
                    field: "amount".to_string(),
                    operator: Operator::Gt,
                    value: 1000.0,
                }),
            )
            .await
            .unwrap();

        let tx = submitted_tx(1500.0);
        tx_store.insert(tx.clone()).await.unwrap();
        worker.process(tx.clone()).await;

        let persisted = tx_store.get(&tx.correlation_id).await.unwrap().unwrap();
        assert_eq!(persisted.status, TransactionStatus::Alerted);
        assert_eq!(persisted.alerts.len(), 1);
    }
}
