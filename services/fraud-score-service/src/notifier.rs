//! Notifier: per-channel deduplicated, bounded-retry outbound delivery

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fraudscore_config::notifications::{ChatConfig, MailConfig};
use fraudscore_errors::FraudScoreError;
use fraudscore_logging::logger::{LogEvent, LogLevel};
use tokio::sync::Mutex;

use crate::models::Transaction;

/// Pluggable delivery mechanism behind a channel's notifier. The concrete
/// chat-bot and mail-gateway wire formats are out of scope; this is the seam
/// the retry/dedup state machine drives, exercised against a fake in tests.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn deliver(&self, tx: &Transaction, reason: &str) -> Result<(), FraudScoreError>;
}

/// Deduplicated, bounded-retry delivery for a single channel (chat or mail).
/// The delivered-set is process-local and survives neither restart nor an
/// explicit redelivery request, by design.
pub struct Notifier {
    channel: &'static str,
    transport: Arc<dyn NotificationTransport>,
    delivered: Mutex<HashSet<String>>,
    backoff: Duration,
    max_attempts: u32,
}

impl Notifier {
    pub fn new(channel: &'static str, transport: Arc<dyn NotificationTransport>, backoff: Duration, max_attempts: u32) -> Self {
        Self {
            channel,
            transport,
            delivered: Mutex::new(HashSet::new()),
            backoff,
            max_attempts: max_attempts.max(1),
        }
    }

    pub async fn send(&self, tx: &Transaction, reason: &str) {
        if self.delivered.lock().await.contains(&tx.correlation_id) {
            self.log(tx, "notify_skipped", LogLevel::Info);
            return;
        }

        for attempt in 1..=self.max_attempts {
            match self.transport.deliver(tx, reason).await {
                Ok(()) => {
                    self.delivered.lock().await.insert(tx.correlation_id.clone());
                    self.log(tx, "notify_sent", LogLevel::Info);
                    return;
                }
                Err(_) if attempt < self.max_attempts => {
                    self.log(tx, "notify_retry", LogLevel::Warn);
                    tokio::time::sleep(self.backoff).await;
                }
                Err(_) => {
                    self.log(tx, "notify_error", LogLevel::Error);
                }
            }
        }
    }

    fn log(&self, tx: &Transaction, stage: &str, level: LogLevel) {
        LogEvent::new(stage, "notifier")
            .correlation_id(tx.correlation_id.clone())
            .sender(tx.sender_account.clone())
            .receiver(tx.receiver_account.clone())
            .amount(tx.amount)
            .extra("channel", self.channel)
            .emit(level);
    }
}

/// Default chat-bot adapter: posts a Markdown message to a configured bot endpoint
pub struct ChatTransport {
    client: reqwest::Client,
    config: ChatConfig,
}

impl ChatTransport {
    pub fn new(client: reqwest::Client, config: ChatConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl NotificationTransport for ChatTransport {
    async fn deliver(&self, tx: &Transaction, reason: &str) -> Result<(), FraudScoreError> {
        let text = format!(
            "\u{1F6A8} *Transaction Alert!*\n*Correlation ID:* {}\n*Sender:* {}\n*Receiver:* {}\n*Amount:* {}\n*Reason:* {}",
            tx.correlation_id, tx.sender_account, tx.receiver_account, tx.amount, reason
        );

        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.config.bot_token
        );
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({
                "chat_id": self.config.chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(FraudScoreError::NotifyTransport {
                channel: "chat".to_string(),
                message: format!("chat gateway responded {}", response.status()),
                code: "NOTIFY_TRANSPORT_ERROR".to_string(),
            })
        }
    }
}

/// Default mail adapter: posts to a configured mail-gateway HTTP endpoint
pub struct MailTransport {
    client: reqwest::Client,
    config: MailConfig,
}

impl MailTransport {
    pub fn new(client: reqwest::Client, config: MailConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl NotificationTransport for MailTransport {
    async fn deliver(&self, tx: &Transaction, reason: &str) -> Result<(), FraudScoreError> {
        let html = format!(
            "<h3>Transaction Alert</h3><p>Correlation ID: {}</p><p>Sender: {}</p><p>Receiver: {}</p><p>Amount: {}</p><p>Reason: {}</p><p>Timestamp: {}</p>",
            tx.correlation_id, tx.sender_account, tx.receiver_account, tx.amount, reason, tx.timestamp
        );

        let url = format!("https://{}:{}/send", self.config.host, self.config.port);
        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.user, Some(&self.config.password))
            .json(&serde_json::json!({
                "from": self.config.sender,
                "to": self.config.recipient,
                "subject": "Transaction Alert",
                "html": html,
            }))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(FraudScoreError::NotifyTransport {
                channel: "mail".to_string(),
                message: format!("mail gateway responded {}", response.status()),
                code: "NOTIFY_TRANSPORT_ERROR".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TransactionStatus, TransactionType};
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyTransport {
        fail_times: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl NotificationTransport for FlakyTransport {
        async fn deliver(&self, _tx: &Transaction, _reason: &str) -> Result<(), FraudScoreError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_times {
                Err(FraudScoreError::NotifyTransport {
                    channel: "test".to_string(),
                    message: "500".to_string(),
                    code: "NOTIFY_TRANSPORT_ERROR".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn tx() -> Transaction {
        Transaction {
            correlation_id: "c1".to_string(),
            sender_account: "A".to_string(),
            receiver_account: "B".to_string(),
            amount: 10.0,
            transaction_type: TransactionType::Payment,
            timestamp: Utc::now(),
            status: TransactionStatus::Alerted,
            alerts: vec!["reason".to_string()],
        }
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let transport = Arc::new(FlakyTransport {
            fail_times: 2,
            calls: AtomicU32::new(0),
        });
        let notifier = Notifier::new("test", transport.clone(), Duration::from_millis(1), 3);
        notifier.send(&tx(), "reason").await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn second_send_for_same_id_is_skipped() {
        let transport = Arc::new(FlakyTransport {
            fail_times: 0,
            calls: AtomicU32::new(0),
        });
        let notifier = Notifier::new("test", transport.clone(), Duration::from_millis(1), 3);
        notifier.send(&tx(), "reason").await;
        notifier.send(&tx(), "reason").await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_silently_after_max_attempts() {
        let transport = Arc::new(FlakyTransport {
            fail_times: 10,
            calls: AtomicU32::new(0),
        });
        let notifier = Notifier::new("test", transport.clone(), Duration::from_millis(1), 3);
        notifier.send(&tx(), "reason").await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }
}
