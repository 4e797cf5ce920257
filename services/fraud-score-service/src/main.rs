//! Fraud scoring pipeline: ingest, rule evaluation, and alerting
//!
//! The HTTP front-end is a separate concern; this binary owns the queue and
//! the worker loop that drains it. `IngestGate::submit` is the seam an HTTP
//! layer would call into.

use std::sync::Arc;
use std::time::Duration;

use fraudscore_config::AppSettings;
use fraudscore_logging::tracing_setup::init_tracing;
use fraudscore_service::{
    ChatTransport, FifoQueue, InMemoryRuleStore, InMemoryTransactionStore, IngestGate,
    MailTransport, Notifier, StoreBackedHistory, Worker,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("starting fraud scoring service");

    let settings = AppSettings::load()?;

    let transaction_store = Arc::new(InMemoryTransactionStore::new());
    let rule_store = Arc::new(InMemoryRuleStore::new());
    let queue = Arc::new(FifoQueue::new());
    let history = Arc::new(StoreBackedHistory::new(transaction_store.clone()));

    // Kept alive for whatever HTTP layer is wired in front of this crate.
    let _ingest_gate = IngestGate::new(transaction_store.clone(), queue.clone());

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.notifications.transport_timeout_seconds))
        .build()?;

    let chat_transport = Arc::new(ChatTransport::new(http_client.clone(), settings.notifications.chat.clone()));
    let mail_transport = Arc::new(MailTransport::new(http_client, settings.notifications.mail.clone()));

    let chat_notifier = Arc::new(Notifier::new(
        "chat",
        chat_transport,
        Duration::from_secs(settings.notifications.chat.backoff_seconds),
        settings.notifications.retry_count,
    ));
    let mail_notifier = Arc::new(Notifier::new(
        "mail",
        mail_transport,
        Duration::from_secs(settings.notifications.mail.backoff_seconds),
        settings.notifications.retry_count,
    ));

    let worker = Worker::new(
        queue,
        transaction_store,
        rule_store,
        history,
        chat_notifier,
        mail_notifier,
        Duration::from_millis(settings.service.poll_interval_ms),
    );

    info!(poll_interval_ms = settings.service.poll_interval_ms, "worker loop running");
    worker.run().await;

    Ok(())
}
