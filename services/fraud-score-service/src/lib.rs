//! Transaction ingest, rule evaluation, and alerting pipeline
//!
//! The HTTP surface, HTML templating, CSV export, and the concrete
//! notification wire formats live outside this crate; it exposes the data
//! and operations a front-end would call (`IngestGate::submit`, the
//! `RuleStore`/`TransactionStore` traits) without binding them to routes.

pub mod history;
pub mod ingest;
pub mod models;
pub mod notifier;
pub mod queue;
pub mod rules;
pub mod store;
pub mod worker;

pub use history::{HistoryProvider, StoreBackedHistory};
pub use ingest::{IngestAck, IngestGate};
pub use notifier::{ChatTransport, MailTransport, NotificationTransport, Notifier};
pub use queue::FifoQueue;
pub use store::{InMemoryRuleStore, InMemoryTransactionStore, RuleStore, TransactionStore};
pub use worker::Worker;
