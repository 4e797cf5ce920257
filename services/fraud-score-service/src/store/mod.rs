//! Persistence layer: rule and transaction stores

pub mod rule_store;
pub mod transaction_store;

pub use rule_store::{InMemoryRuleStore, RuleStore};
pub use transaction_store::{InMemoryTransactionStore, TransactionStore};
