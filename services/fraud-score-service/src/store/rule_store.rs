//! Rule Store: CRUD plus append-only audit for rule definitions

use std::sync::Arc;

use async_trait::async_trait;
use fraudscore_errors::FraudScoreError;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::models::{Rule, RuleAction, RuleHistory, RuleSpec, RuleType};

/// CRUD and audit for rule definitions. The minimal admin surface only
/// expresses a single numeric knob per rule (`create`/`update`); richer rule
/// shapes (a pattern's window/count, a composite's expression) go through
/// `put`, used by fixtures, migrations, and the test suite.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Only enabled rules, in a deterministic (not necessarily stable) order
    async fn list_enabled(&self) -> Result<Vec<Rule>, FraudScoreError>;

    async fn create(
        &self,
        name: String,
        rule_type: RuleType,
        value: f64,
    ) -> Result<Rule, FraudScoreError>;

    /// Fails with `NotFound` if `id` is absent
    async fn update(
        &self,
        id: Uuid,
        name: String,
        rule_type: RuleType,
        value: f64,
    ) -> Result<Rule, FraudScoreError>;

    /// Fails with `NotFound` if `id` is absent
    async fn delete(&self, id: Uuid) -> Result<(), FraudScoreError>;

    /// Seed or replace a rule with a fully-formed spec, bypassing the
    /// single-value CRUD surface. Still records a `RuleHistory` entry.
    async fn put(&self, name: String, enabled: bool, spec: RuleSpec) -> Result<Rule, FraudScoreError>;

    async fn history(&self, rule_id: Uuid) -> Result<Vec<RuleHistory>, FraudScoreError>;
}

#[derive(Default)]
struct StoreState {
    rules: Vec<Rule>,
    history: Vec<RuleHistory>,
}

impl StoreState {
    fn find_index(&self, id: Uuid) -> Option<usize> {
        self.rules.iter().position(|r| r.id == id)
    }
}

pub struct InMemoryRuleStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
        }
    }
}

impl Default for InMemoryRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(id: Uuid) -> FraudScoreError {
    FraudScoreError::NotFound {
        resource_type: "rule".to_string(),
        resource_id: id.to_string(),
        code: "RESOURCE_NOT_FOUND".to_string(),
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn list_enabled(&self) -> Result<Vec<Rule>, FraudScoreError> {
        let state = self.state.read().await;
        Ok(state.rules.iter().filter(|r| r.enabled).cloned().collect())
    }

    async fn create(
        &self,
        name: String,
        rule_type: RuleType,
        value: f64,
    ) -> Result<Rule, FraudScoreError> {
        let rule = Rule {
            id: Uuid::new_v4(),
            name,
            enabled: true,
            spec: RuleSpec::from_single_value(rule_type, value),
        };

        let mut state = self.state.write().await;
        let new_values = serde_json::to_value(&rule).ok();
        state.rules.push(rule.clone());
        state.history.push(RuleHistory::new(rule.id, RuleAction::Create, None, new_values));
        info!(rule_id = %rule.id, "rule created");
        Ok(rule)
    }

    async fn update(
        &self,
        id: Uuid,
        name: String,
        rule_type: RuleType,
        value: f64,
    ) -> Result<Rule, FraudScoreError> {
        let mut state = self.state.write().await;
        let idx = state.find_index(id).ok_or_else(|| not_found(id))?;

        let old_values = serde_json::to_value(&state.rules[idx]).ok();
        let updated = Rule {
            id,
            name,
            enabled: state.rules[idx].enabled,
            spec: RuleSpec::from_single_value(rule_type, value),
        };
        let new_values = serde_json::to_value(&updated).ok();
        state.rules[idx] = updated.clone();
        state.history.push(RuleHistory::new(id, RuleAction::Update, old_values, new_values));
        info!(rule_id = %id, "rule updated");
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), FraudScoreError> {
        let mut state = self.state.write().await;
        let idx = state.find_index(id).ok_or_else(|| not_found(id))?;

        let old_values = serde_json::to_value(&state.rules[idx]).ok();
        state.rules.remove(idx);
        state.history.push(RuleHistory::new(id, RuleAction::Delete, old_values, None));
        info!(rule_id = %id, "rule deleted");
        Ok(())
    }

    async fn put(&self, name: String, enabled: bool, spec: RuleSpec) -> Result<Rule, FraudScoreError> {
        let rule = Rule {
            id: Uuid::new_v4(),
            name,
            enabled,
            spec,
        };

        let mut state = self.state.write().await;
        let new_values = serde_json::to_value(&rule).ok();
        state.rules.push(rule.clone());
        state.history.push(RuleHistory::new(
            rule.id,
            RuleAction::Create,
            None,
            new_values.or_else(|| Some(json!({}))),
        ));
        info!(rule_id = %rule.id, "rule seeded");
        Ok(rule)
    }

    async fn history(&self, rule_id: Uuid) -> Result<Vec<RuleHistory>, FraudScoreError> {
        let state = self.state.read().await;
        Ok(state
            .history
            .iter()
            .filter(|h| h.rule_id == rule_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_list_enabled() {
        let store = InMemoryRuleStore::new();
        let rule = store
            .create("big amount".to_string(), RuleType::Threshold, 1000.0)
            .await
            .unwrap();
        let enabled = store.list_enabled().await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].id, rule.id);
    }

    #[tokio::test]
    async fn update_unknown_rule_is_not_found() {
        let store = InMemoryRuleStore::new();
        let err = store
            .update(Uuid::new_v4(), "x".to_string(), RuleType::Threshold, 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, FraudScoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_emits_history_with_pre_image() {
        let store = InMemoryRuleStore::new();
        let rule = store
            .create("r".to_string(), RuleType::Ml, 0.5)
            .await
            .unwrap();
        store.delete(rule.id).await.unwrap();
        let history = store.history(rule.id).await.unwrap();
        assert_eq!(history.len(), 2); // create + delete
        assert_eq!(history[1].action, RuleAction::Delete);
        assert!(history[1].old_values.is_some());
    }

    #[tokio::test]
    async fn disabled_rule_is_not_listed_but_remains_auditable() {
        let store = InMemoryRuleStore::new();
        let rule = store.put("r".to_string(), false, RuleSpec::from_single_value(RuleType::Ml, 0.5)).await.unwrap();
        assert!(store.list_enabled().await.unwrap().is_empty());
        assert_eq!(store.history(rule.id).await.unwrap().len(), 1);
    }
}
