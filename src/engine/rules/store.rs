use std::collections::HashSet;

use log::{debug, warn};
use serde_json::Value;

use crate::errors::CookieSyncError;
use crate::rules::{validate_target, Rule, RuleField, RuleId};
use crate::selection::SelectionTracker;
use crate::storage::Persistence;

/// Owns the ordered rule collection.
///
/// Every mutation persists the full collection under a single key. Ids are
/// unique across the collection at all times.
#[derive(Debug)]
pub struct RuleStore {
    rules: Vec<Rule>,
    key: String,
    default_target: String,
    persistence: Persistence,
}

impl RuleStore {
    pub fn new(persistence: Persistence, key: impl Into<String>, default_target: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            key: key.into(),
            default_target: default_target.into(),
            persistence,
        }
    }

    /// Persisted key of the rule collection.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn ids(&self) -> HashSet<RuleId> {
        self.rules.iter().map(|r| r.id).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Reads the persisted collection, defaulting to empty.
    ///
    /// Records are decoded one by one; a record that does not decode is
    /// skipped. Should the stored collection repeat an id, only the first rule
    /// carrying it is kept.
    pub async fn load(&mut self) -> &[Rule] {
        let raw: Vec<Value> = self.persistence.load(&self.key).await;
        let loaded: Vec<Rule> = raw
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<Rule>(record.clone()) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    warn!("RuleStore: skipping malformed rule {}: {}", record, e);
                    None
                }
            })
            .collect();
        let total = loaded.len();

        let mut seen = HashSet::new();
        self.rules = loaded.into_iter().filter(|r| seen.insert(r.id)).collect();

        if self.rules.len() != total {
            warn!(
                "RuleStore: dropped {} rule(s) with duplicate ids on load",
                total - self.rules.len()
            );
        }
        &self.rules
    }

    /// Appends a fresh inert rule pointing at the default target.
    pub async fn add(&mut self) -> Rule {
        let mut rule = Rule::new(self.default_target.clone());
        while self.get(rule.id).is_some() {
            rule.id = RuleId::new();
        }

        debug!("RuleStore: added rule {}", rule.id);
        self.rules.push(rule.clone());
        self.persist().await;
        rule
    }

    /// Replaces one field of a rule.
    ///
    /// Target values must be valid addresses; on rejection nothing changes and
    /// nothing is persisted.
    pub async fn update(&mut self, id: RuleId, field: RuleField, value: &str) -> Result<Rule, CookieSyncError> {
        if field == RuleField::Target {
            validate_target(value)?;
        }

        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(CookieSyncError::RuleNotFound(id))?;

        match field {
            RuleField::Origin => rule.origin = value.to_string(),
            RuleField::Target => rule.target = value.to_string(),
        }
        let updated = rule.clone();

        debug!("RuleStore: rule {} {} = {:?}", id, field.as_str(), value);
        self.persist().await;
        Ok(updated)
    }

    /// Removes a rule and prunes it from `selection`.
    ///
    /// Deleting an unknown id is not an error; the collection is still
    /// persisted and the selection still pruned.
    pub async fn delete(&mut self, id: RuleId, selection: &mut SelectionTracker) -> Option<Rule> {
        let position = self.rules.iter().position(|r| r.id == id);
        let removed = position.map(|idx| self.rules.remove(idx));

        if removed.is_some() {
            debug!("RuleStore: deleted rule {}", id);
        }
        self.persist().await;
        selection.prune_missing(&self.ids()).await;
        removed
    }

    /// Empties the collection and `selection` and removes both persisted keys.
    pub async fn clear(&mut self, selection: &mut SelectionTracker) {
        self.persistence.remove(&[self.key.as_str(), selection.key()]).await;
        self.rules.clear();
        selection.clear_local();
        debug!("RuleStore: cleared all rules and the selection");
    }

    async fn persist(&self) {
        self.persistence.save(&self.key, &self.rules).await;
    }
}
