//! Selection tracking: which rules take part in the next sync run.

use std::collections::HashSet;

use log::debug;

use crate::rules::RuleId;
use crate::storage::Persistence;

/// Owns the set of rule ids currently marked active.
///
/// Ids keep the order in which they were selected; that is also the order in
/// which they are persisted.
#[derive(Debug)]
pub struct SelectionTracker {
    selected: Vec<RuleId>,
    key: String,
    persistence: Persistence,
}

impl SelectionTracker {
    pub fn new(persistence: Persistence, key: impl Into<String>) -> Self {
        Self {
            selected: Vec::new(),
            key: key.into(),
            persistence,
        }
    }

    /// Persisted key of the selection set.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ids(&self) -> &[RuleId] {
        &self.selected
    }

    pub fn contains(&self, id: &RuleId) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Reads the persisted selection, defaulting to an empty set.
    pub async fn load(&mut self) -> &[RuleId] {
        let ids: Vec<RuleId> = self.persistence.load(&self.key).await;
        self.selected = dedup(ids);
        &self.selected
    }

    /// Replaces the selection and persists it.
    pub async fn set_selection(&mut self, ids: impl IntoIterator<Item = RuleId>) {
        self.selected = dedup(ids);
        self.persist().await;
    }

    /// Drops every selected id that is not in `valid`, then persists the result.
    ///
    /// Returns the number of ids removed.
    pub async fn prune_missing(&mut self, valid: &HashSet<RuleId>) -> usize {
        let before = self.selected.len();
        self.selected.retain(|id| valid.contains(id));
        let pruned = before - self.selected.len();
        if pruned > 0 {
            debug!("Selection: pruned {} stale id(s)", pruned);
        }
        self.persist().await;
        pruned
    }

    /// Empties the selection without touching the store.
    pub(crate) fn clear_local(&mut self) {
        self.selected.clear();
    }

    async fn persist(&self) {
        self.persistence.save(&self.key, &self.selected).await;
    }
}

fn dedup(ids: impl IntoIterator<Item = RuleId>) -> Vec<RuleId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
