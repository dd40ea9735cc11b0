use std::collections::HashSet;
use std::future::Future;

use log::{debug, info};
use tokio::sync::broadcast;

use crate::config::SyncConfig;
use crate::cookies::CookieProviderHandle;
use crate::errors::CookieSyncError;
use crate::events::{publish, Subscription, SyncEvent};
use crate::rules::{Rule, RuleField, RuleId, RuleStore};
use crate::selection::SelectionTracker;
use crate::storage::{Persistence, PersistenceHandle};
use super::sync::{SyncEngine, SyncOutcome, SyncState};

/// Entry point for a host UI.
///
/// Owns the rule collection, the selection set and the sync engine, and wires
/// them to the injected persistence store and cookie provider. Either
/// capability may be absent: without a store, state lives for the session
/// only; without a cookie provider, sync runs copy nothing.
#[derive(Debug)]
pub struct CookieSync {
    config: SyncConfig,
    rules: RuleStore,
    selection: SelectionTracker,
    engine: SyncEngine,
    event_tx: broadcast::Sender<SyncEvent>,
}

impl CookieSync {
    /// Creates a sync core. `None` for `config` uses [`SyncConfig::default`].
    pub fn new(
        config: Option<SyncConfig>,
        persistence: Option<PersistenceHandle>,
        cookies: Option<CookieProviderHandle>,
    ) -> Result<Self, CookieSyncError> {
        let config = config.unwrap_or_default();
        config.validate()?;

        let persistence = Persistence::new(persistence);
        if !persistence.is_available() {
            info!("CookieSync: no persistence store, state will not survive restarts");
        }

        let (event_tx, _) = broadcast::channel(config.event_capacity);
        Ok(Self {
            rules: RuleStore::new(persistence.clone(), &config.rules_key, &config.default_target),
            selection: SelectionTracker::new(persistence, &config.selection_key),
            engine: SyncEngine::new(cookies, config.settle_delay, event_tx.clone()),
            event_tx,
            config,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> Subscription {
        self.event_tx.subscribe()
    }

    pub fn rules(&self) -> &[Rule] {
        self.rules.rules()
    }

    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id)
    }

    pub fn selection(&self) -> &[RuleId] {
        self.selection.ids()
    }

    pub fn is_selected(&self, id: RuleId) -> bool {
        self.selection.contains(&id)
    }

    /// Reads the persisted rules and selection.
    ///
    /// Selected ids that do not belong to any loaded rule are dropped, and the
    /// cleaned selection is written back.
    pub async fn load_initial_state(&mut self) {
        self.rules.load().await;
        self.selection.load().await;

        let valid = self.rules.ids();
        if self.selection.ids().iter().any(|id| !valid.contains(id)) {
            let pruned = self.selection.prune_missing(&valid).await;
            info!("CookieSync: dropped {} stale selected id(s) on load", pruned);
        }

        info!(
            "CookieSync: loaded {} rule(s), {} selected",
            self.rules.len(),
            self.selection.len()
        );
        publish(
            &self.event_tx,
            SyncEvent::StateLoaded {
                rules: self.rules.len(),
                selected: self.selection.len(),
            },
        );
    }

    pub async fn add_rule(&mut self) -> Rule {
        let rule = self.rules.add().await;
        publish(&self.event_tx, SyncEvent::RulesChanged);
        rule
    }

    /// Edits one field of a rule.
    ///
    /// A target that is not a valid address is rejected with
    /// [`CookieSyncError::InvalidTarget`], whose
    /// [`user_message`](CookieSyncError::user_message) is meant for the UI.
    pub async fn update_rule(&mut self, id: RuleId, field: RuleField, value: &str) -> Result<Rule, CookieSyncError> {
        let rule = self.rules.update(id, field, value).await?;
        publish(&self.event_tx, SyncEvent::RulesChanged);
        Ok(rule)
    }

    /// Deletes a rule and removes it from the selection.
    pub async fn delete_rule(&mut self, id: RuleId) -> Option<Rule> {
        let was_selected = self.selection.contains(&id);
        let removed = self.rules.delete(id, &mut self.selection).await;

        if removed.is_some() {
            publish(&self.event_tx, SyncEvent::RulesChanged);
        }
        if was_selected {
            publish(&self.event_tx, SyncEvent::SelectionChanged);
        }
        removed
    }

    /// Deletes every rule and empties the selection.
    pub async fn clear_all(&mut self) {
        self.rules.clear(&mut self.selection).await;
        publish(&self.event_tx, SyncEvent::RulesChanged);
        publish(&self.event_tx, SyncEvent::SelectionChanged);
    }

    /// Replaces the selection. Ids that match no rule are ignored.
    pub async fn set_selection(&mut self, ids: impl IntoIterator<Item = RuleId>) {
        let known = self.rules.ids();
        let (ids, unknown): (Vec<RuleId>, Vec<RuleId>) = ids.into_iter().partition(|id| known.contains(id));
        if !unknown.is_empty() {
            debug!("CookieSync: ignoring {} unknown id(s) in selection", unknown.len());
        }

        self.selection.set_selection(ids).await;
        publish(&self.event_tx, SyncEvent::SelectionChanged);
    }

    /// Starts a sync run over the current rules and selection.
    ///
    /// The returned future owns a snapshot of the working state, so the caller
    /// may keep editing rules while it runs. It resolves once the settle delay
    /// has elapsed; see [`SyncEngine`] for what that does and does not imply.
    pub fn run_sync(&self) -> impl Future<Output = SyncOutcome> + Send + 'static {
        let engine = self.engine.clone();
        let rules = self.rules.rules().to_vec();
        let selected = self.selection.ids().to_vec();
        async move { engine.run(&rules, &selected).await }
    }

    pub fn sync_state(&self) -> SyncState {
        self.engine.state()
    }

    /// A handle on the engine, for hosts that drive runs themselves.
    pub fn sync_engine(&self) -> SyncEngine {
        self.engine.clone()
    }

    /// Ids of all rules currently held.
    pub fn rule_ids(&self) -> HashSet<RuleId> {
        self.rules.ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::{Cookie, CookieDescriptor, CookieProvider, InMemoryCookieJar};
    use crate::errors::INVALID_TARGET_MESSAGE;
    use crate::storage::{InMemoryStore, PersistenceStore};
    use anyhow::Result;
    use futures::future::BoxFuture;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Records every fetch, then defers to an in-memory jar.
    #[derive(Default)]
    struct CountingJar {
        jar: InMemoryCookieJar,
        fetched: Mutex<Vec<String>>,
    }

    impl CookieProvider for CountingJar {
        fn get_all(&self, url: &str) -> BoxFuture<'_, Result<Vec<Cookie>>> {
            self.fetched.lock().unwrap().push(url.to_string());
            self.jar.get_all(url)
        }

        fn set(&self, cookie: CookieDescriptor) -> BoxFuture<'_, Result<()>> {
            self.jar.set(cookie)
        }
    }

    fn core(store: &Arc<InMemoryStore>, cookies: Option<Arc<CountingJar>>) -> CookieSync {
        CookieSync::new(
            None,
            Some(store.clone() as PersistenceHandle),
            cookies.map(|c| c as CookieProviderHandle),
        )
        .unwrap()
    }

    async fn snapshot(store: &InMemoryStore) -> HashMap<String, Value> {
        store.get(store.keys()).await.unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SyncConfig {
            event_capacity: 0,
            ..SyncConfig::default()
        };
        let err = CookieSync::new(Some(config), None, None).unwrap_err();
        assert!(matches!(err, CookieSyncError::Config(_)));
    }

    #[tokio::test]
    async fn target_validation_surfaces_the_user_message() {
        let store = Arc::new(InMemoryStore::new());
        let mut sync = core(&store, None);
        let rule = sync.add_rule().await;

        assert!(sync.update_rule(rule.id, RuleField::Target, "http://localhost").await.is_ok());
        let err = sync.update_rule(rule.id, RuleField::Target, "not a url").await.unwrap_err();
        assert_eq!(err.user_message(), INVALID_TARGET_MESSAGE);
        assert_eq!(sync.rule(rule.id).unwrap().target, "http://localhost");
    }

    #[tokio::test]
    async fn delete_and_clear_leave_no_dangling_selection() {
        let store = Arc::new(InMemoryStore::new());
        let mut sync = core(&store, None);
        let a = sync.add_rule().await;
        let b = sync.add_rule().await;
        let c = sync.add_rule().await;
        sync.set_selection([a.id, b.id, c.id]).await;

        sync.delete_rule(b.id).await;
        let ids = sync.rule_ids();
        assert!(sync.selection().iter().all(|id| ids.contains(id)));
        assert_eq!(sync.selection(), &[a.id, c.id]);

        sync.clear_all().await;
        assert!(sync.rules().is_empty());
        assert!(sync.selection().is_empty());
    }

    #[tokio::test]
    async fn set_selection_ignores_unknown_ids() {
        let store = Arc::new(InMemoryStore::new());
        let mut sync = core(&store, None);
        let a = sync.add_rule().await;

        sync.set_selection([RuleId::new(), a.id]).await;
        assert_eq!(sync.selection(), &[a.id]);
        assert!(sync.is_selected(a.id));
    }

    #[tokio::test]
    async fn clear_then_reload_is_empty() {
        let store = Arc::new(InMemoryStore::new());
        let mut sync = core(&store, None);
        let a = sync.add_rule().await;
        sync.set_selection([a.id]).await;
        sync.clear_all().await;

        let mut reloaded = core(&store, None);
        reloaded.load_initial_state().await;
        assert!(reloaded.rules().is_empty());
        assert!(reloaded.selection().is_empty());
    }

    #[tokio::test]
    async fn state_survives_a_reload() {
        let store = Arc::new(InMemoryStore::new());
        let mut sync = core(&store, None);
        let a = sync.add_rule().await;
        sync.update_rule(a.id, RuleField::Origin, "https://a.test").await.unwrap();
        sync.set_selection([a.id]).await;

        let mut reloaded = core(&store, None);
        reloaded.load_initial_state().await;
        assert_eq!(reloaded.rules(), sync.rules());
        assert_eq!(reloaded.selection(), &[a.id]);
    }

    #[tokio::test]
    async fn load_prunes_stale_selection_and_accepts_legacy_records() {
        let store = Arc::new(InMemoryStore::new());
        let live = RuleId::new();
        let stale = RuleId::new();
        store
            .set(HashMap::from([
                (
                    "plugin_cookies".to_string(),
                    json!([{"key": live.to_string(), "origin": "https://a.test", "target": "http://localhost"}]),
                ),
                (
                    "plugin_cookies_selected_keys".to_string(),
                    json!([live.to_string(), stale.to_string()]),
                ),
            ]))
            .await
            .unwrap();

        let mut sync = core(&store, None);
        let mut events = sync.subscribe();
        sync.load_initial_state().await;

        assert_eq!(sync.rules().len(), 1);
        assert_eq!(sync.rules()[0].id, live);
        assert_eq!(sync.selection(), &[live]);
        assert_eq!(
            events.recv().await.unwrap(),
            SyncEvent::StateLoaded { rules: 1, selected: 1 }
        );

        let persisted = snapshot(&store).await;
        assert_eq!(persisted["plugin_cookies_selected_keys"], json!([live.to_string()]));
    }

    #[tokio::test]
    async fn works_without_any_capability() {
        let mut sync = CookieSync::new(None, None, None).unwrap();
        sync.load_initial_state().await;
        let a = sync.add_rule().await;
        sync.set_selection([a.id]).await;
        sync.delete_rule(a.id).await;
        assert!(sync.rules().is_empty());
        assert!(sync.selection().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn run_sync_copies_only_selected_rules_with_an_origin() {
        let store = Arc::new(InMemoryStore::new());
        let cookies = Arc::new(CountingJar::default());
        cookies.jar.insert("https://a.test", Cookie::new("sid", "abc")).unwrap();
        cookies.jar.insert("https://b.test", Cookie::new("sid", "xyz")).unwrap();

        let mut sync = core(&store, Some(cookies.clone()));
        let a = sync.add_rule().await;
        let b = sync.add_rule().await;
        let inert = sync.add_rule().await;
        sync.update_rule(a.id, RuleField::Origin, "https://a.test").await.unwrap();
        sync.update_rule(a.id, RuleField::Target, "http://localhost:3000").await.unwrap();
        sync.update_rule(b.id, RuleField::Origin, "https://b.test").await.unwrap();
        sync.set_selection([a.id, inert.id]).await;

        assert_eq!(sync.run_sync().await, SyncOutcome::Dispatched { rules: 1 });
        assert_eq!(*cookies.fetched.lock().unwrap(), vec!["https://a.test".to_string()]);

        let copied = cookies.jar.cookies_for("http://localhost:3000").unwrap();
        assert_eq!(copied.len(), 1);
        assert_eq!((copied[0].name.as_str(), copied[0].value.as_str()), ("sid", "abc"));
    }

    #[tokio::test(start_paused = true)]
    async fn run_sync_without_provider_settles_and_persists_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let mut sync = core(&store, None);
        let a = sync.add_rule().await;
        sync.update_rule(a.id, RuleField::Origin, "https://a.test").await.unwrap();
        sync.set_selection([a.id]).await;

        let before = snapshot(&store).await;
        assert_eq!(sync.run_sync().await, SyncOutcome::Dispatched { rules: 0 });
        assert_eq!(sync.sync_state(), SyncState::Idle);
        assert_eq!(snapshot(&store).await, before);
    }

    #[tokio::test(start_paused = true)]
    async fn second_run_while_syncing_issues_no_requests() {
        let store = Arc::new(InMemoryStore::new());
        let cookies = Arc::new(CountingJar::default());
        let mut sync = core(&store, Some(cookies.clone()));
        let a = sync.add_rule().await;
        sync.update_rule(a.id, RuleField::Origin, "https://a.test").await.unwrap();
        sync.set_selection([a.id]).await;

        let first = tokio::spawn(sync.run_sync());
        while sync.sync_state() != SyncState::Syncing {
            tokio::task::yield_now().await;
        }

        // edits are allowed while a run is in flight
        sync.update_rule(a.id, RuleField::Origin, "https://b.test").await.unwrap();
        assert_eq!(sync.run_sync().await, SyncOutcome::Skipped);

        assert_eq!(first.await.unwrap(), SyncOutcome::Dispatched { rules: 1 });
        assert_eq!(*cookies.fetched.lock().unwrap(), vec!["https://a.test".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn run_sync_observes_the_configured_delay() {
        let config = SyncConfig::builder()
            .settle_delay(Duration::from_secs(2))
            .build()
            .unwrap();
        let sync = CookieSync::new(Some(config), None, None).unwrap();

        let started = tokio::time::Instant::now();
        sync.run_sync().await;
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn mutations_publish_events() {
        let store = Arc::new(InMemoryStore::new());
        let mut sync = core(&store, None);
        let mut events = sync.subscribe();

        let a = sync.add_rule().await;
        sync.set_selection([a.id]).await;
        sync.delete_rule(a.id).await;
        sync.clear_all().await;

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                SyncEvent::RulesChanged,
                SyncEvent::SelectionChanged,
                SyncEvent::RulesChanged,
                SyncEvent::SelectionChanged,
                SyncEvent::RulesChanged,
                SyncEvent::SelectionChanged,
            ]
        );
    }

    #[tokio::test]
    async fn rule_ids_stay_unique() {
        let store = Arc::new(InMemoryStore::new());
        let mut sync = core(&store, None);
        let mut created = Vec::new();
        for i in 0..10 {
            let rule = sync.add_rule().await;
            if i % 2 == 0 {
                sync.delete_rule(rule.id).await;
            } else {
                created.push(rule.id);
            }
        }
        assert_eq!(sync.rule_ids().len(), sync.rules().len());
        assert_eq!(sync.rules().iter().map(|r| r.id).collect::<Vec<_>>(), created);
    }
}
