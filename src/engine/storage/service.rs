use super::area::PersistenceHandle;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;

/// Best-effort bridge between the sync core and a [`PersistenceStore`](super::PersistenceStore).
///
/// When no store is attached every operation is a no-op and reads come back
/// empty. Store failures are logged and swallowed; the in-memory state of the
/// caller stays authoritative for the current session.
#[derive(Clone, Default)]
pub struct Persistence {
    store: Option<PersistenceHandle>,
}

impl Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("available", &self.is_available())
            .finish_non_exhaustive()
    }
}

impl Persistence {
    pub fn new(store: Option<PersistenceHandle>) -> Self {
        Self { store }
    }

    /// An adapter with no backing store.
    pub fn unavailable() -> Self {
        Self { store: None }
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    pub async fn get(&self, keys: &[&str]) -> HashMap<String, Value> {
        let Some(store) = &self.store else {
            return HashMap::new();
        };

        match store.get(owned(keys)).await {
            Ok(values) => values,
            Err(e) => {
                warn!("Persistence: cannot read {:?}: {}", keys, e);
                HashMap::new()
            }
        }
    }

    pub async fn set(&self, items: HashMap<String, Value>) {
        let Some(store) = &self.store else {
            return;
        };

        let keys: Vec<String> = items.keys().cloned().collect();
        if let Err(e) = store.set(items).await {
            warn!("Persistence: cannot write {:?}: {}", keys, e);
        }
    }

    pub async fn remove(&self, keys: &[&str]) {
        let Some(store) = &self.store else {
            return;
        };

        if let Err(e) = store.remove(owned(keys)).await {
            warn!("Persistence: cannot remove {:?}: {}", keys, e);
        }
    }

    /// Reads and decodes a single key, falling back to `T::default()` when the
    /// key is absent or holds something that does not decode as `T`.
    pub async fn load<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let Some(value) = self.get(&[key]).await.remove(key) else {
            return T::default();
        };

        serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("Persistence: discarding malformed value under {:?}: {}", key, e);
            T::default()
        })
    }

    /// Encodes `value` and stores it under `key`.
    pub async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if !self.is_available() {
            return;
        }

        match serde_json::to_value(value) {
            Ok(v) => self.set(HashMap::from([(key.to_string(), v)])).await,
            Err(e) => warn!("Persistence: cannot encode value for {:?}: {}", key, e),
        }
    }
}

fn owned(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryStore, PersistenceStore};
    use anyhow::anyhow;
    use futures::future::BoxFuture;
    use serde_json::json;
    use std::sync::Arc;

    /// Store whose every operation fails.
    struct BrokenStore;

    impl PersistenceStore for BrokenStore {
        fn get(&self, _keys: Vec<String>) -> BoxFuture<'_, anyhow::Result<HashMap<String, Value>>> {
            Box::pin(async { Err::<HashMap<String, Value>, _>(anyhow!("disk on fire")) })
        }
        fn set(&self, _items: HashMap<String, Value>) -> BoxFuture<'_, anyhow::Result<()>> {
            Box::pin(async { Err::<(), _>(anyhow!("disk on fire")) })
        }
        fn remove(&self, _keys: Vec<String>) -> BoxFuture<'_, anyhow::Result<()>> {
            Box::pin(async { Err::<(), _>(anyhow!("disk on fire")) })
        }
    }

    #[tokio::test]
    async fn unavailable_store_is_a_no_op() {
        let p = Persistence::unavailable();
        assert!(!p.is_available());

        p.save("k", &vec![1, 2, 3]).await;
        p.remove(&["k"]).await;
        assert!(p.get(&["k"]).await.is_empty());
        let v: Vec<u32> = p.load("k").await;
        assert!(v.is_empty());
    }

    #[tokio::test]
    async fn failing_store_degrades_silently() {
        let p = Persistence::new(Some(Arc::new(BrokenStore)));

        p.save("k", &vec!["a"]).await;
        p.remove(&["k"]).await;
        assert!(p.get(&["k"]).await.is_empty());
        let v: Vec<String> = p.load("k").await;
        assert!(v.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips_through_store() {
        let store = Arc::new(InMemoryStore::new());
        let p = Persistence::new(Some(store.clone()));

        p.save("numbers", &vec![3u32, 1, 2]).await;
        let v: Vec<u32> = p.load("numbers").await;
        assert_eq!(v, vec![3, 1, 2]);

        let raw = store.get(vec!["numbers".into()]).await.unwrap();
        assert_eq!(raw["numbers"], json!([3, 1, 2]));
    }

    #[tokio::test]
    async fn malformed_value_loads_as_default() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set(HashMap::from([("numbers".to_string(), json!({"not": "a list"}))]))
            .await
            .unwrap();

        let p = Persistence::new(Some(store));
        let v: Vec<u32> = p.load("numbers").await;
        assert!(v.is_empty());
    }
}
