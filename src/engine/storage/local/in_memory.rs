use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use serde_json::Value;

use crate::engine::storage::area::PersistenceStore;

/// In‑memory store (no persistence). Used in tests and when the host does not
/// want state to outlive the process.
#[derive(Default)]
pub struct InMemoryStore {
    map: Mutex<HashMap<String, Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.map.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns all keys in a stable order.
    pub fn keys(&self) -> Vec<String> {
        let mut v: Vec<String> = match self.map.lock() {
            Ok(m) => m.keys().cloned().collect(),
            Err(_) => return vec![],
        };
        v.sort_unstable();
        v
    }
}

impl PersistenceStore for InMemoryStore {
    fn get(&self, keys: Vec<String>) -> BoxFuture<'_, Result<HashMap<String, Value>>> {
        Box::pin(async move {
            let map = self.map.lock().map_err(|_| anyhow!("in-memory store lock poisoned"))?;
            Ok(keys
                .into_iter()
                .filter_map(|k| map.get(&k).cloned().map(|v| (k, v)))
                .collect())
        })
    }

    fn set(&self, items: HashMap<String, Value>) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut map = self.map.lock().map_err(|_| anyhow!("in-memory store lock poisoned"))?;
            map.extend(items);
            Ok(())
        })
    }

    fn remove(&self, keys: Vec<String>) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut map = self.map.lock().map_err(|_| anyhow!("in-memory store lock poisoned"))?;
            for k in &keys {
                map.remove(k);
            }
            Ok(())
        })
    }
}
