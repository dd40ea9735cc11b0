use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;
use serde_json::Value;

/// Object-safe asynchronous key/value store that survives restarts.
///
/// This is the host's persistent storage as seen by the sync core. It holds
/// plain JSON values and has no knowledge of rules or selections.
///
/// No ordering is guaranteed between independent calls. Callers sequence
/// reads and writes that must not interleave.
pub trait PersistenceStore: Send + Sync {
    /// Returns the stored values for `keys`. Keys that are not present are
    /// simply absent from the returned map.
    fn get(&self, keys: Vec<String>) -> BoxFuture<'_, Result<HashMap<String, Value>>>;

    /// Stores every entry of `items`, overwriting existing values.
    fn set(&self, items: HashMap<String, Value>) -> BoxFuture<'_, Result<()>>;

    /// Removes `keys`. Removing a missing key is not an error.
    fn remove(&self, keys: Vec<String>) -> BoxFuture<'_, Result<()>>;
}

/// Shared handle to a type-erased [`PersistenceStore`].
pub type PersistenceHandle = Arc<dyn PersistenceStore>;
