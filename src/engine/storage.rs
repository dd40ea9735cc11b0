//! Persistence for the sync core.
//!
//! Rules and the selection set are saved through a [`PersistenceStore`], an
//! asynchronous key/value store owned by the host. The core never talks to a
//! store directly; it goes through the [`Persistence`] adapter, which turns a
//! missing or failing store into silent no-ops.
//!
//! # Available types
//!
//! - [`PersistenceStore`] - Trait for any storage backend.
//! - [`PersistenceHandle`] - Shared, type-erased store handle.
//! - [`Persistence`] - Best-effort adapter used by the rule store and selection tracker.
//! - [`InMemoryStore`] - Non-persistent backend, for tests and private sessions.
//! - [`JsonFileStore`] - All keys in a single JSON document on disk.
//! - [`SqliteStore`] - SQLite-backed store (feature `sqlite_store`).
//!
//! # Choosing a backend
//!
//! - For persistence across restarts, use [`SqliteStore`] or [`JsonFileStore`].
//! - For testing, use [`InMemoryStore`].
//! - Passing no store at all is valid: state then lives for the session only.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cookie_sync::storage::JsonFileStore;
//! use cookie_sync::CookieSync;
//!
//! # async fn run() -> Result<(), cookie_sync::CookieSyncError> {
//! let store = Arc::new(JsonFileStore::new("cookie-sync.json"));
//! let mut sync = CookieSync::new(None, Some(store), None)?;
//! sync.load_initial_state().await;
//! # Ok(()) }
//! ```

/// Storage trait module, defining the key/value store interface.
pub mod area;
/// Adapter module, wrapping an optional store with best-effort semantics.
pub mod service;

/// Store backends.
pub mod local {
    /// In-memory store implementation.
    pub mod in_memory;
    /// JSON file store implementation.
    pub mod json_store;
    /// SQLite-backed store implementation.
    #[cfg(feature = "sqlite_store")]
    pub mod sqlite_store;
}

pub use area::{PersistenceHandle, PersistenceStore};
pub use local::in_memory::InMemoryStore;
pub use local::json_store::JsonFileStore;
#[cfg(feature = "sqlite_store")]
pub use local::sqlite_store::SqliteStore;
pub use service::Persistence;
