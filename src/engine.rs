//! Cookie sync core.
//!
//! A user keeps a list of [`rules::Rule`]s, each mapping an origin address to a
//! target address, marks some of them as selected, and asks for a sync run.
//! A run copies every cookie visible at a selected rule's origin onto its
//! target.
//!
//! [`CookieSync`] is the entry point. It is built from an optional
//! [`config::SyncConfig`], an optional [`storage::PersistenceStore`] and an
//! optional [`cookies::CookieProvider`]; both capabilities are supplied by the
//! host.
//!
//! ```
//! # use std::sync::Arc;
//! # use cookie_sync::{CookieSync, SyncOutcome};
//! # use cookie_sync::cookies::{Cookie, InMemoryCookieJar};
//! # use cookie_sync::rules::RuleField;
//! # use cookie_sync::storage::InMemoryStore;
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let jar = Arc::new(InMemoryCookieJar::new());
//! jar.insert("https://app.example.com", Cookie::new("session", "abc"))?;
//!
//! let mut sync = CookieSync::new(None, Some(Arc::new(InMemoryStore::new())), Some(jar.clone()))?;
//! sync.load_initial_state().await;
//!
//! let rule = sync.add_rule().await;
//! sync.update_rule(rule.id, RuleField::Origin, "https://app.example.com").await?;
//! sync.set_selection([rule.id]).await;
//!
//! assert_eq!(sync.run_sync().await, SyncOutcome::Dispatched { rules: 1 });
//! # Ok(()) }
//! ```

pub mod config;
pub mod cookies;
pub mod errors;
pub mod events;
pub mod rules;
pub mod selection;
pub mod storage;

mod cookie_sync;
mod sync;

pub use config::{SyncConfig, SyncConfigBuilder};
pub use cookie_sync::CookieSync;
pub use errors::{CookieSyncError, SyncConfigError};
pub use events::{Subscription, SyncEvent};
pub use sync::{working_set, SyncEngine, SyncOutcome, SyncState};
