//! Cookie provider capability.
//!
//! The host runtime owns the actual cookie database (a browser profile, a
//! WebDriver session, an HTTP client jar). It exposes it to the sync core
//! through [`CookieProvider`], which is injected into
//! [`CookieSync`](crate::engine::CookieSync) at construction time.

use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;

use super::{Cookie, CookieDescriptor};

/// Host capability for reading and writing cookies by address.
///
/// Implementations must be `Send + Sync` and internally synchronized; the sync
/// engine calls them from detached tasks with no ordering between calls.
pub trait CookieProvider: Send + Sync {
    /// Returns every cookie visible for `url`, in no particular order.
    fn get_all(&self, url: &str) -> BoxFuture<'_, Result<Vec<Cookie>>>;

    /// Creates or overwrites the cookie described by `cookie`.
    fn set(&self, cookie: CookieDescriptor) -> BoxFuture<'_, Result<()>>;
}

/// A handle to a type-erased [`CookieProvider`].
pub type CookieProviderHandle = Arc<dyn CookieProvider>;
