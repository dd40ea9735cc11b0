//! In-memory cookie provider.
//!
//! [`InMemoryCookieJar`] is a reference [`CookieProvider`] that keeps cookies
//! in process memory. It is what the demo runs against and what hosts can use
//! when they do not have a cookie database of their own.
//!
//! ## Notes & limitations
//! - Cookies are bucketed by **origin** (`url.origin().ascii_serialization()`).
//!   Within a bucket, path prefix and `Secure` checks are applied on reads.
//! - Writes replace an existing cookie with the same name (last write wins).
//! - Cookies set through [`CookieProvider::set`] are host-only session cookies
//!   whose path defaults to the directory of the request URL.
//! - No expiration or eviction is enforced.
use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Context, Result};
use futures::future::BoxFuture;
use url::Url;

use super::{Cookie, CookieDescriptor, CookieProvider};

#[derive(Debug, Default)]
pub struct InMemoryCookieJar {
    /// Key: origin string from `Url::origin().ascii_serialization()`.
    entries: RwLock<HashMap<String, Vec<Cookie>>>,
}

impl InMemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `cookie` for the origin of `url`, replacing one with the same name.
    pub fn insert(&self, url: &str, cookie: Cookie) -> Result<()> {
        let url = parse(url)?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("cookie jar lock poisoned"))?;
        let bucket = entries.entry(url.origin().ascii_serialization()).or_default();

        if let Some(existing) = bucket.iter_mut().find(|c| c.name == cookie.name) {
            *existing = cookie;
        } else {
            bucket.push(cookie);
        }
        Ok(())
    }

    /// Returns the cookies visible for `url`.
    pub fn cookies_for(&self, url: &str) -> Result<Vec<Cookie>> {
        let url = parse(url)?;
        let path = url.path();
        let is_https = url.scheme() == "https";

        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("cookie jar lock poisoned"))?;
        let Some(cookies) = entries.get(&url.origin().ascii_serialization()) else {
            return Ok(vec![]);
        };

        Ok(cookies
            .iter()
            .filter(|cookie| match &cookie.path {
                Some(cookie_path) => path_matches(path, cookie_path),
                None => true,
            })
            .filter(|cookie| !cookie.secure || is_https)
            .cloned()
            .collect())
    }

    /// Total number of cookies across all origins.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .map(|e| e.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CookieProvider for InMemoryCookieJar {
    fn get_all(&self, url: &str) -> BoxFuture<'_, Result<Vec<Cookie>>> {
        let result = self.cookies_for(url);
        Box::pin(async move { result })
    }

    fn set(&self, cookie: CookieDescriptor) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let path = default_path(&parse(&cookie.url)?);
            let record = Cookie {
                path: Some(path),
                ..Cookie::new(cookie.name, cookie.value)
            };
            self.insert(&cookie.url, record)
        })
    }
}

fn parse(url: &str) -> Result<Url> {
    Url::parse(url).with_context(|| format!("invalid cookie url {url:?}"))
}

/// RFC 6265 path-match: `/app` covers `/app` and `/app/x`, not `/application`.
fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    match request_path.strip_prefix(cookie_path) {
        Some(rest) => rest.is_empty() || cookie_path.ends_with('/') || rest.starts_with('/'),
        None => false,
    }
}

fn default_path(url: &Url) -> String {
    url.path()
        .rsplit_once('/')
        .map_or("/", |(a, _)| if a.is_empty() { "/" } else { a })
        .to_string()
}
