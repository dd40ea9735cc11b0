//! Cookie core types.
//!
//! [`Cookie`] is what a [`CookieProvider`](super::CookieProvider) hands back when
//! asked for the cookies visible at an address. It carries the full attribute
//! set so hosts can report what they have, but the sync engine only copies
//! `name` and `value`.
//!
//! [`CookieDescriptor`] is the request to create or overwrite a cookie.
//!
//! ```
//! use cookie_sync::cookies::{Cookie, CookieDescriptor};
//!
//! let seen = Cookie {
//!     secure: true,
//!     same_site: Some("Lax".into()),
//!     ..Cookie::new("session", "abc123")
//! };
//! let copy = CookieDescriptor::copy_of(seen, "http://localhost:3000");
//! assert_eq!((copy.name.as_str(), copy.value.as_str()), ("session", "abc123"));
//! ```

use serde::{Deserialize, Serialize};

/// A cookie as reported by a cookie provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name (case-sensitive).
    pub name: String,

    /// Raw cookie value (not URL-decoded).
    pub value: String,

    /// Path scoping (e.g., `"/"`).
    #[serde(default)]
    pub path: Option<String>,

    /// Domain scoping (host-only if `None`).
    #[serde(default)]
    pub domain: Option<String>,

    /// If `true`, cookie is sent only over HTTPS.
    #[serde(default)]
    pub secure: bool,

    /// Expiration timestamp, if any. Session cookies have `None`.
    #[serde(default)]
    pub expires: Option<String>,

    /// SameSite policy (`"Strict"`, `"Lax"`, or `"None"`).
    #[serde(default)]
    pub same_site: Option<String>,

    /// If `true`, cookie is blocked from access by client-side scripts.
    #[serde(default)]
    pub http_only: bool,
}

impl Cookie {
    /// A host-only session cookie with no attributes set.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            secure: false,
            expires: None,
            same_site: None,
            http_only: false,
        }
    }
}

/// Request to set a cookie named `name` with `value` at `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieDescriptor {
    pub url: String,
    pub name: String,
    pub value: String,
}

impl CookieDescriptor {
    /// Describes a copy of `cookie` addressed at `url`. Only the name and value
    /// travel; every other attribute is left to the provider's defaults.
    pub fn copy_of(cookie: Cookie, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: cookie.name,
            value: cookie.value,
        }
    }
}
