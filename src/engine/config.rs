//! Sync configuration.
//!
//! `SyncConfig` controls the behavior of a [`CookieSync`](crate::engine::CookieSync)
//! instance: how long a sync run takes to settle, which placeholder target new rules
//! receive, and which keys are used in the persistent store.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use cookie_sync::config::SyncConfig;
//! let cfg = SyncConfig::default();
//! assert_eq!(cfg.default_target, "http://localhost");
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use std::time::Duration;
//! use cookie_sync::config::SyncConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = SyncConfig::builder()
//!     .settle_delay(Duration::from_millis(500))
//!     .default_target("https://localhost:3000")
//!     .build()?; // returns Result<SyncConfig, SyncConfigError>
//! # Ok(()) }
//! ```
//!
//! # Fields (summary)
//! - `settle_delay`: Minimum time a sync run reports `Syncing` (default: 300ms).
//! - `default_target`: Target address given to freshly added rules (default: `http://localhost`).
//! - `rules_key`: Persisted key for the rule collection (default: `plugin_cookies`).
//! - `selection_key`: Persisted key for the selection set (default: `plugin_cookies_selected_keys`).
//! - `event_capacity`: Capacity of the change notification channel (default: 64).

use std::time::Duration;

use crate::errors::SyncConfigError;
use crate::rules::is_valid_address;

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(300);
pub const DEFAULT_TARGET: &str = "http://localhost";
pub const DEFAULT_RULES_KEY: &str = "plugin_cookies";
pub const DEFAULT_SELECTION_KEY: &str = "plugin_cookies_selected_keys";
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub settle_delay: Duration,
    pub default_target: String,
    pub rules_key: String,
    pub selection_key: String,
    pub event_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            default_target: DEFAULT_TARGET.to_string(),
            rules_key: DEFAULT_RULES_KEY.to_string(),
            selection_key: DEFAULT_SELECTION_KEY.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl SyncConfig {
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Checks a config that was assembled by hand rather than through the builder.
    pub fn validate(&self) -> Result<(), SyncConfigError> {
        validate(self)
    }
}

/// Builder for [`SyncConfig`].
#[derive(Debug, Clone, Default)]
pub struct SyncConfigBuilder {
    inner: SyncConfig,
}

impl SyncConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut SyncConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn settle_delay(self, delay: Duration) -> Self { self.map(|c| c.settle_delay = delay) }
    pub fn default_target<S: Into<String>>(self, target: S) -> Self { self.map(|c| c.default_target = target.into()) }
    pub fn rules_key<S: Into<String>>(self, key: S) -> Self { self.map(|c| c.rules_key = key.into()) }
    pub fn selection_key<S: Into<String>>(self, key: S) -> Self { self.map(|c| c.selection_key = key.into()) }
    pub fn event_capacity(self, n: usize) -> Self { self.map(|c| c.event_capacity = n) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut SyncConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<SyncConfig, SyncConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

fn validate(c: &SyncConfig) -> Result<(), SyncConfigError> {
    if c.settle_delay.is_zero() {
        return Err(SyncConfigError::ZeroSettleDelay);
    }
    if !is_valid_address(&c.default_target) {
        return Err(SyncConfigError::InvalidDefaultTarget(c.default_target.clone()));
    }
    if c.rules_key.is_empty() || c.selection_key.is_empty() {
        return Err(SyncConfigError::EmptyKey);
    }
    if c.rules_key == c.selection_key {
        return Err(SyncConfigError::DuplicateKey(c.rules_key.clone()));
    }
    if c.event_capacity == 0 {
        return Err(SyncConfigError::ZeroEventCapacity);
    }
    Ok(())
}
