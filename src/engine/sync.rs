//! Sync engine: copies cookies from each selected rule's origin to its target.
//!
//! A run goes **Idle → Syncing → Idle**. While a run is `Syncing`, further
//! [`SyncEngine::run`] calls return [`SyncOutcome::Skipped`] without doing
//! anything.
//!
//! # Completion semantics
//!
//! Cookie copies are detached tasks. A run does not wait for them; it returns
//! to `Idle` once the configured settle delay has passed since it started.
//! `Idle` therefore means "the delay elapsed", not "every copy landed", and a
//! new run may start while copies of the previous one are still outstanding.
//!
//! Provider failures are logged and otherwise ignored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::cookies::{CookieDescriptor, CookieProviderHandle};
use crate::events::{publish, SyncEvent};
use crate::rules::{Rule, RuleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Syncing,
}

/// Result of a [`SyncEngine::run`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another run was in progress; this request was dropped.
    Skipped,
    /// The run went through its settle delay after dispatching copies for
    /// `rules` rules. Copies may still be in flight.
    Dispatched { rules: usize },
}

/// Orchestrates cookie copies for the selected rules.
///
/// Clones share the same `Syncing` guard.
#[derive(Clone)]
pub struct SyncEngine {
    cookies: Option<CookieProviderHandle>,
    syncing: Arc<AtomicBool>,
    settle_delay: Duration,
    event_tx: broadcast::Sender<SyncEvent>,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("has_cookie_provider", &self.cookies.is_some())
            .field("state", &self.state())
            .field("settle_delay", &self.settle_delay)
            .finish()
    }
}

impl SyncEngine {
    pub fn new(
        cookies: Option<CookieProviderHandle>,
        settle_delay: Duration,
        event_tx: broadcast::Sender<SyncEvent>,
    ) -> Self {
        Self {
            cookies,
            syncing: Arc::new(AtomicBool::new(false)),
            settle_delay,
            event_tx,
        }
    }

    pub fn state(&self) -> SyncState {
        if self.is_syncing() {
            SyncState::Syncing
        } else {
            SyncState::Idle
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Runs one sync over `rules`, restricted to the ids in `selected`.
    ///
    /// Returns once the settle delay has elapsed, or immediately with
    /// [`SyncOutcome::Skipped`] if a run is already in progress.
    pub async fn run(&self, rules: &[Rule], selected: &[RuleId]) -> SyncOutcome {
        let started = Instant::now();
        let Some(guard) = SyncingGuard::acquire(&self.syncing) else {
            debug!("SyncEngine: run already in progress, dropping request");
            return SyncOutcome::Skipped;
        };

        let working = working_set(rules, selected);
        let dispatched = match &self.cookies {
            Some(provider) => {
                let count = working.len();
                for rule in working {
                    spawn_copy(provider.clone(), rule);
                }
                count
            }
            None => {
                debug!("SyncEngine: no cookie provider, nothing to copy");
                0
            }
        };

        info!("SyncEngine: dispatched cookie copies for {} rule(s)", dispatched);
        publish(&self.event_tx, SyncEvent::SyncStarted { rules: dispatched });

        tokio::time::sleep_until(started + self.settle_delay).await;

        drop(guard);
        publish(&self.event_tx, SyncEvent::SyncFinished);
        SyncOutcome::Dispatched { rules: dispatched }
    }
}

/// Rules that take part in a run: selected and with a non-empty origin.
pub fn working_set(rules: &[Rule], selected: &[RuleId]) -> Vec<Rule> {
    rules
        .iter()
        .filter(|r| selected.contains(&r.id) && !r.is_inert())
        .cloned()
        .collect()
}

/// Fetches the cookies of `rule.origin` and writes each one to `rule.target`,
/// all on detached tasks.
fn spawn_copy(provider: CookieProviderHandle, rule: Rule) {
    tokio::spawn(async move {
        let cookies = match provider.get_all(&rule.origin).await {
            Ok(cookies) => cookies,
            Err(e) => {
                warn!("SyncEngine: rule {}: cannot read cookies from {:?}: {:#}", rule.id, rule.origin, e);
                return;
            }
        };

        debug!("SyncEngine: rule {}: copying {} cookie(s) to {:?}", rule.id, cookies.len(), rule.target);
        for cookie in cookies {
            let provider = provider.clone();
            let descriptor = CookieDescriptor::copy_of(cookie, rule.target.clone());
            tokio::spawn(async move {
                if let Err(e) = provider.set(descriptor.clone()).await {
                    warn!("SyncEngine: cannot set cookie {:?} at {:?}: {:#}", descriptor.name, descriptor.url, e);
                }
            });
        }
    });
}

/// Holds the `Syncing` flag for the lifetime of a run, including a run whose
/// future is dropped before it settles.
struct SyncingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SyncingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
