//! Change notifications.
//!
//! [`SyncEvent`]s are published on a broadcast channel whenever the state owned
//! by a [`CookieSync`](crate::engine::CookieSync) changes, so a UI can redraw
//! its rule table or toggle a busy indicator without polling.
//!
//! Sending with no subscribers is not an error; events are simply dropped.

use tokio::sync::broadcast;

/// A handle for receiving change notifications.
pub type Subscription = broadcast::Receiver<SyncEvent>;

/// Events emitted by the sync core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Persisted state was read at startup
    StateLoaded {
        /// Number of rules loaded
        rules: usize,
        /// Number of selected rules after pruning
        selected: usize,
    },
    /// A rule was added, edited or deleted, or all rules were cleared
    RulesChanged,
    /// The selection set changed
    SelectionChanged,
    /// A sync run started and dispatched copies for `rules` rules
    SyncStarted {
        rules: usize,
    },
    /// A sync run returned to idle. Copies may still be in flight.
    SyncFinished,
}

/// Publishes `event` on `tx`, ignoring the absence of subscribers.
pub(crate) fn publish(tx: &broadcast::Sender<SyncEvent>, event: SyncEvent) {
    // broadcast::Sender::send() fails only when there are 0 receivers.
    let _ = tx.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_fine() {
        let (tx, rx) = broadcast::channel(4);
        drop(rx);
        publish(&tx, SyncEvent::RulesChanged);
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let (tx, mut rx) = broadcast::channel(4);
        publish(&tx, SyncEvent::SyncStarted { rules: 2 });
        publish(&tx, SyncEvent::SyncFinished);

        assert_eq!(rx.recv().await.unwrap(), SyncEvent::SyncStarted { rules: 2 });
        assert_eq!(rx.recv().await.unwrap(), SyncEvent::SyncFinished);
    }
}
