//! Listener dispatch shared by both brokers.
//!
//! Every decoded inbound event is handed to every registered [`Listener`],
//! in registration order, one at a time. Listeners decide relevance
//! themselves. A listener that fails, by returning an error or by
//! panicking, is reported and skipped; the remaining listeners still run.

// ============================================================================
// Imports
// ============================================================================

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use parking_lot::RwLock;
use tracing::{error, warn};

use crate::error::Result;
use crate::protocol::Event;

// ============================================================================
// Listener
// ============================================================================

/// A pluggable event handler registered with one or both brokers.
///
/// Listeners live for the whole process and own their private state.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Called for every decoded inbound event, relevant or not.
    async fn on_event(&self, event: &Event) -> Result<()>;

    /// Called when the last browser connection has closed.
    async fn on_all_peers_disconnected(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// ListenerSet
// ============================================================================

/// The dispatch list owned by a broker.
///
/// Registration never deduplicates: a listener registered twice is
/// invoked twice.
#[derive(Default)]
pub struct ListenerSet {
    listeners: RwLock<Vec<Arc<dyn Listener>>>,
}

impl ListenerSet {
    /// Creates an empty set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a listener.
    pub fn register(&self, listener: Arc<dyn Listener>) {
        self.listeners.write().push(listener);
    }

    /// Returns the number of registrations.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Returns `true` if nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Hands `event` to every listener, isolating failures.
    pub async fn dispatch(&self, event: &Event) {
        for listener in self.snapshot() {
            let outcome = AssertUnwindSafe(listener.on_event(event))
                .catch_unwind()
                .await;
            report(listener.name(), "on_event", outcome);
        }
    }

    /// Notifies every listener that no browser is connected any more.
    pub async fn notify_all_disconnected(&self) {
        for listener in self.snapshot() {
            let outcome = AssertUnwindSafe(listener.on_all_peers_disconnected())
                .catch_unwind()
                .await;
            report(listener.name(), "on_all_peers_disconnected", outcome);
        }
    }

    /// Copies the list so no lock is held across listener awaits.
    fn snapshot(&self) -> Vec<Arc<dyn Listener>> {
        self.listeners.read().clone()
    }
}

fn report(
    listener: &str,
    callback: &str,
    outcome: std::thread::Result<Result<()>>,
) {
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!(listener, callback, error = %e, "Listener returned an error");
        }
        Err(_) => {
            error!(listener, callback, "Listener panicked");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::Error;
    use crate::protocol::Origin;

    #[derive(Default)]
    struct Counting {
        events: AtomicUsize,
        disconnects: AtomicUsize,
    }

    #[async_trait]
    impl Listener for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        async fn on_event(&self, _event: &Event) -> Result<()> {
            self.events.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn on_all_peers_disconnected(&self) -> Result<()> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Listener for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn on_event(&self, _event: &Event) -> Result<()> {
            Err(Error::listener("failing", "always"))
        }

        async fn on_all_peers_disconnected(&self) -> Result<()> {
            Err(Error::listener("failing", "always"))
        }
    }

    struct Panicking;

    #[async_trait]
    impl Listener for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn on_event(&self, _event: &Event) -> Result<()> {
            panic!("listener bug");
        }
    }

    fn event() -> Event {
        Event::parse(r#"{"event":"keyUp"}"#, Origin::StreamDeck).expect("event")
    }

    #[tokio::test]
    async fn test_dispatch_reaches_every_listener() {
        let set = ListenerSet::new();
        let a = Arc::new(Counting::default());
        let b = Arc::new(Counting::default());
        set.register(a.clone());
        set.register(b.clone());

        set.dispatch(&event()).await;

        assert_eq!(a.events.load(Ordering::SeqCst), 1);
        assert_eq!(b.events.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_duplicate_registration_dispatches_twice() {
        let set = ListenerSet::new();
        let listener = Arc::new(Counting::default());
        set.register(listener.clone());
        set.register(listener.clone());

        set.dispatch(&event()).await;

        assert_eq!(set.len(), 2);
        assert_eq!(listener.events.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failing_listener_does_not_stop_the_rest() {
        let set = ListenerSet::new();
        let after = Arc::new(Counting::default());
        set.register(Arc::new(Failing));
        set.register(after.clone());

        set.dispatch(&event()).await;
        set.notify_all_disconnected().await;

        assert_eq!(after.events.load(Ordering::SeqCst), 1);
        assert_eq!(after.disconnects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_listener_is_isolated() {
        let set = ListenerSet::new();
        let after = Arc::new(Counting::default());
        set.register(Arc::new(Panicking));
        set.register(after.clone());

        set.dispatch(&event()).await;

        assert_eq!(after.events.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_default_disconnect_callback_is_noop() {
        let set = ListenerSet::new();
        set.register(Arc::new(Panicking));

        // Panicking only overrides on_event.
        set.notify_all_disconnected().await;
        assert!(!set.is_empty());
    }
}
