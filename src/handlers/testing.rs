//! In-memory outlets for listener tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::{BrowserOutlet, Outlets, StreamDeckOutlet};
use crate::error::{Error, Result};
use crate::protocol::{Event, Origin};

/// Records every message sent to the Stream Deck.
#[derive(Default)]
pub(crate) struct RecordingDeck {
    pub sent: Mutex<Vec<Value>>,
    pub disconnected: AtomicBool,
}

#[async_trait]
impl StreamDeckOutlet for RecordingDeck {
    async fn send_outbound_message(&self, message: &str) -> Result<()> {
        if self.disconnected.load(Ordering::SeqCst) {
            return Err(Error::NotConnected);
        }
        self.sent.lock().push(serde_json::from_str(message)?);
        Ok(())
    }
}

/// Pretends to be a hub with a configurable number of browsers.
///
/// Every broadcast attempt is recorded, even with zero browsers.
#[derive(Default)]
pub(crate) struct FakeBrowsers {
    pub connected: AtomicUsize,
    pub broadcasts: Mutex<Vec<Value>>,
}

#[async_trait]
impl BrowserOutlet for FakeBrowsers {
    async fn broadcast(&self, message: &str) -> usize {
        if let Ok(value) = serde_json::from_str(message) {
            self.broadcasts.lock().push(value);
        }
        self.connected.load(Ordering::SeqCst)
    }

    fn connection_count(&self) -> usize {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Builds outlets around fresh fakes with `browsers` connected clients.
pub(crate) fn outlets(browsers: usize) -> (Outlets, Arc<RecordingDeck>, Arc<FakeBrowsers>) {
    let deck = Arc::new(RecordingDeck::default());
    let hub = Arc::new(FakeBrowsers::default());
    hub.connected.store(browsers, Ordering::SeqCst);
    (Outlets::new(deck.clone(), hub.clone()), deck, hub)
}

/// Builds a Stream Deck event.
pub(crate) fn deck_event(name: &str, action: &str, context: &str) -> Event {
    let text = serde_json::json!({"event": name, "action": action, "context": context}).to_string();
    Event::parse(&text, Origin::StreamDeck).expect("valid event")
}

/// Builds a browser event from raw JSON.
pub(crate) fn browser_event(text: &str) -> Event {
    Event::parse(text, Origin::Browser).expect("valid event")
}
