//! Buttons that ask the Stream Deck host to open a web page.

use async_trait::async_trait;

use super::{ActionMatch, Outlets};
use crate::dispatch::Listener;
use crate::error::Result;
use crate::protocol::{Event, StreamDeckCommand};

/// Sends `openUrl` to the Stream Deck host on release.
///
/// Works without any browser connected, which is the point: it is how the
/// user gets to a meeting in the first place.
pub struct OpenUrlListener {
    action: ActionMatch,
    url: String,
    outlets: Outlets,
}

impl OpenUrlListener {
    /// Creates a listener for the exact `action` id.
    #[must_use]
    pub fn new(action: impl Into<String>, url: impl Into<String>, outlets: Outlets) -> Self {
        Self {
            action: ActionMatch::Exact(action.into()),
            url: url.into(),
            outlets,
        }
    }
}

#[async_trait]
impl Listener for OpenUrlListener {
    fn name(&self) -> &str {
        self.action.pattern()
    }

    async fn on_event(&self, event: &Event) -> Result<()> {
        if self.action.key_up(event).is_none() {
            return Ok(());
        }
        let message = StreamDeckCommand::open_url(&self.url).to_json()?;
        self.outlets.stream_deck.send_outbound_message(&message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::handlers::testing::{deck_event, outlets};

    const OPEN: &str = "com.chrisregado.googlemeet.openmeet";

    #[tokio::test]
    async fn test_key_up_opens_url_without_browsers() {
        let (outlets, deck, hub) = outlets(0);
        let listener = OpenUrlListener::new(OPEN, "https://meet.google.com/landing", outlets);

        listener
            .on_event(&deck_event("keyUp", OPEN, "ctx1"))
            .await
            .expect("dispatch");

        assert_eq!(
            *deck.sent.lock(),
            vec![json!({"event": "openUrl", "payload": {"url": "https://meet.google.com/landing"}})]
        );
        assert!(hub.broadcasts.lock().is_empty());
    }
}
