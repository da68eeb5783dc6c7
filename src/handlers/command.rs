//! Fire-and-forget buttons that send one fixed command to the browser.

use async_trait::async_trait;
use tracing::debug;

use super::{ActionMatch, Outlets};
use crate::dispatch::Listener;
use crate::error::Result;
use crate::protocol::{BrowserCommand, Event};

/// Broadcasts `{"event": <command>}` whenever its button is released.
///
/// Used for stateless buttons such as leave call, mute, or show chat.
pub struct BrowserCommandListener {
    action: ActionMatch,
    command: String,
    outlets: Outlets,
}

impl BrowserCommandListener {
    /// Creates a listener for the exact `action` id.
    #[must_use]
    pub fn new(action: impl Into<String>, command: impl Into<String>, outlets: Outlets) -> Self {
        Self {
            action: ActionMatch::Exact(action.into()),
            command: command.into(),
            outlets,
        }
    }
}

#[async_trait]
impl Listener for BrowserCommandListener {
    fn name(&self) -> &str {
        self.action.pattern()
    }

    async fn on_event(&self, event: &Event) -> Result<()> {
        if self.action.key_up(event).is_none() {
            return Ok(());
        }

        let message = BrowserCommand::simple(&self.command).to_json()?;
        let delivered = self.outlets.browser.broadcast(&message).await;
        debug!(command = %self.command, delivered, "Browser command sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::handlers::testing::{browser_event, deck_event, outlets};

    const LEAVE: &str = "com.chrisregado.googlemeet.leavecall";

    #[tokio::test]
    async fn test_key_up_broadcasts_command() {
        let (outlets, deck, hub) = outlets(1);
        let listener = BrowserCommandListener::new(LEAVE, "leaveCall", outlets);

        listener
            .on_event(&deck_event("keyUp", LEAVE, "ctx1"))
            .await
            .expect("dispatch");

        assert_eq!(*hub.broadcasts.lock(), vec![json!({"event": "leaveCall"})]);
        assert!(deck.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_ignores_other_events() {
        let (outlets, _deck, hub) = outlets(1);
        let listener = BrowserCommandListener::new(LEAVE, "leaveCall", outlets);

        listener
            .on_event(&deck_event("keyDown", LEAVE, "ctx1"))
            .await
            .expect("dispatch");
        listener
            .on_event(&deck_event("keyUp", "com.chrisregado.googlemeet.mutemic", "ctx1"))
            .await
            .expect("dispatch");
        listener
            .on_event(&browser_event(r#"{"event":"keyUp","action":"com.chrisregado.googlemeet.leavecall"}"#))
            .await
            .expect("dispatch");

        assert!(hub.broadcasts.lock().is_empty());
    }
}
