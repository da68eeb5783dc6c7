//! Emoji reaction buttons.
//!
//! One listener serves every emoji button: the emoji itself is the tail of
//! the action id, e.g. `com.chrisregado.googlemeet.emojireact.👍`.

use async_trait::async_trait;

use super::{ActionMatch, Outlets};
use crate::dispatch::Listener;
use crate::error::{Error, Result};
use crate::protocol::{BrowserCommand, Event};

/// Broadcasts `{"event":"emojiReact","emojiChar":<emoji>}` on release.
pub struct EmojiReactListener {
    action: ActionMatch,
    outlets: Outlets,
}

impl EmojiReactListener {
    /// Creates a listener for every action starting with `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>, outlets: Outlets) -> Self {
        Self {
            action: ActionMatch::Prefix(prefix.into()),
            outlets,
        }
    }

    fn emoji_of<'a>(&self, action: &'a str) -> Option<&'a str> {
        action
            .strip_prefix(self.action.pattern())
            .filter(|emoji| !emoji.is_empty())
    }
}

#[async_trait]
impl Listener for EmojiReactListener {
    fn name(&self) -> &str {
        self.action.pattern()
    }

    async fn on_event(&self, event: &Event) -> Result<()> {
        let Some(action) = self.action.key_up(event) else {
            return Ok(());
        };
        let emoji = self
            .emoji_of(action)
            .ok_or_else(|| Error::listener(self.name(), format!("no emoji in action {action}")))?;

        let message = BrowserCommand::emoji_react(emoji).to_json()?;
        self.outlets.browser.broadcast(&message).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::handlers::testing::{deck_event, outlets};

    const PREFIX: &str = "com.chrisregado.googlemeet.emojireact.";

    #[tokio::test]
    async fn test_broadcasts_emoji_from_action() {
        let (outlets, _deck, hub) = outlets(1);
        let listener = EmojiReactListener::new(PREFIX, outlets);

        listener
            .on_event(&deck_event("keyUp", &format!("{PREFIX}🎉"), "ctx1"))
            .await
            .expect("dispatch");

        assert_eq!(
            *hub.broadcasts.lock(),
            vec![json!({"event": "emojiReact", "emojiChar": "🎉"})]
        );
    }

    #[tokio::test]
    async fn test_empty_emoji_is_an_error() {
        let (outlets, _deck, hub) = outlets(1);
        let listener = EmojiReactListener::new(PREFIX, outlets);

        let result = listener.on_event(&deck_event("keyUp", PREFIX, "ctx1")).await;

        assert!(matches!(result, Err(Error::Listener { .. })));
        assert!(hub.broadcasts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_will_appear_is_ignored() {
        let (outlets, _deck, hub) = outlets(1);
        let listener = EmojiReactListener::new(PREFIX, outlets);

        listener
            .on_event(&deck_event("willAppear", &format!("{PREFIX}👍"), "ctx1"))
            .await
            .expect("dispatch");

        assert!(hub.broadcasts.lock().is_empty());
    }
}
