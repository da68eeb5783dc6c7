//! Button listeners.
//!
//! Each listener reacts to one Stream Deck action (or a family sharing a
//! prefix) and to the browser notifications that belong to it. Listeners
//! talk to the peers through two narrow outlets instead of the brokers
//! themselves, which keeps them testable without sockets.
//!
//! # Variants
//!
//! | Variant | Stream Deck side | Browser side |
//! |---------|------------------|--------------|
//! | [`ToggleListener`] | tracks contexts, toggles on `keyUp` | mirrors state onto buttons |
//! | [`BrowserCommandListener`] | broadcasts a fixed command on `keyUp` | - |
//! | [`EmojiReactListener`] | broadcasts the emoji encoded in the action | - |
//! | [`OpenUrlListener`] | asks the host to open a URL on `keyUp` | - |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::{Event, Origin, StreamDeckEventKind};

// ============================================================================
// Submodules
// ============================================================================

mod command;
mod emoji;
mod open_url;
mod toggle;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::BrowserCommandListener;
pub use emoji::EmojiReactListener;
pub use open_url::OpenUrlListener;
pub use toggle::{ToggleListener, ToggleProfile, ToggleState};

// ============================================================================
// Outlets
// ============================================================================

/// Sending side of the Stream Deck link.
#[async_trait]
pub trait StreamDeckOutlet: Send + Sync {
    /// Sends one message to the Stream Deck host.
    async fn send_outbound_message(&self, message: &str) -> Result<()>;
}

/// Sending side of the extension hub.
#[async_trait]
pub trait BrowserOutlet: Send + Sync {
    /// Sends one message to every connected browser, returning how many
    /// received it. Never fails.
    async fn broadcast(&self, message: &str) -> usize;

    /// Number of connected browsers.
    fn connection_count(&self) -> usize;
}

/// Both outlets, handed to every listener at construction.
#[derive(Clone)]
pub struct Outlets {
    /// Stream Deck host.
    pub stream_deck: Arc<dyn StreamDeckOutlet>,
    /// Browser extension clients.
    pub browser: Arc<dyn BrowserOutlet>,
}

impl Outlets {
    /// Bundles the two outlets.
    #[inline]
    #[must_use]
    pub fn new(stream_deck: Arc<dyn StreamDeckOutlet>, browser: Arc<dyn BrowserOutlet>) -> Self {
        Self {
            stream_deck,
            browser,
        }
    }
}

// ============================================================================
// ActionMatch
// ============================================================================

/// How a listener recognizes its Stream Deck action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionMatch {
    /// The action id must be equal.
    Exact(String),
    /// The action id must start with the prefix.
    Prefix(String),
}

impl ActionMatch {
    /// Returns `true` if `action` belongs to this listener.
    #[must_use]
    pub fn matches(&self, action: &str) -> bool {
        match self {
            Self::Exact(id) => action == id,
            Self::Prefix(prefix) => action.starts_with(prefix.as_str()),
        }
    }

    /// The configured id or prefix.
    #[inline]
    #[must_use]
    pub fn pattern(&self) -> &str {
        match self {
            Self::Exact(s) | Self::Prefix(s) => s,
        }
    }

    /// Returns the matched action if `event` is a Stream Deck `keyUp` for
    /// this listener.
    fn key_up<'e>(&self, event: &'e Event) -> Option<&'e str> {
        if event.origin() != Origin::StreamDeck || event.kind() != StreamDeckEventKind::KeyUp {
            return None;
        }
        event.action().filter(|action| self.matches(action))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_exact_match() {
        let m = ActionMatch::Exact("com.chrisregado.googlemeet.togglemic".into());
        assert!(m.matches("com.chrisregado.googlemeet.togglemic"));
        assert!(!m.matches("com.chrisregado.googlemeet.togglemicx"));
        assert!(!m.matches("com.chrisregado.googlemeet.togglecamera"));
    }

    #[test]
    fn test_prefix_match() {
        let m = ActionMatch::Prefix("com.chrisregado.googlemeet.emojireact.".into());
        assert!(m.matches("com.chrisregado.googlemeet.emojireact.👍"));
        assert!(!m.matches("com.chrisregado.googlemeet.togglemic"));
        assert_eq!(m.pattern(), "com.chrisregado.googlemeet.emojireact.");
    }

    proptest! {
        #[test]
        fn prefix_matches_any_suffix(prefix in "[a-z.]{1,20}", suffix in ".{0,10}") {
            let m = ActionMatch::Prefix(prefix.clone());
            let action = format!("{prefix}{suffix}");
            prop_assert!(m.matches(&action));
        }

        #[test]
        fn exact_matches_only_itself(id in "[a-z.]{1,20}", other in "[a-z.]{1,20}") {
            let m = ActionMatch::Exact(id.clone());
            prop_assert!(m.matches(&id));
            prop_assert_eq!(m.matches(&other), id == other);
        }
    }
}
