//! Outbound message types.
//!
//! # Stream Deck Host
//!
//! ```json
//! {"event": "<registerEvent>", "uuid": "<pluginUUID>"}
//! {"event": "setState", "context": "<context>", "payload": {"state": 1}}
//! {"event": "openUrl", "payload": {"url": "https://meet.google.com/landing"}}
//! ```
//!
//! # Browser Extension
//!
//! ```json
//! {"event": "toggleMic"}
//! {"event": "emojiReact", "emojiChar": "👍"}
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::to_string;

use crate::error::Result;

// ============================================================================
// Registration
// ============================================================================

/// The one-time plugin registration sent right after connecting to the
/// Stream Deck host, before any other traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    /// Registration event name handed to us on the command line.
    pub event: String,
    /// Plugin instance UUID handed to us on the command line.
    pub uuid: String,
}

impl Registration {
    /// Creates a registration message.
    #[inline]
    #[must_use]
    pub fn new(event: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            uuid: uuid.into(),
        }
    }

    /// Serializes to a text frame.
    pub fn to_json(&self) -> Result<String> {
        Ok(to_string(self)?)
    }
}

// ============================================================================
// StreamDeckCommand
// ============================================================================

/// Commands sent to the Stream Deck host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum StreamDeckCommand {
    /// Switch a button instance to one of its manifest-defined states.
    SetState {
        /// Button instance.
        context: String,
        /// State index.
        payload: StatePayload,
    },

    /// Open a URL in the user's default browser.
    OpenUrl {
        /// URL wrapper.
        payload: UrlPayload,
    },
}

/// Payload of [`StreamDeckCommand::SetState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatePayload {
    /// State index from the plugin manifest.
    pub state: u8,
}

/// Payload of [`StreamDeckCommand::OpenUrl`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlPayload {
    /// URL to open.
    pub url: String,
}

impl StreamDeckCommand {
    /// Creates a `setState` command.
    #[inline]
    #[must_use]
    pub fn set_state(context: impl Into<String>, state: u8) -> Self {
        Self::SetState {
            context: context.into(),
            payload: StatePayload { state },
        }
    }

    /// Creates an `openUrl` command.
    #[inline]
    #[must_use]
    pub fn open_url(url: impl Into<String>) -> Self {
        Self::OpenUrl {
            payload: UrlPayload { url: url.into() },
        }
    }

    /// Serializes to a text frame.
    pub fn to_json(&self) -> Result<String> {
        Ok(to_string(self)?)
    }
}

// ============================================================================
// BrowserCommand
// ============================================================================

/// Commands broadcast to browser-extension clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserCommand {
    /// Command name, e.g. `toggleMic` or `getCameraState`.
    pub event: String,

    /// Emoji to react with, only set for `emojiReact`.
    #[serde(rename = "emojiChar", skip_serializing_if = "Option::is_none")]
    pub emoji_char: Option<String>,
}

impl BrowserCommand {
    /// Creates a bare `{"event": name}` command.
    #[inline]
    #[must_use]
    pub fn simple(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            emoji_char: None,
        }
    }

    /// Creates an `emojiReact` command.
    #[inline]
    #[must_use]
    pub fn emoji_react(emoji: impl Into<String>) -> Self {
        Self {
            event: "emojiReact".to_string(),
            emoji_char: Some(emoji.into()),
        }
    }

    /// Serializes to a text frame.
    pub fn to_json(&self) -> Result<String> {
        Ok(to_string(self)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
