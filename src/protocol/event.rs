//! Inbound event types.
//!
//! Both peers speak text-framed JSON objects carrying at least an `event`
//! field. Stream Deck events addressed to a button also carry `action`
//! (which button type) and `context` (which button instance).
//!
//! # Stream Deck Events
//!
//! | Event | Meaning |
//! |-------|---------|
//! | `keyUp` | Button released after a press |
//! | `willAppear` | Button instance is about to be shown |
//! | `willDisappear` | Button instance was hidden (profile switch, etc.) |
//!
//! Every other Stream Deck event is decoded but ignored by listeners.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value, from_str};

use crate::error::{Error, Result};

// ============================================================================
// Origin
// ============================================================================

/// Which broker an event arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// The Stream Deck host application.
    StreamDeck,
    /// One of the connected browser-extension clients.
    Browser,
}

// ============================================================================
// StreamDeckEventKind
// ============================================================================

/// The Stream Deck events listeners act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamDeckEventKind {
    /// `keyUp`: button actions fire on release.
    KeyUp,
    /// `willAppear`: a button instance became visible.
    WillAppear,
    /// `willDisappear`: a button instance went away.
    WillDisappear,
    /// Anything else (`keyDown`, `deviceDidConnect`, ...).
    Other,
}

impl StreamDeckEventKind {
    /// Classifies a Stream Deck event name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "keyUp" => Self::KeyUp,
            "willAppear" => Self::WillAppear,
            "willDisappear" => Self::WillDisappear,
            _ => Self::Other,
        }
    }
}

// ============================================================================
// Event
// ============================================================================

/// A decoded inbound message.
///
/// Events are created on receipt, dispatched once to every listener, and
/// then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    origin: Origin,
    body: Map<String, Value>,
}

impl Event {
    /// Creates an event from an already-decoded JSON object.
    #[inline]
    #[must_use]
    pub fn new(origin: Origin, body: Map<String, Value>) -> Self {
        Self { origin, body }
    }

    /// Decodes a text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the text is not valid JSON
    /// - [`Error::Protocol`] if the JSON is not an object
    pub fn parse(text: &str, origin: Origin) -> Result<Self> {
        match from_str::<Value>(text)? {
            Value::Object(body) => Ok(Self::new(origin, body)),
            other => Err(Error::protocol(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Returns which peer sent the event.
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> Origin {
        self.origin
    }

    /// Returns the `event` field, if present and a string.
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get_str("event")
    }

    /// Returns the `action` field (Stream Deck button type).
    #[inline]
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.get_str("action")
    }

    /// Returns the `context` field (Stream Deck button instance).
    #[inline]
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.get_str("context")
    }

    /// Classifies the event name as a Stream Deck event.
    #[must_use]
    pub fn kind(&self) -> StreamDeckEventKind {
        self.name()
            .map_or(StreamDeckEventKind::Other, StreamDeckEventKind::from_name)
    }

    /// Returns a raw field.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// Returns a string field.
    #[inline]
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns `true` if the field is present and truthy.
    ///
    /// The browser extension is loose about flag types, so `1` and `"yes"`
    /// count as set; `false`, `0`, `""`, `null` and missing do not.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(is_truthy)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Tests
// ============================================================================
