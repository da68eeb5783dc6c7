//! Error types for the bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use meet_deck_bridge::{ControlSurfaceLink, Result};
//!
//! async fn example(link: &ControlSurfaceLink) -> Result<()> {
//!     link.send_outbound_message(r#"{"event":"showOk","context":"ctx1"}"#).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Transport | [`Error::Connection`], [`Error::NotConnected`], [`Error::Io`], [`Error::WebSocket`] |
//! | Decode | [`Error::Json`], [`Error::Protocol`] |
//! | Listener | [`Error::Listener`] |
//!
//! How each category propagates depends on the broker: the extension hub
//! reports and drops everything, the Stream Deck link escalates transport and
//! decode errors on its single connection.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when command-line arguments are missing or invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// WebSocket connection failed.
    ///
    /// Returned when a connection cannot be established or upgraded.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// No connection to send on.
    ///
    /// Returned when sending to the Stream Deck before the link is
    /// established, or after it has gone away.
    #[error("Stream Deck websocket is not open")]
    NotConnected,

    // ========================================================================
    // Decode Errors
    // ========================================================================
    /// Well-formed JSON that is not a usable event.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Listener Errors
    // ========================================================================
    /// A listener callback failed.
    #[error("Listener {listener} failed: {message}")]
    Listener {
        /// Name of the failing listener.
        listener: String,
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a listener error.
    #[inline]
    pub fn listener(listener: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Listener {
            listener: listener.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a transport-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::NotConnected
                | Self::Io(_)
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the error came from decoding an inbound message.
    #[inline]
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::Json(_) | Self::Protocol { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("refused");
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_listener_error_display() {
        let err = Error::listener("togglemic", "boom");
        assert_eq!(err.to_string(), "Listener togglemic failed: boom");
    }

    #[test]
    fn test_not_connected_display() {
        assert_eq!(
            Error::NotConnected.to_string(),
            "Stream Deck websocket is not open"
        );
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("x").is_connection_error());
        assert!(Error::NotConnected.is_connection_error());
        assert!(!Error::config("x").is_connection_error());
        assert!(!Error::protocol("x").is_connection_error());
    }

    #[test]
    fn test_is_decode_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        assert!(Error::from(json_err).is_decode_error());
        assert!(Error::protocol("not an object").is_decode_error());
        assert!(!Error::NotConnected.is_decode_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::AddrInUse, "port in use");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.is_connection_error());
    }
}
