//! Meet Deck Bridge - Stream Deck plugin for Google Meet.
//!
//! This library relays control messages between a Stream Deck (through the
//! Stream Deck host application) and Google Meet tabs (through a browser
//! extension).
//!
//! # Architecture
//!
//! The bridge sits between two websocket peers:
//!
//! - **Stream Deck host**: exactly one connection, opened by us, registered
//!   once, and the lifetime of the process
//! - **Browser extension**: any number of connections, opened by Meet tabs
//!   that come and go
//!
//! Key design principles:
//!
//! - Both brokers dispatch every decoded event to every listener; listeners
//!   decide relevance by action id
//! - Listener and per-browser failures are reported and contained
//! - A broken Stream Deck connection ends the process (the host restarts it)
//! - No global state: [`Bridge`] owns the brokers and the listener registry
//!
//! # Quick Start
//!
//! ```no_run
//! use meet_deck_bridge::{Bridge, BridgeConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = BridgeConfig::from_args(std::env::args())?;
//!     Bridge::new(config).run().await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bridge`] | Process lifetime |
//! | [`config`] | Command-line configuration |
//! | [`dispatch`] | [`Listener`] trait and dispatch rules |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`handlers`] | Button listeners |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire message types |
//! | [`registry`] | Listener composition root |
//! | [`transport`] | WebSocket brokers |

// ============================================================================
// Modules
// ============================================================================

/// Process lifetime.
pub mod bridge;

/// Command-line configuration.
pub mod config;

/// Listener trait and dispatch rules shared by both brokers.
pub mod dispatch;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Button listeners.
pub mod handlers;

/// Type-safe identifiers.
pub mod identifiers;

/// Wire message types.
pub mod protocol;

/// Listener composition root.
pub mod registry;

/// WebSocket brokers.
///
/// - [`ExtensionHub`] - server for browser-extension clients
/// - [`ControlSurfaceLink`] - client to the Stream Deck host
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use dispatch::{Listener, ListenerSet};
pub use error::{Error, Result};
pub use handlers::{BrowserOutlet, Outlets, StreamDeckOutlet};
pub use identifiers::ConnectionId;
pub use protocol::{Event, Origin, StreamDeckEventKind};
pub use registry::HandlerRegistry;
pub use transport::{ControlSurfaceLink, ExtensionHub};
