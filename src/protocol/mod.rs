//! WebSocket protocol message types.
//!
//! Both sides of the bridge exchange text-framed JSON objects.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Event` | Stream Deck → Bridge | Button lifecycle and key presses |
//! | `Registration` | Bridge → Stream Deck | One-time plugin registration |
//! | `StreamDeckCommand` | Bridge → Stream Deck | `setState`, `openUrl` |
//! | `Event` | Browser → Bridge | Meeting state notifications |
//! | `BrowserCommand` | Bridge → Browser | Toggle/request commands |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Outbound message shapes |
//! | `event` | Inbound event decoding |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound message shapes.
pub mod command;

/// Inbound event decoding.
pub mod event;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{BrowserCommand, Registration, StatePayload, StreamDeckCommand, UrlPayload};
pub use event::{Event, Origin, StreamDeckEventKind};
