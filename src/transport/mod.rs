//! WebSocket transport layer.
//!
//! This module holds the two brokers that move JSON events between the
//! Stream Deck host and the browser extension.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                 ┌──────────────┐                 ┌─────────────────┐
//! │  Stream Deck    │   WebSocket     │   Bridge     │   WebSocket     │  Extension      │
//! │  host app       │◄───────────────►│   (Rust)     │◄───────────────►│  (1..n tabs)    │
//! │  (server)       │  localhost:PORT │              │  localhost:2394 │  (clients)      │
//! └─────────────────┘                 └──────────────┘                 └─────────────────┘
//!                     ControlSurfaceLink               ExtensionHub
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Shared write handle and frame classification |
//! | `hub` | Multi-client server for browser tabs |
//! | `link` | Single client connection to the Stream Deck host |

// ============================================================================
// Submodules
// ============================================================================

/// One open websocket.
pub mod connection;

/// Browser-extension server.
pub mod hub;

/// Stream Deck host client.
pub mod link;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::Connection;
pub use hub::{DEFAULT_BIND_IP, DEFAULT_BROWSER_PORT, ExtensionHub};
pub use link::ControlSurfaceLink;
