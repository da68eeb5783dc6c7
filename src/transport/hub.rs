//! WebSocket server for browser-extension clients.
//!
//! Any number of Meet tabs may be connected at once (several meetings, or a
//! stale socket from a refreshed tab that has not timed out yet), so every
//! outbound command is broadcast to all of them and every action is best
//! effort.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             ExtensionHub                │
//! │           (127.0.0.1:2394)              │
//! │  ┌─────────────────────────────────┐    │
//! │  │ ConnectionId=a → Connection 1   │    │
//! │  │ ConnectionId=b → Connection 2   │    │
//! │  └─────────────────────────────────┘    │
//! │  accept loop ──► one receive task per   │
//! │                  connection             │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. Accept loop upgrades the socket (Connecting)
//! 2. Connection is added to the set (Open)
//! 3. Receive loop decodes and dispatches frames
//! 4. Peer close, receive error or shutdown (Closing)
//! 5. Socket is closed and removed from the set (Closed); if the set is now
//!    empty every listener is told all browsers are gone

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::dispatch::{Listener, ListenerSet};
use crate::error::{Error, Result};
use crate::handlers::BrowserOutlet;
use crate::identifiers::ConnectionId;
use crate::protocol::{Event, Origin};

use super::connection::{Connection, Inbound, WsReader, next_inbound};

// ============================================================================
// Constants
// ============================================================================

/// Default bind address (loopback only).
pub const DEFAULT_BIND_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Port the browser extension connects to.
pub const DEFAULT_BROWSER_PORT: u16 = 2394;

/// Pause after a failed accept (e.g. out of file descriptors).
const ACCEPT_RETRY_DELAY: std::time::Duration = std::time::Duration::from_millis(100);

// ============================================================================
// ExtensionHub
// ============================================================================

/// Multi-connection server the browser extension connects to.
///
/// Thread-safe; always used behind an [`Arc`] because every connection task
/// holds a reference.
///
/// # Example
///
/// ```ignore
/// let hub = ExtensionHub::new();
/// hub.register_listener(listener);
/// let addr = hub.start(DEFAULT_BIND_IP, DEFAULT_BROWSER_PORT).await?;
///
/// hub.broadcast(r#"{"event":"getMicState"}"#).await;
/// ```
pub struct ExtensionHub {
    /// Live connections. Only the accept path inserts and only a
    /// connection's own receive task removes.
    connections: RwLock<FxHashMap<ConnectionId, Connection>>,

    /// Registered listeners.
    listeners: ListenerSet,

    /// Flips to `true` on shutdown.
    shutdown: watch::Sender<bool>,
}

// ============================================================================
// ExtensionHub - Constructor
// ============================================================================

impl ExtensionHub {
    /// Creates a hub that is not yet listening.
    #[must_use]
    pub fn new() -> Arc<Self> {
        let (shutdown, _) = watch::channel(false);
        Arc::new(Self {
            connections: RwLock::new(FxHashMap::default()),
            listeners: ListenerSet::new(),
            shutdown,
        })
    }

    /// Binds the listening socket and spawns the accept loop.
    ///
    /// Use port 0 to let the OS pick one. Returns the bound address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the address cannot be bound (e.g. port in
    /// use). Nothing after a successful bind is fatal to the hub.
    pub async fn start(self: &Arc<Self>, ip: IpAddr, port: u16) -> Result<SocketAddr> {
        let listener = TcpListener::bind(SocketAddr::new(ip, port)).await?;
        let local_addr = listener.local_addr()?;

        let hub = Arc::clone(self);
        tokio::spawn(async move {
            hub.accept_loop(listener).await;
        });

        info!(%local_addr, "Browser websocket server listening");
        Ok(local_addr)
    }
}

// ============================================================================
// ExtensionHub - Public API
// ============================================================================

impl ExtensionHub {
    /// Registers a listener for browser events and disconnect notifications.
    ///
    /// Duplicates are not filtered.
    pub fn register_listener(&self, listener: Arc<dyn Listener>) {
        self.listeners.register(listener);
    }

    /// Returns the number of live connections.
    #[inline]
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }

    /// Sends `message` to every live connection, concurrently.
    ///
    /// Membership is snapshotted first; a connection closing mid-broadcast
    /// only fails its own send. Failures are logged, never returned.
    /// Returns how many connections received the message.
    pub async fn broadcast(&self, message: &str) -> usize {
        let targets: Vec<Connection> = self.connections.read().values().cloned().collect();

        if targets.is_empty() {
            warn!(
                payload = message,
                "No active browser extension clients to send message to"
            );
            return 0;
        }

        info!(
            payload = message,
            clients = targets.len(),
            "Broadcasting to browser clients"
        );

        let results = join_all(targets.iter().map(|c| c.send(message))).await;

        let mut delivered = 0;
        for (connection, result) in targets.iter().zip(results) {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        connection = %connection.id(),
                        peer = %connection.peer(),
                        error = %e,
                        "Broadcast to browser client failed"
                    );
                }
            }
        }
        delivered
    }

    /// Stops accepting and closes every open connection.
    ///
    /// Each receive task runs its normal Closing path, so listeners get the
    /// all-disconnected callback once the last one is gone.
    pub fn shutdown(&self) {
        info!("Browser websocket server shutting down");
        self.shutdown.send_replace(true);
    }
}

#[async_trait]
impl BrowserOutlet for ExtensionHub {
    async fn broadcast(&self, message: &str) -> usize {
        ExtensionHub::broadcast(self, message).await
    }

    fn connection_count(&self) -> usize {
        ExtensionHub::connection_count(self)
    }
}

// ============================================================================
// ExtensionHub - Accept Loop
// ============================================================================

impl ExtensionHub {
    /// Background task that accepts new connections until shutdown.
    async fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        let mut shutdown = self.shutdown.subscribe();
        debug!("Accept loop started");

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let hub = Arc::clone(&self);
                        tokio::spawn(async move {
                            if let Err(e) = hub.handle_connection(stream, addr).await {
                                warn!(error = %e, %addr, "Browser connection failed");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Accept failed");
                        if !pause_after_accept_error(&mut shutdown).await {
                            break;
                        }
                    }
                },

                _ = stopped(&mut shutdown) => break,
            }
        }

        debug!("Accept loop terminated");
    }

    /// Drives one connection from upgrade to cleanup.
    async fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) -> Result<()> {
        debug!(%addr, "New TCP connection");

        let ws_stream = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| Error::connection(format!("WebSocket upgrade failed: {e}")))?;

        let (connection, reader) = Connection::new(ws_stream, addr);
        let id = connection.id();

        let active = {
            let mut connections = self.connections.write();
            connections.insert(id, connection.clone());
            connections.len()
        };
        info!(connection = %id, %addr, active, "Browser client connected");

        self.receive_loop(id, reader).await;

        if let Err(e) = connection.close().await {
            warn!(connection = %id, error = %e, "Error while closing browser connection");
        }

        let remaining = {
            let mut connections = self.connections.write();
            connections.remove(&id);
            connections.len()
        };
        info!(connection = %id, %addr, remaining, "Browser client disconnected");

        if remaining == 0 {
            self.listeners.notify_all_disconnected().await;
        }

        Ok(())
    }

    /// Reads frames until the peer goes away or the hub shuts down.
    async fn receive_loop(&self, id: ConnectionId, mut reader: WsReader) {
        let mut shutdown = self.shutdown.subscribe();

        loop {
            let inbound = tokio::select! {
                inbound = next_inbound(&mut reader) => inbound,
                _ = stopped(&mut shutdown) => {
                    debug!(connection = %id, "Closing for shutdown");
                    return;
                }
            };

            match inbound {
                Inbound::Text(text) => self.process_inbound_message(id, &text).await,
                Inbound::Closed => {
                    debug!(connection = %id, "Browser closed the connection");
                    return;
                }
                Inbound::Failed(e) => {
                    warn!(connection = %id, error = %e, "Browser websocket receive failed");
                    return;
                }
                Inbound::Skip => {}
            }
        }
    }

    /// Decodes and dispatches one frame. Undecodable frames are dropped and
    /// the connection stays open.
    async fn process_inbound_message(&self, id: ConnectionId, text: &str) {
        info!(connection = %id, payload = text, "Received message from browser extension");

        match Event::parse(text, Origin::Browser) {
            Ok(event) => self.listeners.dispatch(&event).await,
            Err(e) => {
                warn!(connection = %id, error = %e, payload = text, "Discarding undecodable browser message");
            }
        }
    }
}

/// Resolves once shutdown has been requested.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    // Also resolves if the hub itself is gone.
    let _ = shutdown.wait_for(|stopped| *stopped).await;
}

/// Waits out [`ACCEPT_RETRY_DELAY`]. Returns `false` if shutdown was
/// requested meanwhile.
async fn pause_after_accept_error(shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        () = tokio::time::sleep(ACCEPT_RETRY_DELAY) => true,
        () = stopped(shutdown) => false,
    }
}

// ============================================================================
// Tests
// ============================================================================
