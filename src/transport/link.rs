//! WebSocket client to the Stream Deck host application.
//!
//! The host launches the plugin with a port, a registration event name and
//! a plugin UUID. The plugin connects to `127.0.0.1:{port}`, registers, and
//! then lives exactly as long as that one connection.
//!
//! # Connection Flow
//!
//! 1. Connect to `ws://127.0.0.1:{port}`
//! 2. Send `{"event": registerEvent, "uuid": pluginUUID}` before anything else
//! 3. Receive loop decodes and dispatches frames
//! 4. Connection ends: close, clear, return to the process
//!
//! Unlike the extension hub, there is no redundancy here. A transport
//! error or an undecodable frame ends the loop and is returned; the host
//! restarts the plugin.

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::net::TcpStream;
use tracing::{debug, error, info, warn};

use crate::dispatch::{Listener, ListenerSet};
use crate::error::{Error, Result};
use crate::handlers::StreamDeckOutlet;
use crate::protocol::{Event, Origin, Registration};

use super::connection::{Connection, Inbound, WsReader, next_inbound};

// ============================================================================
// Constants
// ============================================================================

/// The Stream Deck host only listens on loopback.
const STREAM_DECK_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

// ============================================================================
// ControlSurfaceLink
// ============================================================================

/// The single connection to the Stream Deck host.
///
/// # Example
///
/// ```ignore
/// let link = ControlSurfaceLink::new();
/// link.register_listener(listener);
///
/// // Runs until the host goes away.
/// link.start(port, "registerPlugin", &plugin_uuid).await?;
/// ```
#[derive(Default)]
pub struct ControlSurfaceLink {
    /// Present only while the connection is open.
    connection: RwLock<Option<Connection>>,

    /// Registered listeners.
    listeners: ListenerSet,
}

impl ControlSurfaceLink {
    /// Creates a link that is not yet connected.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a listener for Stream Deck events.
    ///
    /// Duplicates are not filtered.
    pub fn register_listener(&self, listener: Arc<dyn Listener>) {
        self.listeners.register(listener);
    }

    /// Returns `true` while the connection is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.read().is_some()
    }

    /// Connects, registers, and runs the receive loop until the connection
    /// ends.
    ///
    /// Returns `Ok(())` when the host closes the connection. Either way the
    /// connection is closed and cleared before returning.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if the host cannot be reached
    /// - [`Error::WebSocket`] if sending the registration or receiving fails
    /// - [`Error::Json`] / [`Error::Protocol`] if the host sends a frame that
    ///   is not a JSON object
    pub async fn start(&self, port: u16, register_event: &str, plugin_uuid: &str) -> Result<()> {
        let addr = SocketAddr::new(STREAM_DECK_IP, port);

        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| Error::connection(format!("Stream Deck at {addr} unreachable: {e}")))?;
        let (ws_stream, _) = tokio_tungstenite::client_async(format!("ws://{addr}"), stream)
            .await
            .map_err(|e| Error::connection(format!("WebSocket handshake failed: {e}")))?;

        let (connection, reader) = Connection::new(ws_stream, addr);
        *self.connection.write() = Some(connection.clone());
        info!(%addr, "Connected to Stream Deck");

        let outcome = self.run(register_event, plugin_uuid, reader).await;

        self.connection.write().take();
        if let Err(e) = connection.close().await {
            warn!(error = %e, "Error while closing Stream Deck connection");
        }

        match &outcome {
            Ok(()) => warn!("Websocket to Stream Deck disconnected"),
            Err(e) if e.is_decode_error() => {
                error!(error = %e, "Stream Deck sent an undecodable message")
            }
            Err(e) if e.is_connection_error() => {
                error!(error = %e, "Websocket to Stream Deck failed")
            }
            Err(e) => error!(error = %e, "Stream Deck link stopped"),
        }
        outcome
    }

    /// Sends one message to the Stream Deck host.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] before [`start`](Self::start) has connected
    ///   or after the connection has ended
    /// - [`Error::WebSocket`] if the write fails
    pub async fn send_outbound_message(&self, message: &str) -> Result<()> {
        let connection = self.connection.read().clone().ok_or(Error::NotConnected)?;
        info!(payload = message, "Sending message to Stream Deck");
        connection.send(message).await
    }

    async fn run(&self, register_event: &str, plugin_uuid: &str, reader: WsReader) -> Result<()> {
        let registration = Registration::new(register_event, plugin_uuid).to_json()?;
        self.send_outbound_message(&registration).await?;
        debug!(register_event, "Registration sent");

        self.receive_loop(reader).await
    }

    async fn receive_loop(&self, mut reader: WsReader) -> Result<()> {
        loop {
            match next_inbound(&mut reader).await {
                Inbound::Text(text) => self.process_inbound_message(&text).await?,
                Inbound::Closed => return Ok(()),
                Inbound::Failed(e) => return Err(e.into()),
                Inbound::Skip => {}
            }
        }
    }

    /// Decodes and dispatches one frame. An undecodable frame means the
    /// channel is in an unknown state and is escalated.
    async fn process_inbound_message(&self, text: &str) -> Result<()> {
        info!(payload = text, "Received message from Stream Deck");

        let event = Event::parse(text, Origin::StreamDeck).inspect_err(|e| {
            error!(error = %e, payload = text, "Failed to decode Stream Deck message");
        })?;

        self.listeners.dispatch(&event).await;
        Ok(())
    }
}

#[async_trait]
impl StreamDeckOutlet for ControlSurfaceLink {
    async fn send_outbound_message(&self, message: &str) -> Result<()> {
        ControlSurfaceLink::send_outbound_message(self, message).await
    }
}

// ============================================================================
// Tests
// ============================================================================
