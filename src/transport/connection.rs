//! One open websocket to a peer.
//!
//! A websocket is split on creation. The write half lives behind an async
//! mutex inside [`Connection`], which is a cheap cloneable handle, so
//! listeners can send while the owning receive loop is parked on the read
//! half. The read half is returned to the caller that drives the loop.
//!
//! Sharing the write half (instead of routing sends through the receive
//! loop) matters: a listener dispatched from a receive loop may send on
//! that same connection, e.g. a `willAppear` from the Stream Deck answered
//! with `setState` on the same socket.

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::trace;

use crate::error::Result;
use crate::identifiers::ConnectionId;

// ============================================================================
// Types
// ============================================================================

/// Websocket over a loopback TCP stream, used by both brokers.
pub type WsStream = WebSocketStream<TcpStream>;

/// Write half of a [`WsStream`].
type WsSink = SplitSink<WsStream, Message>;

/// Read half of a [`WsStream`], owned by the receive loop.
pub type WsReader = SplitStream<WsStream>;

// ============================================================================
// Inbound
// ============================================================================

/// One step of a receive loop.
#[derive(Debug)]
pub enum Inbound {
    /// A text frame.
    Text(String),
    /// The peer closed the connection or the stream ended.
    Closed,
    /// Protocol-level receive error.
    Failed(WsError),
    /// Binary, ping, pong or raw frames; nothing to dispatch.
    Skip,
}

/// Waits for the next inbound frame and classifies it.
pub async fn next_inbound(reader: &mut WsReader) -> Inbound {
    match reader.next().await {
        Some(Ok(Message::Text(text))) => Inbound::Text(text.as_str().to_owned()),
        Some(Ok(Message::Close(_))) | None => Inbound::Closed,
        Some(Ok(_)) => Inbound::Skip,
        Some(Err(e)) => Inbound::Failed(e),
    }
}

// ============================================================================
// Connection
// ============================================================================

/// Handle to the write half of one open websocket.
///
/// Clones share the same socket. Concurrent sends on one connection are
/// serialized by the internal mutex, so frames are never interleaved.
#[derive(Clone)]
pub struct Connection {
    /// Unique identity of this connection.
    id: ConnectionId,
    /// Remote address, for diagnostics.
    peer: SocketAddr,
    /// Shared write half.
    sink: Arc<AsyncMutex<WsSink>>,
}

impl Connection {
    /// Splits a websocket into a send handle and its read half.
    pub(crate) fn new(ws_stream: WsStream, peer: SocketAddr) -> (Self, WsReader) {
        let (sink, reader) = ws_stream.split();
        let connection = Self {
            id: ConnectionId::generate(),
            peer,
            sink: Arc::new(AsyncMutex::new(sink)),
        };
        (connection, reader)
    }

    /// Returns the connection's identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the remote address.
    #[inline]
    #[must_use]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Sends one text frame and waits for it to be flushed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WebSocket`](crate::Error::WebSocket) if the socket is
    /// closed or the write fails.
    pub async fn send(&self, text: &str) -> Result<()> {
        let mut sink = self.sink.lock().await;
        sink.send(Message::text(text.to_owned())).await?;
        trace!(connection = %self.id, bytes = text.len(), "Frame sent");
        Ok(())
    }

    /// Closes the socket, sending a close frame if it is still open.
    ///
    /// Closing an already-closed socket is not an error.
    pub async fn close(&self) -> Result<()> {
        let mut sink = self.sink.lock().await;
        match sink.close().await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;
    use tokio_tungstenite::{accept_async, connect_async};

    /// Opens a loopback websocket pair, returning the server-side halves and
    /// the raw client stream.
    async fn pair() -> (
        Connection,
        WsReader,
        WebSocketStream<tokio_tungstenite::MaybeTlsStream<TcpStream>>,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        let server = tokio::spawn(async move {
            let (stream, peer) = listener.accept().await.expect("accept");
            let ws = accept_async(stream).await.expect("upgrade");
            Connection::new(ws, peer)
        });

        let (client, _) = connect_async(format!("ws://{addr}"))
            .await
            .expect("connect");
        let (connection, reader) = server.await.expect("join");
        (connection, reader, client)
    }

    #[tokio::test]
    async fn test_send_reaches_peer() {
        let (connection, _reader, mut client) = pair().await;

        connection.send(r#"{"event":"toggleMic"}"#).await.expect("send");

        let frame = client.next().await.expect("frame").expect("ok");
        assert_eq!(frame.into_text().expect("text").as_str(), r#"{"event":"toggleMic"}"#);
    }

    #[tokio::test]
    async fn test_next_inbound_text_then_close() {
        let (_connection, mut reader, mut client) = pair().await;

        client
            .send(Message::text(r#"{"event":"x"}"#.to_owned()))
            .await
            .expect("send");
        client.close(None).await.expect("close");

        assert!(matches!(next_inbound(&mut reader).await, Inbound::Text(t) if t == r#"{"event":"x"}"#));
        assert!(matches!(next_inbound(&mut reader).await, Inbound::Closed));
    }

    #[tokio::test]
    async fn test_close_twice_is_ok() {
        let (connection, _reader, _client) = pair().await;

        connection.close().await.expect("first close");
        connection.close().await.expect("second close");
        assert!(connection.send("late").await.is_err());
    }
}
