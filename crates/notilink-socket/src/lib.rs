//! Minimal Socket.IO client used by the notification listener.
//!
//! This crate speaks just enough of the Engine.IO v4 and Socket.IO v5
//! protocols to open a session on a single namespace and receive `message`
//! events from the server. It focuses on:
//! - Parsing and encoding Engine.IO and Socket.IO packets.
//! - Opening sessions over a WebSocket or over HTTP long-polling.
//! - Answering server heartbeats so the session stays open.
//!
//! The client never emits events and never upgrades a polling session to
//! WebSocket. The transport to use is chosen by the caller through the order
//! passed to [`SocketConnector::connect`].

pub mod connector;
pub mod endpoint;
pub mod packet;
pub mod polling;
pub mod websocket;

pub use notilink_bridge::connection::TransportKind;
pub use reqwest::Url;

pub use crate::connector::EngineIoConnector;
pub use crate::endpoint::Endpoint;

/// Engine.IO protocol revision sent in the `EIO` query parameter.
pub const ENGINE_IO_VERSION: &str = "4";

/// Name of the Socket.IO event that carries notifications.
pub const MESSAGE_EVENT: &str = "message";

/// Errors produced while loading, negotiating, or running a socket session.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport could not be set up at all: the endpoint is invalid or
    /// the underlying client could not be built. Retrying will not help.
    #[error("failed to load transport: {0}")]
    Load(String),
    /// The server could not be reached or refused the session during the
    /// handshake.
    #[error("connection negotiation failed: {0}")]
    Negotiation(String),
    /// The server sent something the client does not understand.
    #[error("protocol violation: {0}")]
    Protocol(String),
    /// The WebSocket transport failed after the session was established.
    #[error("websocket transport failed: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    /// The polling transport failed after the session was established.
    #[error("polling transport failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server did not send a heartbeat in time.
    #[error("heartbeat timed out")]
    HeartbeatTimeout,
}

impl TransportError {
    /// Whether the error happened while negotiating a new session.
    pub fn is_negotiation(&self) -> bool {
        matches!(self, TransportError::Negotiation(_))
    }

    /// Whether the error means the transport library is unusable.
    pub fn is_load(&self) -> bool {
        matches!(self, TransportError::Load(_))
    }

    /// Reclassifies a failure that happened while opening a session. Load
    /// errors stay as they are.
    pub fn into_negotiation(self) -> TransportError {
        match self {
            TransportError::Negotiation(_) | TransportError::Load(_) => self,
            other => TransportError::Negotiation(other.to_string()),
        }
    }
}

/// Something that happened on an open session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A `message` event arrived. Carries the first event argument as text;
    /// an absent or `null` argument is an empty string.
    Message(String),
    /// The session ended. Reconnecting requires a new session.
    Disconnected {
        /// Human-readable reason, for logs.
        reason: String,
    },
}

/// Opens Socket.IO sessions. This is the seam through which the listener
/// reaches the transport library.
#[async_trait::async_trait]
pub trait SocketConnector: Send + Sync {
    /// Opens a session to `endpoint`, using the first transport of
    /// `transports`.
    async fn connect(
        &self,
        endpoint: &Endpoint,
        transports: &[TransportKind],
    ) -> Result<Box<dyn SocketSession>, TransportError>;
}

/// An open Socket.IO session on a single namespace.
#[async_trait::async_trait]
pub trait SocketSession: Send {
    /// Transport this session runs on.
    fn transport(&self) -> TransportKind;

    /// Engine.IO session identifier assigned by the server.
    fn sid(&self) -> &str;

    /// Waits for the next event. Heartbeats are answered internally and are
    /// never returned.
    async fn next_event(&mut self) -> Result<SessionEvent, TransportError>;
}
