//! Communication bridge between the notification listener and its host.
//!
//! This crate holds the types shared by a host UI and the asynchronous
//! listener that owns the socket connection.
//!
//! The host drives the listener with [`MessageToListener`] commands and the
//! listener answers or pushes events with [`MessageFromListener`]. Both
//! directions are bounded [`tokio::sync::mpsc`] channels, created together by
//! [`BridgeChannels`].

pub mod config;
pub mod connection;
pub mod notification;
pub mod record;

use tokio::sync::mpsc::{self, Receiver, Sender};

/// Messages emitted by the listener to inform the host of state updates.
///
/// These are typically sent in response to host requests or to push
/// asynchronous events (e.g., inbound notifications, connection changes).
#[derive(Debug, Clone)]
pub enum MessageFromListener {
    /// A notification arrived and was decoded. Carries the original raw text,
    /// not the decoded record.
    MessageReceived {
        /// Raw text exactly as delivered by the socket.
        message: String,
    },
    /// The data behind these records has changed and dependent views should
    /// refresh.
    RecordsChanged(Vec<record::RecordChange>),
    /// A user-facing toast to display.
    Toast(notification::ToastMessage),
    /// The connection manager moved to a new state.
    ConnectionStateChanged(connection::ConnectionState),
    /// Response to the configuration request from the host.
    ConfigurationResponse(config::Config),
    /// Response to the current record request from the host.
    CurrentRecordResponse(Option<record::NotificationRecord>),
}

/// Commands issued by the host to control or query the listener.
#[derive(Debug, Clone)]
pub enum MessageToListener {
    /// Start listening on the configured endpoint. Safe to send repeatedly;
    /// only the first one connects.
    Initialize,
    /// Sets the record-scoped context the listener is embedded in, if any.
    SetRecordContext(Option<String>),
    /// Request for the listener configuration.
    ConfigurationRequest,
    /// Request for the most recently decoded record.
    CurrentRecordRequest,
}

/// Both ends of both bridge directions. The host keeps the `host_*` halves
/// and hands the `listener_*` halves to the listener.
pub struct BridgeChannels {
    /// Receiver used by the host to get messages from the listener.
    pub host_rx: Receiver<MessageFromListener>,
    /// Sender used by the host to send commands to the listener.
    pub host_tx: Sender<MessageToListener>,

    /// Receiver used by the listener to get commands from the host.
    pub listener_rx: Receiver<MessageToListener>,
    /// Sender used by the listener to send events/responses to the host.
    pub listener_tx: Sender<MessageFromListener>,
}

impl BridgeChannels {
    /// Creates a new pair of bridged channels with the given buffer capacity.
    pub fn new(buffer: usize) -> Self {
        let (to_listener_tx, to_listener_rx) = mpsc::channel(buffer);
        let (to_host_tx, to_host_rx) = mpsc::channel(buffer);
        Self {
            host_tx: to_listener_tx,
            host_rx: to_host_rx,
            listener_rx: to_listener_rx,
            listener_tx: to_host_tx,
        }
    }
}

impl Default for BridgeChannels {
    fn default() -> Self {
        Self::new(64)
    }
}
