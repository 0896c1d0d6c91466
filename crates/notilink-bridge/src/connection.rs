use std::fmt;

use serde::{Deserialize, Serialize};

/// A mechanism the socket client can use to reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Persistent, full-duplex WebSocket connection.
    WebSocket,
    /// HTTP long-polling. Slower, but passes through most proxies.
    Polling,
}

impl TransportKind {
    /// Name used in the `transport` query parameter of the handshake.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::WebSocket => "websocket",
            TransportKind::Polling => "polling",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// The order in which transports are attempted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum TransportPreference {
    /// Try WebSocket first, fall back to polling. Default value.
    #[default]
    #[serde(rename = "websocket")]
    PreferWebSocket,
    /// Try polling first. Used after a connection error.
    #[serde(rename = "polling")]
    PreferPolling,
}

impl TransportPreference {
    /// Returns the transports in the order they are attempted.
    pub fn order(&self) -> [TransportKind; 2] {
        match self {
            TransportPreference::PreferWebSocket => {
                [TransportKind::WebSocket, TransportKind::Polling]
            }
            TransportPreference::PreferPolling => {
                [TransportKind::Polling, TransportKind::WebSocket]
            }
        }
    }
}

/// Coarse status of the socket connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No connection has been requested yet, or the transport library could
    /// not be loaded.
    #[default]
    Uninitialized,
    /// A connection attempt is in progress.
    Connecting,
    /// Connected over the preferred persistent transport.
    Connected,
    /// Connected over the fallback transport.
    Degraded,
}

/// State of the single socket connection, owned by the connection manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    /// Transport order used for the next connection attempt.
    pub preference: TransportPreference,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_orders() {
        assert_eq!(
            TransportPreference::PreferWebSocket.order(),
            [TransportKind::WebSocket, TransportKind::Polling]
        );
        assert_eq!(
            TransportPreference::PreferPolling.order(),
            [TransportKind::Polling, TransportKind::WebSocket]
        );
    }

    #[test]
    fn default_state_is_uninitialized_and_prefers_websocket() {
        let state = ConnectionState::default();
        assert_eq!(state.status, ConnectionStatus::Uninitialized);
        assert_eq!(state.preference, TransportPreference::PreferWebSocket);
    }
}
