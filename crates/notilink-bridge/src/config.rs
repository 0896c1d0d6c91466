use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::connection::TransportPreference;

/// Configuration of the socket transport and reconnection behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Transport order used for the first connection attempt.
    pub preference: TransportPreference,
    /// Delay before the first reconnection attempt, in milliseconds. Doubles
    /// on each consecutive failure.
    pub reconnect_delay_ms: u64,
    /// Upper bound for the reconnection delay, in milliseconds.
    pub reconnect_delay_max_ms: u64,
    /// Timeout for the handshake and for each long-polling request, in
    /// milliseconds.
    pub request_timeout_ms: u64,
}

impl TransportConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn reconnect_delay_max(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_max_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            preference: TransportPreference::default(),
            reconnect_delay_ms: 1000,
            reconnect_delay_max_ms: 5000,
            request_timeout_ms: 20_000,
        }
    }
}

/// Configuration for the toasts raised by object handlers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ToastConfig {
    /// How long a toast stays on screen, in milliseconds.
    pub duration_ms: u64,
}

impl ToastConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            duration_ms: crate::notification::DEFAULT_TOAST_DURATION.as_millis() as u64,
        }
    }
}

/// Global listener configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// URL of the socket server. The listener stays inert while it is empty.
    pub server_url: String,
    /// Identifier of the user viewing the host, compared against the
    /// submitter of incoming records.
    pub current_user_id: Option<String>,
    /// Record the host is scoped to, if embedded on a record page.
    pub record_id: Option<String>,
    /// Configuration for the socket transport.
    pub transport: TransportConfig,
    /// Configuration for toasts.
    pub toast: ToastConfig,
}
