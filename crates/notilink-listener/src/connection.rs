//! Ownership of the single socket connection.
//!
//! [`ConnectionManager`] starts one negotiation loop per lifetime. The loop
//! owns the socket session, keeps reconnecting when it drops, and forwards
//! every inbound message text to the listener. Its [`ConnectionState`] is
//! published through a watch channel and is only ever changed by the loop.

use std::{sync::Arc, time::Duration};

use notilink_bridge::{
    config::TransportConfig,
    connection::{ConnectionState, ConnectionStatus, TransportKind, TransportPreference},
};
use notilink_socket::{Endpoint, SessionEvent, SocketConnector, SocketSession, TransportError};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

/// Delays between reconnection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first attempt after a drop or failure.
    pub delay: Duration,
    /// Upper bound for the delay.
    pub max_delay: Duration,
}

impl ReconnectPolicy {
    /// Delay after `failures` consecutive failed attempts. Doubles per
    /// failure and is capped at `max_delay`.
    pub fn backoff(&self, failures: u32) -> Duration {
        let factor = 2u32.saturating_pow(failures);
        self.delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl From<&TransportConfig> for ReconnectPolicy {
    fn from(config: &TransportConfig) -> Self {
        Self {
            delay: config.reconnect_delay(),
            max_delay: config.reconnect_delay_max(),
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from(&TransportConfig::default())
    }
}

pub struct ConnectionManager {
    connector: Arc<dyn SocketConnector>,
    policy: ReconnectPolicy,
    initialized: bool,
    state_tx: Option<watch::Sender<ConnectionState>>,
    state_rx: watch::Receiver<ConnectionState>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    pub fn new(
        connector: Arc<dyn SocketConnector>,
        policy: ReconnectPolicy,
        preference: TransportPreference,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState {
            status: ConnectionStatus::Uninitialized,
            preference,
        });
        Self {
            connector,
            policy,
            initialized: false,
            state_tx: Some(state_tx),
            state_rx,
            task: None,
        }
    }

    /// Subscribes to connection state changes.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Starts connecting to `endpoint` and forwarding inbound messages to
    /// `messages`.
    ///
    /// Only the first call has an effect; it returns `true` when the
    /// negotiation loop was started. An endpoint that cannot be loaded is
    /// logged and leaves the manager inert for the rest of its lifetime.
    /// Must be called from within a tokio runtime.
    pub fn initialize(&mut self, endpoint: &str, messages: mpsc::Sender<String>) -> bool {
        if self.initialized {
            log::debug!("Connection already initialized, ignoring repeated request");
            return false;
        }
        self.initialized = true;

        let endpoint = match Endpoint::parse(endpoint) {
            Ok(endpoint) => endpoint,
            Err(error) => {
                log::error!("Socket transport is unavailable, listener stays inert: {error}");
                return false;
            }
        };
        let Some(state_tx) = self.state_tx.take() else {
            return false;
        };

        log::info!("Connecting to socket server, namespace {}", endpoint.namespace());
        let negotiation = Negotiation {
            connector: self.connector.clone(),
            endpoint,
            policy: self.policy,
            state_tx,
            messages,
        };
        self.task = Some(tokio::spawn(negotiation.run()));
        true
    }

    /// Waits until the negotiation loop has ended, if it was started.
    pub async fn closed(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                log::error!("Connection task ended abnormally: {error}");
            }
        }
    }
}

/// The negotiation loop. Owns the session and the state sender.
struct Negotiation {
    connector: Arc<dyn SocketConnector>,
    endpoint: Endpoint,
    policy: ReconnectPolicy,
    state_tx: watch::Sender<ConnectionState>,
    messages: mpsc::Sender<String>,
}

impl Negotiation {
    async fn run(self) {
        let mut failures = 0u32;
        while !self.messages.is_closed() {
            self.set_status(ConnectionStatus::Connecting);
            let order = self.state_tx.borrow().preference.order();

            match self.connector.connect(&self.endpoint, &order).await {
                Ok(session) => {
                    failures = 0;
                    self.on_connect(session.as_ref());
                    self.pump(session).await;
                }
                Err(error) if error.is_load() => {
                    log::error!("Socket transport is unavailable, listener stays inert: {error}");
                    self.set_status(ConnectionStatus::Uninitialized);
                    return;
                }
                Err(error) if error.is_negotiation() => {
                    self.on_connect_error(&error);
                    failures = failures.saturating_add(1);
                }
                Err(error) => {
                    log::warn!("Socket connection attempt failed, retrying: {error}");
                    failures = failures.saturating_add(1);
                }
            }

            if self.messages.is_closed() {
                break;
            }
            // the first retry after a failure waits `delay`, as does a
            // reconnect after a dropped session
            tokio::time::sleep(self.policy.backoff(failures.saturating_sub(1))).await;
        }
        log::debug!("Message receiver dropped, stopping the connection loop");
    }

    /// Forwards session events until the session ends or the listener goes
    /// away.
    async fn pump(&self, mut session: Box<dyn SocketSession>) {
        loop {
            match session.next_event().await {
                Ok(SessionEvent::Message(raw)) => {
                    if !self.on_message(raw).await {
                        return;
                    }
                }
                Ok(SessionEvent::Disconnected { reason }) => {
                    log::info!("Socket session {} disconnected: {reason}", session.sid());
                    return;
                }
                Err(error) => {
                    log::warn!("Socket session {} failed: {error}", session.sid());
                    return;
                }
            }
        }
    }

    fn on_connect(&self, session: &dyn SocketSession) {
        let transport = session.transport();
        log::info!(
            "Socket connected over {transport}, session {}",
            session.sid()
        );
        let status = match transport {
            TransportKind::WebSocket => ConnectionStatus::Connected,
            TransportKind::Polling => ConnectionStatus::Degraded,
        };
        self.set_status(status);
    }

    /// Prefers polling from now on. There is no way back to WebSocket first.
    fn on_connect_error(&self, error: &TransportError) {
        log::warn!("Socket connection failed, preferring polling from now on: {error}");
        self.state_tx.send_if_modified(|state| {
            let changed = state.preference != TransportPreference::PreferPolling;
            state.preference = TransportPreference::PreferPolling;
            changed
        });
    }

    /// Returns `false` once the listener has dropped its receiver.
    async fn on_message(&self, raw: String) -> bool {
        self.messages.send(raw).await.is_ok()
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.state_tx.send_if_modified(|state| {
            let changed = state.status != status;
            state.status = status;
            changed
        });
    }
}
