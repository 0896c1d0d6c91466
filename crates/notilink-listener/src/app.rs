//! Listener context and message dispatching utilities.
//!
//! The context contains the shared state, the connection manager and the
//! notification router, and provides helpers for sending responses back to
//! the host bridge.

use std::sync::Arc;

use notilink_bridge::{MessageFromListener, MessageToListener, connection::ConnectionState};
use tokio::sync::{
    Mutex,
    mpsc::{Receiver, Sender},
    watch,
};

use crate::connection::ConnectionManager;
use crate::router::NotificationRouter;
use crate::services;
use crate::state::SharedState;

/// Shared listener context passed to service handlers.
pub(crate) struct ListenerContext {
    /// Mutable listener state shared across handlers.
    pub state: SharedState,
    /// Outbound channel to the host bridge.
    pub tx: Sender<MessageFromListener>,
    /// Fans decoded records out to the host collaborators.
    pub router: NotificationRouter,
    /// `None` when the socket transport failed to load.
    pub connection: Mutex<Option<ConnectionManager>>,
    /// Handed to the connection manager, which pushes raw socket messages
    /// into it.
    pub inbound_tx: Sender<String>,
}

impl ListenerContext {
    /// Handles host commands, socket messages and connection state changes
    /// one at a time until the host closes the bridge.
    pub async fn run(
        self: &Arc<Self>,
        mut rx: Receiver<MessageToListener>,
        mut inbound_rx: Receiver<String>,
        mut connection_state: Option<watch::Receiver<ConnectionState>>,
    ) {
        loop {
            tokio::select! {
                message = rx.recv() => match message {
                    Some(message) => {
                        log::debug!("Got a host message: {message:?}");
                        self.dispatch_message(message).await;
                    }
                    None => {
                        log::info!("Host closed the bridge, stopping the listener");
                        break;
                    }
                },
                Some(raw) = inbound_rx.recv() => {
                    services::message_service::handle_inbound_message(self.clone(), raw).await;
                }
                Some(state) = next_connection_state(&mut connection_state) => {
                    services::connection_service::handle_connection_state_change(
                        self.clone(),
                        state,
                    )
                    .await;
                }
            }
        }
    }

    /// Dispatches the received message from the host down to individual
    /// service handlers.
    async fn dispatch_message(self: &Arc<Self>, message: MessageToListener) {
        match message {
            MessageToListener::Initialize => {
                services::connection_service::handle_initialize_request(self.clone()).await;
            }
            MessageToListener::SetRecordContext(record_id) => {
                services::record_service::handle_record_context(self.clone(), record_id).await;
            }
            MessageToListener::ConfigurationRequest => {
                services::config_service::handle_config_request(self.clone()).await;
            }
            MessageToListener::CurrentRecordRequest => {
                services::record_service::handle_current_record_request(self.clone()).await;
            }
        }
    }

    /// Send a message to the host bridge.
    pub async fn send(&self, message: MessageFromListener) {
        if let Err(error) = self.tx.send(message).await {
            log::warn!("Failed to send message to host: {error}");
        }
    }
}

/// Waits for the next connection state. Resolves to `None` right away when
/// there is nothing to watch, and stops watching once the manager is gone.
async fn next_connection_state(
    receiver: &mut Option<watch::Receiver<ConnectionState>>,
) -> Option<ConnectionState> {
    let watched = receiver.as_mut()?;
    match watched.changed().await {
        Ok(()) => Some(*watched.borrow_and_update()),
        Err(_) => {
            *receiver = None;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use notilink_bridge::{
        BridgeChannels,
        config::Config,
        connection::{ConnectionStatus, TransportPreference},
        notification::ToastVariant,
        record::RecordChange,
    };
    use tokio::sync::{RwLock, mpsc};

    use super::*;
    use crate::{
        collaborators::BridgeOutlet,
        connection::ReconnectPolicy,
        router::Collaborators,
        state::State,
        testing::ScriptedConnector,
    };

    const CASE_MESSAGE: &str = r#"{"payload":{"SalesforceId__c":"500xx","ObjectAPIName__c":"Case","PrimaryPayload__c":"hello","SubmittedBy__c":"005xx"}}"#;

    struct Host {
        tx: Sender<MessageToListener>,
        rx: Receiver<MessageFromListener>,
    }

    fn spawn_listener(connector: Arc<ScriptedConnector>) -> Host {
        let channels = BridgeChannels::new(32);
        let config = Config {
            server_url: "https://socket.example.com".to_string(),
            current_user_id: Some("005xx".to_string()),
            ..Default::default()
        };

        let manager = ConnectionManager::new(
            connector,
            ReconnectPolicy {
                delay: Duration::ZERO,
                max_delay: Duration::ZERO,
            },
            TransportPreference::PreferWebSocket,
        );
        let connection_state = Some(manager.state());
        let router = NotificationRouter::new(
            Collaborators::from(BridgeOutlet::new(channels.listener_tx.clone())),
            config.current_user_id.clone(),
            config.toast.duration(),
        )
        .with_default_handlers();
        let (inbound_tx, inbound_rx) = mpsc::channel(8);

        let context = Arc::new(ListenerContext {
            state: Arc::new(RwLock::new(State::new(config))),
            tx: channels.listener_tx.clone(),
            router,
            connection: Mutex::new(Some(manager)),
            inbound_tx,
        });

        let BridgeChannels {
            host_rx,
            host_tx,
            listener_rx,
            ..
        } = channels;
        tokio::spawn(async move {
            context.run(listener_rx, inbound_rx, connection_state).await;
        });

        Host {
            tx: host_tx,
            rx: host_rx,
        }
    }

    /// Receives host messages until one matches `pick`.
    async fn expect_message<T>(
        rx: &mut Receiver<MessageFromListener>,
        mut pick: impl FnMut(MessageFromListener) -> Option<T>,
    ) -> T {
        loop {
            let message = rx.recv().await.expect("listener stopped");
            if let Some(value) = pick(message) {
                return value;
            }
        }
    }

    #[tokio::test]
    async fn routes_socket_messages_to_the_host() {
        let connector = Arc::new(ScriptedConnector::new().session([CASE_MESSAGE], false));
        let mut host = spawn_listener(connector.clone());

        host.tx.send(MessageToListener::Initialize).await.unwrap();
        host.tx.send(MessageToListener::Initialize).await.unwrap();

        let raw = expect_message(&mut host.rx, |message| match message {
            MessageFromListener::MessageReceived { message } => Some(message),
            _ => None,
        })
        .await;
        assert_eq!(raw, CASE_MESSAGE);

        let changes = expect_message(&mut host.rx, |message| match message {
            MessageFromListener::RecordsChanged(changes) => Some(changes),
            _ => None,
        })
        .await;
        assert_eq!(changes, [RecordChange::new("500xx")]);

        let toast = expect_message(&mut host.rx, |message| match message {
            MessageFromListener::Toast(toast) => Some(toast),
            _ => None,
        })
        .await;
        assert_eq!(toast.title, "Case Message Received for: 500xx");
        assert_eq!(toast.message, "hello Submitter: 005xx");
        assert_eq!(toast.variant, ToastVariant::Success);

        host.tx
            .send(MessageToListener::CurrentRecordRequest)
            .await
            .unwrap();
        let record = expect_message(&mut host.rx, |message| match message {
            MessageFromListener::CurrentRecordResponse(record) => Some(record),
            _ => None,
        })
        .await
        .expect("a record was decoded");
        assert_eq!(record.record_id, "500xx");
        assert_eq!(record.submitted_by, "005xx");

        assert_eq!(connector.attempts().len(), 1);
    }

    #[tokio::test]
    async fn reports_connection_state_changes() {
        let connector = Arc::new(
            ScriptedConnector::new()
                .fail("websocket refused")
                .session(["{\"payload\":{}}"], false),
        );
        let mut host = spawn_listener(connector);

        host.tx.send(MessageToListener::Initialize).await.unwrap();

        let state = expect_message(&mut host.rx, |message| match message {
            MessageFromListener::ConnectionStateChanged(state)
                if state.status == ConnectionStatus::Degraded =>
            {
                Some(state)
            }
            _ => None,
        })
        .await;
        assert_eq!(state.preference, TransportPreference::PreferPolling);
    }

    #[tokio::test]
    async fn undecodable_messages_are_dropped() {
        let connector = Arc::new(ScriptedConnector::new().session(
            ["not json", "", r#"{"payload":{"SalesforceId__c":"001"}}"#],
            false,
        ));
        let mut host = spawn_listener(connector);

        host.tx.send(MessageToListener::Initialize).await.unwrap();

        let raw = expect_message(&mut host.rx, |message| match message {
            MessageFromListener::MessageReceived { message } => Some(message),
            _ => None,
        })
        .await;
        assert_eq!(raw, r#"{"payload":{"SalesforceId__c":"001"}}"#);
    }

    #[tokio::test]
    async fn slow_host_still_gets_every_broadcast() {
        let messages: Vec<String> = (0..40)
            .map(|i| format!(r#"{{"payload":{{"SalesforceId__c":"r{i}"}}}}"#))
            .collect();
        let connector = Arc::new(ScriptedConnector::new().session(messages.clone(), false));
        let mut host = spawn_listener(connector);

        host.tx.send(MessageToListener::Initialize).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let mut broadcast = Vec::new();
        let mut invalidated = Vec::new();
        while broadcast.len() < messages.len() || invalidated.len() < messages.len() {
            match host.rx.recv().await.expect("listener stopped") {
                MessageFromListener::MessageReceived { message } => broadcast.push(message),
                MessageFromListener::RecordsChanged(changes) => {
                    invalidated.extend(changes.into_iter().map(|change| change.record_id));
                }
                _ => {}
            }
        }

        assert_eq!(broadcast, messages);
        let expected: Vec<String> = (0..40).map(|i| format!("r{i}")).collect();
        assert_eq!(invalidated, expected);
    }

    #[tokio::test]
    async fn record_context_and_configuration_requests() {
        let connector = Arc::new(ScriptedConnector::new());
        let mut host = spawn_listener(connector.clone());

        host.tx
            .send(MessageToListener::SetRecordContext(Some("001xx".to_string())))
            .await
            .unwrap();
        host.tx
            .send(MessageToListener::ConfigurationRequest)
            .await
            .unwrap();

        let config = expect_message(&mut host.rx, |message| match message {
            MessageFromListener::ConfigurationResponse(config) => Some(config),
            _ => None,
        })
        .await;
        assert_eq!(config.server_url, "https://socket.example.com");

        host.tx
            .send(MessageToListener::CurrentRecordRequest)
            .await
            .unwrap();
        let record = expect_message(&mut host.rx, |message| match message {
            MessageFromListener::CurrentRecordResponse(record) => Some(record),
            _ => None,
        })
        .await;
        assert!(record.is_none());
        assert!(connector.attempts().is_empty());
    }
}
