//! Listener runtime setup and orchestration.
//!
//! This module wires together configuration, shared state, the socket
//! connection and the dispatch loop that listens to host bridge requests.

use std::{io, sync::Arc, thread};

use notilink_bridge::{MessageFromListener, MessageToListener, config::Config};
use notilink_socket::EngineIoConnector;
use tokio::sync::{
    Mutex, RwLock, mpsc,
    mpsc::{Receiver, Sender},
};

use crate::app::ListenerContext;
use crate::collaborators::BridgeOutlet;
use crate::connection::{ConnectionManager, ReconnectPolicy};
use crate::router::NotificationRouter;
use crate::state::State;

/// Raw socket messages waiting for the listener.
const INBOUND_BUFFER: usize = 64;

/// Initialize listener state and start processing host messages.
async fn setup_listener(rx: Receiver<MessageToListener>, tx: Sender<MessageFromListener>) {
    let config = match crate::config::load_config().await {
        Ok(config) => config,
        Err(error) => {
            log::error!("Failed to load config, using defaults: {error}");
            Config::default()
        }
    };

    let connection = match EngineIoConnector::new(config.transport.request_timeout()) {
        Ok(connector) => Some(ConnectionManager::new(
            Arc::new(connector),
            ReconnectPolicy::from(&config.transport),
            config.transport.preference,
        )),
        Err(error) => {
            log::error!("Socket transport failed to load, listener stays inert: {error}");
            None
        }
    };
    let connection_state = connection.as_ref().map(ConnectionManager::state);

    let router = NotificationRouter::new(
        BridgeOutlet::new(tx.clone()).into(),
        config.current_user_id.clone(),
        config.toast.duration(),
    )
    .with_default_handlers();

    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);
    let context = Arc::new(ListenerContext {
        state: Arc::new(RwLock::new(State::new(config))),
        tx,
        router,
        connection: Mutex::new(connection),
        inbound_tx,
    });
    context.run(rx, inbound_rx, connection_state).await;
}

/// Spawn the listener runtime on its own thread and begin processing bridge
/// messages. The thread ends once the host drops its sender.
pub fn run(
    rx: Receiver<MessageToListener>,
    tx: Sender<MessageFromListener>,
) -> io::Result<thread::JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    thread::Builder::new()
        .name("notilink-listener".to_string())
        .spawn(move || runtime.block_on(setup_listener(rx, tx)))
}
