use notilink_bridge::connection::ConnectionState;

/// Handles an initialization request (see
/// [`notilink_bridge::MessageToListener::Initialize`]). Repeated requests are
/// ignored by the connection manager.
pub async fn handle_initialize_request(context: super::ListenerContextHandle) {
    let server_url = {
        let state = context.state.read().await;
        state.config.server_url.clone()
    };

    let mut connection = context.connection.lock().await;
    match connection.as_mut() {
        Some(manager) => {
            manager.initialize(&server_url, context.inbound_tx.clone());
        }
        None => log::warn!("Socket transport failed to load, ignoring initialization request"),
    }
}

/// Forwards a connection state change to the host.
pub async fn handle_connection_state_change(
    context: super::ListenerContextHandle,
    connection_state: ConnectionState,
) {
    log::debug!("Connection state changed: {connection_state:?}");
    context
        .send(notilink_bridge::MessageFromListener::ConnectionStateChanged(
            connection_state,
        ))
        .await;
}
