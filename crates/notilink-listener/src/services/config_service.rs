/// Handles an incoming configuration request (see
/// [`notilink_bridge::MessageToListener::ConfigurationRequest`]).
pub async fn handle_config_request(context: super::ListenerContextHandle) {
    let config = {
        let state = context.state.read().await;
        state.config.clone()
    };
    context
        .send(notilink_bridge::MessageFromListener::ConfigurationResponse(
            config,
        ))
        .await;
}
