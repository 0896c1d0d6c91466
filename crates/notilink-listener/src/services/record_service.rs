/// Handles a record context update (see
/// [`notilink_bridge::MessageToListener::SetRecordContext`]).
pub async fn handle_record_context(
    context: super::ListenerContextHandle,
    record_id: Option<String>,
) {
    log::debug!("Record context set to {record_id:?}");
    let mut state = context.state.write().await;
    state.record_context = record_id;
}

/// Handles a current record request (see
/// [`notilink_bridge::MessageToListener::CurrentRecordRequest`]).
pub async fn handle_current_record_request(context: super::ListenerContextHandle) {
    let record = {
        let state = context.state.read().await;
        state.current_record.clone()
    };
    context
        .send(notilink_bridge::MessageFromListener::CurrentRecordResponse(
            record,
        ))
        .await;
}
