use crate::decoder;

/// Handles one raw message delivered by the socket: decodes it, stores the
/// record as the current one, and routes it to the host collaborators.
///
/// Empty messages are ignored. Messages that fail to decode are logged and
/// dropped without reaching any collaborator.
pub async fn handle_inbound_message(context: super::ListenerContextHandle, raw: String) {
    let record = match decoder::decode(Some(&raw)) {
        Ok(Some(record)) => record,
        Ok(None) => {
            log::debug!("Ignoring empty socket message");
            return;
        }
        Err(error) => {
            log::warn!("Dropping socket message that failed to decode: {error}");
            return;
        }
    };

    {
        let mut state = context.state.write().await;
        state.current_record = Some(record.clone());
    }

    let report = context.router.route(&raw, &record).await;
    log::debug!(
        "Routed record {:?} of object {:?}: {report:?}",
        record.record_id,
        record.object_name
    );
}
