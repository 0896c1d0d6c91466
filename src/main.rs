use anyhow::Context;
use notilink_bridge::{BridgeChannels, MessageFromListener, MessageToListener};

fn main() -> anyhow::Result<()> {
    simple_logger::SimpleLogger::new()
        .with_colors(true)
        .with_threads(true)
        .with_local_timestamps()
        .init()
        .context("failed to build logger instance")?;

    let BridgeChannels {
        mut host_rx,
        host_tx,
        listener_rx,
        listener_tx,
    } = BridgeChannels::default();
    let listener = notilink_listener::run(listener_rx, listener_tx)
        .context("failed to start the listener")?;

    host_tx
        .blocking_send(MessageToListener::Initialize)
        .context("listener stopped before initialization")?;

    while let Some(message) = host_rx.blocking_recv() {
        match message {
            MessageFromListener::MessageReceived { message } => {
                log::info!("Notification received: {message}");
            }
            MessageFromListener::RecordsChanged(changes) => {
                for change in changes {
                    log::info!("Record changed: {}", change.record_id);
                }
            }
            MessageFromListener::Toast(toast) => {
                log::info!("[{:?}] {}: {}", toast.variant, toast.title, toast.message);
            }
            MessageFromListener::ConnectionStateChanged(state) => {
                log::info!(
                    "Connection is {:?}, preferring {:?}",
                    state.status,
                    state.preference
                );
            }
            other => log::debug!("Unhandled listener message: {other:?}"),
        }
    }

    log::warn!("Listener closed the bridge");
    if listener.join().is_err() {
        anyhow::bail!("listener thread panicked");
    }
    Ok(())
}
