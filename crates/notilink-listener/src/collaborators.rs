//! Interfaces of the host services the router talks to.
//!
//! The router only sees these traits. In the running listener all three are
//! backed by [`BridgeOutlet`], which forwards to the host over the bridge
//! channel; tests substitute mocks.

use notilink_bridge::{MessageFromListener, notification::ToastMessage, record::RecordChange};
use tokio::sync::mpsc::{Sender, error::SendError};

/// Errors returned by collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// The host went away.
    #[error("host channel is closed")]
    ChannelClosed,
}

impl<T> From<SendError<T>> for CollaboratorError {
    fn from(_: SendError<T>) -> Self {
        CollaboratorError::ChannelClosed
    }
}

/// Receives the generic "message received" event.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    /// Called with the original raw text of every decoded message.
    async fn message_received(&self, message: &str) -> Result<(), CollaboratorError>;
}

/// Tells the host that cached data for some records is stale.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn notify_record_change(
        &self,
        changes: Vec<RecordChange>,
    ) -> Result<(), CollaboratorError>;
}

/// Shows toasts to the user.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ToastNotifier: Send + Sync {
    async fn show_toast(&self, toast: ToastMessage) -> Result<(), CollaboratorError>;
}

/// Collaborator implementation that forwards everything to the host.
///
/// Waits for room in the bridge channel, so a slow host slows the listener
/// down instead of losing events.
#[derive(Debug, Clone)]
pub struct BridgeOutlet {
    tx: Sender<MessageFromListener>,
}

impl BridgeOutlet {
    pub fn new(tx: Sender<MessageFromListener>) -> Self {
        Self { tx }
    }

    async fn forward(&self, message: MessageFromListener) -> Result<(), CollaboratorError> {
        self.tx.send(message).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl EventSink for BridgeOutlet {
    async fn message_received(&self, message: &str) -> Result<(), CollaboratorError> {
        self.forward(MessageFromListener::MessageReceived {
            message: message.to_string(),
        })
        .await
    }
}

#[async_trait::async_trait]
impl CacheInvalidator for BridgeOutlet {
    async fn notify_record_change(
        &self,
        changes: Vec<RecordChange>,
    ) -> Result<(), CollaboratorError> {
        self.forward(MessageFromListener::RecordsChanged(changes)).await
    }
}

#[async_trait::async_trait]
impl ToastNotifier for BridgeOutlet {
    async fn show_toast(&self, toast: ToastMessage) -> Result<(), CollaboratorError> {
        self.forward(MessageFromListener::Toast(toast)).await
    }
}
