use std::time::Duration;

use crate::{
    Endpoint, SocketConnector, SocketSession, TransportError, TransportKind,
    polling::PollingSession, websocket::WebSocketSession,
};

/// Opens Engine.IO sessions over the transport listed first.
///
/// Holds a pooled HTTP client shared by every polling session it opens.
#[derive(Debug, Clone)]
pub struct EngineIoConnector {
    client: reqwest::Client,
    handshake_timeout: Duration,
}

impl EngineIoConnector {
    /// Builds the connector. Fails with [`TransportError::Load`] when the
    /// HTTP client cannot be created (e.g., no TLS backend is available).
    pub fn new(handshake_timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Load(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            handshake_timeout,
        })
    }
}

#[async_trait::async_trait]
impl SocketConnector for EngineIoConnector {
    async fn connect(
        &self,
        endpoint: &Endpoint,
        transports: &[TransportKind],
    ) -> Result<Box<dyn SocketSession>, TransportError> {
        let Some(transport) = transports.first() else {
            return Err(TransportError::Load("no transports to connect with".into()));
        };

        log::debug!(
            "Connecting to namespace {} with transports {transports:?}",
            endpoint.namespace()
        );
        match transport {
            TransportKind::WebSocket => {
                let session = WebSocketSession::open(endpoint, self.handshake_timeout).await?;
                Ok(Box::new(session))
            }
            TransportKind::Polling => {
                let session =
                    PollingSession::open(&self.client, endpoint, self.handshake_timeout).await?;
                Ok(Box::new(session))
            }
        }
    }
}
