//! Socket.IO session over HTTP long-polling.

use std::{collections::VecDeque, time::Duration};

use reqwest::{Url, header::CONTENT_TYPE};

use crate::{
    Endpoint, SessionEvent, SocketSession, TransportError, TransportKind,
    packet::{EnginePacket, Handshake, SocketPacket, decode_payload, encode_payload},
    websocket::session_event,
};

/// Session that receives packets through repeated `GET` requests and sends
/// them through `POST` requests bound to the session id.
pub struct PollingSession {
    client: reqwest::Client,
    url: Url,
    handshake: Handshake,
    namespace: String,
    pending: VecDeque<EnginePacket>,
}

impl PollingSession {
    /// Performs the Engine.IO handshake and joins the endpoint's namespace.
    /// Every failure here except a load error is reported as a negotiation
    /// error.
    pub async fn open(
        client: &reqwest::Client,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        tokio::time::timeout(timeout, Self::negotiate(client.clone(), endpoint))
            .await
            .map_err(|_| TransportError::Negotiation("polling handshake timed out".into()))?
            .map_err(TransportError::into_negotiation)
    }

    async fn negotiate(
        client: reqwest::Client,
        endpoint: &Endpoint,
    ) -> Result<Self, TransportError> {
        let url = endpoint.transport_url(TransportKind::Polling, None)?;
        log::debug!("Opening polling session at {url}");

        let body = fetch(&client, url, None).await?;
        let mut packets: VecDeque<EnginePacket> = decode_payload(&body)?.into();
        let handshake = match packets.pop_front() {
            Some(EnginePacket::Open(handshake)) => handshake,
            other => {
                return Err(TransportError::Negotiation(format!(
                    "expected open packet, got {other:?}"
                )));
            }
        };

        let mut session = Self {
            client,
            url: endpoint.transport_url(TransportKind::Polling, Some(&handshake.sid))?,
            handshake,
            namespace: endpoint.namespace().to_string(),
            pending: packets,
        };

        let connect = SocketPacket::connect(endpoint.namespace()).encode();
        session.post(&[EnginePacket::Message(connect)]).await?;

        loop {
            match session.next_packet().await? {
                EnginePacket::Ping(body) => session.post(&[EnginePacket::Pong(body)]).await?,
                EnginePacket::Message(text) => {
                    match SocketPacket::decode(&text)? {
                        SocketPacket::Connect { namespace: ns, .. } if ns == session.namespace => {
                            return Ok(session);
                        }
                        SocketPacket::ConnectError { message, .. } => {
                            return Err(TransportError::Negotiation(message));
                        }
                        other => log::debug!("Ignoring packet before connect ack: {other:?}"),
                    }
                }
                EnginePacket::Close => {
                    return Err(TransportError::Negotiation(
                        "session closed before the connect ack".into(),
                    ));
                }
                _ => {}
            }
        }
    }

    /// Returns the next buffered packet, polling the server when the buffer
    /// is empty.
    async fn next_packet(&mut self) -> Result<EnginePacket, TransportError> {
        loop {
            if let Some(packet) = self.pending.pop_front() {
                return Ok(packet);
            }

            let deadline = self.handshake.heartbeat_deadline();
            let body = fetch(&self.client, self.url.clone(), Some(deadline)).await?;
            self.pending.extend(decode_payload(&body)?);
        }
    }

    async fn post(&self, packets: &[EnginePacket]) -> Result<(), TransportError> {
        self.client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(encode_payload(packets))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SocketSession for PollingSession {
    fn transport(&self) -> TransportKind {
        TransportKind::Polling
    }

    fn sid(&self) -> &str {
        &self.handshake.sid
    }

    async fn next_event(&mut self) -> Result<SessionEvent, TransportError> {
        loop {
            match self.next_packet().await? {
                EnginePacket::Close => {
                    return Ok(SessionEvent::Disconnected {
                        reason: "transport closed".into(),
                    });
                }
                EnginePacket::Ping(body) => self.post(&[EnginePacket::Pong(body)]).await?,
                EnginePacket::Message(text) => {
                    if let Some(event) = session_event(&self.namespace, &text)? {
                        return Ok(event);
                    }
                }
                _ => {}
            }
        }
    }
}

async fn fetch(
    client: &reqwest::Client,
    url: Url,
    deadline: Option<Duration>,
) -> Result<String, TransportError> {
    let mut request = client.get(url);
    if let Some(deadline) = deadline.filter(|deadline| !deadline.is_zero()) {
        request = request.timeout(deadline);
    }

    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            TransportError::HeartbeatTimeout
        } else {
            TransportError::Http(e)
        }
    })?;
    Ok(response.error_for_status()?.text().await?)
}
