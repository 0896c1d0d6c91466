//! Socket.IO session over a WebSocket.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use crate::{
    Endpoint, MESSAGE_EVENT, SessionEvent, SocketSession, TransportError, TransportKind,
    packet::{EnginePacket, Handshake, SocketPacket, event_text},
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Session that exchanges one Engine.IO packet per text frame.
pub struct WebSocketSession {
    stream: WsStream,
    handshake: Handshake,
    namespace: String,
}

impl WebSocketSession {
    /// Opens the WebSocket, reads the `open` packet, and joins the endpoint's
    /// namespace. Every failure here except a load error is reported as a
    /// negotiation error.
    pub async fn open(endpoint: &Endpoint, timeout: Duration) -> Result<Self, TransportError> {
        let url = endpoint.transport_url(TransportKind::WebSocket, None)?;
        log::debug!("Opening websocket session at {url}");

        tokio::time::timeout(timeout, Self::negotiate(url.as_str(), endpoint.namespace()))
            .await
            .map_err(|_| TransportError::Negotiation("websocket handshake timed out".into()))?
            .map_err(TransportError::into_negotiation)
    }

    async fn negotiate(url: &str, namespace: &str) -> Result<Self, TransportError> {
        let (stream, _) = connect_async(url).await?;

        let mut session = Self {
            stream,
            handshake: Handshake::default(),
            namespace: namespace.to_string(),
        };

        match session.read_packet().await? {
            Some(EnginePacket::Open(handshake)) => session.handshake = handshake,
            Some(other) => {
                return Err(TransportError::Negotiation(format!(
                    "expected open packet, got {other:?}"
                )));
            }
            None => {
                return Err(TransportError::Negotiation(
                    "socket closed before the open packet".into(),
                ));
            }
        }

        let connect = SocketPacket::connect(namespace).encode();
        session.write_packet(EnginePacket::Message(connect)).await?;

        loop {
            let packet = session.read_packet().await?;
            match packet {
                Some(EnginePacket::Ping(body)) => {
                    session.write_packet(EnginePacket::Pong(body)).await?
                }
                Some(EnginePacket::Message(text)) => {
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
                Some(EnginePacket::Close) | None => {
                    return Err(TransportError::Negotiation(
                        "socket closed before the connect ack".into(),
                    ));
                }
                Some(_) => {}
            }
        }
    }

    /// Reads the next Engine.IO packet. Returns `None` when the socket closes.
    async fn read_packet(&mut self) -> Result<Option<EnginePacket>, TransportError> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                Message::Text(text) => return EnginePacket::decode(text.as_str()).map(Some),
                Message::Close(_) => return Ok(None),
                // binary attachments and websocket-level control frames
                _ => continue,
            }
        }
        Ok(None)
    }

    async fn write_packet(&mut self, packet: EnginePacket) -> Result<(), TransportError> {
        self.stream.send(Message::text(packet.encode())).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SocketSession for WebSocketSession {
    fn transport(&self) -> TransportKind {
        TransportKind::WebSocket
    }

    fn sid(&self) -> &str {
        &self.handshake.sid
    }

    async fn next_event(&mut self) -> Result<SessionEvent, TransportError> {
        let deadline = self.handshake.heartbeat_deadline();
        loop {
            let packet = tokio::time::timeout(deadline, self.read_packet())
                .await
                .map_err(|_| TransportError::HeartbeatTimeout)??;

            match packet {
                None | Some(EnginePacket::Close) => {
                    return Ok(SessionEvent::Disconnected {
                        reason: "transport closed".into(),
                    });
                }
                Some(EnginePacket::Ping(body)) => {
                    self.write_packet(EnginePacket::Pong(body)).await?;
                }
                Some(EnginePacket::Message(text)) => {
                    if let Some(event) = session_event(&self.namespace, &text)? {
                        return Ok(event);
                    }
                }
                Some(_) => {}
            }
        }
    }
}

/// Maps a Socket.IO packet received on an open session to an event for the
/// caller. Packets for other namespaces and other events are dropped.
pub(crate) fn session_event(
    namespace: &str,
    text: &str,
) -> Result<Option<SessionEvent>, TransportError> {
    let packet = SocketPacket::decode(text)?;
    if packet.namespace().is_some_and(|ns| ns != namespace) {
        return Ok(None);
    }

    match packet {
        SocketPacket::Event { name, args, .. } if name == MESSAGE_EVENT => {
            Ok(Some(SessionEvent::Message(event_text(&args))))
        }
        SocketPacket::Disconnect { .. } => Ok(Some(SessionEvent::Disconnected {
            reason: "server disconnect".into(),
        })),
        other => {
            log::debug!("Ignoring socket packet: {other:?}");
            Ok(None)
        }
    }
}
