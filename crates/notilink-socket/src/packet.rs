//! Engine.IO and Socket.IO packet codecs.
//!
//! Engine.IO packets are a single type digit followed by an optional text
//! body. Socket.IO packets travel inside Engine.IO `message` packets and add
//! a namespace, an optional acknowledgement id, and a JSON body.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::TransportError;

/// Separates packets inside a long-polling payload.
pub const RECORD_SEPARATOR: char = '\x1e';

/// Namespace used when the endpoint does not name one.
pub const DEFAULT_NAMESPACE: &str = "/";

/// Session parameters sent by the server in the Engine.IO `open` packet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Interval between server pings, in milliseconds.
    pub ping_interval: u64,
    /// How long the server waits for a pong, in milliseconds.
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

impl Handshake {
    /// Longest silence from the server before the session is considered dead.
    pub fn heartbeat_deadline(&self) -> Duration {
        Duration::from_millis(self.ping_interval + self.ping_timeout)
    }
}

/// A single Engine.IO packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(text: &str) -> Result<Self, TransportError> {
        let mut chars = text.chars();
        let kind = chars
            .next()
            .ok_or_else(|| TransportError::Protocol("empty engine packet".into()))?;
        let body = chars.as_str();

        match kind {
            '0' => {
                let handshake = serde_json::from_str(body).map_err(|e| {
                    TransportError::Protocol(format!("invalid open packet: {e}"))
                })?;
                Ok(EnginePacket::Open(handshake))
            }
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(body.to_string())),
            '3' => Ok(EnginePacket::Pong(body.to_string())),
            '4' => Ok(EnginePacket::Message(body.to_string())),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(TransportError::Protocol(format!(
                "unknown engine packet type {other:?}"
            ))),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(handshake) => {
                // Handshake only holds plain fields, serialization cannot fail.
                let body = serde_json::to_string(handshake).unwrap_or_default();
                format!("0{body}")
            }
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(body) => format!("2{body}"),
            EnginePacket::Pong(body) => format!("3{body}"),
            EnginePacket::Message(body) => format!("4{body}"),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

/// Splits a long-polling response body into packets.
pub fn decode_payload(body: &str) -> Result<Vec<EnginePacket>, TransportError> {
    body.split(RECORD_SEPARATOR)
        .filter(|chunk| !chunk.is_empty())
        .map(EnginePacket::decode)
        .collect()
}

/// Joins packets into a long-polling request body.
pub fn encode_payload(packets: &[EnginePacket]) -> String {
    let encoded: Vec<String> = packets.iter().map(EnginePacket::encode).collect();
    encoded.join(&RECORD_SEPARATOR.to_string())
}

/// A Socket.IO packet, carried inside [`EnginePacket::Message`].
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        ack_id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        message: String,
    },
    /// Acknowledgements and binary packets. The client never asks for acks
    /// and does not reassemble attachments.
    Unsupported(char),
}

impl SocketPacket {
    /// Builds the packet that joins `namespace`.
    pub fn connect(namespace: impl Into<String>) -> Self {
        SocketPacket::Connect {
            namespace: namespace.into(),
            data: None,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            SocketPacket::Connect { namespace, .. }
            | SocketPacket::Disconnect { namespace }
            | SocketPacket::Event { namespace, .. }
            | SocketPacket::ConnectError { namespace, .. } => Some(namespace),
            SocketPacket::Unsupported(_) => None,
        }
    }

    pub fn decode(text: &str) -> Result<Self, TransportError> {
        let mut chars = text.chars();
        let kind = chars
            .next()
            .ok_or_else(|| TransportError::Protocol("empty socket packet".into()))?;
        let rest = chars.as_str();

        if matches!(kind, '3' | '5' | '6') {
            return Ok(SocketPacket::Unsupported(kind));
        }

        let (namespace, rest) = split_namespace(rest);
        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        let (ack_id, body) = rest.split_at(digits);
        let ack_id = if ack_id.is_empty() {
            None
        } else {
            Some(ack_id.parse::<u64>().map_err(|e| {
                TransportError::Protocol(format!("invalid ack id {ack_id:?}: {e}"))
            })?)
        };
        let data = if body.is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(body).map_err(|e| {
                TransportError::Protocol(format!("invalid socket packet body: {e}"))
            })?)
        };

        match kind {
            '0' => Ok(SocketPacket::Connect { namespace, data }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let Some(Value::Array(mut items)) = data else {
                    return Err(TransportError::Protocol(
                        "event packet without an argument array".into(),
                    ));
                };
                if items.is_empty() {
                    return Err(TransportError::Protocol("event packet without a name".into()));
                }
                let name = match items.remove(0) {
                    Value::String(name) => name,
                    other => {
                        return Err(TransportError::Protocol(format!(
                            "event name is not a string: {other}"
                        )));
                    }
                };
                Ok(SocketPacket::Event {
                    namespace,
                    ack_id,
                    name,
                    args: items,
                })
            }
            '4' => {
                // v5 servers send an object with a `message` key, v4 servers
                // send a bare string.
                let message = match data {
                    Some(Value::Object(map)) => map
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("connection refused")
                        .to_string(),
                    Some(Value::String(message)) => message,
                    _ => "connection refused".to_string(),
                };
                Ok(SocketPacket::ConnectError { namespace, message })
            }
            other => Err(TransportError::Protocol(format!(
                "unknown socket packet type {other:?}"
            ))),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            SocketPacket::Connect { namespace, data } => {
                let body = data.as_ref().map(Value::to_string).unwrap_or_default();
                format!("0{}{body}", namespace_prefix(namespace))
            }
            SocketPacket::Disconnect { namespace } => {
                format!("1{}", namespace_prefix(namespace))
            }
            SocketPacket::Event {
                namespace,
                ack_id,
                name,
                args,
            } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                let ack_id = ack_id.map(|id| id.to_string()).unwrap_or_default();
                format!(
                    "2{}{ack_id}{}",
                    namespace_prefix(namespace),
                    Value::Array(items)
                )
            }
            SocketPacket::ConnectError { namespace, message } => {
                let body = serde_json::json!({ "message": message });
                format!("4{}{body}", namespace_prefix(namespace))
            }
            SocketPacket::Unsupported(kind) => kind.to_string(),
        }
    }
}

/// Renders the first event argument as the text handed to the listener.
pub fn event_text(args: &[Value]) -> String {
    match args.first() {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn split_namespace(rest: &str) -> (String, &str) {
    if !rest.starts_with('/') {
        return (DEFAULT_NAMESPACE.to_string(), rest);
    }
    match rest.find(',') {
        Some(index) => (rest[..index].to_string(), &rest[index + 1..]),
        None => (rest.to_string(), ""),
    }
}

fn namespace_prefix(namespace: &str) -> String {
    if namespace == DEFAULT_NAMESPACE {
        String::new()
    } else {
        format!("{namespace},")
    }
}
