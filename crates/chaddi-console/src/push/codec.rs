//! Text framing for Engine.IO v4 and Socket.IO v5 over a websocket transport.

use serde_json::Value;

use crate::error::{ConsoleError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    /// Handshake JSON (`sid`, `pingInterval`, `pingTimeout`).
    Open(Value),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| ConsoleError::Protocol("empty engine.io frame".into()))?;
        let body = chars.as_str();
        Ok(match kind {
            '0' => EnginePacket::Open(
                serde_json::from_str(body).map_err(|e| ConsoleError::decode("handshake", e))?,
            ),
            '1' => EnginePacket::Close,
            '2' => EnginePacket::Ping(body.to_string()),
            '3' => EnginePacket::Pong(body.to_string()),
            '4' => EnginePacket::Message(body.to_string()),
            '5' => EnginePacket::Upgrade,
            '6' => EnginePacket::Noop,
            other => {
                return Err(ConsoleError::Protocol(format!(
                    "unknown engine.io packet type {:?}",
                    other
                )))
            }
        })
    }

    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(data) => format!("0{}", data),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{}", data),
            EnginePacket::Pong(data) => format!("3{}", data),
            EnginePacket::Message(data) => format!("4{}", data),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

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
        ack: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        ack: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        data: Option<Value>,
    },
}

impl SocketPacket {
    /// Decodes the payload of an engine.io `message` packet.
    pub fn decode(payload: &str) -> Result<Self> {
        let mut chars = payload.chars();
        let kind = chars
            .next()
            .ok_or_else(|| ConsoleError::Protocol("empty socket.io packet".into()))?;
        let mut rest = chars.as_str();

        if matches!(kind, '5' | '6') {
            return Err(ConsoleError::Protocol(
                "binary socket.io packets are not supported".into(),
            ));
        }

        let mut namespace = "/".to_string();
        if rest.starts_with('/') {
            let end = rest.find(',').unwrap_or(rest.len());
            namespace = rest[..end].to_string();
            rest = rest.get(end + 1..).unwrap_or("");
        }

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let ack = if digits > 0 {
            rest[..digits].parse::<u64>().ok()
        } else {
            None
        };
        rest = &rest[digits..];

        let data: Option<Value> = if rest.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str(rest)
                    .map_err(|e| ConsoleError::decode("socket.io payload", e))?,
            )
        };

        match kind {
            '0' => Ok(SocketPacket::Connect { namespace, data }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let mut args = match data {
                    Some(Value::Array(args)) => args,
                    _ => {
                        return Err(ConsoleError::Protocol(
                            "event payload is not an array".into(),
                        ))
                    }
                };
                if args.is_empty() {
                    return Err(ConsoleError::Protocol("event without a name".into()));
                }
                let name = match args.remove(0) {
                    Value::String(name) => name,
                    other => {
                        return Err(ConsoleError::Protocol(format!(
                            "event name is not a string: {}",
                            other
                        )))
                    }
                };
                Ok(SocketPacket::Event {
                    namespace,
                    ack,
                    name,
                    args,
                })
            }
            '3' => {
                let ack = ack.ok_or_else(|| ConsoleError::Protocol("ack without id".into()))?;
                let args = match data {
                    Some(Value::Array(args)) => args,
                    Some(other) => vec![other],
                    None => Vec::new(),
                };
                Ok(SocketPacket::Ack {
                    namespace,
                    ack,
                    args,
                })
            }
            '4' => Ok(SocketPacket::ConnectError { namespace, data }),
            other => Err(ConsoleError::Protocol(format!(
                "unknown socket.io packet type {:?}",
                other
            ))),
        }
    }

    /// Encodes the packet as the payload of an engine.io `message` packet.
    pub fn encode(&self) -> String {
        fn prefix(kind: char, namespace: &str) -> String {
            if namespace == "/" {
                kind.to_string()
            } else {
                format!("{}{},", kind, namespace)
            }
        }
        match self {
            SocketPacket::Connect { namespace, data } => {
                let mut out = prefix('0', namespace);
                if let Some(data) = data {
                    out.push_str(&data.to_string());
                }
                out
            }
            SocketPacket::Disconnect { namespace } => prefix('1', namespace),
            SocketPacket::Event {
                namespace,
                ack,
                name,
                args,
            } => {
                let mut out = prefix('2', namespace);
                if let Some(ack) = ack {
                    out.push_str(&ack.to_string());
                }
                let mut array = Vec::with_capacity(args.len() + 1);
                array.push(Value::String(name.clone()));
                array.extend(args.iter().cloned());
                out.push_str(&Value::Array(array).to_string());
                out
            }
            SocketPacket::Ack {
                namespace,
                ack,
                args,
            } => format!(
                "{}{}{}",
                prefix('3', namespace),
                ack,
                Value::Array(args.clone())
            ),
            SocketPacket::ConnectError { namespace, data } => {
                let mut out = prefix('4', namespace);
                if let Some(data) = data {
                    out.push_str(&data.to_string());
                }
                out
            }
        }
    }
}

/// Full websocket text frame for an event on the default namespace.
pub fn encode_event(name: &str, data: Option<&Value>) -> String {
    EnginePacket::Message(
        SocketPacket::Event {
            namespace: "/".into(),
            ack: None,
            name: name.to_string(),
            args: data.cloned().into_iter().collect(),
        }
        .encode(),
    )
    .encode()
}

/// Full websocket text frame joining the default namespace.
pub fn encode_connect() -> String {
    EnginePacket::Message(
        SocketPacket::Connect {
            namespace: "/".into(),
            data: None,
        }
        .encode(),
    )
    .encode()
}
