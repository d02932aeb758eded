//! Socket.IO push stream: the live message feed and the server log stream.

pub mod client;
pub mod codec;

pub use client::{PushClient, PushConfig};

use serde_json::{json, Value};
use url::Url;

use crate::error::{ConsoleError, Result};
use crate::models::Message;

pub const DEFAULT_SOCKET_PATH: &str = "/socket.io";

/// Server -> client events, one variant per handled event name.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Connected,
    Disconnected,
    Message(Box<Message>),
    LogLine { content: String },
    LogConnected { message: Option<String> },
    LogError { message: String },
    Other { name: String, data: Option<Value> },
}

impl PushEvent {
    /// Maps a decoded Socket.IO event onto a typed event. Payloads that do not
    /// match the expected shape degrade to [`PushEvent::Other`].
    pub fn from_event(name: &str, mut args: Vec<Value>) -> Self {
        let data = if args.is_empty() {
            None
        } else {
            Some(args.swap_remove(0))
        };
        let field = |key: &str| {
            data.as_ref()
                .and_then(|d| d.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        match name {
            "message" => {
                let parsed = data
                    .as_ref()
                    .and_then(|d| d.get("message"))
                    .cloned()
                    .map(serde_json::from_value::<Message>);
                match parsed {
                    Some(Ok(message)) => PushEvent::Message(Box::new(message)),
                    _ => PushEvent::Other {
                        name: name.to_string(),
                        data,
                    },
                }
            }
            "log_line" => PushEvent::LogLine {
                content: field("content").unwrap_or_default(),
            },
            "log_connected" => PushEvent::LogConnected {
                message: field("message"),
            },
            "log_error" => PushEvent::LogError {
                message: field("message").unwrap_or_else(|| "unknown error".to_string()),
            },
            _ => PushEvent::Other {
                name: name.to_string(),
                data,
            },
        }
    }
}

/// Client -> server events.
#[derive(Debug, Clone, PartialEq)]
pub enum Emit {
    Command(Value),
    StartLogStream,
    StopLogStream,
}

impl Emit {
    /// The greeting sent on every connect.
    pub fn hello() -> Self {
        Emit::Command(json!({ "data": "I'm connected!" }))
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            Emit::Command(_) => "command",
            Emit::StartLogStream => "start_log_stream",
            Emit::StopLogStream => "stop_log_stream",
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Emit::Command(data) => Some(data),
            _ => None,
        }
    }
}

/// Websocket endpoint for the Engine.IO v4 transport behind `path`.
pub fn socket_url(base_url: &str, path: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ConsoleError::Protocol(format!(
                "unsupported scheme for push stream: {}",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| ConsoleError::Protocol(format!("cannot switch {} to {}", base_url, scheme)))?;
    let path = format!("/{}/", path.trim_matches('/'));
    url.set_path(&path);
    url.set_query(Some("EIO=4&transport=websocket"));
    Ok(url)
}
