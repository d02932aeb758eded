use thiserror::Error;

/// Errors raised by the REST and push-stream adapters.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: ureq::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("websocket error: {0}")]
    Socket(#[from] tungstenite::Error),

    #[error("socket.io protocol error: {0}")]
    Protocol(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("background worker is gone")]
    Disconnected,
}

impl ConsoleError {
    pub(crate) fn http(endpoint: &str, source: ureq::Error) -> Self {
        match source {
            ureq::Error::StatusCode(status) => ConsoleError::Status {
                endpoint: endpoint.to_string(),
                status,
            },
            source => ConsoleError::Http {
                endpoint: endpoint.to_string(),
                source,
            },
        }
    }

    pub(crate) fn decode(what: impl Into<String>, source: serde_json::Error) -> Self {
        ConsoleError::Decode {
            what: what.into(),
            source,
        }
    }
}

pub type Result<T, E = ConsoleError> = std::result::Result<T, E>;
