use thiserror::Error;

/// Failure while opening or reading the `/chat` stream.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("stream from {url} broke: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{0}")]
    Mock(String),
}

/// A single NDJSON line that could not be turned into a record.
#[derive(Debug, Error)]
pub enum RecordParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record has no `type` field")]
    MissingType,
    #[error("unknown record type `{0}`")]
    UnknownType(String),
    #[error("record of type `{0}` has no `content` field")]
    MissingContent(String),
}

/// Failure reported for a model-switch or clear-session command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    Rejected(String),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

impl CommandError {
    /// Text shown in the transcript after `SYSTEM: ERROR: `.
    pub fn display_text(&self) -> String {
        match self {
            CommandError::Rejected(message) => message.clone(),
            other => other.to_string(),
        }
    }
}
