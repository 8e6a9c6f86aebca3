//! Error types shared by the REST client, the coordinator and the command surface.

/// Result type alias for spotsel operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The Web API answered with a status >= 400
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// HTTP transport failed before a status was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No usable access token could be obtained
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// User input that cannot be resolved (missing device, unknown playlist, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A mandatory part of a poll cycle failed
    #[error("Update failed: {0}")]
    UpdateFailed(String),
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// HTTP status carried by an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
