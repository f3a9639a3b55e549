//! Error types for the sync engine

use thiserror::Error;

/// Failures talking to the exchange REST API
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection, timeout or body read failure
    #[error("transport error: {0}")]
    Transport(String),

    /// 401 from the exchange; retrying cannot help
    #[error("unauthorized: {0}")]
    Auth(String),

    /// Any other non-200 HTTP status
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Body did not parse as the expected envelope
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Well-formed envelope carrying a non-zero retCode
    #[error("API error: {message} (code {code})")]
    Remote { code: i64, message: String },

    /// Signing key could not be built from the API secret
    #[error("signing error: {0}")]
    Signing(String),
}

impl ApiError {
    /// Whether another attempt of the same request might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::HttpStatus { .. } | Self::Malformed(_)
        )
    }

    /// Plain description suitable for showing to an end user
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => "The exchange could not be reached. Please try again later.".into(),
            Self::Auth(_) => {
                "Unauthorized: check the API key/secret and the IP whitelist.".into()
            }
            Self::HttpStatus { status, .. } => {
                format!("The exchange returned an unexpected status ({}).", status)
            }
            Self::Malformed(_) => "The exchange returned a response in an unexpected format.".into(),
            Self::Remote { message, .. } => format!("The exchange rejected the request: {}", message),
            Self::Signing(_) => "The API secret is not usable for signing requests.".into(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Failures of the local trade cache
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache connection lock poisoned")]
    LockPoisoned,

    /// The blocking task running a cache call panicked or was cancelled
    #[error("cache task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
