use crate::storage::StorageError;

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Either rejected locally (no token for a protected call) or an HTTP 401.
    #[error("Unauthorized ({code}): {message}")]
    Unauthorized {
        code: i32,
        message: String,
        local: bool,
    },

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Decode error: {0}")]
    Decode(String),

    /// Envelope with a non-200 application code.
    #[error("API error {code}: {message}")]
    Api { code: i32, message: String },

    #[error("Response carried no data")]
    MissingData,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP-like status for the failure, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the request never left the process.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Unauthorized { local: true, .. })
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
