use std::fmt;

/// Engine code for "a function was called with a bad argument".
pub const CURLE_BAD_FUNCTION_ARGUMENT: i32 = 43;

/// Engine code for "operation timed out".
pub const CURLE_OPERATION_TIMEDOUT: i32 = 28;

/// Failures of the library itself.
///
/// Per-transfer failures are not reported through this type: they are recorded
/// on the request as a [`TransferError`] and read back through the accessors.
#[derive(Debug, thiserror::Error)]
pub enum CurlError {
    #[error("Curl error: {0}")]
    Curl(#[from] curl::Error),

    #[error("Curl multi error: {0}")]
    Multi(#[from] curl::MultiError),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Request has not been executed")]
    NotExecuted,

    #[error("Transfer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Engine-reported outcome of one failed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferError {
    /// Engine error code, never `0`.
    pub code: i32,
    /// Human-readable engine message.
    pub message: String,
}

impl TransferError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// An option carried a value of the wrong kind for its key.
    pub fn bad_argument(message: impl Into<String>) -> Self {
        Self::new(CURLE_BAD_FUNCTION_ARGUMENT, message)
    }
}

impl From<curl::Error> for TransferError {
    fn from(err: curl::Error) -> Self {
        // The extra description carries the detailed error buffer ("Failed to connect to ...").
        let message = match err.extra_description() {
            Some(extra) if !extra.is_empty() => extra.to_string(),
            _ => err.description().to_string(),
        };
        Self::new(err.code() as i32, message)
    }
}

impl From<curl::MultiError> for TransferError {
    fn from(err: curl::MultiError) -> Self {
        Self::new(err.code() as i32, err.description().to_string())
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for TransferError {}
