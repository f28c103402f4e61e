use thiserror::Error;

#[derive(Debug, Error)]
pub enum BmsError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for BmsError {
    fn from(e: serde_json::Error) -> Self {
        BmsError::SerializationError(e.to_string())
    }
}

impl From<std::io::Error> for BmsError {
    fn from(e: std::io::Error) -> Self {
        BmsError::Storage(e.to_string())
    }
}

/// A user-correctable rejection carrying every violated rule, in rule order.
///
/// Produced locally by the validators and never sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .reasons.join("; "))]
pub struct ValidationRejected {
    pub reasons: Vec<String>,
}

impl ValidationRejected {
    pub fn new(reasons: Vec<String>) -> Self {
        Self { reasons }
    }
}

/// Failures surfaced by the client orchestration to the view layer. The
/// `Display` text is meant to be shown to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(#[from] ValidationRejected),

    /// The backend refused the request; carries its message verbatim.
    #[error("{0}")]
    BackendRejected(String),

    #[error("Your session has expired. Please log in again.")]
    AuthorizationExpired,

    /// Network or server failure; the user may retry.
    #[error("{0}")]
    Transient(String),

    #[error("Please log in to continue.")]
    NotSignedIn,
}

impl ClientError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Transient(_))
    }
}
