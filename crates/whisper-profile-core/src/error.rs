//! Error taxonomy for profile negotiation
//!
//! Only [`ProfileError::Aborted`] is an expected outcome; every other
//! variant ends the current run.

/// Errors surfaced by negotiation, signing and transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// The user quit, or input was closed
    Aborted(String),
    /// Transport failure (connect, timeout, broken response)
    Network(String),
    /// Unexpected HTTP status, body kept verbatim
    Server { status: u16, body: String },
    /// Response body did not have the expected shape
    Protocol(String),
    /// Programming or serialization fault
    Internal(String),
    /// Profile file could not be read or written
    Storage(String),
}

impl ProfileError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, ProfileError::Aborted(_))
    }
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileError::Aborted(msg) => write!(f, "{}", msg),
            ProfileError::Network(msg) => write!(f, "network error: {}", msg),
            ProfileError::Server { status, body } => write!(f, "server error: {} {}", status, body),
            ProfileError::Protocol(msg) => write!(f, "protocol error: {}", msg),
            ProfileError::Internal(msg) => write!(f, "internal error (report a bug!): {}", msg),
            ProfileError::Storage(msg) => write!(f, "storage error: {}", msg),
        }
    }
}

impl std::error::Error for ProfileError {}

impl From<serde_json::Error> for ProfileError {
    fn from(e: serde_json::Error) -> Self {
        ProfileError::Protocol(e.to_string())
    }
}

impl From<reqwest::Error> for ProfileError {
    fn from(e: reqwest::Error) -> Self {
        ProfileError::Network(e.to_string())
    }
}
