use thiserror::Error;

/// Failure modes of the remote recipe API, as seen by callers.
///
/// Expected failures (connectivity, expired sessions, missing recipes,
/// malformed payloads) travel as values of this type rather than panics;
/// the CLI turns them into short messages for the user.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    /// Refresh and login both exhausted; the request stays unauthenticated.
    #[error("authentication failed")]
    Auth,
    #[error("recipe {0} not found")]
    NotFound(i64),
    #[error("malformed response: {0}")]
    Deserialize(String),
    /// Local credential persistence failed mid-authentication.
    #[error("credential store error: {0}")]
    Store(String),
}

impl ApiError {
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network(err.to_string())
    }

    pub fn deserialize(err: impl std::fmt::Display) -> Self {
        Self::Deserialize(err.to_string())
    }
}
