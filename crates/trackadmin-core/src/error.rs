//! Error types shared across trackadmin crates.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackAdminError>;

#[derive(Debug, Error)]
pub enum TrackAdminError {
    /// Transport-level HTTP failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The server answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Input rejected before it reached the server.
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackAdminError {
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    pub fn api(status: u16, msg: impl Into<String>) -> Self {
        Self::Api { status, message: msg.into() }
    }

    pub fn websocket(msg: impl Into<String>) -> Self {
        Self::WebSocket(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Message suitable for showing to the operator.
    ///
    /// API errors carry the server's own wording, so they are shown bare.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = TrackAdminError::api(403, "Admins only");
        assert_eq!(err.to_string(), "API error 403: Admins only");
        assert_eq!(err.user_message(), "Admins only");
    }

    #[test]
    fn test_user_message_falls_back_to_display() {
        let err = TrackAdminError::validation("password too short");
        assert_eq!(err.user_message(), "Invalid input: password too short");
    }
}
