//! Error types for notify-relay.

use thiserror::Error;

/// Errors that can occur while relaying a notification.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No usable hook URL source is configured, or a configured value is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The key-management service could not decrypt the hook URL.
    #[error("decryption failed: {reason}")]
    Decryption {
        /// The reason decryption failed.
        reason: String,
    },

    /// The webhook answered with a 5xx status.
    #[error("server error when processing message: {status} - {reason}")]
    ServerUnavailable {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status.
        reason: String,
    },

    /// The request never produced a response.
    #[error("webhook request failed: {0}")]
    Transport(String),

    /// The chat message could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The inbound event document could not be read.
    #[error(transparent)]
    Event(#[from] notify_format::FormatError),
}

impl RelayError {
    /// Returns true if the host should redeliver the event.
    ///
    /// Configuration problems and unreadable events fail the same way on
    /// every attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Decryption { .. } | Self::ServerUnavailable { .. } | Self::Transport(_)
        )
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        // The hook URL is a credential; keep it out of error text.
        Self::Transport(err.without_url().to_string())
    }
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
