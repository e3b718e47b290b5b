//! Error types for the notify-format crate.
//!
//! Formatting itself never fails. These errors only cover turning raw event
//! text into envelopes.

use thiserror::Error;

/// Errors that can occur while reading an inbound event document.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The event document is not valid JSON or has the wrong shape.
    #[error("invalid event document: {reason}")]
    InvalidEvent {
        /// The reason the document was rejected.
        reason: String,
    },

    /// The event document carried a `Records` array with no entries.
    #[error("event contains no records")]
    EmptyEvent,
}

impl From<serde_json::Error> for FormatError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidEvent {
            reason: err.to_string(),
        }
    }
}

/// Result type for event parsing.
pub type Result<T> = std::result::Result<T, FormatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_event() {
        let err = FormatError::InvalidEvent {
            reason: "expected object".to_string(),
        };
        assert_eq!(err.to_string(), "invalid event document: expected object");
    }

    #[test]
    fn error_display_empty_event() {
        assert_eq!(FormatError::EmptyEvent.to_string(), "event contains no records");
    }

    #[test]
    fn error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json");
        assert!(json_err.is_err());
        let err: FormatError = json_err.unwrap_err().into();
        assert!(matches!(err, FormatError::InvalidEvent { .. }));
    }
}
