//! Event classification and chat-message formatting for notify-relay.
//!
//! `notify-format` turns cloud-infrastructure notifications into chat
//! messages. It knows four kinds of event:
//!
//! - **Alarms**: metric alarm state changes
//! - **Task state changes**: container tasks starting, running, stopping
//! - **Scheduled rules**: time-based rule triggers
//! - **Everything else**: rendered as a key/value listing
//!
//! Classification and formatting are pure. The same envelope always renders
//! to the same message, and missing fields render as empty strings.
//!
//! # Example
//!
//! ```rust
//! use notify_format::{render, Color, Envelope, Payload};
//! use serde_json::json;
//!
//! let envelope = Envelope::new(Payload::from_value(json!({
//!     "AlarmName": "cpu-high",
//!     "NewStateValue": "ALARM",
//!     "OldStateValue": "OK",
//! })))
//! .with_subject("ALARM: cpu-high")
//! .with_timestamp("2024-01-02T03:04:05.000Z");
//!
//! let message = render(&envelope);
//! assert_eq!(message.text, "*AWS CloudWatch Notification*");
//! assert_eq!(message.color(), Some(Color::Danger));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod classify;
pub mod envelope;
pub mod error;
pub mod formatters;
pub mod message;
pub mod render;

pub use classify::{Category, ClassifiedEvent, Decision, classify, decide};
pub use envelope::{Envelope, Payload, parse_event, parse_event_value};
pub use error::{FormatError, Result};
pub use message::{Attachment, ChatMessage, Color, Field};

/// Classifies an envelope and renders it with the matching formatter.
#[must_use]
pub fn render(envelope: &Envelope) -> ChatMessage {
    classify(envelope).format(envelope.epoch_seconds())
}
