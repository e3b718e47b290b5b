//! Inbound notification envelopes.
//!
//! An [`Envelope`] is one notification plus its transport metadata. It can be
//! read from the flat form
//!
//! ```json
//! { "subscriptionId": "...", "subject": "...", "topicId": "...",
//!   "timestamp": "...", "message": "..." }
//! ```
//!
//! or from an SNS Lambda record (`EventSubscriptionArn` + `Sns { ... }`).
//! [`parse_event`] accepts either a single envelope or an event document with
//! a `Records` array.

use chrono::DateTime;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{FormatError, Result};
use crate::render;

/// The message carried by an envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A JSON object, either delivered as-is or decoded from the message text.
    Structured(Map<String, Value>),
    /// Free text that does not decode to a JSON object.
    Raw(String),
}

impl Payload {
    /// Interprets a message value.
    ///
    /// Strings holding a JSON object become [`Payload::Structured`]; any other
    /// string is kept verbatim. A missing message is an empty raw payload.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Structured(map),
            Value::String(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => Self::Structured(map),
                _ => Self::Raw(text),
            },
            Value::Null => Self::Raw(String::new()),
            other => Self::Raw(other.to_string()),
        }
    }

    /// Returns the top-level object, if the payload is structured.
    #[must_use]
    pub const fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Structured(map) => Some(map),
            Self::Raw(_) => None,
        }
    }

    /// Returns a top-level value by key. Raw payloads have no keys.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Returns true if the payload is free text.
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::Raw(String::new())
    }
}

/// A single notification wrapped in transport metadata.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "EnvelopeRepr")]
pub struct Envelope {
    /// Identifier of the subscription that delivered the notification.
    pub subscription_id: String,
    /// Subject line, when the publisher set one.
    pub subject: Option<String>,
    /// Identifier of the topic the notification was published to.
    pub topic_id: String,
    /// Delivery timestamp as sent by the transport (RFC 3339).
    pub timestamp: String,
    /// The notification message.
    pub message: Payload,
}

impl Envelope {
    /// Creates an envelope with the given message and empty metadata.
    #[must_use]
    pub fn new(message: Payload) -> Self {
        Self {
            message,
            ..Self::default()
        }
    }

    /// Sets the subscription identifier.
    #[must_use]
    pub fn with_subscription_id(mut self, id: impl Into<String>) -> Self {
        self.subscription_id = id.into();
        self
    }

    /// Sets the subject line.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the topic identifier.
    #[must_use]
    pub fn with_topic_id(mut self, id: impl Into<String>) -> Self {
        self.topic_id = id.into();
        self
    }

    /// Sets the delivery timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Returns the subject, or an empty string when none was sent.
    #[must_use]
    pub fn subject_or_empty(&self) -> &str {
        self.subject.as_deref().unwrap_or_default()
    }

    /// Returns the delivery time in seconds since the Unix epoch, with
    /// millisecond precision. `None` if the timestamp does not parse.
    #[must_use]
    pub fn epoch_seconds(&self) -> Option<f64> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|ts| ts.timestamp_millis() as f64 / 1000.0)
    }
}

/// Parses an event document into its envelopes.
///
/// # Errors
///
/// Returns [`FormatError::InvalidEvent`] if the text is not a JSON object of a
/// recognised shape, and [`FormatError::EmptyEvent`] if a `Records` array is
/// empty.
pub fn parse_event(text: &str) -> Result<Vec<Envelope>> {
    let document: Value = serde_json::from_str(text)?;
    parse_event_value(document)
}

/// Same as [`parse_event`] for an already-decoded document.
///
/// # Errors
///
/// See [`parse_event`].
pub fn parse_event_value(document: Value) -> Result<Vec<Envelope>> {
    let Value::Object(mut object) = document else {
        return Err(FormatError::InvalidEvent {
            reason: "event document must be a JSON object".to_string(),
        });
    };

    match object.remove("Records") {
        Some(records) => {
            let envelopes: Vec<Envelope> = serde_json::from_value(records)?;
            if envelopes.is_empty() {
                return Err(FormatError::EmptyEvent);
            }
            Ok(envelopes)
        }
        None => Ok(vec![serde_json::from_value(Value::Object(object))?]),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnvelopeRepr {
    Record(SnsRecord),
    Flat(FlatEnvelope),
}

// Metadata fields are read as loose values; a null or oddly typed field is
// rendered to text rather than rejecting the notification.
#[derive(Deserialize)]
struct SnsRecord {
    #[serde(rename = "EventSubscriptionArn", default)]
    event_subscription_arn: Option<Value>,
    #[serde(rename = "Sns")]
    sns: SnsNotification,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SnsNotification {
    #[serde(default)]
    subject: Option<Value>,
    #[serde(default)]
    topic_arn: Option<Value>,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    message: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlatEnvelope {
    #[serde(default)]
    subscription_id: Option<Value>,
    #[serde(default)]
    subject: Option<Value>,
    #[serde(default)]
    topic_id: Option<Value>,
    #[serde(default)]
    timestamp: Option<Value>,
    message: Value,
}

fn metadata(value: Option<Value>) -> String {
    render::text(value.as_ref())
}

fn subject(value: Option<Value>) -> Option<String> {
    value
        .filter(|v| !v.is_null())
        .map(|v| render::text(Some(&v)))
}

impl From<EnvelopeRepr> for Envelope {
    fn from(repr: EnvelopeRepr) -> Self {
        match repr {
            EnvelopeRepr::Record(record) => Self {
                subscription_id: metadata(record.event_subscription_arn),
                subject: subject(record.sns.subject),
                topic_id: metadata(record.sns.topic_arn),
                timestamp: metadata(record.sns.timestamp),
                message: Payload::from_value(record.sns.message),
            },
            EnvelopeRepr::Flat(flat) => Self {
                subscription_id: metadata(flat.subscription_id),
                subject: subject(flat.subject),
                topic_id: metadata(flat.topic_id),
                timestamp: metadata(flat.timestamp),
                message: Payload::from_value(flat.message),
            },
        }
    }
}
