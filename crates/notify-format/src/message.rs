//! Chat message model.
//!
//! The wire shape is the incoming-webhook attachment format:
//!
//! ```json
//! { "channel": "#ops", "text": "*Subject*",
//!   "attachments": [{ "color": "danger",
//!                     "fields": [{ "title": "...", "value": "...", "short": true }],
//!                     "ts": 1704164645.678 }] }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Attachment color tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// Healthy or recovered.
    Good,
    /// Needs a look; also the default when no severity is known.
    #[default]
    Warning,
    /// Failing.
    Danger,
}

impl Color {
    /// Returns the color tag as sent on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }

    /// Maps an alarm state value to a color.
    ///
    /// `ALARM` is danger, `OK` is good, anything else is a warning.
    #[must_use]
    pub fn from_alarm_state(state: &str) -> Self {
        match state {
            "ALARM" => Self::Danger,
            "OK" => Self::Good,
            _ => Self::Warning,
        }
    }

    /// Maps a container task status to a color.
    ///
    /// `STOPPED` is danger, `RUNNING` is good, `PENDING` and anything else is
    /// a warning.
    #[must_use]
    pub fn from_task_status(status: &str) -> Self {
        match status {
            "STOPPED" => Self::Danger,
            "RUNNING" => Self::Good,
            _ => Self::Warning,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One titled value inside an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field title.
    pub title: String,
    /// Rendered field value.
    pub value: String,
    /// Layout hint: short fields may be placed side by side.
    pub short: bool,
}

impl Field {
    /// Creates a short (side-by-side) field.
    #[must_use]
    pub fn short(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            short: true,
        }
    }

    /// Creates a full-width field.
    #[must_use]
    pub fn long(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            short: false,
        }
    }
}

/// The rendering block of a chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Color tag derived from severity or state.
    pub color: Color,
    /// Ordered fields.
    pub fields: Vec<Field>,
    /// Event time in seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<f64>,
}

impl Attachment {
    /// Creates an attachment with no fields.
    #[must_use]
    pub const fn new(color: Color, ts: Option<f64>) -> Self {
        Self {
            color,
            fields: Vec::new(),
            ts,
        }
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns the value of the first field with the given title.
    #[must_use]
    pub fn value_of(&self, title: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.title == title)
            .map(|f| f.value.as_str())
    }
}

/// A rendered chat message, ready to be posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Destination channel override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Summary line.
    pub text: String,
    /// Rendering blocks. Formatters always produce exactly one.
    pub attachments: Vec<Attachment>,
}

impl ChatMessage {
    /// Creates a message with a bold summary line and one attachment.
    #[must_use]
    pub fn new(summary: &str, attachment: Attachment) -> Self {
        Self {
            channel: None,
            text: format!("*{summary}*"),
            attachments: vec![attachment],
        }
    }

    /// Sets the destination channel.
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Returns the single attachment.
    #[must_use]
    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachments.first()
    }

    /// Returns the color of the attachment.
    #[must_use]
    pub fn color(&self) -> Option<Color> {
        self.attachment().map(|a| a.color)
    }
}
