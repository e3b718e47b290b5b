//! Fallback rendering for anything the classifier does not recognise.

use crate::envelope::Payload;
use crate::message::{Attachment, ChatMessage, Color, Field};
use crate::render;

/// An envelope no specific formatter claimed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnclassifiedEvent {
    /// Envelope subject, empty when none was sent.
    pub subject: String,
    /// The untouched payload.
    pub payload: Payload,
}

impl UnclassifiedEvent {
    /// Color from a `NewStateValue` field, when the payload has one.
    #[must_use]
    pub fn color(&self) -> Color {
        self.payload
            .get("NewStateValue")
            .map_or(Color::Warning, |state| {
                Color::from_alarm_state(&render::text(Some(state)))
            })
    }

    /// Lists every top-level key and value, one per line.
    ///
    /// Each line is prefixed with a newline. Raw payloads are returned as-is.
    #[must_use]
    pub fn description(&self) -> String {
        match &self.payload {
            Payload::Structured(map) => map
                .iter()
                .map(|(key, value)| format!("\n{key}: {}", render::listing(value)))
                .collect(),
            Payload::Raw(text) => text.clone(),
        }
    }
}

/// Renders an unclassified event.
#[must_use]
pub fn format(event: &UnclassifiedEvent, ts: Option<f64>) -> ChatMessage {
    let attachment = Attachment::new(event.color(), ts)
        .field(Field::long("Message", &event.subject))
        .field(Field::long("Description", event.description()));

    ChatMessage::new(&event.subject, attachment)
}
