//! Scheduled rule triggers.
//!
//! Scheduled triggers carry no severity, so the color is always good.

use serde_json::{Map, Value};

use crate::message::{Attachment, ChatMessage, Color, Field};
use crate::render;

/// Fields extracted from a scheduled rule trigger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduledRuleEvent {
    /// Event type line (`detail-type`).
    pub detail_type: String,
    /// Region the rule fired in.
    pub region: String,
    /// ARNs of the resources involved, the rule first.
    pub resources: Vec<String>,
    /// Rule-specific detail. May be empty.
    pub detail: Map<String, Value>,
}

impl ScheduledRuleEvent {
    /// Extracts the trigger fields from an event payload.
    ///
    /// A `detail` that is absent or not an object counts as empty.
    #[must_use]
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        let resources = payload
            .get("resources")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(|item| render::text(Some(item))).collect())
            .unwrap_or_default();

        Self {
            detail_type: render::field(payload, "detail-type"),
            region: render::field(payload, "region"),
            resources,
            detail: render::object(payload, "detail").cloned().unwrap_or_default(),
        }
    }

    /// Rule name: the last path segment of the first resource ARN.
    #[must_use]
    pub fn rule_name(&self) -> &str {
        self.resources
            .first()
            .map_or("", |arn| render::last_segment(arn, '/'))
    }

    /// Deep link to the log group named by `detail.lambdaName`.
    #[must_use]
    pub fn link(&self) -> String {
        format!(
            "https://{region}.console.aws.amazon.com/cloudwatch/home?region={region}#logsV2:log-groups/log-group/{}",
            render::field(&self.detail, "lambdaName"),
            region = self.region,
        )
    }
}

/// Renders a scheduled rule trigger.
///
/// An empty detail yields only the rule name.
#[must_use]
pub fn format(event: &ScheduledRuleEvent, ts: Option<f64>) -> ChatMessage {
    let mut attachment = Attachment::new(Color::Good, ts);

    if event.detail.is_empty() {
        attachment = attachment.field(Field::short("Cloudwatch Rule", event.rule_name()));
    } else {
        attachment = attachment
            .field(Field::long("Event Name", render::field(&event.detail, "name")))
            .field(Field::short("Cloudwatch Rule", event.rule_name()))
            .field(Field::short("Environment", render::field(&event.detail, "env")))
            .field(Field::long("Link", event.link()));
    }

    ChatMessage::new(&event.detail_type, attachment)
}
