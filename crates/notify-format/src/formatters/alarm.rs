//! Metric alarm state changes.

use serde_json::{Map, Value};

use crate::envelope::Envelope;
use crate::message::{Attachment, ChatMessage, Color, Field};
use crate::render;

/// Summary line used for every alarm message.
pub const ALARM_SUMMARY: &str = "AWS CloudWatch Notification";

/// The condition that moved an alarm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trigger {
    /// Statistic applied to the metric (`Average`, `Sum`, ...).
    pub statistic: String,
    /// Metric name.
    pub metric_name: String,
    /// Comparison operator (`GreaterThanThreshold`, ...).
    pub comparison_operator: String,
    /// Threshold value, as rendered text.
    pub threshold: String,
    /// Number of evaluation periods.
    pub evaluation_periods: String,
    /// Period length in seconds.
    pub period: String,
}

impl Trigger {
    fn from_object(trigger: &Map<String, Value>) -> Self {
        Self {
            statistic: render::field(trigger, "Statistic"),
            metric_name: render::field(trigger, "MetricName"),
            comparison_operator: render::field(trigger, "ComparisonOperator"),
            threshold: render::field(trigger, "Threshold"),
            evaluation_periods: render::field(trigger, "EvaluationPeriods"),
            period: render::field(trigger, "Period"),
        }
    }

    /// Renders the trigger as one sentence.
    #[must_use]
    pub fn sentence(&self) -> String {
        format!(
            "{} {} {} {} for {} period(s) of {} seconds.",
            self.statistic,
            self.metric_name,
            self.comparison_operator,
            self.threshold,
            self.evaluation_periods,
            self.period
        )
    }
}

/// Fields extracted from an alarm notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmEvent {
    /// Alarm name.
    pub alarm_name: String,
    /// Alarm description.
    pub description: String,
    /// Reason for the state change.
    pub reason: String,
    /// The alarm condition.
    pub trigger: Trigger,
    /// State before the change.
    pub old_state: String,
    /// State after the change.
    pub new_state: String,
    /// Region the alarm lives in.
    pub region: String,
}

impl AlarmEvent {
    /// Extracts the alarm fields from an envelope.
    ///
    /// The region comes from the subscription ARN, or from `AlarmArn` when the
    /// subscription identifier is not an ARN.
    #[must_use]
    pub fn from_envelope(envelope: &Envelope, payload: &Map<String, Value>) -> Self {
        let trigger = render::object(payload, "Trigger")
            .map(Trigger::from_object)
            .unwrap_or_default();

        let mut region = render::arn_region(&envelope.subscription_id).to_string();
        if region.is_empty() {
            region = render::arn_region(&render::field(payload, "AlarmArn")).to_string();
        }

        Self {
            alarm_name: render::field(payload, "AlarmName"),
            description: render::field(payload, "AlarmDescription"),
            reason: render::field(payload, "NewStateReason"),
            trigger,
            old_state: render::field(payload, "OldStateValue"),
            new_state: render::field(payload, "NewStateValue"),
            region,
        }
    }

    /// Deep link to the alarm in the console.
    #[must_use]
    pub fn link(&self) -> String {
        format!(
            "https://console.aws.amazon.com/cloudwatch/home?region={}#alarm:alarmFilter=ANY;name={}",
            self.region,
            render::encode_uri_component(&self.alarm_name)
        )
    }
}

/// Renders an alarm notification.
#[must_use]
pub fn format(event: &AlarmEvent, ts: Option<f64>) -> ChatMessage {
    let attachment = Attachment::new(Color::from_alarm_state(&event.new_state), ts)
        .field(Field::short("Alarm Name", &event.alarm_name))
        .field(Field::long("Alarm Description", &event.description))
        .field(Field::long("Alarm Reason", &event.reason))
        .field(Field::long("Trigger", event.trigger.sentence()))
        .field(Field::short("Old State", &event.old_state))
        .field(Field::short("Current State", &event.new_state))
        .field(Field::long("Link to Alarm", event.link()));

    ChatMessage::new(ALARM_SUMMARY, attachment)
}
