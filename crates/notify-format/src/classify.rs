//! Event classification.
//!
//! Classification walks an ordered rule table and stops at the first rule
//! whose predicate holds. Raw (non-object) payloads never reach the table;
//! they always go to the catch-all formatter.
//!
//! | order | rule                       | category       |
//! |-------|----------------------------|----------------|
//! | 1     | `source` is `aws.ecs`      | task state     |
//! | 2     | `source` is `aws.events`   | scheduled rule |
//! | 3     | `source` is `aws.cloudwatch` | alarm        |
//! | 4     | payload has `AlarmName`    | alarm          |
//! | 5     | metadata mentions `CloudWatchNotifications` | alarm |
//! | 6     | metadata mentions `ecs`    | task state     |
//!
//! "Metadata" is the subscription identifier, the subject and the topic
//! identifier. Keyword matching is a case-sensitive substring test.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::envelope::{Envelope, Payload};
use crate::formatters::{
    AlarmEvent, ScheduledRuleEvent, TaskStateEvent, UnclassifiedEvent, alarm, catch_all,
    scheduled, task,
};
use crate::message::ChatMessage;

/// Keyword marking alarm subscriptions and topics.
pub const ALARM_KEYWORD: &str = "CloudWatchNotifications";

/// Keyword marking container service subscriptions and topics.
pub const TASK_KEYWORD: &str = "ecs";

/// Rule name reported for raw payloads.
pub const RAW_PAYLOAD_RULE: &str = "raw-payload";

/// Rule name reported when nothing matched.
pub const FALLBACK_RULE: &str = "fallback";

/// The kind of event an envelope carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Metric alarm state change.
    Alarm,
    /// Container task state change.
    TaskState,
    /// Scheduled rule trigger.
    ScheduledRule,
    /// Anything else.
    Unclassified,
}

impl Category {
    /// Returns the category as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Alarm => "alarm",
            Self::TaskState => "task-state",
            Self::ScheduledRule => "scheduled-rule",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classification rule: a named predicate and the category it selects.
#[derive(Clone, Copy)]
pub struct Rule {
    /// Name reported in logs and by [`decide`].
    pub name: &'static str,
    /// Category selected when the predicate holds.
    pub category: Category,
    matches: fn(&Envelope, &Map<String, Value>) -> bool,
}

impl Rule {
    /// Evaluates the predicate.
    #[must_use]
    pub fn matches(&self, envelope: &Envelope, payload: &Map<String, Value>) -> bool {
        (self.matches)(envelope, payload)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

/// The rule table, in evaluation order.
pub const RULES: &[Rule] = &[
    Rule {
        name: "source:aws.ecs",
        category: Category::TaskState,
        matches: source_is_ecs,
    },
    Rule {
        name: "source:aws.events",
        category: Category::ScheduledRule,
        matches: source_is_events,
    },
    Rule {
        name: "source:aws.cloudwatch",
        category: Category::Alarm,
        matches: source_is_cloudwatch,
    },
    Rule {
        name: "payload:AlarmName",
        category: Category::Alarm,
        matches: has_alarm_name,
    },
    Rule {
        name: "keyword:CloudWatchNotifications",
        category: Category::Alarm,
        matches: mentions_alarm_keyword,
    },
    Rule {
        name: "keyword:ecs",
        category: Category::TaskState,
        matches: mentions_task_keyword,
    },
];

fn source(payload: &Map<String, Value>) -> Option<&str> {
    payload.get("source").and_then(Value::as_str)
}

fn source_is_ecs(_: &Envelope, payload: &Map<String, Value>) -> bool {
    source(payload) == Some("aws.ecs")
}

fn source_is_events(_: &Envelope, payload: &Map<String, Value>) -> bool {
    source(payload) == Some("aws.events")
}

fn source_is_cloudwatch(_: &Envelope, payload: &Map<String, Value>) -> bool {
    source(payload) == Some("aws.cloudwatch")
}

fn has_alarm_name(_: &Envelope, payload: &Map<String, Value>) -> bool {
    payload.contains_key("AlarmName")
}

fn metadata_mentions(envelope: &Envelope, keyword: &str) -> bool {
    envelope.subscription_id.contains(keyword)
        || envelope.subject_or_empty().contains(keyword)
        || envelope.topic_id.contains(keyword)
}

fn mentions_alarm_keyword(envelope: &Envelope, _: &Map<String, Value>) -> bool {
    metadata_mentions(envelope, ALARM_KEYWORD)
}

fn mentions_task_keyword(envelope: &Envelope, _: &Map<String, Value>) -> bool {
    metadata_mentions(envelope, TASK_KEYWORD)
}

/// The outcome of classification: a category and the rule that chose it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Selected category.
    pub category: Category,
    /// Name of the deciding rule, [`RAW_PAYLOAD_RULE`] or [`FALLBACK_RULE`].
    pub rule: &'static str,
}

/// Picks the category for an envelope without extracting any fields.
#[must_use]
pub fn decide(envelope: &Envelope) -> Decision {
    let Payload::Structured(payload) = &envelope.message else {
        return Decision {
            category: Category::Unclassified,
            rule: RAW_PAYLOAD_RULE,
        };
    };

    RULES
        .iter()
        .find(|rule| rule.matches(envelope, payload))
        .map_or(
            Decision {
                category: Category::Unclassified,
                rule: FALLBACK_RULE,
            },
            |rule| Decision {
                category: rule.category,
                rule: rule.name,
            },
        )
}

/// An envelope interpreted as one of the known event kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedEvent {
    /// Metric alarm state change.
    Alarm(AlarmEvent),
    /// Container task state change.
    TaskState(TaskStateEvent),
    /// Scheduled rule trigger.
    ScheduledRule(ScheduledRuleEvent),
    /// Anything else.
    Unclassified(UnclassifiedEvent),
}

impl ClassifiedEvent {
    /// Returns the category of this event.
    #[must_use]
    pub const fn category(&self) -> Category {
        match self {
            Self::Alarm(_) => Category::Alarm,
            Self::TaskState(_) => Category::TaskState,
            Self::ScheduledRule(_) => Category::ScheduledRule,
            Self::Unclassified(_) => Category::Unclassified,
        }
    }

    /// Renders the event with its formatter.
    #[must_use]
    pub fn format(&self, ts: Option<f64>) -> ChatMessage {
        match self {
            Self::Alarm(event) => alarm::format(event, ts),
            Self::TaskState(event) => task::format(event, ts),
            Self::ScheduledRule(event) => scheduled::format(event, ts),
            Self::Unclassified(event) => catch_all::format(event, ts),
        }
    }
}

/// Classifies an envelope and extracts the fields its formatter needs.
#[must_use]
pub fn classify(envelope: &Envelope) -> ClassifiedEvent {
    let decision = decide(envelope);
    debug!(
        category = %decision.category,
        rule = decision.rule,
        "classified notification"
    );

    match (&envelope.message, decision.category) {
        (Payload::Structured(payload), Category::Alarm) => {
            ClassifiedEvent::Alarm(AlarmEvent::from_envelope(envelope, payload))
        }
        (Payload::Structured(payload), Category::TaskState) => {
            ClassifiedEvent::TaskState(TaskStateEvent::from_payload(payload))
        }
        (Payload::Structured(payload), Category::ScheduledRule) => {
            ClassifiedEvent::ScheduledRule(ScheduledRuleEvent::from_payload(payload))
        }
        _ => ClassifiedEvent::Unclassified(UnclassifiedEvent {
            subject: envelope.subject_or_empty().to_string(),
            payload: envelope.message.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn structured(value: Value) -> Envelope {
        Envelope::new(Payload::from_value(value))
    }

    mod decide_tests {
        use super::*;
        use test_case::test_case;

        #[test_case(json!({"source": "aws.ecs"}), Category::TaskState ; "ecs source")]
        #[test_case(json!({"source": "aws.events"}), Category::ScheduledRule ; "events source")]
        #[test_case(json!({"source": "aws.cloudwatch"}), Category::Alarm ; "cloudwatch source")]
        #[test_case(json!({"AlarmName": "x"}), Category::Alarm ; "alarm structure")]
        #[test_case(json!({"source": "aws.s3"}), Category::Unclassified ; "unknown source")]
        #[test_case(json!({}), Category::Unclassified ; "empty object")]
        fn payload_rules(payload: Value, expected: Category) {
            assert_eq!(decide(&structured(payload)).category, expected);
        }

        #[test]
        fn source_wins_over_alarm_structure() {
            let decision = decide(&structured(json!({
                "source": "aws.ecs",
                "AlarmName": "confusing"
            })));
            assert_eq!(decision.category, Category::TaskState);
            assert_eq!(decision.rule, "source:aws.ecs");
        }

        #[test]
        fn alarm_keyword_in_subscription() {
            let envelope = structured(json!({"foo": "bar"})).with_subscription_id(
                "arn:aws:sns:us-east-1:123456789012:CloudWatchNotifications:abc",
            );
            assert_eq!(decide(&envelope).category, Category::Alarm);
        }

        #[test]
        fn alarm_keyword_in_subject() {
            let envelope = structured(json!({"foo": "bar"}))
                .with_subject("CloudWatchNotifications: something");
            assert_eq!(decide(&envelope).rule, "keyword:CloudWatchNotifications");
        }

        #[test]
        fn task_keyword_in_topic() {
            let envelope = structured(json!({"foo": "bar"}))
                .with_topic_id("arn:aws:sns:us-east-1:123456789012:ecs-events");
            assert_eq!(decide(&envelope).category, Category::TaskState);
        }

        #[test]
        fn alarm_keyword_checked_before_task_keyword() {
            let envelope = structured(json!({}))
                .with_subscription_id("ecs-CloudWatchNotifications");
            assert_eq!(decide(&envelope).category, Category::Alarm);
        }

        #[test]
        fn keyword_match_is_case_sensitive() {
            let envelope = structured(json!({})).with_topic_id("ECS-EVENTS");
            assert_eq!(decide(&envelope).category, Category::Unclassified);
        }

        #[test]
        fn raw_payload_skips_rules() {
            let envelope = Envelope::new(Payload::Raw("hello".to_string()))
                .with_subscription_id("CloudWatchNotifications")
                .with_topic_id("ecs");
            let decision = decide(&envelope);
            assert_eq!(decision.category, Category::Unclassified);
            assert_eq!(decision.rule, RAW_PAYLOAD_RULE);
        }

        #[test]
        fn fallback_rule_name() {
            assert_eq!(decide(&structured(json!({"a": 1}))).rule, FALLBACK_RULE);
        }

        #[test]
        fn rule_names_are_unique() {
            let mut names: Vec<&str> = RULES.iter().map(|r| r.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), RULES.len());
        }
    }

    mod classify_tests {
        use super::*;

        #[test]
        fn classify_extracts_alarm() {
            let event = classify(&structured(json!({
                "AlarmName": "cpu-high",
                "NewStateValue": "ALARM"
            })));
            match event {
                ClassifiedEvent::Alarm(alarm) => {
                    assert_eq!(alarm.alarm_name, "cpu-high");
                    assert_eq!(alarm.new_state, "ALARM");
                }
                other => panic!("expected alarm, got {other:?}"),
            }
        }

        #[test]
        fn classify_keyword_task_with_sparse_payload() {
            let envelope = structured(json!({"hello": "world"})).with_topic_id("ecs-topic");
            let event = classify(&envelope);
            assert_eq!(event.category(), Category::TaskState);
            let message = event.format(None);
            assert_eq!(message.attachment().unwrap().fields.len(), 6);
        }

        #[test]
        fn classify_raw_keeps_subject() {
            let envelope =
                Envelope::new(Payload::Raw("text".to_string())).with_subject("Plain notice");
            match classify(&envelope) {
                ClassifiedEvent::Unclassified(event) => {
                    assert_eq!(event.subject, "Plain notice");
                    assert_eq!(event.payload, Payload::Raw("text".to_string()));
                }
                other => panic!("expected unclassified, got {other:?}"),
            }
        }

        #[test]
        fn decision_serializes() {
            let envelope = Envelope::new(Payload::from_value(json!({"AlarmName": "cpu-high"})));
            assert_eq!(
                serde_json::to_value(decide(&envelope)).unwrap(),
                json!({"category": "alarm", "rule": "payload:AlarmName"})
            );
        }

        #[test]
        fn category_display() {
            assert_eq!(Category::ScheduledRule.to_string(), "scheduled-rule");
            assert_eq!(
                serde_json::to_value(Category::TaskState).unwrap(),
                json!("task-state")
            );
        }
    }
}
