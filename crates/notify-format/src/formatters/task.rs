//! Container task state changes.

use serde_json::{Map, Value};

use crate::message::{Attachment, ChatMessage, Color, Field};
use crate::render;

/// Fields extracted from a task state change event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStateEvent {
    /// Event type line (`detail-type`).
    pub detail_type: String,
    /// Region of the cluster.
    pub region: String,
    /// Cluster ARN.
    pub cluster_arn: String,
    /// Task group, e.g. `service:example-service`.
    pub group: String,
    /// Task definition ARN.
    pub task_definition_arn: String,
    /// Last reported status.
    pub status: String,
    /// Who started the task.
    pub started_by: String,
}

impl TaskStateEvent {
    /// Extracts the task fields from an event payload.
    #[must_use]
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        let empty = Map::new();
        let detail = render::object(payload, "detail").unwrap_or(&empty);

        Self {
            detail_type: render::field(payload, "detail-type"),
            region: render::field(payload, "region"),
            cluster_arn: render::field(detail, "clusterArn"),
            group: render::field(detail, "group"),
            task_definition_arn: render::field(detail, "taskDefinitionArn"),
            status: render::field(detail, "lastStatus"),
            started_by: render::field(detail, "startedBy"),
        }
    }

    /// Cluster name: the last path segment of the cluster ARN.
    #[must_use]
    pub fn cluster_name(&self) -> &str {
        render::last_segment(&self.cluster_arn, '/')
    }

    /// Service name: the last colon segment of the group.
    #[must_use]
    pub fn service_name(&self) -> &str {
        render::last_segment(&self.group, ':')
    }

    /// Task definition: the last path segment of its ARN.
    #[must_use]
    pub fn task_definition(&self) -> &str {
        render::last_segment(&self.task_definition_arn, '/')
    }

    /// Deep link to the service's task list.
    #[must_use]
    pub fn link(&self) -> String {
        format!(
            "https://{region}.console.aws.amazon.com/ecs/home?region={region}#/clusters/{}/services/{}/tasks",
            self.cluster_name(),
            self.service_name(),
            region = self.region,
        )
    }
}

/// Renders a task state change.
#[must_use]
pub fn format(event: &TaskStateEvent, ts: Option<f64>) -> ChatMessage {
    let attachment = Attachment::new(Color::from_task_status(&event.status), ts)
        .field(Field::short("Cluster", event.cluster_name()))
        .field(Field::short("Service", event.service_name()))
        .field(Field::short("Task Definition", event.task_definition()))
        .field(Field::short("Status", &event.status))
        .field(Field::short("Started By", &event.started_by))
        .field(Field::long("Link to Task", event.link()));

    ChatMessage::new(&event.detail_type, attachment)
}
