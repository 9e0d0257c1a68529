use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Opaque job identifier assigned by the backend when a job is enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Server-defined status tag for a background job.
///
/// The backend owns this vocabulary; only `completed` and `failed` are
/// terminal, everything else keeps the poll loop alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskState {
    Pending,
    InProgress,
    Running,
    Completed,
    Failed,
    Other(String),
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskState::Pending => "pending",
            TaskState::InProgress => "in_progress",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Other(tag) => tag,
        }
    }
}

impl From<String> for TaskState {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "pending" => TaskState::Pending,
            "in_progress" => TaskState::InProgress,
            "running" => TaskState::Running,
            "completed" => TaskState::Completed,
            "failed" => TaskState::Failed,
            _ => TaskState::Other(tag),
        }
    }
}

impl From<TaskState> for String {
    fn from(state: TaskState) -> Self {
        state.as_str().to_string()
    }
}

/// Point-in-time snapshot of a polled job. The monitor performs no diffing
/// against the previous snapshot; callers may if they wish.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaskSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    pub status: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

/// Acknowledgement returned when a job is accepted for execution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskAccepted {
    pub task_id: TaskId,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Value>,
}

/// Payload for creating or updating a project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jira_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueCount {
    pub count: u64,
}

/// Generated report for a project; `report_html` is raw backend output and
/// must pass through `sanitize::sanitize_report_html` before rendering.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Report {
    pub report_html: String,
}

/// Body of `POST /api/issues/summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRequest {
    pub variables: serde_json::Map<String, Value>,
    pub prompt: String,
}

impl SummaryRequest {
    /// The common single-variable form: summarize `text` with `prompt`.
    pub fn for_text(text: impl Into<String>, prompt: impl Into<String>) -> Self {
        let mut variables = serde_json::Map::new();
        variables.insert("text".to_string(), Value::String(text.into()));
        Self {
            variables,
            prompt: prompt.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueComment {
    pub author: String,
    pub body: String,
    pub created: String,
}

/// Feature-request ticket details as returned by the lookup endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeatureIssue {
    #[serde(default)]
    pub cid: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub components: Vec<String>,
    pub summary: String,
    pub description: String,
    /// Description pre-flattened for prompt interpolation.
    #[serde(default)]
    pub description_llm: Option<String>,
    #[serde(default)]
    pub comments: Vec<IssueComment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeatureLookup {
    pub data: FeatureIssue,
}

/// One bucket of the dashboard aggregation (`{_id, count}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatBucket {
    #[serde(rename = "_id")]
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub issues: Vec<StatBucket>,
    pub processed: Vec<StatBucket>,
}

/// Acknowledgement for a config save.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaveAck {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Everything that can go wrong talking to the backend. All variants degrade
/// to a transient operator notice; none is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("request timed out")]
    Timeout,
    #[error("http status {0}")]
    Http(u16),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("network error: {0}")]
    Network(String),
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    if err.is_decode() {
        return ApiError::Decode(err.to_string());
    }
    if let Some(status) = err.status() {
        return ApiError::Http(status.as_u16());
    }
    ApiError::Network(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::TaskState;

    #[test]
    fn status_tags_round_trip_through_strings() {
        let known = TaskState::from("completed".to_string());
        assert_eq!(known, TaskState::Completed);
        assert_eq!(String::from(known), "completed");

        let unknown = TaskState::from("retrying".to_string());
        assert_eq!(unknown, TaskState::Other("retrying".to_string()));
        assert_eq!(String::from(unknown), "retrying");
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::InProgress.is_terminal());
        assert!(!TaskState::Running.is_terminal());
        assert!(!TaskState::Other("queued".to_string()).is_terminal());
    }
}
