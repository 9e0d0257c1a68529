use std::time::Duration;

use crate::TaskId;

/// The three backend job families an operator can launch. Each has its own
/// status endpoint, so the path is data on the handle rather than a constant
/// in the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobFamily {
    Extraction,
    StageProcessing,
    Summarization,
}

impl JobFamily {
    /// Base path queried as `{status_path}/{task_id}`.
    pub fn status_path(self) -> &'static str {
        match self {
            JobFamily::Extraction => "/api/jira/status",
            JobFamily::StageProcessing => "/api/process/status",
            JobFamily::Summarization => "/api/issues/summary/tasks",
        }
    }

    /// Default poll period. Summarization jobs run minutes, not seconds,
    /// so they poll at a slower cadence.
    pub fn default_period(self) -> Duration {
        match self {
            JobFamily::Extraction | JobFamily::StageProcessing => Duration::from_secs(3),
            JobFamily::Summarization => Duration::from_secs(10),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobFamily::Extraction => "extraction",
            JobFamily::StageProcessing => "stage processing",
            JobFamily::Summarization => "summarization",
        }
    }
}

impl std::fmt::Display for JobFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Status endpoint base path, normally derived from a [`JobFamily`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEndpoint {
    path: String,
}

impl StatusEndpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path for one task's status read, `{base}/{task_id}`.
    pub fn status_path_for(&self, task_id: &TaskId) -> String {
        format!("{}/{}", self.path.trim_end_matches('/'), task_id)
    }
}

impl From<JobFamily> for StatusEndpoint {
    fn from(family: JobFamily) -> Self {
        StatusEndpoint::new(family.status_path())
    }
}

/// Caller-owned record pairing a job id with its status endpoint.
///
/// An absent `task_id` means "no active job": a monitor activated on such a
/// handle is inert. The handle is created the instant a submission returns
/// an id and replaced wholesale for a new activation; it never transitions
/// out of a terminal observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    pub task_id: Option<TaskId>,
    pub endpoint: StatusEndpoint,
}

impl TaskHandle {
    pub fn new(task_id: TaskId, endpoint: impl Into<StatusEndpoint>) -> Self {
        Self {
            task_id: Some(task_id),
            endpoint: endpoint.into(),
        }
    }

    /// A handle with no active job.
    pub fn vacant(endpoint: impl Into<StatusEndpoint>) -> Self {
        Self {
            task_id: None,
            endpoint: endpoint.into(),
        }
    }
}
