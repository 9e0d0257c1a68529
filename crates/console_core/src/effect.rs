use crate::state::{JobFamily, ProjectId, TaskId};

/// IO the host must run in response to an update. The reducer never touches
/// the network itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadProjects,
    LoadIssueCount { project_id: ProjectId },
    SubmitExtraction { project_id: ProjectId },
    SubmitStage { project_id: ProjectId, stage: u32 },
    SubmitSummary { text: String, prompt: String },
    /// Start a status monitor for an adopted task.
    StartPolling { family: JobFamily, task_id: TaskId },
    /// Stop the active monitor for a family; always emitted before a
    /// `StartPolling` that replaces a still-running loop.
    CancelPolling { family: JobFamily },
    LoadReport { project_id: ProjectId },
    LoadFeature { jira_key: String },
    LoadConfig,
    SaveConfig,
    LoadStats,
}
