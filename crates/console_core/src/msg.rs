use crate::state::{
    FeatureIssueView, JobFamily, ProjectChoice, ProjectId, StatRow, StatusView, TaskEnd, TaskId,
};

/// Which backend request an error came from; the reducer folds every one of
/// them into a notice and resets the matching in-flight flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    LoadProjects,
    LoadIssueCount,
    LoadReport,
    LoadFeature,
    LoadConfig,
    SaveConfig,
    LoadStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    // Processing view.
    /// The processing view became visible; kicks off the project load.
    ProcessingOpened,
    ProjectsLoaded(Vec<ProjectChoice>),
    ProjectSelected(ProjectId),
    IssueCountLoaded { project_id: ProjectId, count: u64 },
    StageSelected(u32),
    /// Operator clicked "Start Extraction".
    ExtractionClicked,
    /// Operator clicked "Start Stage Processing".
    StageClicked,
    ReportClicked,
    /// Sanitized report HTML arrived.
    ReportLoaded { project_id: ProjectId, html: String },

    // Job lifecycle, any family.
    /// The backend accepted a submission and returned a task id.
    JobSubmitted { family: JobFamily, task_id: TaskId },
    /// The submission itself failed; no task exists.
    JobRejected { family: JobFamily, error: String },
    /// The monitor observed a status snapshot (terminal ones included).
    TaskStatusObserved { family: JobFamily, status: StatusView },
    /// The monitor activation for this family ended.
    TaskSettled {
        family: JobFamily,
        end: TaskEnd,
        detail: Option<String>,
    },

    // Feature-request view.
    JiraKeyChanged(String),
    FeatureLookupClicked,
    FeatureLoaded {
        jira_key: String,
        issue: FeatureIssueView,
    },
    SummaryPromptChanged(String),
    SummarizeClicked,

    // Config view.
    ConfigOpened,
    /// Config document loaded host-side; the reducer keeps the lifecycle
    /// and the validation report.
    ConfigLoaded { issues: Vec<String> },
    ConfigEdited,
    ConfigSaveClicked,
    ConfigSaved { message: Option<String> },

    // Dashboard view.
    DashboardOpened,
    StatsLoaded {
        issues: Vec<StatRow>,
        processed: Vec<StatRow>,
    },

    /// Shared failure path for plain requests.
    RequestFailed { op: Op, error: String },
    NoticeDismissed(u64),
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
