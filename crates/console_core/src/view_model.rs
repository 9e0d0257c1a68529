use crate::state::{
    ConfigPhase, FeatureIssueView, Notice, ProjectChoice, ProjectId, StatRow, TaskEnd,
};

/// Renderer-facing snapshot of one job lane.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobLaneView {
    /// A submission or poll loop is in flight; the start button is disabled.
    pub busy: bool,
    /// e.g. `Task Status: in_progress`.
    pub status_text: Option<String>,
    pub outcome: Option<TaskEnd>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessingView {
    pub project_choices: Vec<ProjectChoice>,
    pub projects_loading: bool,
    pub selected_project: Option<ProjectId>,
    pub issue_count: Option<u64>,
    pub stage_choices: Vec<u32>,
    pub selected_stage: Option<u32>,
    pub extraction: JobLaneView,
    pub staging: JobLaneView,
    pub can_start_extraction: bool,
    pub can_start_stage: bool,
    /// Sanitized report markup, ready for the renderer.
    pub report_html: Option<String>,
    pub report_loading: bool,
    pub can_fetch_report: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureView {
    pub jira_key: String,
    pub issue: Option<FeatureIssueView>,
    pub issue_loading: bool,
    pub prompt: String,
    pub summary: JobLaneView,
    pub summary_markdown: Option<String>,
    pub can_lookup: bool,
    pub can_summarize: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigView {
    pub phase: ConfigPhase,
    pub issues: Vec<String>,
    pub form_dirty: bool,
    pub last_save_message: Option<String>,
    pub can_save: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardView {
    pub loading: bool,
    pub issue_stats: Vec<StatRow>,
    pub processed_stats: Vec<StatRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub processing: ProcessingView,
    pub feature: FeatureView,
    pub config: ConfigView,
    pub dashboard: DashboardView,
    pub notices: Vec<Notice>,
    pub dirty: bool,
}
