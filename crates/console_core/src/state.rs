use crate::view_model::{
    AppViewModel, ConfigView, DashboardView, FeatureView, JobLaneView, ProcessingView,
};

pub type ProjectId = String;

/// Core-local mirror of the backend task id; the host maps engine ids here.
pub type TaskId = String;

/// Stages the operator can run through the processing form.
pub const STAGE_CHOICES: [u32; 2] = [1, 2];

/// Default prompt seeded into the feature-request summary form.
pub const DEFAULT_SUMMARY_PROMPT: &str = "You are an expert at analyzing customer issues. \
Identify the key problems described in the text below.\n {text}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobFamily {
    Extraction,
    StageProcessing,
    Summarization,
}

impl JobFamily {
    pub fn label(self) -> &'static str {
        match self {
            JobFamily::Extraction => "extraction",
            JobFamily::StageProcessing => "stage processing",
            JobFamily::Summarization => "summarization",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient operator notification; every failure class ends up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub text: String,
}

/// Latest observed task status, pre-rendered for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    /// Raw server tag, e.g. `pending` or `in_progress`.
    pub label: String,
    /// The snapshot's `result` payload folded to text, when present.
    pub detail: Option<String>,
}

/// How a monitor activation ended, from the view's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEnd {
    Completed,
    Failed,
    Cancelled,
    PollError,
}

/// Submission/polling slot for one job family.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TaskSlot {
    #[default]
    Idle,
    /// Submission sent, task id not yet returned.
    Submitting,
    Polling {
        task_id: TaskId,
    },
}

/// One job family's handle plus what the operator sees about it.
///
/// The slot machine is `Idle -> Submitting -> Polling`; terminal ends fold
/// back to `Idle` with the outcome retained for display. A fresh submission
/// clears the previous run's status and outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobLane {
    slot: TaskSlot,
    last_status: Option<StatusView>,
    outcome: Option<TaskEnd>,
}

impl JobLane {
    pub fn slot(&self) -> &TaskSlot {
        &self.slot
    }

    pub fn last_status(&self) -> Option<&StatusView> {
        self.last_status.as_ref()
    }

    pub fn outcome(&self) -> Option<TaskEnd> {
        self.outcome
    }

    pub fn is_busy(&self) -> bool {
        !matches!(self.slot, TaskSlot::Idle)
    }

    pub(crate) fn begin_submission(&mut self) {
        self.slot = TaskSlot::Submitting;
        self.last_status = None;
        self.outcome = None;
    }

    /// Adopt a returned task id; yields the id of a loop that must be
    /// cancelled first if one was still active.
    pub(crate) fn adopt(&mut self, task_id: TaskId) -> Option<TaskId> {
        let previous = match std::mem::take(&mut self.slot) {
            TaskSlot::Polling { task_id } => Some(task_id),
            _ => None,
        };
        self.slot = TaskSlot::Polling { task_id };
        previous
    }

    pub(crate) fn observe(&mut self, status: StatusView) {
        self.last_status = Some(status);
    }

    pub(crate) fn settle(&mut self, end: TaskEnd) {
        self.slot = TaskSlot::Idle;
        self.outcome = Some(end);
    }

    pub(crate) fn abort_submission(&mut self) {
        self.slot = TaskSlot::Idle;
    }

    fn view(&self) -> JobLaneView {
        JobLaneView {
            busy: self.is_busy(),
            status_text: self
                .last_status
                .as_ref()
                .map(|status| format!("Task Status: {}", status.label)),
            outcome: self.outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectChoice {
    pub id: ProjectId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    pub author: String,
    pub body: String,
    pub created: String,
}

/// Feature-request ticket details as shown in the lookup panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureIssueView {
    pub summary: String,
    pub description: String,
    /// Description pre-flattened for prompt interpolation.
    pub description_llm: Option<String>,
    pub customer_ids: Option<String>,
    pub created_date: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub components: Vec<String>,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRow {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigPhase {
    #[default]
    NotLoaded,
    Loading,
    Editing,
    Saving,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ProcessingState {
    pub(crate) projects: Vec<ProjectChoice>,
    pub(crate) projects_loading: bool,
    pub(crate) selected_project: Option<ProjectId>,
    pub(crate) issue_count: Option<u64>,
    pub(crate) selected_stage: Option<u32>,
    pub(crate) extraction: JobLane,
    pub(crate) staging: JobLane,
    pub(crate) report_html: Option<String>,
    pub(crate) report_loading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FeatureState {
    pub(crate) jira_key: String,
    pub(crate) issue: Option<FeatureIssueView>,
    pub(crate) issue_loading: bool,
    pub(crate) prompt: String,
    pub(crate) summary: JobLane,
    pub(crate) summary_markdown: Option<String>,
}

impl Default for FeatureState {
    fn default() -> Self {
        Self {
            jira_key: String::new(),
            issue: None,
            issue_loading: false,
            prompt: DEFAULT_SUMMARY_PROMPT.to_string(),
            summary: JobLane::default(),
            summary_markdown: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ConfigState {
    pub(crate) phase: ConfigPhase,
    pub(crate) issues: Vec<String>,
    pub(crate) form_dirty: bool,
    pub(crate) last_save_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct DashboardState {
    pub(crate) loading: bool,
    pub(crate) issue_stats: Vec<StatRow>,
    pub(crate) processed_stats: Vec<StatRow>,
}

/// Whole-console state: one sub-state per view plus the notice queue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) processing: ProcessingState,
    pub(crate) feature: FeatureState,
    pub(crate) config: ConfigState,
    pub(crate) dashboard: DashboardState,
    pub(crate) notices: Vec<Notice>,
    next_notice_id: u64,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let processing = &self.processing;
        let feature = &self.feature;
        AppViewModel {
            processing: ProcessingView {
                project_choices: processing.projects.clone(),
                projects_loading: processing.projects_loading,
                selected_project: processing.selected_project.clone(),
                issue_count: processing.issue_count,
                stage_choices: STAGE_CHOICES.to_vec(),
                selected_stage: processing.selected_stage,
                extraction: processing.extraction.view(),
                staging: processing.staging.view(),
                can_start_extraction: processing.selected_project.is_some()
                    && !processing.extraction.is_busy(),
                can_start_stage: processing.selected_project.is_some()
                    && processing.selected_stage.is_some()
                    && !processing.staging.is_busy(),
                report_html: processing.report_html.clone(),
                report_loading: processing.report_loading,
                can_fetch_report: processing.selected_project.is_some()
                    && !processing.report_loading,
            },
            feature: FeatureView {
                jira_key: feature.jira_key.clone(),
                issue: feature.issue.clone(),
                issue_loading: feature.issue_loading,
                prompt: feature.prompt.clone(),
                summary: feature.summary.view(),
                summary_markdown: feature.summary_markdown.clone(),
                can_lookup: !feature.jira_key.trim().is_empty() && !feature.issue_loading,
                can_summarize: feature
                    .issue
                    .as_ref()
                    .is_some_and(|issue| issue.description_llm.is_some())
                    && !feature.summary.is_busy(),
            },
            config: ConfigView {
                phase: self.config.phase,
                issues: self.config.issues.clone(),
                form_dirty: self.config.form_dirty,
                last_save_message: self.config.last_save_message.clone(),
                can_save: self.config.phase == ConfigPhase::Editing,
            },
            dashboard: DashboardView {
                loading: self.dashboard.loading,
                issue_stats: self.dashboard.issue_stats.clone(),
                processed_stats: self.dashboard.processed_stats.clone(),
            },
            notices: self.notices.clone(),
            dirty: self.dirty,
        }
    }

    /// Lane for a job family; summarization lives on the feature view.
    pub(crate) fn lane_mut(&mut self, family: JobFamily) -> &mut JobLane {
        match family {
            JobFamily::Extraction => &mut self.processing.extraction,
            JobFamily::StageProcessing => &mut self.processing.staging,
            JobFamily::Summarization => &mut self.feature.summary,
        }
    }

    pub fn lane(&self, family: JobFamily) -> &JobLane {
        match family {
            JobFamily::Extraction => &self.processing.extraction,
            JobFamily::StageProcessing => &self.processing.staging,
            JobFamily::Summarization => &self.feature.summary,
        }
    }

    pub(crate) fn push_notice(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.next_notice_id += 1;
        self.notices.push(Notice {
            id: self.next_notice_id,
            level,
            text: text.into(),
        });
        self.mark_dirty();
    }

    pub(crate) fn dismiss_notice(&mut self, id: u64) {
        let before = self.notices.len();
        self.notices.retain(|notice| notice.id != id);
        if self.notices.len() != before {
            self.mark_dirty();
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether anything visible changed since the last call, and
    /// resets the flag. The host uses this to coalesce renders.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
