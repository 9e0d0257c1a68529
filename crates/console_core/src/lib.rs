//! Console core: pure state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::{Msg, Op};
pub use state::{
    AppState, CommentView, ConfigPhase, FeatureIssueView, JobFamily, JobLane, Notice, NoticeLevel,
    ProjectChoice, ProjectId, StatRow, StatusView, TaskEnd, TaskId, TaskSlot,
    DEFAULT_SUMMARY_PROMPT, STAGE_CHOICES,
};
pub use update::update;
pub use view_model::{
    AppViewModel, ConfigView, DashboardView, FeatureView, JobLaneView, ProcessingView,
};
