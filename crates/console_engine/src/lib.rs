//! Console engine: typed backend client, task-polling monitor, and the IO
//! thread the operator shell embeds.
mod client;
mod config;
mod endpoints;
mod engine;
mod monitor;
mod sanitize;
mod types;

pub use client::{ApiClient, ApiSettings, StatusSource, UpdateOutcome};
pub use config::{
    ClusteringSection, ConfigIssue, ConsoleConfig, EmbeddingsSection, IssueExtractorSection,
    LlmSection, MongoDbSection, PathsSection, PromptsSection, ReportsSection, VectorStoreSection,
};
pub use endpoints::{JobFamily, StatusEndpoint, TaskHandle};
pub use engine::{EngineConfig, EngineEvent, EngineHandle, LoadedConfig, PollProfile};
pub use monitor::{
    poll_until_terminal, MonitorGuard, PollOutcome, PollSettings, StatusSink, TaskMonitor,
};
pub use sanitize::{sanitize_report_html, ReportSanitizer, TreeFilterSanitizer};
pub use types::{
    ApiError, DashboardStats, FeatureIssue, FeatureLookup, IssueComment, IssueCount, Project,
    ProjectDraft, Report, SaveAck, StatBucket, SummaryRequest, TaskAccepted, TaskId, TaskSnapshot,
    TaskState,
};
