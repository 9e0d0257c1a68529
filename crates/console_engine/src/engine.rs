use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use tokio_util::sync::CancellationToken;

use console_logging::console_debug;

use crate::client::{ApiClient, ApiSettings};
use crate::config::{ConfigIssue, ConsoleConfig};
use crate::endpoints::{JobFamily, TaskHandle};
use crate::monitor::{poll_until_terminal, PollOutcome, PollSettings, StatusSink};
use crate::sanitize::sanitize_report_html;
use crate::{ApiError, DashboardStats, FeatureIssue, Project, SummaryRequest, TaskId, TaskSnapshot};

/// Poll cadence per job family, overridable as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollProfile {
    pub extraction: PollSettings,
    pub stage: PollSettings,
    pub summarization: PollSettings,
}

impl Default for PollProfile {
    fn default() -> Self {
        Self {
            extraction: PollSettings::for_family(JobFamily::Extraction),
            stage: PollSettings::for_family(JobFamily::StageProcessing),
            summarization: PollSettings::for_family(JobFamily::Summarization),
        }
    }
}

impl PollProfile {
    fn for_family(&self, family: JobFamily) -> &PollSettings {
        match family {
            JobFamily::Extraction => &self.extraction,
            JobFamily::StageProcessing => &self.stage,
            JobFamily::Summarization => &self.summarization,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub api: ApiSettings,
    pub poll: PollProfile,
}

impl EngineConfig {
    pub fn for_backend(api: ApiSettings) -> Self {
        Self {
            api,
            poll: PollProfile::default(),
        }
    }
}

enum EngineCommand {
    LoadProjects,
    LoadIssueCount { project_id: String },
    SubmitExtraction { project_id: String },
    SubmitStage { project_id: String, stage: u32 },
    SubmitSummary { request: SummaryRequest },
    WatchTask { family: JobFamily, task_id: TaskId },
    CancelWatch { family: JobFamily },
    LoadConfig,
    SaveConfig(Box<ConsoleConfig>),
    LoadReport { project_id: String },
    LoadFeature { jira_key: String },
    LoadStats,
}

/// Loaded config document together with its load-time validation report.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub document: ConsoleConfig,
    pub issues: Vec<ConfigIssue>,
}

/// Everything the engine reports back to its embedder.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ProjectsLoaded(Result<Vec<Project>, ApiError>),
    IssueCountLoaded {
        project_id: String,
        result: Result<u64, ApiError>,
    },
    JobSubmitted {
        family: JobFamily,
        result: Result<TaskId, ApiError>,
    },
    /// One successfully parsed status snapshot, terminal ones included.
    TaskObserved {
        family: JobFamily,
        snapshot: TaskSnapshot,
    },
    /// The monitor activation for this family ended.
    TaskSettled {
        family: JobFamily,
        outcome: PollOutcome,
    },
    ConfigLoaded(Result<LoadedConfig, ApiError>),
    ConfigSaved(Result<crate::SaveAck, ApiError>),
    /// Report HTML, already sanitized.
    ReportLoaded {
        project_id: String,
        result: Result<String, ApiError>,
    },
    FeatureLoaded {
        jira_key: String,
        result: Result<FeatureIssue, ApiError>,
    },
    StatsLoaded(Result<DashboardStats, ApiError>),
}

type Watchers = Arc<Mutex<HashMap<JobFamily, CancellationToken>>>;

/// Handle to the IO engine running on its own thread with a tokio runtime.
/// Commands go in over a channel; events come back the same way. The event
/// receiver sits behind a mutex so the handle can be shared with a pump
/// thread.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Mutex<mpsc::Receiver<EngineEvent>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, ApiError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let client = Arc::new(ApiClient::new(config.api.clone())?);
        let profile = config.poll;
        let watchers: Watchers = Arc::new(Mutex::new(HashMap::new()));

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(command) = cmd_rx.recv() {
                let client = client.clone();
                let event_tx = event_tx.clone();
                let watchers = watchers.clone();
                let profile = profile.clone();
                runtime.spawn(async move {
                    handle_command(client, command, event_tx, watchers, profile).await;
                });
            }
        });

        Ok(Self {
            cmd_tx,
            event_rx: Mutex::new(event_rx),
        })
    }

    pub fn load_projects(&self) {
        self.send(EngineCommand::LoadProjects);
    }

    pub fn load_issue_count(&self, project_id: impl Into<String>) {
        self.send(EngineCommand::LoadIssueCount {
            project_id: project_id.into(),
        });
    }

    pub fn submit_extraction(&self, project_id: impl Into<String>) {
        self.send(EngineCommand::SubmitExtraction {
            project_id: project_id.into(),
        });
    }

    pub fn submit_stage(&self, project_id: impl Into<String>, stage: u32) {
        self.send(EngineCommand::SubmitStage {
            project_id: project_id.into(),
            stage,
        });
    }

    pub fn submit_summary(&self, request: SummaryRequest) {
        self.send(EngineCommand::SubmitSummary { request });
    }

    /// Start polling a task. Any monitor already active for the family is
    /// cancelled first; one loop per family, always.
    pub fn watch_task(&self, family: JobFamily, task_id: TaskId) {
        self.send(EngineCommand::WatchTask { family, task_id });
    }

    pub fn cancel_watch(&self, family: JobFamily) {
        self.send(EngineCommand::CancelWatch { family });
    }

    pub fn load_config(&self) {
        self.send(EngineCommand::LoadConfig);
    }

    pub fn save_config(&self, document: ConsoleConfig) {
        self.send(EngineCommand::SaveConfig(Box::new(document)));
    }

    pub fn load_report(&self, project_id: impl Into<String>) {
        self.send(EngineCommand::LoadReport {
            project_id: project_id.into(),
        });
    }

    pub fn load_feature(&self, jira_key: impl Into<String>) {
        self.send(EngineCommand::LoadFeature {
            jira_key: jira_key.into(),
        });
    }

    pub fn load_stats(&self) {
        self.send(EngineCommand::LoadStats);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }
}

struct ChannelStatusSink {
    family: JobFamily,
    tx: mpsc::Sender<EngineEvent>,
}

impl StatusSink for ChannelStatusSink {
    fn observed(&self, snapshot: &TaskSnapshot) {
        let _ = self.tx.send(EngineEvent::TaskObserved {
            family: self.family,
            snapshot: snapshot.clone(),
        });
    }
}

async fn handle_command(
    client: Arc<ApiClient>,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
    watchers: Watchers,
    profile: PollProfile,
) {
    match command {
        EngineCommand::LoadProjects => {
            let result = client.list_projects().await;
            let _ = event_tx.send(EngineEvent::ProjectsLoaded(result));
        }
        EngineCommand::LoadIssueCount { project_id } => {
            let result = client.issue_count(&project_id).await;
            let _ = event_tx.send(EngineEvent::IssueCountLoaded { project_id, result });
        }
        EngineCommand::SubmitExtraction { project_id } => {
            let result = client.submit_extraction(&project_id).await;
            let _ = event_tx.send(EngineEvent::JobSubmitted {
                family: JobFamily::Extraction,
                result,
            });
        }
        EngineCommand::SubmitStage { project_id, stage } => {
            let result = client.submit_stage(&project_id, stage).await;
            let _ = event_tx.send(EngineEvent::JobSubmitted {
                family: JobFamily::StageProcessing,
                result,
            });
        }
        EngineCommand::SubmitSummary { request } => {
            let result = client.submit_summary(&request).await;
            let _ = event_tx.send(EngineEvent::JobSubmitted {
                family: JobFamily::Summarization,
                result,
            });
        }
        EngineCommand::WatchTask { family, task_id } => {
            console_debug!("watching {} task {}", family, task_id);
            let token = CancellationToken::new();
            {
                let mut active = watchers.lock().expect("lock watchers");
                if let Some(previous) = active.insert(family, token.clone()) {
                    previous.cancel();
                }
            }
            let handle = TaskHandle::new(task_id, family);
            let settings = profile.for_family(family).clone();
            let sink = ChannelStatusSink {
                family,
                tx: event_tx.clone(),
            };
            let outcome =
                poll_until_terminal(client.as_ref(), &handle, &settings, &token, &sink).await;
            let _ = event_tx.send(EngineEvent::TaskSettled { family, outcome });
        }
        EngineCommand::CancelWatch { family } => {
            console_debug!("cancelling {} watch", family);
            let active = watchers.lock().expect("lock watchers");
            if let Some(token) = active.get(&family) {
                token.cancel();
            }
        }
        EngineCommand::LoadConfig => {
            let result = client.load_config().await.map(|document| {
                let issues = document.validate();
                LoadedConfig { document, issues }
            });
            let _ = event_tx.send(EngineEvent::ConfigLoaded(result));
        }
        EngineCommand::SaveConfig(document) => {
            let result = client.save_config(&document).await;
            let _ = event_tx.send(EngineEvent::ConfigSaved(result));
        }
        EngineCommand::LoadReport { project_id } => {
            let result = client
                .fetch_report(&project_id)
                .await
                .map(|report| sanitize_report_html(&report.report_html));
            let _ = event_tx.send(EngineEvent::ReportLoaded { project_id, result });
        }
        EngineCommand::LoadFeature { jira_key } => {
            let result = client.feature_request(&jira_key).await;
            let _ = event_tx.send(EngineEvent::FeatureLoaded { jira_key, result });
        }
        EngineCommand::LoadStats => {
            let issues = client.issue_stats().await;
            let result = match issues {
                Ok(issues) => client
                    .processed_issue_stats()
                    .await
                    .map(|processed| DashboardStats { issues, processed }),
                Err(err) => Err(err),
            };
            let _ = event_tx.send(EngineEvent::StatsLoaded(result));
        }
    }
}
