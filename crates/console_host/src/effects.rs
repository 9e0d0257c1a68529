use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use console_core::{CommentView, Effect, FeatureIssueView, Msg, Op, ProjectChoice, StatusView};
use console_engine::{
    ApiError, ConsoleConfig, EngineConfig, EngineEvent, EngineHandle, FeatureIssue, PollOutcome,
    SummaryRequest, TaskSnapshot,
};
use console_logging::{console_info, console_warn};
use serde_json::Value;

/// Executes core effects against the engine and pumps engine events back to
/// the reducer as messages.
pub struct EffectRunner {
    engine: Arc<EngineHandle>,
    config_draft: Arc<Mutex<Option<ConsoleConfig>>>,
}

impl EffectRunner {
    pub fn new(config: EngineConfig, msg_tx: mpsc::Sender<Msg>) -> Result<Self, ApiError> {
        let engine = Arc::new(EngineHandle::new(config)?);
        let runner = Self {
            engine,
            config_draft: Arc::new(Mutex::new(None)),
        };
        runner.spawn_event_loop(msg_tx);
        Ok(runner)
    }

    /// The config document being edited. Loaded documents land here; the
    /// form layer overwrites it before asking for a save.
    pub fn set_config_draft(&self, document: ConsoleConfig) {
        *self.config_draft.lock().expect("lock config draft") = Some(document);
    }

    pub fn config_draft(&self) -> Option<ConsoleConfig> {
        self.config_draft.lock().expect("lock config draft").clone()
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadProjects => self.engine.load_projects(),
                Effect::LoadIssueCount { project_id } => self.engine.load_issue_count(project_id),
                Effect::SubmitExtraction { project_id } => {
                    console_info!("submit extraction project={}", project_id);
                    self.engine.submit_extraction(project_id);
                }
                Effect::SubmitStage { project_id, stage } => {
                    console_info!("submit stage project={} stage={}", project_id, stage);
                    self.engine.submit_stage(project_id, stage);
                }
                Effect::SubmitSummary { text, prompt } => {
                    self.engine
                        .submit_summary(SummaryRequest::for_text(text, prompt));
                }
                Effect::StartPolling { family, task_id } => {
                    self.engine
                        .watch_task(to_engine_family(family), task_id.as_str().into());
                }
                Effect::CancelPolling { family } => {
                    self.engine.cancel_watch(to_engine_family(family));
                }
                Effect::LoadReport { project_id } => self.engine.load_report(project_id),
                Effect::LoadFeature { jira_key } => self.engine.load_feature(jira_key),
                Effect::LoadConfig => self.engine.load_config(),
                Effect::SaveConfig => match self.config_draft() {
                    Some(document) => self.engine.save_config(document),
                    None => console_warn!("save requested with no config draft loaded"),
                },
                Effect::LoadStats => self.engine.load_stats(),
            }
        }
    }

    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<Msg>) {
        let engine = self.engine.clone();
        let config_draft = self.config_draft.clone();
        thread::spawn(move || loop {
            match engine.try_recv() {
                Some(event) => {
                    if let Some(msg) = map_event(event, &config_draft) {
                        if msg_tx.send(msg).is_err() {
                            break;
                        }
                    }
                }
                None => thread::sleep(Duration::from_millis(20)),
            }
        });
    }
}

fn map_event(event: EngineEvent, config_draft: &Mutex<Option<ConsoleConfig>>) -> Option<Msg> {
    let msg = match event {
        EngineEvent::ProjectsLoaded(Ok(projects)) => Msg::ProjectsLoaded(
            projects
                .into_iter()
                .map(|project| ProjectChoice {
                    id: project.id,
                    name: project.name,
                })
                .collect(),
        ),
        EngineEvent::ProjectsLoaded(Err(err)) => failed(Op::LoadProjects, err),
        EngineEvent::IssueCountLoaded { project_id, result } => match result {
            Ok(count) => Msg::IssueCountLoaded { project_id, count },
            Err(err) => failed(Op::LoadIssueCount, err),
        },
        EngineEvent::JobSubmitted { family, result } => {
            let family = to_core_family(family);
            match result {
                Ok(task_id) => Msg::JobSubmitted {
                    family,
                    task_id: task_id.as_str().to_string(),
                },
                Err(err) => Msg::JobRejected {
                    family,
                    error: err.to_string(),
                },
            }
        }
        EngineEvent::TaskObserved { family, snapshot } => Msg::TaskStatusObserved {
            family: to_core_family(family),
            status: status_view(&snapshot),
        },
        EngineEvent::TaskSettled { family, outcome } => {
            let family = to_core_family(family);
            match outcome {
                PollOutcome::Inert => return None,
                PollOutcome::Completed(snapshot) => Msg::TaskSettled {
                    family,
                    end: console_core::TaskEnd::Completed,
                    detail: result_text(family, snapshot.result.as_ref()),
                },
                PollOutcome::Failed(snapshot) => Msg::TaskSettled {
                    family,
                    end: console_core::TaskEnd::Failed,
                    detail: result_text(family, snapshot.result.as_ref()),
                },
                PollOutcome::Cancelled => Msg::TaskSettled {
                    family,
                    end: console_core::TaskEnd::Cancelled,
                    detail: None,
                },
                PollOutcome::Errored(err) => {
                    console_warn!("{} poll failed: {}", family.label(), err);
                    Msg::TaskSettled {
                        family,
                        end: console_core::TaskEnd::PollError,
                        detail: Some(err.to_string()),
                    }
                }
            }
        }
        EngineEvent::ConfigLoaded(Ok(loaded)) => {
            let issues = loaded
                .issues
                .iter()
                .map(|issue| issue.to_string())
                .collect();
            *config_draft.lock().expect("lock config draft") = Some(loaded.document);
            Msg::ConfigLoaded { issues }
        }
        EngineEvent::ConfigLoaded(Err(err)) => failed(Op::LoadConfig, err),
        EngineEvent::ConfigSaved(Ok(ack)) => Msg::ConfigSaved {
            message: ack.message,
        },
        EngineEvent::ConfigSaved(Err(err)) => failed(Op::SaveConfig, err),
        EngineEvent::ReportLoaded { project_id, result } => match result {
            Ok(html) => Msg::ReportLoaded { project_id, html },
            Err(err) => failed(Op::LoadReport, err),
        },
        EngineEvent::FeatureLoaded { jira_key, result } => match result {
            Ok(issue) => Msg::FeatureLoaded {
                jira_key,
                issue: issue_view(issue),
            },
            Err(err) => failed(Op::LoadFeature, err),
        },
        EngineEvent::StatsLoaded(result) => match result {
            Ok(stats) => Msg::StatsLoaded {
                issues: stat_rows(stats.issues),
                processed: stat_rows(stats.processed),
            },
            Err(err) => failed(Op::LoadStats, err),
        },
    };
    Some(msg)
}

fn failed(op: Op, err: ApiError) -> Msg {
    Msg::RequestFailed {
        op,
        error: err.to_string(),
    }
}

fn to_engine_family(family: console_core::JobFamily) -> console_engine::JobFamily {
    match family {
        console_core::JobFamily::Extraction => console_engine::JobFamily::Extraction,
        console_core::JobFamily::StageProcessing => console_engine::JobFamily::StageProcessing,
        console_core::JobFamily::Summarization => console_engine::JobFamily::Summarization,
    }
}

fn to_core_family(family: console_engine::JobFamily) -> console_core::JobFamily {
    match family {
        console_engine::JobFamily::Extraction => console_core::JobFamily::Extraction,
        console_engine::JobFamily::StageProcessing => console_core::JobFamily::StageProcessing,
        console_engine::JobFamily::Summarization => console_core::JobFamily::Summarization,
    }
}

fn status_view(snapshot: &TaskSnapshot) -> StatusView {
    StatusView {
        label: snapshot.status.as_str().to_string(),
        detail: snapshot.result.as_ref().and_then(value_text),
    }
}

/// Fold a task's `result` payload to display text. Summarization results
/// carry the markdown under a `summary` key; other families return either a
/// plain message or an arbitrary object.
fn result_text(family: console_core::JobFamily, result: Option<&Value>) -> Option<String> {
    let value = result?;
    if family == console_core::JobFamily::Summarization {
        if let Some(summary) = value.get("summary").and_then(Value::as_str) {
            return Some(summary.to_string());
        }
    }
    value_text(value)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => serde_json::to_string(other).ok(),
    }
}

fn issue_view(issue: FeatureIssue) -> FeatureIssueView {
    FeatureIssueView {
        summary: issue.summary,
        description: issue.description,
        description_llm: issue.description_llm,
        customer_ids: issue.cid,
        created_date: issue.created_date,
        priority: issue.priority,
        status: issue.status,
        components: issue.components,
        comments: issue
            .comments
            .into_iter()
            .map(|comment| CommentView {
                author: comment.author,
                body: comment.body,
                created: comment.created,
            })
            .collect(),
    }
}

fn stat_rows(buckets: Vec<console_engine::StatBucket>) -> Vec<console_core::StatRow> {
    buckets
        .into_iter()
        .map(|bucket| console_core::StatRow {
            label: bucket.label,
            count: bucket.count,
        })
        .collect()
}
