use crate::msg::{Msg, Op};
use crate::state::{AppState, ConfigPhase, JobFamily, NoticeLevel, TaskEnd};
use crate::Effect;

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ProcessingOpened => {
            state.processing.projects_loading = true;
            state.mark_dirty();
            vec![Effect::LoadProjects]
        }
        Msg::ProjectsLoaded(projects) => {
            state.processing.projects = projects;
            state.processing.projects_loading = false;
            state.mark_dirty();
            Vec::new()
        }
        Msg::ProjectSelected(project_id) => {
            state.processing.selected_project = Some(project_id.clone());
            state.processing.issue_count = None;
            state.mark_dirty();
            vec![Effect::LoadIssueCount { project_id }]
        }
        Msg::IssueCountLoaded { project_id, count } => {
            // A stale count for a previously selected project is dropped.
            if state.processing.selected_project.as_deref() == Some(project_id.as_str()) {
                state.processing.issue_count = Some(count);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::StageSelected(stage) => {
            state.processing.selected_stage = Some(stage);
            state.mark_dirty();
            Vec::new()
        }
        Msg::ExtractionClicked => {
            let Some(project_id) = state.processing.selected_project.clone() else {
                state.push_notice(
                    NoticeLevel::Warning,
                    "Please select a project before processing",
                );
                return (state, Vec::new());
            };
            if state.processing.extraction.is_busy() {
                return (state, Vec::new());
            }
            state.processing.extraction.begin_submission();
            state.push_notice(NoticeLevel::Info, "Processing started");
            vec![Effect::SubmitExtraction { project_id }]
        }
        Msg::StageClicked => {
            let Some(project_id) = state.processing.selected_project.clone() else {
                state.push_notice(
                    NoticeLevel::Warning,
                    "Please select a project before processing",
                );
                return (state, Vec::new());
            };
            let Some(stage) = state.processing.selected_stage else {
                state.push_notice(
                    NoticeLevel::Warning,
                    "Please select a stage before processing",
                );
                return (state, Vec::new());
            };
            if state.processing.staging.is_busy() {
                return (state, Vec::new());
            }
            state.processing.staging.begin_submission();
            state.push_notice(NoticeLevel::Info, "Stage processing started");
            vec![Effect::SubmitStage { project_id, stage }]
        }
        Msg::ReportClicked => {
            let Some(project_id) = state.processing.selected_project.clone() else {
                return (state, Vec::new());
            };
            state.processing.report_loading = true;
            state.mark_dirty();
            vec![Effect::LoadReport { project_id }]
        }
        Msg::ReportLoaded { project_id, html } => {
            state.processing.report_loading = false;
            if state.processing.selected_project.as_deref() == Some(project_id.as_str()) {
                state.processing.report_html = Some(html);
                state.push_notice(NoticeLevel::Info, "Report fetched successfully");
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::JobSubmitted { family, task_id } => {
            let replaced = state.lane_mut(family).adopt(task_id.clone());
            state.mark_dirty();
            // Cancel before replace: a still-running loop for this family
            // must stop before the new task id is polled.
            let mut effects = Vec::with_capacity(2);
            if replaced.is_some() {
                effects.push(Effect::CancelPolling { family });
            }
            effects.push(Effect::StartPolling { family, task_id });
            effects
        }
        Msg::JobRejected { family, error } => {
            state.lane_mut(family).abort_submission();
            let text = match family {
                JobFamily::Extraction => "Failed to start processing".to_string(),
                JobFamily::StageProcessing => "Failed to process stage".to_string(),
                JobFamily::Summarization => "Failed to process feature summary".to_string(),
            };
            state.push_notice(NoticeLevel::Error, format!("{text}: {error}"));
            Vec::new()
        }
        Msg::TaskStatusObserved { family, status } => {
            state.lane_mut(family).observe(status);
            state.mark_dirty();
            Vec::new()
        }
        Msg::TaskSettled {
            family,
            end,
            detail,
        } => {
            state.lane_mut(family).settle(end);
            state.mark_dirty();
            let mut effects = Vec::new();
            match end {
                TaskEnd::Completed => {
                    if family == JobFamily::Summarization {
                        state.feature.summary_markdown = detail.clone();
                    }
                    let text = detail
                        .unwrap_or_else(|| format!("{} completed", family.label()));
                    state.push_notice(NoticeLevel::Success, text);
                    // A finished extraction changes the issue count.
                    if family == JobFamily::Extraction {
                        if let Some(project_id) = state.processing.selected_project.clone() {
                            effects.push(Effect::LoadIssueCount { project_id });
                        }
                    }
                }
                TaskEnd::Failed => {
                    let text = detail
                        .unwrap_or_else(|| format!("{} failed", family.label()));
                    state.push_notice(NoticeLevel::Error, text);
                }
                TaskEnd::PollError => {
                    let text = detail.unwrap_or_else(|| "status request failed".to_string());
                    state.push_notice(
                        NoticeLevel::Error,
                        format!("Lost track of {}: {text}", family.label()),
                    );
                }
                TaskEnd::Cancelled => {}
            }
            effects
        }
        Msg::JiraKeyChanged(jira_key) => {
            state.feature.jira_key = jira_key;
            state.mark_dirty();
            Vec::new()
        }
        Msg::FeatureLookupClicked => {
            let jira_key = state.feature.jira_key.trim().to_string();
            if jira_key.is_empty() {
                state.push_notice(NoticeLevel::Warning, "Please enter a JIRA key");
                return (state, Vec::new());
            }
            state.feature.issue_loading = true;
            state.mark_dirty();
            vec![Effect::LoadFeature { jira_key }]
        }
        Msg::FeatureLoaded { jira_key, issue } => {
            state.feature.issue_loading = false;
            if state.feature.jira_key.trim() == jira_key {
                state.feature.issue = Some(issue);
                state.feature.summary_markdown = None;
                state.push_notice(NoticeLevel::Success, "Feature request processed successfully");
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::SummaryPromptChanged(prompt) => {
            state.feature.prompt = prompt;
            state.mark_dirty();
            Vec::new()
        }
        Msg::SummarizeClicked => {
            let Some(text) = state
                .feature
                .issue
                .as_ref()
                .and_then(|issue| issue.description_llm.clone())
            else {
                state.push_notice(
                    NoticeLevel::Warning,
                    "Process a feature request before summarizing",
                );
                return (state, Vec::new());
            };
            if state.feature.summary.is_busy() {
                return (state, Vec::new());
            }
            let prompt = state.feature.prompt.clone();
            state.feature.summary.begin_submission();
            state.feature.summary_markdown = None;
            state.mark_dirty();
            vec![Effect::SubmitSummary { text, prompt }]
        }
        Msg::ConfigOpened => {
            state.config.phase = ConfigPhase::Loading;
            state.mark_dirty();
            vec![Effect::LoadConfig]
        }
        Msg::ConfigLoaded { issues } => {
            state.config.phase = ConfigPhase::Editing;
            state.config.form_dirty = false;
            if !issues.is_empty() {
                state.push_notice(
                    NoticeLevel::Warning,
                    format!("Configuration loaded with {} issue(s)", issues.len()),
                );
            }
            state.config.issues = issues;
            state.mark_dirty();
            Vec::new()
        }
        Msg::ConfigEdited => {
            if state.config.phase == ConfigPhase::Editing && !state.config.form_dirty {
                state.config.form_dirty = true;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ConfigSaveClicked => {
            if state.config.phase != ConfigPhase::Editing {
                return (state, Vec::new());
            }
            state.config.phase = ConfigPhase::Saving;
            state.mark_dirty();
            vec![Effect::SaveConfig]
        }
        Msg::ConfigSaved { message } => {
            state.config.phase = ConfigPhase::Editing;
            state.config.form_dirty = false;
            state.config.last_save_message = message.clone();
            let text = match message {
                Some(message) => format!("Configuration saved successfully: {message}"),
                None => "Configuration saved successfully".to_string(),
            };
            state.push_notice(NoticeLevel::Success, text);
            Vec::new()
        }
        Msg::DashboardOpened => {
            state.dashboard.loading = true;
            state.mark_dirty();
            vec![Effect::LoadStats]
        }
        Msg::StatsLoaded { issues, processed } => {
            state.dashboard.loading = false;
            state.dashboard.issue_stats = issues;
            state.dashboard.processed_stats = processed;
            state.mark_dirty();
            Vec::new()
        }
        Msg::RequestFailed { op, error } => {
            let text = match op {
                Op::LoadProjects => {
                    state.processing.projects_loading = false;
                    "Failed to load projects"
                }
                Op::LoadIssueCount => "Failed to fetch issue count",
                Op::LoadReport => {
                    state.processing.report_loading = false;
                    "Failed to fetch report"
                }
                Op::LoadFeature => {
                    state.feature.issue_loading = false;
                    "Failed to process feature request"
                }
                Op::LoadConfig => {
                    state.config.phase = ConfigPhase::NotLoaded;
                    "Failed to load configuration"
                }
                Op::SaveConfig => {
                    state.config.phase = ConfigPhase::Editing;
                    "Failed to save configuration"
                }
                Op::LoadStats => {
                    state.dashboard.loading = false;
                    "Failed to load statistics"
                }
            };
            state.push_notice(NoticeLevel::Error, format!("{text}: {error}"));
            Vec::new()
        }
        Msg::NoticeDismissed(id) => {
            state.dismiss_notice(id);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

#[cfg(test)]
mod tests {
    use super::update;
    use crate::state::{AppState, TaskSlot};
    use crate::{JobFamily, Msg};

    #[test]
    fn submitted_task_is_adopted_into_the_lane() {
        let state = AppState::new();
        let (state, _effects) = update(
            state,
            Msg::JobSubmitted {
                family: JobFamily::Extraction,
                task_id: "t-1".to_string(),
            },
        );
        assert_eq!(
            state.lane(JobFamily::Extraction).slot(),
            &TaskSlot::Polling {
                task_id: "t-1".to_string()
            }
        );
    }
}
