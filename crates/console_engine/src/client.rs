use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use url::Url;

use crate::config::ConsoleConfig;
use crate::endpoints::StatusEndpoint;
use crate::types::map_reqwest_error;
use crate::{
    ApiError, FeatureIssue, FeatureLookup, IssueCount, Project, ProjectDraft, Report, SaveAck,
    StatBucket, SummaryRequest, TaskAccepted, TaskId, TaskSnapshot,
};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ApiSettings {
    /// Settings for a backend at `base_url` with the default timeouts.
    pub fn for_base(base_url: Url) -> Self {
        Self {
            base_url,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Result of a project update; the backend answers with the updated record,
/// or with a plain message when the submitted data changed nothing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum UpdateOutcome {
    Updated(Project),
    Unchanged { message: String },
}

/// Read access to task status, the seam the poll monitor runs against.
#[async_trait::async_trait]
pub trait StatusSource: Send + Sync {
    async fn task_status(
        &self,
        endpoint: &StatusEndpoint,
        task_id: &TaskId,
    ) -> Result<TaskSnapshot, ApiError>;
}

/// Typed client for the issue-extraction backend.
///
/// The underlying HTTP client carries no cookie store, so every session
/// starts clean.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(Self {
            http,
            base_url: settings.base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::InvalidUrl(err.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let mut request = self.http.get(self.endpoint(path)?);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await.map_err(map_reqwest_error)?;
        decode_response(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .post(self.endpoint(path)?)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_response(response).await
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.get_json("/api/projects", &[]).await
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Project, ApiError> {
        self.get_json(&format!("/api/projects/{project_id}"), &[])
            .await
    }

    pub async fn create_project(&self, draft: &ProjectDraft) -> Result<Project, ApiError> {
        self.post_json("/api/projects", draft).await
    }

    pub async fn update_project(
        &self,
        project_id: &str,
        draft: &ProjectDraft,
    ) -> Result<UpdateOutcome, ApiError> {
        let response = self
            .http
            .put(self.endpoint(&format!("/api/projects/{project_id}"))?)
            .json(draft)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_response(response).await
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.endpoint(&format!("/api/projects/{project_id}"))?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http(status.as_u16()));
        }
        Ok(())
    }

    pub async fn issue_count(&self, project_id: &str) -> Result<u64, ApiError> {
        let counted: IssueCount = self
            .get_json("/api/issues/count", &[("project", project_id)])
            .await?;
        Ok(counted.count)
    }

    /// Enqueue a JIRA extraction job; the returned id feeds the monitor.
    pub async fn submit_extraction(&self, project_id: &str) -> Result<TaskId, ApiError> {
        let accepted: TaskAccepted = self
            .get_json("/api/jira/extract", &[("project", project_id)])
            .await?;
        Ok(accepted.task_id)
    }

    /// Enqueue one processing stage for a project.
    pub async fn submit_stage(&self, project_id: &str, stage: u32) -> Result<TaskId, ApiError> {
        let stage = stage.to_string();
        let accepted: TaskAccepted = self
            .get_json(
                "/api/process",
                &[("project_id", project_id), ("stage", stage.as_str())],
            )
            .await?;
        Ok(accepted.task_id)
    }

    /// Enqueue a prompt-based summarization job.
    pub async fn submit_summary(&self, request: &SummaryRequest) -> Result<TaskId, ApiError> {
        let accepted: TaskAccepted = self.post_json("/api/issues/summary", request).await?;
        Ok(accepted.task_id)
    }

    pub async fn load_config(&self) -> Result<ConsoleConfig, ApiError> {
        self.get_json("/api/config", &[]).await
    }

    pub async fn save_config(&self, config: &ConsoleConfig) -> Result<SaveAck, ApiError> {
        self.post_json("/api/config", config).await
    }

    /// Raw report HTML; run it through [`crate::sanitize_report_html`]
    /// before handing it to a renderer.
    pub async fn fetch_report(&self, project_id: &str) -> Result<Report, ApiError> {
        self.get_json("/api/reports", &[("projectid", project_id)])
            .await
    }

    pub async fn feature_request(&self, jira_key: &str) -> Result<FeatureIssue, ApiError> {
        let lookup: FeatureLookup = self
            .get_json("/api/feature-request", &[("jira_key", jira_key)])
            .await?;
        Ok(lookup.data)
    }

    pub async fn issue_stats(&self) -> Result<Vec<StatBucket>, ApiError> {
        self.get_json("/api/issues/stats", &[]).await
    }

    pub async fn processed_issue_stats(&self) -> Result<Vec<StatBucket>, ApiError> {
        self.get_json("/api/processed_issues/stats", &[]).await
    }
}

#[async_trait::async_trait]
impl StatusSource for ApiClient {
    async fn task_status(
        &self,
        endpoint: &StatusEndpoint,
        task_id: &TaskId,
    ) -> Result<TaskSnapshot, ApiError> {
        self.get_json(&endpoint.status_path_for(task_id), &[]).await
    }
}

async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Http(status.as_u16()));
    }
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
}
