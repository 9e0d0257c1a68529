use std::sync::Mutex;
use std::time::Duration;

use console_engine::{
    poll_until_terminal, ApiClient, ApiError, ApiSettings, ConsoleConfig, JobFamily, PollOutcome,
    PollSettings, StatusSink, StatusSource, TaskHandle, TaskId, TaskSnapshot, TaskState,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    let base = Url::parse(&server.uri()).unwrap();
    ApiClient::new(ApiSettings::for_base(base)).expect("client")
}

#[derive(Default)]
struct TestSink {
    seen: Mutex<Vec<TaskSnapshot>>,
}

impl StatusSink for TestSink {
    fn observed(&self, snapshot: &TaskSnapshot) {
        self.seen.lock().unwrap().push(snapshot.clone());
    }
}

#[tokio::test]
async fn lists_projects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "673f", "name": "Payments", "jira_source": "PAY"},
            {"id": "6741", "name": "Search"}
        ])))
        .mount(&server)
        .await;

    let projects = client_for(&server).list_projects().await.expect("projects");
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].name, "Payments");
    assert_eq!(projects[0].jira_source.as_deref(), Some("PAY"));
    assert_eq!(projects[1].jira_source, None);
}

#[tokio::test]
async fn extraction_submission_returns_a_task_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jira/extract"))
        .and(query_param("project", "7"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"task_id": "abc-1"})))
        .mount(&server)
        .await;

    let task_id = client_for(&server).submit_extraction("7").await.expect("task id");
    assert_eq!(task_id, TaskId::from("abc-1"));
}

#[tokio::test]
async fn failed_submission_yields_http_error_and_no_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jira/extract"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client_for(&server).submit_extraction("7").await.unwrap_err();
    assert_eq!(err, ApiError::Http(500));
}

#[tokio::test]
async fn stage_submission_sends_both_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/process"))
        .and(query_param("project_id", "7"))
        .and(query_param("stage", "2"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"task_id": "st-2"})))
        .mount(&server)
        .await;

    let task_id = client_for(&server).submit_stage("7", 2).await.expect("task id");
    assert_eq!(task_id, TaskId::from("st-2"));
}

#[tokio::test]
async fn summary_submission_posts_variables_and_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/issues/summary"))
        .and(body_json(json!({
            "variables": {"text": "customers want csv"},
            "prompt": "summarize {text}"
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"task_id": "sum-9"})))
        .mount(&server)
        .await;

    let request = console_engine::SummaryRequest::for_text("customers want csv", "summarize {text}");
    let task_id = client_for(&server).submit_summary(&request).await.expect("task id");
    assert_eq!(task_id, TaskId::from("sum-9"));
}

#[tokio::test]
async fn malformed_payload_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).list_projects().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!([])),
        )
        .mount(&server)
        .await;

    let base = Url::parse(&server.uri()).unwrap();
    let settings = ApiSettings {
        request_timeout: Duration::from_millis(50),
        ..ApiSettings::for_base(base)
    };
    let client = ApiClient::new(settings).expect("client");

    let err = client.list_projects().await.unwrap_err();
    assert_eq!(err, ApiError::Timeout);
}

#[tokio::test]
async fn issue_count_unwraps_the_count_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/issues/count"))
        .and(query_param("project", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 321})))
        .mount(&server)
        .await;

    let count = client_for(&server).issue_count("7").await.expect("count");
    assert_eq!(count, 321);
}

#[tokio::test]
async fn task_status_reads_join_endpoint_and_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jira/status/abc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "abc-1",
            "status": "in_progress",
            "result": null
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let snapshot = client
        .task_status(&JobFamily::Extraction.into(), &TaskId::from("abc-1"))
        .await
        .expect("snapshot");
    assert_eq!(snapshot.status, TaskState::InProgress);
    assert_eq!(snapshot.result, None);
}

#[tokio::test]
async fn config_round_trip_preserves_unknown_sections() {
    let document = json!({
        "mongodb": {"uri": "mongodb://db:27017", "database": "issues"},
        "llm": {"model_name": "gpt-4o-mini", "temperature": 0.1},
        "experimental": {"flag": true}
    });

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document.clone()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/config"))
        .and(body_json(document.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let config: ConsoleConfig = client.load_config().await.expect("config");
    assert!(config.validate().is_empty());

    let ack = client.save_config(&config).await.expect("save ack");
    assert_eq!(ack.status, "success");
}

#[tokio::test]
async fn feature_lookup_parses_nested_issue_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/feature-request"))
        .and(query_param("jira_key", "PROJ-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "cid": "c-7",
                "created_date": "2024-11-02T10:00:00Z",
                "priority": "Major",
                "status": "Open",
                "components": ["exports"],
                "summary": "Export to CSV",
                "description": "Customers want CSV export",
                "description_llm": "Customers want CSV export",
                "comments": [
                    {"author": "ops", "body": "seen twice", "created": "2024-11-03T09:00:00Z"}
                ]
            }
        })))
        .mount(&server)
        .await;

    let issue = client_for(&server)
        .feature_request("PROJ-123")
        .await
        .expect("issue");
    assert_eq!(issue.summary, "Export to CSV");
    assert_eq!(issue.components, vec!["exports".to_string()]);
    assert_eq!(issue.comments.len(), 1);
    assert_eq!(issue.comments[0].author, "ops");
}

#[tokio::test]
async fn dashboard_stats_map_the_mongo_bucket_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/issues/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "Open", "count": 12},
            {"_id": "Closed", "count": 30}
        ])))
        .mount(&server)
        .await;

    let stats = client_for(&server).issue_stats().await.expect("stats");
    assert_eq!(stats[0].label, "Open");
    assert_eq!(stats[1].count, 30);
}

#[tokio::test]
async fn the_client_drives_a_full_poll_to_completion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/process/status/t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "t-1",
            "status": "completed",
            "result": "Processing for stage 2 completed successfully"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let handle = TaskHandle::new(TaskId::from("t-1"), JobFamily::StageProcessing);
    let settings = PollSettings {
        period: Duration::from_millis(10),
        read_timeout: Duration::from_millis(500),
    };
    let sink = TestSink::default();
    let cancel = CancellationToken::new();

    let outcome = poll_until_terminal(&client, &handle, &settings, &cancel, &sink).await;
    match outcome {
        PollOutcome::Completed(snapshot) => {
            assert_eq!(
                snapshot.result,
                Some(json!("Processing for stage 2 completed successfully"))
            );
        }
        other => panic!("expected completion, got {other:?}"),
    }
    assert_eq!(sink.seen.lock().unwrap().len(), 1);
}
