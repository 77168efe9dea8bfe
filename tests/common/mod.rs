//! Shared GitHub REST mock for integration tests.
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use omnilens::config::{DashboardConfig, GitHubConfig};
use omnilens::dashboard::DashboardService;
use omnilens::github::GitHubClient;

pub const OWNER: &str = "octo-org";
pub const REPO: &str = "octo-repo";

/// GitHub API mock server for deterministic testing
pub struct GitHubApiMock {
    pub server: MockServer,
}

impl GitHubApiMock {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn github_config(&self, per_page: u8) -> GitHubConfig {
        GitHubConfig {
            token: Some("mock-token".to_string()),
            api_base: self.server.uri(),
            per_page,
            ..GitHubConfig::default()
        }
    }

    pub fn client(&self, per_page: u8) -> GitHubClient {
        GitHubClient::new(&self.github_config(per_page)).expect("client builds against mock server")
    }

    pub fn dashboard(&self) -> DashboardService {
        DashboardService::new(self.client(100).into_api(), DashboardConfig::default())
    }

    pub fn repo_path(suffix: &str) -> String {
        format!("/repos/{OWNER}/{REPO}{suffix}")
    }

    pub async fn mock_json(&self, route: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_status(&self, route: &str, status: u16, message: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "message": message,
                "documentation_url": "https://docs.github.com/rest"
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_log(&self, job_id: u64, text: &str) {
        Mock::given(method("GET"))
            .and(path(Self::repo_path(&format!("/actions/jobs/{job_id}/logs"))))
            .respond_with(ResponseTemplate::new(200).set_body_string(text))
            .mount(&self.server)
            .await;
    }
}

pub fn repository_json() -> Value {
    json!({
        "id": 1296269,
        "name": REPO,
        "full_name": format!("{OWNER}/{REPO}"),
        "html_url": format!("https://github.com/{OWNER}/{REPO}"),
        "default_branch": "main",
        "private": false
    })
}

pub fn workflow_json(id: u64, name: &str, file: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "path": format!(".github/workflows/{file}"),
        "state": "active",
        "html_url": format!("https://github.com/{OWNER}/{REPO}/blob/main/.github/workflows/{file}"),
        "created_at": "2023-01-01T00:00:00Z",
        "updated_at": "2023-01-01T00:00:00Z"
    })
}

pub fn run_json(
    id: u64,
    workflow_id: u64,
    name: &str,
    conclusion: &str,
    created: DateTime<Utc>,
    seconds: i64,
) -> Value {
    json!({
        "id": id,
        "name": name,
        "workflow_id": workflow_id,
        "head_branch": "main",
        "head_sha": format!("{id:040x}"),
        "event": "push",
        "status": "completed",
        "conclusion": conclusion,
        "run_number": id,
        "run_attempt": 1,
        "created_at": created.to_rfc3339(),
        "updated_at": (created + chrono::Duration::seconds(seconds)).to_rfc3339(),
        "run_started_at": created.to_rfc3339(),
        "html_url": format!("https://github.com/{OWNER}/{REPO}/actions/runs/{id}")
    })
}

pub fn job_json(
    id: u64,
    run_id: u64,
    name: &str,
    labels: &[&str],
    started: DateTime<Utc>,
    seconds: i64,
) -> Value {
    json!({
        "id": id,
        "run_id": run_id,
        "name": name,
        "status": "completed",
        "conclusion": "success",
        "started_at": started.to_rfc3339(),
        "completed_at": (started + chrono::Duration::seconds(seconds)).to_rfc3339(),
        "labels": labels,
        "runner_name": "GitHub Actions 2",
        "runner_group_name": "GitHub Actions",
        "steps": []
    })
}

pub fn page(key: &str, items: Vec<Value>) -> Value {
    let mut body = json!({ "total_count": items.len() });
    body[key] = Value::Array(items);
    body
}
