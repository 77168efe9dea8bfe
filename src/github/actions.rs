// GitHub Actions REST API access: workflows, runs, jobs and job logs
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use super::errors::GitHubError;
use super::types::{
    Job, JobsPage, RepoRef, RepositoryInfo, RunFilter, Workflow, WorkflowRun, WorkflowRunsPage,
    WorkflowsPage,
};
use crate::http::RateLimitedHttpClient;

/// The read-only slice of the Actions API the dashboard aggregates over.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActionsApi: Send + Sync {
    /// Repository metadata, used to validate a repository before tracking it
    async fn get_repository(&self, repo: &RepoRef) -> Result<RepositoryInfo, GitHubError>;

    /// Every workflow defined in the repository
    async fn list_workflows(&self, repo: &RepoRef) -> Result<Vec<Workflow>, GitHubError>;

    /// Workflow runs matching `filter`, newest first
    async fn list_workflow_runs(
        &self,
        repo: &RepoRef,
        filter: &RunFilter,
    ) -> Result<Vec<WorkflowRun>, GitHubError>;

    /// A single run by id
    async fn get_workflow_run(&self, repo: &RepoRef, run_id: u64) -> Result<WorkflowRun, GitHubError>;

    /// Jobs of the latest attempt of a run
    async fn list_run_jobs(&self, repo: &RepoRef, run_id: u64) -> Result<Vec<Job>, GitHubError>;

    /// Plain-text log of a single job
    async fn job_logs(&self, repo: &RepoRef, job_id: u64) -> Result<String, GitHubError>;
}

#[derive(Debug, Serialize)]
struct PageParams<'a> {
    per_page: u8,
    page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<String>,
}

impl<'a> PageParams<'a> {
    fn plain(per_page: u8, page: u32) -> Self {
        Self {
            per_page,
            page,
            branch: None,
            event: None,
            status: None,
            created: None,
        }
    }
}

/// Octocrab-backed implementation of [`ActionsApi`].
#[derive(Debug, Clone)]
pub struct ActionsHandler {
    http: RateLimitedHttpClient,
    per_page: u8,
    max_pages: u32,
}

impl ActionsHandler {
    pub fn new(http: RateLimitedHttpClient, per_page: u8, max_pages: u32) -> Self {
        Self {
            http,
            per_page: per_page.clamp(1, 100),
            max_pages: max_pages.max(1),
        }
    }

    pub fn http(&self) -> &RateLimitedHttpClient {
        &self.http
    }

    /// Walk `page=1..` until a short page, `total_count` is reached, `limit`
    /// items are collected, or the page cap is hit.
    async fn paginate<'p, T, R, F>(
        &self,
        route: &str,
        limit: Option<usize>,
        params_for: impl Fn(u32) -> PageParams<'p>,
        unwrap_page: F,
    ) -> Result<Vec<T>, GitHubError>
    where
        R: serde::de::DeserializeOwned,
        F: Fn(R) -> (u64, Vec<T>),
    {
        let mut items = Vec::new();

        for page in 1..=self.max_pages {
            let params = params_for(page);
            let response: R = self.http.get_json(route, Some(&params)).await?;
            let (total_count, batch) = unwrap_page(response);
            let batch_len = batch.len();
            items.extend(batch);

            if let Some(limit) = limit {
                if items.len() >= limit {
                    items.truncate(limit);
                    return Ok(items);
                }
            }

            debug!(
                route = route,
                page = page,
                batch = batch_len,
                total_count = total_count,
                "Fetched page"
            );

            if batch_len < params.per_page as usize || items.len() as u64 >= total_count {
                return Ok(items);
            }
        }

        info!(
            route = route,
            max_pages = self.max_pages,
            fetched = items.len(),
            "Stopped paginating at page cap"
        );
        Ok(items)
    }
}

#[async_trait]
impl ActionsApi for ActionsHandler {
    async fn get_repository(&self, repo: &RepoRef) -> Result<RepositoryInfo, GitHubError> {
        let route = format!("/repos/{}/{}", repo.owner, repo.name);
        self.http.get_json::<RepositoryInfo, ()>(&route, None).await
    }

    async fn list_workflows(&self, repo: &RepoRef) -> Result<Vec<Workflow>, GitHubError> {
        let route = format!("/repos/{}/{}/actions/workflows", repo.owner, repo.name);
        let per_page = self.per_page;
        self.paginate(
            &route,
            None,
            |page| PageParams::plain(per_page, page),
            |p: WorkflowsPage| (p.total_count, p.workflows),
        )
        .await
    }

    async fn list_workflow_runs(
        &self,
        repo: &RepoRef,
        filter: &RunFilter,
    ) -> Result<Vec<WorkflowRun>, GitHubError> {
        let route = match filter.workflow_id {
            Some(workflow_id) => format!(
                "/repos/{}/{}/actions/workflows/{}/runs",
                repo.owner, repo.name, workflow_id
            ),
            None => format!("/repos/{}/{}/actions/runs", repo.owner, repo.name),
        };
        let limit = filter.limit.map(|l| l.max(1) as usize);
        let per_page = match limit {
            Some(limit) => self.per_page.min(limit.min(100) as u8),
            None => self.per_page,
        };
        let created = filter.created_qualifier();

        self.paginate(
            &route,
            limit,
            |page| PageParams {
                per_page,
                page,
                branch: filter.branch.as_deref(),
                event: filter.event.as_deref(),
                status: filter.status.as_deref(),
                created: created.clone(),
            },
            |p: WorkflowRunsPage| (p.total_count, p.workflow_runs),
        )
        .await
    }

    async fn get_workflow_run(&self, repo: &RepoRef, run_id: u64) -> Result<WorkflowRun, GitHubError> {
        let route = format!("/repos/{}/{}/actions/runs/{}", repo.owner, repo.name, run_id);
        self.http.get_json::<WorkflowRun, ()>(&route, None).await
    }

    async fn list_run_jobs(&self, repo: &RepoRef, run_id: u64) -> Result<Vec<Job>, GitHubError> {
        let route = format!(
            "/repos/{}/{}/actions/runs/{}/jobs",
            repo.owner, repo.name, run_id
        );
        let per_page = self.per_page;
        self.paginate(
            &route,
            None,
            |page| PageParams::plain(per_page, page),
            |p: JobsPage| (p.total_count, p.jobs),
        )
        .await
    }

    async fn job_logs(&self, repo: &RepoRef, job_id: u64) -> Result<String, GitHubError> {
        let route = format!(
            "/repos/{}/{}/actions/jobs/{}/logs",
            repo.owner, repo.name, job_id
        );
        self.http.get_text(&route).await
    }
}
