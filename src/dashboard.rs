//! Orchestration between the GitHub Actions API and the pure metrics code.
//!
//! Each operation runs inside a request span carrying a correlation id so the
//! page fetches it triggers can be grouped in the logs.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, Instrument};

use crate::config::DashboardConfig;
use crate::coverage::{categorize_workflow, detect_coverage, CoverageDetection, DetectOptions, WorkflowCategory};
use crate::github::{ActionsApi, GitHubError, Job, RepoRef, RepositoryInfo, RunFilter, WorkflowRun};
use crate::metrics::daily::runs_between;
use crate::metrics::{aggregate_usage, build_daily_overview, compute_workflow_stats, day_bounds};
use crate::metrics::{DailyOverview, UsageReport, WorkflowStats};
use crate::observability::OperationTimer;
use crate::telemetry::{create_request_span, generate_correlation_id};

/// Largest window, in days, a usage or stats query may cover.
pub const MAX_WINDOW_DAYS: u32 = 90;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedWorkflow {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub state: String,
    pub category: WorkflowCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoDetectReport {
    pub repository: String,
    pub workflows: Vec<CategorizedWorkflow>,
    pub coverage: CoverageDetection,
}

/// `[start, end)` of a window reaching `days` calendar days back from `now`.
pub fn window_for(days: u32, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let days = days.clamp(1, MAX_WINDOW_DAYS) as i64;
    let first_day = (now - Duration::days(days - 1)).date_naive();
    (first_day.and_time(NaiveTime::MIN).and_utc(), now)
}

#[derive(Clone)]
pub struct DashboardService {
    api: Arc<dyn ActionsApi>,
    config: DashboardConfig,
}

impl DashboardService {
    pub fn new(api: Arc<dyn ActionsApi>, config: DashboardConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Confirm a repository exists and the token can see it.
    pub async fn repository(&self, repo: &RepoRef) -> Result<RepositoryInfo, GitHubError> {
        let correlation_id = generate_correlation_id();
        let span = create_request_span("repository", &repo.full_name(), &correlation_id);

        async {
            let timer = OperationTimer::new("repository");
            let info = self.api.get_repository(repo).await?;
            timer.finish();
            Ok::<_, GitHubError>(info)
        }
        .instrument(span)
        .await
    }

    pub async fn workflows(&self, repo: &RepoRef) -> Result<Vec<CategorizedWorkflow>, GitHubError> {
        let correlation_id = generate_correlation_id();
        let span = create_request_span("workflows", &repo.full_name(), &correlation_id);

        async {
            let timer = OperationTimer::new("workflows");
            let workflows = self.api.list_workflows(repo).await?;
            let categorized: Vec<CategorizedWorkflow> = workflows
                .into_iter()
                .map(|w| CategorizedWorkflow {
                    category: categorize_workflow(&w),
                    id: w.id,
                    name: w.name,
                    path: w.path,
                    state: w.state,
                })
                .collect();
            timer.finish();
            Ok::<_, GitHubError>(categorized)
        }
        .instrument(span)
        .await
    }

    /// Jobs of every run, fetched `log_concurrency` runs at a time.
    async fn jobs_for_runs(&self, repo: &RepoRef, runs: &[WorkflowRun]) -> Result<Vec<Job>, GitHubError> {
        let mut jobs = Vec::new();
        for chunk in runs.chunks(self.config.log_concurrency.max(1)) {
            let results = join_all(chunk.iter().map(|run| self.api.list_run_jobs(repo, run.id))).await;
            for result in results {
                jobs.extend(result?);
            }
        }
        Ok(jobs)
    }

    async fn runs_in_window(
        &self,
        repo: &RepoRef,
        days: u32,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>, Vec<WorkflowRun>), GitHubError> {
        let (start, end) = window_for(days, Utc::now());
        let runs = self
            .api
            .list_workflow_runs(repo, &RunFilter::since(start.date_naive()))
            .await?;
        let runs = runs_between(&runs, start, end + Duration::seconds(1));
        debug!(repository = %repo, runs = runs.len(), "Runs in window");
        Ok((start, end, runs))
    }

    /// Runner minutes and billable minutes over the last `days` days.
    pub async fn usage(&self, repo: &RepoRef, days: u32) -> Result<UsageReport, GitHubError> {
        let correlation_id = generate_correlation_id();
        let span = create_request_span("usage", &repo.full_name(), &correlation_id);

        async {
            let timer = OperationTimer::new("usage");
            let (start, end, runs) = self.runs_in_window(repo, days).await?;
            let jobs = self.jobs_for_runs(repo, &runs).await?;
            let report = aggregate_usage(&repo.full_name(), start, end, &runs, &jobs);
            timer.finish();
            Ok::<_, GitHubError>(report)
        }
        .instrument(span)
        .await
    }

    /// Success rate, durations and failure streaks per workflow.
    pub async fn workflow_stats(&self, repo: &RepoRef, days: u32) -> Result<Vec<WorkflowStats>, GitHubError> {
        let correlation_id = generate_correlation_id();
        let span = create_request_span("workflow_stats", &repo.full_name(), &correlation_id);

        async {
            let timer = OperationTimer::new("workflow_stats");
            let (_, _, runs) = self.runs_in_window(repo, days).await?;
            let stats = compute_workflow_stats(&runs);
            timer.finish();
            Ok::<_, GitHubError>(stats)
        }
        .instrument(span)
        .await
    }

    /// Pass/fail picture of `date`, bounded by the configured request timeout.
    pub async fn daily_overview(
        &self,
        repo: &RepoRef,
        date: NaiveDate,
        offset_minutes: i32,
    ) -> Result<DailyOverview, GitHubError> {
        let correlation_id = generate_correlation_id();
        let span = create_request_span("daily_overview", &repo.full_name(), &correlation_id);
        let limit = std::time::Duration::from_secs(self.config.request_timeout_seconds);

        async {
            let timer = OperationTimer::new("daily_overview");
            let overview = tokio::time::timeout(limit, self.fetch_daily_overview(repo, date, offset_minutes))
                .await
                .map_err(|_| GitHubError::Timeout {
                    operation: "daily_overview".to_string(),
                    duration_ms: limit.as_millis() as u64,
                })??;
            timer.finish();
            Ok::<_, GitHubError>(overview)
        }
        .instrument(span)
        .await
    }

    async fn fetch_daily_overview(
        &self,
        repo: &RepoRef,
        date: NaiveDate,
        offset_minutes: i32,
    ) -> Result<DailyOverview, GitHubError> {
        let (start, end) = day_bounds(date, offset_minutes);
        let previous_start = start - Duration::days(1);

        let workflows = self.api.list_workflows(repo).await?;
        let filter = RunFilter::between(previous_start.date_naive(), end.date_naive());
        let runs = self.api.list_workflow_runs(repo, &filter).await?;

        let today = runs_between(&runs, start, end);
        let previous = runs_between(&runs, previous_start, start);

        Ok(build_daily_overview(
            &repo.full_name(),
            date,
            offset_minutes,
            &workflows,
            &today,
            &previous,
        ))
    }

    /// Coverage from the latest test runs, or from `run_id` when given.
    pub async fn coverage(&self, repo: &RepoRef, run_id: Option<u64>) -> Result<CoverageDetection, GitHubError> {
        let correlation_id = generate_correlation_id();
        let span = create_request_span("coverage", &repo.full_name(), &correlation_id);
        let options = DetectOptions {
            run_id,
            max_runs: self.config.max_runs_for_coverage,
            log_concurrency: self.config.log_concurrency,
        };

        async {
            let timer = OperationTimer::new("coverage");
            let detection = detect_coverage(self.api.as_ref(), repo, &options).await?;
            timer.finish();
            Ok::<_, GitHubError>(detection)
        }
        .instrument(span)
        .await
    }

    /// Workflow categories plus coverage detection in one pass.
    pub async fn auto_detect(&self, repo: &RepoRef, run_id: Option<u64>) -> Result<AutoDetectReport, GitHubError> {
        let correlation_id = generate_correlation_id();
        let span = create_request_span("auto_detect", &repo.full_name(), &correlation_id);

        async {
            let timer = OperationTimer::new("auto_detect");
            let workflows = self.workflows(repo).await?;
            let coverage = self.coverage(repo, run_id).await?;
            timer.finish();
            Ok::<_, GitHubError>(AutoDetectReport {
                repository: repo.full_name(),
                workflows,
                coverage,
            })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{MockActionsApi, Workflow};
    use crate::metrics::test_support::{job, run, ts, workflow};
    use crate::metrics::{DayStatus, Trend};
    use async_trait::async_trait;

    fn repo() -> RepoRef {
        RepoRef::new("octo", "repo")
    }

    fn service(api: MockActionsApi) -> DashboardService {
        DashboardService::new(Arc::new(api), DashboardConfig::default())
    }

    #[test]
    fn test_window_for_starts_at_midnight() {
        let now = ts(13 * 3600);
        let (start, end) = window_for(7, now);
        assert_eq!(start.to_rfc3339(), "2024-02-24T00:00:00+00:00");
        assert_eq!(end, now);

        let (start, _) = window_for(0, now);
        assert_eq!(start.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn test_daily_overview_splits_today_and_previous_day() {
        let mut api = MockActionsApi::new();
        api.expect_list_workflows()
            .returning(|_| Ok(vec![workflow(1, "CI", "active")]));
        api.expect_list_workflow_runs().returning(|_, filter| {
            assert_eq!(filter.created_qualifier().as_deref(), Some("2024-02-29..2024-03-02"));
            Ok(vec![
                run(2, 1, "CI", "success", 3600, 3700),
                run(1, 1, "CI", "failure", -3600, -3500),
            ])
        });

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let overview = service(api).daily_overview(&repo(), date, 0).await.unwrap();

        assert_eq!(overview.workflows.len(), 1);
        assert_eq!(overview.workflows[0].status, DayStatus::Passed);
        assert_eq!(overview.workflows[0].trend, Trend::Fixed);
        assert_eq!(overview.total_runs, 1);
    }

    #[tokio::test]
    async fn test_usage_fetches_jobs_for_every_run() {
        let mut api = MockActionsApi::new();
        api.expect_list_workflow_runs().returning(|_, filter| {
            assert!(filter.created_from.is_some());
            let now = Utc::now().timestamp() - 1_709_251_200;
            Ok(vec![
                run(1, 1, "CI", "success", now - 600, now - 300),
                run(2, 1, "CI", "failure", now - 300, now - 100),
            ])
        });
        api.expect_list_run_jobs().times(2).returning(|_, run_id| {
            let now = Utc::now().timestamp() - 1_709_251_200;
            Ok(vec![job(run_id * 10, run_id, "build", Some("success"), now - 300, now - 180)])
        });

        let report = service(api).usage(&repo(), 7).await.unwrap();
        assert_eq!(report.total_runs, 2);
        assert_eq!(report.total_jobs, 2);
        assert_eq!(report.billable_minutes, 4);
    }

    #[tokio::test]
    async fn test_errors_propagate() {
        let mut api = MockActionsApi::new();
        api.expect_list_workflow_runs().returning(|_, _| {
            Err(GitHubError::Status {
                status: 404,
                message: "Not Found".to_string(),
            })
        });

        let err = service(api).workflow_stats(&repo(), 30).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    /// Never answers before the overview deadline.
    struct StalledApi;

    #[async_trait]
    impl ActionsApi for StalledApi {
        async fn get_repository(&self, _: &RepoRef) -> Result<RepositoryInfo, GitHubError> {
            Err(GitHubError::Status {
                status: 404,
                message: "Not Found".to_string(),
            })
        }

        async fn list_workflows(&self, _: &RepoRef) -> Result<Vec<Workflow>, GitHubError> {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok(Vec::new())
        }

        async fn list_workflow_runs(&self, _: &RepoRef, _: &RunFilter) -> Result<Vec<WorkflowRun>, GitHubError> {
            Ok(Vec::new())
        }

        async fn get_workflow_run(&self, _: &RepoRef, _: u64) -> Result<WorkflowRun, GitHubError> {
            Err(GitHubError::Status {
                status: 404,
                message: "Not Found".to_string(),
            })
        }

        async fn list_run_jobs(&self, _: &RepoRef, _: u64) -> Result<Vec<Job>, GitHubError> {
            Ok(Vec::new())
        }

        async fn job_logs(&self, _: &RepoRef, _: u64) -> Result<String, GitHubError> {
            Ok(String::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_daily_overview_times_out() {
        let service = DashboardService::new(Arc::new(StalledApi), DashboardConfig::default());
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let err = service.daily_overview(&repo(), date, 0).await.unwrap_err();
        assert!(matches!(err, GitHubError::Timeout { duration_ms: 10_000, .. }));
        assert_eq!(err.status_code(), 504);
    }
}
