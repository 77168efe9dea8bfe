use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::categorize::{categorize_workflow, WorkflowCategory};
use super::parser::{parse_coverage, CoverageReport};
use crate::github::{ActionsApi, Conclusion, GitHubError, Job, RepoRef, RunFilter, WorkflowRun};

#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// Inspect exactly this run instead of the latest test runs
    pub run_id: Option<u64>,
    pub max_runs: usize,
    /// Job logs fetched concurrently per chunk
    pub log_concurrency: usize,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            run_id: None,
            max_runs: 5,
            log_concurrency: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCoverage {
    pub job_id: u64,
    pub job_name: String,
    pub run_id: u64,
    pub workflow_name: String,
    pub report: CoverageReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedJob {
    pub job_id: u64,
    pub job_name: String,
    pub run_id: u64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallCoverage {
    pub run_id: u64,
    pub workflow_name: String,
    pub created_at: DateTime<Utc>,
    /// Mean over the run's reporting jobs
    pub percent: f64,
    pub jobs_reporting: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageDetection {
    pub repository: String,
    pub runs_inspected: usize,
    pub jobs_inspected: usize,
    pub jobs: Vec<JobCoverage>,
    pub skipped: Vec<SkippedJob>,
    pub overall: Option<OverallCoverage>,
}

/// Runs worth scanning, newest first.
pub async fn candidate_runs(
    api: &dyn ActionsApi,
    repo: &RepoRef,
    options: &DetectOptions,
) -> Result<Vec<WorkflowRun>, GitHubError> {
    if let Some(run_id) = options.run_id {
        return Ok(vec![api.get_workflow_run(repo, run_id).await?]);
    }

    let workflows = api.list_workflows(repo).await?;
    let mut runs = Vec::new();

    for workflow in workflows
        .iter()
        .filter(|w| w.is_active() && categorize_workflow(w) == WorkflowCategory::Test)
    {
        let filter = RunFilter {
            workflow_id: Some(workflow.id),
            status: Some("success".to_string()),
            limit: Some(1),
            ..RunFilter::default()
        };
        let latest = api.list_workflow_runs(repo, &filter).await?;
        debug!(
            workflow = %workflow.name,
            found = latest.len(),
            "Latest successful test run"
        );
        runs.extend(latest.into_iter().filter(WorkflowRun::is_completed));
    }

    runs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    runs.truncate(options.max_runs.max(1));
    Ok(runs)
}

fn has_output(job: &Job) -> bool {
    job.completed_at.is_some() && job.conclusion != Some(Conclusion::Skipped)
}

/// Scan job logs of recent test runs for coverage summaries.
pub async fn detect_coverage(
    api: &dyn ActionsApi,
    repo: &RepoRef,
    options: &DetectOptions,
) -> Result<CoverageDetection, GitHubError> {
    let runs = candidate_runs(api, repo, options).await?;

    let mut pending: Vec<(&WorkflowRun, Job)> = Vec::new();
    for run in &runs {
        let jobs = api.list_run_jobs(repo, run.id).await?;
        pending.extend(jobs.into_iter().filter(has_output).map(|job| (run, job)));
    }

    let mut jobs = Vec::new();
    let mut skipped = Vec::new();

    for chunk in pending.chunks(options.log_concurrency.max(1)) {
        let logs = join_all(chunk.iter().map(|(_, job)| api.job_logs(repo, job.id))).await;

        for ((run, job), log) in chunk.iter().zip(logs) {
            match log {
                Ok(text) => {
                    if let Some(report) = parse_coverage(&text) {
                        jobs.push(JobCoverage {
                            job_id: job.id,
                            job_name: job.name.clone(),
                            run_id: run.id,
                            workflow_name: run.display_name().to_string(),
                            report,
                        });
                    }
                }
                Err(e) => {
                    warn!(job_id = job.id, error = %e, "Could not fetch job log");
                    skipped.push(SkippedJob {
                        job_id: job.id,
                        job_name: job.name.clone(),
                        run_id: run.id,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    let overall = runs.iter().find_map(|run| {
        let reporting: Vec<f64> = jobs
            .iter()
            .filter(|j| j.run_id == run.id)
            .map(|j| j.report.percent)
            .collect();
        (!reporting.is_empty()).then(|| OverallCoverage {
            run_id: run.id,
            workflow_name: run.display_name().to_string(),
            created_at: run.created_at,
            percent: reporting.iter().sum::<f64>() / reporting.len() as f64,
            jobs_reporting: reporting.len(),
        })
    });

    info!(
        repository = %repo,
        runs = runs.len(),
        jobs = pending.len(),
        reporting = jobs.len(),
        skipped = skipped.len(),
        "Coverage detection finished"
    );

    Ok(CoverageDetection {
        repository: repo.full_name(),
        runs_inspected: runs.len(),
        jobs_inspected: pending.len(),
        jobs,
        skipped,
        overall,
    })
}
