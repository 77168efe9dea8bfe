//! Runner usage aggregation: joins jobs to their runs and buckets them by
//! runner kind and operating system.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

use super::types::{RunnerBucket, RunnerKind, RunnerOs, UsageReport, WorkflowUsage};
use crate::github::{Conclusion, Job, WorkflowRun};

/// Classify the runner a job ran on from its labels, then its runner name.
pub fn classify_runner(job: &Job) -> (RunnerKind, RunnerOs) {
    let labels: Vec<String> = job.labels.iter().map(|l| l.to_lowercase()).collect();

    let kind = if labels.iter().any(|l| l == "self-hosted") {
        RunnerKind::SelfHosted
    } else {
        RunnerKind::GitHubHosted
    };

    let os = labels
        .iter()
        .map(|l| os_from_token(l))
        .find(|os| *os != RunnerOs::Unknown)
        .or_else(|| {
            job.runner_name
                .as_deref()
                .map(|name| os_from_token(&name.to_lowercase()))
        })
        .unwrap_or(RunnerOs::Unknown);

    (kind, os)
}

fn os_from_token(token: &str) -> RunnerOs {
    if token.starts_with("ubuntu") || token.contains("linux") {
        RunnerOs::Linux
    } else if token.starts_with("windows") || token.starts_with("win-") {
        RunnerOs::Windows
    } else if token.starts_with("macos") || token.contains("osx") || token.starts_with("mac-") {
        RunnerOs::MacOs
    } else {
        RunnerOs::Unknown
    }
}

/// Minutes GitHub bills for one job: whole minutes rounded up, times the OS
/// multiplier. Self-hosted runners are free.
pub fn billable_minutes(kind: RunnerKind, os: RunnerOs, duration_seconds: i64) -> u64 {
    if kind == RunnerKind::SelfHosted || duration_seconds <= 0 {
        return 0;
    }
    let minutes = (duration_seconds as u64).div_ceil(60);
    minutes * os.billing_multiplier()
}

#[derive(Default)]
struct BucketAcc {
    jobs: u64,
    succeeded: u64,
    failed: u64,
    cancelled: u64,
    skipped: u64,
    total_seconds: i64,
    billable_minutes: u64,
}

#[derive(Default)]
struct WorkflowAcc {
    name: String,
    runs: u64,
    jobs: u64,
    total_seconds: i64,
    billable_minutes: u64,
}

/// Aggregate runner usage for the runs in a window.
///
/// Jobs whose run is not in `runs` are ignored. Jobs that never started or
/// never finished count as jobs but contribute no time.
pub fn aggregate_usage(
    repository: &str,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    runs: &[WorkflowRun],
    jobs: &[Job],
) -> UsageReport {
    let runs_by_id: HashMap<u64, &WorkflowRun> = runs.iter().map(|r| (r.id, r)).collect();

    let mut buckets: BTreeMap<(RunnerKind, RunnerOs), BucketAcc> = BTreeMap::new();
    let mut workflows: HashMap<u64, WorkflowAcc> = HashMap::new();

    for run in runs {
        let entry = workflows.entry(run.workflow_id).or_default();
        entry.runs += 1;
        if entry.name.is_empty() {
            entry.name = run.display_name().to_string();
        }
    }

    let mut total_jobs = 0u64;
    let mut total_seconds = 0i64;
    let mut total_billable = 0u64;

    for job in jobs {
        let Some(run) = runs_by_id.get(&job.run_id) else {
            continue;
        };

        let (kind, os) = classify_runner(job);
        let seconds = job.duration_seconds().unwrap_or(0);
        let billable = billable_minutes(kind, os, seconds);

        let bucket = buckets.entry((kind, os)).or_default();
        bucket.jobs += 1;
        bucket.total_seconds += seconds;
        bucket.billable_minutes += billable;
        match &job.conclusion {
            Some(Conclusion::Success) => bucket.succeeded += 1,
            Some(c) if c.is_failure() => bucket.failed += 1,
            Some(Conclusion::Cancelled) => bucket.cancelled += 1,
            Some(Conclusion::Skipped) => bucket.skipped += 1,
            _ => {}
        }

        let workflow = workflows.entry(run.workflow_id).or_default();
        workflow.jobs += 1;
        workflow.total_seconds += seconds;
        workflow.billable_minutes += billable;

        total_jobs += 1;
        total_seconds += seconds;
        total_billable += billable;
    }

    let mut runners: Vec<RunnerBucket> = buckets
        .into_iter()
        .map(|((kind, os), acc)| RunnerBucket {
            kind,
            os,
            jobs: acc.jobs,
            succeeded: acc.succeeded,
            failed: acc.failed,
            cancelled: acc.cancelled,
            skipped: acc.skipped,
            total_seconds: acc.total_seconds,
            billable_minutes: acc.billable_minutes,
        })
        .collect();
    // BTreeMap order breaks ties, so the sort is deterministic
    runners.sort_by(|a, b| b.total_seconds.cmp(&a.total_seconds));

    let mut workflows: Vec<WorkflowUsage> = workflows
        .into_iter()
        .map(|(workflow_id, acc)| WorkflowUsage {
            workflow_id,
            workflow_name: acc.name,
            runs: acc.runs,
            jobs: acc.jobs,
            total_seconds: acc.total_seconds,
            billable_minutes: acc.billable_minutes,
        })
        .collect();
    workflows.sort_by(|a, b| {
        b.billable_minutes
            .cmp(&a.billable_minutes)
            .then_with(|| a.workflow_name.cmp(&b.workflow_name))
            .then_with(|| a.workflow_id.cmp(&b.workflow_id))
    });

    UsageReport {
        repository: repository.to_string(),
        window_start,
        window_end,
        total_runs: runs.len() as u64,
        total_jobs,
        total_minutes: (total_seconds as f64 / 60.0 * 100.0).round() / 100.0,
        billable_minutes: total_billable,
        runners,
        workflows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::{job, run, ts};

    #[test]
    fn test_classify_runner_from_labels() {
        let mut j = job(1, 10, "build", Some("success"), 0, 60);
        j.labels = vec!["ubuntu-latest".to_string()];
        assert_eq!(classify_runner(&j), (RunnerKind::GitHubHosted, RunnerOs::Linux));

        j.labels = vec!["windows-2022".to_string()];
        assert_eq!(classify_runner(&j), (RunnerKind::GitHubHosted, RunnerOs::Windows));

        j.labels = vec!["macos-14".to_string()];
        assert_eq!(classify_runner(&j), (RunnerKind::GitHubHosted, RunnerOs::MacOs));

        j.labels = vec!["self-hosted".to_string(), "Linux".to_string(), "X64".to_string()];
        assert_eq!(classify_runner(&j), (RunnerKind::SelfHosted, RunnerOs::Linux));
    }

    #[test]
    fn test_classify_runner_falls_back_to_runner_name() {
        let mut j = job(1, 10, "build", Some("success"), 0, 60);
        j.labels = vec!["self-hosted".to_string(), "gpu".to_string()];
        j.runner_name = Some("windows-gpu-01".to_string());
        assert_eq!(classify_runner(&j), (RunnerKind::SelfHosted, RunnerOs::Windows));

        j.runner_name = None;
        assert_eq!(classify_runner(&j), (RunnerKind::SelfHosted, RunnerOs::Unknown));
    }

    #[test]
    fn test_billable_minutes_round_up_and_multiply() {
        assert_eq!(billable_minutes(RunnerKind::GitHubHosted, RunnerOs::Linux, 61), 2);
        assert_eq!(billable_minutes(RunnerKind::GitHubHosted, RunnerOs::Linux, 60), 1);
        assert_eq!(billable_minutes(RunnerKind::GitHubHosted, RunnerOs::Windows, 30), 2);
        assert_eq!(billable_minutes(RunnerKind::GitHubHosted, RunnerOs::MacOs, 125), 30);
        assert_eq!(billable_minutes(RunnerKind::SelfHosted, RunnerOs::MacOs, 600), 0);
        assert_eq!(billable_minutes(RunnerKind::GitHubHosted, RunnerOs::Linux, 0), 0);
    }

    #[test]
    fn test_aggregate_usage_buckets_and_workflows() {
        let runs = vec![
            run(10, 1, "CI", "success", 0, 300),
            run(11, 1, "CI", "failure", 1000, 1300),
            run(12, 2, "Nightly", "success", 2000, 2600),
        ];

        let mut linux_a = job(100, 10, "test", Some("success"), 0, 90);
        linux_a.labels = vec!["ubuntu-latest".to_string()];
        let mut linux_b = job(101, 11, "test", Some("failure"), 1000, 1030);
        linux_b.labels = vec!["ubuntu-latest".to_string()];
        let mut mac = job(102, 12, "ios", Some("success"), 2000, 2150);
        mac.labels = vec!["macos-14".to_string()];
        let mut orphan = job(103, 99, "ghost", Some("success"), 0, 6000);
        orphan.labels = vec!["ubuntu-latest".to_string()];
        let mut unfinished = job(104, 12, "pending", None, 2000, 2000);
        unfinished.completed_at = None;
        unfinished.labels = vec!["ubuntu-latest".to_string()];

        let report = aggregate_usage(
            "octo/repo",
            ts(0),
            ts(86_400),
            &runs,
            &[linux_a, linux_b, mac, orphan, unfinished],
        );

        assert_eq!(report.total_runs, 3);
        assert_eq!(report.total_jobs, 4);
        assert_eq!(report.total_minutes, 4.5);
        // linux: ceil(90/60)=2 + ceil(30/60)=1, mac: ceil(150/60)*10=30
        assert_eq!(report.billable_minutes, 33);

        assert_eq!(report.runners.len(), 2);
        let mac_bucket = &report.runners[0];
        assert_eq!(mac_bucket.os, RunnerOs::MacOs);
        assert_eq!(mac_bucket.total_seconds, 150);
        let linux_bucket = &report.runners[1];
        assert_eq!(linux_bucket.os, RunnerOs::Linux);
        assert_eq!(linux_bucket.jobs, 3);
        assert_eq!(linux_bucket.succeeded, 1);
        assert_eq!(linux_bucket.failed, 1);

        assert_eq!(report.workflows[0].workflow_name, "Nightly");
        assert_eq!(report.workflows[0].billable_minutes, 30);
        assert_eq!(report.workflows[1].workflow_name, "CI");
        assert_eq!(report.workflows[1].runs, 2);
        assert_eq!(report.workflows[1].jobs, 2);
    }

    #[test]
    fn test_aggregate_usage_empty_window() {
        let report = aggregate_usage(
            "octo/repo",
            ts(0),
            ts(0),
            &[],
            &[],
        );
        assert_eq!(report.total_runs, 0);
        assert_eq!(report.total_minutes, 0.0);
        assert!(report.runners.is_empty());
        assert!(report.workflows.is_empty());
    }
}
