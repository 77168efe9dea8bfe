use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};

use super::types::{DailyOverview, DayStatus, RunSummary, Trend, WorkflowDayResult};
use crate::github::{Conclusion, Workflow, WorkflowRun};

/// UTC bounds `[start, end)` of a calendar day in a fixed offset.
pub fn day_bounds(date: NaiveDate, offset_minutes: i32) -> (DateTime<Utc>, DateTime<Utc>) {
    let offset = FixedOffset::east_opt(offset_minutes * 60).unwrap_or_else(|| Utc.fix());
    let local_midnight = date.and_time(NaiveTime::MIN);
    let start = offset
        .from_local_datetime(&local_midnight)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local_midnight));
    (start, start + Duration::days(1))
}

/// Runs created inside `[start, end)`.
pub fn runs_between(runs: &[WorkflowRun], start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<WorkflowRun> {
    runs.iter()
        .filter(|r| r.created_at >= start && r.created_at < end)
        .cloned()
        .collect()
}

/// Status of a workflow for a day, taken from its latest run.
pub fn day_status(latest: Option<&WorkflowRun>) -> DayStatus {
    let Some(run) = latest else {
        return DayStatus::DidNotRun;
    };
    if !run.is_completed() {
        return DayStatus::Running;
    }
    match &run.conclusion {
        Some(Conclusion::Success) => DayStatus::Passed,
        Some(c) if c.is_failure() => DayStatus::Failed,
        Some(Conclusion::Cancelled) => DayStatus::Cancelled,
        // skipped and neutral runs did not exercise the workflow
        _ => DayStatus::DidNotRun,
    }
}

pub fn trend(today: DayStatus, previous: DayStatus) -> Trend {
    use DayStatus::*;
    match (today, previous) {
        (Passed, Failed) => Trend::Fixed,
        (Failed, Passed) => Trend::Regressed,
        (Failed, Failed) => Trend::StillFailing,
        (Passed, Passed) => Trend::StillPassing,
        (Passed | Failed, DidNotRun) => Trend::New,
        _ => Trend::Unknown,
    }
}

fn latest_by_workflow(runs: &[WorkflowRun]) -> HashMap<u64, (&WorkflowRun, u64)> {
    let mut latest: HashMap<u64, (&WorkflowRun, u64)> = HashMap::new();
    for run in runs {
        latest
            .entry(run.workflow_id)
            .and_modify(|(current, count)| {
                *count += 1;
                if (run.created_at, run.id) > (current.created_at, current.id) {
                    *current = run;
                }
            })
            .or_insert((run, 1));
    }
    latest
}

/// Build the per-workflow pass/fail picture of one day.
///
/// Active workflows always appear (as `DidNotRun` when idle); inactive ones
/// only when they ran that day.
pub fn build_daily_overview(
    repository: &str,
    date: NaiveDate,
    offset_minutes: i32,
    workflows: &[Workflow],
    runs_today: &[WorkflowRun],
    runs_previous_day: &[WorkflowRun],
) -> DailyOverview {
    let today = latest_by_workflow(runs_today);
    let previous = latest_by_workflow(runs_previous_day);

    // name order, id as tiebreak
    let mut rows: BTreeMap<(String, u64), WorkflowDayResult> = BTreeMap::new();

    let known: HashMap<u64, &Workflow> = workflows.iter().map(|w| (w.id, w)).collect();

    let mut ids: Vec<u64> = workflows
        .iter()
        .filter(|w| w.is_active())
        .map(|w| w.id)
        .collect();
    for id in today.keys() {
        if !ids.contains(id) {
            ids.push(*id);
        }
    }

    for id in ids {
        let todays = today.get(&id);
        let latest = todays.map(|(run, _)| *run);
        let status = day_status(latest);
        let previous_status = day_status(previous.get(&id).map(|(run, _)| *run));

        let (name, path) = match known.get(&id) {
            Some(w) => (w.name.clone(), Some(w.path.clone())),
            None => (
                latest
                    .map(|r| r.display_name().to_string())
                    .unwrap_or_default(),
                None,
            ),
        };

        rows.insert(
            (name.clone(), id),
            WorkflowDayResult {
                workflow_id: id,
                workflow_name: name,
                path,
                status,
                trend: trend(status, previous_status),
                run_count: todays.map(|(_, count)| *count).unwrap_or(0),
                latest_run: latest.map(RunSummary::from),
            },
        );
    }

    let workflows: Vec<WorkflowDayResult> = rows.into_values().collect();
    let count = |s: DayStatus| workflows.iter().filter(|w| w.status == s).count() as u64;
    let passed = count(DayStatus::Passed);
    let failed = count(DayStatus::Failed);
    let running = count(DayStatus::Running);
    let cancelled = count(DayStatus::Cancelled);
    let did_not_run = count(DayStatus::DidNotRun);

    let total_duration_seconds = runs_today
        .iter()
        .filter(|r| r.is_completed())
        .map(|r| r.duration_seconds())
        .sum();

    DailyOverview {
        repository: repository.to_string(),
        date,
        offset_minutes,
        passed,
        failed,
        running,
        cancelled,
        did_not_run,
        pass_rate: (passed + failed > 0).then(|| passed as f64 / (passed + failed) as f64),
        total_runs: runs_today.len() as u64,
        total_duration_seconds,
        workflows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::{run, workflow};

    #[test]
    fn test_day_bounds_with_offset() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let (start, end) = day_bounds(date, 0);
        assert_eq!(start.to_rfc3339(), "2024-03-02T00:00:00+00:00");
        assert_eq!(end - start, Duration::days(1));

        // UTC-5: local midnight is 05:00 UTC
        let (start, _) = day_bounds(date, -300);
        assert_eq!(start.to_rfc3339(), "2024-03-02T05:00:00+00:00");
    }

    #[test]
    fn test_trend_matrix() {
        assert_eq!(trend(DayStatus::Passed, DayStatus::Failed), Trend::Fixed);
        assert_eq!(trend(DayStatus::Failed, DayStatus::Passed), Trend::Regressed);
        assert_eq!(trend(DayStatus::Failed, DayStatus::Failed), Trend::StillFailing);
        assert_eq!(trend(DayStatus::Passed, DayStatus::Passed), Trend::StillPassing);
        assert_eq!(trend(DayStatus::Passed, DayStatus::DidNotRun), Trend::New);
        assert_eq!(trend(DayStatus::Running, DayStatus::Passed), Trend::Unknown);
        assert_eq!(trend(DayStatus::DidNotRun, DayStatus::Failed), Trend::Unknown);
    }

    #[test]
    fn test_daily_overview_uses_latest_run_per_workflow() {
        let workflows = vec![
            workflow(1, "CI", "active"),
            workflow(2, "Deploy", "active"),
            workflow(3, "Legacy", "disabled_manually"),
            workflow(4, "Nightly", "active"),
        ];

        let today = vec![
            run(10, 1, "CI", "failure", 100, 200),
            run(11, 1, "CI", "success", 300, 400),
            run(12, 2, "Deploy", "failure", 150, 250),
            run(13, 3, "Legacy", "success", 100, 130),
        ];
        let yesterday = vec![
            run(5, 1, "CI", "failure", -5000, -4900),
            run(6, 2, "Deploy", "success", -5000, -4950),
        ];

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let overview = build_daily_overview("octo/repo", date, 0, &workflows, &today, &yesterday);

        let names: Vec<&str> = overview.workflows.iter().map(|w| w.workflow_name.as_str()).collect();
        assert_eq!(names, vec!["CI", "Deploy", "Legacy", "Nightly"]);

        let ci = &overview.workflows[0];
        assert_eq!(ci.status, DayStatus::Passed);
        assert_eq!(ci.trend, Trend::Fixed);
        assert_eq!(ci.run_count, 2);
        assert_eq!(ci.latest_run.as_ref().map(|r| r.id), Some(11));

        assert_eq!(overview.workflows[1].trend, Trend::Regressed);
        assert_eq!(overview.workflows[2].trend, Trend::New);
        assert_eq!(overview.workflows[3].status, DayStatus::DidNotRun);

        assert_eq!(overview.passed, 2);
        assert_eq!(overview.failed, 1);
        assert_eq!(overview.did_not_run, 1);
        assert_eq!(overview.total_runs, 4);
        assert_eq!(overview.total_duration_seconds, 100 + 100 + 100 + 30);
        let rate = overview.pass_rate.unwrap();
        assert!((rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_runs_between_is_half_open() {
        let runs = vec![
            run(1, 1, "CI", "success", 0, 10),
            run(2, 1, "CI", "success", 86_400, 86_410),
        ];
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let (start, end) = day_bounds(date, 0);
        let within = runs_between(&runs, start, end);
        assert_eq!(within.len(), 1);
        assert_eq!(within[0].id, 1);
    }
}
