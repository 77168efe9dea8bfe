use std::collections::HashMap;

use super::types::{RunSummary, WorkflowStats};
use crate::github::{Conclusion, WorkflowRun};

/// Median of an unsorted sample; the mean of the middle pair for even sizes.
pub fn median(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) as f64 / 2.0)
    } else {
        Some(sorted[mid] as f64)
    }
}

/// Nearest-rank percentile, `p` in (0, 100].
pub fn percentile(values: &[i64], p: f64) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    Some(sorted[rank.clamp(1, sorted.len()) - 1])
}

/// Failure streaks over runs ordered newest first.
///
/// Only decided runs (success or failure) take part; cancelled and skipped
/// runs neither extend nor break a streak.
pub fn failure_streaks(newest_first: &[&WorkflowRun]) -> (u32, u32) {
    let mut current = 0u32;
    let mut current_open = true;
    let mut longest = 0u32;
    let mut running = 0u32;

    for run in newest_first {
        let failed = match &run.conclusion {
            Some(Conclusion::Success) => false,
            Some(c) if c.is_failure() => true,
            _ => continue,
        };

        if failed {
            running += 1;
            longest = longest.max(running);
            if current_open {
                current += 1;
            }
        } else {
            running = 0;
            current_open = false;
        }
    }

    (current, longest)
}

/// Per-workflow health statistics, sorted by workflow name.
pub fn compute_workflow_stats(runs: &[WorkflowRun]) -> Vec<WorkflowStats> {
    let mut by_workflow: HashMap<u64, Vec<&WorkflowRun>> = HashMap::new();
    for run in runs {
        by_workflow.entry(run.workflow_id).or_default().push(run);
    }

    let mut stats: Vec<WorkflowStats> = by_workflow
        .into_iter()
        .map(|(workflow_id, mut runs)| {
            runs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            stats_for(workflow_id, &runs)
        })
        .collect();

    stats.sort_by(|a, b| {
        a.workflow_name
            .cmp(&b.workflow_name)
            .then(a.workflow_id.cmp(&b.workflow_id))
    });
    stats
}

fn stats_for(workflow_id: u64, newest_first: &[&WorkflowRun]) -> WorkflowStats {
    let completed: Vec<&WorkflowRun> = newest_first
        .iter()
        .copied()
        .filter(|r| r.is_completed())
        .collect();

    let successes = completed
        .iter()
        .filter(|r| r.conclusion == Some(Conclusion::Success))
        .count() as u64;
    let failures = completed
        .iter()
        .filter(|r| r.conclusion.as_ref().is_some_and(Conclusion::is_failure))
        .count() as u64;
    let cancelled = completed
        .iter()
        .filter(|r| r.conclusion == Some(Conclusion::Cancelled))
        .count() as u64;

    let decided = successes + failures;
    let success_rate = (decided > 0).then(|| successes as f64 / decided as f64);

    let durations: Vec<i64> = completed.iter().map(|r| r.duration_seconds()).collect();
    let average_duration_seconds = (!durations.is_empty())
        .then(|| durations.iter().sum::<i64>() as f64 / durations.len() as f64);

    let (current_failure_streak, longest_failure_streak) = failure_streaks(&completed);

    let workflow_name = newest_first
        .first()
        .map(|r| r.display_name().to_string())
        .unwrap_or_default();

    WorkflowStats {
        workflow_id,
        workflow_name,
        total_runs: newest_first.len() as u64,
        completed_runs: completed.len() as u64,
        successes,
        failures,
        cancelled,
        success_rate,
        median_duration_seconds: median(&durations),
        average_duration_seconds,
        p95_duration_seconds: percentile(&durations, 95.0),
        current_failure_streak,
        longest_failure_streak,
        last_run: completed.first().map(|r| RunSummary::from(*r)),
    }
}
