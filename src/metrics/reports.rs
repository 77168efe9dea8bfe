use super::types::*;

pub struct MetricsReporter;

fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

fn format_rate(rate: Option<f64>) -> String {
    rate.map(|r| format!("{:.1}%", r * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

fn os_label(os: RunnerOs) -> &'static str {
    match os {
        RunnerOs::Linux => "Linux",
        RunnerOs::Windows => "Windows",
        RunnerOs::MacOs => "macOS",
        RunnerOs::Unknown => "Unknown OS",
    }
}

fn kind_label(kind: RunnerKind) -> &'static str {
    match kind {
        RunnerKind::GitHubHosted => "GitHub-hosted",
        RunnerKind::SelfHosted => "self-hosted",
    }
}

impl MetricsReporter {
    pub fn format_usage_report(report: &UsageReport) -> String {
        let mut out = String::new();

        out.push_str(&format!("📊 RUNNER USAGE · {}\n", report.repository));
        out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        out.push_str(&format!(
            "   Window:           {} → {}\n",
            report.window_start.format("%Y-%m-%d"),
            report.window_end.format("%Y-%m-%d")
        ));
        out.push_str(&format!("   Runs:             {}\n", report.total_runs));
        out.push_str(&format!("   Jobs:             {}\n", report.total_jobs));
        out.push_str(&format!("   Runner minutes:   {:.2}\n", report.total_minutes));
        out.push_str(&format!("   Billable minutes: {}\n\n", report.billable_minutes));

        if !report.runners.is_empty() {
            out.push_str("🖥️  BY RUNNER\n");
            for bucket in &report.runners {
                out.push_str(&format!(
                    "   {:<14} {:<10} {:>5} jobs  {:>10}  {:>6} billable  ({} ✅ / {} ❌)\n",
                    kind_label(bucket.kind),
                    os_label(bucket.os),
                    bucket.jobs,
                    format_duration(bucket.total_seconds as f64),
                    bucket.billable_minutes,
                    bucket.succeeded,
                    bucket.failed,
                ));
            }
            out.push('\n');
        }

        if !report.workflows.is_empty() {
            out.push_str("⚙️  BY WORKFLOW\n");
            for workflow in &report.workflows {
                out.push_str(&format!(
                    "   {:<30} {:>4} runs {:>5} jobs {:>6} billable\n",
                    workflow.workflow_name, workflow.runs, workflow.jobs, workflow.billable_minutes
                ));
            }
        }

        out
    }

    pub fn format_stats_report(repository: &str, stats: &[WorkflowStats]) -> String {
        let mut out = String::new();

        out.push_str(&format!("🔍 WORKFLOW HEALTH · {repository}\n"));
        out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

        if stats.is_empty() {
            out.push_str("📭 No workflow runs in this window\n");
            return out;
        }

        for s in stats {
            let marker = if s.current_failure_streak > 0 { "❌" } else { "✅" };
            out.push_str(&format!("{marker} {}\n", s.workflow_name));
            out.push_str(&format!(
                "   Success Rate:     {} ({}/{} decided runs)\n",
                format_rate(s.success_rate),
                s.successes,
                s.successes + s.failures
            ));
            if let Some(median) = s.median_duration_seconds {
                out.push_str(&format!("   Median Duration:  {}\n", format_duration(median)));
            }
            if let Some(p95) = s.p95_duration_seconds {
                out.push_str(&format!("   p95 Duration:     {}\n", format_duration(p95 as f64)));
            }
            if s.current_failure_streak > 0 {
                out.push_str(&format!(
                    "   Failing for:      {} consecutive runs\n",
                    s.current_failure_streak
                ));
            }
            if s.longest_failure_streak > 1 {
                out.push_str(&format!(
                    "   Longest streak:   {} failures\n",
                    s.longest_failure_streak
                ));
            }
            if let Some(last) = &s.last_run {
                out.push_str(&format!("   Last run:         #{} {}\n", last.run_number, last.html_url));
            }
            out.push('\n');
        }

        out
    }

    pub fn format_overview_report(overview: &DailyOverview) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "📅 DAILY OVERVIEW · {} ({})\n",
            overview.repository, overview.date
        ));
        out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        out.push_str(&format!(
            "   ✅ {} passed   ❌ {} failed   🔄 {} running   ⏹️  {} cancelled   💤 {} did not run\n",
            overview.passed, overview.failed, overview.running, overview.cancelled, overview.did_not_run
        ));
        out.push_str(&format!(
            "   Pass rate: {}   Runs: {}   Total time: {}\n\n",
            format_rate(overview.pass_rate),
            overview.total_runs,
            format_duration(overview.total_duration_seconds as f64)
        ));

        for row in &overview.workflows {
            let icon = match row.status {
                DayStatus::Passed => "✅",
                DayStatus::Failed => "❌",
                DayStatus::Running => "🔄",
                DayStatus::Cancelled => "⏹️ ",
                DayStatus::DidNotRun => "💤",
            };
            let trend = match row.trend {
                Trend::Fixed => " (fixed)",
                Trend::Regressed => " (regressed)",
                Trend::StillFailing => " (still failing)",
                Trend::New => " (new)",
                Trend::StillPassing | Trend::Unknown => "",
            };
            out.push_str(&format!("   {icon} {}{trend}\n", row.workflow_name));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42.0), "42s");
        assert_eq!(format_duration(125.0), "2m 5s");
        assert_eq!(format_duration(7260.0), "2h 1m");
    }

    #[test]
    fn test_empty_stats_report() {
        let report = MetricsReporter::format_stats_report("octo/repo", &[]);
        assert!(report.contains("octo/repo"));
        assert!(report.contains("No workflow runs"));
    }
}
