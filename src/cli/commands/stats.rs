use anyhow::Result;

use super::{connect, print_json, Command};
use crate::config::config;
use crate::github::RepoRef;
use crate::metrics::MetricsReporter;

pub struct StatsCommand {
    pub repo: String,
    pub days: Option<u32>,
    pub json: bool,
}

impl StatsCommand {
    pub fn new(repo: String, days: Option<u32>, json: bool) -> Self {
        Self { repo, days, json }
    }
}

impl Command for StatsCommand {
    async fn execute(&self) -> Result<()> {
        let config = config()?;
        let repo = RepoRef::parse(&self.repo)?;
        let days = self.days.unwrap_or(config.dashboard.default_window_days);

        let dashboard = connect(config, self.json)?;
        let stats = dashboard.workflow_stats(&repo, days).await?;

        if self.json {
            return print_json(&stats);
        }
        print!(
            "{}",
            MetricsReporter::format_stats_report(&repo.full_name(), &stats)
        );
        Ok(())
    }
}
