use anyhow::Result;

use super::{connect, print_json, Command};
use crate::config::config;
use crate::github::RepoRef;
use crate::metrics::MetricsReporter;

pub struct UsageCommand {
    pub repo: String,
    pub days: Option<u32>,
    pub json: bool,
}

impl UsageCommand {
    pub fn new(repo: String, days: Option<u32>, json: bool) -> Self {
        Self { repo, days, json }
    }
}

impl Command for UsageCommand {
    async fn execute(&self) -> Result<()> {
        let config = config()?;
        let repo = RepoRef::parse(&self.repo)?;
        let days = self.days.unwrap_or(config.dashboard.default_window_days);

        let dashboard = connect(config, self.json)?;
        let report = dashboard.usage(&repo, days).await?;

        if self.json {
            return print_json(&report);
        }
        print!("{}", MetricsReporter::format_usage_report(&report));
        Ok(())
    }
}
