use anyhow::{bail, Result};
use chrono::{Duration, NaiveDate, Utc};

use super::{connect, print_json, Command};
use crate::config::config;
use crate::github::RepoRef;
use crate::metrics::MetricsReporter;
use crate::server::handlers::MAX_OFFSET_MINUTES;

pub struct OverviewCommand {
    pub repo: String,
    pub date: Option<NaiveDate>,
    pub offset_minutes: i32,
    pub json: bool,
}

impl OverviewCommand {
    pub fn new(repo: String, date: Option<NaiveDate>, offset_minutes: i32, json: bool) -> Self {
        Self {
            repo,
            date,
            offset_minutes,
            json,
        }
    }

    fn day(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| {
            (Utc::now() + Duration::minutes(self.offset_minutes as i64)).date_naive()
        })
    }
}

impl Command for OverviewCommand {
    async fn execute(&self) -> Result<()> {
        if self.offset_minutes.abs() > MAX_OFFSET_MINUTES {
            bail!("--offset-minutes must be within ±{MAX_OFFSET_MINUTES}");
        }

        let config = config()?;
        let repo = RepoRef::parse(&self.repo)?;

        let dashboard = connect(config, self.json)?;
        let overview = dashboard
            .daily_overview(&repo, self.day(), self.offset_minutes)
            .await?;

        if self.json {
            return print_json(&overview);
        }
        print!("{}", MetricsReporter::format_overview_report(&overview));
        Ok(())
    }
}
