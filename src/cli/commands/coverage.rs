use anyhow::Result;

use super::{connect, print_json, Command};
use crate::config::config;
use crate::coverage::CoverageDetection;
use crate::github::RepoRef;

pub struct CoverageCommand {
    pub repo: String,
    pub run_id: Option<u64>,
    pub json: bool,
}

impl CoverageCommand {
    pub fn new(repo: String, run_id: Option<u64>, json: bool) -> Self {
        Self { repo, run_id, json }
    }

    fn render(detection: &CoverageDetection) -> String {
        let mut out = String::new();
        out.push_str(&format!("🧪 TEST COVERAGE · {}\n", detection.repository));
        out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

        match &detection.overall {
            Some(overall) => out.push_str(&format!(
                "   Overall:   {:.1}% from {} (run {}, {} job(s))\n",
                overall.percent, overall.workflow_name, overall.run_id, overall.jobs_reporting
            )),
            None => out.push_str("   📭 No coverage summary found in recent test runs\n"),
        }
        out.push_str(&format!(
            "   Inspected: {} run(s), {} job(s)\n\n",
            detection.runs_inspected, detection.jobs_inspected
        ));

        for job in &detection.jobs {
            out.push_str(&format!(
                "   ✅ {:<30} {:>6.1}%  ({:?})\n",
                job.job_name, job.report.percent, job.report.tool
            ));
        }
        for skipped in &detection.skipped {
            out.push_str(&format!("   ⚠️  {:<30} skipped: {}\n", skipped.job_name, skipped.reason));
        }
        out
    }
}

impl Command for CoverageCommand {
    async fn execute(&self) -> Result<()> {
        let config = config()?;
        let repo = RepoRef::parse(&self.repo)?;

        let dashboard = connect(config, self.json)?;
        let detection = dashboard.coverage(&repo, self.run_id).await?;

        if self.json {
            return print_json(&detection);
        }
        print!("{}", Self::render(&detection));
        Ok(())
    }
}
