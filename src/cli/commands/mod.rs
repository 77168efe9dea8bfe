use anyhow::Result;
use serde::Serialize;

use crate::config::OmniLensConfig;
use crate::dashboard::DashboardService;
use crate::github::GitHubClient;

pub mod coverage;
pub mod overview;
#[cfg(feature = "database")]
pub mod repos;
pub mod serve;
pub mod stats;
pub mod usage;
pub mod workflows;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Build a dashboard service from configuration, reporting progress unless
/// output is JSON.
pub fn connect(config: &OmniLensConfig, quiet: bool) -> Result<DashboardService> {
    if !quiet {
        eprint!("🔄 Connecting to GitHub... ");
    }

    match GitHubClient::new(&config.github) {
        Ok(client) => {
            if !quiet {
                eprintln!("✅");
            }
            Ok(DashboardService::new(client.into_api(), config.dashboard.clone()))
        }
        Err(e) => {
            if !quiet {
                eprintln!("❌");
            }
            Err(e.into())
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn show_getting_started() -> Result<()> {
    println!("🔭 OmniLens - GitHub Actions CI health");
    println!();
    println!("Reports:");
    println!("  📊 omnilens usage <owner/repo>      # Runner and billable minutes");
    println!("  🔍 omnilens stats <owner/repo>      # Workflow success rates and streaks");
    println!("  📅 omnilens overview <owner/repo>   # Today's pass/fail picture");
    println!("  🧪 omnilens coverage <owner/repo>   # Coverage from test job logs");
    println!("  ⚙️  omnilens workflows <owner/repo>  # Workflows by category");
    println!();
    println!("Server:");
    println!("  🌐 omnilens serve                   # JSON API on server.bind_address");
    println!();
    println!("💡 Set GITHUB_TOKEN (or github.token in omnilens.toml) before running a report.");
    Ok(())
}
