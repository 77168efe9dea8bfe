use anyhow::Result;
use clap::Parser;

use omnilens::cli::commands::{
    coverage::CoverageCommand, overview::OverviewCommand, serve::ServeCommand, show_getting_started,
    stats::StatsCommand, usage::UsageCommand, workflows::WorkflowsCommand, Command,
};
#[cfg(feature = "database")]
use omnilens::cli::commands::repos::ReposCommand;
use omnilens::cli::{Cli, Commands};
use omnilens::config::config;
use omnilens::github::GitHubError;
use omnilens::{github_metrics, init_telemetry, shutdown_telemetry};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config()?;
    if let Err(e) = init_telemetry(&config.observability) {
        eprintln!("⚠️  Logging not initialized: {e}");
    }

    let json = cli.json;
    let result = tokio::runtime::Runtime::new()?.block_on(async {
        match cli.command {
            None => show_getting_started(),
            Some(Commands::Usage { repo, days }) => UsageCommand::new(repo, days, json).execute().await,
            Some(Commands::Stats { repo, days }) => StatsCommand::new(repo, days, json).execute().await,
            Some(Commands::Overview {
                repo,
                date,
                offset_minutes,
            }) => {
                OverviewCommand::new(repo, date, offset_minutes, json)
                    .execute()
                    .await
            }
            Some(Commands::Coverage { repo, run_id }) => {
                CoverageCommand::new(repo, run_id, json).execute().await
            }
            Some(Commands::Workflows { repo }) => WorkflowsCommand::new(repo, json).execute().await,
            Some(Commands::Serve { bind }) => ServeCommand::new(bind).execute().await,
            #[cfg(feature = "database")]
            Some(Commands::Repos { user, action }) => {
                ReposCommand::new(user, action, json).execute().await
            }
        }
    });

    github_metrics().log_stats();
    shutdown_telemetry();

    if let Err(e) = &result {
        if let Some(github_error) = e.downcast_ref::<GitHubError>() {
            eprintln!("❌ {github_error}");
            for hint in github_error.troubleshooting() {
                eprintln!("   💡 {hint}");
            }
            std::process::exit(1);
        }
    }
    result
}
