use clap::{Parser, Subcommand};

pub mod commands;

#[derive(Parser)]
#[command(name = "omnilens")]
#[command(about = "GitHub Actions CI health dashboard")]
#[command(long_about = "OmniLens reads a repository's GitHub Actions history and reports runner usage, \
                       workflow health, daily pass/fail overviews and test coverage. Run 'omnilens serve' \
                       to expose the same data as a JSON API.")]
pub struct Cli {
    /// Print machine-readable JSON instead of the text report
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Runner minutes and billable minutes per runner type and workflow
    Usage {
        /// Repository as owner/name or GitHub URL
        repo: String,
        /// Days to look back (1-90)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=90))]
        days: Option<u32>,
    },
    /// Success rate, durations and failure streaks per workflow
    Stats {
        /// Repository as owner/name or GitHub URL
        repo: String,
        /// Days to look back (1-90)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=90))]
        days: Option<u32>,
    },
    /// Pass/fail status of every workflow on one day
    Overview {
        /// Repository as owner/name or GitHub URL
        repo: String,
        /// Day to report (YYYY-MM-DD), today when omitted
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
        /// Fixed UTC offset, in minutes, that defines the day
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        offset_minutes: i32,
    },
    /// Detect test coverage from the latest test runs' logs
    Coverage {
        /// Repository as owner/name or GitHub URL
        repo: String,
        /// Inspect this run instead of the latest test runs
        #[arg(long)]
        run_id: Option<u64>,
    },
    /// List workflows with their detected category
    Workflows {
        /// Repository as owner/name or GitHub URL
        repo: String,
    },
    /// Serve the dashboard JSON API
    Serve {
        /// Address to bind, overrides server.bind_address
        #[arg(long)]
        bind: Option<String>,
    },
    /// Manage tracked repositories
    #[cfg(feature = "database")]
    Repos {
        /// Login the repositories belong to
        #[arg(long, default_value = "local")]
        user: String,
        #[command(subcommand)]
        action: ReposAction,
    },
}

#[cfg(feature = "database")]
#[derive(Subcommand)]
pub enum ReposAction {
    /// Validate a repository on GitHub and start tracking it
    Add { repo: String },
    /// Show tracked repositories
    List,
    /// Stop tracking a repository
    Remove { repo: String },
}
