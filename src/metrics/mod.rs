// CI health metrics: runner usage, per-workflow statistics and daily overviews.
// Everything here is a pure function over data already fetched from GitHub.

pub mod daily;
pub mod reports;
pub mod stats;
pub mod types;
pub mod usage;

pub use daily::{build_daily_overview, day_bounds};
pub use reports::MetricsReporter;
pub use stats::compute_workflow_stats;
pub use types::*;
pub use usage::{aggregate_usage, classify_runner};
