// Test coverage auto-detection from GitHub Actions job logs.

pub mod categorize;
pub mod detect;
pub mod parser;

pub use categorize::{categorize_workflow, WorkflowCategory};
pub use detect::{detect_coverage, CoverageDetection, DetectOptions, JobCoverage, OverallCoverage};
pub use parser::{parse_coverage, CoverageReport, CoverageTool};
