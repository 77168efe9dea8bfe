pub mod actions;
pub mod client;
pub mod errors;
pub mod types;

pub use actions::{ActionsApi, ActionsHandler};
#[cfg(test)]
pub use actions::MockActionsApi;
pub use client::GitHubClient;
pub use errors::GitHubError;
pub use types::{
    Conclusion, Job, RepoRef, RepositoryInfo, RunFilter, RunStatus, Step, Workflow, WorkflowRun,
};
