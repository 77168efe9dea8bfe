use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coverage::WorkflowCategory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub created_at: DateTime<Utc>,
}

/// A repository a user has added to their dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub user_id: i64,
    pub github_id: i64,
    pub full_name: String,
    pub html_url: String,
    pub default_branch: Option<String>,
    pub private: bool,
    pub added_at: DateTime<Utc>,
}

/// Snapshot of a workflow taken when its repository was added or refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredWorkflow {
    pub id: i64,
    pub repository_id: i64,
    pub github_id: i64,
    pub name: String,
    pub path: String,
    pub state: String,
    pub category: WorkflowCategory,
}
