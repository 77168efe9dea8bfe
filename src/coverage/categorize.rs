use serde::{Deserialize, Serialize};

use crate::github::Workflow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowCategory {
    Test,
    Lint,
    Build,
    Deploy,
    Release,
    Security,
    Other,
}

impl WorkflowCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowCategory::Test => "test",
            WorkflowCategory::Lint => "lint",
            WorkflowCategory::Build => "build",
            WorkflowCategory::Deploy => "deploy",
            WorkflowCategory::Release => "release",
            WorkflowCategory::Security => "security",
            WorkflowCategory::Other => "other",
        }
    }
}

impl From<&str> for WorkflowCategory {
    fn from(value: &str) -> Self {
        match value {
            "test" => WorkflowCategory::Test,
            "lint" => WorkflowCategory::Lint,
            "build" => WorkflowCategory::Build,
            "deploy" => WorkflowCategory::Deploy,
            "release" => WorkflowCategory::Release,
            "security" => WorkflowCategory::Security,
            _ => WorkflowCategory::Other,
        }
    }
}

// First category with a matching word wins.
const KEYWORDS: &[(WorkflowCategory, &[&str])] = &[
    (
        WorkflowCategory::Security,
        &["codeql", "security", "audit", "scan", "snyk", "trivy"],
    ),
    (WorkflowCategory::Release, &["release", "publish", "changelog"]),
    (WorkflowCategory::Deploy, &["deploy", "deployment", "pages", "cd"]),
    (
        WorkflowCategory::Lint,
        &["lint", "linter", "eslint", "clippy", "fmt", "format", "prettier", "style"],
    ),
    (
        WorkflowCategory::Test,
        &["test", "tests", "testing", "ci", "coverage", "e2e", "unit", "integration", "check", "checks"],
    ),
    (WorkflowCategory::Build, &["build", "compile", "docker"]),
];

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_lowercase())
        .collect()
}

/// Guess what a workflow does from its display name and file name.
pub fn categorize_workflow(workflow: &Workflow) -> WorkflowCategory {
    let file_stem = workflow
        .path
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim_end_matches(".yml")
        .trim_end_matches(".yaml");

    let mut tokens = words(&workflow.name);
    tokens.extend(words(file_stem));

    KEYWORDS
        .iter()
        .find(|(_, keywords)| tokens.iter().any(|t| keywords.contains(&t.as_str())))
        .map(|(category, _)| *category)
        .unwrap_or(WorkflowCategory::Other)
}
