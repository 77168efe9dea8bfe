use anyhow::Result;

use super::{connect, print_json, Command};
use crate::config::config;
use crate::github::RepoRef;

pub struct WorkflowsCommand {
    pub repo: String,
    pub json: bool,
}

impl WorkflowsCommand {
    pub fn new(repo: String, json: bool) -> Self {
        Self { repo, json }
    }
}

impl Command for WorkflowsCommand {
    async fn execute(&self) -> Result<()> {
        let config = config()?;
        let repo = RepoRef::parse(&self.repo)?;

        let dashboard = connect(config, self.json)?;
        let workflows = dashboard.workflows(&repo).await?;

        if self.json {
            return print_json(&workflows);
        }

        println!("⚙️  WORKFLOWS · {repo}");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        if workflows.is_empty() {
            println!("📭 No workflows defined");
        }
        for workflow in &workflows {
            let marker = if workflow.state == "active" { "🟢" } else { "⚪" };
            println!(
                "   {marker} {:<30} {:<9} {}",
                workflow.name,
                workflow.category.as_str(),
                workflow.path
            );
        }
        Ok(())
    }
}
