use anyhow::{anyhow, Result};

use super::{connect, print_json, Command};
use crate::cli::ReposAction;
use crate::config::config;
use crate::github::RepoRef;
use crate::store::RepositoryStore;

pub struct ReposCommand {
    pub user: String,
    pub action: ReposAction,
    pub json: bool,
}

impl ReposCommand {
    pub fn new(user: String, action: ReposAction, json: bool) -> Self {
        Self { user, action, json }
    }

    async fn open_store() -> Result<RepositoryStore> {
        let db = config()?
            .database
            .as_ref()
            .ok_or_else(|| anyhow!("database is not configured"))?;
        Ok(RepositoryStore::connect(db).await?)
    }
}

impl Command for ReposCommand {
    async fn execute(&self) -> Result<()> {
        let store = Self::open_store().await?;

        match &self.action {
            ReposAction::Add { repo } => {
                let repo = RepoRef::parse(repo)?;
                let user = store.ensure_user(&self.user).await?;
                let dashboard = connect(config()?, self.json)?;

                let info = dashboard.repository(&repo).await?;
                let workflows = dashboard.workflows(&repo).await?;
                let (repository, workflows) = store.add_repository(user.id, &info, &workflows).await?;

                if self.json {
                    print_json(&repository)?;
                } else {
                    println!(
                        "✅ Tracking {} ({} workflow(s))",
                        repository.full_name,
                        workflows.len()
                    );
                }
            }
            ReposAction::List => {
                let repositories = match store.find_user(&self.user).await? {
                    Some(user) => store.list_repositories(user.id).await?,
                    None => Vec::new(),
                };
                if self.json {
                    print_json(&repositories)?;
                } else if repositories.is_empty() {
                    println!("📭 No tracked repositories for {}", self.user);
                } else {
                    println!("📚 Tracked repositories for {}", self.user);
                    for repository in &repositories {
                        let workflows = store.list_workflows(repository.id).await?;
                        println!(
                            "   {:<40} {:>3} workflow(s)  added {}",
                            repository.full_name,
                            workflows.len(),
                            repository.added_at.format("%Y-%m-%d")
                        );
                    }
                }
            }
            ReposAction::Remove { repo } => {
                let repo = RepoRef::parse(repo)?;
                let user = store
                    .find_user(&self.user)
                    .await?
                    .ok_or_else(|| anyhow!("{} is not tracking {repo}", self.user))?;
                store.remove_repository(user.id, &repo.full_name()).await?;
                if !self.json {
                    println!("🗑️  Stopped tracking {repo}");
                }
            }
        }

        store.shutdown().await;
        Ok(())
    }
}
