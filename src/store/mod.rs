//! Per-user repository and workflow records, persisted in SQLite.

pub mod errors;
pub mod models;

pub use errors::StoreError;
pub use models::{Repository, StoredWorkflow, User};

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::str::FromStr;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::coverage::WorkflowCategory;
use crate::dashboard::CategorizedWorkflow;
use crate::github::RepositoryInfo;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct RepositoryStore {
    pool: SqlitePool,
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        login: row.try_get("login")?,
        created_at: row.try_get("created_at")?,
    })
}

fn repository_from_row(row: &SqliteRow) -> Result<Repository> {
    Ok(Repository {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        github_id: row.try_get("github_id")?,
        full_name: row.try_get("full_name")?,
        html_url: row.try_get("html_url")?,
        default_branch: row.try_get("default_branch")?,
        private: row.try_get("private")?,
        added_at: row.try_get("added_at")?,
    })
}

fn workflow_from_row(row: &SqliteRow) -> Result<StoredWorkflow> {
    let category: String = row.try_get("category")?;
    Ok(StoredWorkflow {
        id: row.try_get("id")?,
        repository_id: row.try_get("repository_id")?,
        github_id: row.try_get("github_id")?,
        name: row.try_get("name")?,
        path: row.try_get("path")?,
        state: row.try_get("state")?,
        category: WorkflowCategory::from(category.as_str()),
    })
}

impl RepositoryStore {
    /// Open the configured database, creating the file and running
    /// migrations when enabled.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening repository store at {}", config.url);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        let store = Self { pool };
        if config.auto_migrate {
            store.migrate().await?;
        }
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Fetch a user by login, creating it on first sight.
    pub async fn ensure_user(&self, login: &str) -> Result<User> {
        sqlx::query(
            r#"
            INSERT INTO users (login, created_at)
            VALUES (?1, ?2)
            ON CONFLICT(login) DO NOTHING
            "#,
        )
        .bind(login)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT id, login, created_at FROM users WHERE login = ?1")
            .bind(login)
            .fetch_one(&self.pool)
            .await?;

        user_from_row(&row)
    }

    /// Look a user up without creating it.
    pub async fn find_user(&self, login: &str) -> Result<Option<User>> {
        sqlx::query("SELECT id, login, created_at FROM users WHERE login = ?1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    /// Record a repository together with its workflows. Either both land or
    /// neither does.
    pub async fn add_repository(
        &self,
        user_id: i64,
        info: &RepositoryInfo,
        workflows: &[CategorizedWorkflow],
    ) -> Result<(Repository, Vec<StoredWorkflow>)> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO repositories
                (user_id, github_id, full_name, html_url, default_branch, private, added_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(user_id)
        .bind(info.id as i64)
        .bind(&info.full_name)
        .bind(&info.html_url)
        .bind(&info.default_branch)
        .bind(info.private)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict(_) => StoreError::Conflict(format!("repository {}", info.full_name)),
            other => other,
        })?;

        let row = sqlx::query("SELECT * FROM repositories WHERE id = ?1")
            .bind(result.last_insert_rowid())
            .fetch_one(&mut *tx)
            .await?;
        let repository = repository_from_row(&row)?;

        insert_workflows(&mut *tx, repository.id, workflows).await?;
        tx.commit().await?;

        info!(
            user_id = user_id,
            repository = %info.full_name,
            workflows = workflows.len(),
            "Repository added"
        );
        let workflows = self.list_workflows(repository.id).await?;
        Ok((repository, workflows))
    }

    pub async fn list_repositories(&self, user_id: i64) -> Result<Vec<Repository>> {
        let rows = sqlx::query("SELECT * FROM repositories WHERE user_id = ?1 ORDER BY full_name ASC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(repository_from_row).collect()
    }

    pub async fn get_repository(&self, user_id: i64, full_name: &str) -> Result<Repository> {
        let row = sqlx::query("SELECT * FROM repositories WHERE user_id = ?1 AND full_name = ?2")
            .bind(user_id)
            .bind(full_name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("repository {full_name}")))?;

        repository_from_row(&row)
    }

    /// Remove a repository and the workflows recorded for it.
    pub async fn remove_repository(&self, user_id: i64, full_name: &str) -> Result<()> {
        let repository = self.get_repository(user_id, full_name).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM workflows WHERE repository_id = ?1")
            .bind(repository.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM repositories WHERE id = ?1")
            .bind(repository.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(user_id = user_id, repository = %full_name, "Repository removed");
        Ok(())
    }

    /// Swap the recorded workflows of a repository for a fresh listing.
    pub async fn replace_workflows(
        &self,
        repository_id: i64,
        workflows: &[CategorizedWorkflow],
    ) -> Result<Vec<StoredWorkflow>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM workflows WHERE repository_id = ?1")
            .bind(repository_id)
            .execute(&mut *tx)
            .await?;
        insert_workflows(&mut *tx, repository_id, workflows).await?;

        tx.commit().await?;
        self.list_workflows(repository_id).await
    }

    pub async fn list_workflows(&self, repository_id: i64) -> Result<Vec<StoredWorkflow>> {
        let rows = sqlx::query("SELECT * FROM workflows WHERE repository_id = ?1 ORDER BY name ASC, github_id ASC")
            .bind(repository_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(workflow_from_row).collect()
    }

    /// Close database connections gracefully
    pub async fn shutdown(&self) {
        info!("Shutting down database connections...");
        self.pool.close().await;
        info!("Database connections closed");
    }
}

// A duplicate workflow id is a broken listing, not a duplicate repository,
// so it stays a plain database error.
async fn insert_workflows(
    conn: &mut SqliteConnection,
    repository_id: i64,
    workflows: &[CategorizedWorkflow],
) -> Result<()> {
    for workflow in workflows {
        sqlx::query(
            r#"
            INSERT INTO workflows (repository_id, github_id, name, path, state, category)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(repository_id)
        .bind(workflow.id as i64)
        .bind(&workflow.name)
        .bind(&workflow.path)
        .bind(&workflow.state)
        .bind(workflow.category.as_str())
        .execute(&mut *conn)
        .await
        .map_err(StoreError::Database)?;
    }
    Ok(())
}
