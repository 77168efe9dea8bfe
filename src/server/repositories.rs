use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::errors::ApiError;
use super::handlers::repo_ref;
use super::AppState;
use crate::github::RepoRef;
use crate::store::{Repository, RepositoryStore, StoreError, StoredWorkflow, User};

/// Header the upstream auth layer uses to name the signed-in user.
pub const USER_HEADER: &str = "x-omnilens-user";

/// Login taken from [`USER_HEADER`].
#[derive(Debug, Clone)]
pub struct UserLogin(pub String);

impl<S> FromRequestParts<S> for UserLogin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|login| !login.is_empty())
            .map(|login| UserLogin(login.to_string()))
            .ok_or_else(|| ApiError::Unauthenticated(format!("missing {USER_HEADER} header")))
    }
}

#[derive(Debug, Deserialize)]
pub struct AddRepository {
    /// `owner/name` or a GitHub URL
    pub repository: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RepositoryDetail {
    pub repository: Repository,
    pub workflows: Vec<StoredWorkflow>,
}

fn store(state: &AppState) -> Result<&RepositoryStore, ApiError> {
    state
        .store
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("repository store is not configured".to_string()))
}

/// An unknown user owns nothing, so lookups answer 404 without recording them.
async fn known_user(store: &RepositoryStore, login: &str, repo: &RepoRef) -> Result<User, ApiError> {
    store
        .find_user(login)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("repository {repo}")).into())
}

// GET /api/repositories
pub async fn list_repositories(
    State(state): State<AppState>,
    UserLogin(login): UserLogin,
) -> Result<Json<Vec<Repository>>, ApiError> {
    let store = store(&state)?;
    match store.find_user(&login).await? {
        Some(user) => Ok(Json(store.list_repositories(user.id).await?)),
        None => Ok(Json(Vec::new())),
    }
}

// POST /api/repositories
pub async fn add_repository(
    State(state): State<AppState>,
    UserLogin(login): UserLogin,
    Json(body): Json<AddRepository>,
) -> Result<(StatusCode, Json<RepositoryDetail>), ApiError> {
    let store = store(&state)?;
    let repo = RepoRef::parse(&body.repository)?;

    let info = state.dashboard.repository(&repo).await?;
    let workflows = state.dashboard.workflows(&repo).await?;

    let user = store.ensure_user(&login).await?;
    let (repository, workflows) = store.add_repository(user.id, &info, &workflows).await?;

    state.invalidate_repository(&repo).await;
    info!(user = %login, repository = %repo, workflows = workflows.len(), "Tracking repository");

    Ok((
        StatusCode::CREATED,
        Json(RepositoryDetail {
            repository,
            workflows,
        }),
    ))
}

// GET /api/repositories/{owner}/{repo}
pub async fn get_repository(
    State(state): State<AppState>,
    UserLogin(login): UserLogin,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Json<RepositoryDetail>, ApiError> {
    let store = store(&state)?;
    let repo = repo_ref(&owner, &repo)?;

    let user = known_user(store, &login, &repo).await?;
    let repository = store.get_repository(user.id, &repo.full_name()).await?;
    let workflows = store.list_workflows(repository.id).await?;

    Ok(Json(RepositoryDetail {
        repository,
        workflows,
    }))
}

// DELETE /api/repositories/{owner}/{repo}
pub async fn remove_repository(
    State(state): State<AppState>,
    UserLogin(login): UserLogin,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let store = store(&state)?;
    let repo = repo_ref(&owner, &repo)?;

    let user = known_user(store, &login, &repo).await?;
    store.remove_repository(user.id, &repo.full_name()).await?;
    state.invalidate_repository(&repo).await;

    Ok(StatusCode::NO_CONTENT)
}
