use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use super::errors::ApiError;
use super::AppState;
use crate::coverage::CoverageDetection;
use crate::dashboard::{AutoDetectReport, CategorizedWorkflow, MAX_WINDOW_DAYS};
use crate::github::RepoRef;
use crate::metrics::{DailyOverview, UsageReport, WorkflowStats};

/// Fixed offsets beyond ±14h do not exist.
pub const MAX_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct OverviewQuery {
    pub date: Option<NaiveDate>,
    pub offset_minutes: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CoverageQuery {
    pub run_id: Option<u64>,
}

pub(crate) fn repo_ref(owner: &str, repo: &str) -> Result<RepoRef, ApiError> {
    Ok(RepoRef::parse(&format!("{owner}/{repo}"))?)
}

fn window_days(requested: Option<u32>, default: u32) -> Result<u32, ApiError> {
    let days = requested.unwrap_or(default);
    if (1..=MAX_WINDOW_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(ApiError::BadRequest(format!(
            "days must be between 1 and {MAX_WINDOW_DAYS}"
        )))
    }
}

// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// GET /api/repos/{owner}/{repo}/workflows
pub async fn workflows(
    State(state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Json<Vec<CategorizedWorkflow>>, ApiError> {
    let repo = repo_ref(&owner, &repo)?;
    Ok(Json(state.dashboard.workflows(&repo).await?))
}

// GET /api/repos/{owner}/{repo}/usage?days=N
pub async fn usage(
    State(state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<UsageReport>, ApiError> {
    let repo = repo_ref(&owner, &repo)?;
    let days = window_days(query.days, state.dashboard.config().default_window_days)?;
    Ok(Json(state.dashboard.usage(&repo, days).await?))
}

// GET /api/repos/{owner}/{repo}/stats?days=N
pub async fn stats(
    State(state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<WorkflowStats>>, ApiError> {
    let repo = repo_ref(&owner, &repo)?;
    let days = window_days(query.days, state.dashboard.config().default_window_days)?;
    Ok(Json(state.dashboard.workflow_stats(&repo, days).await?))
}

// GET /api/repos/{owner}/{repo}/overview?date=YYYY-MM-DD&offset_minutes=M
pub async fn overview(
    State(state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<OverviewQuery>,
) -> Result<Json<DailyOverview>, ApiError> {
    let repo = repo_ref(&owner, &repo)?;
    let offset_minutes = query.offset_minutes.unwrap_or(0);
    if offset_minutes.abs() > MAX_OFFSET_MINUTES {
        return Err(ApiError::BadRequest(format!(
            "offset_minutes must be within ±{MAX_OFFSET_MINUTES}"
        )));
    }

    let date = query
        .date
        .unwrap_or_else(|| (Utc::now() + Duration::minutes(offset_minutes as i64)).date_naive());

    Ok(Json(
        state
            .dashboard
            .daily_overview(&repo, date, offset_minutes)
            .await?,
    ))
}

// GET /api/repos/{owner}/{repo}/detect?run_id=N
pub async fn detect(
    State(state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<CoverageQuery>,
) -> Result<Json<AutoDetectReport>, ApiError> {
    let repo = repo_ref(&owner, &repo)?;
    Ok(Json(state.dashboard.auto_detect(&repo, query.run_id).await?))
}

// GET /api/repos/{owner}/{repo}/coverage?run_id=N
pub async fn coverage(
    State(state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<CoverageQuery>,
) -> Result<Json<CoverageDetection>, ApiError> {
    let repo = repo_ref(&owner, &repo)?;
    Ok(Json(state.dashboard.coverage(&repo, query.run_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_days_bounds() {
        assert_eq!(window_days(None, 30).unwrap(), 30);
        assert_eq!(window_days(Some(90), 30).unwrap(), 90);
        assert!(window_days(Some(0), 30).is_err());
        assert!(window_days(Some(91), 30).is_err());
    }

    #[test]
    fn test_repo_ref_rejects_bad_segments() {
        assert!(repo_ref("octo", "repo").is_ok());
        assert!(repo_ref("oc to", "repo").is_err());
    }
}
