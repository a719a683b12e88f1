use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::job_role::JobRoleRow;
use crate::resume::analysis::{analyze_resume, AnalysisSettings};
use crate::resume::job_roles::NewJobRole;
use crate::resume::models::{AnalysisResult, AnalyzeResumeRequest};
use crate::state::AppState;

/// POST /api/resume/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeResumeRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    let settings = AnalysisSettings {
        max_file_size_bytes: state.config.resume_max_file_size_bytes,
        default_match_threshold: state.config.resume_match_threshold,
        fallback_threshold: state.config.gemini_safety_threshold,
    };

    let result = analyze_resume(
        state.fetcher.as_ref(),
        state.llm.as_ref(),
        state.job_roles.as_ref(),
        settings,
        request,
    )
    .await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRolesQuery {
    pub active_only: Option<bool>,
}

/// GET /api/resume/roles
///
/// Without `activeOnly` every role is returned.
pub async fn handle_list_roles(
    State(state): State<AppState>,
    Query(query): Query<ListRolesQuery>,
) -> Result<Json<Vec<JobRoleRow>>, AppError> {
    let roles = state
        .job_roles
        .list(query.active_only.unwrap_or(false))
        .await?;
    Ok(Json(roles))
}

/// POST /api/resume/roles
pub async fn handle_create_role(
    State(state): State<AppState>,
    Json(body): Json<NewJobRole>,
) -> Result<(StatusCode, Json<JobRoleRow>), AppError> {
    let role = state.job_roles.create(body.validated()?).await?;
    Ok((StatusCode::CREATED, Json(role)))
}
