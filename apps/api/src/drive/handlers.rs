//! Axum route handlers for the Drive listing API.

use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use serde::Deserialize;

use crate::drive::models::DriveFileSummary;
use crate::drive::path::FolderPath;
use crate::drive::{list_recent_files, FolderLocator, ListRecentFilesRequest, DEFAULT_SINCE_MINUTES};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFilesQuery {
    pub folder_path: Option<String>,
    pub folder_id: Option<String>,
    pub since_minutes: Option<i64>,
    /// Comma-separated mime type allow-list.
    pub mime_types: Option<String>,
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized(
                "No OAuth token found. Send it as 'Authorization: Bearer <token>'".to_string(),
            )
        })?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => {
            Ok(token.to_string())
        }
        _ => Err(AppError::Unauthorized(
            "Authorization header must use the Bearer scheme".to_string(),
        )),
    }
}

fn folder_locator(query: &RecentFilesQuery) -> Result<FolderLocator, AppError> {
    let folder_id = query.folder_id.as_deref().map(str::trim).filter(|s| !s.is_empty());
    match (folder_id, query.folder_path.as_deref()) {
        (Some(_), Some(_)) => Err(AppError::Validation(
            "Provide either folderPath or folderId, not both".to_string(),
        )),
        (Some(id), None) => Ok(FolderLocator::Id(id.to_string())),
        (None, Some(path)) => Ok(FolderLocator::Path(FolderPath::parse(path)?)),
        (None, None) => Err(AppError::InvalidFolderPath(
            "Provide a valid folderPath (e.g. \"MyDrive>JobApplication>Resume\")".to_string(),
        )),
    }
}

/// GET /api/resume/drive/recent
///
/// Lists files from a Drive folder modified within the look-back window.
pub async fn handle_recent_files(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RecentFilesQuery>,
) -> Result<Json<Vec<DriveFileSummary>>, AppError> {
    let token = extract_bearer_token(&headers)?;

    let request = ListRecentFilesRequest {
        folder: folder_locator(&query)?,
        since_minutes: query.since_minutes.unwrap_or(DEFAULT_SINCE_MINUTES),
        mime_types: query
            .mime_types
            .as_deref()
            .map(|raw| raw.split(',').map(|m| m.trim().to_string()).collect())
            .unwrap_or_default(),
    };

    let files = list_recent_files(state.drive.as_ref(), &token, &request).await?;
    Ok(Json(files))
}
