// Drive listing: folder path → folder id → recently modified files.
// All Drive calls go through the `DriveApi` trait in client.rs.

pub mod client;
pub mod enumerator;
pub mod handlers;
pub mod models;
pub mod path;
pub mod walker;

use chrono::{Duration, Utc};
use tracing::debug;

use crate::errors::AppError;
use client::DriveApi;
use models::DriveFileSummary;
use path::FolderPath;

pub const MAX_SINCE_MINUTES: i64 = 1440;
pub const DEFAULT_SINCE_MINUTES: i64 = 60;

/// Where to list from: a folder id used as-is, or a path walked from the root.
#[derive(Debug, Clone)]
pub enum FolderLocator {
    Id(String),
    Path(FolderPath),
}

#[derive(Debug, Clone)]
pub struct ListRecentFilesRequest {
    pub folder: FolderLocator,
    pub since_minutes: i64,
    pub mime_types: Vec<String>,
}

/// Lists files in the located folder modified in the last `since_minutes` minutes.
pub async fn list_recent_files(
    api: &dyn DriveApi,
    token: &str,
    request: &ListRecentFilesRequest,
) -> Result<Vec<DriveFileSummary>, AppError> {
    if !(1..=MAX_SINCE_MINUTES).contains(&request.since_minutes) {
        return Err(AppError::Validation(format!(
            "sinceMinutes must be between 1 and {MAX_SINCE_MINUTES}"
        )));
    }
    if token.trim().is_empty() {
        return Err(AppError::Unauthorized(
            "A Google OAuth bearer token is required".to_string(),
        ));
    }

    debug!(
        "Accessing Google Drive with token {}...",
        token.chars().take(8).collect::<String>()
    );

    let folder_id = match &request.folder {
        FolderLocator::Id(id) => id.clone(),
        FolderLocator::Path(path) => walker::resolve_folder_id(api, token, path).await?,
    };
    debug!("Resolved folder ID: {folder_id}");

    let since = Utc::now() - Duration::minutes(request.since_minutes);
    enumerator::list_files_since(api, token, &folder_id, since, &request.mime_types).await
}
