//! Resolves folder path segments to a folder id, one level at a time.

use tracing::{debug, warn};

use crate::drive::client::{quote_query_value, DriveApi};
use crate::drive::models::{FileListQuery, FOLDER_MIME_TYPE};
use crate::drive::path::FolderPath;
use crate::errors::AppError;

const ROOT_PARENT: &str = "root";

fn child_folder_query(name: &str, parent_id: &str) -> FileListQuery {
    let q = [
        format!("name = {}", quote_query_value(name)),
        format!("{} in parents", quote_query_value(parent_id)),
        format!("mimeType = '{FOLDER_MIME_TYPE}'"),
        "trashed = false".to_string(),
    ]
    .join(" and ");

    FileListQuery {
        q,
        fields: "files(id)",
        page_size: 2,
        order_by: None,
        page_token: None,
        all_drives: false,
    }
}

/// Walks `path` from the account root. When several folders share a name the first one
/// returned by Drive wins; no secondary ordering is applied.
pub async fn resolve_folder_id(
    api: &dyn DriveApi,
    token: &str,
    path: &FolderPath,
) -> Result<String, AppError> {
    let mut parent_id = ROOT_PARENT.to_string();

    for segment in path.segments() {
        let page = api
            .list_files(token, &child_folder_query(segment, &parent_id))
            .await?;

        if page.files.len() > 1 {
            debug!("Folder name \"{segment}\" is ambiguous under {parent_id}; using first match");
        }

        parent_id = match page.files.into_iter().next().and_then(|f| f.id) {
            Some(id) => id,
            None => {
                warn!("Folder segment \"{segment}\" not found under {parent_id}");
                return Err(AppError::FolderNotFound(segment.clone()));
            }
        };
    }

    Ok(parent_id)
}
