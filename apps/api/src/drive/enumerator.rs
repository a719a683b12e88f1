//! Lists files modified since a cutoff under a resolved folder.

use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::drive::client::{quote_query_value, DriveApi};
use crate::drive::models::{DriveFileSummary, FileListQuery, FOLDER_MIME_TYPE};
use crate::errors::AppError;

const PAGE_SIZE: u32 = 100;
const LIST_FIELDS: &str = "files(id,name,mimeType,createdTime,modifiedTime,size),nextPageToken";

pub fn recent_files_filter(
    folder_id: &str,
    since: DateTime<Utc>,
    mime_types: &[String],
) -> String {
    let mut conditions = vec![
        format!("{} in parents", quote_query_value(folder_id)),
        format!("mimeType != '{FOLDER_MIME_TYPE}'"),
        "trashed = false".to_string(),
        format!(
            "modifiedTime >= '{}'",
            since.to_rfc3339_opts(SecondsFormat::Millis, true)
        ),
    ];

    let allowed: Vec<String> = mime_types
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(|m| format!("mimeType = {}", quote_query_value(m)))
        .collect();
    if !allowed.is_empty() {
        conditions.push(format!("({})", allowed.join(" or ")));
    }

    conditions.join(" and ")
}

/// Pages through every file under `folder_id` modified at or after `since`, newest first.
///
/// Each listed file also gets a best-effort public-read grant. Grants within a page run
/// concurrently; a failed grant is logged and the file is still returned.
pub async fn list_files_since(
    api: &dyn DriveApi,
    token: &str,
    folder_id: &str,
    since: DateTime<Utc>,
    mime_types: &[String],
) -> Result<Vec<DriveFileSummary>, AppError> {
    let mut query = FileListQuery {
        q: recent_files_filter(folder_id, since, mime_types),
        fields: LIST_FIELDS,
        page_size: PAGE_SIZE,
        order_by: Some("modifiedTime desc"),
        page_token: None,
        all_drives: true,
    };

    let mut summaries = Vec::new();

    loop {
        let page = api.list_files(token, &query).await?;

        let page_summaries: Vec<DriveFileSummary> = page
            .files
            .into_iter()
            .filter_map(DriveFileSummary::from_drive_file)
            .collect();

        let failed = grant_public_read_all(api, token, &page_summaries).await;
        if failed > 0 {
            warn!(
                "Public access grant failed for {failed} of {} files in folder {folder_id}",
                page_summaries.len()
            );
        }
        summaries.extend(page_summaries);

        match page.next_page_token.filter(|t| !t.is_empty()) {
            Some(next) => query.page_token = Some(next),
            None => break,
        }
    }

    debug!(
        "Found {} files modified since {since} in folder {folder_id}",
        summaries.len()
    );
    Ok(summaries)
}

/// Returns the number of grants that failed.
async fn grant_public_read_all(
    api: &dyn DriveApi,
    token: &str,
    files: &[DriveFileSummary],
) -> usize {
    let results = join_all(
        files
            .iter()
            .map(|file| async move { (file, api.grant_public_read(token, &file.id).await) }),
    )
    .await;

    let mut failures = 0;
    for (file, result) in results {
        match result {
            Ok(()) => debug!("Set public access for file: {} ({})", file.name, file.id),
            Err(e) => {
                failures += 1;
                warn!("Failed to set public access for file {}: {e}", file.id);
            }
        }
    }
    failures
}
