use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
pub const DEFAULT_FILE_NAME: &str = "Untitled";
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A file as returned by the Drive `files.list` endpoint. Every field but `id` is optional
/// because the API omits fields it has no value for.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: Option<String>,
    pub name: Option<String>,
    pub mime_type: Option<String>,
    pub created_time: Option<DateTime<Utc>>,
    pub modified_time: Option<DateTime<Utc>>,
    /// int64 encoded as a JSON string.
    pub size: Option<String>,
}

/// One page of a `files.list` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListPage {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    pub next_page_token: Option<String>,
}

/// Parameters for a single `files.list` call.
#[derive(Debug, Clone, PartialEq)]
pub struct FileListQuery {
    pub q: String,
    pub fields: &'static str,
    pub page_size: u32,
    pub order_by: Option<&'static str>,
    pub page_token: Option<String>,
    pub all_drives: bool,
}

/// Listing entry handed back to callers. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFileSummary {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub created_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    pub web_view_link: String,
    pub download_url: String,
}

pub fn web_view_link(file_id: &str) -> String {
    format!("https://drive.google.com/file/d/{file_id}/view")
}

pub fn download_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?id={file_id}&export=download")
}

impl DriveFileSummary {
    /// Maps a raw record, filling documented defaults. Records without an id are skipped.
    pub fn from_drive_file(file: DriveFile) -> Option<Self> {
        let id = file.id.filter(|id| !id.is_empty())?;
        let created_time = file.created_time.unwrap_or_else(Utc::now);
        let modified_time = file.modified_time.unwrap_or(created_time);

        Some(Self {
            web_view_link: web_view_link(&id),
            download_url: download_url(&id),
            name: file.name.unwrap_or_else(|| DEFAULT_FILE_NAME.to_string()),
            mime_type: file
                .mime_type
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
            created_time,
            modified_time,
            size_bytes: file.size.and_then(|s| s.parse().ok()),
            id,
        })
    }
}
