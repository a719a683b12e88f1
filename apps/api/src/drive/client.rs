//! Drive v3 REST client. The bearer token travels with each call and is never stored.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::drive::models::{FileListPage, FileListQuery};
use crate::errors::AppError;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Drive API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<DriveError> for AppError {
    fn from(err: DriveError) -> Self {
        match err {
            DriveError::Http(e) => AppError::from_transport("Google Drive", e),
            DriveError::Api { status: 401, message } => AppError::Unauthorized(format!(
                "Google OAuth token is invalid or expired ({message}). Check that the token \
                 carries the drive scope, has not expired, and that the Drive API is enabled"
            )),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

/// The subset of the Drive API the listing pipeline needs.
#[async_trait]
pub trait DriveApi: Send + Sync {
    async fn list_files(&self, token: &str, query: &FileListQuery)
        -> Result<FileListPage, DriveError>;

    /// Grants "anyone with the link" reader access to a file.
    async fn grant_public_read(&self, token: &str, file_id: &str) -> Result<(), DriveError>;
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct DriveClient {
    client: Client,
}

impl DriveClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

async fn api_error(response: reqwest::Response) -> DriveError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    DriveError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl DriveApi for DriveClient {
    async fn list_files(
        &self,
        token: &str,
        query: &FileListQuery,
    ) -> Result<FileListPage, DriveError> {
        let mut params: Vec<(&str, String)> = vec![
            ("q", query.q.clone()),
            ("fields", query.fields.to_string()),
            ("pageSize", query.page_size.to_string()),
        ];
        if let Some(order_by) = query.order_by {
            params.push(("orderBy", order_by.to_string()));
        }
        if let Some(page_token) = &query.page_token {
            params.push(("pageToken", page_token.clone()));
        }
        if query.all_drives {
            params.push(("supportsAllDrives", "true".to_string()));
            params.push(("includeItemsFromAllDrives", "true".to_string()));
        }

        let response = self
            .client
            .get(format!("{DRIVE_API_BASE}/files"))
            .bearer_auth(token)
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn grant_public_read(&self, token: &str, file_id: &str) -> Result<(), DriveError> {
        let response = self
            .client
            .post(format!("{DRIVE_API_BASE}/files/{file_id}/permissions"))
            .bearer_auth(token)
            .query(&[("supportsAllDrives", "true")])
            .json(&json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(()),
            // An identical permission already exists.
            StatusCode::CONFLICT => Ok(()),
            _ => Err(api_error(response).await),
        }
    }
}

/// Quotes a value for a Drive query string literal.
pub fn quote_query_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}
