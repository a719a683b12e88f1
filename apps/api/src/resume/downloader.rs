//! Resume Downloader — fetches raw resume bytes from a URL.
//!
//! Drive share links are rewritten to direct-download form and Google Docs links to a
//! PDF export. When Drive answers with its "can't scan for viruses" interstitial, the
//! confirmation token is lifted from the page and the request is reissued exactly once.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{header, Client, Url};
use tracing::{debug, info, warn};

use crate::errors::AppError;

const DOWNLOAD_TIMEOUT_SECS: u64 = 15;
const DRIVE_HOST: &str = "drive.google.com";
const DOCS_HOST: &str = "docs.google.com";
const INTERSTITIAL_MARKERS: &[&str] = &["download_warning", "uc-download-link", "drive-viewer"];
const CONFIRM_PARAM: &str = "confirm";

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub content_type: Option<String>,
    pub set_cookies: Vec<String>,
    pub body: Bytes,
}

/// Single GET against a resume URL.
#[async_trait]
pub trait ResumeFetcher: Send + Sync {
    async fn get(&self, url: &str, cookie: Option<&str>) -> Result<FetchedResponse, AppError>;
}

/// reqwest-backed fetcher that refuses bodies over `max_bytes` while reading.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(max_bytes: u64) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, max_bytes })
    }
}

#[async_trait]
impl ResumeFetcher for HttpFetcher {
    async fn get(&self, url: &str, cookie: Option<&str>) -> Result<FetchedResponse, AppError> {
        let mut request = self.client.get(url);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let mut response = request
            .send()
            .await
            .map_err(|e| AppError::from_transport("Resume download", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "Resume download from {url} failed with status {status}"
            )));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(AppError::SizeLimitExceeded {
                    size: length,
                    limit: self.max_bytes,
                });
            }
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let set_cookies = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect();

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AppError::from_transport("Resume download", e))?
        {
            let size = (body.len() + chunk.len()) as u64;
            if size > self.max_bytes {
                return Err(AppError::SizeLimitExceeded {
                    size,
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchedResponse {
            content_type,
            set_cookies,
            body: body.freeze(),
        })
    }
}

/// Raw resume bytes plus the content type the server declared.
#[derive(Debug, Clone)]
pub struct DownloadedResume {
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// Downloads `resume_url`, bypassing the Drive confirmation page at most once.
pub async fn download_resume(
    fetcher: &dyn ResumeFetcher,
    resume_url: &str,
) -> Result<DownloadedResume, AppError> {
    let normalized = normalize_resume_url(resume_url);
    if normalized != resume_url {
        debug!("Normalized resume URL {resume_url} -> {normalized}");
    }

    let first = fetcher.get(&normalized, None).await?;
    if !is_confirmation_interstitial(&first) {
        return Ok(DownloadedResume {
            body: first.body,
            content_type: first.content_type,
        });
    }

    let html = String::from_utf8_lossy(&first.body);
    let token = find_confirm_token(&html).ok_or_else(|| {
        AppError::DownloadConfirmationFailed(
            "Google Drive file requires confirmation and could not be downloaded automatically"
                .to_string(),
        )
    })?;
    info!("Drive confirmation page detected, retrying download with confirm token");

    let confirm_url = with_confirm_token(&normalized, token)?;
    let cookie = cookie_header(&first.set_cookies);
    let second = fetcher.get(&confirm_url, cookie.as_deref()).await?;

    Ok(DownloadedResume {
        body: second.body,
        content_type: second.content_type,
    })
}

/// Rewrites Drive and Docs links to their direct-download form. Anything else, including
/// unparsable input, is returned unchanged.
pub fn normalize_resume_url(raw: &str) -> String {
    let Ok(parsed) = Url::parse(raw) else {
        warn!("Failed to parse resume URL for normalization: {raw}");
        return raw.to_string();
    };

    match parsed.host_str() {
        Some(DRIVE_HOST) => match extract_drive_file_id(&parsed) {
            Some(id) => format!("https://{DRIVE_HOST}/uc?export=download&id={id}"),
            None => raw.to_string(),
        },
        Some(DOCS_HOST) if parsed.path().contains("/document/") => {
            match extract_drive_file_id(&parsed) {
                Some(id) => format!("https://{DOCS_HOST}/document/d/{id}/export?format=pdf"),
                None => raw.to_string(),
            }
        }
        _ => raw.to_string(),
    }
}

/// Finds the id in `/d/<id>/...` or, failing that, the `id` query parameter.
fn extract_drive_file_id(url: &Url) -> Option<String> {
    let mut segments = url.path().split('/').filter(|s| !s.is_empty());
    if segments.any(|s| s == "d") {
        if let Some(id) = segments.next() {
            return Some(id.to_string());
        }
    }

    url.query_pairs()
        .find(|(key, value)| key == "id" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

/// HTML responses carrying one of Drive's warning-page markers.
pub fn is_confirmation_interstitial(response: &FetchedResponse) -> bool {
    let is_html = response
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"));
    if !is_html {
        return false;
    }

    let html = String::from_utf8_lossy(&response.body).to_lowercase();
    INTERSTITIAL_MARKERS.iter().any(|m| html.contains(m))
}

/// First non-empty `confirm=<token>` in the page, token chars `[0-9A-Za-z_]`.
pub fn find_confirm_token(html: &str) -> Option<&str> {
    let needle = "confirm=";
    let mut offset = 0;
    while let Some(pos) = html[offset..].find(needle) {
        let start = offset + pos + needle.len();
        let len = html[start..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(html.len() - start);
        if len > 0 {
            return Some(&html[start..start + len]);
        }
        offset = start;
    }
    None
}

fn with_confirm_token(url: &str, token: &str) -> Result<String, AppError> {
    let mut parsed = Url::parse(url)
        .map_err(|e| AppError::Validation(format!("Invalid resume URL {url}: {e}")))?;

    let retained: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != CONFIRM_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(CONFIRM_PARAM, token);

    Ok(parsed.into())
}

/// Joins the `name=value` part of each Set-Cookie header into one Cookie header.
fn cookie_header(set_cookies: &[String]) -> Option<String> {
    let pairs: Vec<&str> = set_cookies
        .iter()
        .filter_map(|c| c.split(';').next())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}
