use std::sync::Arc;

use crate::config::Config;
use crate::drive::client::DriveApi;
use crate::llm_client::GenerativeModel;
use crate::resume::downloader::ResumeFetcher;
use crate::resume::job_roles::JobRoleStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every outbound dependency sits behind a trait object so handlers never name a
/// concrete client.
#[derive(Clone)]
pub struct AppState {
    pub job_roles: Arc<dyn JobRoleStore>,
    /// Google Drive v3. The OAuth token is supplied per request, never stored here.
    pub drive: Arc<dyn DriveApi>,
    pub fetcher: Arc<dyn ResumeFetcher>,
    pub llm: Arc<dyn GenerativeModel>,
    pub config: Config,
}
