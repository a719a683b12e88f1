//! In-memory stand-ins for the outbound seams, shared by unit tests.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::drive::client::{quote_query_value, DriveApi, DriveError};
use crate::drive::models::{DriveFile, FileListPage, FileListQuery, FOLDER_MIME_TYPE};
use crate::errors::AppError;
use crate::llm_client::{GenerativeModel, LlmError};
use crate::models::job_role::JobRoleRow;
use crate::resume::downloader::{FetchedResponse, ResumeFetcher};
use crate::resume::job_roles::{JobRoleStore, NewJobRole};
use crate::state::AppState;

pub fn job_role(title: &str, department: &str) -> JobRoleRow {
    let now = Utc::now();
    JobRoleRow {
        id: Uuid::new_v4(),
        title: title.to_string(),
        department: department.to_string(),
        summary: format!("{title} summary"),
        requirements: "- Relevant experience".to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Drive double. Folder lookups are answered from `(parent, name, id)` triples, file
/// listings from pre-baked pages chained with `page-N` cursors.
#[derive(Default)]
pub struct FakeDrive {
    folders: Vec<(String, String, String)>,
    pages: Vec<Vec<DriveFile>>,
    failing_grants: HashSet<String>,
    queries: Mutex<Vec<FileListQuery>>,
    grants: Mutex<Vec<String>>,
}

impl FakeDrive {
    pub fn with_folder(mut self, parent: &str, name: &str, id: &str) -> Self {
        self.folders
            .push((parent.to_string(), name.to_string(), id.to_string()));
        self
    }

    pub fn with_file_pages(mut self, pages: Vec<Vec<DriveFile>>) -> Self {
        self.pages = pages;
        self
    }

    pub fn failing_grant(mut self, file_id: &str) -> Self {
        self.failing_grants.insert(file_id.to_string());
        self
    }

    pub fn list_queries(&self) -> Vec<FileListQuery> {
        self.queries.lock().unwrap().clone()
    }

    /// Ids that were successfully granted, in completion order.
    pub fn granted(&self) -> Vec<String> {
        self.grants.lock().unwrap().clone()
    }

    fn folder_page(&self, q: &str) -> FileListPage {
        let files = self
            .folders
            .iter()
            .filter(|(parent, name, _)| {
                q.contains(&format!("name = {}", quote_query_value(name)))
                    && q.contains(&format!("{} in parents", quote_query_value(parent)))
            })
            .map(|(_, name, id)| DriveFile {
                id: Some(id.clone()),
                name: Some(name.clone()),
                mime_type: Some(FOLDER_MIME_TYPE.to_string()),
                ..Default::default()
            })
            .collect();
        FileListPage {
            files,
            next_page_token: None,
        }
    }

    fn file_page(&self, page_token: Option<&str>) -> FileListPage {
        let index = page_token
            .and_then(|t| t.strip_prefix("page-"))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        let next_page_token = (index + 1 < self.pages.len()).then(|| format!("page-{}", index + 1));
        FileListPage {
            files: self.pages.get(index).cloned().unwrap_or_default(),
            next_page_token,
        }
    }
}

#[async_trait]
impl DriveApi for FakeDrive {
    async fn list_files(&self, _token: &str, query: &FileListQuery) -> Result<FileListPage, DriveError> {
        self.queries.lock().unwrap().push(query.clone());
        if query.q.contains(&format!("mimeType = '{FOLDER_MIME_TYPE}'")) {
            Ok(self.folder_page(&query.q))
        } else {
            Ok(self.file_page(query.page_token.as_deref()))
        }
    }

    async fn grant_public_read(&self, _token: &str, file_id: &str) -> Result<(), DriveError> {
        if self.failing_grants.contains(file_id) {
            return Err(DriveError::Api {
                status: 403,
                message: "insufficientFilePermissions".to_string(),
            });
        }
        self.grants.lock().unwrap().push(file_id.to_string());
        Ok(())
    }
}

/// Replays queued responses in order and records each `(url, cookie)` request.
pub struct FakeFetcher {
    responses: Mutex<VecDeque<FetchedResponse>>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeFetcher {
    pub fn new(responses: Vec<FetchedResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResumeFetcher for FakeFetcher {
    async fn get(&self, url: &str, cookie: Option<&str>) -> Result<FetchedResponse, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), cookie.map(str::to_string)));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::Upstream(format!("no canned response for {url}")))
    }
}

pub struct FakeModel {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for FakeModel {
    fn model_id(&self) -> &str {
        "models/fake-model"
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

/// Job-role store with the same ordering and uniqueness rules as the Postgres table.
#[derive(Default)]
pub struct InMemoryJobRoles {
    roles: Mutex<Vec<JobRoleRow>>,
}

#[async_trait]
impl JobRoleStore for InMemoryJobRoles {
    async fn list(&self, active_only: bool) -> Result<Vec<JobRoleRow>, AppError> {
        let mut roles: Vec<_> = self
            .roles
            .lock()
            .unwrap()
            .iter()
            .filter(|r| !active_only || r.is_active)
            .cloned()
            .collect();
        roles.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(roles)
    }

    async fn create(&self, role: NewJobRole) -> Result<JobRoleRow, AppError> {
        let mut roles = self.roles.lock().unwrap();
        if roles.iter().any(|r| r.title == role.title) {
            return Err(AppError::DuplicateJobRole(role.title));
        }
        let row = JobRoleRow {
            is_active: role.is_active.unwrap_or(true),
            summary: role.summary,
            requirements: role.requirements,
            ..job_role(&role.title, &role.department)
        };
        roles.push(row.clone());
        Ok(row)
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/unused".to_string(),
        gemini_api_key: "test-key".to_string(),
        gemini_model: "models/fake-model".to_string(),
        gemini_safety_threshold: 0.6,
        resume_match_threshold: 0.65,
        resume_max_file_size_bytes: 1024 * 1024,
        global_prefix: "api".to_string(),
        port: 3000,
        log_queries: false,
        seed_job_roles: false,
        rust_log: "info".to_string(),
    }
}

/// State wired to fakes, with `job_roles` supplied by the caller.
pub fn test_state(job_roles: Arc<dyn JobRoleStore>) -> AppState {
    AppState {
        job_roles,
        drive: Arc::new(FakeDrive::default()),
        fetcher: Arc::new(FakeFetcher::new(vec![])),
        llm: Arc::new(FakeModel::replying("{}")),
        config: test_config(),
    }
}
