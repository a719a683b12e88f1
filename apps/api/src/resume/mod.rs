// Resume analysis: download, text extraction, model evaluation, and the job-role catalogue.

pub mod analysis;
pub mod downloader;
pub mod evaluator;
pub mod extract;
pub mod handlers;
pub mod job_roles;
pub mod models;
pub mod prompts;
