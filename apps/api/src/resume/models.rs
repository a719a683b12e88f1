use serde::{Deserialize, Serialize};

/// One job role scored by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRoleEvaluation {
    pub job_role_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub department: String,
    /// 0.0 – 1.0
    pub match_score: f64,
    #[serde(default)]
    pub rationale: String,
}

/// The model's verdict. `matches` only holds roles also present in `evaluations`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSummary {
    pub summary: String,
    pub model_version: String,
    pub evaluations: Vec<JobRoleEvaluation>,
    pub matches: Vec<JobRoleEvaluation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeFileMetadata {
    pub mime_type: String,
    pub extension: String,
    pub file_size_bytes: u64,
    pub source_url: String,
    /// Characters of normalized text handed to the model.
    pub text_length: usize,
    /// Set when the extracted text is suspiciously short.
    pub low_confidence: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResumeRequest {
    pub resume_url: String,
    pub match_threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_email: Option<String>,
    pub resume_url: String,
    pub is_match: bool,
    pub match_threshold: f64,
    pub matches: Vec<JobRoleEvaluation>,
    pub file_metadata: ResumeFileMetadata,
    pub summary: String,
    pub model_version: String,
}
