//! Single-resume analysis: download → detect → extract → evaluate → decide.

use reqwest::Url;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::GenerativeModel;
use crate::resume::downloader::{download_resume, ResumeFetcher};
use crate::resume::evaluator::{decide_match, evaluate_resume};
use crate::resume::extract::{detect_format, extract_text};
use crate::resume::job_roles::JobRoleStore;
use crate::resume::models::{AnalysisResult, AnalyzeResumeRequest, ResumeFileMetadata};

#[derive(Debug, Clone, Copy)]
pub struct AnalysisSettings {
    pub max_file_size_bytes: u64,
    /// Used when the request carries no `matchThreshold`.
    pub default_match_threshold: f64,
    /// Only used to derive `matches` when the model omits them.
    pub fallback_threshold: f64,
}

fn validate_request(request: &AnalyzeResumeRequest, default_threshold: f64) -> Result<f64, AppError> {
    let url = Url::parse(request.resume_url.trim())
        .map_err(|_| AppError::Validation("resumeUrl must be an absolute URL".to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Validation(
            "resumeUrl must use http or https".to_string(),
        ));
    }

    let threshold = request.match_threshold.unwrap_or(default_threshold);
    if !(0.0..=1.0).contains(&threshold) {
        return Err(AppError::Validation(
            "matchThreshold must be between 0 and 1".to_string(),
        ));
    }
    Ok(threshold)
}

pub async fn analyze_resume(
    fetcher: &dyn ResumeFetcher,
    model: &dyn GenerativeModel,
    store: &dyn JobRoleStore,
    settings: AnalysisSettings,
    request: AnalyzeResumeRequest,
) -> Result<AnalysisResult, AppError> {
    let threshold = validate_request(&request, settings.default_match_threshold)?;
    let resume_url = request.resume_url.trim().to_string();

    let roles = store.list(true).await?;
    if roles.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No active job roles are configured for evaluation".to_string(),
        ));
    }

    let downloaded = download_resume(fetcher, &resume_url).await?;
    let size = downloaded.body.len() as u64;
    if size > settings.max_file_size_bytes {
        return Err(AppError::SizeLimitExceeded {
            size,
            limit: settings.max_file_size_bytes,
        });
    }

    let detected = detect_format(&downloaded.body, downloaded.content_type.as_deref())?;
    info!(
        "Downloaded resume ({size} bytes) detected as {}",
        detected.mime_type
    );

    let format = detected.format;
    let body = downloaded.body;
    let extracted = tokio::task::spawn_blocking(move || extract_text(format, &body))
        .await
        .map_err(|e| AppError::UnprocessableEntity(format!("Text extraction aborted: {e}")))??;

    if extracted.low_confidence {
        warn!(
            "Extracted only {} characters from {resume_url}; evaluation may be unreliable",
            extracted.text.chars().count()
        );
    }

    let evaluation = evaluate_resume(
        model,
        &extracted.text,
        &roles,
        settings.fallback_threshold,
    )
    .await?;

    let is_match = decide_match(&evaluation.matches, threshold);
    info!(
        "Resume evaluated: {} of {} roles matched, isMatch={is_match} at threshold {threshold}",
        evaluation.matches.len(),
        evaluation.evaluations.len()
    );

    Ok(AnalysisResult {
        candidate_email: extract_email(&extracted.text),
        resume_url: resume_url.clone(),
        is_match,
        match_threshold: threshold,
        matches: evaluation.matches,
        file_metadata: ResumeFileMetadata {
            mime_type: detected.mime_type,
            extension: format.extension().to_string(),
            file_size_bytes: size,
            source_url: resume_url,
            text_length: extracted.text.chars().count(),
            low_confidence: extracted.low_confidence,
        },
        summary: evaluation.summary,
        model_version: evaluation.model_version,
    })
}

fn is_local_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'%' | b'+' | b'-')
}

fn is_domain_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-')
}

/// First `local@domain.tld` token in `text`, lowercased. The TLD needs two or more letters.
pub fn extract_email(text: &str) -> Option<String> {
    let bytes = text.as_bytes();

    for (at, _) in bytes.iter().enumerate().filter(|(_, b)| **b == b'@') {
        let mut start = at;
        while start > 0 && is_local_char(bytes[start - 1]) {
            start -= 1;
        }
        if start == at {
            continue;
        }

        let mut end = at + 1;
        while end < bytes.len() && is_domain_char(bytes[end]) {
            end += 1;
        }
        let domain = &bytes[at + 1..end];

        // Rightmost dot that is followed by a run of at least two letters.
        for dot in (1..domain.len()).rev().filter(|&i| domain[i] == b'.') {
            let tld_len = domain[dot + 1..]
                .iter()
                .take_while(|b| b.is_ascii_alphabetic())
                .count();
            if tld_len >= 2 {
                let stop = at + 1 + dot + 1 + tld_len;
                return Some(text[start..stop].to_ascii_lowercase());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::downloader::FetchedResponse;
    use crate::resume::job_roles::NewJobRole;
    use crate::test_support::{FakeFetcher, FakeModel, InMemoryJobRoles};
    use bytes::Bytes;

    const REPLY: &str = r#"```json
    {"summary": "Solid backend engineer", "evaluations": [
        {"jobRoleId": "r1", "title": "Backend", "department": "Eng", "matchScore": 0.8, "rationale": "Rust"},
        {"jobRoleId": "r2", "title": "TPM", "department": "Ops", "matchScore": 0.5, "rationale": "Light PM"}
    ]}
    ```"#;

    fn settings() -> AnalysisSettings {
        AnalysisSettings {
            max_file_size_bytes: 1024,
            default_match_threshold: 0.65,
            fallback_threshold: 0.6,
        }
    }

    fn text_response(body: &str) -> FetchedResponse {
        FetchedResponse {
            content_type: Some("text/plain; charset=utf-8".to_string()),
            set_cookies: vec![],
            body: Bytes::from(body.to_string()),
        }
    }

    async fn store_with_role() -> InMemoryJobRoles {
        let store = InMemoryJobRoles::default();
        store
            .create(NewJobRole {
                title: "Backend".to_string(),
                department: "Eng".to_string(),
                summary: "Services".to_string(),
                requirements: "- Rust".to_string(),
                is_active: Some(true),
            })
            .await
            .unwrap();
        store
    }

    fn request(threshold: Option<f64>) -> AnalyzeResumeRequest {
        AnalyzeResumeRequest {
            resume_url: "https://example.com/jane.txt".to_string(),
            match_threshold: threshold,
        }
    }

    #[tokio::test]
    async fn test_full_pipeline_on_plain_text_resume() {
        let fetcher = FakeFetcher::new(vec![text_response(
            "Jane Doe  Jane.Doe@Example.COM\nRust engineer with Tokio and Postgres.",
        )]);
        let model = FakeModel::replying(REPLY);
        let store = store_with_role().await;

        let result = analyze_resume(&fetcher, &model, &store, settings(), request(Some(0.7)))
            .await
            .unwrap();

        assert!(result.is_match);
        assert_eq!(result.match_threshold, 0.7);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].match_score, 0.8);
        assert_eq!(result.candidate_email.as_deref(), Some("jane.doe@example.com"));
        assert_eq!(result.model_version, model.model_id());
        assert_eq!(result.file_metadata.extension, "txt");
        assert_eq!(result.file_metadata.mime_type, "text/plain");
        assert!(result.file_metadata.low_confidence);
        assert_eq!(model.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_default_threshold_applies_when_omitted() {
        let fetcher = FakeFetcher::new(vec![text_response("Jane Doe resume text")]);
        let model = FakeModel::replying(REPLY);
        let store = store_with_role().await;
        let settings = AnalysisSettings {
            default_match_threshold: 0.9,
            ..settings()
        };

        let result = analyze_resume(&fetcher, &model, &store, settings, request(None))
            .await
            .unwrap();

        assert_eq!(result.match_threshold, 0.9);
        assert_eq!(result.matches.len(), 1);
        assert!(!result.is_match);
    }

    #[tokio::test]
    async fn test_oversized_download_never_reaches_model() {
        let fetcher = FakeFetcher::new(vec![text_response(&"x".repeat(2048))]);
        let model = FakeModel::replying(REPLY);
        let store = store_with_role().await;

        let err = analyze_resume(&fetcher, &model, &store, settings(), request(None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SizeLimitExceeded { size: 2048, limit: 1024 }));
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_format_never_reaches_model() {
        let fetcher = FakeFetcher::new(vec![FetchedResponse {
            content_type: Some("image/png".to_string()),
            set_cookies: vec![],
            body: Bytes::from_static(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"),
        }]);
        let model = FakeModel::replying(REPLY);
        let store = store_with_role().await;

        let err = analyze_resume(&fetcher, &model, &store, settings(), request(None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnsupportedResumeFormat(_)));
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_no_active_roles_fails_before_download() {
        let fetcher = FakeFetcher::new(vec![]);
        let model = FakeModel::replying(REPLY);
        let store = InMemoryJobRoles::default();

        let err = analyze_resume(&fetcher, &model, &store, settings(), request(None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnprocessableEntity(_)));
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_and_threshold_rejected() {
        let fetcher = FakeFetcher::new(vec![]);
        let model = FakeModel::replying(REPLY);
        let store = store_with_role().await;

        for bad in [
            AnalyzeResumeRequest {
                resume_url: "not a url".to_string(),
                match_threshold: None,
            },
            AnalyzeResumeRequest {
                resume_url: "ftp://example.com/cv.pdf".to_string(),
                match_threshold: None,
            },
            request(Some(1.5)),
            request(Some(-0.1)),
        ] {
            let err = analyze_resume(&fetcher, &model, &store, settings(), bad)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unparsable_model_reply_surfaces_parse_error() {
        let fetcher = FakeFetcher::new(vec![text_response("Jane Doe resume text")]);
        let model = FakeModel::replying("I'm sorry, I can't evaluate this.");
        let store = store_with_role().await;

        let err = analyze_resume(&fetcher, &model, &store, settings(), request(None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::EvaluationParse(_)));
    }

    #[test]
    fn test_extract_email_finds_first_address() {
        assert_eq!(
            extract_email("Contact: John.Smith+cv@Mail.Example.co.uk, phone 555"),
            Some("john.smith+cv@mail.example.co.uk".to_string())
        );
        assert_eq!(
            extract_email("a@b.c then real@site.io."),
            Some("real@site.io".to_string())
        );
        assert_eq!(extract_email("twitter @handle and x@localhost"), None);
        assert_eq!(extract_email("no address here"), None);
    }
}
