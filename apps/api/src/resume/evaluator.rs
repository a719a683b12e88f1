//! Resume Evaluator — scores resume text against job roles with one model call.
//!
//! The reply is parsed defensively: fences are stripped, then the text is parsed as-is,
//! then the outermost `{...}` slice is tried. If none of those yield a complete payload
//! the call fails with `EvaluationParse`.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{strip_json_fences, GenerativeModel};
use crate::models::job_role::JobRoleRow;
use crate::resume::models::{EvaluationSummary, JobRoleEvaluation};
use crate::resume::prompts::EVALUATION_PROMPT_TEMPLATE;

/// Payload shape requested from the model. `summary` and `evaluations` are mandatory.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvaluationReply {
    summary: String,
    model_version: Option<String>,
    evaluations: Vec<JobRoleEvaluation>,
    matches: Option<Vec<JobRoleEvaluation>>,
}

type RecoveryStrategy = fn(&str) -> Option<&str>;

/// Tried in order against the fence-stripped reply.
const RECOVERY_STRATEGIES: [(&str, RecoveryStrategy); 2] =
    [("as-is", as_is), ("brace-slice", brace_slice)];

fn as_is(text: &str) -> Option<&str> {
    Some(text)
}

/// From the first `{` to the last `}`, inclusive.
fn brace_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Replaces placeholders in a single pass; inserted values are never rescanned.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = values
            .iter()
            .filter_map(|&(key, value)| rest.find(key).map(|pos| (pos, key, value)))
            .min_by_key(|&(pos, _, _)| pos);
        let Some((pos, key, value)) = next else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..pos]);
        out.push_str(value);
        rest = &rest[pos + key.len()..];
    }
}

pub fn build_evaluation_prompt(resume_text: &str, roles: &[JobRoleRow]) -> String {
    let role_descriptions = roles
        .iter()
        .enumerate()
        .map(|(i, role)| {
            format!(
                "Role {}: {} ({})\nID: {}\nSummary: {}\nRequirements: {}",
                i + 1,
                role.title,
                role.department,
                role.id,
                role.summary,
                role.requirements
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut prompt = fill_template(
        EVALUATION_PROMPT_TEMPLATE,
        &[
            ("{job_roles}", role_descriptions.as_str()),
            ("{resume_text}", resume_text),
        ],
    );
    prompt.push('\n');
    prompt.push_str(JSON_ONLY_INSTRUCTION);
    prompt
}

/// Parses a raw model reply into an `EvaluationSummary`.
///
/// When the reply carries no `matches`, they are derived from `evaluations` using
/// `fallback_threshold`. `default_model_version` fills a missing `modelVersion`.
pub fn parse_evaluation_reply(
    raw: &str,
    fallback_threshold: f64,
    default_model_version: &str,
) -> Result<EvaluationSummary, AppError> {
    let stripped = strip_json_fences(raw);
    let mut last_error = None;

    for (name, strategy) in RECOVERY_STRATEGIES {
        let Some(candidate) = strategy(stripped) else {
            continue;
        };
        match serde_json::from_str::<EvaluationReply>(candidate) {
            Ok(reply) => {
                return Ok(resolve_reply(reply, fallback_threshold, default_model_version))
            }
            Err(e) => {
                warn!("Evaluation reply not parsable with {name} strategy: {e}");
                last_error = Some(e);
            }
        }
    }

    Err(AppError::EvaluationParse(match last_error {
        Some(e) => format!("Model reply is not a valid evaluation payload: {e}"),
        None => "Model reply contained no JSON object".to_string(),
    }))
}

fn clamp_score(mut evaluation: JobRoleEvaluation) -> JobRoleEvaluation {
    if !(0.0..=1.0).contains(&evaluation.match_score) {
        warn!(
            "Clamping out-of-range match score {} for job role {}",
            evaluation.match_score, evaluation.job_role_id
        );
        evaluation.match_score = evaluation.match_score.clamp(0.0, 1.0);
    }
    evaluation
}

fn resolve_reply(
    reply: EvaluationReply,
    fallback_threshold: f64,
    default_model_version: &str,
) -> EvaluationSummary {
    let evaluations: Vec<JobRoleEvaluation> =
        reply.evaluations.into_iter().map(clamp_score).collect();

    let matches = match reply.matches {
        Some(matches) => {
            let known: HashSet<&str> = evaluations.iter().map(|e| e.job_role_id.as_str()).collect();
            matches
                .into_iter()
                .filter(|m| {
                    let keep = known.contains(m.job_role_id.as_str());
                    if !keep {
                        warn!("Dropping match for unevaluated job role {}", m.job_role_id);
                    }
                    keep
                })
                .map(clamp_score)
                .collect()
        }
        None => evaluations
            .iter()
            .filter(|e| e.match_score >= fallback_threshold)
            .cloned()
            .collect(),
    };

    EvaluationSummary {
        summary: reply.summary,
        model_version: reply
            .model_version
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default_model_version.to_string()),
        evaluations,
        matches,
    }
}

/// True when any match scores at or above `threshold`.
pub fn decide_match(matches: &[JobRoleEvaluation], threshold: f64) -> bool {
    matches.iter().any(|m| m.match_score >= threshold)
}

/// Runs a single evaluation call for `resume_text` against `roles`.
pub async fn evaluate_resume(
    model: &dyn GenerativeModel,
    resume_text: &str,
    roles: &[JobRoleRow],
    fallback_threshold: f64,
) -> Result<EvaluationSummary, AppError> {
    let prompt = build_evaluation_prompt(resume_text, roles);
    info!(
        "Evaluating resume ({} chars) against {} job roles with {}",
        resume_text.chars().count(),
        roles.len(),
        model.model_id()
    );

    let reply = model.generate(&prompt).await?;
    parse_evaluation_reply(&reply, fallback_threshold, model.model_id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{job_role, FakeModel};

    const REPLY: &str = r#"{
        "summary": "Strong backend profile",
        "modelVersion": "gemini-1.5-flash-002",
        "evaluations": [
            {"jobRoleId": "r1", "title": "Backend", "department": "Eng", "matchScore": 0.8, "rationale": "Rust"},
            {"jobRoleId": "r2", "title": "TPM", "department": "Ops", "matchScore": 0.5, "rationale": "Some PM"}
        ],
        "matches": [
            {"jobRoleId": "r1", "title": "Backend", "department": "Eng", "matchScore": 0.8, "rationale": "Rust"}
        ]
    }"#;

    fn eval(id: &str, score: f64) -> JobRoleEvaluation {
        JobRoleEvaluation {
            job_role_id: id.to_string(),
            title: String::new(),
            department: String::new(),
            match_score: score,
            rationale: String::new(),
        }
    }

    fn assert_matches_subset(summary: &EvaluationSummary) {
        let ids: HashSet<_> = summary.evaluations.iter().map(|e| &e.job_role_id).collect();
        assert!(summary.matches.iter().all(|m| ids.contains(&m.job_role_id)));
    }

    #[test]
    fn test_plain_json_reply_parses() {
        let summary = parse_evaluation_reply(REPLY, 0.6, "models/x").unwrap();
        assert_eq!(summary.summary, "Strong backend profile");
        assert_eq!(summary.model_version, "gemini-1.5-flash-002");
        assert_eq!(summary.evaluations.len(), 2);
        assert_eq!(summary.matches.len(), 1);
    }

    #[test]
    fn test_fenced_reply_parses_after_fence_removal() {
        let fenced = format!("```json\n{REPLY}\n```");
        let summary = parse_evaluation_reply(&fenced, 0.6, "models/x").unwrap();
        assert_eq!(summary.matches[0].job_role_id, "r1");
    }

    #[test]
    fn test_prose_around_json_recovered_by_brace_slice() {
        let chatty = format!("Sure! Here is the evaluation:\n{REPLY}\nLet me know if you need more.");
        let summary = parse_evaluation_reply(&chatty, 0.6, "models/x").unwrap();
        assert_eq!(summary.evaluations.len(), 2);
    }

    #[test]
    fn test_unparsable_reply_is_evaluation_parse_error() {
        for raw in ["I cannot help with that.", "{not json}", "", "} backwards {"] {
            assert!(matches!(
                parse_evaluation_reply(raw, 0.6, "models/x"),
                Err(AppError::EvaluationParse(_))
            ));
        }
    }

    #[test]
    fn test_missing_required_fields_is_parse_error() {
        let raw = r#"{"modelVersion": "v", "matches": []}"#;
        assert!(matches!(
            parse_evaluation_reply(raw, 0.6, "models/x"),
            Err(AppError::EvaluationParse(_))
        ));
    }

    #[test]
    fn test_missing_matches_derived_from_fallback_threshold() {
        let raw = r#"{"summary": "s", "evaluations": [
            {"jobRoleId": "a", "matchScore": 0.6},
            {"jobRoleId": "b", "matchScore": 0.59},
            {"jobRoleId": "c", "matchScore": 0.9}
        ]}"#;
        let summary = parse_evaluation_reply(raw, 0.6, "models/gemini-1.5-flash").unwrap();
        let ids: Vec<_> = summary.matches.iter().map(|m| m.job_role_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(summary.model_version, "models/gemini-1.5-flash");
        assert_matches_subset(&summary);
    }

    #[test]
    fn test_matches_outside_evaluations_are_dropped() {
        let raw = r#"{"summary": "s",
            "evaluations": [{"jobRoleId": "a", "matchScore": 0.7}],
            "matches": [{"jobRoleId": "a", "matchScore": 0.7}, {"jobRoleId": "ghost", "matchScore": 0.99}]
        }"#;
        let summary = parse_evaluation_reply(raw, 0.6, "m").unwrap();
        assert_eq!(summary.matches.len(), 1);
        assert_matches_subset(&summary);
    }

    #[test]
    fn test_scores_clamped_into_unit_interval() {
        let raw = r#"{"summary": "s", "evaluations": [
            {"jobRoleId": "a", "matchScore": 1.7},
            {"jobRoleId": "b", "matchScore": -0.2}
        ]}"#;
        let summary = parse_evaluation_reply(raw, 0.6, "m").unwrap();
        assert_eq!(summary.evaluations[0].match_score, 1.0);
        assert_eq!(summary.evaluations[1].match_score, 0.0);
    }

    #[test]
    fn test_decide_match_uses_threshold_inclusively() {
        let matches = vec![eval("a", 0.8), eval("b", 0.5)];
        assert!(decide_match(&matches, 0.7));
        assert!(decide_match(&matches, 0.8));
        assert!(!decide_match(&matches, 0.81));
        assert!(!decide_match(&[], 0.0));
    }

    #[test]
    fn test_decide_match_agrees_with_any_for_threshold_grid() {
        let matches = vec![eval("a", 0.25), eval("b", 0.65), eval("c", 0.4)];
        for step in 0..=20 {
            let t = step as f64 / 20.0;
            let expected = matches.iter().any(|m| m.match_score >= t);
            assert_eq!(decide_match(&matches, t), expected, "threshold {t}");
        }
    }

    #[test]
    fn test_prompt_lists_every_role_with_id() {
        let roles = vec![
            job_role("Backend Engineer", "Engineering"),
            job_role("Data Analyst", "Analytics"),
        ];
        let prompt = build_evaluation_prompt("Jane Doe, Rust engineer", &roles);

        assert!(prompt.contains("Role 1: Backend Engineer (Engineering)"));
        assert!(prompt.contains("Role 2: Data Analyst (Analytics)"));
        assert!(prompt.contains(&format!("ID: {}", roles[1].id)));
        assert!(prompt.contains("Resume Text:\nJane Doe, Rust engineer"));
        assert!(prompt.contains("valid JSON only"));
    }

    #[test]
    fn test_placeholder_text_in_inputs_is_not_expanded() {
        let mut role = job_role("Prompt Engineer", "AI");
        role.summary = "Writes templates like {resume_text}".to_string();
        let resume = "Jane Doe, knows {job_roles} syntax";

        let prompt = build_evaluation_prompt(resume, &[role]);

        assert_eq!(prompt.matches("Jane Doe").count(), 1);
        assert_eq!(prompt.matches("Role 1: Prompt Engineer").count(), 1);
        assert!(prompt.contains("Writes templates like {resume_text}"));
        assert!(prompt.contains("knows {job_roles} syntax"));
    }

    #[tokio::test]
    async fn test_evaluate_resume_calls_model_once() {
        let model = FakeModel::replying(&format!("```\n{REPLY}\n```"));
        let roles = vec![job_role("Backend", "Eng")];

        let summary = evaluate_resume(&model, "resume text", &roles, 0.6)
            .await
            .unwrap();

        assert_eq!(summary.matches.len(), 1);
        assert_eq!(model.prompts().len(), 1);
        assert!(model.prompts()[0].contains("resume text"));
    }
}
