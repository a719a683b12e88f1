// Prompt templates for resume evaluation.

/// Evaluation prompt with `{job_roles}` and `{resume_text}` placeholders.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"You are an ATS resume screener. Evaluate the resume text below against each of the provided job roles.

Return a JSON object with this EXACT schema:
{
  "summary": "string: overall narrative of the candidate's fit",
  "modelVersion": "string: the model version producing this evaluation",
  "evaluations": [
    {
      "jobRoleId": "string: the ID given for the role",
      "title": "string",
      "department": "string",
      "matchScore": 0.0,
      "rationale": "string"
    }
  ],
  "matches": [ /* same shape as evaluations, only roles the candidate matches */ ]
}

RULES:
1. Include exactly one entry in "evaluations" for every job role listed.
2. "matchScore" is a number between 0 and 1.
3. Every entry in "matches" must also appear in "evaluations" with the same jobRoleId.
4. Copy jobRoleId, title and department verbatim from the role list.

Job Roles:
{job_roles}

Resume Text:
{resume_text}
"#;
