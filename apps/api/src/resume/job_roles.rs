//! Job-role store: list and create, with title uniqueness enforced by the database.

use async_trait::async_trait;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job_role::JobRoleRow;

const MAX_LABEL_LEN: usize = 120;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJobRole {
    pub title: String,
    pub department: String,
    pub summary: String,
    pub requirements: String,
    pub is_active: Option<bool>,
}

impl NewJobRole {
    /// Trims text fields and checks the title and department limits.
    pub fn validated(self) -> Result<Self, AppError> {
        let role = NewJobRole {
            title: self.title.trim().to_string(),
            department: self.department.trim().to_string(),
            summary: self.summary.trim().to_string(),
            requirements: self.requirements.trim().to_string(),
            is_active: self.is_active,
        };
        for (field, value) in [("title", &role.title), ("department", &role.department)] {
            if value.is_empty() {
                return Err(AppError::Validation(format!("{field} cannot be empty")));
            }
            if value.chars().count() > MAX_LABEL_LEN {
                return Err(AppError::Validation(format!(
                    "{field} must be at most {MAX_LABEL_LEN} characters"
                )));
            }
        }
        Ok(role)
    }
}

#[async_trait]
pub trait JobRoleStore: Send + Sync {
    /// Roles ordered by title ascending; `active_only` drops inactive roles.
    async fn list(&self, active_only: bool) -> Result<Vec<JobRoleRow>, AppError>;

    /// Fails with `DuplicateJobRole` when the title is taken.
    async fn create(&self, role: NewJobRole) -> Result<JobRoleRow, AppError>;
}

#[derive(Clone)]
pub struct PgJobRoleStore {
    pool: PgPool,
}

impl PgJobRoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl JobRoleStore for PgJobRoleStore {
    async fn list(&self, active_only: bool) -> Result<Vec<JobRoleRow>, AppError> {
        Ok(sqlx::query_as::<_, JobRoleRow>(
            "SELECT * FROM job_roles WHERE ($1 = FALSE OR is_active) ORDER BY title ASC",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create(&self, role: NewJobRole) -> Result<JobRoleRow, AppError> {
        let result = sqlx::query_as::<_, JobRoleRow>(
            r#"
            INSERT INTO job_roles (id, title, department, summary, requirements, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&role.title)
        .bind(&role.department)
        .bind(&role.summary)
        .bind(&role.requirements)
        .bind(role.is_active.unwrap_or(true))
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => {
                info!("Created job role {} ({})", row.title, row.id);
                Ok(row)
            }
            Err(e) if is_unique_violation(&e) => Err(AppError::DuplicateJobRole(role.title)),
            Err(e) => Err(AppError::Database(e)),
        }
    }
}

/// The catalogue loaded by `SEED_JOB_ROLES=true`.
fn default_job_roles() -> Vec<NewJobRole> {
    let role = |title: &str, department: &str, summary: &str, requirements: &[&str]| NewJobRole {
        title: title.to_string(),
        department: department.to_string(),
        summary: summary.to_string(),
        requirements: requirements
            .iter()
            .map(|r| format!("- {r}"))
            .collect::<Vec<_>>()
            .join("\n"),
        is_active: Some(true),
    };

    vec![
        role(
            "Senior Backend Engineer",
            "Engineering",
            "Design and maintain scalable backend services with strong typing practices.",
            &[
                "5+ years of backend experience building HTTP services",
                "Experience with PostgreSQL and schema migrations",
                "Knowledge of cloud infrastructure (AWS/GCP) and CI/CD pipelines",
                "Background in building secure REST APIs and integrating third-party services",
            ],
        ),
        role(
            "AI Automation Specialist",
            "Innovation Lab",
            "Automate business workflows using low-code tools and LLM integrations.",
            &[
                "Hands-on n8n or similar automation platform experience",
                "Ability to design LLM prompts and safeguard workflows from prompt injection",
                "Familiarity with Google Gemini or OpenAI models",
                "Strong communication and documentation habits",
            ],
        ),
        role(
            "Technical Program Manager",
            "Operations",
            "Coordinate cross-functional teams delivering AI-powered automation initiatives.",
            &[
                "Proven track record managing technical programs with agile methodologies",
                "Experience translating business requirements into technical deliverables",
                "Understanding of resume screening and talent operations processes",
                "Excellent stakeholder communication and risk management skills",
            ],
        ),
    ]
}

/// Upserts the default catalogue by title.
pub async fn seed_job_roles(pool: &PgPool) -> anyhow::Result<()> {
    let roles = default_job_roles();
    for role in &roles {
        sqlx::query(
            r#"
            INSERT INTO job_roles (id, title, department, summary, requirements, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (title) DO UPDATE
            SET department = EXCLUDED.department,
                summary = EXCLUDED.summary,
                requirements = EXCLUDED.requirements,
                is_active = EXCLUDED.is_active,
                updated_at = NOW()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&role.title)
        .bind(&role.department)
        .bind(&role.summary)
        .bind(&role.requirements)
        .bind(role.is_active.unwrap_or(true))
        .execute(pool)
        .await?;
    }
    info!("Seeded {} default job roles", roles.len());
    Ok(())
}
