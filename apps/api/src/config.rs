use anyhow::{bail, Context, Result};

const DEFAULT_MODEL: &str = "models/gemini-1.5-flash";
const DEFAULT_SAFETY_THRESHOLD: f64 = 0.6;
const DEFAULT_MATCH_THRESHOLD: f64 = 0.65;
const DEFAULT_MAX_FILE_SIZE_MB: u64 = 15;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    /// Cutoff used to derive `matches` when the model reply omits them.
    pub gemini_safety_threshold: f64,
    /// Request-level match threshold applied when the caller supplies none.
    pub resume_match_threshold: f64,
    pub resume_max_file_size_bytes: u64,
    pub global_prefix: String,
    pub port: u16,
    pub log_queries: bool,
    pub seed_job_roles: bool,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let max_file_size_mb: u64 = parse_env("RESUME_MAX_FILE_SIZE_MB", DEFAULT_MAX_FILE_SIZE_MB)?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            gemini_safety_threshold: parse_threshold(
                "GEMINI_SAFETY_THRESHOLD",
                DEFAULT_SAFETY_THRESHOLD,
            )?,
            resume_match_threshold: parse_threshold(
                "RESUME_MATCH_THRESHOLD",
                DEFAULT_MATCH_THRESHOLD,
            )?,
            resume_max_file_size_bytes: megabytes_to_bytes(max_file_size_mb)?,
            global_prefix: std::env::var("APP_GLOBAL_PREFIX")
                .map(|p| p.trim_matches('/').to_string())
                .unwrap_or_else(|_| "api".to_string()),
            port: parse_env("PORT", 3000)?,
            log_queries: parse_env("DB_LOG_QUERIES", false)?,
            seed_job_roles: parse_env("SEED_JOB_ROLES", false)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

fn megabytes_to_bytes(mb: u64) -> Result<u64> {
    mb.checked_mul(1024 * 1024)
        .with_context(|| format!("RESUME_MAX_FILE_SIZE_MB is too large: {mb}"))
}

fn parse_threshold(key: &str, default: f64) -> Result<f64> {
    let value = parse_env(key, default)?;
    if !(0.0..=1.0).contains(&value) {
        bail!("Environment variable '{key}' must be between 0 and 1, got {value}");
    }
    Ok(value)
}
