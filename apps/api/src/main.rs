mod config;
mod db;
mod drive;
mod errors;
mod llm_client;
mod models;
mod resume;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::drive::client::DriveClient;
use crate::llm_client::{GenerativeModel, LlmClient};
use crate::resume::downloader::HttpFetcher;
use crate::resume::job_roles::{seed_job_roles, PgJobRoleStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Scanner API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.log_queries).await?;
    if config.seed_job_roles {
        seed_job_roles(&db).await?;
    }

    // Initialize outbound clients
    let drive = Arc::new(DriveClient::new()?);
    let fetcher = Arc::new(HttpFetcher::new(config.resume_max_file_size_bytes)?);
    let llm = Arc::new(LlmClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
    )?);
    info!("LLM client initialized (model: {})", llm.model_id());
    info!(
        "Match threshold {} (fallback {}), max resume size {} bytes",
        config.resume_match_threshold,
        config.gemini_safety_threshold,
        config.resume_max_file_size_bytes
    );

    // Build app state
    let state = AppState {
        job_roles: Arc::new(PgJobRoleStore::new(db)),
        drive,
        fetcher,
        llm,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}, API prefix /{}", config.global_prefix);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
