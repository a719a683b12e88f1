pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::drive::handlers as drive_handlers;
use crate::resume::handlers as resume_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let prefix = format!("/{}", state.config.global_prefix);

    let api = Router::new()
        .route(
            "/resume/drive/recent",
            get(drive_handlers::handle_recent_files),
        )
        .route("/resume/analyze", post(resume_handlers::handle_analyze))
        .route(
            "/resume/roles",
            get(resume_handlers::handle_list_roles).post(resume_handlers::handle_create_role),
        );

    let router = Router::new().route("/health", get(health::health_handler));
    let router = if state.config.global_prefix.is_empty() {
        router.merge(api)
    } else {
        router.nest(&prefix, api)
    };
    router.with_state(state)
}
