pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::auth;
use crate::presentation::handlers as presentation;
use crate::state::AppState;

/// Room for the text fields and multipart framing on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;

    let resumes = Router::new()
        .route(
            "/api/v1/resumes",
            get(presentation::handle_list_resumes)
                .post(analysis::handle_analyze)
                .delete(presentation::handle_wipe),
        )
        .route(
            "/api/v1/resumes/stream",
            post(analysis::handle_analyze_stream),
        )
        .route("/api/v1/resumes/:id", get(presentation::handle_get_resume))
        .route(
            "/api/v1/resumes/:id/image",
            get(presentation::handle_get_image),
        )
        .route(
            "/api/v1/resumes/:id/score.svg",
            get(presentation::handle_score_svg),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ))
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/auth/session", get(auth::handle_session))
        .merge(resumes)
        .with_state(state)
}
