//! Authentication gate. The service only needs an authenticated/unauthenticated
//! answer; identity itself lives with whoever issues `API_TOKEN`.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
    Json,
};
use serde::Serialize;

use crate::config::Config;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
}

/// True when no token is configured, or the request carries `Authorization: Bearer <token>`.
pub fn is_authenticated(headers: &HeaderMap, config: &Config) -> bool {
    let Some(expected) = config.api_token.as_deref() else {
        return true;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| constant_time_eq(token.trim().as_bytes(), expected.as_bytes()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware guarding the résumé routes.
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !is_authenticated(&headers, &state.config) {
        tracing::warn!("Rejected unauthenticated request to {}", request.uri().path());
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(request).await)
}

/// GET /api/v1/auth/session
pub async fn handle_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<SessionResponse> {
    Json(SessionResponse {
        authenticated: is_authenticated(&headers, &state.config),
    })
}
