use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Reject requests without a valid bearer token.
///
/// The verified `Claims` are stored in the request extensions for handlers
/// that need to know who is calling.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("No token, authorization denied".to_string()))?;

    let claims = state.tokens.verify(token).map_err(|e| {
        debug!(error = %e, path = %request.uri().path(), "Rejected bearer token");
        AppError::Unauthorized("Token is not valid".to_string())
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
