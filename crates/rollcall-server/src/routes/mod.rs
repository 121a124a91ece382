//! HTTP routes. Everything except `/health` and `/api/auth/*` needs a bearer token.

pub mod attendance;
pub mod auth;
pub mod export;
pub mod members;

use axum::routing::get;
use axum::{middleware, Json, Router};
use serde_json::{json, Value};

use crate::middleware::require_auth;
use crate::state::AppState;

async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "message": "Rollcall API is running" }))
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(members::routes())
        .merge(attendance::routes())
        .merge(export::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(protected)
        .with_state(state)
}
