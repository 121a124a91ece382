use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use rollcall_core::auth::{hash_password, verify_password, AuthError};

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct CredentialsBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CredentialsBody>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let username = body.username.trim();
    if username.is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest("Username and password are required".to_string()));
    }

    let password = body.password;
    let hash = off_worker(move || hash_password(&password)).await??;
    let user = state.store.create_user(username, &hash)?;
    info!(user_id = user.id, username = %user.username, "Registered user");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully", "username": user.username })),
    ))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CredentialsBody>,
) -> Result<Json<Value>, AppError> {
    let user = state
        .store
        .find_user(body.username.trim())?
        .ok_or(AuthError::InvalidCredentials)?;

    let (password, hash) = (body.password, user.password_hash.clone());
    if !off_worker(move || verify_password(&password, &hash)).await? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.tokens.issue(&user)?;
    info!(user_id = user.id, "User logged in");
    Ok(Json(json!({ "token": token, "username": user.username })))
}

/// Argon2 is CPU bound, so it runs off the async workers
async fn off_worker<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))
}
