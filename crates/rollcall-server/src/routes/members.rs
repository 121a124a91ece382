//! Roster management and roster imports.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::{json, Value};
use tracing::{debug, info};

use rollcall_core::auth::Claims;
use rollcall_core::import::{extract_text, parse_roster, ImportError, RosterCandidate};
use rollcall_core::models::{Member, NewMember};
use rollcall_core::utils::truncate_chars;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

/// Largest accepted upload
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Characters of extracted text returned by the debug endpoint
const DEBUG_PREVIEW_CHARS: usize = 1_000_000;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/members", get(list).post(create).delete(delete_all))
        .route("/api/members/{id}", get(show).put(update).delete(remove))
        .route("/api/members/upload-pdf", post(upload_pdf))
        .route("/api/members/ai-upload", post(ai_upload))
        .route("/api/members/debug-pdf", post(debug_pdf))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Member>>, AppError> {
    Ok(Json(state.store.list_members()?))
}

async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Member>, AppError> {
    Ok(Json(state.store.get_member(id)?))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewMember>,
) -> Result<(StatusCode, Json<Member>), AppError> {
    let member = state.store.create_member(input)?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<NewMember>,
) -> Result<Json<Member>, AppError> {
    Ok(Json(state.store.update_member(id, input)?))
}

async fn remove(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, AppError> {
    state.store.delete_member(id)?;
    Ok(Json(json!({ "message": "Member deleted successfully" })))
}

async fn delete_all(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, AppError> {
    let count = state.store.delete_all_members()?;
    info!(count, by = %claims.username, "Deleted all members");
    Ok(Json(json!({ "message": "All members deleted successfully", "count": count })))
}

struct Upload {
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

/// Take the first non-empty file sent under `field_name`
async fn read_upload(mut multipart: Multipart, field_name: &str) -> Result<Upload, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(field_name) {
            continue;
        }
        let filename = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);
        let bytes = field.bytes().await?;
        if !bytes.is_empty() {
            return Ok(Upload {
                filename,
                content_type,
                bytes,
            });
        }
    }
    Err(AppError::BadRequest("No file uploaded".to_string()))
}

/// PDF extraction is CPU bound, so it runs off the async workers
async fn upload_text(upload: Upload) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || {
        extract_text(
            upload.filename.as_deref(),
            upload.content_type.as_deref(),
            &upload.bytes,
        )
    })
    .await
    .map_err(|e| AppError::Internal(format!("Text extraction task failed: {}", e)))??;
    Ok(text)
}

fn store_candidates(state: &AppState, candidates: &[RosterCandidate]) -> Result<usize, AppError> {
    let inputs = candidates
        .iter()
        .cloned()
        .map(RosterCandidate::into_new_member)
        .collect();
    Ok(state.store.create_members(inputs)?)
}

async fn upload_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let upload = read_upload(multipart, "pdf").await?;
    let filename = upload.filename.clone().unwrap_or_default();
    let text = upload_text(upload).await?;

    let found = parse_roster(&text);
    if found.is_empty() {
        return Err(AppError::BadRequest(
            "Could not find any members in the PDF.".to_string(),
        ));
    }

    let inserted = store_candidates(&state, &found)?;
    info!(%filename, inserted, "Imported roster");
    Ok(Json(json!({
        "message": format!("Imported {} members", inserted),
        "count": inserted,
        "members": found,
    })))
}

async fn ai_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let upload = read_upload(multipart, "file").await?;
    let gemini = state.gemini.as_ref().ok_or(ImportError::NotConfigured)?;
    let text = upload_text(upload).await?;

    let found = gemini.extract_members(&text).await?;
    let inserted = store_candidates(&state, &found)?;
    info!(inserted, model = gemini.model(), "Imported roster with Gemini");
    Ok(Json(json!({
        "message": format!("Imported {} members with Gemini", inserted),
        "count": inserted,
        "members": found,
    })))
}

async fn debug_pdf(multipart: Multipart) -> Result<Json<Value>, AppError> {
    let upload = read_upload(multipart, "pdf").await?;
    let text = upload_text(upload).await?;
    debug!(chars = text.chars().count(), "Extracted debug upload");

    Ok(Json(json!({
        "message": "PDF text extracted",
        "chars": text.chars().count(),
        "preview": truncate_chars(&text, DEBUG_PREVIEW_CHARS),
    })))
}
