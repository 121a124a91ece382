use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use rollcall_core::auth::Claims;
use rollcall_core::export::{ExportError, ExportResult, SheetsClient};
use rollcall_core::models::DateRange;

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/export/status", get(status))
        .route("/api/export/export-all", post(export_all))
        .route("/api/export/export-date", post(export_date))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportAllBody {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    spreadsheet_id: Option<String>,
    sheet_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportDateBody {
    date: Option<NaiveDate>,
    spreadsheet_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExportResponse {
    success: bool,
    message: &'static str,
    #[serde(flatten)]
    result: ExportResult,
}

fn sheets(state: &AppState) -> Result<Arc<SheetsClient>, ExportError> {
    state.sheets.clone().ok_or(ExportError::NotConfigured)
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    let configured = state.sheets.is_some();
    let message = if configured {
        "Google Sheets integration is configured".to_string()
    } else {
        ExportError::NotConfigured.to_string()
    };
    Json(json!({ "configured": configured, "message": message }))
}

async fn export_all(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(body): ApiJson<ExportAllBody>,
) -> Result<Json<ExportResponse>, AppError> {
    let sheets = sheets(&state)?;
    let range = DateRange::new(body.start_date, body.end_date);
    let records = state.store.attendance_report(&range)?;
    info!(records = records.len(), by = %claims.username, "Exporting attendance range");

    let result = sheets
        .export_range(&records, body.spreadsheet_id.as_deref(), body.sheet_name.as_deref())
        .await?;
    Ok(Json(ExportResponse {
        success: true,
        message: "Data exported successfully to Google Sheets",
        result,
    }))
}

async fn export_date(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(body): ApiJson<ExportDateBody>,
) -> Result<Json<ExportResponse>, AppError> {
    let date = body
        .date
        .ok_or_else(|| AppError::BadRequest("Date is required".to_string()))?;
    let sheets = sheets(&state)?;
    let members = state.store.list_members()?;
    let records = state.store.attendance_for_date(date)?;
    info!(%date, members = members.len(), by = %claims.username, "Exporting attendance date");

    let result = sheets
        .export_date(date, &members, &records, body.spreadsheet_id.as_deref())
        .await?;
    Ok(Json(ExportResponse {
        success: true,
        message: "Date attendance exported successfully",
        result,
    }))
}
