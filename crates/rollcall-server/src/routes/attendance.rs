//! Attendance records, statistics and the missed-class ranking.

use std::fmt::Display;
use std::str::FromStr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};

use rollcall_core::models::{AttendanceMark, AttendanceWithMember, DateRange, Sex};
use rollcall_core::stats::{MissedFilter, Risk};
use rollcall_core::store::AttendanceFilter;
use rollcall_core::{AttendanceStats, MissedRanking, TermCalendar};

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/attendance", get(list).post(upsert))
        .route("/api/attendance/date/{date}", get(for_date))
        .route("/api/attendance/bulk", post(bulk))
        .route("/api/attendance/stats", get(stats))
        .route("/api/attendance/missed", get(missed))
        .route("/api/attendance/calendar", get(calendar))
        .route("/api/attendance/{id}", delete(remove))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertBody {
    date: NaiveDate,
    #[serde(flatten)]
    mark: AttendanceMark,
}

#[derive(Debug, Deserialize)]
struct BulkBody {
    date: NaiveDate,
    records: Vec<AttendanceMark>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsQuery {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MissedQuery {
    gender: Option<String>,
    risk: Option<String>,
    as_of: Option<NaiveDate>,
}

/// Parse an optional filter value. Blank and `all` mean no filter.
fn optional_filter<T>(value: Option<&str>, what: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("all") => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|e| AppError::BadRequest(format!("Invalid {} filter: {}", what, e))),
    }
}

async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<AttendanceFilter>,
) -> Result<Json<Vec<AttendanceWithMember>>, AppError> {
    Ok(Json(state.store.list_attendance(&filter)?))
}

async fn for_date(
    State(state): State<AppState>,
    ApiPath(date): ApiPath<NaiveDate>,
) -> Result<Json<Vec<AttendanceWithMember>>, AppError> {
    Ok(Json(state.store.attendance_for_date(date)?))
}

async fn upsert(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UpsertBody>,
) -> Result<(StatusCode, Json<AttendanceWithMember>), AppError> {
    let (record, created) = state.store.upsert_attendance(body.date, body.mark)?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(record)))
}

async fn bulk(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<BulkBody>,
) -> Result<Json<Value>, AppError> {
    let count = state.store.replace_attendance_for_date(body.date, &body.records)?;
    Ok(Json(json!({
        "message": "Attendance records saved successfully",
        "count": count,
        "success": true,
    })))
}

async fn stats(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> Result<Json<AttendanceStats>, AppError> {
    // A lone bound is ignored; only a complete range narrows the stats
    let range = match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => DateRange::between(start, end),
        _ => DateRange::default(),
    };
    let members = state.store.list_members()?;
    let records = state.store.attendance_in_range(&range)?;
    Ok(Json(AttendanceStats::compute(&state.calendar, &range, &members, &records)))
}

async fn missed(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MissedQuery>,
) -> Result<Json<MissedRanking>, AppError> {
    let filter = MissedFilter {
        sex: optional_filter::<Sex>(query.gender.as_deref(), "gender")?,
        risk: optional_filter::<Risk>(query.risk.as_deref(), "risk")?,
    };
    let today = query.as_of.unwrap_or_else(|| Local::now().date_naive());

    let members = state.store.list_members()?;
    let records = state.store.attendance_in_range(&DateRange::new(None, Some(today)))?;
    let ranking = MissedRanking::compute(&state.calendar, &members, &records, today);
    Ok(Json(ranking.apply(&filter)))
}

async fn calendar(State(state): State<AppState>) -> Json<TermCalendar> {
    Json(state.calendar.as_ref().clone())
}

async fn remove(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, AppError> {
    state.store.delete_attendance(id)?;
    Ok(Json(json!({ "message": "Attendance record deleted successfully" })))
}
