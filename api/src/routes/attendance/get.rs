use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate, Utc};
use db::error::AttendanceError;
use db::models::attendance::{Model as AttendanceModel, WorkerSelector};
use db::models::site_user_assignment::Model as AssignmentModel;
use db::models::user::Role;
use serde::Deserialize;
use util::dates::current_month_range;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use crate::routes::common::field_error_response;

fn parse_day(field: &'static str, raw: &str) -> Result<DateTime<Utc>, (&'static str, String)> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| (field, format!("Invalid date '{raw}'. Expected YYYY-MM-DD.")))
        .map(|d| d.and_hms_opt(0, 0, 0).expect("midnight is always valid").and_utc())
}

/// Resolves the optional start/end query pair, falling back to the current
/// calendar month when both are absent.
fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), (&'static str, String)> {
    match (start, end) {
        (None, None) => Ok(current_month_range(Utc::now())),
        (Some(s), Some(e)) => Ok((parse_day("start_date", s)?, parse_day("end_date", e)?)),
        _ => Err((
            "date",
            "Both start_date and end_date must be provided together".into(),
        )),
    }
}

fn error_response(err: AttendanceError) -> Response {
    if matches!(err, AttendanceError::InvalidDateRange) {
        return field_error_response("start_date", &err.to_string());
    }
    let status = match err {
        AttendanceError::InvalidDateRange => StatusCode::BAD_REQUEST,
        AttendanceError::SiteNotFound | AttendanceError::NoPunchInFound => StatusCode::NOT_FOUND,
        AttendanceError::AlreadyPunchedIn(_) | AttendanceError::AlreadyPunchedOut(_) => {
            StatusCode::CONFLICT
        }
        AttendanceError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiResponse::<Empty>::error(err.to_string()))).into_response()
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// GET /attendance/me
///
/// The caller's own attendance history, newest first. Without query
/// parameters the current calendar month is returned; otherwise both
/// `start_date` and `end_date` (`YYYY-MM-DD`, inclusive) are required.
pub async fn my_records(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<RangeQuery>,
) -> Response {
    let (start, end) =
        match resolve_range(query.start_date.as_deref(), query.end_date.as_deref()) {
            Ok(range) => range,
            Err((field, msg)) => return field_error_response(field, &msg),
        };

    match AttendanceModel::records_in_range(app_state.db(), claims.sub, start, end).await {
        Ok(records) => (
            StatusCode::OK,
            Json(ApiResponse::success(records, "Attendance records fetched successfully")),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /attendance/status/today
///
/// Today's punch state for the caller. Having no record today is a normal
/// answer, not an error.
pub async fn today_status(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Response {
    match AttendanceModel::today_status(app_state.db(), claims.sub).await {
        Ok(status) => (
            StatusCode::OK,
            Json(ApiResponse::success(status, "Attendance status fetched successfully")),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Empty>::error(format!("Database error: {e}"))),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    pub site_id: i64,
    /// `all`, `myself`, or a comma-separated list of user ids. Defaults to `all`.
    pub worker_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn parse_selector(raw: Option<&str>) -> Result<WorkerSelector, String> {
    let raw = raw.unwrap_or("all").trim();
    match raw {
        "all" | "" => Ok(WorkerSelector::All),
        "myself" => Ok(WorkerSelector::Myself),
        csv => {
            let ids = csv
                .split(',')
                .map(|part| part.trim().parse::<i64>())
                .collect::<Result<Vec<i64>, _>>()
                .map_err(|_| {
                    "worker_id must be 'all', 'myself', or a comma-separated list of ids"
                        .to_string()
                })?;
            match ids.as_slice() {
                [only] => Ok(WorkerSelector::One(*only)),
                _ => Ok(WorkerSelector::Many(ids)),
            }
        }
    }
}

/// GET /attendance/filter
///
/// Cross-worker attendance for one site, enriched with worker and site
/// names. Coordinators may only query sites they are assigned to; admins
/// may query any site.
pub async fn filter_records(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<FilterQuery>,
) -> Response {
    let db = app_state.db();

    if claims.role != Role::Admin {
        let site_ids = match AssignmentModel::site_ids_for_user(db, claims.sub).await {
            Ok(ids) => ids,
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<Empty>::error(format!("Database error: {e}"))),
                )
                    .into_response();
            }
        };
        if !site_ids.contains(&query.site_id) {
            return (
                StatusCode::FORBIDDEN,
                Json(ApiResponse::<Empty>::error("You are not assigned to this site")),
            )
                .into_response();
        }
    }

    let selector = match parse_selector(query.worker_id.as_deref()) {
        Ok(selector) => selector,
        Err(msg) => return field_error_response("worker_id", &msg),
    };

    let (start, end) =
        match resolve_range(query.start_date.as_deref(), query.end_date.as_deref()) {
            Ok(range) => range,
            Err((field, msg)) => return field_error_response(field, &msg),
        };

    match AttendanceModel::filtered(db, query.site_id, selector, start, end, claims.sub).await {
        Ok(records) => (
            StatusCode::OK,
            Json(ApiResponse::success(records, "Attendance records fetched successfully")),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
