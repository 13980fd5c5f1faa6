use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::error::AttendanceError;
use db::models::attendance::Model as AttendanceModel;
use db::models::site_user_assignment::Model as AssignmentModel;
use db::models::user::Role;
use serde_json::json;
use std::collections::HashMap;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{
    FormData, field_error_response, field_errors_response, parse_coordinates,
};
use crate::services::uploads::store_upload;

struct PunchForm {
    latitude: f64,
    longitude: f64,
    selfie_url: String,
    site_id: Option<i64>,
}

/// Pulls the shared punch fields out of a multipart body and stores the
/// selfie. Both punch directions carry the same shape. A `user_id` field
/// naming anyone but the caller is refused outright.
async fn read_punch_form(
    multipart: Multipart,
    caller_id: i64,
    action: &str,
) -> Result<PunchForm, Response> {
    let form = FormData::collect(multipart).await.map_err(|msg| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<crate::auth::guards::Empty>::error(msg)),
        )
            .into_response()
    })?;

    if let Some(raw) = form.text("user_id") {
        let user_id = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| field_error_response("user_id", "User ID must be an integer"))?;
        if user_id != caller_id {
            return Err((
                StatusCode::FORBIDDEN,
                Json(ApiResponse::<crate::auth::guards::Empty>::error(format!(
                    "You can only punch {action} for your own account"
                ))),
            )
                .into_response());
        }
    }

    let mut errors = HashMap::new();
    let lat = form.text("lat").unwrap_or_default().to_owned();
    let lng = form.text("lng").unwrap_or_default().to_owned();
    if lat.is_empty() {
        errors.insert("lat", "Latitude is required");
    }
    if lng.is_empty() {
        errors.insert("lng", "Longitude is required");
    }
    if form.file("photo").is_none() {
        errors.insert("photo", "Selfie photo is required");
    }
    if !errors.is_empty() {
        return Err(field_errors_response(errors));
    }

    let (latitude, longitude) =
        parse_coordinates(&lat, &lng).map_err(|(field, msg)| field_error_response(field, &msg))?;

    let site_id = match form.text("site_id") {
        None => None,
        Some(raw) => Some(
            raw.trim()
                .parse::<i64>()
                .map_err(|_| field_error_response("site_id", "Site ID must be an integer"))?,
        ),
    };

    let selfie = match form.file("photo") {
        Some(file) => file,
        None => return Err(field_error_response("photo", "Selfie photo is required")),
    };

    let selfie_url = store_upload("selfies", &selfie.file_name, &selfie.bytes)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to store selfie");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<crate::auth::guards::Empty>::error(
                    "Failed to store selfie",
                )),
            )
                .into_response()
        })?;

    Ok(PunchForm {
        latitude,
        longitude,
        selfie_url,
        site_id,
    })
}

/// POST /attendance/punch-in
///
/// Records today's punch-in for the authenticated user. The body is
/// multipart: `lat`, `lng`, an optional `site_id`, and a `photo` file.
/// When no site is given the caller's current assignment is used.
///
/// ### Responses
/// - `201 Created` with the new record
/// - `400 Bad Request` on missing or out-of-range fields
/// - `404 Not Found` when the named site does not exist
/// - `409 Conflict` when the caller already punched in today
pub async fn punch_in(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    multipart: Multipart,
) -> Response {
    let form = match read_punch_form(multipart, claims.sub, "in").await {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    let db = app_state.db();

    let site_id = match form.site_id {
        Some(id) => Some(id),
        None => match AssignmentModel::first_for_user(db, claims.sub).await {
            Ok(assignment) => assignment.map(|(_, site)| site.id),
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<crate::auth::guards::Empty>::error(format!(
                        "Database error: {e}"
                    ))),
                )
                    .into_response();
            }
        },
    };

    // Only admins may punch in without a site on record.
    if site_id.is_none() && claims.role != Role::Admin {
        return field_error_response("site_id", "Site ID is required");
    }

    match AttendanceModel::punch_in(
        db,
        claims.sub,
        site_id,
        form.latitude,
        form.longitude,
        &form.selfie_url,
    )
    .await
    {
        Ok(record) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(record, "Punched in successfully")),
        )
            .into_response(),
        Err(e) => punch_error_response(e),
    }
}

/// POST /attendance/punch-out
///
/// Closes today's attendance record and freezes the worked hours. Same
/// multipart shape as punch-in, minus `site_id`.
///
/// ### Responses
/// - `200 OK` with the closed record
/// - `404 Not Found` when there is no punch-in today
/// - `409 Conflict` when the caller already punched out
pub async fn punch_out(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    multipart: Multipart,
) -> Response {
    let form = match read_punch_form(multipart, claims.sub, "out").await {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    match AttendanceModel::punch_out(
        app_state.db(),
        claims.sub,
        form.latitude,
        form.longitude,
        &form.selfie_url,
    )
    .await
    {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::success(record, "Punched out successfully")),
        )
            .into_response(),
        Err(e) => punch_error_response(e),
    }
}

/// Maps a punch rejection to its HTTP shape. Conflicts carry the existing
/// record so clients can show what is already on file.
fn punch_error_response(err: AttendanceError) -> Response {
    match err {
        AttendanceError::AlreadyPunchedIn(existing) => (
            StatusCode::CONFLICT,
            Json(json!({
                "success": false,
                "data": existing,
                "message": "You have already punched in today",
            })),
        )
            .into_response(),
        AttendanceError::AlreadyPunchedOut(existing) => (
            StatusCode::CONFLICT,
            Json(json!({
                "success": false,
                "data": existing,
                "message": "You have already punched out today",
            })),
        )
            .into_response(),
        AttendanceError::SiteNotFound => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<crate::auth::guards::Empty>::error("Site not found")),
        )
            .into_response(),
        AttendanceError::NoPunchInFound => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<crate::auth::guards::Empty>::error(
                "No punch in record found for today. Please punch in first.",
            )),
        )
            .into_response(),
        AttendanceError::InvalidDateRange => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<crate::auth::guards::Empty>::error(
                "Start date must be before or equal to end date",
            )),
        )
            .into_response(),
        AttendanceError::Db(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<crate::auth::guards::Empty>::error(format!(
                "Database error: {e}"
            ))),
        )
            .into_response(),
    }
}
