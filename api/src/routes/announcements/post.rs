use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use db::error::AnnouncementError;
use db::models::announcement::Model as AnnouncementModel;
use serde::Deserialize;
use util::state::AppState;
use validator::Validate;

use crate::auth::AuthUser;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use crate::routes::common::validation_error_response;

#[derive(Debug, Deserialize, Validate)]
pub struct AnnouncementRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
    pub priority: String,
    /// Absent means global.
    pub site_id: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// POST /announcements
///
/// Posts an announcement to one site, or globally when `site_id` is absent.
/// Any coordinator or admin may post to any site or globally.
///
/// ### Responses
/// - `201 Created` with the stored announcement
/// - `400 Bad Request` on validation failure or an unknown priority
pub async fn create_announcement(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<AnnouncementRequest>,
) -> Response {
    if let Err(validation_errors) = req.validate() {
        return validation_error_response(&validation_errors);
    }

    match AnnouncementModel::create(
        app_state.db(),
        &req.title,
        &req.message,
        &req.priority,
        req.site_id,
        claims.sub,
        req.expires_at,
    )
    .await
    {
        Ok(announcement) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(announcement, "Announcement created successfully")),
        )
            .into_response(),
        Err(AnnouncementError::InvalidPriority) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error(
                "Invalid priority. Must be low, medium, or high",
            )),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Empty>::error(format!("Failed to create announcement: {e}"))),
        )
            .into_response(),
    }
}
