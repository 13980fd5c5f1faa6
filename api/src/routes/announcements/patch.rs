use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::error::AnnouncementError;
use db::models::announcement::Model as AnnouncementModel;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;

/// PATCH /announcements/{announcement_id}/deactivate
///
/// Turns an announcement off. Only its author may do this; deactivation is
/// one-way.
///
/// ### Responses
/// - `200 OK` with the deactivated announcement
/// - `403 Forbidden` when the caller is not the author
/// - `404 Not Found` for an unknown id
pub async fn deactivate_announcement(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(announcement_id): Path<i64>,
) -> Response {
    match AnnouncementModel::deactivate(app_state.db(), announcement_id, claims.sub).await {
        Ok(announcement) => (
            StatusCode::OK,
            Json(ApiResponse::success(announcement, "Announcement deactivated successfully")),
        )
            .into_response(),
        Err(AnnouncementError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Empty>::error("Announcement not found")),
        )
            .into_response(),
        Err(AnnouncementError::NotAuthorized) => (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::<Empty>::error(
                "You are not authorized to deactivate this announcement",
            )),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Empty>::error(format!(
                "Failed to deactivate announcement: {e}"
            ))),
        )
            .into_response(),
    }
}
