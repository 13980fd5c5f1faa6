use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::error::AssignmentError;
use db::models::site_user_assignment::Model as AssignmentModel;
use util::state::AppState;

use crate::auth::guards::Empty;
use crate::response::ApiResponse;

/// DELETE /sites/{site_id}/workers/{user_id}
///
/// Removes a user's assignment from a site. Attendance history is kept; only
/// the assignment row goes away.
///
/// ### Responses
/// - `200 OK`
/// - `404 Not Found` when the user holds no assignment on the site
pub async fn unassign_worker(
    State(app_state): State<AppState>,
    Path((site_id, user_id)): Path<(i64, i64)>,
) -> Response {
    match AssignmentModel::unassign(app_state.db(), site_id, user_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success(Empty, "User unassigned successfully")),
        )
            .into_response(),
        Err(AssignmentError::NotAssigned) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Empty>::error("User is not assigned to this site")),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Empty>::error(format!("Failed to unassign user: {e}"))),
        )
            .into_response(),
    }
}
