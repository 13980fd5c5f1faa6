use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::site_user_assignment::Model as AssignmentModel;
use db::models::user::Model as UserModel;
use serde::Serialize;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;

fn db_error(e: impl std::fmt::Display) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<Empty>::error(format!("Database error: {e}"))),
    )
        .into_response()
}

/// GET /users/unassigned
///
/// Workers holding no site assignment, ordered by name.
pub async fn unassigned_workers(State(app_state): State<AppState>) -> Response {
    match UserModel::unassigned_workers(app_state.db()).await {
        Ok(workers) => (
            StatusCode::OK,
            Json(ApiResponse::success(workers, "Unassigned workers fetched successfully")),
        )
            .into_response(),
        Err(e) => db_error(e),
    }
}

/// GET /users/site-coordinators
///
/// Every account with the coordinator role, assigned or not.
pub async fn site_coordinators(State(app_state): State<AppState>) -> Response {
    match UserModel::site_coordinators(app_state.db()).await {
        Ok(coordinators) => (
            StatusCode::OK,
            Json(ApiResponse::success(coordinators, "Site coordinators fetched successfully")),
        )
            .into_response(),
        Err(e) => db_error(e),
    }
}

#[derive(Debug, Serialize, Default)]
pub struct MySiteAssignment {
    pub site_id: Option<i64>,
    pub site_name: Option<String>,
    pub site_code: Option<String>,
    pub assigned_role: Option<String>,
    pub assigned_at: Option<String>,
}

/// GET /users/my-site-assignment
///
/// The caller's current site assignment. A user with several assignments
/// gets the first one; a user with none gets an empty payload, not an
/// error.
pub async fn my_site_assignment(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Response {
    match AssignmentModel::first_for_user(app_state.db(), claims.sub).await {
        Ok(Some((assignment, site))) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                MySiteAssignment {
                    site_id: Some(site.id),
                    site_name: Some(site.name),
                    site_code: site.code,
                    assigned_role: Some(assignment.assigned_role.to_string()),
                    assigned_at: Some(assignment.assigned_at.to_rfc3339()),
                },
                "Site assignment fetched successfully",
            )),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                MySiteAssignment::default(),
                "No site assignment found",
            )),
        )
            .into_response(),
        Err(e) => db_error(e),
    }
}
