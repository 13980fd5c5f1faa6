use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::error::{AssignmentError, SiteError};
use db::models::site::Model as SiteModel;
use db::models::site_user_assignment::{AssignedRole, Model as AssignmentModel};
use db::models::user;
use sea_orm::EntityTrait;
use serde::Deserialize;
use util::state::AppState;
use validator::Validate;

use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use crate::routes::common::validation_error_response;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSiteRequest {
    pub code: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Site name must be 1 to 200 characters"))]
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// POST /sites
///
/// Creates a site. The optional code must be unique.
///
/// ### Responses
/// - `201 Created` with the new site
/// - `400 Bad Request` on validation failure
/// - `409 Conflict` on a duplicate code
pub async fn create_site(
    State(app_state): State<AppState>,
    Json(req): Json<CreateSiteRequest>,
) -> Response {
    if let Err(validation_errors) = req.validate() {
        return validation_error_response(&validation_errors);
    }

    match SiteModel::create(
        app_state.db(),
        req.code.as_deref(),
        &req.name,
        req.address.as_deref(),
        req.latitude,
        req.longitude,
    )
    .await
    {
        Ok(site) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(site, "Site created successfully")),
        )
            .into_response(),
        Err(SiteError::DuplicateCode) => (
            StatusCode::CONFLICT,
            Json(ApiResponse::<Empty>::error("Site code already exists")),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Empty>::error(format!("Failed to create site: {e}"))),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignmentRequest {
    pub user_id: i64,
}

async fn assign(app_state: &AppState, site_id: i64, user_id: i64, role: AssignedRole) -> Response {
    let db = app_state.db();

    match db::models::site::Entity::find_by_id(site_id).one(db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Empty>::error("Site not found")),
            )
                .into_response();
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error(format!("Database error: {e}"))),
            )
                .into_response();
        }
    }

    match user::Entity::find_by_id(user_id).one(db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Empty>::error("User not found")),
            )
                .into_response();
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error(format!("Database error: {e}"))),
            )
                .into_response();
        }
    }

    match AssignmentModel::assign(db, site_id, user_id, role).await {
        Ok(assignment) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(assignment, "User assigned successfully")),
        )
            .into_response(),
        Err(AssignmentError::AlreadyAssigned) => (
            StatusCode::CONFLICT,
            Json(ApiResponse::<Empty>::error("User is already assigned to this site")),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Empty>::error(format!("Failed to assign user: {e}"))),
        )
            .into_response(),
    }
}

/// POST /sites/{site_id}/assign-worker
///
/// Assigns a user to a site in the worker role.
///
/// ### Responses
/// - `201 Created` with the assignment
/// - `404 Not Found` for an unknown site or user
/// - `409 Conflict` when the user is already assigned to the site
pub async fn assign_worker(
    State(app_state): State<AppState>,
    Path(site_id): Path<i64>,
    Json(req): Json<AssignmentRequest>,
) -> Response {
    assign(&app_state, site_id, req.user_id, AssignedRole::Worker).await
}

/// POST /sites/{site_id}/assign-coordinator
///
/// Assigns a user to a site in the coordinator role. The same
/// one-assignment-per-site rule applies.
pub async fn assign_coordinator(
    State(app_state): State<AppState>,
    Path(site_id): Path<i64>,
    Json(req): Json<AssignmentRequest>,
) -> Response {
    assign(&app_state, site_id, req.user_id, AssignedRole::SiteCoordinator).await
}
