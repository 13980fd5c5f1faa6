use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::site::Model as SiteModel;
use db::models::site_user_assignment::Model as AssignmentModel;
use db::models::user::Role;
use sea_orm::EntityTrait;
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

/// GET /sites/all
///
/// Every site on record.
pub async fn all_sites(State(app_state): State<AppState>) -> Response {
    match SiteModel::all(app_state.db()).await {
        Ok(sites) => (
            StatusCode::OK,
            Json(ApiResponse::success(sites, "Sites fetched successfully")),
        )
            .into_response(),
        Err(e) => db_error(e),
    }
}

/// GET /sites/my
///
/// Sites the caller holds an assignment on.
pub async fn my_sites(State(app_state): State<AppState>, AuthUser(claims): AuthUser) -> Response {
    match SiteModel::for_user(app_state.db(), claims.sub).await {
        Ok(sites) => (
            StatusCode::OK,
            Json(ApiResponse::success(sites, "Sites fetched successfully")),
        )
            .into_response(),
        Err(e) => db_error(e),
    }
}

/// GET /sites/without-coordinator
///
/// Sites with no coordinator assignment, used when staffing new sites.
pub async fn sites_without_coordinator(State(app_state): State<AppState>) -> Response {
    match SiteModel::without_coordinator(app_state.db()).await {
        Ok(sites) => (
            StatusCode::OK,
            Json(ApiResponse::success(sites, "Sites fetched successfully")),
        )
            .into_response(),
        Err(e) => db_error(e),
    }
}

#[derive(Debug, Serialize)]
pub struct SiteWorker {
    pub id: i64,
    pub full_name: Option<String>,
    pub country_code: String,
    pub mobile_number: String,
    pub role: String,
    pub assigned_role: String,
    pub assigned_at: String,
}

/// GET /sites/{site_id}/workers
///
/// Everyone assigned to a site. Non-admins may only list sites they are
/// assigned to; admins may list any site.
pub async fn site_workers(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(site_id): Path<i64>,
) -> Response {
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
        Err(e) => return db_error(e),
    }

    if claims.role != Role::Admin {
        let site_ids = match AssignmentModel::site_ids_for_user(db, claims.sub).await {
            Ok(ids) => ids,
            Err(e) => return db_error(e),
        };
        if !site_ids.contains(&site_id) {
            return (
                StatusCode::FORBIDDEN,
                Json(ApiResponse::<Empty>::error("You are not assigned to this site")),
            )
                .into_response();
        }
    }

    match AssignmentModel::users_for_site(db, site_id).await {
        Ok(rows) => {
            let workers: Vec<SiteWorker> = rows
                .into_iter()
                .map(|(assignment, user)| SiteWorker {
                    id: user.id,
                    full_name: user.full_name,
                    country_code: user.country_code,
                    mobile_number: user.mobile_number,
                    role: user.role.to_string(),
                    assigned_role: assignment.assigned_role.to_string(),
                    assigned_at: assignment.assigned_at.to_rfc3339(),
                })
                .collect();
            (
                StatusCode::OK,
                Json(ApiResponse::success(workers, "Site workers fetched successfully")),
            )
                .into_response()
        }
        Err(e) => db_error(e),
    }
}
