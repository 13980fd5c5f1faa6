use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use db::models::site_user_assignment::Model as AssignmentModel;
use db::models::user;
use sea_orm::EntityTrait;
use serde::Serialize;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;

#[derive(Debug, Serialize, Default)]
pub struct MeResponse {
    pub id: i64,
    pub country_code: String,
    pub mobile_number: String,
    pub full_name: Option<String>,
    pub role: String,
    pub profile_image_url: Option<String>,
    pub site_id: Option<i64>,
    pub site_name: Option<String>,
}

/// GET /auth/me
///
/// The authenticated account, with its current site assignment if one
/// exists.
pub async fn get_me(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> impl IntoResponse {
    let db = app_state.db();

    let user = match user::Entity::find_by_id(claims.sub).one(db).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<MeResponse>::error("User not found")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let assignment = match AssignmentModel::first_for_user(db, user.id).await {
        Ok(assignment) => assignment,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let (site_id, site_name) = match assignment {
        Some((_, site)) => (Some(site.id), Some(site.name)),
        None => (None, None),
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            MeResponse {
                id: user.id,
                country_code: user.country_code,
                mobile_number: user.mobile_number,
                full_name: user.full_name,
                role: user.role.to_string(),
                profile_image_url: user.profile_image_url,
                site_id,
                site_name,
            },
            "User fetched successfully",
        )),
    )
}
