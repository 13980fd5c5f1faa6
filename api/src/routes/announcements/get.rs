use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::announcement::{Model as AnnouncementModel, SiteFilter};
use serde::Deserialize;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use crate::routes::common::field_error_response;

/// GET /announcements/my-sites
///
/// The feed for the authenticated user: announcements on their assigned
/// sites plus global posts, active and unexpired only, highest priority
/// first. Admins see every announcement authored by an admin instead.
pub async fn my_sites_feed(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Response {
    match AnnouncementModel::for_user(app_state.db(), claims.sub, claims.role).await {
        Ok(feed) => (
            StatusCode::OK,
            Json(ApiResponse::success(feed, "Announcements fetched successfully")),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Empty>::error(format!("Failed to fetch announcements: {e}"))),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct MyAnnouncementsQuery {
    /// A site id, or the literal `all` for global (unsited) posts. Absent
    /// means everything.
    pub site_id: Option<String>,
}

/// GET /announcements/my
///
/// Everything the caller has authored, newest first, expired entries
/// included and flagged.
pub async fn my_announcements(
    State(app_state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<MyAnnouncementsQuery>,
) -> Response {
    let filter = match query.site_id.as_deref() {
        None => SiteFilter::Any,
        Some("all") => SiteFilter::GlobalOnly,
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(id) => SiteFilter::Site(id),
            Err(_) => {
                return field_error_response("site_id", "Site ID must be an integer or 'all'");
            }
        },
    };

    match AnnouncementModel::mine(app_state.db(), claims.sub, filter).await {
        Ok(announcements) => (
            StatusCode::OK,
            Json(ApiResponse::success(announcements, "Announcements fetched successfully")),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Empty>::error(format!("Failed to fetch announcements: {e}"))),
        )
            .into_response(),
    }
}
