//! # announcements Routes Module
//!
//! Routes for the `/announcements` endpoint group. Reading the feed is open
//! to any authenticated user; posting requires coordinator or admin
//! standing, and deactivation is reserved for the author.

pub mod get;
pub mod patch;
pub mod post;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, patch, post},
};
use util::state::AppState;

use crate::auth::guards::allow_coordinator_or_admin;
use get::{my_announcements, my_sites_feed};
use patch::deactivate_announcement;
use post::create_announcement;

/// Builds the `/announcements` route group.
///
/// - `GET /announcements/my-sites` → `my_sites_feed`
/// - `POST /announcements` → `create_announcement` (coordinator or admin)
/// - `GET /announcements/my` → `my_announcements` (coordinator or admin)
/// - `PATCH /announcements/{announcement_id}/deactivate` → `deactivate_announcement` (creator only, checked in the handler)
pub fn announcements_routes() -> Router<AppState> {
    Router::new()
        .route("/my-sites", get(my_sites_feed))
        .route(
            "/",
            post(create_announcement).route_layer(from_fn(allow_coordinator_or_admin)),
        )
        .route(
            "/my",
            get(my_announcements).route_layer(from_fn(allow_coordinator_or_admin)),
        )
        .route(
            "/{announcement_id}/deactivate",
            patch(deactivate_announcement),
        )
}
