//! # sites Routes Module
//!
//! Routes for the `/sites` endpoint group. Site management and assignment
//! are admin operations; listing one's own sites and workers is available
//! further down the role ladder.

pub mod delete;
pub mod get;
pub mod post;

use axum::{
    Router,
    middleware::from_fn,
    routing::{delete, get, post},
};
use util::state::AppState;

use crate::auth::guards::allow_admin;
use delete::unassign_worker;
use get::{all_sites, my_sites, site_workers, sites_without_coordinator};
use post::{assign_coordinator, assign_worker, create_site};

/// Builds the `/sites` route group.
///
/// - `GET /sites/all` → `all_sites` (admin)
/// - `GET /sites/my` → `my_sites`
/// - `GET /sites/without-coordinator` → `sites_without_coordinator` (admin)
/// - `POST /sites` → `create_site` (admin)
/// - `GET /sites/{site_id}/workers` → `site_workers` (site-scoped for non-admins)
/// - `POST /sites/{site_id}/assign-worker` → `assign_worker` (admin)
/// - `POST /sites/{site_id}/assign-coordinator` → `assign_coordinator` (admin)
/// - `DELETE /sites/{site_id}/workers/{user_id}` → `unassign_worker` (admin)
pub fn sites_routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(all_sites).route_layer(from_fn(allow_admin)))
        .route("/my", get(my_sites))
        .route(
            "/without-coordinator",
            get(sites_without_coordinator).route_layer(from_fn(allow_admin)),
        )
        .route("/", post(create_site).route_layer(from_fn(allow_admin)))
        .route("/{site_id}/workers", get(site_workers))
        .route(
            "/{site_id}/assign-worker",
            post(assign_worker).route_layer(from_fn(allow_admin)),
        )
        .route(
            "/{site_id}/assign-coordinator",
            post(assign_coordinator).route_layer(from_fn(allow_admin)),
        )
        .route(
            "/{site_id}/workers/{user_id}",
            delete(unassign_worker).route_layer(from_fn(allow_admin)),
        )
}
