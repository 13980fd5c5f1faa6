//! # users Routes Module
//!
//! Routes for the `/users` endpoint group. The staffing lookups are
//! admin-only; the self-assignment lookup is open to any authenticated
//! user.

pub mod get;

use axum::{Router, middleware::from_fn, routing::get};
use util::state::AppState;

use crate::auth::guards::allow_admin;
use get::{my_site_assignment, site_coordinators, unassigned_workers};

/// Builds the `/users` route group.
///
/// - `GET /users/unassigned` → `unassigned_workers` (admin)
/// - `GET /users/site-coordinators` → `site_coordinators` (admin)
/// - `GET /users/my-site-assignment` → `my_site_assignment`
pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/unassigned",
            get(unassigned_workers).route_layer(from_fn(allow_admin)),
        )
        .route(
            "/site-coordinators",
            get(site_coordinators).route_layer(from_fn(allow_admin)),
        )
        .route("/my-site-assignment", get(my_site_assignment))
}
