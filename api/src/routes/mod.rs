//! HTTP route entry point for `/api/...`.
//!
//! This module defines all HTTP entry points under the `/api` namespace.
//! Routes are organized by domain (authentication, attendance, announcements,
//! sites, users, health), each protected via appropriate access control
//! middleware.
//!
//! Route groups include:
//! - `/health` → Health check endpoint (public)
//! - `/auth` → Registration, login, OTP, and current-user endpoints (public)
//! - `/attendance` → Punch in/out and attendance queries (authenticated users)
//! - `/announcements` → Site announcement feed and authoring
//! - `/sites` → Site management and assignment (mostly admin-only)
//! - `/users` → Staffing lookups (admin) and self-assignment lookup

use crate::auth::guards::allow_authenticated;
use crate::routes::{
    announcements::announcements_routes, attendance::attendance_routes, auth::auth_routes,
    health::health_routes, sites::sites_routes, users::users_routes,
};
use axum::{Router, middleware::from_fn};
use util::state::AppState;

pub mod announcements;
pub mod attendance;
pub mod auth;
pub mod common;
pub mod health;
pub mod sites;
pub mod users;

/// Builds the complete application router for all HTTP endpoints.
///
/// # Route Structure:
/// - `/health` → Health check endpoint (no authentication required).
/// - `/auth` → Registration, login, and OTP endpoints; `/auth/me` carries its
///   own extraction and needs no guard here.
/// - `/attendance` → Punching and attendance queries (requires authentication).
/// - `/announcements` → Feed and authoring (requires authentication; authoring
///   routes add their own coordinator guard).
/// - `/sites` → Site management (per-route admin/coordinator guards).
/// - `/users` → Staffing lookups (per-route admin guards).
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes())
        .nest(
            "/attendance",
            attendance_routes().route_layer(from_fn(allow_authenticated)),
        )
        .nest(
            "/announcements",
            announcements_routes().route_layer(from_fn(allow_authenticated)),
        )
        .nest(
            "/sites",
            sites_routes().route_layer(from_fn(allow_authenticated)),
        )
        .nest(
            "/users",
            users_routes().route_layer(from_fn(allow_authenticated)),
        )
        .with_state(app_state)
}
