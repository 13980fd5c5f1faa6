//! # attendance Routes Module
//!
//! Routes for the `/attendance` endpoint group. Punching is always done on
//! the caller's own behalf; the cross-worker filter is open to any
//! authenticated user but scoped to sites they are assigned to.

pub mod get;
pub mod post;

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

use get::{filter_records, my_records, today_status};
use post::{punch_in, punch_out};

/// Builds the `/attendance` route group.
///
/// - `POST /attendance/punch-in` → `punch_in`
/// - `POST /attendance/punch-out` → `punch_out`
/// - `GET /attendance/me` → `my_records`
/// - `GET /attendance/status/today` → `today_status`
/// - `GET /attendance/filter` → `filter_records` (site-scoped for non-admins)
pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/punch-in", post(punch_in))
        .route("/punch-out", post(punch_out))
        .route("/me", get(my_records))
        .route("/status/today", get(today_status))
        .route("/filter", get(filter_records))
}
