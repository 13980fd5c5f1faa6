use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use axum::{Json, Router, routing::get};
use util::state::AppState;

/// GET /health
///
/// Liveness probe; requires no authentication.
async fn health() -> Json<ApiResponse<Empty>> {
    Json(ApiResponse::success(Empty, "ok"))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health))
}
