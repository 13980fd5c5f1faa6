use api::routes::routes;
use axum::Router;
use util::{config::AppConfig, otp::OtpStore, state::AppState};

/// Builds a full application router backed by a fresh in-memory database.
/// Configuration overrides go through the global config setters, so tests
/// touching them run serialized.
pub async fn make_test_app() -> (Router, AppState) {
    AppConfig::set_env("test");
    AppConfig::set_jwt_secret("test-secret");
    AppConfig::set_jwt_duration_minutes(60);

    let db = db::test_utils::setup_test_db().await;
    let app_state = AppState::new(db, OtpStore::new());
    let app = Router::new().nest("/api", routes(app_state.clone()));
    (app, app_state)
}

pub const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Hand-rolls a multipart body with the given text fields and files.
pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    for (name, file_name, bytes) in files {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}
