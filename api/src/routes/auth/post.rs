use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::user::{Model as UserModel, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use util::config::AppConfig;
use util::otp::OtpVerification;
use util::state::AppState;
use validator::Validate;

use crate::auth::generate_jwt;
use crate::response::ApiResponse;
use crate::routes::common::{
    FormData, field_error_response, field_errors_response, validation_error_response,
};
use crate::services::uploads::store_upload;

#[derive(Debug, Serialize, Default)]
pub struct UserResponse {
    pub id: i64,
    pub country_code: String,
    pub mobile_number: String,
    pub full_name: Option<String>,
    pub role: String,
    pub profile_image_url: Option<String>,
    pub token: String,
    pub expires_at: String,
}

impl UserResponse {
    fn from_user(user: UserModel, token: String, expires_at: String) -> Self {
        Self {
            id: user.id,
            country_code: user.country_code,
            mobile_number: user.mobile_number,
            full_name: user.full_name,
            role: user.role.to_string(),
            profile_image_url: user.profile_image_url,
            token,
            expires_at,
        }
    }
}

/// POST /auth/register
///
/// Register a new account. The body is multipart so an optional profile
/// image can ride along with the text fields.
///
/// ### Fields
/// - `country_code` (required)
/// - `mobile_number` (required)
/// - `password` (required, min 6 characters)
/// - `full_name` (optional)
/// - `role` (optional, defaults to `worker`)
/// - `profile_image` (optional file)
///
/// ### Responses
/// - `201 Created` with the new account and a JWT
/// - `400 Bad Request` on missing fields or an unknown role
/// - `409 Conflict` when the mobile number is already registered
pub async fn register(State(app_state): State<AppState>, multipart: Multipart) -> Response {
    let form = match FormData::collect(multipart).await {
        Ok(form) => form,
        Err(msg) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<UserResponse>::error(msg)),
            )
                .into_response();
        }
    };

    let country_code = form.text("country_code").unwrap_or_default().trim().to_owned();
    let mobile_number = form.text("mobile_number").unwrap_or_default().trim().to_owned();
    let password = form.text("password").unwrap_or_default().to_owned();

    let mut errors = HashMap::new();
    if country_code.is_empty() {
        errors.insert("country_code", "Country code is required");
    }
    if mobile_number.is_empty() {
        errors.insert("mobile_number", "Mobile number is required");
    }
    if password.len() < 6 {
        errors.insert("password", "Password must be at least 6 characters");
    }
    if !errors.is_empty() {
        return field_errors_response(errors);
    }

    let role = match form.text("role") {
        None => Role::Worker,
        Some(raw) => match Role::from_str(raw.trim()) {
            Ok(role) => role,
            Err(_) => {
                return field_error_response(
                    "role",
                    "Invalid role. Must be worker, site_coordinator, or admin",
                );
            }
        },
    };

    let db = app_state.db();

    match UserModel::find_by_mobile(db, Some(&country_code), &mobile_number).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::<UserResponse>::error(
                    "A user with this mobile number already exists",
                )),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<UserResponse>::error(format!("Database error: {e}"))),
            )
                .into_response();
        }
    }

    let profile_image_url = match form.file("profile_image") {
        None => None,
        Some(file) => match store_upload("profiles", &file.file_name, &file.bytes).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::error!(error = %e, "Failed to store profile image");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<UserResponse>::error("Failed to store profile image")),
                )
                    .into_response();
            }
        },
    };

    let full_name = form.text("full_name").map(str::trim).filter(|n| !n.is_empty());

    match UserModel::create(
        db,
        &country_code,
        &mobile_number,
        &password,
        full_name,
        role,
        profile_image_url.as_deref(),
    )
    .await
    {
        Ok(user) => {
            let (token, expiry) = generate_jwt(user.id, user.role);
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(
                    UserResponse::from_user(user, token, expiry),
                    "User registered successfully",
                )),
            )
                .into_response()
        }
        Err(e) => {
            // The unique index on (country_code, mobile_number) can still
            // fire if two registrations race.
            let msg = e.to_string();
            if msg.contains("uq_users_country_code_mobile_number") {
                return (
                    StatusCode::CONFLICT,
                    Json(ApiResponse::<UserResponse>::error(
                        "A user with this mobile number already exists",
                    )),
                )
                    .into_response();
            }
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<UserResponse>::error(format!("Database error: {e}"))),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    pub country_code: Option<String>,
    #[validate(length(min = 1, message = "Mobile number is required"))]
    pub mobile_number: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// POST /auth/login
///
/// Authenticate an existing user and issue a JWT.
///
/// ### Responses
/// - `200 OK` with the account and a fresh token
/// - `401 Unauthorized` on a bad number or password
pub async fn login(State(app_state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    if let Err(validation_errors) = req.validate() {
        return validation_error_response(&validation_errors);
    }

    let db = app_state.db();

    let user = match UserModel::find_by_mobile(db, req.country_code.as_deref(), &req.mobile_number)
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::<UserResponse>::error("Invalid mobile number or password")),
            )
                .into_response();
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<UserResponse>::error(format!("Database error: {e}"))),
            )
                .into_response();
        }
    };

    if !user.verify_password(&req.password) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<UserResponse>::error("Invalid mobile number or password")),
        )
            .into_response();
    }

    if let Err(e) = UserModel::touch_last_login(db, user.id).await {
        tracing::warn!(error = %e, user_id = user.id, "Failed to update last login timestamp");
    }

    let (token, expiry) = generate_jwt(user.id, user.role);
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            UserResponse::from_user(user, token, expiry),
            "Login successful",
        )),
    )
        .into_response()
}

#[derive(Debug, Deserialize, Validate)]
pub struct OtpRequest {
    #[validate(length(min = 1, message = "Country code is required"))]
    pub country_code: String,
    #[validate(length(min = 1, message = "Mobile number is required"))]
    pub mobile_number: String,
}

#[derive(Debug, Serialize, Default)]
pub struct OtpIssued {
    /// Echoed back outside production so clients can be tested without an
    /// SMS gateway.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// POST /auth/otp/request
///
/// Issues a fresh one-time code for a mobile number, replacing any code
/// issued earlier. Delivery is out of scope here; the code is logged, and
/// echoed in the response outside production.
pub async fn request_otp(
    State(app_state): State<AppState>,
    Json(req): Json<OtpRequest>,
) -> Response {
    if let Err(validation_errors) = req.validate() {
        return validation_error_response(&validation_errors);
    }

    let code = app_state.otp().issue(&req.country_code, &req.mobile_number);
    tracing::info!(mobile = %req.mobile_number, "OTP issued");

    let echo = if AppConfig::global().env != "production" {
        Some(code)
    } else {
        None
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(OtpIssued { code: echo }, "OTP sent successfully")),
    )
        .into_response()
}

#[derive(Debug, Deserialize, Validate)]
pub struct OtpVerifyRequest {
    #[validate(length(min = 1, message = "Country code is required"))]
    pub country_code: String,
    #[validate(length(min = 1, message = "Mobile number is required"))]
    pub mobile_number: String,
    #[validate(length(min = 1, message = "Code is required"))]
    pub code: String,
}

/// POST /auth/otp/verify
///
/// Verifies a one-time code. Success consumes the code; three wrong
/// attempts exhaust it.
pub async fn verify_otp(
    State(app_state): State<AppState>,
    Json(req): Json<OtpVerifyRequest>,
) -> Response {
    if let Err(validation_errors) = req.validate() {
        return validation_error_response(&validation_errors);
    }

    let outcome = app_state
        .otp()
        .verify(&req.country_code, &req.mobile_number, &req.code);

    match outcome {
        OtpVerification::Verified => (
            StatusCode::OK,
            Json(ApiResponse::success(
                crate::auth::guards::Empty,
                "OTP verified successfully",
            )),
        ),
        OtpVerification::NotFound => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("No OTP found for this number. Please request a new one.")),
        ),
        OtpVerification::Expired => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("OTP has expired. Please request a new one.")),
        ),
        OtpVerification::TooManyAttempts => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Too many attempts. Please request a new OTP.")),
        ),
        OtpVerification::Mismatch { attempts_remaining } => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!(
                "Invalid OTP. {attempts_remaining} attempts remaining."
            ))),
        ),
    }
    .into_response()
}
