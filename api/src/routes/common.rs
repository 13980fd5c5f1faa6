//! Shared helpers for route handlers: validation error formatting and
//! multipart form collection.

use axum::{
    Json,
    extract::Multipart,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::collections::HashMap;
use validator::ValidationErrors;

/// Flattens validator output into a field-to-message map, keeping the first
/// message per field.
pub fn validation_error_map(errors: &ValidationErrors) -> HashMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.first()
                .and_then(|e| e.message.as_ref())
                .map(|m| (field.to_string(), m.to_string()))
        })
        .collect()
}

/// The standard 400 for a failed `validate()` call. The field map rides in
/// `data` so clients can attach messages to inputs.
pub fn validation_error_response(errors: &ValidationErrors) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "success": false,
            "data": validation_error_map(errors),
            "message": "Validation failed",
        })),
    )
        .into_response()
}

/// Same envelope for field checks done outside the validator derive.
pub fn field_errors_response(errors: HashMap<&str, &str>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "success": false,
            "data": errors,
            "message": "Validation failed",
        })),
    )
        .into_response()
}

pub fn field_error_response(field: &str, message: &str) -> Response {
    field_errors_response(HashMap::from([(field, message)]))
}

/// One file part pulled from a multipart body.
pub struct UploadedFile {
    pub field_name: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Text fields and file parts of a multipart request, collected up front so
/// handlers can validate before touching storage.
#[derive(Default)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub files: Vec<UploadedFile>,
}

impl FormData {
    /// Drains a multipart stream. Parts carrying a filename land in `files`;
    /// everything else is read as UTF-8 text.
    pub async fn collect(mut multipart: Multipart) -> Result<Self, String> {
        let mut form = FormData::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| format!("Invalid multipart body: {e}"))?
        {
            let name = field.name().unwrap_or_default().to_owned();

            if let Some(file_name) = field.file_name().map(str::to_owned) {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read file field '{name}': {e}"))?;
                form.files.push(UploadedFile {
                    field_name: name,
                    file_name,
                    bytes: bytes.to_vec(),
                });
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read field '{name}': {e}"))?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn file(&self, field_name: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field_name == field_name)
    }
}

/// Parses a latitude/longitude pair, enforcing the valid coordinate ranges.
/// Errors name the offending field so they can join a field map.
pub fn parse_coordinates(lat: &str, lng: &str) -> Result<(f64, f64), (&'static str, String)> {
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|_| ("lat", "Latitude must be a valid number".to_string()))?;
    let longitude: f64 = lng
        .trim()
        .parse()
        .map_err(|_| ("lng", "Longitude must be a valid number".to_string()))?;

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(("lat", "Latitude must be between -90 and 90".into()));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(("lng", "Longitude must be between -180 and 180".into()));
    }

    Ok((latitude, longitude))
}
