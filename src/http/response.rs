//! Response envelopes.
//!
//! Every JSON response of the keep-alive entrypoint carries a top-level
//! `success` flag; payload fields are flattened next to it.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

#[derive(Debug, Serialize)]
struct ApiError {
    success: bool,
    error: String,
}

pub fn ok<T: Serialize>(body: T) -> Response {
    (StatusCode::OK, Json(ApiResponse { success: true, body })).into_response()
}

pub fn error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ApiError {
        success: false,
        error: message.into(),
    };
    (status, Json(body)).into_response()
}

pub fn method_not_allowed() -> Response {
    let mut response = error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    response
        .headers_mut()
        .insert(header::ALLOW, header::HeaderValue::from_static(ALLOWED_METHODS));
    response
}

/// CORS preflight: 200, permissive headers, no body.
pub fn preflight() -> Response {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"),
            (header::ACCESS_CONTROL_MAX_AGE, "86400"),
        ],
    )
        .into_response()
}
