// # Routes Module
//
// HTTP route handlers of the dashboard gateway, grouped by concern:
// - `health`: liveness endpoint
// - `auth`: login, logout and session state (JSON and SSE)
// - `gifts`: gift-slot views and live countdowns
// - `views`: gated dashboard pages backed by the gifting backend

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::backend::BackendError;

/// Health check and monitoring endpoints
pub mod health;

/// Session endpoints
pub mod auth;

/// Gift-slot endpoints
pub mod gifts;

/// Dashboard pages
pub mod views;

/// Handler error for calls that depend on the backend
#[derive(Debug)]
pub struct ApiError(BackendError);

impl From<BackendError> for ApiError {
    fn from(error: BackendError) -> Self {
        Self(error)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            BackendError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!("[Routes] Backend call failed ({}): {}", status, self.0);
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
