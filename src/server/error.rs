//! JSON error responses

use crate::utils::error::VidgateError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    /// Map an internal failure, keeping request errors as 400
    pub fn from_anyhow(prefix: &str, err: &anyhow::Error) -> Self {
        let message = if prefix.is_empty() {
            err.to_string()
        } else {
            format!("{}: {}", prefix, err)
        };
        match err.downcast_ref::<VidgateError>() {
            Some(e) if e.is_client_error() => Self::bad_request(message),
            _ => Self::internal(message),
        }
    }
}

impl From<VidgateError> for ApiError {
    fn from(err: VidgateError) -> Self {
        if err.is_client_error() {
            Self::bad_request(err.to_string())
        } else {
            Self::internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
