//! Maps service failures onto HTTP responses with a `{"error": message}` body.

use std::any::Any;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::controllers::song::SongError;

#[derive(Debug)]
pub enum ApiError {
    /// Malformed id, body or input (400)
    BadRequest(String),

    /// (404)
    NotFound(String),

    /// Known path, unsupported method (405)
    MethodNotAllowed(String),

    /// Constraint violation reported by the database (409)
    Conflict(String),

    /// Anything else (500); the cause is logged, only the context is returned
    Internal(String),
}

impl ApiError {
    pub fn invalid_id() -> Self {
        ApiError::BadRequest("Invalid ID format".to_string())
    }

    /// Wraps a service error with the handler's context message.
    pub fn from_song(context: &str, err: SongError) -> Self {
        match err {
            SongError::InvalidInput(reason) => {
                ApiError::BadRequest(format!("{}: {}", context, reason))
            }
            SongError::NotFound => ApiError::NotFound("Song not found".to_string()),
            SongError::Conflict(detail) => ApiError::Conflict(format!("{}: {}", context, detail)),
            SongError::Database(e) => {
                error!("{}: {}", context, e);
                ApiError::Internal(context.to_string())
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(m)
            | ApiError::NotFound(m)
            | ApiError::MethodNotAllowed(m)
            | ApiError::Conflict(m)
            | ApiError::Internal(m) => m,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

/// Router fallback for paths that match no route.
pub async fn not_found_fallback() -> ApiError {
    ApiError::NotFound("Not Found".to_string())
}

/// Fallback for a matched path without a handler for the request method.
pub async fn method_not_allowed_fallback() -> ApiError {
    ApiError::MethodNotAllowed("Method Not Allowed".to_string())
}

/// Last-resort answer for a handler that panicked.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("handler panicked: {}", detail);
    ApiError::Internal("Internal Server Error".to_string()).into_response()
}
