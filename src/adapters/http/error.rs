//! HTTP error responses.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::application::RoomServiceError;
use crate::domain::rate_limit_message;

/// Errors surfaced by the REST handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable identity on the request.
    #[error("identity header missing or empty")]
    MissingIdentity,

    #[error("{0}")]
    BadRequest(String),

    #[error("no live room for code \"{0}\"")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    /// Request budget exceeded; carries the denial metadata for headers.
    #[error("{}", rate_limit_message(*.retry_after_secs))]
    RateLimited {
        limit: u32,
        retry_after_secs: Option<u32>,
    },

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingIdentity => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::MissingIdentity => "missingIdentity",
            ApiError::BadRequest(_) => "badRequest",
            ApiError::NotFound(_) => "roomNotFound",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::RateLimited { .. } => "rateLimited",
            ApiError::Unavailable(_) => "unavailable",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));
        let mut response = (self.status(), body).into_response();

        if let ApiError::RateLimited {
            limit,
            retry_after_secs,
        } = self
        {
            let headers = response.headers_mut();
            if let Ok(v) = HeaderValue::from_str(&limit.to_string()) {
                headers.insert("x-ratelimit-limit", v);
            }
            headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
            if let Some(secs) = retry_after_secs {
                if let Ok(v) = HeaderValue::from_str(&secs.to_string()) {
                    headers.insert("retry-after", v);
                }
            }
        }

        response
    }
}

impl From<RoomServiceError> for ApiError {
    fn from(err: RoomServiceError) -> Self {
        match err {
            RoomServiceError::NotFound(code) => ApiError::NotFound(code),
            RoomServiceError::NotHost => {
                ApiError::Forbidden("only the host may close the room".to_string())
            }
            RoomServiceError::CodeSpaceExhausted => ApiError::Unavailable(err.to_string()),
            RoomServiceError::Unavailable(msg) => ApiError::Unavailable(msg),
        }
    }
}
