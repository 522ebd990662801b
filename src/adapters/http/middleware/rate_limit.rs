//! Rate limiting middleware for the REST surface.
//!
//! Each request consumes one token from the caller's budget on the route
//! class it hits. Rate limit status is returned in standard headers:
//! - `X-RateLimit-Limit`: maximum requests allowed in the window
//! - `X-RateLimit-Remaining`: requests remaining in the current window
//! - `X-RateLimit-Reset`: unix timestamp when the window resets
//! - `Retry-After`: seconds to wait (only on 429)
//!
//! The limiter failing is not a reason to refuse traffic: checks fail
//! open with a warning.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::identity::IDENTITY_HEADER;
use crate::ports::{RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter, Route};

pub type RateLimiterState = Arc<dyn RateLimiter>;

/// Enforce the caller's budget for the route class of this request.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiterState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let route = classify(request.method(), request.uri().path());
    let caller = caller_identity(&request, connect_info.as_ref());
    let key = RateLimitKey::new(caller, route);

    let status = match limiter.check(key).await {
        Ok(RateLimitResult::Allowed(status)) => Some(status),
        Ok(RateLimitResult::Denied(denied)) => {
            return ApiError::RateLimited {
                limit: denied.limit,
                retry_after_secs: denied.retry_after_secs,
            }
            .into_response();
        }
        Err(e) => {
            warn!(error = %e, "rate limiter unavailable, failing open");
            None
        }
    };

    let mut response = next.run(request).await;
    if let Some(status) = status {
        add_rate_limit_headers(&mut response, &status);
    }
    response
}

/// Route class for a request. Issuing codes has its own tight budget;
/// everything else on the REST surface shares the query budget.
fn classify(method: &Method, path: &str) -> Route {
    if method == Method::POST && path.ends_with("/rooms") {
        Route::CreateRoom
    } else {
        Route::Query
    }
}

/// The identity the budget is charged to: the authenticated identity when
/// present, the client IP otherwise.
fn caller_identity<B>(
    request: &axum::http::Request<B>,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
) -> String {
    if let Some(identity) = request
        .headers()
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.trim().is_empty())
    {
        return identity.to_string();
    }
    extract_client_ip(request, connect_info).unwrap_or_else(|| "anonymous".to_string())
}

/// Extract client IP from request, checking forwarded headers first.
///
/// Order of precedence:
/// 1. X-Forwarded-For header (first IP in list)
/// 2. X-Real-IP header
/// 3. ConnectInfo socket address
fn extract_client_ip<B>(
    request: &axum::http::Request<B>,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
) -> Option<String> {
    if let Some(forwarded) = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(first_ip) = forwarded.split(',').next() {
            return Some(first_ip.trim().to_string());
        }
    }

    if let Some(real_ip) = request
        .headers()
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
    {
        return Some(real_ip.to_string());
    }

    connect_info.map(|ci| ci.0.ip().to_string())
}

fn add_rate_limit_headers(response: &mut Response, status: &RateLimitStatus) {
    let headers = response.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&status.limit.to_string()) {
        headers.insert("x-ratelimit-limit", v);
    }
    if let Ok(v) = HeaderValue::from_str(&status.remaining.to_string()) {
        headers.insert("x-ratelimit-remaining", v);
    }
    if let Ok(v) = HeaderValue::from_str(&status.reset_at.as_unix_secs().to_string()) {
        headers.insert("x-ratelimit-reset", v);
    }
}
