//! Caller identity extraction.
//!
//! Authentication is an external collaborator: by the time a request
//! reaches this service, a trusted front proxy has already verified the
//! caller and stamped the identity on the `x-identity` header. This
//! extractor only enforces that the header is present and non-empty.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::domain::TenantId;

use super::error::ApiError;

pub const IDENTITY_HEADER: &str = "x-identity";

/// The authenticated identity on a request.
#[derive(Debug, Clone)]
pub struct Identity(pub TenantId);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::MissingIdentity)?;
        let identity = TenantId::new(raw).map_err(|_| ApiError::MissingIdentity)?;
        Ok(Identity(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Identity, ApiError> {
        let (mut parts, _) = request.into_parts();
        Identity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_identity_header() {
        let request = Request::builder()
            .uri("/api/sessions")
            .header(IDENTITY_HEADER, "alice")
            .body(())
            .unwrap();

        let Identity(identity) = extract(request).await.unwrap();
        assert_eq!(identity.as_str(), "alice");
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let request = Request::builder().uri("/api/sessions").body(()).unwrap();
        assert!(matches!(
            extract(request).await,
            Err(ApiError::MissingIdentity)
        ));
    }

    #[tokio::test]
    async fn empty_header_is_rejected() {
        let request = Request::builder()
            .uri("/api/sessions")
            .header(IDENTITY_HEADER, "  ")
            .body(())
            .unwrap();
        assert!(matches!(
            extract(request).await,
            Err(ApiError::MissingIdentity)
        ));
    }
}
