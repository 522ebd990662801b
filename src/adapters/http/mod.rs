//! HTTP surface: REST handlers, identity extraction, middleware.

pub mod error;
pub mod identity;
pub mod middleware;
mod router;

pub use error::ApiError;
pub use identity::Identity;
pub use router::{app_router, AppState};
