//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Session code length must be at least 1")]
    InvalidCodeLength,

    #[error("Session code alphabet must be non-empty alphanumeric without duplicates")]
    InvalidCodeAlphabet,

    #[error("Rate limit budget must allow at least 1 request per window")]
    InvalidRateBudget,

    #[error("Rate limit window must be at least 1 second")]
    InvalidRateWindow,

    #[error("Code generation retry count must be at least 1")]
    InvalidCodeAttempts,
}
