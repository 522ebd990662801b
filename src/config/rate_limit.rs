//! Rate limit budgets per guarded route

use serde::Deserialize;

use super::error::ValidationError;
use crate::ports::Route;

/// Budget for one route: N requests per fixed window.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RouteBudget {
    /// Maximum requests per window
    pub requests_per_window: u32,

    /// Window duration in seconds
    pub window_secs: u32,
}

impl RouteBudget {
    pub const fn new(requests_per_window: u32, window_secs: u32) -> Self {
        Self {
            requests_per_window,
            window_secs,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.requests_per_window == 0 {
            return Err(ValidationError::InvalidRateBudget);
        }
        if self.window_secs == 0 {
            return Err(ValidationError::InvalidRateWindow);
        }
        Ok(())
    }
}

/// Rate limit configuration.
///
/// Budgets are injected into the limiter adapters at construction; there
/// is no ambient global configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Payload publication per sender identity
    #[serde(default = "default_publish")]
    pub publish: RouteBudget,

    /// Room creation (code issue) per requesting identity
    #[serde(default = "default_create_room")]
    pub create_room: RouteBudget,

    /// HTTP query endpoints per caller
    #[serde(default = "default_query")]
    pub query: RouteBudget,
}

impl RateLimitConfig {
    /// The budget applicable to a route.
    pub fn budget_for(&self, route: Route) -> RouteBudget {
        match route {
            Route::Publish => self.publish,
            Route::CreateRoom => self.create_room,
            Route::Query => self.query,
        }
    }

    /// Validate rate limit configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.publish.validate()?;
        self.create_room.validate()?;
        self.query.validate()?;
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            publish: default_publish(),
            create_room: default_create_room(),
            query: default_query(),
        }
    }
}

fn default_publish() -> RouteBudget {
    RouteBudget::new(60, 60)
}

fn default_create_room() -> RouteBudget {
    RouteBudget::new(10, 60)
}

fn default_query() -> RouteBudget {
    RouteBudget::new(120, 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RateLimitConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.budget_for(Route::Publish).requests_per_window, 60);
        assert_eq!(config.budget_for(Route::CreateRoom).requests_per_window, 10);
        assert_eq!(config.budget_for(Route::Query).requests_per_window, 120);
    }

    #[test]
    fn rejects_zero_budget() {
        let config = RateLimitConfig {
            publish: RouteBudget::new(0, 60),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidRateBudget));
    }

    #[test]
    fn rejects_zero_window() {
        let config = RateLimitConfig {
            query: RouteBudget::new(10, 0),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidRateWindow));
    }
}
