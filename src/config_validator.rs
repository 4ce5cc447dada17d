use crate::error::ThrottlerError;
use std::net::SocketAddr;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validates service settings for consistency and correctness
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a Redis URL
    pub fn validate_redis_url(url: &str) -> Result<(), ThrottlerError> {
        if url.is_empty() {
            return Err(ThrottlerError::Configuration(
                "Redis URL cannot be empty".to_string(),
            ));
        }

        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            return Err(ThrottlerError::Configuration(
                "Redis URL must start with 'redis://' or 'rediss://'".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates a bind address
    pub fn validate_bind_address(address: &str) -> Result<(), ThrottlerError> {
        address.parse::<SocketAddr>().map(|_| ()).map_err(|_| {
            ThrottlerError::Configuration(format!(
                "Bind address '{}' must be in ip:port format",
                address
            ))
        })
    }

    /// Validates a tracing level name
    pub fn validate_log_level(level: &str) -> Result<(), ThrottlerError> {
        if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            return Err(ThrottlerError::Configuration(format!(
                "Invalid log level '{}'. Must be one of: {:?}",
                level, LOG_LEVELS
            )));
        }

        Ok(())
    }
}
