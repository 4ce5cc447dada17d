use crate::config_validator::ConfigValidator;
use crate::error::{ThrottlerError, ThrottlerResult};
use clap::Parser;
use std::time::Duration;
use validator::Validate;

/// Service settings, read from command line flags or the environment
#[derive(Debug, Clone, Parser, Validate)]
#[command(name = "ttl-throttle", version, about)]
pub struct Settings {
    /// Server bind address
    #[arg(long, env = "BIND_ADDRESS", default_value = "127.0.0.1:3000")]
    pub bind_address: String,

    /// Redis connection URL, empty for the in-memory store
    #[arg(long, env = "REDIS_URL", default_value = "")]
    pub redis_url: String,

    /// Namespace prefixed to every bucket key
    #[arg(long, env = "THROTTLE_NAMESPACE", default_value = "ttl-throttle")]
    #[validate(length(min = 1, max = 128))]
    pub namespace: String,

    /// Tokens per window
    #[arg(long, env = "THROTTLE_LIMIT", default_value_t = 100)]
    pub limit: u64,

    /// Window length in milliseconds
    #[arg(long = "ttl-ms", env = "THROTTLE_TTL_MS", default_value_t = 60_000)]
    pub ttl_ms: u64,

    /// How often the in-memory store drops expired buckets, in milliseconds
    #[arg(long = "purge-interval-ms", env = "PURGE_INTERVAL_MS", default_value_t = 30_000)]
    #[validate(range(min = 1))]
    pub purge_interval_ms: u64,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            redis_url: String::new(),
            namespace: "ttl-throttle".to_string(),
            limit: 100,
            ttl_ms: 60_000,
            purge_interval_ms: 30_000,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the process arguments and environment
    pub fn from_env() -> Self {
        Settings::parse()
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_millis(self.purge_interval_ms)
    }

    pub fn uses_redis(&self) -> bool {
        !self.redis_url.is_empty()
    }

    /// One-time validation gate run before anything is started
    pub fn check(&self) -> ThrottlerResult<()> {
        self.validate()
            .map_err(|e| ThrottlerError::Configuration(e.to_string()))?;

        ConfigValidator::validate_bind_address(&self.bind_address)?;
        ConfigValidator::validate_log_level(&self.log_level)?;
        if self.uses_redis() {
            ConfigValidator::validate_redis_url(&self.redis_url)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.check().is_ok());
        assert!(!settings.uses_redis());
        assert_eq!(settings.purge_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_flags() {
        let settings = Settings::parse_from([
            "ttl-throttle",
            "--namespace",
            "api",
            "--limit",
            "3",
            "--ttl-ms",
            "50",
            "--redis-url",
            "redis://localhost:6379",
        ]);
        assert_eq!(settings.namespace, "api");
        assert_eq!(settings.limit, 3);
        assert_eq!(settings.ttl_ms, 50);
        assert!(settings.uses_redis());
        assert!(settings.check().is_ok());
    }

    #[test]
    fn test_empty_namespace_rejected() {
        let settings = Settings {
            namespace: String::new(),
            ..Default::default()
        };
        assert!(matches!(settings.check(), Err(ThrottlerError::Configuration(_))));
    }

    #[test]
    fn test_zero_purge_interval_rejected() {
        let settings = Settings {
            purge_interval_ms: 0,
            ..Default::default()
        };
        assert!(settings.check().is_err());
    }
}
