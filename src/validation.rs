use crate::error::{ThrottlerError, ThrottlerResult};
use crate::throttler::ThrottleOptions;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

pub const MAX_KEY_LENGTH: usize = 256;

static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._:@-]+$").expect("valid key pattern"));

/// Request validation utilities
pub struct RequestValidator;

impl RequestValidator {
    /// Validates a throttle key received over HTTP
    pub fn validate_key(key: &str) -> ThrottlerResult<()> {
        if key.is_empty() {
            return Err(ThrottlerError::Validation(
                "Throttle key cannot be empty".to_string(),
            ));
        }

        if key.len() > MAX_KEY_LENGTH {
            return Err(ThrottlerError::Validation(format!(
                "Throttle key cannot be longer than {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        if !KEY_PATTERN.is_match(key) {
            return Err(ThrottlerError::Validation(
                "Throttle key can only contain alphanumeric characters and . _ : @ -".to_string(),
            ));
        }

        Ok(())
    }

    /// Parses per-call overrides from an optional JSON body
    pub fn parse_options(body: &Value) -> ThrottlerResult<ThrottleOptions> {
        match body {
            Value::Null => Ok(ThrottleOptions::default()),
            Value::Object(object) => Ok(ThrottleOptions {
                limit: Self::number_field(object, "limit")?,
                ttl: Self::number_field(object, "ttl")?,
            }),
            _ => Err(ThrottlerError::Validation(
                "Request body must be a JSON object".to_string(),
            )),
        }
    }

    /// Reads an optional non-negative integer field.
    ///
    /// `null` counts as absent; strings, floats and negative numbers are
    /// rejected with a configuration error naming the field.
    pub fn number_field(object: &Map<String, Value>, field: &str) -> ThrottlerResult<Option<u64>> {
        match object.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| ThrottlerError::not_a_number(field)),
        }
    }
}
