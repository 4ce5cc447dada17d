use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type ThrottlerResult<T> = Result<T, ThrottlerError>;

#[derive(Debug, Error)]
pub enum ThrottlerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ThrottlerError {
    pub fn missing_field(field: &str) -> Self {
        ThrottlerError::Configuration(format!("must be initialized with `{}`", field))
    }

    pub fn not_a_number(field: &str) -> Self {
        ThrottlerError::Configuration(format!("`{}` must be a number", field))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ThrottlerError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ThrottlerError::Configuration(_) => StatusCode::BAD_REQUEST,
            ThrottlerError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            ThrottlerError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<redis::RedisError> for ThrottlerError {
    fn from(err: redis::RedisError) -> Self {
        ThrottlerError::Store(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, code: u16) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            code,
        }
    }

    pub fn from_error(err: &ThrottlerError) -> Self {
        let code = err.status_code().as_u16();
        match err {
            ThrottlerError::Configuration(msg) => Self::new("configuration_error", msg, code),
            ThrottlerError::Store(msg) => Self::new("service_unavailable", msg, code),
            ThrottlerError::Serialization(e) => {
                Self::new("internal_error", &e.to_string(), code)
            }
            ThrottlerError::Validation(msg) => Self::new("validation_error", msg, code),
        }
    }
}

impl IntoResponse for ThrottlerError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "Request failed");
        (self.status_code(), Json(ErrorResponse::from_error(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_messages_name_the_field() {
        let err = ThrottlerError::missing_field("namespace");
        assert!(err.to_string().contains("`namespace`"));

        let err = ThrottlerError::not_a_number("ttl");
        assert!(err.to_string().contains("`ttl` must be a number"));
    }

    #[test]
    fn test_error_response_codes() {
        let body = ErrorResponse::from_error(&ThrottlerError::Store("down".into()));
        assert_eq!(body.code, 503);
        assert_eq!(body.error, "service_unavailable");

        let body = ErrorResponse::from_error(&ThrottlerError::Validation("bad key".into()));
        assert_eq!(body.code, 422);
    }

    #[test]
    fn test_redis_errors_become_store_errors() {
        let redis_err = redis::RedisError::from((redis::ErrorKind::IoError, "connection reset"));
        let err = ThrottlerError::from(redis_err);
        assert!(matches!(err, ThrottlerError::Store(_)));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
