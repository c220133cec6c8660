use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde_json::json;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Messaging error: {0}")]
    MessagingError(#[from] MessagingError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    ConflictError(String),

    #[error("Not found: {0}")]
    NotFoundError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Short machine-readable category reported alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::AuthError(_) => "auth",
            AppError::MessagingError(_) => "messaging",
            AppError::ValidationError(_) => "validation",
            AppError::ConflictError(_) => "conflict",
            AppError::NotFoundError(_) => "not_found",
            AppError::ConfigError(_) | AppError::InternalError(_) => "internal",
        }
    }
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let response = json!({
            "error": {
                "status": status.as_u16(),
                "kind": self.kind(),
                "message": self.to_string()
            }
        });
        HttpResponse::build(status).json(response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthError(AuthError::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::MessagingError(_) => StatusCode::BAD_REQUEST,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            // Signup reports a taken username as a plain bad request.
            AppError::ConflictError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFoundError(_) => StatusCode::NOT_FOUND,
            AppError::ConfigError(_) | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Every authentication failure. Messages stay generic so that callers cannot
/// tell an unknown username apart from a wrong secret.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Too many login attempts")]
    RateLimited,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagingError {
    #[error("Recipient does not exist")]
    InvalidRecipient,

    #[error("Message content must not be empty")]
    EmptyContent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::InternalError(_)));

        let config_err = config::ConfigError::NotFound(String::from("key not found"));
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::ConfigError(_)));

        let app_err: AppError = AuthError::TokenExpired.into();
        assert!(matches!(app_err, AppError::AuthError(AuthError::TokenExpired)));

        let app_err: AppError = MessagingError::EmptyContent.into();
        assert!(matches!(app_err, AppError::MessagingError(MessagingError::EmptyContent)));
    }

    #[test]
    fn test_error_status_codes() {
        for auth in [
            AuthError::MissingToken,
            AuthError::InvalidToken,
            AuthError::TokenExpired,
            AuthError::InvalidCredentials,
        ] {
            assert_eq!(AppError::AuthError(auth).status_code(), StatusCode::UNAUTHORIZED);
        }

        let err = AppError::AuthError(AuthError::RateLimited);
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);

        let err = AppError::ValidationError("username is required".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = AppError::ConflictError("Username already exists".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = AppError::MessagingError(MessagingError::InvalidRecipient);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = AppError::NotFoundError("User not found".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_display() {
        let err = AppError::ValidationError("test error".to_string());
        assert_eq!(err.to_string(), "Validation error: test error");

        let err = AppError::AuthError(AuthError::InvalidCredentials);
        assert_eq!(err.to_string(), "Authentication error: Invalid credentials");

        let err = AppError::NotFoundError("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[actix_web::test]
    async fn test_error_response_body() {
        let err = AppError::AuthError(AuthError::InvalidToken);
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["status"], 401);
        assert_eq!(json["error"]["kind"], "auth");
        assert_eq!(json["error"]["message"], "Authentication error: Invalid token");
    }
}
