/// Error Handling Module
///
/// A single error type (`AppError`) flows through every workflow and is
/// rendered into the response envelope at the HTTP boundary.
/// It covers:
/// 1. Domain-specific error kinds (validation, database, auth, config)
/// 2. The token error kind produced by the token service
/// 3. HTTP status / envelope mapping with structured logging

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for request input
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
    InvalidValue(String, String),
    Mismatch(String, String),
    MalformedBody(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::InvalidValue(field, allowed) => {
                write!(f, "{} must be one of [{}]", field, allowed)
            }
            ValidationError::Mismatch(field, other) => {
                write!(f, "{} must match {}", field, other)
            }
            ValidationError::MalformedBody(msg) => write!(f, "invalid request body: {}", msg),
        }
    }
}

impl StdError for ValidationError {}

/// Database operation errors
#[derive(Debug)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    ConnectionPool(String),
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => write!(f, "{}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// Failure kinds produced when verifying a signed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Signature is valid but `exp` has passed
    Expired,
    /// Bad signature, wrong subject, or not a token at all
    Malformed,
    /// Key or crypto backend failure, not the caller's fault
    Unexpected(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Expired => write!(f, "token expired"),
            TokenError::Malformed => write!(f, "token malformed"),
            TokenError::Unexpected(msg) => write!(f, "token verification failed: {}", msg),
        }
    }
}

impl StdError for TokenError {}

/// Authentication errors. Every variant maps to 401.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// Login failed; deliberately does not say which check failed
    InvalidCredentials,
    MissingToken,
    AccessTokenExpired,
    AccessTokenInvalid,
    RefreshTokenMissing,
    /// Expired, malformed, already rotated or logged out
    RefreshTokenInvalid,
}

impl AuthError {
    /// Machine-readable code exposed in the response body
    pub fn code(&self) -> Option<&'static str> {
        match self {
            AuthError::AccessTokenExpired => Some("AccessTokenExpired"),
            AuthError::AccessTokenInvalid => Some("AccessTokenInvalid"),
            _ => None,
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Email or password is invalid"),
            AuthError::MissingToken => write!(f, "Access token not found"),
            AuthError::AccessTokenExpired => write!(f, "Access token expired"),
            AuthError::AccessTokenInvalid => write!(f, "Access token invalid"),
            AuthError::RefreshTokenMissing => write!(f, "Refresh token not found"),
            AuthError::RefreshTokenInvalid => write!(f, "Refresh token invalid or expired"),
        }
    }
}

impl StdError for AuthError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Database(DatabaseError),
    Auth(AuthError),
    Conflict(String),
    Forbidden(String),
    NotFound(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Conflict(msg) => write!(f, "{}", msg),
            AppError::Forbidden(msg) => write!(f, "{}", msg),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                AppError::Database(DatabaseError::UniqueConstraintViolation(
                    "Email already in use".to_string(),
                ))
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::Database(DatabaseError::ConnectionPool(err.to_string()))
            }
            _ => AppError::Database(DatabaseError::UnexpectedError(err.to_string())),
        }
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Body of a failure envelope
#[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Failure envelope: `{error: true, statusCode, body: {message, code?}}`
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: bool,
    pub status_code: u16,
    pub body: ErrorBody,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: String, code: Option<String>) -> Self {
        Self {
            error: true,
            status_code: status.as_u16(),
            body: ErrorBody { message, code },
        }
    }
}

impl AppError {
    fn envelope(&self) -> ErrorResponse {
        let code = match self {
            AppError::Auth(e) => e.code().map(str::to_string),
            _ => None,
        };
        ErrorResponse::new(self.status_code(), self.to_string(), code)
    }

    fn log(&self, request_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Validation error");
            }
            AppError::Database(DatabaseError::UniqueConstraintViolation(_))
            | AppError::Conflict(_) => {
                tracing::warn!(request_id = request_id, error = %self, "Conflict");
            }
            AppError::Database(e) => {
                tracing::error!(request_id = request_id, error = %e, "Database error");
            }
            AppError::Auth(AuthError::InvalidCredentials) => {
                tracing::warn!(request_id = request_id, "Invalid credentials attempt");
            }
            AppError::Auth(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Authentication error");
            }
            AppError::Forbidden(msg) => {
                tracing::warn!(request_id = request_id, error = %msg, "Access denied");
            }
            AppError::NotFound(msg) => {
                tracing::debug!(request_id = request_id, error = %msg, "Not found");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log(&request_id);

        HttpResponse::build(self.status_code()).json(self.envelope())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Maps `web::Json` extraction failures onto the 422 envelope
pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    AppError::Validation(ValidationError::MalformedBody(err.to_string())).into()
}

/// Maps `web::Path` extraction failures onto the 422 envelope
pub fn path_error_handler(
    err: actix_web::error::PathError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    AppError::Validation(ValidationError::InvalidFormat(format!("path parameter ({})", err)))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("email".to_string());
        assert_eq!(err.to_string(), "email is empty");
    }

    #[test]
    fn test_app_error_conversion() {
        let val_err = ValidationError::InvalidFormat("test".to_string());
        let app_err: AppError = val_err.into();
        match app_err {
            AppError::Validation(_) => (),
            _ => panic!("Expected Validation error"),
        }
    }

    #[test]
    fn test_status_codes() {
        let cases = vec![
            (AppError::Validation(ValidationError::EmptyField("x".into())), 422),
            (AppError::Conflict("dup".into()), 409),
            (AppError::Auth(AuthError::MissingToken), 401),
            (AppError::Forbidden("no".into()), 403),
            (AppError::NotFound("gone".into()), 404),
            (AppError::Internal("boom".into()), 500),
            (
                AppError::Database(DatabaseError::UniqueConstraintViolation("dup".into())),
                409,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_code().as_u16(), expected, "{:?}", err);
        }
    }

    #[test]
    fn test_envelope_carries_token_code() {
        let envelope = AppError::Auth(AuthError::AccessTokenExpired).envelope();
        assert!(envelope.error);
        assert_eq!(envelope.status_code, 401);
        assert_eq!(envelope.body.code.as_deref(), Some("AccessTokenExpired"));

        let envelope = AppError::Auth(AuthError::InvalidCredentials).envelope();
        assert_eq!(envelope.body.message, "Email or password is invalid");
        assert!(envelope.body.code.is_none());
    }

    #[test]
    fn test_envelope_serializes_camel_case() {
        let envelope = AppError::Auth(AuthError::AccessTokenInvalid).envelope();
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["error"], true);
        assert_eq!(json["statusCode"], 401);
        assert_eq!(json["body"]["code"], "AccessTokenInvalid");
    }

    #[test]
    fn test_internal_error_surfaces_raw_message() {
        let envelope = AppError::Internal("store unreachable".into()).envelope();
        assert_eq!(envelope.body.message, "store unreachable");
    }
}
