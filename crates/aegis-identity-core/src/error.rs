//! Identity engine errors

use thiserror::Error;

use aegis_types::ErrorResponse;

use crate::validate::ValidationFailure;

/// Identity engine errors
///
/// Every operation in this crate returns one of these; nothing unwinds.
/// `error_code` strings are stable and part of the API contract.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Bad email/password combination. Deliberately also covers the
    /// unknown-email case so callers cannot enumerate accounts.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Identity not found
    #[error("user not found")]
    UserNotFound,

    /// Identity is soft-deleted
    #[error("user deleted")]
    UserDeleted,

    /// Account is deactivated; login blocked
    #[error("user deactivated")]
    UserDeactivated,

    /// Account is banned; login blocked
    #[error("user banned")]
    UserBanned,

    /// Access token failed verification (malformed, bad signature, expired)
    #[error("invalid token")]
    InvalidToken,

    /// Refresh token value is unknown
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    /// Refresh token has been revoked
    #[error("token revoked")]
    TokenRevoked,

    /// Refresh token is past its expiry
    #[error("token expired")]
    TokenExpired,

    /// Optimistic-concurrency version mismatch; re-read and retry
    #[error("version conflict")]
    ConcurrencyConflict,

    /// A concurrent writer already holds a unique key
    #[error("duplicate record")]
    Duplicate,

    /// Current password did not verify
    #[error("invalid password")]
    InvalidPassword,

    /// New password matches one held in the credential history
    #[error("password used before")]
    PasswordUsedBefore,

    /// Required input field missing; rejected before any store access
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Business-rule validation failure from the pipeline
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// Store failure; original cause preserved for logging
    #[error("database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentials
            | Self::InvalidToken
            | Self::InvalidRefreshToken
            | Self::TokenRevoked
            | Self::TokenExpired
            | Self::InvalidPassword => 401,
            Self::UserDeleted | Self::UserDeactivated | Self::UserBanned => 403,
            Self::UserNotFound => 404,
            Self::ConcurrencyConflict | Self::Duplicate | Self::Validation(_) => 409,
            Self::MissingField(_) => 400,
            Self::PasswordUsedBefore => 422,
            Self::Database(_) | Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::UserDeleted => "USER_DELETED",
            Self::UserDeactivated => "USER_DEACTIVATED",
            Self::UserBanned => "USER_BANNED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
            Self::Duplicate => "DUPLICATE",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::PasswordUsedBefore => "PASSWORD_USED_BEFORE",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::Validation(failure) => &failure.code,
            Self::Database(_) => "DATABASE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Build the coded envelope handed to the API layer
    pub fn to_response(&self) -> ErrorResponse {
        let response = ErrorResponse::new(self.error_code(), self.to_string());
        match self {
            Self::MissingField(field) => response.with_detail(*field),
            _ => response,
        }
    }
}

impl From<aegis_db::DbError> for AuthError {
    fn from(err: aegis_db::DbError) -> Self {
        match err {
            aegis_db::DbError::Duplicate => Self::Duplicate,
            aegis_db::DbError::NotFound => Self::UserNotFound,
            other => {
                tracing::error!("database error: {}", other);
                Self::Database(other.to_string())
            }
        }
    }
}
