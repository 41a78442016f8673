//! API error types.

use axum::http::StatusCode;
use clinic_authz::{AccessDenied, Permission, Role};
use thiserror::Error;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// API error enum covering all error cases.
#[derive(Debug, Error)]
pub enum ApiError {
    // 400 Bad Request
    #[error("Invalid query parameter: {0}")]
    InvalidQueryParam(String),

    // 401 Unauthorized
    #[error("Authentication required")]
    Unauthenticated {
        required: Vec<Permission>,
    },

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    // 403 Forbidden
    #[error("Insufficient permissions")]
    InsufficientPermissions {
        required: Vec<Permission>,
    },

    #[error("Role not allowed")]
    RoleNotAllowed {
        allowed: Vec<Role>,
    },

    // 404 Not Found
    #[error("{0} not found")]
    NotFound(String),

    // 500 Internal Server Error
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidQueryParam(_) => StatusCode::BAD_REQUEST,

            Self::Unauthenticated { .. }
            | Self::TokenExpired
            | Self::InvalidToken => StatusCode::UNAUTHORIZED,

            Self::InsufficientPermissions { .. }
            | Self::RoleNotAllowed { .. } => StatusCode::FORBIDDEN,

            Self::NotFound(_) => StatusCode::NOT_FOUND,

            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for client handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidQueryParam(_) => "invalid_query_param",
            Self::Unauthenticated { .. } => "unauthenticated",
            Self::TokenExpired => "token_expired",
            Self::InvalidToken => "invalid_token",
            Self::InsufficientPermissions { .. } => "insufficient_permissions",
            Self::RoleNotAllowed { .. } => "role_not_allowed",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Unauthenticated error for an unprotected check (no declared requirement).
    pub fn unauthenticated() -> Self {
        Self::Unauthenticated { required: Vec::new() }
    }

    /// Check if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this is an authentication or authorization failure.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self.status_code(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        )
    }
}

impl From<AccessDenied> for ApiError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::Unauthenticated { required } => Self::Unauthenticated { required },
            AccessDenied::InsufficientPermission { required } => {
                Self::InsufficientPermissions { required }
            }
            AccessDenied::RoleNotAllowed { allowed } => Self::RoleNotAllowed { allowed },
        }
    }
}
