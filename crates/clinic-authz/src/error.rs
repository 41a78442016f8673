//! Error types for the authorization model.

use crate::{permission::Permission, role::Role};
use thiserror::Error;

/// Errors raised when parsing external tokens strictly.
///
/// The resolver never produces these: unknown role tokens are skipped there.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// The token is not part of the permission catalog.
    #[error("unknown permission: {0}")]
    UnknownPermission(String),

    /// The token names no role, canonical or alias.
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// Reason an access check was denied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    /// A requirement exists but the caller carries no role information.
    #[error("authentication required (requires any of: {})", join(required))]
    Unauthenticated {
        /// The requirement that was checked.
        required: Vec<Permission>,
    },

    /// The caller holds roles, but none grant a required permission.
    #[error("insufficient permissions (requires any of: {})", join(required))]
    InsufficientPermission {
        /// The requirement that was checked.
        required: Vec<Permission>,
    },

    /// The caller holds none of the allowed roles.
    #[error("role not allowed (requires one of: {})", join(allowed))]
    RoleNotAllowed {
        /// The roles the action accepts.
        allowed: Vec<Role>,
    },
}

impl AccessDenied {
    /// Stable machine-readable reason, used in redirects and API errors.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated { .. } => "unauthenticated",
            Self::InsufficientPermission { .. } => "insufficient_permission",
            Self::RoleNotAllowed { .. } => "role_not_allowed",
        }
    }

    /// Whether the remedy is signing in rather than requesting access.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated { .. })
    }

    /// The denied requirement as wire tokens.
    pub fn required_tokens(&self) -> Vec<&'static str> {
        match self {
            Self::Unauthenticated { required } | Self::InsufficientPermission { required } => {
                required.iter().map(|p| p.as_str()).collect()
            }
            Self::RoleNotAllowed { allowed } => allowed.iter().map(|r| r.as_str()).collect(),
        }
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for strict token parsing.
pub type AuthzResult<T> = Result<T, AuthzError>;
