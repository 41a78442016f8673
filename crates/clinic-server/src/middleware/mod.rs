//! Middleware for the clinic API server.

pub mod auth;
pub mod authz;

pub use auth::{Auth, AuthLayer, AuthMiddleware, AuthUser, MaybeAuth};
pub use authz::{log_authz, AuthzAuditEvent, AuthzLayer, AuthzMiddleware, Requirement};
