//! Role-based authorization for the clinic platform.
//!
//! The catalog of permissions, the roles, and the policy joining them are
//! defined once here. Both the HTTP request guard in `clinic-server` and the
//! navigation/menu helpers in this crate depend on that single definition.
//!
//! ```
//! use clinic_authz::{can_access, Permission, PermissionRequirement};
//!
//! let sign = PermissionRequirement::from(Permission::PrescriptionsSign);
//! assert!(can_access(&sign, Some(&["doctor"][..])));
//! assert!(!can_access(&sign, Some(&["nurse"][..])));
//! ```
//!
//! Everything here is synchronous and free of I/O; the standard policy is
//! immutable after first use and safe to share across threads.

#![warn(clippy::all)]

pub mod error;
pub mod guard;
pub mod menu;
pub mod navigation;
pub mod permission;
pub mod policy;
pub mod principal;
pub mod role;

pub use error::{AccessDenied, AuthzError, AuthzResult};
pub use guard::{can_access, AccessGuard, PermissionRequirement, RoleRequirement};
pub use menu::{standard_menu, visible_menu, visible_menu_under, MenuItem};
pub use navigation::{
    normalize_path, NavigationGuard, NavigationOutcome, Redirect, RouteMeta, RouteTable,
};
pub use permission::Permission;
pub use policy::{permissions_for_role, permissions_for_roles, PermissionSet, RoleGrant, RolePolicy};
pub use principal::{Principal, Session, SessionState};
pub use role::{Role, ROLE_ALIASES};
