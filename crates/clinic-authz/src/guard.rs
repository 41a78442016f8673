//! Access guard: decides whether a caller may perform an action.

use crate::{
    error::AccessDenied,
    permission::Permission,
    policy::{PermissionSet, RolePolicy},
    principal::Principal,
    role::Role,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Permissions declared on a protected action, with ANY-of semantics.
///
/// An empty requirement means the action is public.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionRequirement {
    any_of: Vec<Permission>,
}

impl PermissionRequirement {
    pub fn public() -> Self {
        Self::default()
    }

    pub fn any_of(permissions: impl IntoIterator<Item = Permission>) -> Self {
        let mut any_of = Vec::new();
        for permission in permissions {
            if !any_of.contains(&permission) {
                any_of.push(permission);
            }
        }
        Self { any_of }
    }

    pub fn is_public(&self) -> bool {
        self.any_of.is_empty()
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.any_of
    }

    /// True when `effective` holds at least one required permission.
    pub fn is_satisfied_by(&self, effective: &PermissionSet) -> bool {
        self.is_public() || self.any_of.iter().any(|p| effective.contains(p))
    }
}

impl From<Permission> for PermissionRequirement {
    fn from(permission: Permission) -> Self {
        Self::any_of([permission])
    }
}

/// Roles accepted by an action, with ANY-of semantics. Empty accepts everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleRequirement {
    any_of: Vec<Role>,
}

impl RoleRequirement {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn any_of(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut any_of = Vec::new();
        for role in roles {
            if !any_of.contains(&role) {
                any_of.push(role);
            }
        }
        Self { any_of }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.any_of.is_empty()
    }

    pub fn roles(&self) -> &[Role] {
        &self.any_of
    }
}

/// Evaluates requirements against a caller using one policy.
///
/// A check is a single synchronous decision: an empty requirement allows,
/// a missing identity is `Unauthenticated`, otherwise the caller's effective
/// permissions must intersect the requirement.
#[derive(Debug, Clone, Copy)]
pub struct AccessGuard<'p> {
    policy: &'p RolePolicy,
}

impl AccessGuard<'static> {
    /// Guard backed by the standard clinic policy.
    pub fn standard() -> Self {
        Self::new(RolePolicy::standard())
    }
}

impl Default for AccessGuard<'static> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<'p> AccessGuard<'p> {
    pub fn new(policy: &'p RolePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &'p RolePolicy {
        self.policy
    }

    /// Check `requirement` against `caller`.
    ///
    /// A caller that is absent, or present without any role token, counts as
    /// unauthenticated.
    pub fn check(
        &self,
        requirement: &PermissionRequirement,
        caller: Option<&Principal>,
    ) -> Result<(), AccessDenied> {
        if requirement.is_public() {
            return Ok(());
        }

        let Some(principal) = caller.filter(|p| p.has_role_information()) else {
            info!(
                required = ?requirement.permissions(),
                "Access denied: no caller identity"
            );
            return Err(AccessDenied::Unauthenticated {
                required: requirement.permissions().to_vec(),
            });
        };

        let effective = principal.permissions_under(self.policy);
        if requirement.is_satisfied_by(&effective) {
            debug!(
                roles = ?principal.roles(),
                required = ?requirement.permissions(),
                "Access granted"
            );
            Ok(())
        } else {
            info!(
                roles = ?principal.roles(),
                unrecognized = ?principal.unrecognized(),
                required = ?requirement.permissions(),
                "Access denied: insufficient permissions"
            );
            Err(AccessDenied::InsufficientPermission {
                required: requirement.permissions().to_vec(),
            })
        }
    }

    /// Check `requirement` against raw role tokens.
    ///
    /// `None` and an empty slice both mean "no role information".
    pub fn check_tokens<S: AsRef<str>>(
        &self,
        requirement: &PermissionRequirement,
        roles: Option<&[S]>,
    ) -> Result<(), AccessDenied> {
        let principal = roles.map(|tokens| Principal::from_tokens(tokens.iter()));
        self.check(requirement, principal.as_ref())
    }

    /// The cruder `allowedRoles` check: the caller must hold one of the roles.
    pub fn check_allowed_roles(
        &self,
        requirement: &RoleRequirement,
        caller: Option<&Principal>,
    ) -> Result<(), AccessDenied> {
        if requirement.is_unrestricted() {
            return Ok(());
        }

        let Some(principal) = caller.filter(|p| p.has_role_information()) else {
            info!(allowed = ?requirement.roles(), "Role check denied: no caller identity");
            return Err(AccessDenied::Unauthenticated { required: Vec::new() });
        };

        if requirement.roles().iter().any(|role| principal.has_role(*role)) {
            Ok(())
        } else {
            info!(
                roles = ?principal.roles(),
                allowed = ?requirement.roles(),
                "Role check denied"
            );
            Err(AccessDenied::RoleNotAllowed {
                allowed: requirement.roles().to_vec(),
            })
        }
    }
}

/// Decision function for routing collaborators, over the standard policy.
pub fn can_access<S: AsRef<str>>(requirement: &PermissionRequirement, roles: Option<&[S]>) -> bool {
    AccessGuard::standard().check_tokens(requirement, roles).is_ok()
}
