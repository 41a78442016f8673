//! The caller whose roles are checked, and the session that holds it.
//!
//! Both are plain values passed into guards explicitly; nothing here is
//! global.

use crate::{
    permission::Permission,
    policy::{PermissionSet, RolePolicy},
    role::Role,
};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// An authenticated actor and the roles it currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Principal {
    roles: BTreeSet<Role>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unrecognized: Vec<String>,
}

impl Principal {
    /// Build a principal from upstream role tokens.
    ///
    /// Tokens that do not normalize to a role are kept in
    /// [`unrecognized`](Self::unrecognized) for diagnostics and grant nothing.
    pub fn from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut principal = Self::default();
        principal.set_roles(tokens);
        principal
    }

    pub fn from_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
            unrecognized: Vec::new(),
        }
    }

    /// Replace the role set, e.g. after a token refresh.
    pub fn set_roles<I>(&mut self, tokens: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.roles.clear();
        self.unrecognized.clear();

        for token in tokens {
            let token = token.as_ref();
            match Role::normalize(token) {
                Some(role) => {
                    self.roles.insert(role);
                }
                None if token.trim().is_empty() => {}
                None => self.unrecognized.push(token.trim().to_string()),
            }
        }

        debug!(
            roles = ?self.roles,
            unrecognized = ?self.unrecognized,
            "Principal roles synchronized"
        );
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    pub fn unrecognized(&self) -> &[String] {
        &self.unrecognized
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Whether any role token was supplied at all, recognized or not.
    pub fn has_role_information(&self) -> bool {
        !self.roles.is_empty() || !self.unrecognized.is_empty()
    }

    /// Effective permissions under `policy`.
    ///
    /// Computed from the current role set on every call.
    pub fn permissions_under(&self, policy: &RolePolicy) -> PermissionSet {
        policy.resolve_roles(&self.roles)
    }

    pub fn has_permission_under(&self, policy: &RolePolicy, permission: Permission) -> bool {
        self.permissions_under(policy).contains(&permission)
    }

    pub fn has_any_permission_under(
        &self,
        policy: &RolePolicy,
        permissions: &[Permission],
    ) -> bool {
        let effective = self.permissions_under(policy);
        permissions.iter().any(|p| effective.contains(p))
    }

    /// Effective permissions under the standard policy.
    ///
    /// This and the two `has_*` helpers below always read
    /// [`RolePolicy::standard`]; use the `_under` variants with a custom
    /// policy.
    pub fn permissions(&self) -> PermissionSet {
        self.permissions_under(RolePolicy::standard())
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.has_permission_under(RolePolicy::standard(), permission)
    }

    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        self.has_any_permission_under(RolePolicy::standard(), permissions)
    }
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Nobody is signed in.
    #[default]
    Anonymous,
    /// Signed in, roles not yet synchronized.
    Pending,
    /// Signed in with a known role set.
    Active(Principal),
}

/// Explicit session context handed to the navigation guard and menu filter.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session already synchronized with the given role tokens.
    pub fn active<I>(tokens: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut session = Self::new();
        session.synchronize(tokens);
        session
    }

    /// Mark the session as authenticated while its roles are still loading.
    pub fn begin(&mut self) {
        if !matches!(self.state, SessionState::Active(_)) {
            self.state = SessionState::Pending;
        }
    }

    /// Replace the session's role set.
    pub fn synchronize<I>(&mut self, tokens: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        match &mut self.state {
            SessionState::Active(principal) => principal.set_roles(tokens),
            state => *state = SessionState::Active(Principal::from_tokens(tokens)),
        }
    }

    /// Sign out and drop all role information.
    pub fn logout(&mut self) {
        debug!("Session cleared");
        self.state = SessionState::Anonymous;
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn principal(&self) -> Option<&Principal> {
        match &self.state {
            SessionState::Active(principal) => Some(principal),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self.state, SessionState::Anonymous)
    }
}

impl From<Principal> for Session {
    fn from(principal: Principal) -> Self {
        Self {
            state: SessionState::Active(principal),
        }
    }
}

impl From<Option<Principal>> for Session {
    fn from(principal: Option<Principal>) -> Self {
        principal.map(Session::from).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RoleGrant;

    #[test]
    fn test_from_tokens_splits_known_and_unknown() {
        let principal = Principal::from_tokens([" Doctor", "medic", "janitor", ""]);
        assert_eq!(principal.roles().iter().copied().collect::<Vec<_>>(), vec![Role::Doctor]);
        assert_eq!(principal.unrecognized(), ["janitor".to_string()]);
        assert!(principal.has_role_information());
    }

    #[test]
    fn test_empty_principal_has_no_role_information() {
        assert!(!Principal::default().has_role_information());
        assert!(!Principal::from_tokens(["  "]).has_role_information());
    }

    #[test]
    fn test_permissions_follow_role_changes() {
        let mut principal = Principal::from_tokens(["nurse"]);
        assert!(!principal.has_permission(Permission::PrescriptionsSign));

        principal.set_roles(["doctor"]);
        assert!(principal.has_permission(Permission::PrescriptionsSign));
        assert!(!principal.has_role(Role::Nurse));

        principal.set_roles(Vec::<String>::new());
        assert!(principal.permissions().is_empty());
    }

    #[test]
    fn test_has_any_permission() {
        let principal = Principal::from_roles([Role::Pharmacist]);
        assert!(principal
            .has_any_permission(&[Permission::BillingManage, Permission::PharmacyDispense]));
        assert!(!principal.has_any_permission(&[Permission::BillingManage]));
        assert!(!principal.has_any_permission(&[]));
    }

    #[test]
    fn test_custom_policy_checks() {
        let policy = RolePolicy::builder()
            .grant(RoleGrant::new(Role::Nurse).with(Permission::PrescriptionsSign))
            .build();
        let principal = Principal::from_roles([Role::Nurse]);

        assert!(principal.has_permission_under(&policy, Permission::PrescriptionsSign));
        assert!(!principal.has_permission(Permission::PrescriptionsSign));
        assert!(principal.has_any_permission_under(
            &policy,
            &[Permission::BillingManage, Permission::PrescriptionsSign]
        ));
        assert!(!principal.has_any_permission_under(&policy, &[Permission::PatientsRead]));
        assert!(principal.has_permission(Permission::PatientsRead));
    }

    #[test]
    fn test_session_lifecycle() {
        let mut session = Session::new();
        assert_eq!(session.state(), &SessionState::Anonymous);
        assert!(!session.is_authenticated());

        session.begin();
        assert_eq!(session.state(), &SessionState::Pending);
        assert!(session.is_authenticated());
        assert!(session.principal().is_none());

        session.synchronize(["receptionist"]);
        assert!(session.principal().unwrap().has_role(Role::Receptionist));

        session.synchronize(["receptionist", "accountant"]);
        assert!(session.principal().unwrap().has_permission(Permission::BillingManage));

        session.begin();
        assert!(session.principal().is_some(), "begin must not discard an active principal");

        session.logout();
        assert_eq!(session.state(), &SessionState::Anonymous);
        assert!(session.principal().is_none());
    }
}
