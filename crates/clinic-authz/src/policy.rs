//! Role to permission policy and the permission resolver.

use crate::{permission::Permission, role::Role};
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};
use tracing::{trace, warn};

/// A set of permissions. Ordered so diagnostics and responses are stable.
pub type PermissionSet = BTreeSet<Permission>;

static EMPTY: PermissionSet = BTreeSet::new();

static STANDARD: Lazy<RolePolicy> = Lazy::new(RolePolicy::clinic_default);

/// The permissions granted to a single role.
#[derive(Debug, Clone)]
pub struct RoleGrant {
    role: Role,
    permissions: PermissionSet,
}

impl RoleGrant {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            permissions: PermissionSet::new(),
        }
    }

    pub fn with(mut self, permission: Permission) -> Self {
        self.permissions.insert(permission);
        self
    }

    pub fn with_all(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions.extend(permissions);
        self
    }

    /// Grant every permission in a namespace.
    pub fn with_domain(self, domain: &str) -> Self {
        self.with_all(Permission::in_domain(domain))
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }
}

/// Builder for [`RolePolicy`].
#[derive(Debug, Default)]
pub struct RolePolicyBuilder {
    grants: HashMap<Role, PermissionSet>,
}

impl RolePolicyBuilder {
    /// Add a grant. Granting the same role twice merges the sets.
    pub fn grant(mut self, grant: RoleGrant) -> Self {
        self.grants
            .entry(grant.role)
            .or_default()
            .extend(grant.permissions);
        self
    }

    pub fn build(self) -> RolePolicy {
        RolePolicy { grants: self.grants }
    }
}

/// Static mapping from every role to its permission set.
///
/// Built once and read-only afterwards, so it can be shared across threads
/// without locking.
#[derive(Debug, Clone)]
pub struct RolePolicy {
    grants: HashMap<Role, PermissionSet>,
}

impl RolePolicy {
    /// The clinic's policy, built on first use.
    pub fn standard() -> &'static RolePolicy {
        &STANDARD
    }

    pub fn builder() -> RolePolicyBuilder {
        RolePolicyBuilder::default()
    }

    /// Every grant is spelled out. Superuser coverage of the catalog is
    /// checked by tests, so a new permission is never granted implicitly.
    fn clinic_default() -> Self {
        use Permission::*;

        Self::builder()
            .grant(RoleGrant::new(Role::SuperAdmin).with_all([
                PatientsRead,
                PatientsWrite,
                PatientsDelete,
                MedicalRecordsRead,
                MedicalRecordsWrite,
                PrescriptionsRead,
                PrescriptionsWrite,
                PrescriptionsSign,
                PharmacyRead,
                PharmacyDispense,
                PharmacyManage,
                AppointmentsRead,
                AppointmentsManage,
                BillingRead,
                BillingManage,
                AssetsRead,
                AssetsManage,
                ReportsView,
                ReportsExport,
                UsersRead,
                UsersManage,
                ClinicsManage,
                SettingsManage,
            ]))
            .grant(RoleGrant::new(Role::Admin).with_all([
                PatientsRead,
                PatientsWrite,
                PatientsDelete,
                MedicalRecordsRead,
                MedicalRecordsWrite,
                PrescriptionsRead,
                PrescriptionsWrite,
                PrescriptionsSign,
                PharmacyRead,
                PharmacyDispense,
                PharmacyManage,
                AppointmentsRead,
                AppointmentsManage,
                BillingRead,
                BillingManage,
                AssetsRead,
                AssetsManage,
                ReportsView,
                ReportsExport,
                UsersRead,
                UsersManage,
                SettingsManage,
            ]))
            .grant(RoleGrant::new(Role::Doctor).with_all([
                PatientsRead,
                PatientsWrite,
                MedicalRecordsRead,
                MedicalRecordsWrite,
                PrescriptionsRead,
                PrescriptionsWrite,
                PrescriptionsSign,
                AppointmentsRead,
                ReportsView,
            ]))
            .grant(RoleGrant::new(Role::Nurse).with_all([
                PatientsRead,
                PatientsWrite,
                MedicalRecordsRead,
                MedicalRecordsWrite,
                PrescriptionsRead,
                AppointmentsRead,
            ]))
            .grant(RoleGrant::new(Role::Receptionist).with_all([
                PatientsRead,
                PatientsWrite,
                AppointmentsRead,
                AppointmentsManage,
                BillingRead,
            ]))
            .grant(RoleGrant::new(Role::Pharmacist).with_all([
                PatientsRead,
                PrescriptionsRead,
                PharmacyRead,
                PharmacyDispense,
                PharmacyManage,
            ]))
            .grant(RoleGrant::new(Role::Accountant).with_all([
                BillingRead,
                BillingManage,
                AssetsRead,
                ReportsView,
                ReportsExport,
            ]))
            .grant(RoleGrant::new(Role::User))
            .build()
    }

    /// Permissions configured for `role`.
    ///
    /// A role without an entry resolves to the empty set.
    pub fn permissions_for_role(&self, role: Role) -> &PermissionSet {
        match self.grants.get(&role) {
            Some(permissions) => permissions,
            None => {
                warn!(role = %role, "Role has no policy entry, treating as zero-privilege");
                &EMPTY
            }
        }
    }

    /// Permissions for a raw role token. Unknown tokens resolve to the empty set.
    pub fn permissions_for_role_name(&self, name: &str) -> PermissionSet {
        Role::normalize(name)
            .map(|role| self.permissions_for_role(role).clone())
            .unwrap_or_default()
    }

    /// Roles that have no entry in this policy.
    pub fn configuration_gaps(&self) -> Vec<Role> {
        Role::ALL
            .iter()
            .copied()
            .filter(|role| !self.grants.contains_key(role))
            .collect()
    }

    /// Effective permissions for a sequence of raw role tokens.
    ///
    /// Tokens are normalized with [`Role::normalize`]; unrecognized tokens
    /// contribute nothing.
    pub fn resolve<I>(&self, roles: I) -> PermissionSet
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut effective = PermissionSet::new();
        for token in roles {
            let token = token.as_ref();
            match Role::normalize(token) {
                Some(role) => effective.extend(self.permissions_for_role(role)),
                None => trace!(token = %token, "Skipping unrecognized role token"),
            }
        }
        effective
    }

    /// Effective permissions for already-parsed roles.
    pub fn resolve_roles<'a, I>(&self, roles: I) -> PermissionSet
    where
        I: IntoIterator<Item = &'a Role>,
    {
        roles
            .into_iter()
            .flat_map(|role| self.permissions_for_role(*role).iter().copied())
            .collect()
    }
}

/// Permissions for `role` under the standard policy.
pub fn permissions_for_role(role: Role) -> &'static PermissionSet {
    RolePolicy::standard().permissions_for_role(role)
}

/// Effective permissions for raw role tokens under the standard policy.
///
/// `None::<&str>` and empty sequences both yield the empty set.
pub fn permissions_for_roles<I>(roles: I) -> PermissionSet
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    RolePolicy::standard().resolve(roles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_has_an_entry() {
        let policy = RolePolicy::standard();
        assert!(policy.configuration_gaps().is_empty());
        for role in Role::ALL {
            // Must not panic, may be empty.
            let _ = policy.permissions_for_role(*role);
        }
    }

    #[test]
    fn test_super_admin_holds_full_catalog() {
        let catalog: PermissionSet = Permission::ALL.iter().copied().collect();
        assert_eq!(permissions_for_role(Role::SuperAdmin), &catalog);
    }

    #[test]
    fn test_bare_user_tier_is_empty() {
        assert!(permissions_for_role(Role::User).is_empty());
    }

    #[test]
    fn test_admin_holds_catalog_except_clinics() {
        let expected: PermissionSet = Permission::ALL
            .iter()
            .copied()
            .filter(|p| *p != Permission::ClinicsManage)
            .collect();
        assert_eq!(permissions_for_role(Role::Admin), &expected);
    }

    #[test]
    fn test_domain_grant_expands_namespace() {
        let grant = RoleGrant::new(Role::Pharmacist).with_domain("pharmacy");
        let expected: PermissionSet = [
            Permission::PharmacyRead,
            Permission::PharmacyDispense,
            Permission::PharmacyManage,
        ]
        .into_iter()
        .collect();
        assert_eq!(grant.permissions(), &expected);
    }

    #[test]
    fn test_admin_cannot_manage_clinics() {
        let admin = permissions_for_role(Role::Admin);
        assert!(!admin.contains(&Permission::ClinicsManage));
        assert!(admin.contains(&Permission::SettingsManage));
    }

    #[test]
    fn test_gap_degrades_to_empty() {
        let policy = RolePolicy::builder()
            .grant(RoleGrant::new(Role::Doctor).with(Permission::PatientsRead))
            .build();

        assert!(policy.permissions_for_role(Role::Nurse).is_empty());
        assert!(policy.configuration_gaps().contains(&Role::Nurse));
        assert!(!policy.configuration_gaps().contains(&Role::Doctor));
    }

    #[test]
    fn test_duplicate_grants_merge() {
        let policy = RolePolicy::builder()
            .grant(RoleGrant::new(Role::Nurse).with(Permission::PatientsRead))
            .grant(RoleGrant::new(Role::Nurse).with(Permission::PatientsWrite))
            .build();

        assert_eq!(policy.permissions_for_role(Role::Nurse).len(), 2);
    }

    #[test]
    fn test_resolve_handles_empty_and_none() {
        assert!(permissions_for_roles(None::<&str>).is_empty());
        assert!(permissions_for_roles(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_resolve_skips_unknown_tokens() {
        assert!(permissions_for_roles(["not_a_real_role"]).is_empty());
        assert_eq!(
            permissions_for_roles(["not_a_real_role", "pharmacist"]),
            *permissions_for_role(Role::Pharmacist)
        );
    }

    #[test]
    fn test_resolve_name_uses_aliases() {
        let policy = RolePolicy::standard();
        assert_eq!(policy.permissions_for_role_name("Medic"), *permissions_for_role(Role::Doctor));
        assert!(policy.permissions_for_role_name("janitor").is_empty());
    }

    #[test]
    fn test_resolve_roles_matches_token_resolution() {
        let policy = RolePolicy::standard();
        let typed = policy.resolve_roles(&[Role::Doctor, Role::Pharmacist]);
        assert_eq!(typed, policy.resolve(["doctor", "pharmacist"]));
    }
}
