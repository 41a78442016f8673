//! Permission-filtered navigation menu.

use crate::{
    guard::PermissionRequirement,
    permission::Permission,
    policy::{PermissionSet, RolePolicy},
    principal::Principal,
};
use serde::Serialize;

/// An entry in the admin shell's side menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<&'static str>,
    #[serde(skip_serializing_if = "PermissionRequirement::is_public")]
    pub requirement: PermissionRequirement,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    pub fn link(id: &'static str, label: &'static str, path: &'static str) -> Self {
        Self {
            id,
            label,
            path: Some(path),
            requirement: PermissionRequirement::public(),
            children: Vec::new(),
        }
    }

    /// A pathless entry that only groups children.
    pub fn group(id: &'static str, label: &'static str, children: Vec<MenuItem>) -> Self {
        Self {
            id,
            label,
            path: None,
            requirement: PermissionRequirement::public(),
            children,
        }
    }

    pub fn requires(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.requirement = PermissionRequirement::any_of(permissions);
        self
    }
}

/// Entries `principal` may see under the standard policy.
pub fn visible_menu(items: &[MenuItem], principal: Option<&Principal>) -> Vec<MenuItem> {
    visible_menu_under(RolePolicy::standard(), items, principal)
}

/// Entries `principal` may see under `policy`.
///
/// Public entries stay visible to everyone. Groups left without children
/// and without a path of their own are dropped.
pub fn visible_menu_under(
    policy: &RolePolicy,
    items: &[MenuItem],
    principal: Option<&Principal>,
) -> Vec<MenuItem> {
    let effective = principal
        .map(|p| p.permissions_under(policy))
        .unwrap_or_default();
    filter_items(items, &effective)
}

fn filter_items(items: &[MenuItem], effective: &PermissionSet) -> Vec<MenuItem> {
    items
        .iter()
        .filter(|item| item.requirement.is_satisfied_by(effective))
        .filter_map(|item| {
            let children = filter_items(&item.children, effective);
            if item.path.is_none() && children.is_empty() {
                return None;
            }
            Some(MenuItem {
                children,
                ..item.clone()
            })
        })
        .collect()
}

/// The clinic admin shell's menu tree.
pub fn standard_menu() -> Vec<MenuItem> {
    use Permission::*;

    vec![
        MenuItem::link("dashboard", "Dashboard", "/dashboard"),
        MenuItem::group(
            "clinical",
            "Clinical",
            vec![
                MenuItem::link("patients", "Patients", "/patients").requires([PatientsRead]),
                MenuItem::link("medical-records", "Medical Records", "/medical-records")
                    .requires([MedicalRecordsRead]),
                MenuItem::link("prescriptions", "Prescriptions", "/prescriptions")
                    .requires([PrescriptionsRead]),
                MenuItem::link("appointments", "Appointments", "/appointments")
                    .requires([AppointmentsRead, AppointmentsManage]),
            ],
        ),
        MenuItem::group(
            "pharmacy",
            "Pharmacy",
            vec![
                MenuItem::link("dispense", "Dispense", "/pharmacy/dispense")
                    .requires([PharmacyDispense]),
                MenuItem::link("inventory", "Inventory", "/pharmacy/inventory")
                    .requires([PharmacyManage]),
            ],
        ),
        MenuItem::group(
            "finance",
            "Finance",
            vec![
                MenuItem::link("billing", "Billing", "/billing")
                    .requires([BillingRead, BillingManage]),
                MenuItem::link("assets", "Assets", "/assets").requires([AssetsRead, AssetsManage]),
                MenuItem::link("reports", "Reports", "/reports").requires([ReportsView]),
            ],
        ),
        MenuItem::group(
            "administration",
            "Administration",
            vec![
                MenuItem::link("users", "Users", "/admin/users").requires([UsersRead, UsersManage]),
                MenuItem::link("settings", "Settings", "/admin/settings")
                    .requires([SettingsManage]),
                MenuItem::link("clinics", "Clinics", "/admin/clinics").requires([ClinicsManage]),
            ],
        )
        .requires([UsersRead, UsersManage, SettingsManage, ClinicsManage]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    fn ids(items: &[MenuItem]) -> Vec<&'static str> {
        let mut out = Vec::new();
        for item in items {
            out.push(item.id);
            out.extend(ids(&item.children));
        }
        out
    }

    #[test]
    fn test_anonymous_sees_public_entries_only() {
        let menu = visible_menu(&standard_menu(), None);
        assert_eq!(ids(&menu), vec!["dashboard"]);
    }

    #[test]
    fn test_doctor_menu() {
        let doctor = Principal::from_roles([Role::Doctor]);
        let menu = visible_menu(&standard_menu(), Some(&doctor));
        assert_eq!(
            ids(&menu),
            vec![
                "dashboard",
                "clinical",
                "patients",
                "medical-records",
                "prescriptions",
                "appointments",
                "finance",
                "reports",
            ]
        );
    }

    #[test]
    fn test_receptionist_menu_has_no_administration() {
        let receptionist = Principal::from_tokens(["Reception"]);
        let menu = visible_menu(&standard_menu(), Some(&receptionist));
        let visible = ids(&menu);

        assert!(visible.contains(&"billing"));
        assert!(visible.contains(&"appointments"));
        assert!(!visible.contains(&"administration"));
        assert!(!visible.contains(&"settings"));
        assert!(!visible.contains(&"pharmacy"));
    }

    #[test]
    fn test_super_admin_sees_everything() {
        let root = Principal::from_roles([Role::SuperAdmin]);
        let full = standard_menu();
        assert_eq!(ids(&visible_menu(&full, Some(&root))), ids(&full));
    }
}
