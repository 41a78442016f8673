//! The permission catalog.
//!
//! Every capability token the platform knows about is declared once in the
//! `catalog!` invocation below. The macro emits the enum together with
//! [`Permission::ALL`], so the catalog and the enum cannot disagree.

use crate::error::AuthzError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! catalog {
    ($( $(#[$meta:meta])* $variant:ident => $token:literal ),+ $(,)?) => {
        /// A fine-grained capability token, namespaced as `<domain>.<action>`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Permission {
            $( $(#[$meta])* $variant, )+
        }

        impl Permission {
            /// The full catalog, in declaration order.
            pub const ALL: &'static [Permission] = &[ $( Permission::$variant, )+ ];

            /// Wire token for this permission.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Permission::$variant => $token, )+
                }
            }
        }
    };
}

catalog! {
    /// View patient demographics.
    PatientsRead => "patients.read",
    /// Register and edit patients.
    PatientsWrite => "patients.write",
    /// Remove patient records.
    PatientsDelete => "patients.delete",
    /// View medical records.
    MedicalRecordsRead => "medical_records.read",
    /// Write clinical notes and records.
    MedicalRecordsWrite => "medical_records.write",
    /// View prescriptions.
    PrescriptionsRead => "prescriptions.read",
    /// Draft prescriptions.
    PrescriptionsWrite => "prescriptions.write",
    /// Sign prescriptions.
    PrescriptionsSign => "prescriptions.sign",
    /// View pharmacy stock.
    PharmacyRead => "pharmacy.read",
    /// Dispense medication against a prescription.
    PharmacyDispense => "pharmacy.dispense",
    /// Manage pharmacy stock.
    PharmacyManage => "pharmacy.manage",
    /// View appointments.
    AppointmentsRead => "appointments.read",
    /// Book and reschedule appointments.
    AppointmentsManage => "appointments.manage",
    /// View invoices and payments.
    BillingRead => "billing.read",
    /// Issue invoices and record payments.
    BillingManage => "billing.manage",
    /// View the asset register.
    AssetsRead => "assets.read",
    /// Manage the asset register.
    AssetsManage => "assets.manage",
    /// View reports.
    ReportsView => "reports.view",
    /// Export reports.
    ReportsExport => "reports.export",
    /// View staff accounts.
    UsersRead => "users.read",
    /// Manage staff accounts and role assignments.
    UsersManage => "users.manage",
    /// Manage clinics.
    ClinicsManage => "clinics.manage",
    /// Change system settings.
    SettingsManage => "settings.manage",
}

impl Permission {
    /// The namespace part of the token (`patients` for `patients.read`).
    pub fn domain(self) -> &'static str {
        let token = self.as_str();
        token.split_once('.').map_or(token, |(domain, _)| domain)
    }

    /// Every permission in the given namespace.
    pub fn in_domain(domain: &str) -> impl Iterator<Item = Permission> + '_ {
        Self::ALL.iter().copied().filter(move |p| p.domain() == domain)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == token)
            .ok_or_else(|| AuthzError::UnknownPermission(s.to_string()))
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tokens_are_unique() {
        let tokens: HashSet<_> = Permission::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(tokens.len(), Permission::ALL.len());
    }

    #[test]
    fn test_tokens_are_namespaced() {
        for permission in Permission::ALL {
            let (domain, action) = permission
                .as_str()
                .split_once('.')
                .expect("token must be <domain>.<action>");
            assert!(!domain.is_empty());
            assert!(!action.is_empty());
            assert_eq!(permission.domain(), domain);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Pharmacy.Dispense".parse::<Permission>(), Ok(Permission::PharmacyDispense));
        assert_eq!(" billing.manage ".parse::<Permission>(), Ok(Permission::BillingManage));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            "pharmacy.teleport".parse::<Permission>(),
            Err(AuthzError::UnknownPermission("pharmacy.teleport".into()))
        );
    }

    #[test]
    fn test_in_domain() {
        let pharmacy: Vec<_> = Permission::in_domain("pharmacy").collect();
        assert_eq!(
            pharmacy,
            vec![Permission::PharmacyRead, Permission::PharmacyDispense, Permission::PharmacyManage]
        );
        assert_eq!(Permission::in_domain("kitchen").count(), 0);
    }

    #[test]
    fn test_serde_uses_tokens() {
        let json = serde_json::to_string(&Permission::PrescriptionsSign).unwrap();
        assert_eq!(json, "\"prescriptions.sign\"");

        let parsed: Permission = serde_json::from_str("\"assets.manage\"").unwrap();
        assert_eq!(parsed, Permission::AssetsManage);

        assert!(serde_json::from_str::<Permission>("\"assets.burn\"").is_err());
    }
}
