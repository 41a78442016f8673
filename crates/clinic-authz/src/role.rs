//! Roles and role-token normalization.

use crate::error::AuthzError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A named bundle of permissions. Principals may hold several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Platform operator; holds the whole catalog.
    SuperAdmin,
    /// Clinic administrator.
    Admin,
    Doctor,
    Nurse,
    Receptionist,
    Pharmacist,
    Accountant,
    /// Authenticated staff member with no grants of their own.
    User,
}

impl Role {
    /// Every role, highest privilege first.
    pub const ALL: &'static [Role] = &[
        Role::SuperAdmin,
        Role::Admin,
        Role::Doctor,
        Role::Nurse,
        Role::Receptionist,
        Role::Pharmacist,
        Role::Accountant,
        Role::User,
    ];

    /// Canonical wire token.
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Receptionist => "receptionist",
            Role::Pharmacist => "pharmacist",
            Role::Accountant => "accountant",
            Role::User => "user",
        }
    }

    /// Map an upstream token onto a role.
    ///
    /// The token is trimmed and lower-cased, then looked up in
    /// [`ROLE_ALIASES`] before the canonical names. Returns `None` for
    /// anything unrecognized.
    pub fn normalize(token: &str) -> Option<Role> {
        let folded = token.trim().to_lowercase();
        if folded.is_empty() {
            return None;
        }

        ROLE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == folded)
            .map(|(_, role)| *role)
            .or_else(|| Self::ALL.iter().copied().find(|r| r.as_str() == folded))
    }
}

/// Legacy and upstream spellings mapped onto canonical roles.
///
/// Keys are already trimmed and lower-cased.
pub const ROLE_ALIASES: &[(&str, Role)] = &[
    ("superadmin", Role::SuperAdmin),
    ("super-admin", Role::SuperAdmin),
    ("super admin", Role::SuperAdmin),
    ("root", Role::SuperAdmin),
    ("administrator", Role::Admin),
    ("medic", Role::Doctor),
    ("physician", Role::Doctor),
    ("dr", Role::Doctor),
    ("nursing", Role::Nurse),
    ("reception", Role::Receptionist),
    ("front_desk", Role::Receptionist),
    ("frontdesk", Role::Receptionist),
    ("pharmacy", Role::Pharmacist),
    ("chemist", Role::Pharmacist),
    ("finance", Role::Accountant),
    ("accounting", Role::Accountant),
    ("billing", Role::Accountant),
    ("staff", Role::User),
    ("authenticated", Role::User),
];

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::normalize(s).ok_or_else(|| AuthzError::UnknownRole(s.to_string()))
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::normalize(role.as_str()), Some(*role));
        }
    }

    #[test]
    fn test_normalize_folds_case_and_whitespace() {
        assert_eq!(Role::normalize(" Doctor "), Some(Role::Doctor));
        assert_eq!(Role::normalize("SUPER_ADMIN"), Some(Role::SuperAdmin));
        assert_eq!(Role::normalize("\tnurse\n"), Some(Role::Nurse));
    }

    #[test]
    fn test_legacy_aliases() {
        assert_eq!(Role::normalize("superadmin"), Some(Role::SuperAdmin));
        assert_eq!(Role::normalize("Super-Admin"), Some(Role::SuperAdmin));
        assert_eq!(Role::normalize("medic"), Some(Role::Doctor));
        assert_eq!(Role::normalize("Reception"), Some(Role::Receptionist));
        assert_eq!(Role::normalize("finance"), Some(Role::Accountant));
    }

    #[test]
    fn test_unknown_tokens() {
        assert_eq!(Role::normalize("not_a_real_role"), None);
        assert_eq!(Role::normalize(""), None);
        assert_eq!(Role::normalize("   "), None);
        assert!(matches!("janitor".parse::<Role>(), Err(AuthzError::UnknownRole(_))));
    }

    #[test]
    fn test_aliases_are_folded_and_never_shadow_canonical_names() {
        for (alias, _) in ROLE_ALIASES {
            assert_eq!(*alias, alias.trim().to_lowercase(), "alias {alias:?} is not folded");
            assert!(
                Role::ALL.iter().all(|r| r.as_str() != *alias),
                "alias {alias:?} shadows a canonical role"
            );
        }
    }

    #[test]
    fn test_serde_uses_canonical_tokens() {
        let json = serde_json::to_string(&vec![Role::Doctor, Role::SuperAdmin]).unwrap();
        assert_eq!(json, r#"["doctor","super_admin"]"#);

        let roles: Vec<Role> = serde_json::from_str(r#"["Medic","pharmacist"]"#).unwrap();
        assert_eq!(roles, vec![Role::Doctor, Role::Pharmacist]);
    }
}
