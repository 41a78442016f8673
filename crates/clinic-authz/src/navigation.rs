//! Navigation guard for the admin shell's client-side routes.
//!
//! A denied navigation never fails silently: the caller is redirected to a
//! safe location, and the query string carries the reason and the denied
//! requirement.

use crate::{
    error::AccessDenied,
    guard::{AccessGuard, PermissionRequirement, RoleRequirement},
    permission::Permission,
    principal::Session,
    role::Role,
};
use serde::Serialize;
use url::form_urlencoded;

/// Guard metadata declared on a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMeta {
    pub path: String,
    pub required_permissions: PermissionRequirement,
    pub allowed_roles: RoleRequirement,
}

impl RouteMeta {
    /// A route with no requirement.
    pub fn public(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            required_permissions: PermissionRequirement::public(),
            allowed_roles: RoleRequirement::any(),
        }
    }

    pub fn requiring(
        path: impl Into<String>,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            required_permissions: PermissionRequirement::any_of(permissions),
            ..Self::public(path)
        }
    }

    pub fn with_allowed_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.allowed_roles = RoleRequirement::any_of(roles);
        self
    }
}

/// Where a denied navigation is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    /// Target path including the diagnostic query string.
    pub location: String,
    /// Machine-readable reason, see [`AccessDenied::reason_code`].
    pub reason: &'static str,
    /// The denied requirement as wire tokens.
    pub required: Vec<String>,
}

/// Result of a navigation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationOutcome {
    Proceed,
    Redirect(Redirect),
}

impl NavigationOutcome {
    pub fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}

/// Decides client-side navigations.
#[derive(Debug, Clone)]
pub struct NavigationGuard<'p> {
    guard: AccessGuard<'p>,
    login_path: String,
    denied_path: String,
}

impl NavigationGuard<'static> {
    pub fn standard() -> Self {
        Self::new(AccessGuard::standard())
    }
}

impl<'p> NavigationGuard<'p> {
    pub fn new(guard: AccessGuard<'p>) -> Self {
        Self {
            guard,
            login_path: "/auth/login".to_string(),
            denied_path: "/unauthorized".to_string(),
        }
    }

    /// Where unauthenticated callers are sent.
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Where callers lacking a capability are sent.
    pub fn with_denied_path(mut self, path: impl Into<String>) -> Self {
        self.denied_path = path.into();
        self
    }

    /// Check the route's permission requirement, then its role gate.
    ///
    /// Denials carry the route's own path as `return_url`; use
    /// [`check_path`](Self::check_path) when the concrete target is known.
    pub fn can_activate(&self, route: &RouteMeta, session: &Session) -> NavigationOutcome {
        self.decide(route, &route.path, session)
    }

    /// Look up `path` in `routes` and decide the navigation.
    ///
    /// The path is normalized first, so dot segments and repeated slashes
    /// resolve to the route a browser would open. Paths with no matching
    /// route are public. A denial sends the normalized target, query
    /// included, back as `return_url`.
    pub fn check_path(
        &self,
        routes: &RouteTable,
        path: &str,
        session: &Session,
    ) -> NavigationOutcome {
        let target = normalize_path(path);
        let attempted = match query_of(path) {
            Some(query) => format!("{target}?{query}"),
            None => target.clone(),
        };

        match routes.find(&target) {
            Some(route) => self.decide(route, &attempted, session),
            None => self.decide(&RouteMeta::public(target), &attempted, session),
        }
    }

    fn decide(&self, route: &RouteMeta, attempted: &str, session: &Session) -> NavigationOutcome {
        let principal = session.principal();

        let decision = self
            .guard
            .check(&route.required_permissions, principal)
            .and_then(|()| self.guard.check_allowed_roles(&route.allowed_roles, principal));

        match decision {
            Ok(()) => NavigationOutcome::Proceed,
            Err(denied) => NavigationOutcome::Redirect(self.redirect_for(attempted, &denied)),
        }
    }

    fn redirect_for(&self, attempted: &str, denied: &AccessDenied) -> Redirect {
        let base = if denied.is_unauthenticated() {
            &self.login_path
        } else {
            &self.denied_path
        };

        let required: Vec<String> = denied
            .required_tokens()
            .into_iter()
            .map(String::from)
            .collect();

        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("reason", denied.reason_code());
        if !required.is_empty() {
            query.append_pair("required", &required.join(","));
        }
        query.append_pair("return_url", attempted);

        Redirect {
            location: format!("{}?{}", base, query.finish()),
            reason: denied.reason_code(),
            required,
        }
    }
}

/// Route metadata for the admin shell, looked up by path.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteMeta>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteMeta>) -> Self {
        Self { routes }
    }

    /// Routes of the clinic admin shell.
    pub fn standard() -> Self {
        use Permission::*;

        Self::new(vec![
            RouteMeta::public("/dashboard"),
            RouteMeta::requiring("/patients", [PatientsRead]),
            RouteMeta::requiring("/patients/new", [PatientsWrite]),
            RouteMeta::requiring("/medical-records", [MedicalRecordsRead]),
            RouteMeta::requiring("/prescriptions", [PrescriptionsRead]),
            RouteMeta::requiring("/prescriptions/sign", [PrescriptionsSign]),
            RouteMeta::requiring("/pharmacy", [PharmacyRead, PharmacyDispense]),
            RouteMeta::requiring("/pharmacy/dispense", [PharmacyDispense]),
            RouteMeta::requiring("/pharmacy/inventory", [PharmacyManage]),
            RouteMeta::requiring("/appointments", [AppointmentsRead, AppointmentsManage]),
            RouteMeta::requiring("/billing", [BillingRead, BillingManage]),
            RouteMeta::requiring("/assets", [AssetsRead, AssetsManage]),
            RouteMeta::requiring("/reports", [ReportsView]),
            RouteMeta::requiring("/admin/users", [UsersRead, UsersManage]),
            RouteMeta::requiring("/admin/settings", [SettingsManage]),
            RouteMeta::requiring("/admin/clinics", [ClinicsManage])
                .with_allowed_roles([Role::SuperAdmin]),
        ])
    }

    /// Metadata for `path`.
    ///
    /// The path goes through [`normalize_path`] first. Exact matches win;
    /// otherwise the longest route that is a segment-aligned prefix of the
    /// normalized path applies.
    pub fn find(&self, path: &str) -> Option<&RouteMeta> {
        let path = normalize_path(path);
        let path = path.as_str();

        self.routes
            .iter()
            .filter(|route| {
                path == route.path
                    || path
                        .strip_prefix(route.path.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|route| route.path.len())
    }

    pub fn routes(&self) -> &[RouteMeta] {
        &self.routes
    }
}

/// Reduce a navigation target to the path a browser would request.
///
/// Drops the query and fragment, treats `\` as `/`, removes empty and `.`
/// segments and resolves `..` (never above the root). Percent-encoded dots
/// count as dots.
pub fn normalize_path(path: &str) -> String {
    let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(|c: char| c == '/' || c == '\\') {
        match segment.to_ascii_lowercase().replace("%2e", ".").as_str() {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}

fn query_of(path: &str) -> Option<&str> {
    let (_, rest) = path.split_once('?')?;
    let query = rest.split('#').next().unwrap_or_default();
    (!query.is_empty()).then_some(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_pairs(location: &str) -> Vec<(String, String)> {
        let (_, query) = location.split_once('?').expect("redirect carries a query");
        form_urlencoded::parse(query.as_bytes()).into_owned().collect()
    }

    #[test]
    fn test_public_route_proceeds_for_anonymous() {
        let guard = NavigationGuard::standard();
        let outcome = guard.can_activate(&RouteMeta::public("/dashboard"), &Session::new());
        assert!(outcome.is_proceed());
    }

    #[test]
    fn test_anonymous_redirects_to_login() {
        let guard = NavigationGuard::standard();
        let route = RouteMeta::requiring("/patients", [Permission::PatientsRead]);

        let outcome = guard.can_activate(&route, &Session::new());
        let NavigationOutcome::Redirect(redirect) = outcome else {
            panic!("expected redirect");
        };
        assert!(redirect.location.starts_with("/auth/login?"));
        assert_eq!(redirect.reason, "unauthenticated");
        assert_eq!(
            query_pairs(&redirect.location),
            vec![
                ("reason".to_string(), "unauthenticated".to_string()),
                ("required".to_string(), "patients.read".to_string()),
                ("return_url".to_string(), "/patients".to_string()),
            ]
        );
    }

    #[test]
    fn test_pending_session_is_unauthenticated() {
        let guard = NavigationGuard::standard();
        let mut session = Session::new();
        session.begin();

        let route = RouteMeta::requiring("/billing", [Permission::BillingRead]);
        let NavigationOutcome::Redirect(redirect) = guard.can_activate(&route, &session) else {
            panic!("expected redirect");
        };
        assert_eq!(redirect.reason, "unauthenticated");
    }

    #[test]
    fn test_insufficient_redirects_to_denied_path() {
        let guard = NavigationGuard::standard().with_denied_path("/forbidden");
        let session = Session::active(["receptionist"]);
        let route = RouteMeta::requiring("/admin/settings", [Permission::SettingsManage]);

        let NavigationOutcome::Redirect(redirect) = guard.can_activate(&route, &session) else {
            panic!("expected redirect");
        };
        assert!(redirect.location.starts_with("/forbidden?"));
        assert_eq!(redirect.reason, "insufficient_permission");
        assert_eq!(redirect.required, vec!["settings.manage".to_string()]);
    }

    #[test]
    fn test_role_gate_applies_after_permissions() {
        let guard = NavigationGuard::standard();
        let table = RouteTable::standard();
        let route = table.find("/admin/clinics").unwrap();

        assert!(guard.can_activate(route, &Session::active(["superadmin"])).is_proceed());

        // Admins hold no clinics.manage, so the permission check fails first.
        let outcome = guard.can_activate(route, &Session::active(["admin"]));
        let NavigationOutcome::Redirect(redirect) = outcome else {
            panic!("expected redirect");
        };
        assert_eq!(redirect.reason, "insufficient_permission");

        let custom = RouteMeta::requiring("/admin/audit", [Permission::SettingsManage])
            .with_allowed_roles([Role::SuperAdmin]);
        let outcome = guard.can_activate(&custom, &Session::active(["admin"]));
        let NavigationOutcome::Redirect(redirect) = outcome else {
            panic!("expected redirect");
        };
        assert_eq!(redirect.reason, "role_not_allowed");
        assert_eq!(redirect.required, vec!["super_admin".to_string()]);
    }

    #[test]
    fn test_route_lookup() {
        let table = RouteTable::standard();
        assert_eq!(table.find("/patients").unwrap().path, "/patients");
        assert_eq!(table.find("/patients/").unwrap().path, "/patients");
        assert_eq!(table.find("/patients/new?draft=1").unwrap().path, "/patients/new");
        assert_eq!(table.find("/patients/42/edit").unwrap().path, "/patients");
        assert_eq!(table.find("/pharmacy/dispense/7").unwrap().path, "/pharmacy/dispense");
        assert!(table.find("/patientsx").is_none());
        assert!(table.find("/").is_none());
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/patients"), "/patients");
        assert_eq!(normalize_path("//admin//settings/"), "/admin/settings");
        assert_eq!(normalize_path("/dashboard/../admin/settings"), "/admin/settings");
        assert_eq!(normalize_path("/./admin/./settings?tab=2#top"), "/admin/settings");
        assert_eq!(normalize_path("/dashboard/%2E%2e/admin\\settings"), "/admin/settings");
        assert_eq!(normalize_path("/../../patients"), "/patients");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn test_route_lookup_resolves_dot_segments() {
        let table = RouteTable::standard();
        assert_eq!(table.find("/dashboard/../admin/settings").unwrap().path, "/admin/settings");
        assert_eq!(table.find("//admin/settings").unwrap().path, "/admin/settings");
        assert_eq!(table.find("/pharmacy/./dispense").unwrap().path, "/pharmacy/dispense");
    }

    #[test]
    fn test_check_path_denies_disguised_targets() {
        let guard = NavigationGuard::standard();
        let table = RouteTable::standard();
        let session = Session::active(["receptionist"]);

        for path in [
            "/admin/settings",
            "/dashboard/../admin/settings",
            "//admin/settings",
            "/admin/./settings/",
        ] {
            let outcome = guard.check_path(&table, path, &session);
            let NavigationOutcome::Redirect(redirect) = outcome else {
                panic!("{path} reached settings");
            };
            assert_eq!(redirect.reason, "insufficient_permission", "{path}");
        }

        assert!(guard.check_path(&table, "/dashboard", &session).is_proceed());
        assert!(guard.check_path(&table, "/help", &Session::new()).is_proceed());
    }

    #[test]
    fn test_check_path_returns_to_attempted_target() {
        let guard = NavigationGuard::standard();
        let table = RouteTable::standard();

        let outcome = guard.check_path(&table, "/patients/12/edit?tab=notes", &Session::new());
        let NavigationOutcome::Redirect(redirect) = outcome else {
            panic!("expected redirect");
        };
        assert_eq!(redirect.reason, "unauthenticated");
        assert!(query_pairs(&redirect.location)
            .contains(&("return_url".to_string(), "/patients/12/edit?tab=notes".to_string())));
    }
}
