//! Authorization audit logging.

use crate::middleware::auth::types::AuthUser;
use chrono::{DateTime, Utc};
use clinic_authz::AccessDenied;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Authorization audit event.
#[derive(Debug, Serialize)]
pub struct AuthzAuditEvent {
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub roles: Vec<String>,
    pub method: String,
    pub path: String,
    pub requirement: Vec<&'static str>,
    pub granted: bool,
    pub reason: Option<&'static str>,
}

impl AuthzAuditEvent {
    pub fn new(
        user: Option<&AuthUser>,
        method: &str,
        path: &str,
        requirement: Vec<&'static str>,
        outcome: Result<(), &AccessDenied>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id: user.map(|u| u.id),
            roles: user
                .map(|u| u.principal.roles().iter().map(|r| r.to_string()).collect())
                .unwrap_or_default(),
            method: method.to_string(),
            path: path.to_string(),
            requirement,
            granted: outcome.is_ok(),
            reason: outcome.err().map(AccessDenied::reason_code),
        }
    }

    pub fn log(&self) {
        if self.granted {
            info!(
                event = "authz_granted",
                user_id = ?self.user_id,
                method = %self.method,
                path = %self.path,
                requirement = ?self.requirement,
                "Authorization granted"
            );
        } else {
            info!(
                event = "authz_denied",
                user_id = ?self.user_id,
                roles = ?self.roles,
                method = %self.method,
                path = %self.path,
                requirement = ?self.requirement,
                reason = ?self.reason,
                "Authorization denied"
            );
        }
    }
}

/// Log authorization decision.
pub fn log_authz(
    user: Option<&AuthUser>,
    method: &str,
    path: &str,
    requirement: Vec<&'static str>,
    outcome: Result<(), &AccessDenied>,
) {
    AuthzAuditEvent::new(user, method, path, requirement, outcome).log();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_authz::Permission;

    #[test]
    fn test_denied_event_records_reason() {
        let denied = AccessDenied::Unauthenticated { required: vec![Permission::BillingRead] };
        let event = AuthzAuditEvent::new(
            None,
            "GET",
            "/api/v1/billing",
            vec!["billing.read"],
            Err(&denied),
        );

        assert!(!event.granted);
        assert_eq!(event.reason, Some("unauthenticated"));
        assert!(event.user_id.is_none());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["requirement"][0], "billing.read");
    }

    #[test]
    fn test_granted_event_has_no_reason() {
        let event = AuthzAuditEvent::new(None, "GET", "/api/v1/reports", vec![], Ok(()));
        assert!(event.granted);
        assert!(event.reason.is_none());
    }
}
