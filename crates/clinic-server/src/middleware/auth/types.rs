//! Authentication types.

use chrono::Utc;
use clinic_authz::Principal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    /// User email.
    pub email: String,
    /// Role tokens as issued upstream; may use legacy spellings.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Clinic the session is scoped to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinic_id: Option<Uuid>,
    /// Token type (access/refresh).
    pub token_type: TokenType,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
    /// JWT ID (for revocation).
    pub jti: String,
}

/// Token type enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

impl Claims {
    /// Create new access token claims.
    pub fn new_access(user_id: Uuid, email: &str, roles: Vec<String>, expires_in: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            roles,
            clinic_id: None,
            token_type: TokenType::Access,
            iat: now,
            exp: now + expires_in,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Create new refresh token claims.
    pub fn new_refresh(user_id: Uuid, expires_in: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            email: String::new(),
            roles: Vec::new(),
            clinic_id: None,
            token_type: TokenType::Refresh,
            iat: now,
            exp: now + expires_in,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Get user ID as UUID.
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    /// Check if token is expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Authenticated user context.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub clinic_id: Option<Uuid>,
    pub principal: Principal,
    pub claims: Claims,
}

impl AuthUser {
    /// Create from claims, parsing role tokens at the boundary.
    pub fn from_claims(claims: Claims) -> Option<Self> {
        let id = claims.user_id()?;
        Some(Self {
            id,
            email: claims.email.clone(),
            clinic_id: claims.clinic_id,
            principal: Principal::from_tokens(&claims.roles),
            claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_authz::Role;

    #[test]
    fn test_from_claims_normalizes_roles() {
        let claims = Claims::new_access(
            Uuid::new_v4(),
            "dr.house@example.com",
            vec![" Physician ".into(), "pharmacy".into(), "janitor".into()],
            3600,
        );
        let user = AuthUser::from_claims(claims).unwrap();

        assert!(user.principal.has_role(Role::Doctor));
        assert!(user.principal.has_role(Role::Pharmacist));
        assert_eq!(user.principal.unrecognized(), ["janitor".to_string()]);
    }

    #[test]
    fn test_from_claims_rejects_bad_subject() {
        let mut claims = Claims::new_access(Uuid::new_v4(), "x@example.com", vec![], 3600);
        claims.sub = "not-a-uuid".into();
        assert!(AuthUser::from_claims(claims).is_none());
    }

    #[test]
    fn test_expiry() {
        let claims = Claims::new_access(Uuid::new_v4(), "x@example.com", vec![], -10);
        assert!(claims.is_expired());
        assert!(!Claims::new_refresh(Uuid::new_v4(), 60).is_expired());
    }
}
