//! Authentication extractors for handlers.

use super::types::AuthUser;
use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Extractor for authenticated user (required).
pub struct Auth(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(Auth)
            .ok_or_else(ApiError::unauthenticated)
    }
}

/// Extractor for optional authenticated user.
pub struct MaybeAuth(pub Option<AuthUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(parts.extensions.get::<AuthUser>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::types::Claims;
    use axum::http::Request;
    use uuid::Uuid;

    fn auth_user(roles: &[&str]) -> AuthUser {
        let claims = Claims::new_access(
            Uuid::new_v4(),
            "test@example.com",
            roles.iter().map(|r| r.to_string()).collect(),
            3600,
        );
        AuthUser::from_claims(claims).unwrap()
    }

    #[tokio::test]
    async fn test_auth_extractor_success() {
        let user = auth_user(&["doctor"]);
        let (mut parts, _) = Request::new(()).into_parts();
        parts.extensions.insert(user.clone());

        let Auth(extracted) = Auth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted.id, user.id);
    }

    #[tokio::test]
    async fn test_auth_extractor_missing() {
        let (mut parts, _) = Request::new(()).into_parts();

        let result = Auth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Unauthenticated { .. })));
    }

    #[tokio::test]
    async fn test_maybe_auth_extractor() {
        let (mut parts, _) = Request::new(()).into_parts();
        let MaybeAuth(none) = MaybeAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(none.is_none());

        parts.extensions.insert(auth_user(&["nurse"]));
        let MaybeAuth(some) = MaybeAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(some.is_some());
    }
}
