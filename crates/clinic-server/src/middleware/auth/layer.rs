//! Authentication middleware layer.
//!
//! Requests without credentials pass through anonymously; whether that is
//! acceptable is decided per route by the authorization layer. Credentials
//! that are present but invalid are rejected here.

use super::{
    jwt::TokenDecoder,
    types::{AuthUser, TokenType},
};
use crate::error::ApiError;
use axum::{
    body::Body,
    http::{header, Request},
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::debug;

/// Authentication layer configuration.
#[derive(Clone)]
pub struct AuthLayer {
    decoder: TokenDecoder,
    cookie_name: Arc<String>,
}

impl AuthLayer {
    /// Create new auth layer.
    pub fn new(jwt_secret: String) -> Self {
        Self {
            decoder: TokenDecoder::new(jwt_secret),
            cookie_name: Arc::new("access_token".to_string()),
        }
    }

    /// Cookie consulted when no Authorization header is present.
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = Arc::new(name.into());
        self
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            decoder: self.decoder.clone(),
            cookie_name: self.cookie_name.clone(),
        }
    }
}

/// Authentication middleware service.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    decoder: TokenDecoder,
    cookie_name: Arc<String>,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let authenticated = match extract_token(&req, &self.cookie_name) {
            Ok(Some(token)) => authenticate(&self.decoder, &token).map(Some),
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        };
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match authenticated {
                Ok(Some(auth_user)) => {
                    debug!(
                        user_id = %auth_user.id,
                        roles = ?auth_user.principal.roles(),
                        "Request authenticated"
                    );
                    req.extensions_mut().insert(auth_user);
                }
                Ok(None) => debug!("Anonymous request"),
                Err(err) => return Ok(err.into_response()),
            }

            // Continue to handler
            inner.call(req).await
        })
    }
}

fn authenticate(decoder: &TokenDecoder, token: &str) -> Result<AuthUser, ApiError> {
    let claims = decoder.decode(token)?;

    // Verify token type and not expired
    if claims.token_type != TokenType::Access {
        return Err(ApiError::InvalidToken);
    }
    if claims.is_expired() {
        return Err(ApiError::TokenExpired);
    }

    AuthUser::from_claims(claims).ok_or(ApiError::InvalidToken)
}

fn extract_token(req: &Request<Body>, cookie_name: &str) -> Result<Option<String>, ApiError> {
    // Try Authorization header first
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION) {
        let auth_str = auth_header.to_str().map_err(|_| ApiError::InvalidToken)?;

        return match auth_str.strip_prefix("Bearer ") {
            Some(token) => Ok(Some(token.trim().to_string())),
            None => Err(ApiError::InvalidToken),
        };
    }

    // Try cookie as fallback
    if let Some(cookie_header) = req.headers().get(header::COOKIE) {
        let cookie_str = cookie_header.to_str().map_err(|_| ApiError::InvalidToken)?;

        for cookie in cookie_str.split(';') {
            if let Some((name, value)) = cookie.trim().split_once('=') {
                if name == cookie_name {
                    return Ok(Some(value.to_string()));
                }
            }
        }
    }

    Ok(None)
}
