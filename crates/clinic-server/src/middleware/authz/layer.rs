//! Authorization middleware layer.

use super::audit::log_authz;
use crate::{error::ApiError, middleware::auth::types::AuthUser};
use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use clinic_authz::{AccessGuard, Permission, PermissionRequirement, Role, RoleRequirement};
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};

/// What a route declares about its callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Caller must hold any of these permissions.
    Permissions(PermissionRequirement),
    /// Caller must hold any of these roles.
    Roles(RoleRequirement),
}

impl Requirement {
    fn tokens(&self) -> Vec<&'static str> {
        match self {
            Self::Permissions(permissions) => {
                permissions.permissions().iter().map(|p| p.as_str()).collect()
            }
            Self::Roles(roles) => roles.roles().iter().map(|r| r.as_str()).collect(),
        }
    }
}

/// Authorization layer configuration.
#[derive(Clone)]
pub struct AuthzLayer {
    guard: AccessGuard<'static>,
    requirement: Arc<Requirement>,
}

impl AuthzLayer {
    pub fn new(requirement: Requirement) -> Self {
        Self {
            guard: AccessGuard::standard(),
            requirement: Arc::new(requirement),
        }
    }

    /// Require any of the given permissions. An empty list lets every request through.
    pub fn any_of(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self::new(Requirement::Permissions(PermissionRequirement::any_of(permissions)))
    }

    /// Require any of the given roles.
    pub fn allowed_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self::new(Requirement::Roles(RoleRequirement::any_of(roles)))
    }

    /// Evaluate against a different policy.
    pub fn with_guard(mut self, guard: AccessGuard<'static>) -> Self {
        self.guard = guard;
        self
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }
}

impl<S> Layer<S> for AuthzLayer {
    type Service = AuthzMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthzMiddleware {
            inner,
            guard: self.guard,
            requirement: self.requirement.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthzMiddleware<S> {
    inner: S,
    guard: AccessGuard<'static>,
    requirement: Arc<Requirement>,
}

impl<S> Service<Request<Body>> for AuthzMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // Decide before the request moves into the future.
        let auth_user = req.extensions().get::<AuthUser>();
        let principal = auth_user.map(|u| &u.principal);

        let decision = match self.requirement.as_ref() {
            Requirement::Permissions(permissions) => self.guard.check(permissions, principal),
            Requirement::Roles(roles) => self.guard.check_allowed_roles(roles, principal),
        };

        log_authz(
            auth_user,
            req.method().as_str(),
            req.uri().path(),
            self.requirement.tokens(),
            decision.as_ref().map(|_| ()),
        );

        let mut inner = self.inner.clone();

        Box::pin(async move {
            if let Err(denied) = decision {
                return Ok(ApiError::from(denied).into_response());
            }

            inner.call(req).await
        })
    }
}
