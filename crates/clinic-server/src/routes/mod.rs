//! Route configuration for the clinic API server.

mod internal;
mod v1;

use crate::{error::ApiError, middleware::AuthLayer, state::AppState};
use axum::{response::IntoResponse, Router};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

/// Create the main application router.
///
/// Authentication runs for every route and only attaches the caller's
/// identity; each protected route carries its own authorization layer.
pub fn create_router(state: AppState) -> Router {
    let auth = AuthLayer::new(state.config.auth.jwt_secret.clone())
        .with_cookie_name(state.config.auth.cookie_name.clone());

    // Common middleware stack applied to all routes
    let common_middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.request_timeout_secs,
        )));

    Router::new()
        .nest("/api/v1", v1::router())
        .nest("/internal", internal::router())
        .fallback(fallback_handler)
        .layer(auth)
        .layer(common_middleware)
        .with_state(state)
}

async fn fallback_handler() -> impl IntoResponse {
    ApiError::NotFound("Route".into())
}
