//! Shared application state.

use crate::config::ServerConfig;
use clinic_authz::{AccessGuard, NavigationGuard, RouteTable};
use std::sync::Arc;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub navigation: Arc<NavigationGuard<'static>>,
    pub routes: Arc<RouteTable>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let navigation = NavigationGuard::new(AccessGuard::standard())
            .with_login_path(config.navigation.login_path.clone())
            .with_denied_path(config.navigation.denied_path.clone());

        Self {
            config: Arc::new(config),
            navigation: Arc::new(navigation),
            routes: Arc::new(RouteTable::standard()),
        }
    }
}
