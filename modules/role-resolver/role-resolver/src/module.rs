//! Role resolver module wiring.

use std::sync::Arc;

use anyhow::Context;
use estate_kit::{BackendConfig, HttpClient};
use role_resolver_sdk::{
    AccessPolicy, IdentityProvider, MenuBuilder, MenuItem, ResolverState, Role, RoleSource,
    RouteTable,
};
use tracing::info;

use crate::config::RoleResolverConfig;
use crate::domain::{GuardedRoute, RoleDirectory, RoleHandle, RoleTracker};
use crate::infra::HttpRoleSource;

/// Role resolver module.
///
/// Owns the shared [`RoleDirectory`], the access policy and the menu
/// builder. Everything that needs the current role goes through here.
#[derive(Debug)]
pub struct RoleResolverModule {
    directory: Arc<RoleDirectory>,
    policy: Arc<AccessPolicy>,
    routes: RouteTable,
    menu: MenuBuilder,
}

impl RoleResolverModule {
    /// Build the module against the REST backend.
    ///
    /// # Errors
    ///
    /// Fails if the backend base URL is invalid, the HTTP client cannot
    /// be built or a configured route pattern is malformed.
    #[tracing::instrument(skip_all, fields(base_url = %backend.base_url))]
    pub fn init(cfg: RoleResolverConfig, backend: &BackendConfig) -> anyhow::Result<Self> {
        let http = HttpClient::new(backend).context("failed to build role lookup client")?;
        info!(ordering = ?cfg.ordering, "Initializing role resolver");
        Self::with_source(cfg, Arc::new(HttpRoleSource::new(http)))
    }

    /// Build the module over any role source (static plugin, tests).
    ///
    /// # Errors
    ///
    /// Fails if a configured route pattern is malformed or conflicting.
    pub fn with_source(
        cfg: RoleResolverConfig,
        source: Arc<dyn RoleSource>,
    ) -> anyhow::Result<Self> {
        let routes = cfg.route_table().context("invalid route table")?;
        Ok(Self {
            directory: RoleDirectory::new(source, cfg.ordering),
            policy: Arc::new(AccessPolicy::new(cfg.policy)),
            routes,
            menu: MenuBuilder::default(),
        })
    }

    #[must_use]
    pub fn directory(&self) -> &Arc<RoleDirectory> {
        &self.directory
    }

    #[must_use]
    pub fn policy(&self) -> &Arc<AccessPolicy> {
        &self.policy
    }

    /// Start following the identity provider.
    #[must_use]
    pub fn track(&self, provider: &dyn IdentityProvider) -> RoleTracker {
        RoleTracker::from_provider(Arc::clone(&self.directory), provider)
    }

    #[must_use]
    pub fn guard(
        &self,
        roles: RoleHandle,
        path: impl Into<String>,
        allowed_roles: Vec<Role>,
    ) -> GuardedRoute {
        GuardedRoute::new(roles, Arc::clone(&self.policy), path, allowed_roles)
    }

    /// Guard `path` with the allow-list of the route boundary it matches.
    #[must_use]
    pub fn guard_path(&self, roles: RoleHandle, path: impl Into<String>) -> GuardedRoute {
        let path = path.into();
        let allowed_roles = self.routes.allowed_roles(&path).to_vec();
        self.guard(roles, path, allowed_roles)
    }

    #[must_use]
    pub fn menu(&self, state: &ResolverState) -> Vec<MenuItem> {
        self.menu.build(state)
    }
}
