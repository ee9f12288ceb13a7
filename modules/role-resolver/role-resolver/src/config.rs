//! Configuration for the role resolver module.

use estate_kit::ResponseOrdering;
use role_resolver_sdk::{AccessPolicyConfig, Role, RouteTable, RouteTableError};
use serde::Deserialize;

/// Module configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoleResolverConfig {
    /// Which of two overlapping lookups for the same identity wins.
    pub ordering: ResponseOrdering,

    /// Admin-only prefixes and redirect targets.
    pub policy: AccessPolicyConfig,

    /// Allow-lists of route boundaries, looked up by requested path.
    pub routes: Vec<RouteRule>,
}

/// One route boundary, e.g. `/sales/:id` open to admins and employees.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteRule {
    pub pattern: String,
    #[serde(default)]
    pub allow: Vec<Role>,
}

impl RoleResolverConfig {
    /// # Errors
    ///
    /// Returns [`RouteTableError`] for a malformed or conflicting pattern.
    pub fn route_table(&self) -> Result<RouteTable, RouteTableError> {
        let mut table = RouteTable::new();
        for rule in &self.routes {
            table.insert(&rule.pattern, rule.allow.clone())?;
        }
        Ok(table)
    }
}
