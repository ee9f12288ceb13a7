//! Service implementation for the static role plugin.

use std::collections::HashMap;
use std::time::Duration;

use role_resolver_sdk::{Role, RoleLookupError, RoleRecord};

use crate::config::StaticRolePluginConfig;

/// Static role service.
///
/// Answers lookups from the configured user table; ids are matched after
/// trimming whitespace.
#[derive(Debug, Default)]
pub struct Service {
    roles: HashMap<String, Role>,
    latency: Option<Duration>,
}

impl Service {
    #[must_use]
    pub fn from_config(cfg: &StaticRolePluginConfig) -> Self {
        let roles = cfg
            .users
            .iter()
            .map(|u| (u.external_user_id.trim().to_owned(), u.role))
            .collect();
        Self {
            roles,
            latency: cfg.latency,
        }
    }

    #[must_use]
    pub fn with_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = (S, Role)>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(|(id, role)| (id.into(), role)).collect(),
            latency: None,
        }
    }

    #[must_use]
    pub fn latency(&self) -> Option<Duration> {
        self.latency
    }

    /// Look up a configured role record.
    ///
    /// # Errors
    ///
    /// Returns [`RoleLookupError::NotFound`] for ids not in the table.
    pub fn lookup(&self, external_user_id: &str) -> Result<RoleRecord, RoleLookupError> {
        let id = external_user_id.trim();
        self.roles
            .get(id)
            .map(|role| RoleRecord {
                external_user_id: id.to_owned(),
                role: *role,
            })
            .ok_or_else(|| RoleLookupError::NotFound(id.to_owned()))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::UserRoleConfig;

    #[test]
    fn configured_users_resolve() {
        let cfg = StaticRolePluginConfig {
            users: vec![UserRoleConfig {
                external_user_id: " user_1 ".to_owned(),
                role: Role::Employee,
            }],
            ..StaticRolePluginConfig::default()
        };
        let svc = Service::from_config(&cfg);
        let record = svc.lookup("user_1").unwrap();
        assert_eq!(record.role, Role::Employee);
        assert_eq!(record.external_user_id, "user_1");
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let svc = Service::with_roles([("user_1", Role::Admin)]);
        assert_eq!(
            svc.lookup("user_2"),
            Err(RoleLookupError::NotFound("user_2".to_owned()))
        );
    }
}
