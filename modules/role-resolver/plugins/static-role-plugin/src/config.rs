//! Configuration for the static role plugin.

use std::time::Duration;

use role_resolver_sdk::Role;
use serde::Deserialize;

/// Plugin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticRolePluginConfig {
    /// Role records served by the plugin. Ids not listed are "not found".
    pub users: Vec<UserRoleConfig>,

    /// Identity signed in at start-up. `None` starts signed out.
    pub signed_in: Option<String>,

    /// Artificial delay before each lookup answers.
    #[serde(deserialize_with = "estate_kit::duration::deserialize_opt")]
    pub latency: Option<Duration>,
}

/// One configured role record.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserRoleConfig {
    pub external_user_id: String,
    pub role: Role,
}
