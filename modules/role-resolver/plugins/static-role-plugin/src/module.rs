//! Static role plugin wiring.

use std::sync::Arc;

use role_resolver_sdk::SessionIdentity;
use tracing::info;

use crate::config::StaticRolePluginConfig;
use crate::domain::{Service, StaticIdentityProvider};

/// Role source and identity provider built from one config block.
#[derive(Debug, Clone)]
pub struct StaticRolePlugin {
    pub service: Arc<Service>,
    pub identity: Arc<StaticIdentityProvider>,
}

impl StaticRolePlugin {
    #[must_use]
    pub fn init(cfg: &StaticRolePluginConfig) -> Self {
        info!(
            users = cfg.users.len(),
            signed_in = cfg.signed_in.as_deref().unwrap_or("-"),
            "Initializing static role plugin"
        );
        let session = cfg
            .signed_in
            .as_deref()
            .map_or_else(SessionIdentity::signed_out, SessionIdentity::signed_in);
        Self {
            service: Arc::new(Service::from_config(cfg)),
            identity: Arc::new(StaticIdentityProvider::new(session)),
        }
    }
}
