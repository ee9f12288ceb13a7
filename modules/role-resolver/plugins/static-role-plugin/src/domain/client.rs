//! `RoleSource` implementation for the static role plugin.

use async_trait::async_trait;
use role_resolver_sdk::{RoleLookupError, RoleRecord, RoleSource};

use super::service::Service;

#[async_trait]
impl RoleSource for Service {
    async fn fetch_role(&self, external_user_id: &str) -> Result<RoleRecord, RoleLookupError> {
        if let Some(delay) = self.latency() {
            tokio::time::sleep(delay).await;
        }
        let result = self.lookup(external_user_id);
        tracing::debug!(external_user_id, found = result.is_ok(), "static role lookup");
        result
    }
}
