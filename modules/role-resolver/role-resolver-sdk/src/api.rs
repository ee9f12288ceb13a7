//! Public API traits of the role resolver.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::RoleLookupError;
use crate::models::{RoleRecord, SessionIdentity};

/// Lookup of the persisted role record for an identity.
///
/// Implemented by the REST client of the resolver module and by the static
/// plugin used for development and tests.
///
/// ```ignore
/// let record = source.fetch_role("user_2abc").await?;
/// println!("{}", record.role);
/// ```
#[async_trait]
pub trait RoleSource: Send + Sync {
    /// Fetch the role record for `external_user_id`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the backend has no profile for the identity
    /// - `Network` if the request never got a response
    /// - `Status` for any other non-success status
    /// - `Decode` if the payload carries no role
    async fn fetch_role(&self, external_user_id: &str) -> Result<RoleRecord, RoleLookupError>;
}

/// Adapter over the identity provider's session.
pub trait IdentityProvider: Send + Sync {
    /// Current session identity.
    fn current(&self) -> SessionIdentity;

    /// Stream of session changes (login, logout, provider finished loading).
    fn subscribe(&self) -> watch::Receiver<SessionIdentity>;
}
