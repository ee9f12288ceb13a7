//! Settable identity session.

use role_resolver_sdk::{IdentityProvider, SessionIdentity};
use tokio::sync::watch;

/// Identity provider whose session is set by the caller.
#[derive(Debug)]
pub struct StaticIdentityProvider {
    session: watch::Sender<SessionIdentity>,
}

impl Default for StaticIdentityProvider {
    fn default() -> Self {
        Self::new(SessionIdentity::pending())
    }
}

impl StaticIdentityProvider {
    #[must_use]
    pub fn new(initial: SessionIdentity) -> Self {
        let (session, _) = watch::channel(initial);
        Self { session }
    }

    pub fn sign_in(&self, external_user_id: impl Into<String>) {
        self.session
            .send_replace(SessionIdentity::signed_in(external_user_id));
    }

    pub fn sign_out(&self) {
        self.session.send_replace(SessionIdentity::signed_out());
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn current(&self) -> SessionIdentity {
        self.session.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<SessionIdentity> {
        self.session.subscribe()
    }
}
