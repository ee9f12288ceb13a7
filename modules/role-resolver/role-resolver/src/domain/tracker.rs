//! Follows the identity provider and keeps a resolver state for whoever is
//! currently signed in.

use std::sync::Arc;

use role_resolver_sdk::{IdentityProvider, ResolverState, RoleView, SessionIdentity};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span};

use super::directory::{RoleDirectory, RoleSubscription};

/// Cheap, cloneable read side of a [`RoleTracker`].
#[derive(Debug, Clone)]
pub struct RoleHandle {
    directory: Arc<RoleDirectory>,
    identity: watch::Receiver<SessionIdentity>,
    states: watch::Receiver<ResolverState>,
}

impl RoleHandle {
    #[must_use]
    pub fn state(&self) -> ResolverState {
        self.states.borrow().clone()
    }

    #[must_use]
    pub fn view(&self) -> RoleView {
        RoleView::from(&*self.states.borrow())
    }

    #[must_use]
    pub fn identity(&self) -> SessionIdentity {
        self.identity.borrow().clone()
    }

    /// Re-issue the lookup for the current identity. Returns `false` when
    /// there is no resolvable identity.
    #[must_use]
    pub fn refresh(&self) -> bool {
        let id = self.identity.borrow().resolvable_id().map(str::to_owned);
        id.is_some_and(|id| self.directory.refresh(&id))
    }

    /// Wait for the next resolver state. `None` once the tracker is gone.
    pub async fn changed(&mut self) -> Option<ResolverState> {
        self.states.changed().await.ok()?;
        Some(self.states.borrow_and_update().clone())
    }

    /// Wait until the state is no longer `Loading`.
    pub async fn settled(&mut self) -> ResolverState {
        let settled = self
            .states
            .wait_for(|s| !s.is_loading())
            .await
            .map(|state| state.clone());
        settled.unwrap_or_else(|_| self.state())
    }
}

/// Background task re-subscribing to the directory whenever the session
/// identity changes. Stops when dropped.
#[derive(Debug)]
pub struct RoleTracker {
    handle: RoleHandle,
    cancel: CancellationToken,
}

impl RoleTracker {
    /// Start tracking. Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(directory: Arc<RoleDirectory>, identity: watch::Receiver<SessionIdentity>) -> Self {
        let (tx, states) = watch::channel(ResolverState::Loading);
        let cancel = CancellationToken::new();

        tokio::spawn(
            follow(Arc::clone(&directory), identity.clone(), tx, cancel.clone())
                .instrument(info_span!("role_tracker")),
        );

        Self {
            handle: RoleHandle {
                directory,
                identity,
                states,
            },
            cancel,
        }
    }

    #[must_use]
    pub fn from_provider(directory: Arc<RoleDirectory>, provider: &dyn IdentityProvider) -> Self {
        Self::spawn(directory, provider.subscribe())
    }

    #[must_use]
    pub fn handle(&self) -> RoleHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn state(&self) -> ResolverState {
        self.handle.state()
    }

    #[must_use]
    pub fn view(&self) -> RoleView {
        self.handle.view()
    }

    #[must_use]
    pub fn refresh(&self) -> bool {
        self.handle.refresh()
    }
}

impl Drop for RoleTracker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn follow(
    directory: Arc<RoleDirectory>,
    mut identity: watch::Receiver<SessionIdentity>,
    tx: watch::Sender<ResolverState>,
    cancel: CancellationToken,
) {
    let mut current: Option<RoleSubscription> = None;
    let mut update: Option<ResolverState> = None;

    loop {
        let session = identity.borrow_and_update().clone();
        let mut switched = false;
        match session.resolvable_id() {
            Some(id) if current.as_ref().is_none_or(|s| s.external_user_id() != id) => {
                debug!(external_user_id = id, "identity changed, resolving role");
                current = Some(directory.subscribe(id));
                switched = true;
            }
            Some(_) => {}
            None => {
                if current.take().is_some() {
                    debug!("identity cleared");
                }
            }
        }

        // Entry updates are forwarded even when they repeat the shown state:
        // a retry can fold `NotFound -> Loading -> NotFound` into one wake-up
        // and the guard waiting on it must still hear back.
        match update.take().filter(|_| !switched && current.is_some()) {
            Some(state) => {
                tx.send_replace(state);
            }
            None => {
                let state = current
                    .as_ref()
                    .map_or(ResolverState::Loading, RoleSubscription::state);
                tx.send_if_modified(|shown| {
                    if *shown == state {
                        false
                    } else {
                        *shown = state;
                        true
                    }
                });
            }
        }

        update = tokio::select! {
            () = cancel.cancelled() => break,
            changed = identity.changed() => {
                if changed.is_err() {
                    debug!("identity provider closed");
                    break;
                }
                None
            }
            Some(state) = next_change(current.as_mut()) => Some(state),
        };
    }
}

async fn next_change(subscription: Option<&mut RoleSubscription>) -> Option<ResolverState> {
    match subscription {
        Some(sub) => sub.changed().await,
        None => std::future::pending().await,
    }
}
