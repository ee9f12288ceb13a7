//! Async driver for [`RouteGuard`].

use std::sync::Arc;

use role_resolver_sdk::{AccessPolicy, GuardState, GuardView, Role, RouteGuard};
use tracing::{debug, instrument};

use super::tracker::RoleHandle;

/// A protected boundary fed by the shared resolver state.
#[derive(Debug)]
pub struct GuardedRoute {
    guard: RouteGuard,
    roles: RoleHandle,
}

impl GuardedRoute {
    #[must_use]
    pub fn new(
        roles: RoleHandle,
        policy: Arc<AccessPolicy>,
        path: impl Into<String>,
        allowed_roles: Vec<Role>,
    ) -> Self {
        let mut guard = RouteGuard::new(policy, path, allowed_roles);
        guard.on_resolver(&roles.state());
        Self { guard, roles }
    }

    #[must_use]
    pub fn view(&self) -> GuardView {
        self.guard.view()
    }

    #[must_use]
    pub fn state(&self) -> &GuardState {
        self.guard.state()
    }

    /// Feed resolver updates until the guard leaves `Loading`.
    #[instrument(skip(self), fields(path = %self.guard.path()))]
    pub async fn settle(&mut self) -> GuardView {
        loop {
            let view = self.guard.view();
            if view != GuardView::Loading {
                debug!(?view, "route guard settled");
                return view;
            }
            match self.roles.changed().await {
                Some(state) => {
                    self.guard.on_resolver(&state);
                }
                None => return self.guard.view(),
            }
        }
    }

    /// Retry from the error state, re-issuing the role lookup.
    pub fn retry(&mut self) -> bool {
        if !self.guard.retry() {
            return false;
        }
        if !self.roles.refresh() {
            debug!("retry without a resolvable identity");
        }
        true
    }

    /// Move to another path; no new lookup is issued.
    pub fn navigate(&mut self, path: impl Into<String>, allowed_roles: Vec<Role>) -> GuardView {
        self.guard.navigate(path, allowed_roles);
        self.guard.view()
    }
}
