//! Route guard state machine.
//!
//! ```text
//! Loading ──resolver error──▶ ErrorState ──retry──▶ Loading
//!    │
//!    ├──ready + deny──▶ Denied   (terminal for this navigation)
//!    └──ready + allow─▶ Allowed
//! ```
//!
//! The guard keeps the last resolver state it saw, so [`RouteGuard::navigate`]
//! re-runs the policy for a new path without another role lookup.

use std::sync::Arc;

use crate::models::{ResolverState, Role};
use crate::policy::{AccessOutcome, AccessPolicy, DenyTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Loading,
    ErrorState { message: String },
    Denied { target: DenyTarget },
    Allowed,
}

/// What the protected boundary should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardView {
    /// Loading affordance; no redirect yet.
    Loading,
    /// Error affordance with a retry action.
    Error { message: String },
    /// Navigate away.
    Redirect { to: String, target: DenyTarget },
    /// Render the protected content.
    Render,
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    policy: Arc<AccessPolicy>,
    path: String,
    allowed_roles: Vec<Role>,
    state: GuardState,
    last_resolver: ResolverState,
}

impl RouteGuard {
    /// Guard for `path`; an empty `allowed_roles` means no allow-list.
    #[must_use]
    pub fn new(policy: Arc<AccessPolicy>, path: impl Into<String>, allowed_roles: Vec<Role>) -> Self {
        Self {
            policy,
            path: path.into(),
            allowed_roles,
            state: GuardState::Loading,
            last_resolver: ResolverState::Loading,
        }
    }

    #[must_use]
    pub fn state(&self) -> &GuardState {
        &self.state
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Feed a resolver update.
    ///
    /// `Denied` ignores updates until the next navigation and `ErrorState`
    /// waits for an explicit [`retry`](Self::retry).
    pub fn on_resolver(&mut self, resolver: &ResolverState) -> &GuardState {
        self.last_resolver = resolver.clone();
        match self.state {
            GuardState::Loading | GuardState::Allowed => self.reevaluate(),
            GuardState::ErrorState { .. } | GuardState::Denied { .. } => {}
        }
        &self.state
    }

    /// Leave `ErrorState` for `Loading`.
    ///
    /// Returns `true` when the caller must re-issue the role lookup.
    pub fn retry(&mut self) -> bool {
        if matches!(self.state, GuardState::ErrorState { .. }) {
            self.state = GuardState::Loading;
            self.last_resolver = ResolverState::Loading;
            true
        } else {
            false
        }
    }

    /// Move to another path (and boundary allow-list). The policy is
    /// re-evaluated against the last known resolver state.
    pub fn navigate(&mut self, path: impl Into<String>, allowed_roles: Vec<Role>) -> &GuardState {
        self.path = path.into();
        self.allowed_roles = allowed_roles;
        match self.state {
            GuardState::Loading | GuardState::Allowed | GuardState::Denied { .. } => {
                self.reevaluate();
            }
            GuardState::ErrorState { .. } => {}
        }
        &self.state
    }

    #[must_use]
    pub fn view(&self) -> GuardView {
        match &self.state {
            GuardState::Loading => GuardView::Loading,
            GuardState::ErrorState { message } => GuardView::Error {
                message: message.clone(),
            },
            GuardState::Denied { target } => GuardView::Redirect {
                to: self.policy.redirect_for(*target).to_owned(),
                target: *target,
            },
            GuardState::Allowed => GuardView::Render,
        }
    }

    fn reevaluate(&mut self) {
        let decision = self
            .policy
            .evaluate(&self.last_resolver, &self.path, &self.allowed_roles);
        self.state = match decision.outcome {
            AccessOutcome::Allow => GuardState::Allowed,
            AccessOutcome::Deny(target) => GuardState::Denied { target },
            AccessOutcome::Pending => GuardState::Loading,
            AccessOutcome::Error => GuardState::ErrorState {
                message: decision
                    .reason
                    .unwrap_or_else(|| "role could not be resolved".to_owned()),
            },
        };
    }
}
