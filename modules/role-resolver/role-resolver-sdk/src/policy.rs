//! Access policy.
//!
//! [`AccessPolicy::evaluate`] is a pure function of the resolver state, the
//! requested path and the allow-list of the boundary being entered:
//!
//! 1. resolver `Loading` -> `Pending`
//! 2. resolver `NotFound`/`Failed` -> `Error`
//! 3. admin-only path and the role is not admin -> `Deny(AccessDenied)`
//! 4. non-empty allow-list without the role -> `Deny(Home)`
//! 5. otherwise -> `Allow`
//!
//! The two deny targets are different on purpose: admin-only violations show
//! a dedicated denial screen, allow-list violations silently go home.

use serde::Deserialize;

use crate::models::{ResolverState, Role};

/// Where a denied navigation is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyTarget {
    /// The dedicated "access denied" screen.
    AccessDenied,
    /// The neutral default location.
    Home,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    Allow,
    Deny(DenyTarget),
    Pending,
    Error,
}

/// Result of one policy evaluation. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    pub outcome: AccessOutcome,
    pub reason: Option<String>,
}

impl AccessDecision {
    fn allow() -> Self {
        Self {
            outcome: AccessOutcome::Allow,
            reason: None,
        }
    }

    fn pending() -> Self {
        Self {
            outcome: AccessOutcome::Pending,
            reason: None,
        }
    }

    fn error(reason: String) -> Self {
        Self {
            outcome: AccessOutcome::Error,
            reason: Some(reason),
        }
    }

    fn deny(target: DenyTarget, reason: String) -> Self {
        Self {
            outcome: AccessOutcome::Deny(target),
            reason: Some(reason),
        }
    }

    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.outcome == AccessOutcome::Allow
    }
}

/// Policy configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessPolicyConfig {
    /// Paths starting with any of these prefixes require the admin role.
    pub admin_prefixes: Vec<String>,
    /// Redirect target for allow-list violations.
    pub home_path: String,
    /// Location of the access-denied screen.
    pub denied_path: String,
}

impl Default for AccessPolicyConfig {
    fn default() -> Self {
        Self {
            admin_prefixes: vec![
                "/expenses".to_owned(),
                "/employees".to_owned(),
                "/settings".to_owned(),
            ],
            home_path: "/".to_owned(),
            denied_path: "/access-denied".to_owned(),
        }
    }
}

/// The access policy. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    admin_prefixes: Vec<String>,
    home_path: String,
    denied_path: String,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(AccessPolicyConfig::default())
    }
}

impl AccessPolicy {
    #[must_use]
    pub fn new(cfg: AccessPolicyConfig) -> Self {
        Self {
            admin_prefixes: cfg.admin_prefixes,
            home_path: cfg.home_path,
            denied_path: cfg.denied_path,
        }
    }

    /// Whether `path` starts with any admin-only prefix.
    #[must_use]
    pub fn requires_admin(&self, path: &str) -> bool {
        self.admin_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Location a denial redirects to.
    #[must_use]
    pub fn redirect_for(&self, target: DenyTarget) -> &str {
        match target {
            DenyTarget::AccessDenied => &self.denied_path,
            DenyTarget::Home => &self.home_path,
        }
    }

    /// Decide access to `path` for the given resolver state.
    ///
    /// An empty `allowed_roles` means the boundary has no allow-list.
    #[must_use]
    pub fn evaluate(
        &self,
        state: &ResolverState,
        path: &str,
        allowed_roles: &[Role],
    ) -> AccessDecision {
        let role = match state {
            ResolverState::Loading => return AccessDecision::pending(),
            ResolverState::NotFound => {
                return AccessDecision::error("no user profile found for this account".to_owned());
            }
            ResolverState::Failed(msg) => return AccessDecision::error(msg.clone()),
            ResolverState::Ready(role) => *role,
        };

        if self.requires_admin(path) && !role.is_admin() {
            return AccessDecision::deny(
                DenyTarget::AccessDenied,
                format!("'{path}' requires the admin role, current role is '{role}'"),
            );
        }

        if !allowed_roles.is_empty() && !allowed_roles.contains(&role) {
            return AccessDecision::deny(
                DenyTarget::Home,
                format!("role '{role}' is not allowed on '{path}'"),
            );
        }

        AccessDecision::allow()
    }
}

/// Error while registering a route pattern.
#[derive(Debug, thiserror::Error)]
#[error("failed to insert route pattern '{pattern}': {source}")]
pub struct RouteTableError {
    pattern: String,
    #[source]
    source: matchit::InsertError,
}

/// Allow-lists per route pattern.
///
/// Patterns accept both `/sales/:id` and `/sales/{id}` parameter syntax.
#[derive(Clone)]
pub struct RouteTable {
    matcher: matchit::Router<Vec<Role>>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            matcher: matchit::Router::new(),
        }
    }

    /// Register the allow-list of a route boundary.
    ///
    /// # Errors
    ///
    /// Returns [`RouteTableError`] if the pattern conflicts with an existing one
    /// or is malformed.
    pub fn insert(&mut self, pattern: &str, allowed_roles: Vec<Role>) -> Result<(), RouteTableError> {
        let converted = convert_colon_params(pattern);
        self.matcher
            .insert(converted, allowed_roles)
            .map_err(|source| RouteTableError {
                pattern: pattern.to_owned(),
                source,
            })
    }

    /// Allow-list of the boundary matching `path`; empty when none matches.
    #[must_use]
    pub fn allowed_roles(&self, path: &str) -> &[Role] {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        match self.matcher.at(path) {
            Ok(matched) => matched.value,
            Err(_) => &[],
        }
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable").finish_non_exhaustive()
    }
}

/// Convert `:param` segments to matchit's `{param}` syntax.
fn convert_colon_params(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == ':' {
            result.push('{');
            while matches!(chars.peek(), Some(c) if c.is_alphanumeric() || *c == '_') {
                if let Some(c) = chars.next() {
                    result.push(c);
                }
            }
            result.push('}');
        } else {
            result.push(ch);
        }
    }

    result
}
