//! Domain models for the role resolver.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse permission tag attached to an identity by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
    /// Any role string the backend returns that this client does not know.
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Map a backend role string. Matching ignores case and surrounding
    /// whitespace; anything unrecognised is [`Role::Unknown`].
    #[must_use]
    pub fn from_backend(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("admin") {
            Self::Admin
        } else if raw.eq_ignore_ascii_case("employee") {
            Self::Employee
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Employee => "employee",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    #[must_use]
    pub fn is_employee(self) -> bool {
        matches!(self, Self::Employee)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity reported by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    /// Provider-assigned user id; `None` when signed out.
    pub external_user_id: Option<String>,
    /// Whether the provider finished loading its session.
    pub is_loaded: bool,
}

impl SessionIdentity {
    /// Provider still initialising.
    #[must_use]
    pub fn pending() -> Self {
        Self::default()
    }

    /// Provider loaded, nobody signed in.
    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            external_user_id: None,
            is_loaded: true,
        }
    }

    /// Provider loaded with a signed-in user.
    #[must_use]
    pub fn signed_in(external_user_id: impl Into<String>) -> Self {
        Self {
            external_user_id: Some(external_user_id.into()),
            is_loaded: true,
        }
    }

    /// The id a role lookup may be issued for: only once loaded and only
    /// for a non-empty id.
    #[must_use]
    pub fn resolvable_id(&self) -> Option<&str> {
        if !self.is_loaded {
            return None;
        }
        self.external_user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Role record persisted by the backend for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub external_user_id: String,
    pub role: Role,
}

/// Resolution state of a role record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResolverState {
    /// Lookup in flight, or identity not loaded yet.
    #[default]
    Loading,
    /// Backend returned a role.
    Ready(Role),
    /// Backend has no profile for this identity (HTTP 404).
    NotFound,
    /// Network failure or unexpected status.
    Failed(String),
}

impl ResolverState {
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Ready(role) => Some(*role),
            Self::Loading | Self::NotFound | Self::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Human-readable error for `NotFound`/`Failed`, `None` otherwise.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::NotFound => Some("no user profile found for this account".to_owned()),
            Self::Failed(msg) => Some(msg.clone()),
            Self::Loading | Self::Ready(_) => None,
        }
    }
}

/// Flattened view of a [`ResolverState`] for consumers that want flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleView {
    pub role: Option<Role>,
    pub is_admin: bool,
    pub is_employee: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl From<&ResolverState> for RoleView {
    fn from(state: &ResolverState) -> Self {
        let role = state.role();
        Self {
            role,
            is_admin: role.is_some_and(Role::is_admin),
            is_employee: role.is_some_and(Role::is_employee),
            loading: state.is_loading(),
            error: state.error_message(),
        }
    }
}
