//! Role Resolver SDK
//!
//! This crate provides the public API of the role resolver:
//!
//! - [`RoleSource`] - lookup of a persisted role record by external user id
//! - [`IdentityProvider`] - adapter over the identity provider session
//! - [`Role`], [`SessionIdentity`], [`ResolverState`], [`RoleView`] - models
//! - [`RoleLookupError`] - lookup failures
//! - [`policy`] - the pure access policy and the route table
//! - [`guard`] - the route guard state machine
//! - [`menu`] - the role-filtered navigation menu
//!
//! ## Usage
//!
//! ```ignore
//! use role_resolver_sdk::{policy::AccessPolicy, guard::RouteGuard, ResolverState, Role};
//!
//! let policy = Arc::new(AccessPolicy::default());
//! let mut guard = RouteGuard::new(policy, "/settings", Vec::new());
//!
//! guard.on_resolver(&ResolverState::Ready(Role::Employee));
//! assert!(matches!(guard.view(), GuardView::Redirect { .. }));
//! ```

pub mod api;
pub mod error;
pub mod guard;
pub mod menu;
pub mod models;
pub mod policy;

// Re-export main types at crate root
pub use api::{IdentityProvider, RoleSource};
pub use error::RoleLookupError;
pub use guard::{GuardState, GuardView, RouteGuard};
pub use menu::{MenuBuilder, MenuItem, MinimumRole};
pub use models::{ResolverState, Role, RoleRecord, RoleView, SessionIdentity};
pub use policy::{
    AccessDecision, AccessOutcome, AccessPolicy, AccessPolicyConfig, DenyTarget, RouteTable,
    RouteTableError,
};
