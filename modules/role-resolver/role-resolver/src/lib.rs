//! Role Resolver Module
//!
//! Resolves the back-office role of the signed-in identity and keeps it
//! available to every consumer through one shared, reference-counted
//! [`RoleDirectory`](domain::RoleDirectory):
//!
//! - one lookup in flight per identity, shared by all subscribers
//! - overlapping lookups are ordered by [`estate_kit::ResponseOrdering`]
//! - the cached record is dropped when the last subscriber goes away
//!
//! [`RoleTracker`](domain::RoleTracker) follows the identity provider and
//! [`GuardedRoute`](domain::GuardedRoute) drives the route guard from it.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod infra;
pub mod module;

pub use config::RoleResolverConfig;
pub use domain::{GuardedRoute, RoleDirectory, RoleHandle, RoleSubscription, RoleTracker};
pub use infra::HttpRoleSource;
pub use module::RoleResolverModule;
