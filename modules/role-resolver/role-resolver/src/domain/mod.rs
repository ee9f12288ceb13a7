//! Domain layer for the role resolver.

pub mod directory;
pub mod guarded_route;
pub mod tracker;

#[cfg(test)]
pub(crate) mod test_support;

pub use directory::{RoleDirectory, RoleSubscription};
pub use guarded_route::GuardedRoute;
pub use tracker::{RoleHandle, RoleTracker};
