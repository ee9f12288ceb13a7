//! Static role plugin.
//!
//! Serves role records from configuration instead of the backend and
//! provides a settable identity session. Used by the CLI in offline mode
//! and by tests.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod module;

pub use config::{StaticRolePluginConfig, UserRoleConfig};
pub use domain::{Service, StaticIdentityProvider};
pub use module::StaticRolePlugin;
