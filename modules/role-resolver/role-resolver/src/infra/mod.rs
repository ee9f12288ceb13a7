//! Infrastructure adapters for the role resolver.

pub mod http_source;

pub use http_source::HttpRoleSource;
