pub mod client;
pub mod identity;
pub mod service;

pub use identity::StaticIdentityProvider;
pub use service::Service;
