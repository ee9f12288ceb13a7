//! Back-office Module
//!
//! Data-fetch stores over the back-office REST API:
//!
//! - [`CollectionStore`](domain::CollectionStore) for properties, clients
//!   and sales (`fetch`, `search`, `create`, `delete`, derived stats)
//! - [`SaleDetailsService`](domain::SaleDetailsService) for payments and
//!   documents of a sale
//! - [`DashboardPoller`](domain::DashboardPoller) refreshing aggregates on an
//!   interval
//! - [`MessagingService`](domain::MessagingService) for messages and calls
//!
//! Failures are reported through the injected [`estate_kit::Notifier`] and
//! never discard the last good data.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod infra;
pub mod module;

pub use config::BackofficeConfig;
pub use domain::{
    CollectionSnapshot, CollectionStore, DashboardPoller, DashboardSnapshot, MessagingService,
    SaleDetailsService,
};
pub use infra::RestBackoffice;
pub use module::{BackofficeBackend, BackofficeModule};
