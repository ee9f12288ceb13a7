//! Domain layer for the back-office module.

pub mod dashboard;
pub mod messaging;
pub mod sales;
pub mod store;

pub use dashboard::{DashboardPoller, DashboardSnapshot};
pub use messaging::MessagingService;
pub use sales::SaleDetailsService;
pub use store::{CollectionSnapshot, CollectionStore};
