//! Domain models for the back-office module.
//!
//! Field names follow the backend's camelCase JSON. Optional fields default
//! when absent so partially filled records still decode.

pub mod client;
pub mod dashboard;
pub mod messaging;
pub mod property;
pub mod sale;

pub use client::{Client, ClientStats, NewClient};
pub use dashboard::{DashboardStats, Diagnostics, MonthlyCount, PropertyTypeCount};
pub use messaging::{CallReceipt, CallRequest, MessageChannel, MessageReceipt, OutgoingMessage};
pub use property::{NewProperty, Property, PropertyStats, PropertyStatus};
pub use sale::{Document, NewSale, Payment, Sale, SaleDetails, SaleStats, SaleStatus};
