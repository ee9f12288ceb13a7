//! Back-office SDK
//!
//! Public surface of the back-office module:
//!
//! - [`models`] - properties, clients, sales, sale details, dashboard and
//!   messaging payloads
//! - [`Resource`] - what a collection store needs to know about its items
//! - [`filters`] - search filter clean-up before a request is sent
//! - [`Validate`] - required-field checks for create forms and messages
//! - [`CollectionApi`], [`SalesDetailApi`], [`DashboardApi`],
//!   [`MessagingApi`] - backend seams
//! - [`BackofficeError`] - error taxonomy shared by every operation

pub mod api;
pub mod error;
pub mod filters;
pub mod models;
pub mod resource;
pub mod validate;

pub use api::{CollectionApi, DashboardApi, MessagingApi, SalesDetailApi};
pub use error::BackofficeError;
pub use filters::{SearchFilters, filters_from_pairs, normalize_filters};
pub use models::{
    CallReceipt, CallRequest, Client, ClientStats, DashboardStats, Diagnostics, Document,
    MessageChannel, MessageReceipt, MonthlyCount, NewClient, NewProperty, NewSale,
    OutgoingMessage, Payment, Property, PropertyStats, PropertyStatus, PropertyTypeCount, Sale,
    SaleDetails, SaleStats, SaleStatus,
};
pub use resource::{Collection, RecordId, Resource, Single};
pub use validate::Validate;
