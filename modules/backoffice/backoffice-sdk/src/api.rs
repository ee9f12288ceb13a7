//! Backend seams of the back-office module.
//!
//! The REST implementation lives in the `backoffice` crate; tests plug in
//! their own.

use async_trait::async_trait;

use crate::error::BackofficeError;
use crate::filters::SearchFilters;
use crate::models::{
    CallReceipt, CallRequest, DashboardStats, Diagnostics, Document, MessageReceipt, MonthlyCount,
    OutgoingMessage, Payment, PropertyTypeCount,
};
use crate::resource::{RecordId, Resource};

/// CRUD over one collection.
///
/// ```ignore
/// let api: Arc<dyn CollectionApi<Property>> = Arc::new(rest);
/// let flats = api.search(&filters).await?;
/// ```
#[async_trait]
pub trait CollectionApi<T: Resource>: Send + Sync {
    /// `GET /{collection}`.
    async fn list(&self) -> Result<Vec<T>, BackofficeError>;

    /// `POST /{collection}/search` with already-normalized filters.
    async fn search(&self, filters: &SearchFilters) -> Result<Vec<T>, BackofficeError>;

    /// `POST /{collection}`.
    async fn create(&self, new: &T::New) -> Result<T, BackofficeError>;

    /// `DELETE /{collection}/{id}`.
    async fn delete(&self, id: &RecordId) -> Result<(), BackofficeError>;
}

#[async_trait]
pub trait SalesDetailApi: Send + Sync {
    /// `GET /sales/{id}/payments`.
    async fn payments(&self, sale_id: &RecordId) -> Result<Vec<Payment>, BackofficeError>;

    /// `GET /sales/{id}/documents`.
    async fn documents(&self, sale_id: &RecordId) -> Result<Vec<Document>, BackofficeError>;
}

/// `GET /dashboard/*` aggregates.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn stats(&self) -> Result<DashboardStats, BackofficeError>;

    async fn sales_per_month(&self) -> Result<Vec<MonthlyCount>, BackofficeError>;

    async fn property_types(&self) -> Result<Vec<PropertyTypeCount>, BackofficeError>;

    async fn new_clients(&self) -> Result<Vec<MonthlyCount>, BackofficeError>;

    async fn diagnostics(&self) -> Result<Diagnostics, BackofficeError>;
}

#[async_trait]
pub trait MessagingApi: Send + Sync {
    /// `POST /messages/send`.
    async fn send_message(&self, message: &OutgoingMessage)
    -> Result<MessageReceipt, BackofficeError>;

    /// `POST /calls/initiate`.
    async fn initiate_call(&self, call: &CallRequest) -> Result<CallReceipt, BackofficeError>;
}
