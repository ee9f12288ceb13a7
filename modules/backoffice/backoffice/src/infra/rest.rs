//! REST implementation of the back-office API traits.

use async_trait::async_trait;
use backoffice_sdk::{
    BackofficeError, CallReceipt, CallRequest, Collection, CollectionApi, DashboardApi,
    DashboardStats, Diagnostics, Document, MessageReceipt, MessagingApi, MonthlyCount,
    OutgoingMessage, Payment, PropertyTypeCount, RecordId, Resource, SalesDetailApi,
    SearchFilters, Single,
};
use estate_kit::HttpClient;
use tracing::instrument;

/// Client for every back-office endpoint.
#[derive(Debug, Clone)]
pub struct RestBackoffice {
    http: HttpClient,
}

impl RestBackoffice {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    async fn get_collection<T>(&self, path: &str) -> Result<Vec<T>, BackofficeError>
    where
        T: serde::de::DeserializeOwned,
    {
        let payload: Collection<T> = self.http.get_json(path).await?;
        Ok(payload.into_vec())
    }
}

fn item_path(collection: &str, id: &RecordId) -> String {
    format!("{collection}/{}", urlencoding::encode(id.as_str()))
}

#[async_trait]
impl<T: Resource> CollectionApi<T> for RestBackoffice {
    #[instrument(skip(self), fields(collection = T::COLLECTION))]
    async fn list(&self) -> Result<Vec<T>, BackofficeError> {
        self.get_collection(T::COLLECTION).await
    }

    #[instrument(skip(self, filters), fields(collection = T::COLLECTION, filters = filters.len()))]
    async fn search(&self, filters: &SearchFilters) -> Result<Vec<T>, BackofficeError> {
        let path = format!("{}/search", T::COLLECTION);
        let payload: Collection<T> = self.http.post_json(&path, filters).await?;
        Ok(payload.into_vec())
    }

    #[instrument(skip(self, new), fields(collection = T::COLLECTION))]
    async fn create(&self, new: &T::New) -> Result<T, BackofficeError> {
        let payload: Single<T> = self.http.post_json(T::COLLECTION, new).await?;
        Ok(payload.into_inner())
    }

    #[instrument(skip(self, id), fields(collection = T::COLLECTION, id = %id))]
    async fn delete(&self, id: &RecordId) -> Result<(), BackofficeError> {
        self.http.delete(&item_path(T::COLLECTION, id)).await?;
        Ok(())
    }
}

#[async_trait]
impl SalesDetailApi for RestBackoffice {
    async fn payments(&self, sale_id: &RecordId) -> Result<Vec<Payment>, BackofficeError> {
        let path = format!("{}/payments", item_path("sales", sale_id));
        self.get_collection(&path).await
    }

    async fn documents(&self, sale_id: &RecordId) -> Result<Vec<Document>, BackofficeError> {
        let path = format!("{}/documents", item_path("sales", sale_id));
        self.get_collection(&path).await
    }
}

#[async_trait]
impl DashboardApi for RestBackoffice {
    async fn stats(&self) -> Result<DashboardStats, BackofficeError> {
        let payload: Single<DashboardStats> = self.http.get_json("dashboard/stats").await?;
        Ok(payload.into_inner())
    }

    async fn sales_per_month(&self) -> Result<Vec<MonthlyCount>, BackofficeError> {
        self.get_collection("dashboard/sales-per-month").await
    }

    async fn property_types(&self) -> Result<Vec<PropertyTypeCount>, BackofficeError> {
        self.get_collection("dashboard/property-types").await
    }

    async fn new_clients(&self) -> Result<Vec<MonthlyCount>, BackofficeError> {
        self.get_collection("dashboard/new-clients").await
    }

    async fn diagnostics(&self) -> Result<Diagnostics, BackofficeError> {
        Ok(self.http.get_json("dashboard/diagnostics").await?)
    }
}

#[async_trait]
impl MessagingApi for RestBackoffice {
    #[instrument(skip_all, fields(channel = ?message.channel))]
    async fn send_message(
        &self,
        message: &OutgoingMessage,
    ) -> Result<MessageReceipt, BackofficeError> {
        let receipt: Option<Single<MessageReceipt>> =
            self.http.post_json("messages/send", message).await?;
        Ok(receipt.map(Single::into_inner).unwrap_or_default())
    }

    #[instrument(skip_all)]
    async fn initiate_call(&self, call: &CallRequest) -> Result<CallReceipt, BackofficeError> {
        let receipt: Option<Single<CallReceipt>> =
            self.http.post_json("calls/initiate", call).await?;
        Ok(receipt.map(Single::into_inner).unwrap_or_default())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn item_paths_are_encoded() {
        assert_eq!(item_path("sales", &RecordId::from("a b/1")), "sales/a%20b%2F1");
        assert_eq!(item_path("properties", &RecordId::from("42")), "properties/42");
    }
}
