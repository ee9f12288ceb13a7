//! Collection store: `{ data, loading, error }` plus derived stats.
//!
//! Listing requests (`fetch`, `search`) go through a [`Dispatcher`], so the
//! configured [`ResponseOrdering`] decides which of several overlapping
//! results lands. Mutations (`create`, `delete`) touch local data only once
//! the backend has confirmed them. Stats are recomputed from whatever the
//! collection holds after every change.

use std::future::Future;
use std::sync::Arc;

use backoffice_sdk::{
    BackofficeError, CollectionApi, RecordId, Resource, SearchFilters, Validate, normalize_filters,
};
use estate_kit::{Dispatcher, Notification, Notifier, ResponseOrdering};
use parking_lot::{RwLock, RwLockWriteGuard};
use tracing::{debug, instrument, warn};

/// Point-in-time copy of a store.
#[derive(Debug, Clone)]
pub struct CollectionSnapshot<T: Resource> {
    pub data: Vec<T>,
    pub stats: T::Stats,
    pub loading: bool,
    pub error: Option<String>,
}

struct State<T: Resource> {
    data: Vec<T>,
    stats: T::Stats,
    pending: usize,
    error: Option<String>,
}

impl<T: Resource> Default for State<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            stats: T::Stats::default(),
            pending: 0,
            error: None,
        }
    }
}

/// One unit of `pending`, given back when finished or dropped mid-request.
struct InFlight<'a, T: Resource> {
    state: &'a RwLock<State<T>>,
    finished: bool,
}

impl<'a, T: Resource> InFlight<'a, T> {
    fn start(state: &'a RwLock<State<T>>) -> Self {
        state.write().pending += 1;
        Self {
            state,
            finished: false,
        }
    }

    /// Release the unit and keep the write lock for applying the outcome.
    fn finish(mut self) -> RwLockWriteGuard<'a, State<T>> {
        self.finished = true;
        let lock = self.state;
        let mut state = lock.write();
        state.pending = state.pending.saturating_sub(1);
        state
    }
}

impl<T: Resource> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if !self.finished {
            let mut state = self.state.write();
            state.pending = state.pending.saturating_sub(1);
        }
    }
}

pub struct CollectionStore<T: Resource> {
    api: Arc<dyn CollectionApi<T>>,
    notifier: Arc<dyn Notifier>,
    dispatcher: Dispatcher,
    state: RwLock<State<T>>,
}

impl<T: Resource> std::fmt::Debug for CollectionStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("CollectionStore")
            .field("collection", &T::COLLECTION)
            .field("items", &state.data.len())
            .field("pending", &state.pending)
            .finish_non_exhaustive()
    }
}

impl<T: Resource> CollectionStore<T> {
    #[must_use]
    pub fn new(
        api: Arc<dyn CollectionApi<T>>,
        notifier: Arc<dyn Notifier>,
        ordering: ResponseOrdering,
    ) -> Self {
        Self {
            api,
            notifier,
            dispatcher: Dispatcher::new(ordering),
            state: RwLock::new(State::default()),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> CollectionSnapshot<T> {
        let state = self.state.read();
        CollectionSnapshot {
            data: state.data.clone(),
            stats: state.stats.clone(),
            loading: state.pending > 0,
            error: state.error.clone(),
        }
    }

    #[must_use]
    pub fn data(&self) -> Vec<T> {
        self.state.read().data.clone()
    }

    #[must_use]
    pub fn stats(&self) -> T::Stats {
        self.state.read().stats.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.read().pending > 0
    }

    /// Load the whole collection.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; previous data is kept and an error
    /// notification is emitted.
    #[instrument(skip(self), fields(collection = T::COLLECTION))]
    pub async fn fetch(&self) -> Result<(), BackofficeError> {
        self.load("fetch", self.api.list()).await
    }

    /// Search with raw form filters.
    ///
    /// Filters are normalized first; when nothing is left this is exactly
    /// [`fetch`](Self::fetch).
    ///
    /// # Errors
    ///
    /// Same as [`fetch`](Self::fetch).
    #[instrument(skip(self, filters), fields(collection = T::COLLECTION))]
    pub async fn search(&self, filters: &SearchFilters) -> Result<(), BackofficeError> {
        let cleaned = normalize_filters(filters, T::NUMERIC_FILTERS);
        if cleaned.is_empty() {
            debug!("no usable filters, listing everything");
            return self.fetch().await;
        }
        self.load("search", self.api.search(&cleaned)).await
    }

    /// Delete one item. Local data changes only after the backend confirms.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; the item stays and an error notification
    /// is emitted.
    #[instrument(skip(self, id), fields(collection = T::COLLECTION, id = %id))]
    pub async fn delete(&self, id: &RecordId) -> Result<(), BackofficeError> {
        if let Err(e) = self.api.delete(id).await {
            return Err(self.report("delete", e));
        }

        {
            let mut state = self.state.write();
            state.data.retain(|item| item.id() != id);
            let stats = T::stats(&state.data);
            state.stats = stats;
        }
        self.notifier
            .notify(Notification::success(format!("Deleted {id} from {}", T::COLLECTION)));
        Ok(())
    }

    /// Validate and create one item, appending the backend's record.
    ///
    /// # Errors
    ///
    /// [`BackofficeError::Validation`] without any request when a required
    /// field is missing; otherwise the backend failure, reported through the
    /// notifier.
    #[instrument(skip(self, new), fields(collection = T::COLLECTION))]
    pub async fn create(&self, new: &T::New) -> Result<T, BackofficeError> {
        new.validate()?;

        let item = match self.api.create(new).await {
            Ok(item) => item,
            Err(e) => return Err(self.report("create", e)),
        };

        {
            let mut state = self.state.write();
            state.data.push(item.clone());
            let stats = T::stats(&state.data);
            state.stats = stats;
        }
        self.notifier.notify(Notification::success(format!(
            "Created {} in {}",
            item.id(),
            T::COLLECTION
        )));
        Ok(item)
    }

    async fn load<F>(&self, op: &'static str, request: F) -> Result<(), BackofficeError>
    where
        F: Future<Output = Result<Vec<T>, BackofficeError>>,
    {
        let dispatch = self.dispatcher.begin();
        let in_flight = InFlight::start(&self.state);

        let outcome = tokio::select! {
            () = dispatch.cancel.cancelled() => None,
            res = request => Some(res),
        };

        let mut state = in_flight.finish();

        let Some(result) = outcome else {
            debug!(op, "request superseded before completion");
            return Ok(());
        };
        if !self.dispatcher.accepts(dispatch.ticket) {
            debug!(op, generation = dispatch.ticket.generation(), "discarding superseded response");
            return Ok(());
        }

        match result {
            Ok(items) => {
                state.stats = T::stats(&items);
                state.data = items;
                state.error = None;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.to_string());
                drop(state);
                Err(self.report(op, e))
            }
        }
    }

    fn report(&self, op: &str, e: BackofficeError) -> BackofficeError {
        warn!(collection = T::COLLECTION, operation = op, error = %e, "store operation failed");
        self.notifier.notify(Notification::error(format!(
            "Could not {op} {}: {e}",
            T::COLLECTION
        )));
        e
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use backoffice_sdk::{NewProperty, Property, PropertyStatus};
    use estate_kit::RecordingNotifier;
    use parking_lot::Mutex;
    use serde_json::json;
    use tokio::sync::oneshot;

    use super::*;

    type Listing = Result<Vec<Property>, BackofficeError>;

    #[derive(Default)]
    struct FakeApi {
        listings: Mutex<VecDeque<oneshot::Receiver<Listing>>>,
        list_calls: AtomicUsize,
        searches: Mutex<Vec<SearchFilters>>,
        search_result: Mutex<Vec<Property>>,
        delete_result: Mutex<Option<BackofficeError>>,
        create_calls: AtomicUsize,
    }

    impl FakeApi {
        fn queue_listing(&self) -> oneshot::Sender<Listing> {
            let (tx, rx) = oneshot::channel();
            self.listings.lock().push_back(rx);
            tx
        }
    }

    #[async_trait]
    impl CollectionApi<Property> for FakeApi {
        async fn list(&self) -> Listing {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let next = self.listings.lock().pop_front();
            match next {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(BackofficeError::Network("dropped".to_owned()))),
                None => Ok(Vec::new()),
            }
        }

        async fn search(&self, filters: &SearchFilters) -> Listing {
            self.searches.lock().push(filters.clone());
            Ok(self.search_result.lock().clone())
        }

        async fn create(&self, new: &NewProperty) -> Result<Property, BackofficeError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            Ok(property("new", new.price.unwrap_or_default(), new.status))
        }

        async fn delete(&self, _id: &RecordId) -> Result<(), BackofficeError> {
            match self.delete_result.lock().clone() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }
    }

    fn property(id: &str, price: f64, status: PropertyStatus) -> Property {
        serde_json::from_value(json!({ "id": id, "title": id, "price": price }))
            .map(|mut p: Property| {
                p.status = status;
                p
            })
            .unwrap()
    }

    fn store(
        api: &Arc<FakeApi>,
        ordering: ResponseOrdering,
    ) -> (CollectionStore<Property>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let store = CollectionStore::new(api.clone(), notifier.clone(), ordering);
        (store, notifier)
    }

    fn filters(value: serde_json::Value) -> SearchFilters {
        value.as_object().cloned().unwrap()
    }

    async fn loaded(api: &Arc<FakeApi>, items: Vec<Property>) -> (CollectionStore<Property>, Arc<RecordingNotifier>) {
        let (store, notifier) = store(api, ResponseOrdering::LatestDispatch);
        let tx = api.queue_listing();
        tx.send(Ok(items)).unwrap();
        store.fetch().await.unwrap();
        (store, notifier)
    }

    #[tokio::test]
    async fn fetch_replaces_data_and_failure_keeps_it() {
        let api = Arc::new(FakeApi::default());
        let (store, notifier) = loaded(
            &api,
            vec![
                property("a", 100.0, PropertyStatus::Available),
                property("b", 300.0, PropertyStatus::Sold),
            ],
        )
        .await;
        let snap = store.snapshot();
        assert_eq!(snap.data.len(), 2);
        assert_eq!(snap.stats.sold, 1);
        assert!(!snap.loading);
        assert!(snap.error.is_none());

        let tx = api.queue_listing();
        tx.send(Err(BackofficeError::Network("connection refused".to_owned())))
            .unwrap();
        assert!(store.fetch().await.is_err());

        let snap = store.snapshot();
        assert_eq!(snap.data.len(), 2);
        assert_eq!(snap.error.as_deref(), Some("network failure: connection refused"));
        assert_eq!(notifier.errors().len(), 1);
    }

    #[tokio::test]
    async fn empty_search_is_a_plain_fetch() {
        let api = Arc::new(FakeApi::default());
        let (store, _) = store(&api, ResponseOrdering::LatestDispatch);
        let all = vec![property("a", 1.0, PropertyStatus::Available)];

        api.queue_listing().send(Ok(all.clone())).unwrap();
        store.fetch().await.unwrap();
        let fetched = store.data();

        api.queue_listing().send(Ok(all)).unwrap();
        store
            .search(&filters(json!({ "city": "", "bedrooms": null, "types": [] })))
            .await
            .unwrap();

        assert_eq!(store.data(), fetched);
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 2);
        assert!(api.searches.lock().is_empty());
    }

    #[tokio::test]
    async fn search_sends_cleaned_filters() {
        let api = Arc::new(FakeApi::default());
        *api.search_result.lock() = vec![property("c", 5.0, PropertyStatus::Available)];
        let (store, _) = store(&api, ResponseOrdering::LatestDispatch);

        store
            .search(&filters(json!({ "bedrooms": "3", "city": "" })))
            .await
            .unwrap();

        let sent = api.searches.lock().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(serde_json::Value::Object(sent[0].clone()), json!({ "bedrooms": 3 }));
        assert_eq!(store.data().len(), 1);
    }

    #[tokio::test]
    async fn failed_delete_changes_nothing() {
        let api = Arc::new(FakeApi::default());
        let (store, notifier) = loaded(
            &api,
            vec![
                property("a", 100.0, PropertyStatus::Available),
                property("b", 300.0, PropertyStatus::Sold),
            ],
        )
        .await;
        let before = store.snapshot();
        *api.delete_result.lock() = Some(BackofficeError::Backend {
            status: 500,
            message: "db locked".to_owned(),
        });

        assert!(store.delete(&RecordId::from("a")).await.is_err());
        let after = store.snapshot();
        assert_eq!(after.data, before.data);
        assert_eq!(after.stats, before.stats);
        assert_eq!(notifier.errors().len(), 1);
    }

    #[tokio::test]
    async fn confirmed_delete_removes_and_recomputes() {
        let api = Arc::new(FakeApi::default());
        let (store, notifier) = loaded(
            &api,
            vec![
                property("a", 100.0, PropertyStatus::Available),
                property("b", 300.0, PropertyStatus::Sold),
            ],
        )
        .await;

        store.delete(&RecordId::from("b")).await.unwrap();
        let snap = store.snapshot();
        assert_eq!(snap.data.len(), 1);
        assert_eq!(snap.stats.sold, 0);
        assert!((snap.stats.average_price - 100.0).abs() < f64::EPSILON);
        assert!(notifier.errors().is_empty());
        assert_eq!(notifier.entries().len(), 1);
    }

    #[tokio::test]
    async fn invalid_create_sends_nothing() {
        let api = Arc::new(FakeApi::default());
        let (store, notifier) = store(&api, ResponseOrdering::LatestDispatch);

        let err = store.create(&NewProperty::default()).await.unwrap_err();
        assert_eq!(err, BackofficeError::validation("title", "is required"));
        assert_eq!(api.create_calls.load(Ordering::SeqCst), 0);
        assert!(notifier.entries().is_empty());
    }

    #[tokio::test]
    async fn valid_create_appends() {
        let api = Arc::new(FakeApi::default());
        let (store, _) = store(&api, ResponseOrdering::LatestDispatch);
        let form = NewProperty {
            title: "Loft".to_owned(),
            property_type: "apartment".to_owned(),
            city: "Lyon".to_owned(),
            address: "1 rue Neuve".to_owned(),
            price: Some(200.0),
            status: PropertyStatus::Available,
            ..NewProperty::default()
        };

        let created = store.create(&form).await.unwrap();
        assert_eq!(created.id.as_str(), "new");
        assert_eq!(store.stats().available, 1);
    }

    #[tokio::test]
    async fn latest_completion_keeps_the_last_arrival() {
        let api = Arc::new(FakeApi::default());
        let (store, _) = store(&api, ResponseOrdering::LatestCompletion);
        let store = Arc::new(store);
        let first = api.queue_listing();
        let second = api.queue_listing();

        let s1 = Arc::clone(&store);
        let h1 = tokio::spawn(async move { s1.fetch().await });
        wait_calls(&api, 1).await;
        let s2 = Arc::clone(&store);
        let h2 = tokio::spawn(async move { s2.fetch().await });
        wait_calls(&api, 2).await;
        assert!(store.is_loading());

        second
            .send(Ok(vec![property("new", 1.0, PropertyStatus::Available)]))
            .unwrap();
        h2.await.unwrap().unwrap();
        first
            .send(Ok(vec![property("old", 1.0, PropertyStatus::Available)]))
            .unwrap();
        h1.await.unwrap().unwrap();

        assert_eq!(store.data()[0].id.as_str(), "old");
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn latest_dispatch_keeps_the_newest_request() {
        let api = Arc::new(FakeApi::default());
        let (store, _) = store(&api, ResponseOrdering::LatestDispatch);
        let store = Arc::new(store);
        let mut first = api.queue_listing();
        let second = api.queue_listing();

        let s1 = Arc::clone(&store);
        let h1 = tokio::spawn(async move { s1.fetch().await });
        wait_calls(&api, 1).await;
        let s2 = Arc::clone(&store);
        let h2 = tokio::spawn(async move { s2.fetch().await });
        wait_calls(&api, 2).await;

        // the superseded request is cancelled
        tokio::time::timeout(Duration::from_secs(2), first.closed())
            .await
            .unwrap();
        h1.await.unwrap().unwrap();

        second
            .send(Ok(vec![property("new", 1.0, PropertyStatus::Available)]))
            .unwrap();
        h2.await.unwrap().unwrap();
        assert_eq!(store.data()[0].id.as_str(), "new");
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn abandoned_fetch_does_not_stay_loading() {
        let api = Arc::new(FakeApi::default());
        let (store, _) = store(&api, ResponseOrdering::LatestDispatch);
        let _unanswered = api.queue_listing();

        let abandoned = tokio::time::timeout(Duration::from_millis(20), store.fetch()).await;
        assert!(abandoned.is_err());
        assert!(!store.is_loading());

        api.queue_listing()
            .send(Ok(vec![property("a", 1.0, PropertyStatus::Available)]))
            .unwrap();
        store.fetch().await.unwrap();
        assert_eq!(store.data().len(), 1);
        assert!(!store.is_loading());
    }

    async fn wait_calls(api: &FakeApi, expected: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while api.list_calls.load(Ordering::SeqCst) < expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }
}
