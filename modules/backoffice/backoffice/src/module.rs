//! Back-office module wiring.

use std::sync::Arc;

use anyhow::Context;
use backoffice_sdk::{Client, DashboardApi, MessagingApi, Property, Sale, SalesDetailApi};
use estate_kit::{BackendConfig, HttpClient, Notifier};
use tracing::info;

use crate::config::BackofficeConfig;
use crate::domain::{CollectionStore, DashboardPoller, MessagingService, SaleDetailsService};
use crate::infra::RestBackoffice;

/// Back-office module: one store per collection plus the sale details,
/// dashboard and messaging services, all sharing one REST client and one
/// notifier.
pub struct BackofficeModule {
    cfg: BackofficeConfig,
    notifier: Arc<dyn Notifier>,
    dashboard: Arc<dyn DashboardApi>,
    pub properties: CollectionStore<Property>,
    pub clients: CollectionStore<Client>,
    pub sales: CollectionStore<Sale>,
    pub sale_details: SaleDetailsService,
    pub messaging: MessagingService,
}

impl std::fmt::Debug for BackofficeModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackofficeModule")
            .field("cfg", &self.cfg)
            .field("properties", &self.properties)
            .field("clients", &self.clients)
            .field("sales", &self.sales)
            .finish_non_exhaustive()
    }
}

impl BackofficeModule {
    /// # Errors
    ///
    /// Fails if the backend base URL is invalid or the HTTP client cannot
    /// be built.
    #[tracing::instrument(skip_all, fields(base_url = %backend.base_url))]
    pub fn init(
        cfg: BackofficeConfig,
        backend: &BackendConfig,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let http = HttpClient::new(backend).context("failed to build back-office client")?;
        info!(
            ordering = ?cfg.ordering,
            poll_interval = ?cfg.dashboard_poll_interval,
            "Initializing back-office module"
        );
        Ok(Self::with_backend(cfg, Arc::new(RestBackoffice::new(http)), notifier))
    }

    /// Build the module over the REST client or any object implementing
    /// every back-office API.
    #[must_use]
    pub fn with_backend<B>(
        cfg: BackofficeConfig,
        backend: Arc<B>,
        notifier: Arc<dyn Notifier>,
    ) -> Self
    where
        B: BackofficeBackend + 'static,
    {
        let ordering = cfg.ordering;
        Self {
            properties: CollectionStore::<Property>::new(backend.clone(), notifier.clone(), ordering),
            clients: CollectionStore::<Client>::new(backend.clone(), notifier.clone(), ordering),
            sales: CollectionStore::<Sale>::new(backend.clone(), notifier.clone(), ordering),
            sale_details: SaleDetailsService::new(backend.clone(), notifier.clone()),
            messaging: MessagingService::new(backend.clone(), notifier.clone()),
            dashboard: backend,
            notifier,
            cfg,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BackofficeConfig {
        &self.cfg
    }

    /// Start polling the dashboard. Must be called inside a Tokio runtime.
    #[must_use]
    pub fn start_dashboard(&self) -> DashboardPoller {
        DashboardPoller::start(
            Arc::clone(&self.dashboard),
            Arc::clone(&self.notifier),
            &self.cfg,
        )
    }
}

/// Every API the module needs, in one bound.
pub trait BackofficeBackend:
    backoffice_sdk::CollectionApi<Property>
    + backoffice_sdk::CollectionApi<Client>
    + backoffice_sdk::CollectionApi<Sale>
    + SalesDetailApi
    + DashboardApi
    + MessagingApi
{
}

impl<B> BackofficeBackend for B where
    B: backoffice_sdk::CollectionApi<Property>
        + backoffice_sdk::CollectionApi<Client>
        + backoffice_sdk::CollectionApi<Sale>
        + SalesDetailApi
        + DashboardApi
        + MessagingApi
{
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use estate_kit::RecordingNotifier;

    use super::*;

    #[test]
    fn init_rejects_invalid_base_url() {
        let backend = BackendConfig::with_base_url("not a url");
        let result = BackofficeModule::init(
            BackofficeConfig::default(),
            &backend,
            Arc::new(RecordingNotifier::new()),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn stores_start_empty() {
        let module = BackofficeModule::init(
            BackofficeConfig::default(),
            &BackendConfig::default(),
            Arc::new(RecordingNotifier::new()),
        )
        .unwrap();
        let snap = module.properties.snapshot();
        assert!(snap.data.is_empty());
        assert!(!snap.loading);
        assert_eq!(module.sales.stats().total, 0);
        assert_eq!(module.clients.stats().total, 0);
    }
}
