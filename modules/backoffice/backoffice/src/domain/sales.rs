//! Sale details: payments and documents of one sale, requested together.
//! A failure of either request fails the whole load and is reported once.

use std::sync::Arc;

use backoffice_sdk::{BackofficeError, RecordId, SaleDetails, SalesDetailApi};
use estate_kit::{Notification, Notifier};
use tracing::{instrument, warn};

/// Loads the payments and documents of one sale.
#[derive(Clone)]
pub struct SaleDetailsService {
    api: Arc<dyn SalesDetailApi>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for SaleDetailsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaleDetailsService").finish_non_exhaustive()
    }
}

impl SaleDetailsService {
    #[must_use]
    pub fn new(api: Arc<dyn SalesDetailApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    /// Both lists are requested concurrently; either failing fails the call.
    ///
    /// # Errors
    ///
    /// Returns the first backend failure after notifying it.
    #[instrument(skip(self, sale_id), fields(sale_id = %sale_id))]
    pub async fn details(&self, sale_id: &RecordId) -> Result<SaleDetails, BackofficeError> {
        let fetched = tokio::try_join!(self.api.payments(sale_id), self.api.documents(sale_id));
        match fetched {
            Ok((payments, documents)) => Ok(SaleDetails {
                payments,
                documents,
            }),
            Err(e) => {
                warn!(error = %e, "sale details unavailable");
                self.notifier.notify(Notification::error(format!(
                    "Could not load details of sale {sale_id}: {e}"
                )));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use async_trait::async_trait;
    use backoffice_sdk::{Document, Payment};
    use estate_kit::RecordingNotifier;

    use super::*;

    struct FakeApi {
        documents_fail: bool,
    }

    #[async_trait]
    impl SalesDetailApi for FakeApi {
        async fn payments(&self, _sale_id: &RecordId) -> Result<Vec<Payment>, BackofficeError> {
            Ok(serde_json::from_str(r#"[{"id":"pay1","amount":1200}]"#).unwrap())
        }

        async fn documents(&self, _sale_id: &RecordId) -> Result<Vec<Document>, BackofficeError> {
            if self.documents_fail {
                Err(BackofficeError::NotFound("sales/s1/documents".to_owned()))
            } else {
                Ok(serde_json::from_str(r#"[{"id":"d1","name":"deed.pdf","type":"deed"}]"#).unwrap())
            }
        }
    }

    #[tokio::test]
    async fn combines_payments_and_documents() {
        let notifier = Arc::new(RecordingNotifier::new());
        let service = SaleDetailsService::new(
            Arc::new(FakeApi {
                documents_fail: false,
            }),
            notifier.clone(),
        );

        let details = service.details(&RecordId::from("s1")).await.unwrap();
        assert_eq!(details.payments.len(), 1);
        assert_eq!(details.documents[0].kind.as_deref(), Some("deed"));
        assert!(notifier.entries().is_empty());
    }

    #[tokio::test]
    async fn failure_is_notified() {
        let notifier = Arc::new(RecordingNotifier::new());
        let service = SaleDetailsService::new(
            Arc::new(FakeApi {
                documents_fail: true,
            }),
            notifier.clone(),
        );

        let err = service.details(&RecordId::from("s1")).await.unwrap_err();
        assert!(matches!(err, BackofficeError::NotFound(_)));
        assert_eq!(notifier.errors().len(), 1);
    }
}
