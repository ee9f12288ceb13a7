//! Dashboard aggregates refreshed on a fixed interval.
//!
//! Every tick spawns one refresh that requests the five aggregates together.
//! A part that fails keeps its last good value; the failures of one refresh
//! are reported as a single notification. Refreshes are not de-duplicated:
//! the configured [`ResponseOrdering`] decides which of several overlapping
//! ones is applied.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use backoffice_sdk::{
    BackofficeError, DashboardApi, DashboardStats, Diagnostics, MonthlyCount, PropertyTypeCount,
};
use estate_kit::{Dispatcher, Notification, Notifier, ResponseOrdering};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::BackofficeConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub stats: Option<DashboardStats>,
    pub sales_per_month: Vec<MonthlyCount>,
    pub property_types: Vec<PropertyTypeCount>,
    pub new_clients: Vec<MonthlyCount>,
    pub diagnostics: Option<Diagnostics>,
    /// Parts that failed during the last applied refresh.
    pub errors: Vec<String>,
    /// Number of refreshes applied so far.
    pub refreshed: u64,
}

struct Shared {
    api: Arc<dyn DashboardApi>,
    notifier: Arc<dyn Notifier>,
    dispatcher: Dispatcher,
    snapshot: ArcSwap<DashboardSnapshot>,
    apply: Mutex<()>,
    updates: watch::Sender<u64>,
}

impl Shared {
    #[instrument(name = "dashboard_refresh", skip(self))]
    async fn refresh(&self) {
        let dispatch = self.dispatcher.begin();
        let api = &self.api;

        let fetched = tokio::select! {
            () = dispatch.cancel.cancelled() => None,
            parts = async {
                tokio::join!(
                    api.stats(),
                    api.sales_per_month(),
                    api.property_types(),
                    api.new_clients(),
                    api.diagnostics(),
                )
            } => Some(parts),
        };
        let Some((stats, sales_per_month, property_types, new_clients, diagnostics)) = fetched
        else {
            debug!("refresh cancelled");
            return;
        };

        let mut errors = Vec::new();
        {
            let _apply = self.apply.lock();
            if !self.dispatcher.accepts(dispatch.ticket) {
                debug!(
                    generation = dispatch.ticket.generation(),
                    "discarding superseded refresh"
                );
                return;
            }

            let mut next = DashboardSnapshot::clone(&self.snapshot.load());
            merge(&mut next.stats, "stats", stats.map(Some), &mut errors);
            merge(&mut next.sales_per_month, "sales per month", sales_per_month, &mut errors);
            merge(&mut next.property_types, "property types", property_types, &mut errors);
            merge(&mut next.new_clients, "new clients", new_clients, &mut errors);
            merge(&mut next.diagnostics, "diagnostics", diagnostics.map(Some), &mut errors);
            next.errors.clone_from(&errors);
            next.refreshed += 1;

            let refreshed = next.refreshed;
            self.snapshot.store(Arc::new(next));
            self.updates.send_replace(refreshed);
        }

        if !errors.is_empty() {
            warn!(failed = ?errors, "dashboard refresh incomplete");
            self.notifier.notify(Notification::error(format!(
                "Dashboard partially unavailable: {}",
                errors.join("; ")
            )));
        }
    }
}

fn merge<T>(
    slot: &mut T,
    part: &str,
    result: Result<T, BackofficeError>,
    errors: &mut Vec<String>,
) {
    match result {
        Ok(value) => *slot = value,
        Err(e) => errors.push(format!("{part}: {e}")),
    }
}

/// Background poller. Stopping or dropping it ends the interval and cancels
/// refreshes still in flight.
pub struct DashboardPoller {
    shared: Arc<Shared>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for DashboardPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardPoller")
            .field("running", &self.is_running())
            .field("refreshed", &self.shared.snapshot.load().refreshed)
            .finish_non_exhaustive()
    }
}

impl DashboardPoller {
    /// Spawn the poller on the current runtime. The first refresh starts
    /// immediately.
    #[must_use]
    pub fn start(
        api: Arc<dyn DashboardApi>,
        notifier: Arc<dyn Notifier>,
        cfg: &BackofficeConfig,
    ) -> Self {
        Self::with_interval(api, notifier, cfg.dashboard_poll_interval, cfg.ordering)
    }

    #[must_use]
    pub fn with_interval(
        api: Arc<dyn DashboardApi>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
        ordering: ResponseOrdering,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (updates, _) = watch::channel(0);
        let shared = Arc::new(Shared {
            api,
            notifier,
            dispatcher: Dispatcher::with_parent(ordering, cancel.clone()),
            snapshot: ArcSwap::from_pointee(DashboardSnapshot::default()),
            apply: Mutex::new(()),
            updates,
        });

        info!(?interval, ?ordering, "dashboard poller started");
        let task = tokio::spawn(poll(Arc::clone(&shared), interval, cancel.clone()));

        Self {
            shared,
            cancel,
            task,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.shared.snapshot.load_full()
    }

    /// Receiver that changes after every applied refresh; the value is
    /// [`DashboardSnapshot::refreshed`].
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.updates.subscribe()
    }

    /// Refresh now, outside the interval.
    pub async fn refresh(&self) {
        self.shared.refresh().await;
    }

    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            info!("dashboard poller stopped");
        }
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.task.is_finished()
    }
}

impl Drop for DashboardPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll(shared: Arc<Shared>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let shared = Arc::clone(&shared);
                tokio::spawn(async move { shared.refresh().await });
            }
        }
    }
    debug!("dashboard poll loop finished");
}
