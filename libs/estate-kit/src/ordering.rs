//! Ordering of overlapping responses for the same resource.
//!
//! A resource (a role record, a collection, the dashboard) may have several
//! requests in flight at once. [`ResponseOrdering`] decides which results are
//! allowed to overwrite state, and [`Dispatcher`] carries the bookkeeping:
//! a monotonic generation counter plus the cancellation token of the request
//! currently in flight.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

/// Which of several overlapping responses wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrdering {
    /// Every response is applied as it arrives; the one that completes last
    /// wins even if it was dispatched first. Nothing is cancelled.
    LatestCompletion,
    /// Only the most recently dispatched request may apply its result.
    /// Dispatching a new request cancels the previous one.
    #[default]
    LatestDispatch,
}

/// Generation number handed out at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    #[must_use]
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// A dispatched request: its generation and the token that aborts it.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub ticket: Ticket,
    pub cancel: CancellationToken,
}

/// Per-resource dispatch bookkeeping.
#[derive(Debug)]
pub struct Dispatcher {
    ordering: ResponseOrdering,
    latest: AtomicU64,
    in_flight: Mutex<Option<CancellationToken>>,
    parent: CancellationToken,
}

impl Dispatcher {
    #[must_use]
    pub fn new(ordering: ResponseOrdering) -> Self {
        Self::with_parent(ordering, CancellationToken::new())
    }

    /// Dispatcher whose request tokens are children of `parent`, so
    /// cancelling the owner cancels everything it dispatched.
    #[must_use]
    pub fn with_parent(ordering: ResponseOrdering, parent: CancellationToken) -> Self {
        Self {
            ordering,
            latest: AtomicU64::new(0),
            in_flight: Mutex::new(None),
            parent,
        }
    }

    #[must_use]
    pub fn ordering(&self) -> ResponseOrdering {
        self.ordering
    }

    /// Register a new request. Under [`ResponseOrdering::LatestDispatch`]
    /// the previously dispatched request is cancelled.
    #[must_use]
    pub fn begin(&self) -> Dispatch {
        let ticket = Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1);
        let cancel = self.parent.child_token();

        if self.ordering == ResponseOrdering::LatestDispatch {
            let previous = self.in_flight.lock().replace(cancel.clone());
            if let Some(previous) = previous {
                previous.cancel();
            }
        }

        Dispatch { ticket, cancel }
    }

    /// Whether a response carrying `ticket` may overwrite state.
    #[must_use]
    pub fn accepts(&self, ticket: Ticket) -> bool {
        match self.ordering {
            ResponseOrdering::LatestCompletion => !self.parent.is_cancelled(),
            ResponseOrdering::LatestDispatch => {
                !self.parent.is_cancelled() && self.latest.load(Ordering::SeqCst) == ticket.0
            }
        }
    }

    /// Generation of the most recent dispatch (0 before the first one).
    #[must_use]
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Cancel everything this dispatcher has issued.
    pub fn shutdown(&self) {
        self.parent.cancel();
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(ResponseOrdering::default())
    }
}
