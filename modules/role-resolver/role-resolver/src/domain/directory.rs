//! Shared role directory.
//!
//! One entry per external user id. An entry owns the resolver state as a
//! `watch` channel, the dispatcher ordering its lookups and a subscriber
//! count. The first subscriber triggers the lookup, later subscribers join
//! it, and the last one to leave evicts the entry.
//!
//! Under [`ResponseOrdering::LatestDispatch`] eviction cancels whatever is
//! still in flight. Under [`ResponseOrdering::LatestCompletion`] nothing is
//! cancelled: an entry without subscribers lingers until its last lookup
//! lands, so an identity that comes back in the meantime sees every response
//! in arrival order.

use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use estate_kit::{Dispatcher, ResponseOrdering, Ticket};
use role_resolver_sdk::{ResolverState, RoleLookupError, RoleRecord, RoleSource};
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info_span, instrument, warn};

struct Entry {
    external_user_id: String,
    state: watch::Sender<ResolverState>,
    dispatcher: Dispatcher,
    subscribers: AtomicUsize,
    in_flight: AtomicUsize,
}

impl Entry {
    fn new(external_user_id: &str, ordering: ResponseOrdering) -> Self {
        let (state, _) = watch::channel(ResolverState::Loading);
        Self {
            external_user_id: external_user_id.to_owned(),
            state,
            dispatcher: Dispatcher::new(ordering),
            subscribers: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    fn apply(&self, ticket: Ticket, outcome: Result<RoleRecord, RoleLookupError>) {
        let next = match outcome {
            Ok(record) => ResolverState::Ready(record.role),
            Err(RoleLookupError::Cancelled) => {
                debug!(generation = ticket.generation(), "role lookup cancelled");
                return;
            }
            Err(e) => log_and_convert(&self.external_user_id, e),
        };

        let applied = self.state.send_if_modified(|state| {
            if !self.dispatcher.accepts(ticket) {
                return false;
            }
            *state = next;
            true
        });
        if !applied {
            debug!(
                generation = ticket.generation(),
                latest = self.dispatcher.latest(),
                "discarding superseded role lookup"
            );
        }
    }
}

fn log_and_convert(external_user_id: &str, e: RoleLookupError) -> ResolverState {
    match &e {
        RoleLookupError::NotFound(_) => {
            warn!(external_user_id, "no user profile for identity");
        }
        _ => error!(external_user_id, error = %e, "role lookup failed"),
    }
    e.into_state()
}

/// Shared, reference-counted role cache.
pub struct RoleDirectory {
    source: Arc<dyn RoleSource>,
    ordering: ResponseOrdering,
    entries: DashMap<String, Arc<Entry>>,
}

impl std::fmt::Debug for RoleDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleDirectory")
            .field("ordering", &self.ordering)
            .field("tracked", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl RoleDirectory {
    #[must_use]
    pub fn new(source: Arc<dyn RoleSource>, ordering: ResponseOrdering) -> Arc<Self> {
        Arc::new(Self {
            source,
            ordering,
            entries: DashMap::new(),
        })
    }

    #[must_use]
    pub fn ordering(&self) -> ResponseOrdering {
        self.ordering
    }

    /// Number of tracked identities, including ones left without subscribers
    /// that still wait for a lookup under `LatestCompletion`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current state for a tracked identity.
    #[must_use]
    pub fn cached(&self, external_user_id: &str) -> Option<ResolverState> {
        self.entries
            .get(external_user_id)
            .map(|entry| entry.state.borrow().clone())
    }

    /// Subscribe to the role of `external_user_id`.
    ///
    /// The first subscriber for an identity dispatches the lookup; later
    /// ones share it. A subscriber arriving at a lingering entry dispatches a
    /// fresh lookup alongside the ones still in flight. Must be called from
    /// within a tokio runtime.
    #[instrument(skip(self))]
    #[must_use]
    pub fn subscribe(self: &Arc<Self>, external_user_id: &str) -> RoleSubscription {
        let (entry, previous) = {
            let slot = self
                .entries
                .entry(external_user_id.to_owned())
                .or_insert_with(|| Arc::new(Entry::new(external_user_id, self.ordering)));
            let previous = slot.subscribers.fetch_add(1, Ordering::SeqCst);
            (Arc::clone(slot.value()), previous)
        };

        if previous == 0 {
            debug!("first subscriber, dispatching role lookup");
            self.dispatch(&entry);
        }

        let rx = entry.state.subscribe();
        RoleSubscription {
            directory: Arc::clone(self),
            entry,
            rx,
        }
    }

    /// Re-issue the lookup for an identity that has subscribers.
    ///
    /// Returns `false` when nobody is subscribed to `external_user_id`.
    #[instrument(skip(self))]
    #[must_use]
    pub fn refresh(self: &Arc<Self>, external_user_id: &str) -> bool {
        let Some(entry) = self
            .entries
            .get(external_user_id)
            .map(|slot| Arc::clone(slot.value()))
        else {
            return false;
        };
        self.dispatch(&entry);
        true
    }

    fn dispatch(self: &Arc<Self>, entry: &Arc<Entry>) {
        let dispatch = entry.dispatcher.begin();
        entry.in_flight.fetch_add(1, Ordering::SeqCst);
        entry.state.send_if_modified(|state| {
            if state.is_loading() {
                false
            } else {
                *state = ResolverState::Loading;
                true
            }
        });

        let source = Arc::clone(&self.source);
        let directory = Arc::downgrade(self);
        let entry = Arc::clone(entry);
        let span = info_span!(
            "role_lookup",
            external_user_id = %entry.external_user_id,
            generation = dispatch.ticket.generation()
        );
        tokio::spawn(
            async move {
                let outcome = tokio::select! {
                    () = dispatch.cancel.cancelled() => Err(RoleLookupError::Cancelled),
                    res = source.fetch_role(&entry.external_user_id) => res,
                };
                entry.apply(dispatch.ticket, outcome);
                settle_lookup(&directory, &entry);
            }
            .instrument(span),
        );
    }

    fn release(&self, entry: &Arc<Entry>) {
        let lingers = self.ordering == ResponseOrdering::LatestCompletion;
        let removed = self.entries.remove_if(&entry.external_user_id, |_, current| {
            Arc::ptr_eq(current, entry)
                && current.subscribers.load(Ordering::SeqCst) == 0
                && !(lingers && current.in_flight.load(Ordering::SeqCst) > 0)
        });
        if removed.is_some() {
            entry.dispatcher.shutdown();
            debug!(external_user_id = %entry.external_user_id, "evicted role entry");
        }
    }
}

fn settle_lookup(directory: &Weak<RoleDirectory>, entry: &Arc<Entry>) {
    let last = entry.in_flight.fetch_sub(1, Ordering::SeqCst) == 1;
    if !last || entry.subscribers.load(Ordering::SeqCst) > 0 {
        return;
    }
    if let Some(directory) = directory.upgrade() {
        directory.release(entry);
    }
}

/// A live interest in one identity's role.
///
/// Dropping the last subscription for an identity evicts it from the
/// directory and cancels any lookup still in flight.
pub struct RoleSubscription {
    directory: Arc<RoleDirectory>,
    entry: Arc<Entry>,
    rx: watch::Receiver<ResolverState>,
}

impl std::fmt::Debug for RoleSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleSubscription")
            .field("external_user_id", &self.entry.external_user_id)
            .field("state", &*self.rx.borrow())
            .finish_non_exhaustive()
    }
}

impl RoleSubscription {
    #[must_use]
    pub fn external_user_id(&self) -> &str {
        &self.entry.external_user_id
    }

    #[must_use]
    pub fn state(&self) -> ResolverState {
        self.rx.borrow().clone()
    }

    #[must_use]
    pub fn receiver(&self) -> watch::Receiver<ResolverState> {
        self.rx.clone()
    }

    /// Wait for the next state change.
    pub async fn changed(&mut self) -> Option<ResolverState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn refresh(&self) {
        self.directory.dispatch(&self.entry);
    }
}

impl Drop for RoleSubscription {
    fn drop(&mut self) {
        if self.entry.subscribers.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.directory.release(&self.entry);
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::Duration;

    use role_resolver_sdk::Role;

    use super::*;
    use crate::domain::test_support::{ScriptedSource, wait_for_state};

    #[tokio::test]
    async fn subscribers_share_one_lookup() {
        let (source, mut replies) = ScriptedSource::new(2);
        let dir = RoleDirectory::new(source.clone(), ResponseOrdering::LatestDispatch);

        let a = dir.subscribe("user_1");
        let b = dir.subscribe("user_1");
        source.wait_calls(1).await;

        replies.pop_front().unwrap().send(Ok(Role::Admin)).unwrap();
        let mut rx_a = a.receiver();
        let mut rx_b = b.receiver();
        assert_eq!(
            wait_for_state(&mut rx_a, |s| !s.is_loading()).await,
            ResolverState::Ready(Role::Admin)
        );
        assert_eq!(
            wait_for_state(&mut rx_b, |s| !s.is_loading()).await,
            ResolverState::Ready(Role::Admin)
        );
        assert_eq!(source.calls(), 1);
        assert_eq!(dir.len(), 1);
    }

    #[tokio::test]
    async fn cached_record_is_reused_by_late_subscribers() {
        let (source, mut replies) = ScriptedSource::new(1);
        let dir = RoleDirectory::new(source.clone(), ResponseOrdering::LatestDispatch);

        let first = dir.subscribe("user_1");
        source.wait_calls(1).await;
        replies.pop_front().unwrap().send(Ok(Role::Employee)).unwrap();
        let mut rx = first.receiver();
        wait_for_state(&mut rx, |s| !s.is_loading()).await;

        let late = dir.subscribe("user_1");
        assert_eq!(late.state(), ResolverState::Ready(Role::Employee));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn latest_completion_lets_the_last_arrival_win() {
        let (source, mut replies) = ScriptedSource::new(2);
        let dir = RoleDirectory::new(source.clone(), ResponseOrdering::LatestCompletion);
        let sub = dir.subscribe("user_1");
        source.wait_calls(1).await;
        assert!(dir.refresh("user_1"));
        source.wait_calls(2).await;

        let slow = replies.pop_front().unwrap();
        let fast = replies.pop_front().unwrap();
        let mut rx = sub.receiver();

        fast.send(Ok(Role::Employee)).unwrap();
        wait_for_state(&mut rx, |s| *s == ResolverState::Ready(Role::Employee)).await;

        slow.send(Ok(Role::Admin)).unwrap();
        let last = wait_for_state(&mut rx, |s| *s == ResolverState::Ready(Role::Admin)).await;
        assert_eq!(last, ResolverState::Ready(Role::Admin));
    }

    #[tokio::test]
    async fn latest_dispatch_discards_the_superseded_lookup() {
        let (source, mut replies) = ScriptedSource::new(2);
        let dir = RoleDirectory::new(source.clone(), ResponseOrdering::LatestDispatch);
        let sub = dir.subscribe("user_1");
        source.wait_calls(1).await;
        assert!(dir.refresh("user_1"));
        source.wait_calls(2).await;

        let mut slow = replies.pop_front().unwrap();
        let fast = replies.pop_front().unwrap();
        let mut rx = sub.receiver();

        fast.send(Ok(Role::Employee)).unwrap();
        wait_for_state(&mut rx, |s| *s == ResolverState::Ready(Role::Employee)).await;

        // the first lookup was cancelled when the second one was dispatched
        tokio::time::timeout(Duration::from_secs(2), slow.closed())
            .await
            .unwrap();
        assert!(slow.send(Ok(Role::Admin)).is_err());
        assert_eq!(sub.state(), ResolverState::Ready(Role::Employee));
    }

    #[tokio::test]
    async fn dropping_the_last_subscriber_evicts_and_cancels() {
        let (source, mut replies) = ScriptedSource::new(1);
        let dir = RoleDirectory::new(source.clone(), ResponseOrdering::LatestDispatch);

        let a = dir.subscribe("user_1");
        let b = dir.subscribe("user_1");
        source.wait_calls(1).await;

        drop(a);
        assert_eq!(dir.len(), 1);
        drop(b);
        assert!(dir.is_empty());
        assert!(dir.cached("user_1").is_none());

        let mut pending = replies.pop_front().unwrap();
        tokio::time::timeout(Duration::from_secs(2), pending.closed())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn latest_completion_keeps_a_released_identity_until_its_lookup_lands() {
        let (source, mut replies) = ScriptedSource::new(3);
        let dir = RoleDirectory::new(source.clone(), ResponseOrdering::LatestCompletion);

        drop(dir.subscribe("user_1"));
        source.wait_calls(1).await;
        assert_eq!(dir.len(), 1);

        // coming back re-issues the lookup; both responses apply in arrival order
        let back = dir.subscribe("user_1");
        source.wait_calls(2).await;
        let first = replies.pop_front().unwrap();
        let second = replies.pop_front().unwrap();
        let mut rx = back.receiver();

        second.send(Ok(Role::Employee)).unwrap();
        wait_for_state(&mut rx, |s| *s == ResolverState::Ready(Role::Employee)).await;
        first.send(Ok(Role::Admin)).unwrap();
        wait_for_state(&mut rx, |s| *s == ResolverState::Ready(Role::Admin)).await;

        drop(back);
        assert!(dir.is_empty());
    }

    #[tokio::test]
    async fn lingering_identity_is_evicted_once_idle() {
        let (source, mut replies) = ScriptedSource::new(1);
        let dir = RoleDirectory::new(source.clone(), ResponseOrdering::LatestCompletion);

        drop(dir.subscribe("user_1"));
        source.wait_calls(1).await;
        replies.pop_front().unwrap().send(Ok(Role::Admin)).unwrap();

        tokio::time::timeout(Duration::from_secs(2), async {
            while !dir.is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn identities_resolve_independently() {
        let (source, mut replies) = ScriptedSource::new(2);
        let dir = RoleDirectory::new(source.clone(), ResponseOrdering::LatestDispatch);

        let missing = dir.subscribe("ghost");
        let second = dir.subscribe("user_2");
        source.wait_calls(2).await;

        // replies are handed out in call order, which is not fixed here
        for reply in replies.drain(..) {
            reply
                .send(Err(RoleLookupError::NotFound("ghost".to_owned())))
                .unwrap();
        }
        let mut rx = missing.receiver();
        assert_eq!(
            wait_for_state(&mut rx, |s| !s.is_loading()).await,
            ResolverState::NotFound
        );
        let mut rx = second.receiver();
        assert_eq!(
            wait_for_state(&mut rx, |s| !s.is_loading()).await,
            ResolverState::NotFound
        );
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn missing_profile_is_logged_as_warning() {
        let (source, mut replies) = ScriptedSource::new(1);
        let dir = RoleDirectory::new(source.clone(), ResponseOrdering::LatestDispatch);
        let sub = dir.subscribe("ghost");
        source.wait_calls(1).await;
        replies
            .pop_front()
            .unwrap()
            .send(Err(RoleLookupError::NotFound("ghost".to_owned())))
            .unwrap();

        let mut rx = sub.receiver();
        wait_for_state(&mut rx, |s| !s.is_loading()).await;
        assert!(logs_contain("no user profile for identity"));
    }

    #[tokio::test]
    async fn refresh_of_untracked_identity_is_refused() {
        let (source, _replies) = ScriptedSource::new(0);
        let dir = RoleDirectory::new(source.clone(), ResponseOrdering::LatestDispatch);
        assert!(!dir.refresh("nobody"));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn refresh_goes_back_to_loading_then_resolves() {
        let (source, mut replies) = ScriptedSource::new(2);
        let dir = RoleDirectory::new(source.clone(), ResponseOrdering::LatestDispatch);
        let sub = dir.subscribe("user_1");
        source.wait_calls(1).await;
        replies
            .pop_front()
            .unwrap()
            .send(Err(RoleLookupError::Network("timed out".to_owned())))
            .unwrap();
        let mut rx = sub.receiver();
        assert!(matches!(
            wait_for_state(&mut rx, |s| !s.is_loading()).await,
            ResolverState::Failed(_)
        ));

        sub.refresh();
        assert!(sub.state().is_loading());
        source.wait_calls(2).await;
        replies.pop_front().unwrap().send(Ok(Role::Admin)).unwrap();
        assert_eq!(
            wait_for_state(&mut rx, |s| !s.is_loading()).await,
            ResolverState::Ready(Role::Admin)
        );
    }
}
