//! Scripted role source for domain tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use role_resolver_sdk::{ResolverState, Role, RoleLookupError, RoleRecord, RoleSource};
use tokio::sync::{oneshot, watch};

pub(crate) type Reply = oneshot::Sender<Result<Role, RoleLookupError>>;

/// Each call to `fetch_role` takes the next pending reply and waits for the
/// test to answer it.
pub(crate) struct ScriptedSource {
    calls: AtomicUsize,
    pending: Mutex<VecDeque<oneshot::Receiver<Result<Role, RoleLookupError>>>>,
}

impl ScriptedSource {
    pub(crate) fn new(replies: usize) -> (Arc<Self>, VecDeque<Reply>) {
        let mut senders = VecDeque::with_capacity(replies);
        let mut receivers = VecDeque::with_capacity(replies);
        for _ in 0..replies {
            let (tx, rx) = oneshot::channel();
            senders.push_back(tx);
            receivers.push_back(rx);
        }
        let source = Arc::new(Self {
            calls: AtomicUsize::new(0),
            pending: Mutex::new(receivers),
        });
        (source, senders)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) async fn wait_calls(&self, expected: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.calls() < expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("role source was not called in time");
    }
}

#[async_trait]
impl RoleSource for ScriptedSource {
    async fn fetch_role(&self, external_user_id: &str) -> Result<RoleRecord, RoleLookupError> {
        let reply = self.pending.lock().pop_front();
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(reply) = reply else {
            return Err(RoleLookupError::Network("no scripted reply left".to_owned()));
        };
        let role = reply.await.map_err(|_| RoleLookupError::Cancelled)??;
        Ok(RoleRecord {
            external_user_id: external_user_id.to_owned(),
            role,
        })
    }
}

/// Wait until `rx` shows a state matching `pred`.
pub(crate) async fn wait_for_state(
    rx: &mut watch::Receiver<ResolverState>,
    pred: impl FnMut(&ResolverState) -> bool,
) -> ResolverState {
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(pred))
        .await
        .expect("state did not settle in time")
        .expect("state channel closed")
        .clone()
}
