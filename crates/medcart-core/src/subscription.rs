// ── Cache subscriptions ──
//
// A `Subscription` is one view's handle on a cache slot. It keeps the slot
// alive (and out of idle eviction) for as long as it exists, and its drop
// stops any interval refresh it started.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;

use crate::cache::{Cache, CacheEntry, FetchOutcome, MutateAction, Revalidation};
use crate::cache::slot::Slot;
use crate::error::CoreError;
use crate::key::ResourceKey;

/// Live view of one resource key.
pub struct Subscription {
    cache: Cache,
    slot: Arc<Slot>,
    receiver: watch::Receiver<CacheEntry>,
    focus: bool,
    cancel: CancellationToken,
}

impl Subscription {
    pub(crate) fn new(
        cache: Cache,
        slot: Arc<Slot>,
        focus: bool,
        cancel: CancellationToken,
    ) -> Self {
        let receiver = slot.state.subscribe();
        Self {
            cache,
            slot,
            receiver,
            focus,
            cancel,
        }
    }

    pub fn key(&self) -> &ResourceKey {
        &self.slot.key
    }

    /// Snapshot of the slot right now.
    pub fn current(&self) -> CacheEntry {
        self.receiver.borrow().clone()
    }

    pub fn data(&self) -> Option<Arc<Value>> {
        self.receiver.borrow().data.clone()
    }

    /// Decode the cached data into `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<Option<T>, CoreError> {
        self.receiver.borrow().data_as()
    }

    pub fn error(&self) -> Option<Arc<medcart_api::Error>> {
        self.receiver.borrow().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.receiver.borrow().is_loading
    }

    pub fn is_validating(&self) -> bool {
        self.receiver.borrow().is_validating
    }

    /// Wait for the next state change and return the new state.
    ///
    /// Returns `None` only if the cache itself has gone away.
    pub async fn changed(&mut self) -> Option<CacheEntry> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Wait until no fetch is running and return that state.
    pub async fn settled(&mut self) -> Option<CacheEntry> {
        self.receiver
            .wait_for(|entry| !entry.is_validating)
            .await
            .ok()
            .map(|entry| entry.clone())
    }

    /// Revalidate now. Joins the running fetch if there is one, otherwise
    /// issues exactly one request regardless of freshness.
    pub async fn refetch(&self) -> FetchOutcome {
        self.cache.start_fetch(&self.slot, false).await
    }

    /// Write to or revalidate this subscription's key.
    pub fn mutate(&self, action: MutateAction) -> Revalidation {
        self.cache.mutate_slot(&self.slot, action)
    }

    /// Turn the subscription into a stream of states, starting with the current one.
    pub fn into_stream(self) -> SubscriptionStream {
        let inner = WatchStream::new(self.receiver.clone());
        SubscriptionStream {
            inner,
            _subscription: self,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.slot.release(self.focus);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.slot.key)
            .field("focus", &self.focus)
            .finish_non_exhaustive()
    }
}

/// Stream of [`CacheEntry`] states for one key.
///
/// Owns its subscription, so the key stays observed until the stream drops.
pub struct SubscriptionStream {
    inner: WatchStream<CacheEntry>,
    _subscription: Subscription,
}

impl Stream for SubscriptionStream {
    type Item = CacheEntry;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}
