// ── Cache slot ──
//
// One slot per resource key. Observable state lives in a `watch` channel;
// bookkeeping (sequence numbers, the in-flight fetch, subscriber counts)
// lives behind a mutex. Lock order is always control -> watch.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use futures_util::future::{BoxFuture, Shared};
use serde_json::Value;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{trace, warn};

use super::entry::CacheEntry;
use crate::key::ResourceKey;

/// Result of one fetch, shared between every caller joined to it.
pub type FetchOutcome = Result<Arc<Value>, Arc<medcart_api::Error>>;

pub(crate) type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

pub(crate) struct InFlight {
    pub seq: u64,
    pub future: SharedFetch,
}

#[derive(Default)]
pub(crate) struct SlotControl {
    /// Sequence number of the most recently issued fetch.
    pub issued_seq: u64,
    /// Results with a sequence at or below this are discarded.
    pub committed_seq: u64,
    pub in_flight: Option<InFlight>,
    /// When data was last committed (fetch or direct write).
    pub fresh_at: Option<Instant>,
    /// Set by invalidation of an unobserved slot; forces the next subscribe to fetch.
    pub stale: bool,
    pub subscribers: usize,
    pub focus_subscribers: usize,
    pub idle_since: Option<Instant>,
}

pub(crate) struct Slot {
    pub key: ResourceKey,
    pub state: watch::Sender<CacheEntry>,
    control: Mutex<SlotControl>,
}

impl Slot {
    pub(crate) fn new(key: ResourceKey) -> Self {
        let (state, _) = watch::channel(CacheEntry::empty(key.clone()));
        Self {
            key,
            state,
            control: Mutex::new(SlotControl {
                idle_since: Some(Instant::now()),
                ..SlotControl::default()
            }),
        }
    }

    pub(crate) fn control(&self) -> MutexGuard<'_, SlotControl> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Called when a subscription drops.
    pub(crate) fn release(&self, focus: bool) {
        let mut ctl = self.control();
        ctl.subscribers = ctl.subscribers.saturating_sub(1);
        if focus {
            ctl.focus_subscribers = ctl.focus_subscribers.saturating_sub(1);
        }
        if ctl.subscribers == 0 {
            ctl.idle_since = Some(Instant::now());
        }
    }

    /// Commit a finished fetch, unless a newer fetch or direct write already has.
    pub(crate) fn settle(
        &self,
        seq: u64,
        result: Result<Value, medcart_api::Error>,
    ) -> FetchOutcome {
        let outcome: FetchOutcome = result.map(Arc::new).map_err(Arc::new);

        let mut ctl = self.control();
        if ctl.in_flight.as_ref().is_some_and(|f| f.seq == seq) {
            ctl.in_flight = None;
        }
        let still_running = ctl.in_flight.is_some();

        if seq <= ctl.committed_seq {
            trace!(
                key = %self.key,
                seq,
                committed = ctl.committed_seq,
                "discarding superseded fetch result"
            );
            self.state.send_modify(|entry| {
                entry.is_validating = still_running;
                entry.is_loading = still_running && entry.data.is_none();
            });
            return outcome;
        }

        ctl.committed_seq = seq;
        match &outcome {
            Ok(value) => {
                ctl.fresh_at = Some(Instant::now());
                ctl.stale = false;
                let value = Arc::clone(value);
                self.state.send_modify(|entry| {
                    entry.data = Some(value);
                    entry.error = None;
                    entry.last_fetched_at = Some(Utc::now());
                    entry.is_validating = still_running;
                    entry.is_loading = false;
                });
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "revalidation failed");
                let err = Arc::clone(err);
                self.state.send_modify(|entry| {
                    entry.error = Some(err);
                    entry.is_validating = still_running;
                    entry.is_loading = still_running && entry.data.is_none();
                });
            }
        }
        outcome
    }

    /// Overwrite data locally, superseding every fetch issued so far.
    pub(crate) fn write(&self, value: Option<Arc<Value>>) {
        let mut ctl = self.control();
        self.write_locked(&mut ctl, value);
    }

    /// Derive new data from the current value and commit it as one step.
    ///
    /// Returns the data replaced and the data written. `updater` runs under
    /// the slot lock and must not touch the cache.
    pub(crate) fn update(
        &self,
        updater: impl FnOnce(Option<&Value>) -> Value,
    ) -> (Option<Arc<Value>>, Arc<Value>) {
        let mut ctl = self.control();
        let previous = self.state.borrow().data.clone();
        let next = Arc::new(updater(previous.as_deref()));
        self.write_locked(&mut ctl, Some(Arc::clone(&next)));
        (previous, next)
    }

    /// Put `snapshot` back if the slot still holds `written`.
    ///
    /// The restored data is marked stale. Returns `false` when something
    /// newer has committed since.
    pub(crate) fn roll_back(&self, written: &Arc<Value>, snapshot: Option<Arc<Value>>) -> bool {
        let mut ctl = self.control();
        let current = self.state.borrow().data.clone();
        if !current.is_some_and(|data| Arc::ptr_eq(&data, written)) {
            return false;
        }
        ctl.fresh_at = None;
        ctl.stale = true;
        self.state.send_modify(|entry| {
            if snapshot.is_none() {
                entry.last_fetched_at = None;
            }
            entry.data = snapshot;
        });
        true
    }

    fn write_locked(&self, ctl: &mut SlotControl, value: Option<Arc<Value>>) {
        ctl.committed_seq = ctl.issued_seq;
        ctl.in_flight = None;
        ctl.fresh_at = value.as_ref().map(|_| Instant::now());
        ctl.stale = value.is_none();
        self.state.send_modify(|entry| {
            if value.is_none() {
                entry.last_fetched_at = None;
            }
            entry.data = value;
            entry.error = None;
            entry.is_loading = false;
            entry.is_validating = false;
        });
    }
}
