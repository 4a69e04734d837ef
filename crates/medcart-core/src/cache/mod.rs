// ── Resource cache ──
//
// Keyed stale-while-revalidate cache. Each key owns one slot; every view
// subscribed to the key shares that slot and at most one in-flight fetch.
// Fetch results carry a per-key sequence number and only commit when they
// are newer than whatever the slot already committed.

mod entry;
pub(crate) mod slot;

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::FutureExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use medcart_api::Fetcher;

pub use entry::CacheEntry;
pub use slot::FetchOutcome;

use slot::{InFlight, SharedFetch, Slot, SlotControl};

use crate::key::ResourceKey;
use crate::subscription::Subscription;

// ── Configuration ────────────────────────────────────────────────────

/// Cache-wide tuning.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// A subscribe within this window of the last commit reuses cached data.
    pub dedupe_interval: Duration,
    /// Focus revalidation is skipped for keys committed within this window.
    pub focus_throttle: Duration,
    /// Unobserved slots older than this are removed by [`Cache::evict_idle`].
    pub idle_eviction: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dedupe_interval: Duration::from_secs(2),
            focus_throttle: Duration::from_secs(5),
            idle_eviction: Duration::from_secs(300),
        }
    }
}

/// Per-subscription options.
#[derive(Debug, Clone, Default)]
pub struct SubscribeOptions {
    pub refresh_interval: Option<Duration>,
    pub revalidate_on_focus: bool,
    /// Shown until the first fetch commits; does not count as fresh.
    pub initial_data: Option<Value>,
}

impl SubscribeOptions {
    pub fn refresh_every(mut self, every: Duration) -> Self {
        self.refresh_interval = Some(every);
        self
    }

    pub fn on_focus(mut self) -> Self {
        self.revalidate_on_focus = true;
        self
    }

    pub fn with_initial_data(mut self, data: Value) -> Self {
        self.initial_data = Some(data);
        self
    }
}

// ── Mutations ────────────────────────────────────────────────────────

type Updater = Box<dyn FnOnce(Option<&Value>) -> Value + Send>;

/// A local write against one cache slot.
pub enum MutateAction {
    /// Replace data immediately. No network call.
    Set(Value),
    /// Derive new data from the current value. No network call.
    Update(Updater),
    /// Drop any in-flight fetch and issue exactly one new one.
    Revalidate,
}

impl MutateAction {
    pub fn update(f: impl FnOnce(Option<&Value>) -> Value + Send + 'static) -> Self {
        Self::Update(Box::new(f))
    }
}

impl fmt::Debug for MutateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set(v) => f.debug_tuple("Set").field(v).finish(),
            Self::Update(_) => f.write_str("Update(..)"),
            Self::Revalidate => f.write_str("Revalidate"),
        }
    }
}

/// Handle to a fetch started by a mutation or invalidation.
///
/// The fetch runs whether or not this is awaited.
#[must_use = "await `settled()` to observe the fetch result, or drop to let it run"]
pub struct Revalidation(Option<SharedFetch>);

impl Revalidation {
    pub fn is_pending(&self) -> bool {
        self.0.is_some()
    }

    /// Wait for the fetch. `None` if this mutation did not fetch.
    pub async fn settled(self) -> Option<FetchOutcome> {
        match self.0 {
            Some(fetch) => Some(fetch.await),
            None => None,
        }
    }
}

// ── Cache ────────────────────────────────────────────────────────────

/// Shared resource cache. Cheaply cloneable via `Arc<CacheInner>`.
///
/// Every fetch is spawned onto the ambient tokio runtime, so methods that
/// may fetch must be called from within one.
#[derive(Clone)]
pub struct Cache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    fetcher: Arc<dyn Fetcher>,
    config: CacheConfig,
    slots: DashMap<ResourceKey, Arc<Slot>>,
    cancel: CancellationToken,
}

impl Cache {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                fetcher,
                config,
                slots: DashMap::new(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Number of live slots.
    pub fn len(&self) -> usize {
        self.inner.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.slots.is_empty()
    }

    /// Point-in-time view of a slot, without subscribing or fetching.
    pub fn peek(&self, key: &ResourceKey) -> Option<CacheEntry> {
        self.inner
            .slots
            .get(key)
            .map(|slot| slot.state.borrow().clone())
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Subscribe to `key`, fetching if the slot has nothing fresh.
    pub fn subscribe(&self, key: ResourceKey, options: SubscribeOptions) -> Subscription {
        let slot = {
            let entry = self
                .inner
                .slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Slot::new(key)));
            // Counted under the map guard so eviction cannot race us.
            let slot = Arc::clone(entry.value());
            let mut ctl = slot.control();
            ctl.subscribers += 1;
            ctl.idle_since = None;
            if options.revalidate_on_focus {
                ctl.focus_subscribers += 1;
            }
            drop(ctl);
            slot
        };

        if let Some(initial) = options.initial_data {
            slot.state.send_if_modified(|entry| {
                if entry.data.is_some() {
                    return false;
                }
                entry.data = Some(Arc::new(initial));
                true
            });
        }

        let should_fetch = {
            let ctl = slot.control();
            ctl.in_flight.is_none() && !is_fresh(&ctl, self.inner.config.dedupe_interval)
        };
        if should_fetch {
            drop(self.start_fetch(&slot, false));
        } else {
            trace!(key = %slot.key, "serving cached data without fetch");
        }

        let cancel = self.inner.cancel.child_token();
        if let Some(every) = options.refresh_interval.filter(|d| !d.is_zero()) {
            tokio::spawn(refresh_task(
                self.clone(),
                Arc::clone(&slot),
                every,
                cancel.clone(),
            ));
        }

        Subscription::new(self.clone(), slot, options.revalidate_on_focus, cancel)
    }

    // ── Fetching ─────────────────────────────────────────────────────

    /// Start a fetch for `slot`, or join the one already running.
    ///
    /// With `supersede`, a running fetch is abandoned: its result will be
    /// discarded and a new request is issued.
    pub(crate) fn start_fetch(&self, slot: &Arc<Slot>, supersede: bool) -> SharedFetch {
        let mut ctl = slot.control();
        if let Some(ref flight) = ctl.in_flight {
            if !supersede {
                trace!(key = %slot.key, seq = flight.seq, "joining in-flight fetch");
                return flight.future.clone();
            }
            ctl.committed_seq = ctl.issued_seq;
        }

        ctl.issued_seq += 1;
        let seq = ctl.issued_seq;
        debug!(key = %slot.key, seq, "starting fetch");

        let request = AssertUnwindSafe(self.inner.fetcher.fetch(slot.key.as_str()));
        let owner = Arc::clone(slot);
        let future = async move {
            let result = request.catch_unwind().await.unwrap_or_else(|panic| {
                Err(medcart_api::Error::Aborted(panic_message(panic.as_ref())))
            });
            owner.settle(seq, result)
        }
        .boxed()
        .shared();

        ctl.in_flight = Some(InFlight {
            seq,
            future: future.clone(),
        });
        slot.state.send_modify(|entry| {
            entry.is_validating = true;
            entry.is_loading = entry.data.is_none();
        });
        drop(ctl);

        // Drive the fetch even if every caller drops its handle.
        tokio::spawn(future.clone());
        future
    }

    fn slot(&self, key: &ResourceKey) -> Arc<Slot> {
        let entry = self
            .inner
            .slots
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Slot::new(key.clone())));
        Arc::clone(entry.value())
    }

    // ── Local writes ─────────────────────────────────────────────────

    /// Write to or revalidate one key. Calls apply in call order.
    pub fn mutate(&self, key: &ResourceKey, action: MutateAction) -> Revalidation {
        let slot = self.slot(key);
        self.mutate_slot(&slot, action)
    }

    pub(crate) fn mutate_slot(&self, slot: &Arc<Slot>, action: MutateAction) -> Revalidation {
        match action {
            MutateAction::Set(value) => {
                debug!(key = %slot.key, "mutate: set");
                slot.write(Some(Arc::new(value)));
                Revalidation(None)
            }
            MutateAction::Update(updater) => {
                debug!(key = %slot.key, "mutate: update");
                slot.update(updater);
                Revalidation(None)
            }
            MutateAction::Revalidate => {
                debug!(key = %slot.key, "mutate: revalidate");
                Revalidation(Some(self.start_fetch(slot, true)))
            }
        }
    }

    /// Apply `updater` to `key`, returning the replaced and written data.
    pub(crate) fn apply_update(
        &self,
        key: &ResourceKey,
        updater: impl FnOnce(Option<&Value>) -> Value,
    ) -> (Option<Arc<Value>>, Arc<Value>) {
        debug!(%key, "mutate: update");
        self.slot(key).update(updater)
    }

    /// Undo [`apply_update`](Self::apply_update) unless newer data has committed.
    pub(crate) fn roll_back(
        &self,
        key: &ResourceKey,
        written: &Arc<Value>,
        snapshot: Option<Arc<Value>>,
    ) -> bool {
        self.slot(key).roll_back(written, snapshot)
    }

    /// Invalidate exactly `keys`.
    ///
    /// Observed keys are refetched (superseding any running fetch);
    /// unobserved ones are marked stale so their next subscriber fetches.
    /// Keys with no slot are ignored.
    pub fn invalidate(&self, keys: &[ResourceKey]) -> Vec<Revalidation> {
        let mut pending = Vec::new();
        for key in keys {
            let Some(slot) = self.inner.slots.get(key).map(|s| Arc::clone(s.value())) else {
                continue;
            };
            let observed = {
                let mut ctl = slot.control();
                ctl.stale = true;
                ctl.subscribers > 0
            };
            if observed {
                pending.push(Revalidation(Some(self.start_fetch(&slot, true))));
            }
        }
        debug!(keys = keys.len(), refetching = pending.len(), "invalidated");
        pending
    }

    /// Revalidate every key with a focus-opted subscriber.
    ///
    /// Returns the number of keys revalidated.
    pub fn revalidate_on_focus(&self) -> usize {
        let throttle = self.inner.config.focus_throttle;
        let targets: Vec<Arc<Slot>> = self
            .inner
            .slots
            .iter()
            .filter(|s| {
                let ctl = s.value().control();
                ctl.focus_subscribers > 0 && !is_fresh(&ctl, throttle)
            })
            .map(|s| Arc::clone(s.value()))
            .collect();

        for slot in &targets {
            drop(self.start_fetch(slot, false));
        }
        debug!(count = targets.len(), "focus revalidation");
        targets.len()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Remove slots that have been unobserved for longer than `idle_eviction`.
    pub fn evict_idle(&self) -> usize {
        let idle_for = self.inner.config.idle_eviction;
        let mut evicted = 0usize;
        self.inner.slots.retain(|_, slot| {
            let ctl = slot.control();
            let expired = ctl.subscribers == 0
                && ctl.in_flight.is_none()
                && ctl.idle_since.is_some_and(|t| t.elapsed() >= idle_for);
            if expired {
                evicted += 1;
            }
            !expired
        });
        if evicted > 0 {
            debug!(evicted, "evicted idle cache entries");
        }
        evicted
    }

    /// Periodically run [`evict_idle`](Self::evict_idle) until shutdown.
    pub fn spawn_janitor(&self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(janitor_task(
            self.clone(),
            every,
            self.inner.cancel.child_token(),
        ))
    }

    /// Drop all cached data. Observed slots stay, empty and stale.
    pub fn clear(&self) {
        for slot in &self.inner.slots {
            slot.value().write(None);
        }
        self.inner
            .slots
            .retain(|_, slot| slot.control().subscribers > 0);
        info!("cache cleared");
    }

    /// Stop the janitor and every interval refresh task.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "fetcher panicked".into())
}

fn is_fresh(ctl: &SlotControl, window: Duration) -> bool {
    !ctl.stale && ctl.fresh_at.is_some_and(|at| at.elapsed() < window)
}

// ── Background tasks ─────────────────────────────────────────────────

async fn refresh_task(cache: Cache, slot: Arc<Slot>, every: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval_at(Instant::now() + every, every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = cache.start_fetch(&slot, false).await {
                    debug!(key = %slot.key, error = %e, "interval revalidation failed");
                }
            }
        }
    }
}

async fn janitor_task(cache: Cache, every: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                cache.evict_idle();
            }
        }
    }
}
