// Cache and subscription behavior against a scripted in-memory fetcher.
//
// Tests run on a paused clock, so fetch delays and refresh intervals are
// exact and instant.
#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::time::{Instant, sleep, timeout_at};

use medcart_api::{Error, Fetcher};
use medcart_core::{Cache, CacheConfig, MutateAction, ResourceKey, SubscribeOptions, endpoints};

// ── Helpers ─────────────────────────────────────────────────────────

type Step = (Duration, Result<Value, Error>);

/// Answers each call with the next scripted step. Once the script runs
/// out, answers `{"call": n}` immediately.
#[derive(Default)]
struct ScriptedFetcher {
    calls: AtomicUsize,
    script: Mutex<VecDeque<Step>>,
}

impl ScriptedFetcher {
    fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Mutex::new(steps.into_iter().collect()),
        })
    }

    fn counting() -> Arc<Self> {
        Self::new([])
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(&self, _key: &str) -> BoxFuture<'static, Result<Value, Error>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let step = self.script.lock().unwrap().pop_front();
        Box::pin(async move {
            match step {
                Some((delay, result)) => {
                    sleep(delay).await;
                    result
                }
                None => Ok(json!({ "call": n })),
            }
        })
    }
}

/// Panics on its first call, then answers `{"call": n}`.
#[derive(Default)]
struct PanicsOnce {
    calls: AtomicUsize,
}

impl Fetcher for PanicsOnce {
    fn fetch(&self, _key: &str) -> BoxFuture<'static, Result<Value, Error>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Box::pin(async move {
            assert!(n > 1, "fetcher blew up");
            Ok(json!({ "call": n }))
        })
    }
}

fn ok_after(ms: u64, body: Value) -> Step {
    (Duration::from_millis(ms), Ok(body))
}

fn server_error(ms: u64) -> Step {
    (
        Duration::from_millis(ms),
        Err(Error::Http {
            status: 500,
            message: "Internal server error".into(),
            body: String::new(),
        }),
    )
}

fn cache_with(fetcher: &Arc<ScriptedFetcher>) -> Cache {
    Cache::new(fetcher.clone(), CacheConfig::default())
}

fn key() -> ResourceKey {
    endpoints::products(1)
}

/// Let spawned fetches and timers run.
async fn idle(ms: u64) {
    sleep(Duration::from_millis(ms)).await;
}

// ── Deduplication ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn simultaneous_subscribers_share_one_request() {
    let fetcher = ScriptedFetcher::new([ok_after(100, json!(["a"]))]);
    let cache = cache_with(&fetcher);

    let mut first = cache.subscribe(key(), SubscribeOptions::default());
    let second = cache.subscribe(key(), SubscribeOptions::default());
    assert_eq!(fetcher.calls(), 1);

    first.settled().await.unwrap();
    assert_eq!(first.data().as_deref(), Some(&json!(["a"])));
    assert_eq!(second.data().as_deref(), Some(&json!(["a"])));
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn subscribe_within_dedupe_window_uses_cache() {
    let fetcher = ScriptedFetcher::counting();
    let cache = cache_with(&fetcher);

    let mut first = cache.subscribe(key(), SubscribeOptions::default());
    first.settled().await.unwrap();
    drop(first);

    let again = cache.subscribe(key(), SubscribeOptions::default());
    assert_eq!(fetcher.calls(), 1);
    assert!(!again.is_validating());

    idle(2_500).await;
    let _late = cache.subscribe(key(), SubscribeOptions::default());
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn refetch_joins_running_fetch() {
    let fetcher = ScriptedFetcher::new([ok_after(200, json!(1))]);
    let cache = cache_with(&fetcher);

    let sub = cache.subscribe(key(), SubscribeOptions::default());
    let value = sub.refetch().await.unwrap();
    assert_eq!(*value, json!(1));
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn refetch_when_fresh_issues_exactly_one_request() {
    let fetcher = ScriptedFetcher::counting();
    let cache = cache_with(&fetcher);

    let mut sub = cache.subscribe(key(), SubscribeOptions::default());
    sub.settled().await.unwrap();
    assert_eq!(fetcher.calls(), 1);

    let value = sub.refetch().await.unwrap();
    assert_eq!(*value, json!({"call": 2}));
    assert_eq!(fetcher.calls(), 2);
}

// ── Ordering ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn newer_fetch_wins_when_older_resolves_last() {
    let fetcher = ScriptedFetcher::new([
        ok_after(300, json!({"version": "old"})),
        ok_after(100, json!({"version": "new"})),
    ]);
    let cache = cache_with(&fetcher);

    let sub = cache.subscribe(key(), SubscribeOptions::default());
    idle(10).await;
    let newer = sub.mutate(MutateAction::Revalidate);
    assert!(newer.is_pending());

    let settled = newer.settled().await.unwrap().unwrap();
    assert_eq!(*settled, json!({"version": "new"}));

    idle(500).await;
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(sub.data().as_deref(), Some(&json!({"version": "new"})));
    assert!(!sub.is_validating());
}

#[tokio::test(start_paused = true)]
async fn superseded_fetch_is_discarded_even_if_it_lands_first() {
    let fetcher = ScriptedFetcher::new([
        ok_after(50, json!({"version": "old"})),
        ok_after(200, json!({"version": "new"})),
    ]);
    let cache = cache_with(&fetcher);

    let sub = cache.subscribe(key(), SubscribeOptions::default());
    let newer = sub.mutate(MutateAction::Revalidate);

    idle(100).await;
    assert_eq!(sub.data(), None);
    assert!(sub.is_loading());

    newer.settled().await.unwrap().unwrap();
    assert_eq!(sub.data().as_deref(), Some(&json!({"version": "new"})));
}

// ── Local writes ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn mutate_with_data_makes_no_request() {
    let fetcher = ScriptedFetcher::counting();
    let cache = cache_with(&fetcher);

    let mut sub = cache.subscribe(key(), SubscribeOptions::default());
    sub.settled().await.unwrap();

    let write = cache.mutate(&key(), MutateAction::Set(json!(["local"])));
    assert!(!write.is_pending());
    assert_eq!(sub.data().as_deref(), Some(&json!(["local"])));
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn mutate_without_data_fetches_once() {
    let fetcher = ScriptedFetcher::counting();
    let cache = cache_with(&fetcher);

    let mut sub = cache.subscribe(key(), SubscribeOptions::default());
    sub.settled().await.unwrap();

    let outcome = cache
        .mutate(&key(), MutateAction::Revalidate)
        .settled()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(*outcome, json!({"call": 2}));
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn local_write_supersedes_running_fetch() {
    let fetcher = ScriptedFetcher::new([ok_after(100, json!("server"))]);
    let cache = cache_with(&fetcher);

    let sub = cache.subscribe(key(), SubscribeOptions::default());
    drop(sub.mutate(MutateAction::Set(json!("local"))));

    idle(200).await;
    assert_eq!(sub.data().as_deref(), Some(&json!("local")));
    assert!(!sub.is_validating());
}

#[tokio::test(start_paused = true)]
async fn updates_apply_in_call_order() {
    let fetcher = ScriptedFetcher::new([ok_after(0, json!([1]))]);
    let cache = cache_with(&fetcher);

    let mut sub = cache.subscribe(key(), SubscribeOptions::default());
    sub.settled().await.unwrap();

    for n in 2..=4 {
        drop(sub.mutate(MutateAction::update(move |current| {
            let mut items = current.and_then(Value::as_array).cloned().unwrap_or_default();
            items.push(json!(n));
            Value::Array(items)
        })));
    }
    assert_eq!(sub.data().as_deref(), Some(&json!([1, 2, 3, 4])));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_are_not_lost() {
    let fetcher = ScriptedFetcher::counting();
    let cache = cache_with(&fetcher);
    let cart = endpoints::cart();
    drop(cache.mutate(&cart, MutateAction::Set(json!(0))));

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let cache = cache.clone();
            let cart = cart.clone();
            tokio::spawn(async move {
                for _ in 0..500 {
                    drop(cache.mutate(
                        &cart,
                        MutateAction::update(|current| {
                            json!(current.and_then(Value::as_u64).unwrap_or(0) + 1)
                        }),
                    ));
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let entry = cache.peek(&cart).unwrap();
    assert_eq!(entry.data.as_deref(), Some(&json!(2000)));
    assert_eq!(fetcher.calls(), 0);
}

// ── Stale-while-revalidate ──────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn loading_only_until_first_data() {
    let fetcher = ScriptedFetcher::new([ok_after(100, json!(1)), ok_after(100, json!(2))]);
    let cache = cache_with(&fetcher);

    let mut sub = cache.subscribe(key(), SubscribeOptions::default());
    assert!(sub.is_loading());
    assert!(sub.is_validating());
    sub.settled().await.unwrap();
    assert!(!sub.is_loading());

    let again = sub.mutate(MutateAction::Revalidate);
    assert!(!sub.is_loading());
    assert!(sub.is_validating());
    assert_eq!(sub.data().as_deref(), Some(&json!(1)));
    again.settled().await.unwrap().unwrap();
    assert_eq!(sub.data().as_deref(), Some(&json!(2)));
}

#[tokio::test(start_paused = true)]
async fn failed_revalidation_keeps_data() {
    let fetcher = ScriptedFetcher::new([
        ok_after(10, json!(["kept"])),
        server_error(10),
        ok_after(10, json!(["fresh"])),
    ]);
    let cache = cache_with(&fetcher);

    let mut sub = cache.subscribe(key(), SubscribeOptions::default());
    sub.settled().await.unwrap();

    let err = sub.refetch().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(sub.data().as_deref(), Some(&json!(["kept"])));
    assert_eq!(sub.error().unwrap().status(), Some(500));

    sub.refetch().await.unwrap();
    assert_eq!(sub.data().as_deref(), Some(&json!(["fresh"])));
    assert!(sub.error().is_none());
}

#[tokio::test(start_paused = true)]
async fn panicking_fetch_settles_as_error() {
    let fetcher = Arc::new(PanicsOnce::default());
    let cache = Cache::new(fetcher.clone(), CacheConfig::default());

    let mut sub = cache.subscribe(key(), SubscribeOptions::default());
    let entry = sub.settled().await.unwrap();
    assert!(!entry.is_validating);
    assert!(matches!(entry.error.as_deref(), Some(Error::Aborted(m)) if m.contains("blew up")));

    let outcome = sub.refetch().await.unwrap();
    assert_eq!(*outcome, json!({"call": 2}));
    assert!(sub.error().is_none());
}

#[tokio::test(start_paused = true)]
async fn initial_data_shows_until_first_fetch() {
    let fetcher = ScriptedFetcher::new([ok_after(100, json!("server"))]);
    let cache = cache_with(&fetcher);

    let mut sub = cache.subscribe(
        key(),
        SubscribeOptions::default().with_initial_data(json!("placeholder")),
    );
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(sub.data().as_deref(), Some(&json!("placeholder")));
    assert!(!sub.is_loading());

    sub.settled().await.unwrap();
    assert_eq!(sub.data().as_deref(), Some(&json!("server")));
}

#[tokio::test(start_paused = true)]
async fn refresh_interval_streams_successive_values() {
    let fetcher = ScriptedFetcher::counting();
    let cache = cache_with(&fetcher);

    let sub = cache.subscribe(
        endpoints::users(1),
        SubscribeOptions::default().refresh_every(Duration::from_millis(3_000)),
    );
    let mut stream = sub.into_stream();

    let deadline = Instant::now() + Duration::from_millis(8_500);
    let mut seen: Vec<Value> = Vec::new();
    while let Ok(Some(entry)) = timeout_at(deadline, stream.next()).await {
        match entry.data {
            Some(data) => {
                if seen.last() != Some(&*data) {
                    seen.push((*data).clone());
                }
            }
            None => assert!(seen.is_empty(), "data disappeared after first fetch"),
        }
    }

    assert_eq!(
        seen,
        vec![json!({"call": 1}), json!({"call": 2}), json!({"call": 3})]
    );
}

#[tokio::test(start_paused = true)]
async fn dropping_subscription_stops_refresh() {
    let fetcher = ScriptedFetcher::counting();
    let cache = cache_with(&fetcher);

    let mut sub = cache.subscribe(
        key(),
        SubscribeOptions::default().refresh_every(Duration::from_secs(1)),
    );
    sub.settled().await.unwrap();
    drop(sub);

    idle(5_000).await;
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_refresh() {
    let fetcher = ScriptedFetcher::counting();
    let cache = cache_with(&fetcher);

    let mut sub = cache.subscribe(
        key(),
        SubscribeOptions::default().refresh_every(Duration::from_secs(1)),
    );
    sub.settled().await.unwrap();
    cache.shutdown();

    idle(5_000).await;
    assert_eq!(fetcher.calls(), 1);
}

// ── Focus and invalidation ──────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn focus_revalidates_opted_in_keys_after_throttle() {
    let fetcher = ScriptedFetcher::counting();
    let cache = cache_with(&fetcher);

    let mut watched = cache.subscribe(key(), SubscribeOptions::default().on_focus());
    let mut plain = cache.subscribe(endpoints::categories(), SubscribeOptions::default());
    watched.settled().await.unwrap();
    plain.settled().await.unwrap();
    assert_eq!(fetcher.calls(), 2);

    assert_eq!(cache.revalidate_on_focus(), 0);

    idle(6_000).await;
    assert_eq!(cache.revalidate_on_focus(), 1);
    watched.settled().await.unwrap();
    assert_eq!(fetcher.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn invalidate_touches_only_listed_keys() {
    let fetcher = ScriptedFetcher::counting();
    let cache = cache_with(&fetcher);

    let mut products = cache.subscribe(key(), SubscribeOptions::default());
    let mut categories = cache.subscribe(endpoints::categories(), SubscribeOptions::default());
    products.settled().await.unwrap();
    categories.settled().await.unwrap();

    let pending = cache.invalidate(&[endpoints::categories(), endpoints::order(404)]);
    assert_eq!(pending.len(), 1);
    for revalidation in pending {
        revalidation.settled().await.unwrap().unwrap();
    }

    assert_eq!(fetcher.calls(), 3);
    assert_eq!(products.data().as_deref(), Some(&json!({"call": 1})));
    assert_eq!(categories.data().as_deref(), Some(&json!({"call": 3})));
}

#[tokio::test(start_paused = true)]
async fn invalidated_idle_key_refetches_on_next_subscribe() {
    let fetcher = ScriptedFetcher::counting();
    let cache = cache_with(&fetcher);

    let mut sub = cache.subscribe(key(), SubscribeOptions::default());
    sub.settled().await.unwrap();
    drop(sub);

    assert!(cache.invalidate(&[key()]).is_empty());
    assert_eq!(fetcher.calls(), 1);

    let _again = cache.subscribe(key(), SubscribeOptions::default());
    assert_eq!(fetcher.calls(), 2);
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn idle_slots_are_evicted() {
    let fetcher = ScriptedFetcher::counting();
    let cache = cache_with(&fetcher);

    let mut kept = cache.subscribe(endpoints::cart(), SubscribeOptions::default());
    let mut gone = cache.subscribe(key(), SubscribeOptions::default());
    kept.settled().await.unwrap();
    gone.settled().await.unwrap();
    drop(gone);

    assert_eq!(cache.evict_idle(), 0);
    idle(301_000).await;
    assert_eq!(cache.evict_idle(), 1);
    assert_eq!(cache.len(), 1);
    assert!(cache.peek(&key()).is_none());
    assert!(kept.data().is_some());
}

#[tokio::test(start_paused = true)]
async fn janitor_evicts_in_background() {
    let fetcher = ScriptedFetcher::counting();
    let cache = Cache::new(
        fetcher.clone(),
        CacheConfig {
            idle_eviction: Duration::from_secs(10),
            ..CacheConfig::default()
        },
    );

    let mut sub = cache.subscribe(key(), SubscribeOptions::default());
    sub.settled().await.unwrap();
    drop(sub);

    let janitor = cache.spawn_janitor(Duration::from_secs(5));
    idle(16_000).await;
    assert!(cache.is_empty());

    cache.shutdown();
    janitor.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn clear_empties_observed_slots() {
    let fetcher = ScriptedFetcher::counting();
    let cache = cache_with(&fetcher);

    let mut sub = cache.subscribe(key(), SubscribeOptions::default());
    sub.settled().await.unwrap();
    let _other = cache.mutate(&endpoints::cart(), MutateAction::Set(json!([])));
    assert_eq!(cache.len(), 2);

    cache.clear();
    assert_eq!(cache.len(), 1);
    assert_eq!(sub.data(), None);
    assert!(sub.current().last_fetched_at.is_none());

    sub.refetch().await.unwrap();
    assert_eq!(sub.data().as_deref(), Some(&json!({"call": 2})));
}

#[tokio::test(start_paused = true)]
async fn typed_decode_of_cached_page() {
    let fetcher = ScriptedFetcher::new([ok_after(
        0,
        json!({
            "items": [{"id": 1, "name": "Paracetamol", "price": 12000}],
            "page": 1,
            "total_pages": 3,
            "total_items": 25
        }),
    )]);
    let cache = cache_with(&fetcher);

    let mut sub = cache.subscribe(key(), SubscribeOptions::default());
    sub.settled().await.unwrap();

    let page: medcart_core::Page<medcart_core::Product> = sub.data_as().unwrap().unwrap();
    assert_eq!(page.items[0].name, "Paracetamol");
    assert!(page.has_next());
}
