use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::FetchError;

/// What a read does with an entry older than the staleness window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    /// Refetch and wait for the new data.
    #[default]
    Blocking,
    /// Hand back the stale data and refresh in the background.
    StaleWhileRevalidate,
}

#[derive(Debug)]
pub struct CacheEntry<V> {
    pub data: Arc<V>,
    pub fetched_at: Instant,
}

impl<V> Clone for CacheEntry<V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            fetched_at: self.fetched_at,
        }
    }
}

type SharedFetch<V> = Shared<BoxFuture<'static, Result<Arc<V>, FetchError>>>;

enum Slot<V> {
    Ready(CacheEntry<V>),
    Pending {
        generation: u64,
        fetch: SharedFetch<V>,
        previous: Option<CacheEntry<V>>,
    },
}

struct Store<K, V> {
    slots: HashMap<K, Slot<V>>,
    next_generation: u64,
}

enum Lookup<V> {
    Fresh(Arc<V>),
    Stale(Arc<V>),
    InFlight(SharedFetch<V>, Option<Arc<V>>),
    Miss,
}

/// Keyed query cache with in-flight deduplication and a freshness window.
///
/// Cloning yields another handle onto the same store. Entries are replaced
/// whole; a failed fetch never overwrites what was there before.
pub struct QueryCache<K, V> {
    store: Arc<Mutex<Store<K, V>>>,
    stale_time: Duration,
    policy: StalePolicy,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            stale_time: self.stale_time,
            policy: self.policy,
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(stale_time: Duration, policy: StalePolicy) -> Self {
        Self {
            store: Arc::new(Mutex::new(Store {
                slots: HashMap::new(),
                next_generation: 0,
            })),
            stale_time,
            policy,
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    pub fn policy(&self) -> StalePolicy {
        self.policy
    }

    /// Returns the cached value for `key`, calling `fetcher` only when there is
    /// no usable entry and no fetch for the same key already in flight.
    pub async fn fetch<F, Fut>(&self, key: K, fetcher: F) -> Result<Arc<V>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        let mut store = self.store.lock().await;
        let now = Instant::now();
        let lookup = match store.slots.get(&key) {
            Some(Slot::Ready(entry)) if self.is_fresh(entry, now) => {
                Lookup::Fresh(Arc::clone(&entry.data))
            }
            Some(Slot::Ready(entry)) => Lookup::Stale(Arc::clone(&entry.data)),
            Some(Slot::Pending {
                fetch, previous, ..
            }) => Lookup::InFlight(
                fetch.clone(),
                previous.as_ref().map(|p| Arc::clone(&p.data)),
            ),
            None => Lookup::Miss,
        };

        let fetch = match lookup {
            Lookup::Fresh(data) => {
                trace!(?key, "cache hit");
                return Ok(data);
            }
            Lookup::Stale(data) if self.policy == StalePolicy::StaleWhileRevalidate => {
                debug!(?key, "serving stale entry while revalidating");
                let refresh_key = key.clone();
                let fetch = self.start(&mut store, key, fetcher());
                tokio::spawn(async move {
                    if let Err(e) = fetch.await {
                        debug!(key = ?refresh_key, "background refresh failed: {}", e);
                    }
                });
                return Ok(data);
            }
            Lookup::InFlight(_, Some(data))
                if self.policy == StalePolicy::StaleWhileRevalidate =>
            {
                return Ok(data);
            }
            Lookup::InFlight(fetch, _) => {
                trace!(?key, "joining in-flight fetch");
                fetch
            }
            Lookup::Stale(_) | Lookup::Miss => {
                debug!(?key, "cache miss");
                self.start(&mut store, key, fetcher())
            }
        };
        drop(store);
        fetch.await
    }

    /// Current entry for `key`, if any, without fetching.
    pub async fn peek(&self, key: &K) -> Option<CacheEntry<V>> {
        let store = self.store.lock().await;
        match store.slots.get(key)? {
            Slot::Ready(entry) => Some(entry.clone()),
            Slot::Pending { previous, .. } => previous.clone(),
        }
    }

    pub async fn is_fetching(&self, key: &K) -> bool {
        let store = self.store.lock().await;
        matches!(store.slots.get(key), Some(Slot::Pending { .. }))
    }

    /// Drops the entry for `key`. A fetch still in flight for it will not be stored.
    pub async fn invalidate(&self, key: &K) {
        self.store.lock().await.slots.remove(key);
    }

    pub async fn clear(&self) {
        self.store.lock().await.slots.clear();
    }

    pub async fn len(&self) -> usize {
        self.store.lock().await.slots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.fetched_at) < self.stale_time
    }

    fn start<Fut>(&self, store: &mut Store<K, V>, key: K, fut: Fut) -> SharedFetch<V>
    where
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        let generation = store.next_generation;
        store.next_generation += 1;
        let previous = match store.slots.remove(&key) {
            Some(Slot::Ready(entry)) => Some(entry),
            Some(Slot::Pending { previous, .. }) => previous,
            None => None,
        };

        let shared_store = Arc::clone(&self.store);
        let slot_key = key.clone();
        let fetch = async move {
            let result = fut.await.map(Arc::new);
            shared_store
                .lock()
                .await
                .settle(slot_key, generation, &result);
            result
        }
        .boxed()
        .shared();

        store.slots.insert(
            key,
            Slot::Pending {
                generation,
                fetch: fetch.clone(),
                previous,
            },
        );
        fetch
    }
}

impl<K: Eq + Hash + Debug, V> Store<K, V> {
    fn settle(&mut self, key: K, generation: u64, result: &Result<Arc<V>, FetchError>) {
        let current = matches!(
            self.slots.get(&key),
            Some(Slot::Pending { generation: g, .. }) if *g == generation
        );
        if !current {
            trace!(?key, "discarding result of superseded fetch");
            return;
        }
        let Some(Slot::Pending { previous, .. }) = self.slots.remove(&key) else {
            return;
        };
        match result {
            Ok(data) => {
                self.slots.insert(
                    key,
                    Slot::Ready(CacheEntry {
                        data: Arc::clone(data),
                        fetched_at: Instant::now(),
                    }),
                );
            }
            Err(e) => {
                debug!(?key, "fetch failed: {}", e);
                if let Some(previous) = previous {
                    self.slots.insert(key, Slot::Ready(previous));
                }
            }
        }
    }
}
