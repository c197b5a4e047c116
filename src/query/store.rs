//! Query Store Module
//!
//! A reactive state container wrapping one async call: data, loading, error,
//! and staleness, with explicit observer subscriptions instead of a
//! framework reactivity primitive.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};
use crate::query::registry::{QueryHandle, QueryRegistry};

/// Boxed future returned by a query function.
pub type QueryFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

/// The async call a store wraps.
pub type QueryFn<P, T> = Arc<dyn Fn(P) -> QueryFuture<T> + Send + Sync>;

// == Query Options ==
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Age beyond which data counts as stale
    pub stale_time: Duration,
    /// Age at which cached data is dropped entirely by the expiry task
    pub cache_time: Duration,
    /// Store-level retry budget. Defaults to zero: the API client under the
    /// store already retries with backoff, and stacking a second retry loop
    /// on top multiplies attempts. The knob exists for query functions that
    /// are not backed by the client.
    pub retry: u32,
    /// Backoff base for store-level retries
    pub retry_delay: Duration,
    /// Whether handle_focus refetches stale data
    pub refetch_on_focus: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(5 * 60),
            cache_time: Duration::from_secs(10 * 60),
            retry: 0,
            retry_delay: Duration::from_secs(1),
            refetch_on_focus: false,
        }
    }
}

// == Query State ==
/// Snapshot of one query's reactive state. Four logical states: idle (no
/// fetch yet), loading, ready (data present), error. `loading` and a
/// populated `error` are never both true after settlement.
#[derive(Debug, Clone)]
pub struct QueryState<P, T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_fetch: Option<Instant>,
    pub stale: bool,
    pub params: P,
}

impl<P: Default, T> QueryState<P, T> {
    fn initial() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            last_fetch: None,
            stale: true,
            params: P::default(),
        }
    }
}

type Listener<P, T> = Arc<dyn Fn(&QueryState<P, T>) + Send + Sync>;

struct Inner<P, T> {
    state: QueryState<P, T>,
    listeners: Vec<(u64, Listener<P, T>)>,
    next_listener_id: u64,
    expiry_task: Option<JoinHandle<()>>,
}

// == Query Store ==
/// Wraps one async call with staleness-aware caching and observers.
///
/// Registers itself with the injected [`QueryRegistry`] on creation; call
/// [`QueryStore::teardown`] to unregister and cancel the expiry task when
/// the store's lifecycle ends.
pub struct QueryStore<P, T> {
    key: String,
    options: QueryOptions,
    query_fn: QueryFn<P, T>,
    inner: Arc<Mutex<Inner<P, T>>>,
    registry: Arc<QueryRegistry>,
}

impl<P, T> QueryStore<P, T>
where
    P: Clone + PartialEq + Default + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new(
        key: impl Into<String>,
        registry: Arc<QueryRegistry>,
        query_fn: QueryFn<P, T>,
        options: QueryOptions,
    ) -> Self {
        let key = key.into();
        let inner = Arc::new(Mutex::new(Inner {
            state: QueryState::initial(),
            listeners: Vec::new(),
            next_listener_id: 0,
            expiry_task: None,
        }));

        let stale_time = options.stale_time;
        let invalidate_ref: Weak<Mutex<Inner<P, T>>> = Arc::downgrade(&inner);
        let reset_ref = invalidate_ref.clone();
        registry.register(
            key.clone(),
            QueryHandle {
                invalidate: Box::new(move || {
                    if let Some(inner) = invalidate_ref.upgrade() {
                        Self::apply(&inner, stale_time, |state| state.stale = true);
                    }
                }),
                reset: Box::new(move || {
                    if let Some(inner) = reset_ref.upgrade() {
                        Self::apply(&inner, stale_time, |state| *state = QueryState::initial());
                    }
                }),
            },
        );

        Self {
            key,
            options,
            query_fn,
            inner,
            registry,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current state with staleness recomputed against the clock: data is
    /// stale when never fetched, older than `stale_time`, or explicitly
    /// invalidated.
    pub fn state(&self) -> QueryState<P, T> {
        let inner = self.inner.lock().unwrap();
        let mut snapshot = inner.state.clone();
        snapshot.stale = Self::is_stale(&snapshot, self.options.stale_time);
        snapshot
    }

    /// Registers an observer, notified synchronously on every transition.
    /// Listeners must not call back into the store.
    pub fn subscribe(
        &self,
        listener: impl Fn(&QueryState<P, T>) + Send + Sync + 'static,
    ) -> u64 {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Removes an observer. Returns whether it was subscribed.
    pub fn unsubscribe(&self, id: u64) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id);
        inner.listeners.len() != before
    }

    /// Fetches data for `params`.
    ///
    /// Fresh data with deep-equal params short-circuits without invoking the
    /// underlying call. Otherwise the store transitions to loading, runs the
    /// call (with the store-level retry budget), and settles into ready or
    /// error state. The error is both stored and re-raised.
    pub async fn fetch(&self, params: P) -> Result<T> {
        {
            let inner = self.inner.lock().unwrap();
            let state = &inner.state;
            if !Self::is_stale(state, self.options.stale_time) && state.params == params {
                if let Some(data) = state.data.clone() {
                    debug!(key = %self.key, "returning cached query data");
                    return Ok(data);
                }
            }
        }

        Self::apply(&self.inner, self.options.stale_time, |state| {
            state.loading = true;
            state.error = None;
        });

        let mut attempt = 0u32;
        loop {
            match (self.query_fn)(params.clone()).await {
                Ok(data) => {
                    let stored = data.clone();
                    let params = params.clone();
                    Self::apply(&self.inner, self.options.stale_time, move |state| {
                        state.data = Some(stored);
                        state.loading = false;
                        state.error = None;
                        state.last_fetch = Some(Instant::now());
                        state.stale = false;
                        state.params = params;
                    });
                    self.arm_expiry();
                    debug!(key = %self.key, "query fetch successful");
                    return Ok(data);
                }
                Err(err) if attempt < self.options.retry => {
                    warn!(
                        key = %self.key,
                        attempt = attempt + 1,
                        error = %err,
                        "query fetch failed, retrying"
                    );
                    let delay = self.options.retry_delay * 2u32.pow(attempt);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    let message = err.to_string();
                    let stored = message.clone();
                    Self::apply(&self.inner, self.options.stale_time, move |state| {
                        state.loading = false;
                        state.error = Some(stored);
                        state.stale = true;
                    });
                    warn!(key = %self.key, error = %message, "query fetch failed");
                    return Err(ApiError::Query {
                        key: self.key.clone(),
                        message,
                    });
                }
            }
        }
    }

    /// Marks the data stale without clearing it or refetching.
    pub fn invalidate(&self) {
        debug!(key = %self.key, "invalidating query");
        Self::apply(&self.inner, self.options.stale_time, |state| {
            state.stale = true;
        });
    }

    /// Clears all state back to initial and cancels the pending expiry task.
    pub fn reset(&self) {
        let task = {
            let mut inner = self.inner.lock().unwrap();
            inner.expiry_task.take()
        };
        if let Some(task) = task {
            task.abort();
        }
        Self::apply(&self.inner, self.options.stale_time, |state| {
            *state = QueryState::initial();
        });
    }

    /// Warms the store: fetches only when stale or the params differ. The
    /// loading transition is not suppressed, so observers see prefetches
    /// the same way they see fetches.
    pub async fn prefetch(&self, params: P) -> Result<()> {
        {
            let inner = self.inner.lock().unwrap();
            if !Self::is_stale(&inner.state, self.options.stale_time)
                && inner.state.params == params
            {
                return Ok(());
            }
        }
        debug!(key = %self.key, "prefetching query");
        self.fetch(params).await.map(|_| ())
    }

    /// Focus-regained hook: refetches with the last params when data exists,
    /// is stale, and the params are non-default. Returns whether a refetch
    /// ran.
    pub async fn handle_focus(&self) -> Result<bool> {
        if !self.options.refetch_on_focus {
            return Ok(false);
        }
        let params = {
            let inner = self.inner.lock().unwrap();
            let state = &inner.state;
            if state.data.is_some()
                && Self::is_stale(state, self.options.stale_time)
                && state.params != P::default()
            {
                Some(state.params.clone())
            } else {
                None
            }
        };
        match params {
            Some(params) => {
                debug!(key = %self.key, "refetching on focus");
                self.fetch(params).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Unregisters from the registry and cancels the expiry task.
    pub fn teardown(&self) {
        self.registry.unregister(&self.key);
        let task = {
            let mut inner = self.inner.lock().unwrap();
            inner.expiry_task.take()
        };
        if let Some(task) = task {
            task.abort();
        }
    }

    // == Internals ==

    fn is_stale(state: &QueryState<P, T>, stale_time: Duration) -> bool {
        if state.stale {
            return true;
        }
        match state.last_fetch {
            None => true,
            Some(at) => at.elapsed() > stale_time,
        }
    }

    /// Mutates state under the lock, then notifies listeners outside it with
    /// a staleness-recomputed snapshot.
    fn apply(
        inner: &Arc<Mutex<Inner<P, T>>>,
        stale_time: Duration,
        f: impl FnOnce(&mut QueryState<P, T>),
    ) {
        let (snapshot, listeners) = {
            let mut guard = inner.lock().unwrap();
            f(&mut guard.state);
            let mut snapshot = guard.state.clone();
            snapshot.stale = Self::is_stale(&snapshot, stale_time);
            let listeners: Vec<Listener<P, T>> =
                guard.listeners.iter().map(|(_, l)| l.clone()).collect();
            (snapshot, listeners)
        };
        for listener in listeners {
            listener(&snapshot);
        }
    }

    /// (Re)arms the expiry task: after `cache_time`, data is dropped and the
    /// store goes stale, independent of external invalidation. Holds only a
    /// weak reference, so a dropped store ends the task quietly.
    fn arm_expiry(&self) {
        let weak = Arc::downgrade(&self.inner);
        let cache_time = self.options.cache_time;
        let stale_time = self.options.stale_time;

        let mut inner = self.inner.lock().unwrap();
        if let Some(task) = inner.expiry_task.take() {
            task.abort();
        }
        inner.expiry_task = Some(tokio::spawn(async move {
            tokio::time::sleep(cache_time).await;
            if let Some(inner) = weak.upgrade() {
                Self::apply(&inner, stale_time, |state| {
                    state.data = None;
                    state.stale = true;
                });
            }
        }));
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Params = Vec<(String, String)>;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Query fn that counts invocations and returns a fixed value.
    fn counting_fn(
        calls: Arc<AtomicUsize>,
        value: &'static str,
    ) -> QueryFn<Params, String> {
        Arc::new(move |_| {
            let calls = calls.clone();
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(value.to_string())
            })
        })
    }

    fn failing_fn(calls: Arc<AtomicUsize>) -> QueryFn<Params, String> {
        Arc::new(move |_| {
            let calls = calls.clone();
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::FetchFailed("upstream down".to_string()))
            })
        })
    }

    fn store_with(
        query_fn: QueryFn<Params, String>,
        options: QueryOptions,
    ) -> (QueryStore<Params, String>, Arc<QueryRegistry>) {
        let registry = Arc::new(QueryRegistry::new());
        let store = QueryStore::new("test:query", registry.clone(), query_fn, options);
        (store, registry)
    }

    #[tokio::test]
    async fn test_idle_state_is_stale_with_no_data() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (store, _) = store_with(counting_fn(calls, "x"), QueryOptions::default());

        let state = store.state();
        assert!(state.stale);
        assert!(state.data.is_none());
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_fetch_transitions_to_ready() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (store, _) = store_with(counting_fn(calls.clone(), "games"), QueryOptions::default());

        let data = store.fetch(params(&[("year", "2023")])).await.unwrap();
        assert_eq!(data, "games");

        let state = store.state();
        assert_eq!(state.data.as_deref(), Some("games"));
        assert!(!state.stale);
        assert!(!state.loading);
        assert!(state.last_fetch.is_some());
    }

    #[tokio::test]
    async fn test_fresh_equal_params_short_circuit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (store, _) = store_with(counting_fn(calls.clone(), "x"), QueryOptions::default());

        store.fetch(params(&[("year", "2023")])).await.unwrap();
        store.fetch(params(&[("year", "2023")])).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Different params bypass the short-circuit.
        store.fetch(params(&[("year", "2024")])).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_staleness_by_age() {
        let calls = Arc::new(AtomicUsize::new(0));
        let options = QueryOptions {
            stale_time: Duration::from_millis(50),
            ..QueryOptions::default()
        };
        let (store, _) = store_with(counting_fn(calls, "x"), options);

        store.fetch(params(&[("a", "1")])).await.unwrap();
        assert!(!store.state().stale);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(store.state().stale, "data older than stale_time is stale");
    }

    #[tokio::test]
    async fn test_invalidate_forces_stale_without_clearing_data() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (store, _) = store_with(counting_fn(calls.clone(), "x"), QueryOptions::default());

        store.fetch(params(&[("a", "1")])).await.unwrap();
        store.invalidate();

        let state = store.state();
        assert!(state.stale);
        assert!(state.data.is_some(), "invalidate keeps the data");

        // Invalidation defeats the short-circuit regardless of age.
        store.fetch(params(&[("a", "1")])).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_error_state_after_exhausted_retries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let options = QueryOptions {
            retry: 2,
            retry_delay: Duration::from_millis(5),
            ..QueryOptions::default()
        };
        let (store, _) = store_with(failing_fn(calls.clone()), options);

        let result = store.fetch(params(&[("a", "1")])).await;
        assert!(matches!(result, Err(ApiError::Query { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3, "retry=2 means 3 attempts");

        let state = store.state();
        assert!(!state.loading, "loading and error never both set");
        assert!(state.error.as_deref().unwrap().contains("upstream down"));
        assert!(state.stale);
    }

    #[tokio::test]
    async fn test_reset_returns_to_initial() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (store, _) = store_with(counting_fn(calls, "x"), QueryOptions::default());

        store.fetch(params(&[("a", "1")])).await.unwrap();
        store.reset();

        let state = store.state();
        assert!(state.data.is_none());
        assert!(state.stale);
        assert!(state.last_fetch.is_none());
    }

    #[tokio::test]
    async fn test_expiry_task_clears_data() {
        let calls = Arc::new(AtomicUsize::new(0));
        let options = QueryOptions {
            stale_time: Duration::from_secs(300),
            cache_time: Duration::from_millis(40),
            ..QueryOptions::default()
        };
        let (store, _) = store_with(counting_fn(calls, "x"), options);

        store.fetch(params(&[("a", "1")])).await.unwrap();
        assert!(store.state().data.is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;
        let state = store.state();
        assert!(state.data.is_none(), "expiry drops the data");
        assert!(state.stale);
    }

    #[tokio::test]
    async fn test_prefetch_skips_when_fresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (store, _) = store_with(counting_fn(calls.clone(), "x"), QueryOptions::default());

        store.fetch(params(&[("a", "1")])).await.unwrap();
        store.prefetch(params(&[("a", "1")])).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        store.prefetch(params(&[("a", "2")])).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_listeners_observe_transitions() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (store, _) = store_with(counting_fn(calls, "x"), QueryOptions::default());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = store.subscribe(move |state| {
            sink.lock().unwrap().push((state.loading, state.data.is_some()));
        });

        store.fetch(params(&[("a", "1")])).await.unwrap();

        let transitions = seen.lock().unwrap().clone();
        assert_eq!(transitions, vec![(true, false), (false, true)]);

        assert!(store.unsubscribe(id));
        store.invalidate();
        assert_eq!(seen.lock().unwrap().len(), 2, "unsubscribed, no more events");
    }

    #[tokio::test]
    async fn test_registry_invalidation_reaches_store() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (store, registry) = store_with(counting_fn(calls, "x"), QueryOptions::default());

        store.fetch(params(&[("a", "1")])).await.unwrap();
        assert!(!store.state().stale);

        registry.invalidate_matching("test:");
        assert!(store.state().stale);
    }

    #[tokio::test]
    async fn test_teardown_unregisters() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (store, registry) = store_with(counting_fn(calls, "x"), QueryOptions::default());

        assert_eq!(registry.len(), 1);
        store.teardown();
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn test_focus_refetch_when_stale_with_params() {
        let calls = Arc::new(AtomicUsize::new(0));
        let options = QueryOptions {
            stale_time: Duration::from_millis(20),
            refetch_on_focus: true,
            ..QueryOptions::default()
        };
        let (store, _) = store_with(counting_fn(calls.clone(), "x"), options);

        // No data yet: focus does nothing.
        assert!(!store.handle_focus().await.unwrap());

        store.fetch(params(&[("a", "1")])).await.unwrap();
        assert!(!store.handle_focus().await.unwrap(), "fresh data, no refetch");

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(store.handle_focus().await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
