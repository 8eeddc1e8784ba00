//! Async query and mutation abstractions for data fetching.
//!
//! A `Query<T>` encapsulates async fetching, loading state and error
//! handling. A `CachedQuery<T>` binds one to a cache key: it serves fresh
//! cached results without a round-trip, writes network results to the cache,
//! and picks up patches other views make to its entry. A `Mutation<T>` is
//! the one-shot write counterpart.
//!
//! Results are delivered over channels and collected by polling from the
//! app loop, so cache writes only ever happen on that one task.
//!
//! # Example
//!
//! ```ignore
//! let client = client.clone();
//! let mut categories = CachedQuery::new(ReadflowQuery::Categories, move || {
//!     let client = client.clone();
//!     async move { client.get_categories().await.map_err(|e| e.user_message()) }
//! });
//!
//! // In event loop tick
//! if categories.sync(cache) {
//!     // State changed, trigger re-render
//! }
//! ```

use futures::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use tokio::sync::mpsc;

use crate::cache::{QueryCache, QueryKey};

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }

  /// The `(data, error, loading)` triple the response renderer consumes.
  pub fn triple(&self) -> (Option<&T>, Option<&str>, bool) {
    (self.data(), self.error(), self.is_loading())
  }
}

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, String>> + Send + Sync>;

/// Async query for data fetching with state management.
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
}

impl<T: Send + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is a closure that returns a future. It will be called
  /// each time `fetch()` or `refetch()` is invoked.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
    }
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  /// Replace the state with data obtained elsewhere (e.g. the cache).
  pub fn set_data(&mut self, data: T) {
    self.state = QueryState::Success(data);
  }

  /// Start fetching data if not already loading.
  pub fn fetch(&mut self) {
    if self.state.is_loading() {
      return;
    }
    self.start_fetch();
  }

  /// Force a refetch, even if already loading or data exists.
  pub fn refetch(&mut self) {
    // Cancel any pending fetch by dropping the receiver
    self.receiver = None;
    self.start_fetch();
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed (data arrived or error occurred).
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = QueryState::Success(data);
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        self.state = QueryState::Error(error);
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        // Sender dropped without sending - treat as error
        self.state = QueryState::Error("Query was cancelled".to_string());
        self.receiver = None;
        true
      }
    }
  }

  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = QueryState::Loading;

    let future = (self.fetcher)();
    tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(result);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .finish_non_exhaustive()
  }
}

/// A query whose results live in the [`QueryCache`].
pub struct CachedQuery<K, T> {
  key: K,
  query: Query<T>,
  started: bool,
  /// Version of the cache entry currently held in `query`
  seen_version: Option<u64>,
}

impl<K, T> CachedQuery<K, T>
where
  K: QueryKey,
  T: Serialize + DeserializeOwned + Send + 'static,
{
  pub fn new<F, Fut>(key: K, fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      key,
      query: Query::new(fetcher),
      started: false,
      seen_version: None,
    }
  }

  pub fn key(&self) -> &K {
    &self.key
  }

  pub fn state(&self) -> &QueryState<T> {
    self.query.state()
  }

  pub fn data(&self) -> Option<&T> {
    self.query.data()
  }

  /// Bypass the cache and fetch again.
  pub fn refetch(&mut self) {
    self.started = true;
    self.query.refetch();
  }

  /// Drive the query from the app loop.
  ///
  /// On the first call, serves a fresh cache entry or starts a fetch. After
  /// that, writes arriving network results to the cache and pulls in newer
  /// cache writes. Returns `true` if the state changed.
  pub fn sync(&mut self, cache: &mut QueryCache) -> bool {
    if !self.started {
      self.started = true;
      if let Some(data) = cache.read_fresh::<T>(&self.key) {
        tracing::debug!(query = %self.key.description(), "served from cache");
        self.query.set_data(data);
        self.seen_version = cache.version(&self.key);
        return true;
      }
      self.query.fetch();
      return true;
    }

    if self.query.poll() {
      if let Some(data) = self.query.data() {
        cache.write(&self.key, data);
        self.seen_version = cache.version(&self.key);
      }
      return true;
    }

    if self.query.is_loading() {
      return false;
    }

    let version = cache.version(&self.key);
    if version.is_some() && version != self.seen_version {
      if let Some(data) = cache.read::<T>(&self.key) {
        self.query.set_data(data);
        self.seen_version = version;
        return true;
      }
    }
    false
  }
}

/// One-shot async write.
pub struct Mutation<T> {
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
}

impl<T: Send + 'static> Mutation<T> {
  pub fn new() -> Self {
    Self { receiver: None }
  }

  /// Whether a write is in flight.
  pub fn is_pending(&self) -> bool {
    self.receiver.is_some()
  }

  /// Start a write. Ignored while another one is pending.
  pub fn mutate<Fut>(&mut self, future: Fut) -> bool
  where
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    if self.is_pending() {
      return false;
    }
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    tokio::spawn(async move {
      let _ = tx.send(future.await);
    });
    true
  }

  /// Take the outcome of the pending write, once it has completed.
  pub fn poll(&mut self) -> Option<Result<T, String>> {
    let receiver = self.receiver.as_mut()?;
    match receiver.try_recv() {
      Ok(result) => {
        self.receiver = None;
        Some(result)
      }
      Err(mpsc::error::TryRecvError::Empty) => None,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.receiver = None;
        Some(Err("Mutation was cancelled".to_string()))
      }
    }
  }
}

impl<T: Send + 'static> Default for Mutation<T> {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::hash_key;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;
  use std::time::Duration;

  struct Key;

  impl QueryKey for Key {
    fn cache_hash(&self) -> String {
      hash_key("numbers")
    }

    fn description(&self) -> String {
      "numbers".to_string()
    }

    fn query_name(&self) -> &'static str {
      "numbers"
    }
  }

  #[tokio::test]
  async fn test_query_success() {
    let mut query = Query::new(|| async { Ok::<_, String>(vec![1, 2, 3]) });

    assert!(matches!(query.state(), QueryState::Idle));

    query.fetch();
    assert!(query.is_loading());

    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert_eq!(query.data(), Some(&vec![1, 2, 3]));
  }

  #[tokio::test]
  async fn test_query_error() {
    let mut query: Query<i32> = Query::new(|| async { Err("Something went wrong".to_string()) });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert_eq!(query.error(), Some("Something went wrong"));
  }

  #[tokio::test]
  async fn test_fetch_while_loading_is_noop() {
    let mut query = Query::new(|| async {
      tokio::time::sleep(Duration::from_millis(100)).await;
      Ok::<_, String>(42)
    });

    query.fetch();
    query.fetch();
    assert!(query.is_loading());
  }

  #[tokio::test]
  async fn test_refetch_cancels_pending() {
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    let mut query = Query::new(move || {
      let counter = counter_clone.clone();
      async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, String>(counter.fetch_add(1, Ordering::SeqCst))
      }
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;

    query.refetch();
    tokio::time::sleep(Duration::from_millis(100)).await;

    query.poll();
    assert_eq!(query.data(), Some(&1));
  }

  #[test]
  fn test_triple_projection() {
    let idle: QueryState<i32> = QueryState::Idle;
    assert_eq!(idle.triple(), (None, None, false));
    let loading: QueryState<i32> = QueryState::Loading;
    assert_eq!(loading.triple(), (None, None, true));
    let failed: QueryState<i32> = QueryState::Error("boom".into());
    assert_eq!(failed.triple(), (None, Some("boom"), false));
  }

  #[tokio::test]
  async fn test_cached_query_serves_fresh_cache_without_fetch() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = calls.clone();
    let mut cache = QueryCache::in_memory();
    cache.write(&Key, &vec![7]);

    let mut query = CachedQuery::new(Key, move || {
      calls_clone.fetch_add(1, Ordering::SeqCst);
      async { Ok::<_, String>(vec![1]) }
    });

    assert!(query.sync(&mut cache));
    assert_eq!(query.data(), Some(&vec![7]));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_cached_query_writes_network_result() {
    let mut cache = QueryCache::in_memory();
    let mut query = CachedQuery::new(Key, || async { Ok::<_, String>(vec![1, 2]) });

    query.sync(&mut cache);
    assert!(query.state().is_loading());
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.sync(&mut cache));
    assert_eq!(cache.read::<Vec<i32>>(&Key), Some(vec![1, 2]));
  }

  #[tokio::test]
  async fn test_cached_query_picks_up_patches() {
    let mut cache = QueryCache::in_memory();
    cache.write(&Key, &vec![1]);
    let mut query = CachedQuery::new(Key, || async { Ok::<_, String>(vec![]) });
    query.sync(&mut cache);
    assert!(!query.sync(&mut cache));

    cache.write(&Key, &vec![1, 2]);

    assert!(query.sync(&mut cache));
    assert_eq!(query.data(), Some(&vec![1, 2]));
  }

  #[tokio::test]
  async fn test_mutation_single_flight() {
    let mut mutation: Mutation<i32> = Mutation::new();
    assert!(mutation.mutate(async {
      tokio::time::sleep(Duration::from_millis(20)).await;
      Ok(1)
    }));
    assert!(!mutation.mutate(async { Ok(2) }));
    assert!(mutation.poll().is_none());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(mutation.poll(), Some(Ok(1)));
    assert!(!mutation.is_pending());
  }
}
