#[cfg(test)]
#[path = "query_cache_test.rs"]
mod tests;

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use anyhow::Result;
use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::future::Shared;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ApiError;
use crate::domain::models::QueryKey;

pub type CachedValue = Arc<dyn Any + Send + Sync>;

type SharedFetch = Shared<BoxFuture<'static, Result<CachedValue, ApiError>>>;

struct Entry {
    value: CachedValue,
    fetched_at: Instant,
    stale: bool,
}

/// Keyed cache of server resources. Reads for the same key share one
/// in-flight request; writes either inject a known value or invalidate a key
/// prefix so the next read refetches.
pub struct QueryCache {
    entries: DashMap<QueryKey, Entry>,
    in_flight: DashMap<QueryKey, SharedFetch>,
    // Bumped whenever a key is written or invalidated. A fetch that started
    // under an older generation must not write its result.
    generations: DashMap<QueryKey, u64>,
    stale_time: Duration,
}

impl Default for QueryCache {
    fn default() -> QueryCache {
        let seconds = Config::get(ConfigKey::CacheStaleSeconds)
            .parse::<u64>()
            .unwrap_or(60);

        return QueryCache::new(Duration::from_secs(seconds));
    }
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> QueryCache {
        return QueryCache {
            entries: DashMap::new(),
            in_flight: DashMap::new(),
            generations: DashMap::new(),
            stale_time,
        };
    }

    fn generation(&self, key: &QueryKey) -> u64 {
        return self.generations.get(key).map(|e| return *e).unwrap_or(0);
    }

    fn bump(&self, key: &QueryKey) {
        *self.generations.entry(key.clone()).or_insert(0) += 1;
    }

    fn downcast<T: Send + Sync + 'static>(key: &QueryKey, value: CachedValue) -> Result<Arc<T>> {
        return value.downcast::<T>().map_err(|_| {
            return ApiError::Decode(format!("cached value for {key} has an unexpected type"))
                .into();
        });
    }

    fn fresh<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        if self.is_stale(key) {
            return None;
        }

        return self.get::<T>(key);
    }

    /// Returns cached data for `key` when it is fresh, otherwise runs
    /// `fetcher`. Concurrent callers for the same key share one request. The
    /// result is discarded for a caller whose `cancel` token fires first, and
    /// is never written when the key changed while the request was in flight.
    /// A failed fetch leaves previously cached data untouched.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: &QueryKey,
        cancel: &CancellationToken,
        fetcher: F,
    ) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if let Some(value) = self.fresh::<T>(key) {
            tracing::debug!(key = %key, "Cache hit");
            return Ok(value);
        }

        let generation = self.generation(key);
        let fetch = self
            .in_flight
            .entry(key.clone())
            .or_insert_with(|| {
                tracing::debug!(key = %key, "Cache miss, fetching");
                let fut = fetcher();
                return async move {
                    let value = fut.await.map_err(ApiError::from)?;
                    return Ok(Arc::new(value) as CachedValue);
                }
                .boxed()
                .shared();
            })
            .clone();

        let res = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            res = fetch.clone() => Some(res),
        };

        let res = match res {
            Some(res) => res,
            None => {
                // The map and this caller are the last holders, nobody else
                // waits on the request.
                let abandoned = self.in_flight.remove_if(key, |_, current| {
                    return current.ptr_eq(&fetch) && current.strong_count() <= Some(2);
                });
                tracing::debug!(
                    key = %key,
                    abandoned = abandoned.is_some(),
                    "Fetch cancelled, discarding result"
                );
                return Err(ApiError::Cancelled.into());
            }
        };

        self.in_flight
            .remove_if(key, |_, current| return current.ptr_eq(&fetch));

        let value = res?;
        if generation == self.generation(key) {
            self.entries.insert(
                key.clone(),
                Entry {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                    stale: false,
                },
            );
        } else {
            tracing::debug!(key = %key, "Key changed during fetch, discarding result");
        }

        return QueryCache::downcast::<T>(key, value);
    }

    /// Cached data for `key`, stale or not.
    pub fn get<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let entry = self.entries.get(key)?;
        return entry.value.clone().downcast::<T>().ok();
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        return self
            .entries
            .get(key)
            .map(|entry| return entry.stale || entry.fetched_at.elapsed() >= self.stale_time)
            .unwrap_or(true);
    }

    /// Injects a known-correct value.
    pub fn set<T: Send + Sync + 'static>(&self, key: &QueryKey, value: T) {
        self.set_arc(key, Arc::new(value));
    }

    fn set_arc(&self, key: &QueryKey, value: CachedValue) {
        self.bump(key);
        self.entries.insert(
            key.clone(),
            Entry {
                value,
                fetched_at: Instant::now(),
                stale: false,
            },
        );
    }

    /// Replaces the value for `key` with `f(current)` and returns the value it
    /// replaced.
    pub fn update<T, F>(&self, key: &QueryKey, f: F) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce(Option<&T>) -> T,
    {
        let previous = self.get::<T>(key);
        let next = f(previous.as_deref());
        self.set(key, next);
        return previous;
    }

    /// Puts back a value captured earlier, or clears the key when there was
    /// none.
    pub fn restore<T: Send + Sync + 'static>(&self, key: &QueryKey, snapshot: Option<Arc<T>>) {
        match snapshot {
            Some(value) => self.set_arc(key, value),
            None => {
                self.bump(key);
                self.entries.remove(key);
            }
        }
    }

    fn forget_in_flight(&self, prefix: &QueryKey) -> Vec<QueryKey> {
        let keys = self
            .in_flight
            .iter()
            .filter(|e| return e.key().starts_with(prefix))
            .map(|e| return e.key().clone())
            .collect::<Vec<QueryKey>>();

        for key in keys.iter() {
            self.in_flight.remove(key);
        }

        return keys;
    }

    /// Marks every key under `prefix` stale so the next read refetches.
    pub fn invalidate(&self, prefix: &QueryKey) {
        let mut keys = self.forget_in_flight(prefix);
        for mut entry in self.entries.iter_mut() {
            if entry.key().starts_with(prefix) {
                entry.stale = true;
                keys.push(entry.key().clone());
            }
        }

        tracing::debug!(prefix = %prefix, count = keys.len(), "Invalidated");
        for key in keys.iter() {
            self.bump(key);
        }
    }

    /// Drops every key under `prefix`.
    pub fn remove(&self, prefix: &QueryKey) {
        let mut keys = self.forget_in_flight(prefix);
        self.entries.retain(|key, _| {
            if key.starts_with(prefix) {
                keys.push(key.clone());
                return false;
            }
            return true;
        });

        for key in keys.iter() {
            self.bump(key);
        }
    }
}
