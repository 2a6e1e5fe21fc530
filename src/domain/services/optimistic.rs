#[cfg(test)]
#[path = "optimistic_test.rs"]
mod tests;

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;

use super::QueryCache;
use crate::domain::models::QueryKey;

/// A speculative cache write that can be undone. Holds the value the key had
/// before the write.
pub struct OptimisticUpdate<'a, T: Send + Sync + 'static> {
    cache: &'a QueryCache,
    key: QueryKey,
    snapshot: Option<Arc<T>>,
}

impl<'a, T: Send + Sync + 'static> OptimisticUpdate<'a, T> {
    pub fn apply<F>(cache: &'a QueryCache, key: &QueryKey, speculate: F) -> OptimisticUpdate<'a, T>
    where
        F: FnOnce(Option<&T>) -> T,
    {
        let snapshot = cache.update(key, speculate);
        tracing::debug!(key = %key, "Applied optimistic update");

        return OptimisticUpdate {
            cache,
            key: key.clone(),
            snapshot,
        };
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Option<&T> {
        return self.snapshot.as_deref();
    }

    /// Puts the pre-image back, or drops the key if there was none.
    pub fn rollback(self) {
        tracing::debug!(key = %self.key, "Rolling back optimistic update");
        self.cache.restore(&self.key, self.snapshot);
    }

    /// Keeps whatever the key holds now.
    pub fn commit(self) {}
}

/// Runs `operation` after applying `speculate` to `key`, rolling the key back
/// when the operation fails.
pub async fn with_optimistic<T, R, F, Op, Fut>(
    cache: &QueryCache,
    key: &QueryKey,
    speculate: F,
    operation: Op,
) -> Result<R>
where
    T: Send + Sync + 'static,
    F: FnOnce(Option<&T>) -> T,
    Op: FnOnce() -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let update = OptimisticUpdate::apply(cache, key, speculate);
    match operation().await {
        Ok(res) => {
            update.commit();
            return Ok(res);
        }
        Err(err) => {
            update.rollback();
            return Err(err);
        }
    }
}
