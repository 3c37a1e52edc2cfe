use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Time-bounded memo of a single value.
///
/// A read returns a value at most `ttl` old; `force_invalidate` drops it
/// immediately. Fetches are serialized behind the lock so concurrent callers
/// share one upstream read.
#[derive(Clone)]
pub struct TtlCache<T> {
    slot: Arc<Mutex<Option<CacheEntry<T>>>>,
    ttl: Duration,
}

struct CacheEntry<T> {
    value: T,
    fetched_at: Instant,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            ttl,
        }
    }

    /// Return the cached value if still fresh, otherwise run `fetch` and
    /// remember its result. Errors are passed through and not cached.
    pub async fn get_or_try_fetch<F, Fut, E>(&self, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(entry) = slot.as_ref() {
            if entry.fetched_at.elapsed() < self.ttl {
                return Ok(entry.value.clone());
            }
        }

        let value = fetch().await?;
        *slot = Some(CacheEntry {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        Ok(value)
    }

    /// The cached value, if present and fresh.
    #[cfg(test)]
    pub async fn peek(&self) -> Option<T> {
        let slot = self.slot.lock().await;
        slot.as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub async fn force_invalidate(&self) {
        self.slot.lock().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn fetch_counted(calls: &AtomicUsize) -> Result<usize, String> {
        Ok(calls.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_value_is_reused() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_try_fetch(|| fetch_counted(&calls)).await.unwrap();
        tokio::time::advance(Duration::from_secs(59)).await;
        let second = cache.get_or_try_fetch(|| fetch_counted(&calls)).await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_value_is_refetched() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        cache.get_or_try_fetch(|| fetch_counted(&calls)).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.peek().await, None);
        let value = cache.get_or_try_fetch(|| fetch_counted(&calls)).await.unwrap();

        assert_eq!(value, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_invalidate_drops_value() {
        let cache = TtlCache::new(Duration::from_secs(600));
        let calls = AtomicUsize::new(0);

        cache.get_or_try_fetch(|| fetch_counted(&calls)).await.unwrap();
        assert_eq!(cache.peek().await, Some(1));
        cache.force_invalidate().await;
        assert_eq!(cache.peek().await, None);

        let value = cache.get_or_try_fetch(|| fetch_counted(&calls)).await.unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_fetch() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let slow_read = move || async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            fetch_counted(calls).await
        };

        let (first, second) = tokio::join!(
            cache.get_or_try_fetch(slow_read),
            cache.get_or_try_fetch(slow_read),
        );

        assert_eq!(first, Ok(1));
        assert_eq!(second, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache: TtlCache<usize> = TtlCache::new(Duration::from_secs(60));

        let failed = cache
            .get_or_try_fetch(|| async { Err::<usize, _>("store down".to_string()) })
            .await;
        assert!(failed.is_err());
        assert_eq!(cache.peek().await, None);

        let ok = cache.get_or_try_fetch(|| async { Ok::<_, String>(7) }).await;
        assert_eq!(ok, Ok(7));
    }
}
