//! Memoized api results.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::OnceCell;

use crate::error::ApiError;
use crate::lock;

/// Caches successful results by key for the lifetime of the page.
///
/// Concurrent callers for the same key share one fetch. Failures are never
/// stored, so the next call retries.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<Value>>>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<Value, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ApiError>>,
    {
        let cell = {
            let mut entries = lock(&self.entries);
            Arc::clone(entries.entry(key.to_string()).or_default())
        };

        cell.get_or_try_init(fetch).await.cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.entries)
            .get(key)
            .is_some_and(|cell| cell.initialized())
    }

    pub fn invalidate(&self, key: &str) {
        lock(&self.entries).remove(key);
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_success_is_cached() {
        let cache = ResponseCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_fetch("SectionList", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!(["goals", "income"]))
                })
                .await
                .unwrap();
            assert_eq!(value, json!(["goals", "income"]));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains("SectionList"));
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cache = ResponseCache::new();

        let first = cache
            .get_or_fetch("SectionList", || async {
                Err(ApiError::Transport(TransportError::Network("down".into())))
            })
            .await;
        assert!(first.is_err());
        assert!(!cache.contains("SectionList"));

        let second = cache
            .get_or_fetch("SectionList", || async { Ok(json!([])) })
            .await;
        assert_eq!(second.unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_invalidate_refetches() {
        let cache = ResponseCache::new();
        cache
            .get_or_fetch("k", || async { Ok(json!(1)) })
            .await
            .unwrap();
        cache.invalidate("k");

        let value = cache
            .get_or_fetch("k", || async { Ok(json!(2)) })
            .await
            .unwrap();
        assert_eq!(value, json!(2));
    }
}
