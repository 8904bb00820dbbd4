use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{DocumentStore, Query, StoreError};
use crate::document::{Document, DocumentId};

/// Wraps a store so every call fails with [`StoreError::Timeout`] once
/// `limit` elapses.
#[derive(Debug)]
pub struct TimeoutStore<S> {
    inner: S,
    limit: Duration,
}

impl<S> TimeoutStore<S> {
    pub fn new(inner: S, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(limit_ms = self.limit.as_millis() as u64, "store call timed out");
                Err(StoreError::Timeout(self.limit))
            }
        }
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for TimeoutStore<S> {
    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.bounded(self.inner.find(collection, query)).await
    }

    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        self.bounded(self.inner.get(collection, id)).await
    }

    async fn insert(
        &self,
        collection: &str,
        content: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        self.bounded(self.inner.insert(collection, content)).await
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError> {
        self.bounded(self.inner.delete(collection, id)).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.bounded(self.inner.ping()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    /// Delays every `find` by a fixed amount.
    struct SlowStore {
        inner: MemoryStore,
        delay: Duration,
    }

    #[async_trait]
    impl DocumentStore for SlowStore {
        async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
            tokio::time::sleep(self.delay).await;
            self.inner.find(collection, query).await
        }

        async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
            self.inner.get(collection, id).await
        }

        async fn insert(
            &self,
            collection: &str,
            content: Map<String, Value>,
        ) -> Result<Document, StoreError> {
            self.inner.insert(collection, content).await
        }

        async fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError> {
            self.inner.delete(collection, id).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_calls_time_out() {
        let store = TimeoutStore::new(
            SlowStore {
                inner: MemoryStore::new(),
                delay: Duration::from_secs(10),
            },
            Duration::from_millis(50),
        );
        let err = store.find("blogs", &Query::all()).await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout(d) if d == Duration::from_millis(50)));
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn fast_calls_pass_through() {
        let store = TimeoutStore::new(
            SlowStore {
                inner: MemoryStore::new(),
                delay: Duration::from_millis(5),
            },
            Duration::from_secs(1),
        );
        assert!(store.find("blogs", &Query::all()).await.unwrap().is_empty());
    }
}
