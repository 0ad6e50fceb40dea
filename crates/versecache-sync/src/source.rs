//! Source abstraction for the remote corpus document.
//!
//! A source turns a URL into the raw bytes of the published document.
//! Implementations may use HTTP or anything else that can answer a URL.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FetchError;

/// Fetches the remote document.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Source: Send + Sync {
    /// Fetch the complete document published at `url`.
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

#[async_trait]
impl<R: Source + ?Sized> Source for Arc<R> {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        (**self).fetch(url).await
    }
}

/// A canned in-memory source for testing.
///
/// Serves a fixed document or failure per URL, optionally after a delay.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::RwLock;

    #[derive(Debug, Clone)]
    enum Response {
        Document(Bytes),
        Failure(FetchError),
    }

    /// In-memory source implementation.
    #[derive(Default)]
    pub struct MemorySource {
        responses: RwLock<HashMap<String, Response>>,
        latency: RwLock<Option<Duration>>,
        fetches: AtomicUsize,
    }

    impl MemorySource {
        /// Create a source that knows no URLs.
        pub fn new() -> Self {
            Self::default()
        }

        /// Publish a document at `url`, replacing whatever was there.
        pub async fn publish(&self, url: &str, body: impl Into<Bytes>) {
            self.responses
                .write()
                .await
                .insert(url.to_string(), Response::Document(body.into()));
        }

        /// Publish the JSON form of a value at `url`.
        pub async fn publish_json<T: serde::Serialize>(
            &self,
            url: &str,
            value: &T,
        ) -> serde_json::Result<()> {
            let body = serde_json::to_vec(value)?;
            self.publish(url, body).await;
            Ok(())
        }

        /// Make every fetch of `url` fail with `error`.
        pub async fn fail(&self, url: &str, error: FetchError) {
            self.responses
                .write()
                .await
                .insert(url.to_string(), Response::Failure(error));
        }

        /// Delay every subsequent fetch.
        pub async fn set_latency(&self, latency: Option<Duration>) {
            *self.latency.write().await = latency;
        }

        /// Number of fetches served so far, failures included.
        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Source for MemorySource {
        async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);

            let latency = *self.latency.read().await;
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            match self.responses.read().await.get(url) {
                Some(Response::Document(body)) => Ok(body.clone()),
                Some(Response::Failure(error)) => Err(error.clone()),
                None => Err(FetchError::NotFound(url.to_string())),
            }
        }
    }
}
