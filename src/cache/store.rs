//! Cached response storage with per-entry expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use http_body_util::BodyExt;
use thiserror::Error;
use tokio::sync::RwLock;

/// Namespace prefix for global-feed entries.
pub const FEED_NAMESPACE: &str = "feed";

/// Cache key for a feed page request: fixed namespace plus the raw `page`
/// query parameter.
pub fn feed_key(page: Option<&str>) -> String {
    format!("{FEED_NAMESPACE}:{}", page.unwrap_or(""))
}

/// Keyed store of buffered responses, each with its own deadline.
///
/// Two concurrent misses for the same key may both compute and both store;
/// the overwrite is idempotent, so no extra coordination is needed.
#[derive(Clone, Default)]
pub struct PageCache {
    entries: Arc<RwLock<HashMap<String, StoredPage>>>,
}

struct StoredPage {
    page: CachedPage,
    expires_at: Instant,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a live entry. Expired entries are treated as absent; the next
    /// store overwrites them.
    pub async fn get(&self, key: &str) -> Option<Response> {
        let guard = self.entries.read().await;
        let stored = guard.get(key)?;
        if Instant::now() >= stored.expires_at {
            return None;
        }
        Some(stored.page.clone().into_response())
    }

    pub async fn put(&self, key: String, page: CachedPage, ttl: Duration) {
        let mut guard = self.entries.write().await;
        guard.insert(
            key,
            StoredPage {
                page,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Buffer `response`, store it under `key`, and hand back an equivalent
    /// response. On buffering failure the rebuilt response is returned
    /// uncached: serving the page always wins over caching it.
    pub async fn store_response(
        &self,
        key: &str,
        response: Response,
        ttl: Duration,
    ) -> Result<Response, (Response, CacheStoreError)> {
        match buffer_response(response).await {
            Ok((rebuilt, cached)) => {
                self.put(key.to_string(), cached, ttl).await;
                Ok(rebuilt)
            }
            Err((rebuilt, error)) => Err((rebuilt, error)),
        }
    }

    /// Drop every entry immediately, regardless of remaining TTL.
    pub async fn invalidate_all(&self) {
        let mut guard = self.entries.write().await;
        guard.clear();
    }
}

/// A buffered response ready to be replayed byte-for-byte.
#[derive(Clone)]
pub struct CachedPage {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
}

impl CachedPage {
    pub fn new(status: StatusCode, headers: &axum::http::HeaderMap, body: Bytes) -> Self {
        let mut stored_headers = Vec::with_capacity(headers.len());
        for (name, value) in headers.iter() {
            stored_headers.push((name.clone(), value.clone()));
        }

        Self {
            status,
            headers: stored_headers,
            body,
        }
    }

    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        headers.clear();
        for (name, value) in self.headers {
            headers.append(name, value);
        }

        response
    }
}

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("failed to buffer response body: {0}")]
    Buffer(String),
}

/// Whether a response is safe to replay to other viewers.
pub fn should_store_response(response: &Response) -> bool {
    if !response.status().is_success() {
        return false;
    }

    if response.headers().contains_key(header::SET_COOKIE) {
        return false;
    }

    true
}

pub(crate) async fn buffer_response(
    response: Response,
) -> Result<(Response, CachedPage), (Response, CacheStoreError)> {
    let (parts, body) = response.into_parts();
    match BodyExt::collect(body).await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            let cached = CachedPage::new(parts.status, &parts.headers, bytes.clone());
            let rebuilt = Response::from_parts(parts, Body::from(bytes));
            Ok((rebuilt, cached))
        }
        Err(error) => {
            let rebuilt = Response::from_parts(parts, Body::empty());
            Err((rebuilt, CacheStoreError::Buffer(error.to_string())))
        }
    }
}
