//! Page cache middleware for the global feed route.

use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::Response,
};
use metrics::counter;
use tracing::{debug, warn};

use super::store::{PageCache, feed_key, should_store_response};

/// Shared state for the page-cache middleware.
#[derive(Clone)]
pub struct CacheState {
    pub cache: PageCache,
    pub ttl: Duration,
}

/// Serve the global feed from the page cache, populating it on miss.
///
/// Entries live for the configured TTL regardless of intervening writes.
/// A response that fails to buffer is served fresh and left uncached.
pub async fn page_cache_layer(
    State(state): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let page = page_parameter(request.uri().query().unwrap_or(""));
    let key = feed_key(page.as_deref());

    if let Some(cached) = state.cache.get(&key).await {
        counter!("brusio_page_cache_hit_total").increment(1);
        debug!(target = "brusio::cache", key = %key, "serving cached page");
        return cached;
    }
    counter!("brusio_page_cache_miss_total").increment(1);

    let response = next.run(request).await;
    if !should_store_response(&response) {
        return response;
    }

    match state.cache.store_response(&key, response, state.ttl).await {
        Ok(stored) => {
            counter!("brusio_page_cache_store_total").increment(1);
            stored
        }
        Err((rebuilt, error)) => {
            warn!(
                target = "brusio::cache",
                key = %key,
                error = %error,
                "failed to buffer response for caching"
            );
            rebuilt
        }
    }
}

fn page_parameter(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == "page")
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_parameter_is_extracted_from_query() {
        assert_eq!(page_parameter("page=3"), Some("3".to_string()));
        assert_eq!(page_parameter("a=1&page=2&b=3"), Some("2".to_string()));
        assert_eq!(page_parameter(""), None);
        assert_eq!(page_parameter("other=1"), None);
    }
}
