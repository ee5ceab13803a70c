//! Offset pagination and bounded fan-out for record-level APIs.
//!
//! Record APIs page with `$limit`/`$offset`. The [`Paginator`] walks pages
//! sequentially until a short or empty page; [`fan_out`] runs a batch of
//! sub-requests with a small concurrency cap and joins them all.

use crate::error::CollectError;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::pin::Pin;

/// Type alias for the page fetch function: `(offset, limit) -> items`.
pub type FetchPageFn<'a, T> = Box<
    dyn Fn(usize, usize) -> Pin<Box<dyn Future<Output = Result<Vec<T>, CollectError>> + Send + 'a>>
        + Send
        + Sync
        + 'a,
>;

/// Configuration for pagination behavior.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// Records requested per page
    pub page_size: usize,
    /// Maximum number of pages to fetch
    pub max_pages: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: 10000,
            max_pages: 100,
        }
    }
}

/// Sequential `$limit`/`$offset` paginator.
pub struct Paginator<'a, T> {
    config: PaginationConfig,
    fetch_fn: FetchPageFn<'a, T>,
}

impl<'a, T> Paginator<'a, T> {
    pub fn new<F>(config: PaginationConfig, fetch_fn: F) -> Self
    where
        F: Fn(usize, usize) -> Pin<Box<dyn Future<Output = Result<Vec<T>, CollectError>> + Send + 'a>>
            + Send
            + Sync
            + 'a,
    {
        Self {
            config,
            fetch_fn: Box::new(fetch_fn),
        }
    }

    /// Collects all items from all pages.
    pub async fn collect_all(&self) -> Result<Vec<T>, CollectError> {
        let limit = self.config.page_size.max(1);
        let mut all_items = Vec::new();

        for page in 0..self.config.max_pages {
            let page_items = (self.fetch_fn)(page * limit, limit).await?;
            let count = page_items.len();
            all_items.extend(page_items);

            // A short page is the last one
            if count < limit {
                return Ok(all_items);
            }
        }

        tracing::warn!(
            max_pages = self.config.max_pages,
            items = all_items.len(),
            "Stopped paginating at page limit"
        );
        Ok(all_items)
    }
}

/// Runs `call` over `items` with at most `limit` calls in flight.
///
/// Results keep input order. Calls are not retried here; the fetcher already
/// retries each request once. The first error fails the whole fan-out, after
/// every call has finished.
pub async fn fan_out<I, T, F, Fut>(items: Vec<I>, limit: usize, call: F) -> Result<Vec<T>, CollectError>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T, CollectError>>,
{
    let results: Vec<Result<T, CollectError>> = stream::iter(items)
        .map(call)
        .buffered(limit.max(1))
        .collect()
        .await;

    results.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn numbered(offset: usize, limit: usize, total: usize) -> Vec<usize> {
        (offset..(offset + limit).min(total)).collect()
    }

    #[tokio::test]
    async fn test_paginator_stops_on_short_page() {
        let offsets = Arc::new(Mutex::new(Vec::new()));
        let seen = offsets.clone();

        let paginator = Paginator::new(
            PaginationConfig {
                page_size: 2,
                max_pages: 10,
            },
            move |offset, limit| {
                seen.lock().unwrap().push(offset);
                Box::pin(async move { Ok(numbered(offset, limit, 5)) })
            },
        );

        let items = paginator.collect_all().await.unwrap();

        assert_eq!(items, vec![0, 1, 2, 3, 4]);
        assert_eq!(*offsets.lock().unwrap(), vec![0, 2, 4]);
    }

    #[tokio::test]
    async fn test_paginator_exact_multiple_needs_empty_page() {
        let paginator = Paginator::new(
            PaginationConfig {
                page_size: 2,
                max_pages: 10,
            },
            |offset, limit| Box::pin(async move { Ok(numbered(offset, limit, 4)) }),
        );

        assert_eq!(paginator.collect_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_paginator_respects_max_pages() {
        let paginator = Paginator::new(
            PaginationConfig {
                page_size: 1,
                max_pages: 3,
            },
            |offset, _| Box::pin(async move { Ok(vec![offset]) }),
        );

        assert_eq!(paginator.collect_all().await.unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_paginator_propagates_errors() {
        let paginator: Paginator<'_, usize> = Paginator::new(PaginationConfig::default(), |_, _| {
            Box::pin(async { Err(CollectError::structure("bad page")) })
        });

        assert!(paginator.collect_all().await.is_err());
    }

    #[tokio::test]
    async fn test_fan_out_caps_concurrency_and_keeps_order() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = fan_out((0..10).collect(), 3, |n: usize| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(n * 10)
            }
        })
        .await
        .unwrap();

        assert_eq!(results, (0..10).map(|n| n * 10).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_fan_out_does_not_retry_failed_calls() {
        let attempts = Arc::new(AtomicUsize::new(0));

        let result: Result<Vec<i32>, _> = fan_out(vec![1, 2], 2, |n: i32| {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                if n == 1 {
                    Err(CollectError::TransientNetwork("reset".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert!(matches!(result, Err(CollectError::TransientNetwork(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
