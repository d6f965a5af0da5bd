//! # Pagination Cursor Engine
//!
//! Every search backend endpoint answers with a page of items plus an optional
//! `next_page_url`. The engine here turns "fetch a page, follow the link, repeat" into a
//! lazy stream.
//!
//! ## Semantics
//!
//! * Pages are fetched strictly in order, one at a time, and each link is followed exactly
//!   once. An empty or absent `next_page_url` ends the run.
//! * There is no page ceiling and no deduplication. A backend that always hands out a next
//!   link keeps the run going forever; callers that need a bound must `take` it themselves.
//! * A failed fetch does **not** abort with an error. It ends the run with a final
//!   [`PageEvent::Truncated`] carrying the failure, so everything fetched before it is still
//!   delivered. [`items`] logs that event and drops it.
use crate::error::SearchError;
use futures_util::future::BoxFuture;
use futures_util::stream::{self, BoxStream, StreamExt};
use tracing::warn;

/// One fetched page: the items it carried and the link to the next page, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct PageEnvelope<T> {
    pub items: Vec<T>,
    pub next_page_url: Option<String>,
}

/// A pending page fetch.
pub type PageFuture<'a, T> = BoxFuture<'a, Result<PageEnvelope<T>, SearchError>>;

/// What a pagination run produced at each step.
#[derive(Debug)]
pub enum PageEvent<T> {
    /// A page was fetched; these are its items in backend order.
    Page(Vec<T>),
    /// A page fetch failed. Always the last event of a run.
    Truncated(SearchError),
}

/// Runs a pagination sequence starting with `first`, fetching every following page with
/// `fetch_next(next_page_url)`.
///
/// The first page is passed in as a future rather than a URL because not every run starts
/// with a plain GET (a search starts with a POST and continues with GETs).
pub fn paginate<'a, T, F>(first: PageFuture<'a, T>, fetch_next: F) -> BoxStream<'a, PageEvent<T>>
where
    T: Send + 'a,
    F: FnMut(String) -> PageFuture<'a, T> + Send + 'a,
{
    stream::unfold(Some((first, fetch_next)), |state| async move {
        let (pending, mut fetch_next) = state?;

        match pending.await {
            Ok(PageEnvelope {
                items,
                next_page_url,
            }) => {
                let follow = match next_page_url.filter(|url| !url.is_empty()) {
                    Some(url) => Some((fetch_next(url), fetch_next)),
                    None => None,
                };

                Some((PageEvent::Page(items), follow))
            }
            Err(err) => Some((PageEvent::Truncated(err), None)),
        }
    })
    .boxed()
}

/// Flattens a pagination run into its items.
///
/// A [`PageEvent::Truncated`] is logged and ends the sequence, so a consumer cannot tell a
/// truncated run from an exhausted one by looking at the items alone.
pub fn items<'a, T>(pages: BoxStream<'a, PageEvent<T>>) -> BoxStream<'a, T>
where
    T: Send + 'a,
{
    pages
        .flat_map(|event| {
            let items = match event {
                PageEvent::Page(items) => items,
                PageEvent::Truncated(err) => {
                    warn!(error = %err, "page fetch failed, returning partial results");
                    Vec::new()
                }
            };
            stream::iter(items)
        })
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Pages = HashMap<&'static str, Option<PageEnvelope<u32>>>;

    fn page(items: &[u32], next: Option<&str>) -> Option<PageEnvelope<u32>> {
        Some(PageEnvelope {
            items: items.to_vec(),
            next_page_url: next.map(str::to_string),
        })
    }

    fn decode_failure(url: &str) -> SearchError {
        SearchError::Decode {
            url: url.to_string(),
            source: serde_json::from_str::<u32>("not json").unwrap_err(),
        }
    }

    /// Serves pages out of a map, `None` entries fail, and records every requested URL.
    fn fetcher(
        pages: Pages,
        requested: Arc<Mutex<Vec<String>>>,
    ) -> impl FnMut(String) -> PageFuture<'static, u32> + Send + 'static {
        move |url: String| {
            let requested = requested.clone();
            let result = match pages.get(url.as_str()) {
                Some(Some(page)) => Ok(page.clone()),
                _ => Err(decode_failure(&url)),
            };
            Box::pin(async move {
                requested.lock().unwrap().push(url);
                result
            })
        }
    }

    fn run(
        pages: Pages,
        start: &str,
    ) -> (BoxStream<'static, PageEvent<u32>>, Arc<Mutex<Vec<String>>>) {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let mut fetch = fetcher(pages, requested.clone());
        let first = fetch(start.to_string());
        (paginate(first, fetch), requested)
    }

    #[tokio::test]
    async fn test_yields_all_pages_in_order() {
        let pages = Pages::from([
            ("p1", page(&[1, 2], Some("p2"))),
            ("p2", page(&[3], Some("p3"))),
            ("p3", page(&[4, 5], Some(""))),
        ]);

        let (stream, requested) = run(pages, "p1");
        let collected: Vec<u32> = items(stream).collect().await;

        assert_eq!(collected, vec![1, 2, 3, 4, 5]);
        assert_eq!(*requested.lock().unwrap(), vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn test_absent_next_page_ends_run() {
        let pages = Pages::from([("only", page(&[7], None))]);

        let (stream, requested) = run(pages, "only");
        let events: Vec<_> = stream.collect().await;

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], PageEvent::Page(items) if items == &vec![7]));
        assert_eq!(requested.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_truncates_sequence() {
        let pages = Pages::from([
            ("p1", page(&[1], Some("p2"))),
            ("p2", page(&[2], Some("p3"))),
            ("p3", None),
            ("p4", page(&[4], None)),
        ]);

        let (stream, requested) = run(pages, "p1");
        let events: Vec<_> = stream.collect().await;

        assert_eq!(events.len(), 3);
        assert!(matches!(events[2], PageEvent::Truncated(SearchError::Decode { .. })));
        // Nothing after the failed page is ever requested.
        assert_eq!(*requested.lock().unwrap(), vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn test_items_keep_pages_before_failure() {
        let pages = Pages::from([("p1", page(&[1, 2], Some("p2"))), ("p2", None)]);

        let (stream, _) = run(pages, "p1");
        let collected: Vec<u32> = items(stream).collect().await;

        assert_eq!(collected, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_failed_first_page_yields_nothing() {
        let (stream, _) = run(Pages::new(), "missing");
        let collected: Vec<u32> = items(stream).collect().await;

        assert!(collected.is_empty());
    }

    #[tokio::test]
    async fn test_empty_pages_are_followed() {
        let pages = Pages::from([
            ("p1", page(&[], Some("p2"))),
            ("p2", page(&[], Some("p3"))),
            ("p3", page(&[9], None)),
        ]);

        let (stream, _) = run(pages, "p1");
        let collected: Vec<u32> = items(stream).collect().await;

        assert_eq!(collected, vec![9]);
    }

    #[tokio::test]
    async fn test_endless_backend_can_be_bounded_by_caller() {
        let pages = Pages::from([("loop", page(&[1], Some("loop")))]);

        let (stream, requested) = run(pages, "loop");
        let collected: Vec<u32> = items(stream).take(5).collect().await;

        assert_eq!(collected, vec![1; 5]);
        assert_eq!(requested.lock().unwrap().len(), 5);
    }
}
