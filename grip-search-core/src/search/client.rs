//! # Search Client
//!
//! Typed access to a GA4GH Search backend. Every operation that can span several pages
//! runs through [`crate::pagination`], so a failing page truncates the result instead of
//! failing it.
//!
//! ## Endpoints
//!
//! * `GET  {base}tables` - paginated list of [`CollectionDescriptor`].
//! * `GET  {data_model.$ref}` - the [`SchemaDocument`] of one table.
//! * `GET  {base}table/{name}/data` - paginated rows of one table.
//! * `POST {base}search` - paginated rows matching a [`SearchQuery`].
use super::types::{
    CollectionDescriptor, Paged, QueryResult, Record, SchemaDocument, SchemaResponse, SearchQuery,
    TablesResponse,
};
use crate::error::SearchError;
use crate::pagination::{self, PageEvent, PageFuture};
use futures_util::stream::{BoxStream, StreamExt};
use reqwest::RequestBuilder;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};
use url::Url;

/// Capacity of the queue between the page-fetching task of [`SearchClient::stream_rows`]
/// and its consumer. Once full, the producer waits for the consumer to catch up.
pub const ROW_QUEUE_CAPACITY: usize = 100;

/// Client for a GA4GH Search REST API rooted at a base URL.
#[derive(Debug, Clone)]
pub struct SearchClient {
    base_url: Url,
    http: reqwest::Client,
}

impl SearchClient {
    /// Creates a client for the backend at `base_url`.
    ///
    /// The URL is treated as a directory: `http://host/api` and `http://host/api/` both
    /// resolve `tables` to `http://host/api/tables`.
    pub fn new(base_url: &str) -> Result<Self, SearchError> {
        let mut url = Url::parse(base_url)
            .map_err(|e| SearchError::InvalidBaseUrl(base_url.to_string(), e.to_string()))?;

        if url.cannot_be_a_base() {
            return Err(SearchError::InvalidBaseUrl(
                base_url.to_string(),
                "URL cannot be used as a base".to_string(),
            ));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            base_url: url,
            http: reqwest::Client::new(),
        })
    }

    /// The normalized base URL, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Lists every table the backend exposes, following pagination.
    pub fn list_collections(&self) -> BoxStream<'static, CollectionDescriptor> {
        let url = self.endpoint(&["tables"]);
        pagination::items(self.get_pages::<TablesResponse>(url.to_string()))
    }

    /// Fetches the schema a table descriptor links to. Not paginated.
    pub async fn get_schema(
        &self,
        descriptor: &CollectionDescriptor,
    ) -> Result<SchemaDocument, SearchError> {
        let response: SchemaResponse =
            send(self.http.get(&descriptor.data_model.reference)).await?;
        Ok(response.into())
    }

    /// Streams every row of `collection` in backend order.
    ///
    /// Pages are fetched by a background task that pushes rows into a queue of
    /// [`ROW_QUEUE_CAPACITY`] entries. The queue closes when the task ends, whether the
    /// backend ran out of pages, a page failed, or the returned stream was dropped.
    pub fn stream_rows(&self, collection: &str) -> ReceiverStream<Record> {
        let (tx, rx) = mpsc::channel(ROW_QUEUE_CAPACITY);
        let url = self.endpoint(&["table", collection, "data"]);
        let mut rows = pagination::items(self.get_pages::<QueryResult>(url.to_string()));
        let collection = collection.to_string();

        tokio::spawn(async move {
            while let Some(row) = rows.next().await {
                if tx.send(row).await.is_err() {
                    debug!(%collection, "row consumer went away, stopping scan");
                    return;
                }
            }
            debug!(%collection, "row scan finished");
        });

        ReceiverStream::new(rx)
    }

    /// Finds the single row of `collection` whose `id_field` equals `id`.
    ///
    /// Search results are paged until one page carries at least one row. A page with more
    /// than one row is an [`SearchError::AmbiguousMatch`]; running out of pages is
    /// [`SearchError::NotFound`]. A page that cannot be fetched or decoded ends the results
    /// like a final empty page would, so a failure before any row is found is also
    /// `NotFound`.
    pub async fn lookup_row(
        &self,
        collection: &str,
        id_field: &str,
        id: &str,
    ) -> Result<Record, SearchError> {
        let query = SearchQuery::field_equals(collection, id_field, id);
        debug!(query = %query.query, %id, "searching");

        let url = self.endpoint(&["search"]);
        let first = page_future::<QueryResult>(self.http.post(url).json(&query));
        let mut pages = pagination::paginate(first, self.page_fetcher::<QueryResult>());

        while let Some(event) = pages.next().await {
            let rows = match event {
                PageEvent::Page(rows) => rows,
                PageEvent::Truncated(err) => {
                    warn!(%collection, %id, error = %err, "lookup results truncated");
                    break;
                }
            };

            let count = rows.len();
            let mut rows = rows.into_iter();
            match (rows.next(), count) {
                (None, _) => continue,
                (Some(row), 1) => return Ok(row),
                (Some(_), count) => {
                    return Err(SearchError::AmbiguousMatch {
                        collection: collection.to_string(),
                        field: id_field.to_string(),
                        id: id.to_string(),
                        count,
                    });
                }
            }
        }

        Err(SearchError::NotFound {
            collection: collection.to_string(),
            field: id_field.to_string(),
            id: id.to_string(),
        })
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects URLs that cannot be a base, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get_pages<P>(&self, start: String) -> BoxStream<'static, PageEvent<P::Item>>
    where
        P: Paged + DeserializeOwned + Send + 'static,
        P::Item: Send + 'static,
    {
        let mut fetch = self.page_fetcher::<P>();
        let first = fetch(start);
        pagination::paginate(first, fetch)
    }

    /// A fetch function that GETs a page URL and decodes it as `P`.
    fn page_fetcher<P>(
        &self,
    ) -> impl FnMut(String) -> PageFuture<'static, P::Item> + Send + use<P>
    where
        P: Paged + DeserializeOwned + Send + 'static,
        P::Item: Send + 'static,
    {
        let http = self.http.clone();
        move |url: String| page_future::<P>(http.get(url))
    }
}

fn page_future<P>(request: RequestBuilder) -> PageFuture<'static, P::Item>
where
    P: Paged + DeserializeOwned + Send + 'static,
    P::Item: Send + 'static,
{
    Box::pin(async move {
        let response: P = send(request).await?;
        Ok(response.into_page())
    })
}

/// Sends a request and decodes its JSON body. Non-2xx answers are fetch errors.
async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, SearchError> {
    let response = request
        .header(ACCEPT, "application/json")
        .send()
        .await?
        .error_for_status()?;

    let url = response.url().to_string();
    debug!(%url, "fetched page");

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|source| SearchError::Decode { url, source })
}
