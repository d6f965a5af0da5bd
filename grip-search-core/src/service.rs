//! # GRIPSource Adapter
//!
//! [`SearchProxy`] implements the `gripper.GRIPSource` service on top of a
//! [`SearchClient`] and a [`ProxyConfig`].
//!
//! ## Behaviour worth knowing
//!
//! * `GetRows` streams rows in backend order. Rows whose primary key is missing or not a
//!   string are skipped without an error, and a backend failure mid-scan ends the stream
//!   early as if the table had no more rows.
//! * `GetRowsByID` answers every request for a known collection, in arrival order. A failed
//!   lookup is answered with an empty row so the caller's correlation does not stall.
//!   Requests for unknown collections are logged and get no answer.
//! * `GetIDs` and `GetRowsByField` are part of the contract but not supported; they answer
//!   with `UNIMPLEMENTED`.
use crate::config::ProxyConfig;
use crate::convert;
use crate::error::SearchError;
use crate::search::client::{ROW_QUEUE_CAPACITY, SearchClient};
use futures_util::Stream;
use gripper_proto::pb::{Collection, CollectionInfo, Empty, FieldRequest, Row, RowId, RowRequest};
use gripper_proto::{GripSource, GripSourceServer};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info, warn};

/// Largest message the proxy sends or accepts.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

type ResponseStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send>>;

/// `GRIPSource` service backed by a GA4GH Search API.
#[derive(Debug, Clone)]
pub struct SearchProxy {
    client: SearchClient,
    config: Arc<ProxyConfig>,
}

impl SearchProxy {
    /// Creates a proxy for the backend named by `config.base_url`.
    pub fn new(config: ProxyConfig) -> Result<Self, SearchError> {
        let client = SearchClient::new(&config.base_url)?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: SearchClient, config: ProxyConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Wraps the proxy in a tonic server with the proxy's message size limits.
    pub fn into_server(self) -> GripSourceServer<Self> {
        GripSourceServer::new(self)
            .max_decoding_message_size(MAX_MESSAGE_SIZE)
            .max_encoding_message_size(MAX_MESSAGE_SIZE)
    }

    /// Primary key of a collection that can be scanned, or a `NOT_FOUND` status.
    fn queryable(&self, name: &str) -> Result<String, Status> {
        self.config
            .primary_key_of(name)
            .map(str::to_string)
            .ok_or_else(|| Status::not_found(format!("Collection '{name}' not found")))
    }

    /// Answers one `GetRowsByID` request. `None` means the request is dropped.
    async fn lookup(&self, request: RowRequest) -> Option<Row> {
        let RowRequest {
            collection,
            id,
            request_id,
        } = request;

        let Some(primary_key) = self.config.primary_key_of(&collection) else {
            warn!(%collection, %id, request_id, "dropping lookup for unknown collection");
            return None;
        };

        let reply = match self.client.lookup_row(&collection, primary_key, &id).await {
            Ok(record) => convert::lookup_reply(record, primary_key, request_id),
            Err(err) if err.is_not_found() => {
                debug!(%collection, %id, request_id, "no row for lookup");
                convert::empty_reply(request_id)
            }
            Err(err) => {
                warn!(%collection, %id, request_id, error = %err, "lookup failed");
                convert::empty_reply(request_id)
            }
        };

        Some(reply)
    }
}

#[tonic::async_trait]
impl GripSource for SearchProxy {
    type GetCollectionsStream = ResponseStream<Collection>;
    type GetIDsStream = ResponseStream<RowId>;
    type GetRowsStream = ResponseStream<Row>;
    type GetRowsByIDStream = ResponseStream<Row>;
    type GetRowsByFieldStream = ResponseStream<Row>;

    async fn get_collections(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<Self::GetCollectionsStream>, Status> {
        let collections: Vec<_> = self
            .config
            .queryable_collections()
            .map(|name| {
                Ok(Collection {
                    name: name.to_string(),
                })
            })
            .collect();

        Ok(Response::new(Box::pin(tokio_stream::iter(collections))))
    }

    async fn get_collection_info(
        &self,
        request: Request<Collection>,
    ) -> Result<Response<CollectionInfo>, Status> {
        let name = request.into_inner().name;

        let search_fields = self
            .config
            .fields_of(&name)
            .ok_or_else(|| Status::not_found(format!("Collection '{name}' not found")))?
            .map(str::to_string)
            .collect();

        Ok(Response::new(CollectionInfo {
            search_fields,
            ..Default::default()
        }))
    }

    async fn get_i_ds(
        &self,
        _request: Request<Collection>,
    ) -> Result<Response<Self::GetIDsStream>, Status> {
        Err(Status::unimplemented("GetIDs is not supported"))
    }

    async fn get_rows(
        &self,
        request: Request<Collection>,
    ) -> Result<Response<Self::GetRowsStream>, Status> {
        let name = request.into_inner().name;
        let primary_key = self.queryable(&name)?;
        info!(collection = %name, "scanning rows");

        let rows = self
            .client
            .stream_rows(&name)
            .filter_map(move |record| match convert::keyed_row(record, &primary_key) {
                Some(row) => Some(Ok(row)),
                None => {
                    debug!(collection = %name, %primary_key, "skipping row without a string key");
                    None
                }
            });

        Ok(Response::new(Box::pin(rows)))
    }

    async fn get_rows_by_id(
        &self,
        request: Request<Streaming<RowRequest>>,
    ) -> Result<Response<Self::GetRowsByIDStream>, Status> {
        let mut requests = request.into_inner();
        let (tx, rx) = mpsc::channel(ROW_QUEUE_CAPACITY);
        let proxy = self.clone();

        tokio::spawn(async move {
            loop {
                let request = match requests.message().await {
                    Ok(Some(request)) => request,
                    Ok(None) => break,
                    Err(status) => {
                        warn!(%status, "lookup request stream failed");
                        let _ = tx.send(Err(status)).await;
                        break;
                    }
                };

                let Some(reply) = proxy.lookup(request).await else {
                    continue;
                };

                if tx.send(Ok(reply)).await.is_err() {
                    debug!("lookup caller went away");
                    break;
                }
            }
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }

    async fn get_rows_by_field(
        &self,
        _request: Request<FieldRequest>,
    ) -> Result<Response<Self::GetRowsByFieldStream>, Status> {
        Err(Status::unimplemented("GetRowsByField is not supported"))
    }
}
