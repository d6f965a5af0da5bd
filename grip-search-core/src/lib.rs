//! # Grip Search Core
//!
//! `grip-search-core` exposes a GA4GH Search API (a paginated REST/JSON table search
//! service) as a `gripper.GRIPSource` gRPC data source that a GRIP graph server can
//! ingest from.
//!
//! ## Key Components
//!
//! * **[`pagination`]:** The cursor engine that follows `next_page_url` links until a page
//!   comes back without one.
//! * **[`SearchClient`]:** Typed REST operations on top of the cursor engine: list tables,
//!   fetch a table schema, stream a table's rows and look up a single row by key.
//! * **[`ProxyConfig`]:** The declarative mapping of table name to primary key and field set.
//! * **[`SearchProxy`]:** The `GRIPSource` implementation that stitches the above together.
//! * **[`generate_config`]:** Builds a best-effort [`ProxyConfig`] by introspecting a live
//!   backend.
//!
//! ## Partial results
//!
//! A failed page fetch in the middle of a pagination run does not abort the run. The
//! sequence ends early and the failure is reported as a [`pagination::PageEvent::Truncated`]
//! event (and logged), so callers that stream rows get everything fetched up to that point.
pub mod config;
pub mod convert;
pub mod error;
pub mod generator;
pub mod pagination;
pub mod search;
pub mod service;

pub use config::{CollectionConfig, ProxyConfig};
pub use error::SearchError;
pub use generator::generate_config;
pub use search::client::SearchClient;
pub use service::SearchProxy;

// Re-exports
pub use gripper_proto;
pub use tonic;
