//! # GA4GH Search Client
//!
//! This module contains the REST side of the proxy: the wire types exchanged with a
//! GA4GH Search backend and the [`client::SearchClient`] that pages through them.
pub mod client;
pub mod types;
