//! # Config Generator
//!
//! Introspects a live backend and produces a best-effort [`ProxyConfig`]: every table, every
//! declared property with its type, and a primary key guessed as the property named `id`.
use crate::config::{CollectionConfig, ProxyConfig};
use crate::search::client::SearchClient;
use crate::search::types::SchemaDocument;
use futures_util::StreamExt;
use tracing::{info, warn};

/// Property name assumed to be a table's primary key.
pub const GUESSED_PRIMARY_KEY: &str = "id";

/// Builds a configuration covering every table `client` can list.
///
/// Tables whose schema cannot be fetched are skipped. Tables without an `id` property are
/// kept with no primary key, which leaves them out of the served collections until the
/// key is filled in by hand.
pub async fn generate_config(client: &SearchClient) -> ProxyConfig {
    let mut config = ProxyConfig::new(client.base_url().as_str());
    let mut tables = client.list_collections();

    while let Some(table) = tables.next().await {
        match client.get_schema(&table).await {
            Ok(schema) => {
                let collection = collection_from_schema(&schema);
                if collection.primary_key.is_none() {
                    warn!(table = %table.name, "unable to guess primary key");
                }
                config.collections.insert(table.name, collection);
            }
            Err(err) => warn!(table = %table.name, error = %err, "skipping table, schema unavailable"),
        }
    }

    info!(tables = config.collections.len(), "generated config");
    config
}

pub fn collection_from_schema(schema: &SchemaDocument) -> CollectionConfig {
    let fields = schema
        .properties
        .iter()
        .map(|(name, spec)| (name.clone(), spec.type_name()))
        .collect();

    let primary_key = schema
        .properties
        .contains_key(GUESSED_PRIMARY_KEY)
        .then(|| GUESSED_PRIMARY_KEY.to_string());

    CollectionConfig {
        primary_key,
        fields,
    }
}
