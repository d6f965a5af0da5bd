//! # Proxy Configuration
//!
//! The declarative mapping from backend tables to `GRIPSource` collections.
//!
//! Example YAML:
//! ```yaml
//! port: 50051
//! baseURL: http://localhost:8089/
//! tables:
//!   patients:
//!     primaryKey: id
//!     fields:
//!       id: string
//!       age: integer
//!   audit_log:
//!     fields:
//!       event: string
//! ```
//!
//! A table without a `primaryKey` stays in the file but is not served: it is left out of
//! the collection list and cannot be scanned or looked up.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use url::Url;

/// Port the proxy listens on when the configuration does not set one.
pub const DEFAULT_PORT: u16 = 50051;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[source] serde_yaml::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] serde_yaml::Error),
    #[error("Invalid baseURL '{0}': {1}")]
    InvalidBaseUrl(String, String),
}

/// How one backend table is exposed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfig {
    /// Field whose value becomes the row id. Written as `""` when unset so the key shows
    /// up in generated files, and read back as unset.
    #[serde(
        default,
        serialize_with = "serialize_primary_key",
        deserialize_with = "deserialize_primary_key"
    )]
    pub primary_key: Option<String>,
    /// Field name to declared type name.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

fn serialize_primary_key<S>(key: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(key.as_deref().unwrap_or_default())
}

fn deserialize_primary_key<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let key = Option::<String>::deserialize(deserializer)?;
    Ok(key.filter(|key| !key.is_empty()))
}

impl CollectionConfig {
    /// The primary key field, if one is set.
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref().filter(|key| !key.is_empty())
    }

    /// Whether rows of this collection can be scanned and looked up.
    pub fn is_queryable(&self) -> bool {
        self.primary_key().is_some()
    }
}

/// Process-wide proxy configuration. Loaded once at startup and never mutated after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_port", deserialize_with = "port_or_default")]
    pub port: u16,
    #[serde(rename = "baseURL", default)]
    pub base_url: String,
    #[serde(rename = "tables", default)]
    pub collections: BTreeMap<String, CollectionConfig>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

// `port: 0` means "not set", same as leaving it out.
fn port_or_default<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let port = Option::<u16>::deserialize(deserializer)?;
    Ok(port.filter(|p| *p != 0).unwrap_or(DEFAULT_PORT))
}

impl ProxyConfig {
    /// Creates an empty configuration for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            port: DEFAULT_PORT,
            base_url: base_url.into(),
            collections: BTreeMap::new(),
        }
    }

    /// Loads and validates a YAML (or JSON) configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_yaml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::Parse)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(ConfigError::Serialize)
    }

    /// Checks that `baseURL` is an absolute URL that paths can be appended to.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ConfigError::InvalidBaseUrl(self.base_url.clone(), e.to_string()))?;

        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl(
                self.base_url.clone(),
                "URL cannot be used as a base".to_string(),
            ));
        }

        Ok(())
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.get(name)
    }

    /// Primary key of `name`, or `None` if the collection is unknown or has no key.
    pub fn primary_key_of(&self, name: &str) -> Option<&str> {
        self.collection(name).and_then(CollectionConfig::primary_key)
    }

    /// Names of the collections that have a primary key, in name order.
    pub fn queryable_collections(&self) -> impl Iterator<Item = &str> {
        self.collections
            .iter()
            .filter(|(_, collection)| collection.is_queryable())
            .map(|(name, _)| name.as_str())
    }

    /// Declared field names of `name`, or `None` if the collection is not configured.
    pub fn fields_of(&self, name: &str) -> Option<impl Iterator<Item = &str>> {
        self.collection(name)
            .map(|collection| collection.fields.keys().map(String::as_str))
    }
}
