//! Errors returned by the search backend operations.

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Request to the search backend failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Failed to decode response from '{url}': {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No row in '{collection}' with {field} = '{id}'")]
    NotFound {
        collection: String,
        field: String,
        id: String,
    },

    #[error("{count} rows in '{collection}' match {field} = '{id}' on a single page")]
    AmbiguousMatch {
        collection: String,
        field: String,
        id: String,
        count: usize,
    },

    #[error("Invalid base URL '{0}': {1}")]
    InvalidBaseUrl(String, String),
}

impl SearchError {
    /// Returns `true` if the lookup found nothing, as opposed to failing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
