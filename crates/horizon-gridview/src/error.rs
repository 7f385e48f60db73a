//! Error types for the column model pipeline.

use horizon_gridview_net::NetworkError;

use crate::xml::XmlError;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors that can occur while resolving a grid configuration.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// The query document is not well-formed or lacks its entity.
    #[error("Malformed query document: {0}")]
    MalformedDocument(String),

    /// The layout descriptor is not valid JSON.
    #[error("Malformed layout descriptor: {source}")]
    MalformedLayout {
        #[source]
        source: serde_json::Error,
    },

    /// A per-entity metadata lookup failed; the whole run is aborted.
    #[error("Failed to fetch attribute metadata for '{entity}': {source}")]
    MetadataFetch {
        entity: String,
        #[source]
        source: NetworkError,
    },

    /// The saved view could not be retrieved.
    #[error("Failed to retrieve saved view '{view_id}': {source}")]
    SavedViewRetrieval {
        view_id: String,
        #[source]
        source: NetworkError,
    },

    /// Row data could not be fetched.
    #[error("Failed to fetch rows of '{entity_set}': {source}")]
    DataFetch {
        entity_set: String,
        #[source]
        source: NetworkError,
    },

    /// The options could not be loaded.
    #[error("Invalid grid options: {0}")]
    Config(String),

    /// No configuration has been resolved yet.
    #[error("No resolved configuration is available")]
    NotReady,
}

impl GridError {
    /// Create a malformed document error.
    pub fn malformed_document(message: impl Into<String>) -> Self {
        Self::MalformedDocument(message.into())
    }

    /// Create a metadata fetch error.
    pub fn metadata_fetch(entity: impl Into<String>, source: NetworkError) -> Self {
        Self::MetadataFetch {
            entity: entity.into(),
            source,
        }
    }

    /// Create a saved view retrieval error.
    pub fn saved_view_retrieval(view_id: impl Into<String>, source: NetworkError) -> Self {
        Self::SavedViewRetrieval {
            view_id: view_id.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<XmlError> for GridError {
    fn from(err: XmlError) -> Self {
        Self::MalformedDocument(err.to_string())
    }
}

impl From<serde_json::Error> for GridError {
    fn from(source: serde_json::Error) -> Self {
        Self::MalformedLayout { source }
    }
}
