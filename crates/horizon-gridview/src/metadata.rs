//! Attribute metadata resolution.
//!
//! Each entity of a query is looked up with one request restricted to the
//! query's attribute names. The requests run concurrently and are joined
//! before any column is built; the first failure fails the whole run.

use std::collections::HashMap;
use std::future::Future;

use futures_util::future::try_join_all;
use horizon_gridview_core::logging::targets;
use horizon_gridview_net::{AttributeDefinition, NetworkError, WebApiClient};

use crate::error::{GridError, Result};

/// Schema information about one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMetadata {
    /// Entity the attribute belongs to.
    pub entity_name: String,
    /// Attribute logical name.
    pub name: String,
    /// Localized display label.
    pub display_label: String,
    /// Whether the attribute is the entity's primary key.
    pub is_primary_key: bool,
    /// Whether the attribute is the entity's primary name field.
    pub is_primary_name_field: bool,
    /// Whether the attribute references another record.
    pub is_lookup: bool,
}

impl AttributeMetadata {
    /// Converts a Web API definition, falling back to the logical name as label.
    pub fn from_definition(entity_name: &str, definition: AttributeDefinition) -> Self {
        let display_label = definition
            .label()
            .map(str::to_string)
            .unwrap_or_else(|| definition.logical_name.clone());
        Self {
            entity_name: entity_name.to_string(),
            is_primary_key: definition.is_primary_id,
            is_primary_name_field: definition.is_primary_name,
            is_lookup: definition.is_lookup(),
            name: definition.logical_name,
            display_label,
        }
    }
}

/// A remote source of attribute metadata.
pub trait MetadataSource: Send + Sync {
    /// Metadata of the attributes of `entity` named in `names`.
    ///
    /// Names the entity does not define are left out of the result.
    fn attribute_metadata(
        &self,
        entity: &str,
        names: &[String],
    ) -> impl Future<Output = std::result::Result<Vec<AttributeMetadata>, NetworkError>> + Send;
}

impl MetadataSource for WebApiClient {
    async fn attribute_metadata(
        &self,
        entity: &str,
        names: &[String],
    ) -> std::result::Result<Vec<AttributeMetadata>, NetworkError> {
        let definitions = self.attribute_definitions(entity, names).await?;
        Ok(definitions
            .into_iter()
            .map(|definition| AttributeMetadata::from_definition(entity, definition))
            .collect())
    }
}

/// Resolved metadata keyed by `(entity, attribute)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataSet {
    records: HashMap<(String, String), AttributeMetadata>,
}

impl MetadataSet {
    /// Builds a set; the first record for a key wins.
    pub fn from_records(records: impl IntoIterator<Item = AttributeMetadata>) -> Self {
        let mut set = Self::default();
        for record in records {
            set.records
                .entry((record.entity_name.clone(), record.name.clone()))
                .or_insert(record);
        }
        set
    }

    /// Metadata of `name` on `entity`.
    pub fn get(&self, entity: &str, name: &str) -> Option<&AttributeMetadata> {
        self.records.get(&(entity.to_string(), name.to_string()))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Looks up `names` on every entity concurrently and joins the results.
///
/// Results are reassembled in the order of `entities`. Any failed lookup
/// fails the resolution with [`GridError::MetadataFetch`] naming its entity.
pub async fn resolve_metadata<S: MetadataSource>(
    source: &S,
    entities: &[String],
    names: &[String],
) -> Result<MetadataSet> {
    tracing::debug!(
        target: targets::METADATA,
        entities = entities.len(),
        attributes = names.len(),
        "resolving attribute metadata"
    );

    let lookups = entities.iter().map(|entity| async move {
        source
            .attribute_metadata(entity, names)
            .await
            .map_err(|err| GridError::metadata_fetch(entity.as_str(), err))
    });

    let per_entity = match try_join_all(lookups).await {
        Ok(per_entity) => per_entity,
        Err(err) => {
            tracing::warn!(target: targets::METADATA, error = %err, "metadata resolution failed");
            return Err(err);
        }
    };

    let set = MetadataSet::from_records(per_entity.into_iter().flatten());
    tracing::debug!(target: targets::METADATA, records = set.len(), "attribute metadata resolved");
    Ok(set)
}
