//! Web API payload types.

use serde::{Deserialize, Deserializer, Serialize};

/// `@odata.type` discriminator of lookup attributes.
pub const LOOKUP_ATTRIBUTE_TYPE: &str = "#Microsoft.Dynamics.CRM.LookupAttributeMetadata";

fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// An OData collection response (`{"value": [...]}`).
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EntityCollection<T> {
    /// The returned items.
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    /// Link to the next page, when the server paged the result.
    #[serde(rename = "@odata.nextLink", default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}

/// One localized label.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct LocalizedLabel {
    /// Label text.
    #[serde(default)]
    pub label: String,
    /// LCID of the label's language.
    #[serde(default)]
    pub language_code: Option<u32>,
}

/// The `DisplayName` complex value of a metadata item.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct DisplayName {
    /// Labels in every provisioned language.
    #[serde(default, deserialize_with = "null_to_default")]
    pub localized_labels: Vec<LocalizedLabel>,
}

/// Attribute metadata as returned by `EntityDefinitions(...)/Attributes`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AttributeDefinition {
    /// Attribute logical name.
    #[serde(rename = "LogicalName")]
    pub logical_name: String,
    /// Whether this is the entity's primary key.
    #[serde(rename = "IsPrimaryId", default, deserialize_with = "null_to_default")]
    pub is_primary_id: bool,
    /// Whether this is the entity's primary name field.
    #[serde(rename = "IsPrimaryName", default, deserialize_with = "null_to_default")]
    pub is_primary_name: bool,
    /// Derived metadata type, e.g. `#Microsoft.Dynamics.CRM.LookupAttributeMetadata`.
    #[serde(rename = "@odata.type", default, skip_serializing_if = "Option::is_none")]
    pub odata_type: Option<String>,
    /// Display name labels.
    #[serde(rename = "DisplayName", default, deserialize_with = "null_to_default")]
    pub display_name: DisplayName,
}

impl AttributeDefinition {
    /// Whether the attribute references another entity's record.
    pub fn is_lookup(&self) -> bool {
        self.odata_type.as_deref() == Some(LOOKUP_ATTRIBUTE_TYPE)
    }

    /// The first localized display label, if any.
    pub fn label(&self) -> Option<&str> {
        self.display_name
            .localized_labels
            .first()
            .map(|label| label.label.as_str())
            .filter(|label| !label.is_empty())
    }
}

/// A saved view (`savedquery` record).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SavedQuery {
    /// View name.
    #[serde(default)]
    pub name: String,
    /// Query document text.
    #[serde(rename = "fetchxml", default)]
    pub fetch_xml: String,
    /// Layout descriptor JSON text.
    #[serde(rename = "layoutjson", default)]
    pub layout_json: Option<String>,
    /// Logical name of the entity the view returns.
    #[serde(rename = "returnedtypecode", default)]
    pub returned_type_code: Option<String>,
}
