//! Layout descriptors and attribute reordering.
//!
//! A layout is the JSON stored next to a saved view:
//!
//! ```json
//! { "Object": 1, "Rows": [{ "Cells": [{ "Name": "name", "Width": 300 }] }] }
//! ```
//!
//! Only `Object` and the cells of the first row are read.

use serde::Deserialize;
use serde_json::Value;

use horizon_gridview_core::logging::targets;

use crate::error::Result;
use crate::query::QueryDocument;

/// Column width used when neither the layout nor the cell gives one.
pub const DEFAULT_COLUMN_WIDTH: u32 = 100;

/// Raw layout input: JSON text or an already parsed value.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutSource {
    /// JSON text.
    Text(String),
    /// A parsed JSON value.
    Value(Value),
}

impl From<String> for LayoutSource {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for LayoutSource {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Value> for LayoutSource {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// One column of the layout's first row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSpec {
    /// Field key of the column (`name` or `alias.name`).
    pub name: String,
    /// Column width in pixels.
    pub width: u32,
    /// Whether the column is hidden.
    pub hidden: bool,
}

/// A parsed layout descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutDescriptor {
    /// Numeric type code of the entity the layout was made for.
    pub object_id: Option<i64>,
    /// Cells of the first row, when the layout declares any rows.
    pub cells: Option<Vec<CellSpec>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireLayout {
    #[serde(default)]
    object: Option<i64>,
    #[serde(default)]
    rows: Option<Vec<WireRow>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireRow {
    #[serde(default)]
    cells: Option<Vec<WireCell>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireCell {
    name: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    is_hidden: Option<bool>,
}

impl LayoutDescriptor {
    /// Parses a layout source.
    ///
    /// Blank text and JSON `null` mean "no layout". A JSON string value is
    /// treated as layout text. Anything else that does not match the
    /// layout shape fails with [`GridError::MalformedLayout`](crate::GridError::MalformedLayout).
    pub fn from_source(source: &LayoutSource) -> Result<Option<Self>> {
        let wire: WireLayout = match source {
            LayoutSource::Text(text) if text.trim().is_empty() => return Ok(None),
            LayoutSource::Text(text) => serde_json::from_str(text)?,
            LayoutSource::Value(Value::Null) => return Ok(None),
            LayoutSource::Value(Value::String(text)) => {
                return Self::from_source(&LayoutSource::Text(text.clone()));
            }
            LayoutSource::Value(value) => serde_json::from_value(value.clone())?,
        };

        let cells = wire.rows.and_then(|rows| rows.into_iter().next()).map(|row| {
            row.cells
                .unwrap_or_default()
                .into_iter()
                .map(|cell| CellSpec {
                    name: cell.name,
                    width: cell.width.unwrap_or(DEFAULT_COLUMN_WIDTH),
                    hidden: cell.is_hidden.unwrap_or(false),
                })
                .collect()
        });

        Ok(Some(Self {
            object_id: wire.object,
            cells,
        }))
    }

    /// Parses layout text.
    pub fn parse(text: &str) -> Result<Option<Self>> {
        Self::from_source(&LayoutSource::Text(text.to_string()))
    }

    /// The cell named `field_key`.
    pub fn cell(&self, field_key: &str) -> Option<&CellSpec> {
        self.cells.as_ref()?.iter().find(|cell| cell.name == field_key)
    }

    fn position(&self, field_key: &str) -> Option<usize> {
        self.cells.as_ref()?.iter().position(|cell| cell.name == field_key)
    }
}

/// Reorders the query's attributes to follow the layout's cells.
///
/// Attributes named by a cell come first in cell order; the rest follow in
/// their original relative order. Without a layout, or with a layout that
/// declares no rows, the document order is kept.
pub fn merge_layout(query: &QueryDocument, layout: Option<&LayoutDescriptor>) -> QueryDocument {
    let Some(layout) = layout.filter(|l| l.cells.is_some()) else {
        return query.clone();
    };

    let mut attributes = query.attributes.clone();
    attributes.sort_by_cached_key(|attr| layout.position(&attr.field_key()).unwrap_or(usize::MAX));

    tracing::trace!(target: targets::LAYOUT, columns = attributes.len(), "merged layout order");
    query.with_attributes(attributes)
}
