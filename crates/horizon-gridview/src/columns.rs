//! Column model building.
//!
//! Combines the merged query, the layout and the resolved metadata into the
//! ordered list of [`ColumnDefinition`]s a grid renders.

use horizon_gridview_core::logging::targets;

use crate::layout::{DEFAULT_COLUMN_WIDTH, LayoutDescriptor};
use crate::metadata::MetadataSet;
use crate::query::{AttributeRef, QueryDocument};

/// One display-ready column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// Attribute logical name without alias.
    pub short_name: String,
    /// Key used to select and read the column's value.
    pub field_key: String,
    /// Header text.
    pub display_label: String,
    /// Width in pixels.
    pub width: u32,
    /// Whether the attribute is the entity's primary key.
    pub is_primary_key: bool,
    /// Whether the attribute is the entity's primary name field.
    pub is_primary_name_field: bool,
    /// Whether the attribute references another record.
    pub is_lookup: bool,
    /// Whether cells render as a link to a record.
    pub has_navigation_link: bool,
    /// Whether the column is hidden.
    pub is_hidden: bool,
    /// Whether rows are ordered by this column.
    pub is_sorted: bool,
    /// Whether the order is descending. Only set on the sorted column.
    pub is_sorted_descending: bool,
}

/// An attribute without matching metadata. Built with defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedAttributeWarning {
    /// Entity the attribute was looked up on.
    pub entity: String,
    /// Attribute short name.
    pub attribute: String,
}

/// Built columns plus the attributes that could not be resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnModel {
    pub columns: Vec<ColumnDefinition>,
    pub warnings: Vec<UnresolvedAttributeWarning>,
}

impl ColumnModel {
    /// Field keys of the visible columns joined for an OData `$select`.
    pub fn select_clause(&self) -> String {
        select_clause(&self.columns)
    }
}

/// Field keys of the visible columns, comma separated.
pub fn select_clause(columns: &[ColumnDefinition]) -> String {
    columns
        .iter()
        .filter(|column| !column.is_hidden)
        .map(|column| column.field_key.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Builds one column per attribute of `query`, in attribute order.
///
/// `query` is expected to be already merged with `layout`.
pub fn build_columns(
    query: &QueryDocument,
    layout: Option<&LayoutDescriptor>,
    metadata: &MetadataSet,
) -> ColumnModel {
    let mut model = ColumnModel::default();

    for attribute in &query.attributes {
        let column = build_column(query, attribute, layout, metadata, &mut model.warnings);
        model.columns.push(column);
    }

    tracing::debug!(
        target: targets::COLUMNS,
        entity = %query.entity_name,
        columns = model.columns.len(),
        unresolved = model.warnings.len(),
        "built column model"
    );
    model
}

fn build_column(
    query: &QueryDocument,
    attribute: &AttributeRef,
    layout: Option<&LayoutDescriptor>,
    metadata: &MetadataSet,
    warnings: &mut Vec<UnresolvedAttributeWarning>,
) -> ColumnDefinition {
    let qualified_key = attribute.field_key();
    let link = attribute.link_alias.as_deref().and_then(|alias| query.link(alias));
    let entity = link.map_or(query.entity_name.as_str(), |link| link.target_entity_name.as_str());

    let meta = metadata.get(entity, &attribute.name);
    if meta.is_none() {
        tracing::warn!(
            target: targets::COLUMNS,
            entity,
            attribute = %attribute.name,
            "no metadata for attribute, using defaults"
        );
        warnings.push(UnresolvedAttributeWarning {
            entity: entity.to_string(),
            attribute: attribute.name.clone(),
        });
    }

    let is_primary_key = meta.is_some_and(|m| m.is_primary_key);
    let is_primary_name_field = meta.is_some_and(|m| m.is_primary_name_field);
    let is_lookup = meta.is_some_and(|m| m.is_lookup);

    let field_key = if is_lookup && !attribute.is_linked() {
        format!("_{}_value", attribute.name)
    } else {
        qualified_key.clone()
    };

    let label = meta.map_or(attribute.name.as_str(), |m| m.display_label.as_str());
    let display_label = match (&attribute.link_alias, link) {
        (None, _) => label.to_string(),
        (Some(alias), Some(link)) => {
            let qualifier = metadata
                .get(&query.entity_name, &link.to_field)
                .map(|m| m.display_label.as_str())
                .or(link.attribute_names.first().map(String::as_str))
                .unwrap_or(alias.as_str());
            format!("{label} ( {qualifier} )")
        }
        (Some(_), None) => field_key.clone(),
    };

    let cell = layout.and_then(|layout| layout.cell(&qualified_key));
    let width = cell.map_or(DEFAULT_COLUMN_WIDTH, |cell| cell.width);
    let is_hidden = cell.map_or(layout.is_some(), |cell| cell.hidden);

    let sort = query
        .sort
        .as_ref()
        .filter(|sort| sort.attribute_name == attribute.name);

    ColumnDefinition {
        short_name: attribute.name.clone(),
        field_key,
        display_label,
        width,
        is_primary_key,
        is_primary_name_field,
        is_lookup,
        has_navigation_link: is_primary_name_field || is_lookup,
        is_hidden,
        is_sorted: sort.is_some(),
        is_sorted_descending: sort.is_some_and(|sort| sort.descending),
    }
}

/// Titles derived from the configuration and the columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityTitles {
    pub display_name: String,
    pub display_collection_name: String,
    pub title: String,
}

/// Derives the entity titles.
///
/// The display name is the configured title, else the primary-key column's
/// label, else its short name. With a view list the title is the configured
/// title (possibly empty); otherwise it is the display collection name.
pub fn infer_titles(
    columns: &[ColumnDefinition],
    configured_title: Option<&str>,
    has_view_list: bool,
) -> EntityTitles {
    let primary = columns.iter().find(|column| column.is_primary_key);
    let display_name = configured_title
        .map(str::to_string)
        .or_else(|| {
            primary.map(|column| {
                if column.display_label.is_empty() {
                    column.short_name.clone()
                } else {
                    column.display_label.clone()
                }
            })
        })
        .unwrap_or_default();

    let title = if has_view_list {
        configured_title.unwrap_or_default().to_string()
    } else {
        display_name.clone()
    };

    EntityTitles {
        display_collection_name: display_name.clone(),
        display_name,
        title,
    }
}
