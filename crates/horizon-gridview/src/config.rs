//! Grid options.
//!
//! Options can be built in code or loaded from TOML or JSON:
//!
//! ```
//! use horizon_gridview::GridOptions;
//!
//! let options = GridOptions::from_toml_str(
//!     r#"
//!     title = "Accounts"
//!     filter_conditions = ['<condition attribute="statecode" operator="eq" value="0"/>']
//!
//!     [features]
//!     allow_search_box = true
//!
//!     [[views]]
//!     display_name = "Active Accounts"
//!     identifier = "00000000-0000-0000-00aa-000010001001"
//!     is_active = true
//!     "#,
//! )?;
//! assert!(options.features.allow_search_box);
//! assert_eq!(options.views.len(), 1);
//! # Ok::<(), horizon_gridview::GridError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::view::ViewItem;

/// Toggles for the grid's command surface. All off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    pub allow_search_box: bool,
    pub allow_edit: bool,
    pub allow_add: bool,
    pub allow_open_associated_records: bool,
    pub allow_refresh_grid_view: bool,
    pub allow_open_in_new_window: bool,
}

/// Options of a grid pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    /// Fixed title; derived from the columns when absent.
    pub title: Option<String>,
    pub features: FeatureToggles,
    /// Known saved views. An empty list means the grid has no view picker.
    pub views: Vec<ViewItem>,
    /// Raw `<condition>` fragments added to the query's `and` filter.
    pub filter_conditions: Vec<String>,
}

impl GridOptions {
    /// Loads options from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| GridError::config(e.to_string()))
    }

    /// Loads options from JSON.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| GridError::config(e.to_string()))
    }

    /// Whether the grid shows a view picker.
    pub fn has_view_list(&self) -> bool {
        !self.views.is_empty()
    }
}
