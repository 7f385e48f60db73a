//! Saved views and the exclusive view list.

use std::future::Future;

use serde::{Deserialize, Serialize};

use horizon_gridview_net::{NetworkError, WebApiClient};

/// An entry of the view picker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewItem {
    /// Name shown in the picker.
    pub display_name: String,
    /// Saved view id.
    pub identifier: String,
    /// Whether this is the active view.
    pub is_active: bool,
}

impl ViewItem {
    /// Creates an inactive item.
    pub fn new(display_name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            identifier: identifier.into(),
            is_active: false,
        }
    }

    /// Builder-style activation flag.
    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

/// Marks the item with `identifier` active and every other item inactive.
///
/// Returns `false` (leaving the list untouched) when no item matches.
pub fn activate(items: &mut [ViewItem], identifier: &str) -> bool {
    if !items.iter().any(|item| item.identifier == identifier) {
        return false;
    }
    for item in items.iter_mut() {
        item.is_active = item.identifier == identifier;
    }
    true
}

/// The active item, if any.
pub fn active_view(items: &[ViewItem]) -> Option<&ViewItem> {
    items.iter().find(|item| item.is_active)
}

/// Keeps only the first active flag set.
pub fn normalize(items: &mut [ViewItem]) {
    let mut seen = false;
    for item in items.iter_mut() {
        if item.is_active {
            item.is_active = !seen;
            seen = true;
        }
    }
}

/// Lifecycle of the view-switch controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ControllerState {
    /// Nothing has been loaded.
    #[default]
    Idle,
    /// A run is in flight, or the last one failed.
    Loading,
    /// The latest run completed.
    Ready,
}

/// A saved (query document, layout) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedView {
    pub name: String,
    pub query_text: String,
    pub layout_text: Option<String>,
    /// Logical name of the entity the view returns.
    pub returned_type: Option<String>,
}

/// A remote source of saved views.
pub trait SavedViewSource: Send + Sync {
    /// Retrieves the saved view `view_id`.
    fn saved_view(&self, view_id: &str) -> impl Future<Output = Result<SavedView, NetworkError>> + Send;
}

impl SavedViewSource for WebApiClient {
    async fn saved_view(&self, view_id: &str) -> Result<SavedView, NetworkError> {
        let query = self.saved_query(view_id).await?;
        Ok(SavedView {
            name: query.name,
            query_text: query.fetch_xml,
            layout_text: query.layout_json.filter(|text| !text.trim().is_empty()),
            returned_type: query.returned_type_code,
        })
    }
}
