//! Horizon GridView - query-driven column models for data grids.
//!
//! Given a FetchXML query document and an optional layout descriptor, this
//! crate produces a display-ready column model: every selected attribute is
//! resolved against the server's attribute metadata and merged with layout
//! and sort information. A view-switch controller re-runs the pipeline when
//! the active saved view changes.
//!
//! # Pipeline
//!
//! 1. [`QueryDocument::parse`] reads the entity, attributes, joins and sort.
//! 2. [`filter::inject_conditions`] adds configured filter conditions.
//! 3. [`layout::merge_layout`] orders attributes by the layout's cells.
//! 4. [`metadata::resolve_metadata`] looks up every entity concurrently.
//! 5. [`columns::build_columns`] produces the [`ColumnDefinition`]s.
//!
//! [`GridPipeline`] drives these steps against a backend implementing
//! [`MetadataSource`] and [`SavedViewSource`], such as
//! [`horizon_gridview_net::WebApiClient`].
//!
//! # Example
//!
//! ```no_run
//! use horizon_gridview::{GridOptions, GridPipeline, QuerySource};
//! use horizon_gridview_net::WebApiClient;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = WebApiClient::builder("https://contoso.crm.dynamics.com")
//!     .bearer_auth("token")
//!     .build()?;
//! let pipeline = GridPipeline::new(client);
//!
//! pipeline.on_ready(|config| {
//!     for column in &config.columns {
//!         println!("{} ({})", column.display_label, column.field_key);
//!     }
//! });
//!
//! let fetch_xml = r#"<fetch><entity name="account"><attribute name="name"/></entity></fetch>"#;
//! pipeline
//!     .initialize(QuerySource::Document(fetch_xml.into()), None, GridOptions::default())
//!     .await?;
//! let rows = pipeline.fetch_rows("accounts").await?;
//! # let _ = rows;
//! # Ok(())
//! # }
//! ```

pub mod columns;
pub mod config;
pub mod error;
pub mod filter;
pub mod layout;
pub mod metadata;
pub mod pipeline;
pub mod query;
pub mod view;
pub mod xml;

pub use columns::{ColumnDefinition, ColumnModel, UnresolvedAttributeWarning};
pub use config::{FeatureToggles, GridOptions};
pub use error::{GridError, Result};
pub use layout::{LayoutDescriptor, LayoutSource};
pub use metadata::{AttributeMetadata, MetadataSet, MetadataSource};
pub use pipeline::{GridPipeline, Outcome, QuerySource, ResolvedConfig};
pub use query::{AttributeRef, LinkRef, QueryDocument, SortOrder};
pub use view::{ControllerState, SavedView, SavedViewSource, ViewItem};
