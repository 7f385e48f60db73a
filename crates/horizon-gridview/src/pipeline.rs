//! The grid pipeline and view-switch controller.
//!
//! A [`GridPipeline`] owns everything one grid needs: the options, the view
//! list, the current view and the latest [`ResolvedConfig`]. Each run goes
//! parse, inject filters, merge layout, resolve metadata, build columns.
//!
//! Every run is tagged with a generation number. A run that completes after
//! a newer one was started is discarded: it changes no state and notifies
//! nobody.

use std::sync::Arc;

use parking_lot::Mutex;

use horizon_gridview_core::logging::targets;
use horizon_gridview_core::{ConnectionId, PerfSpan, Property, Signal};
use horizon_gridview_net::WebApiClient;
use horizon_gridview_net::webapi::EntityCollection;

use crate::columns::{ColumnDefinition, UnresolvedAttributeWarning, build_columns, infer_titles};
use crate::config::{FeatureToggles, GridOptions};
use crate::error::{GridError, Result};
use crate::filter::inject_conditions;
use crate::layout::{LayoutDescriptor, LayoutSource, merge_layout};
use crate::metadata::{MetadataSource, resolve_metadata};
use crate::query::QueryDocument;
use crate::view::{ControllerState, SavedViewSource, ViewItem, activate, active_view, normalize};
use crate::xml::parse_xml;

/// The display-ready configuration produced by a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub entity_name: String,
    /// Type code from the layout's `Object` field.
    pub object_id: Option<i64>,
    pub display_name: String,
    pub display_collection_name: String,
    pub title: String,
    /// Columns in display order.
    pub columns: Vec<ColumnDefinition>,
    pub features: FeatureToggles,
    /// The view list as of this run; at most one item is active.
    pub view_items: Vec<ViewItem>,
    /// Attributes built without metadata.
    pub warnings: Vec<UnresolvedAttributeWarning>,
    /// The query document text with the configured filters applied.
    pub fetch_xml: String,
}

impl ResolvedConfig {
    /// The column with the given field key.
    pub fn column(&self, field_key: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|column| column.field_key == field_key)
    }

    /// Visible field keys joined for an OData `$select`.
    pub fn select_clause(&self) -> String {
        crate::columns::select_clause(&self.columns)
    }
}

/// What [`GridPipeline::initialize`] loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySource {
    /// Query document text.
    Document(String),
    /// A saved view id; the view is marked active in the view list.
    SavedView(String),
    /// The active item of the configured view list.
    ActiveView,
}

/// How a pipeline call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The run completed and published this configuration.
    Ready(Arc<ResolvedConfig>),
    /// The requested view is already current. Nothing was done.
    AlreadyActive,
    /// A newer run started before this one finished; its result was dropped.
    Superseded,
    /// There was nothing to load.
    NothingToLoad,
}

impl Outcome {
    /// The published configuration, for [`Outcome::Ready`].
    pub fn config(&self) -> Option<&Arc<ResolvedConfig>> {
        match self {
            Outcome::Ready(config) => Some(config),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct PipelineState {
    options: GridOptions,
    current_view: Option<String>,
    layout_override: Option<LayoutSource>,
    generation: u64,
    controller_state: ControllerState,
}

enum Job {
    Document(String),
    View(String),
}

/// Inputs of one run, captured when it starts.
struct RunInput {
    generation: u64,
    filter_conditions: Vec<String>,
    layout_override: Option<LayoutSource>,
}

/// Resolves query documents into [`ResolvedConfig`]s against a backend.
///
/// The backend provides attribute metadata and saved views; the Web API
/// client implements both.
pub struct GridPipeline<B> {
    backend: B,
    state: Mutex<PipelineState>,
    latest: Property<Option<Arc<ResolvedConfig>>>,
    ready: Signal<Arc<ResolvedConfig>>,
    state_changed: Signal<ControllerState>,
}

impl<B> std::fmt::Debug for GridPipeline<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("GridPipeline")
            .field("state", &state.controller_state)
            .field("current_view", &state.current_view)
            .field("generation", &state.generation)
            .finish()
    }
}

impl<B: MetadataSource + SavedViewSource> GridPipeline<B> {
    /// Creates an idle pipeline.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: Mutex::new(PipelineState::default()),
            latest: Property::new(None),
            ready: Signal::new(),
            state_changed: Signal::new(),
        }
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The controller state.
    pub fn state(&self) -> ControllerState {
        self.state.lock().controller_state
    }

    /// Identifier of the current saved view.
    pub fn current_view(&self) -> Option<String> {
        self.state.lock().current_view.clone()
    }

    /// The view list with its active flags.
    pub fn view_items(&self) -> Vec<ViewItem> {
        self.state.lock().options.views.clone()
    }

    /// The latest published configuration.
    ///
    /// Subscribers that connect after a run completed read it here.
    pub fn resolved_config(&self) -> Option<Arc<ResolvedConfig>> {
        self.latest.get()
    }

    /// Calls `callback` after every successful run.
    pub fn on_ready<F>(&self, callback: F) -> ConnectionId
    where
        F: Fn(&Arc<ResolvedConfig>) + Send + Sync + 'static,
    {
        self.ready.connect(callback)
    }

    /// Calls `callback` whenever the controller state changes.
    pub fn on_state_changed<F>(&self, callback: F) -> ConnectionId
    where
        F: Fn(&ControllerState) + Send + Sync + 'static,
    {
        self.state_changed.connect(callback)
    }

    /// Removes a readiness callback.
    pub fn disconnect_ready(&self, id: ConnectionId) -> bool {
        self.ready.disconnect(id)
    }

    /// Loads `source` with `options`.
    ///
    /// `layout`, when given, is used for every later run as well and takes
    /// precedence over the layouts stored with saved views.
    #[tracing::instrument(skip_all, target = "horizon_gridview::view")]
    pub async fn initialize(
        &self,
        source: QuerySource,
        layout: Option<LayoutSource>,
        mut options: GridOptions,
    ) -> Result<Outcome> {
        normalize(&mut options.views);

        let (job, input, changed) = {
            let mut state = self.state.lock();
            let job = match source {
                QuerySource::Document(text) => {
                    state.current_view = active_view(&options.views).map(|v| v.identifier.clone());
                    Some(Job::Document(text))
                }
                QuerySource::SavedView(id) => {
                    activate(&mut options.views, &id);
                    state.current_view = Some(id.clone());
                    Some(Job::View(id))
                }
                QuerySource::ActiveView => {
                    let id = active_view(&options.views).map(|v| v.identifier.clone());
                    state.current_view = id.clone();
                    id.map(Job::View)
                }
            };
            state.options = options;
            state.layout_override = layout;

            let Some(job) = job else {
                state.generation += 1;
                tracing::debug!(target: targets::VIEW, "no document and no active view, staying idle");
                return Ok(Outcome::NothingToLoad);
            };

            let (input, changed) = Self::begin_run(&mut state);
            (job, input, changed)
        };

        self.notify_state(changed);
        self.run(job, input).await
    }

    /// Switches to `item`.
    ///
    /// Selecting the current view does nothing. Otherwise the item becomes
    /// the only active one, the controller enters `Loading`, and the saved
    /// view is retrieved and resolved.
    #[tracing::instrument(skip_all, target = "horizon_gridview::view", fields(view = %item.identifier))]
    pub async fn select_view(&self, item: &ViewItem) -> Result<Outcome> {
        let (input, changed) = {
            let mut state = self.state.lock();
            if state.current_view.as_deref() == Some(item.identifier.as_str()) {
                tracing::debug!(target: targets::VIEW, "view already active");
                return Ok(Outcome::AlreadyActive);
            }

            activate(&mut state.options.views, &item.identifier);
            state.current_view = Some(item.identifier.clone());
            Self::begin_run(&mut state)
        };

        tracing::info!(target: targets::VIEW, view = %item.display_name, "switching view");
        self.notify_state(changed);
        self.run(Job::View(item.identifier.clone()), input).await
    }

    fn begin_run(state: &mut PipelineState) -> (RunInput, Option<ControllerState>) {
        state.generation += 1;
        let changed = Self::transition(state, ControllerState::Loading);
        let input = RunInput {
            generation: state.generation,
            filter_conditions: state.options.filter_conditions.clone(),
            layout_override: state.layout_override.clone(),
        };
        (input, changed)
    }

    fn transition(state: &mut PipelineState, next: ControllerState) -> Option<ControllerState> {
        if state.controller_state == next {
            return None;
        }
        state.controller_state = next;
        Some(next)
    }

    fn notify_state(&self, changed: Option<ControllerState>) {
        if let Some(next) = changed {
            self.state_changed.emit(next);
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.state.lock().generation == generation
    }

    async fn run(&self, job: Job, input: RunInput) -> Result<Outcome> {
        let generation = input.generation;
        match self.resolve(job, input).await {
            Ok(resolved) => Ok(self.publish(generation, resolved)),
            Err(_) if !self.is_current(generation) => {
                tracing::debug!(target: targets::VIEW, generation, "stale run failed, ignored");
                Ok(Outcome::Superseded)
            }
            Err(err) => {
                tracing::warn!(target: targets::VIEW, generation, error = %err, "pipeline run failed");
                Err(err)
            }
        }
    }

    async fn resolve(&self, job: Job, input: RunInput) -> Result<Resolved> {
        let (query_text, saved_layout) = match job {
            Job::Document(text) => (text, None),
            Job::View(id) => {
                let view = self
                    .backend
                    .saved_view(&id)
                    .await
                    .map_err(|err| GridError::saved_view_retrieval(id.as_str(), err))?;
                tracing::debug!(target: targets::VIEW, view = %view.name, "saved view retrieved");
                (view.query_text, view.layout_text.map(LayoutSource::Text))
            }
        };

        let prepared = {
            let _perf = PerfSpan::new("prepare_query");
            prepare(&query_text, input.layout_override.or(saved_layout), &input.filter_conditions)?
        };

        let metadata = resolve_metadata(
            &self.backend,
            &prepared.query.entity_names(),
            &prepared.query.attribute_names(),
        )
        .await?;

        let _perf = PerfSpan::new("build_columns");
        let model = build_columns(&prepared.query, prepared.layout.as_ref(), &metadata);
        Ok(Resolved {
            entity_name: prepared.query.entity_name,
            object_id: prepared.layout.and_then(|layout| layout.object_id),
            columns: model.columns,
            warnings: model.warnings,
            fetch_xml: prepared.fetch_xml,
        })
    }

    fn publish(&self, generation: u64, resolved: Resolved) -> Outcome {
        let (config, changed) = {
            let mut state = self.state.lock();
            if state.generation != generation {
                tracing::debug!(target: targets::VIEW, generation, latest = state.generation, "discarding stale result");
                return Outcome::Superseded;
            }

            let titles = infer_titles(
                &resolved.columns,
                state.options.title.as_deref(),
                state.options.has_view_list(),
            );
            let config = Arc::new(ResolvedConfig {
                entity_name: resolved.entity_name,
                object_id: resolved.object_id,
                display_name: titles.display_name,
                display_collection_name: titles.display_collection_name,
                title: titles.title,
                columns: resolved.columns,
                features: state.options.features,
                view_items: state.options.views.clone(),
                warnings: resolved.warnings,
                fetch_xml: resolved.fetch_xml,
            });
            self.latest.set_silent(Some(Arc::clone(&config)));
            let changed = Self::transition(&mut state, ControllerState::Ready);
            (config, changed)
        };

        tracing::info!(
            target: targets::PIPELINE,
            entity = %config.entity_name,
            columns = config.columns.len(),
            "grid configuration ready"
        );
        self.notify_state(changed);
        self.ready.emit(Arc::clone(&config));
        Outcome::Ready(config)
    }
}

impl GridPipeline<WebApiClient> {
    /// Fetches the rows of `entity_set` with the resolved query document.
    ///
    /// `entity_set` is the collection name (`accounts`).
    pub async fn fetch_rows(&self, entity_set: &str) -> Result<EntityCollection<serde_json::Value>> {
        let config = self.resolved_config().ok_or(GridError::NotReady)?;
        self.backend
            .retrieve_multiple_fetch_xml(entity_set, &config.fetch_xml)
            .await
            .map_err(|source| GridError::DataFetch {
                entity_set: entity_set.to_string(),
                source,
            })
    }
}

struct Prepared {
    query: QueryDocument,
    layout: Option<LayoutDescriptor>,
    fetch_xml: String,
}

struct Resolved {
    entity_name: String,
    object_id: Option<i64>,
    columns: Vec<ColumnDefinition>,
    warnings: Vec<UnresolvedAttributeWarning>,
    fetch_xml: String,
}

/// Parses the document, applies the filters and merges the layout.
fn prepare(text: &str, layout: Option<LayoutSource>, filter_conditions: &[String]) -> Result<Prepared> {
    let xml = parse_xml(text)?;
    let (query, fetch_xml) = if filter_conditions.is_empty() {
        (QueryDocument::from_xml(&xml)?, text.to_string())
    } else {
        let filtered = inject_conditions(&xml, filter_conditions);
        (QueryDocument::from_xml(&filtered)?, filtered.to_xml_string())
    };

    let layout = match layout {
        Some(source) => LayoutDescriptor::from_source(&source)?,
        None => None,
    };
    let query = merge_layout(&query, layout.as_ref());

    Ok(Prepared {
        query,
        layout,
        fetch_xml,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_keeps_text_without_filters() {
        let text = r#"<fetch><entity name="account"><attribute name="name"/></entity></fetch>"#;
        let prepared = prepare(text, None, &[]).unwrap();
        assert_eq!(prepared.fetch_xml, text);
        assert!(prepared.layout.is_none());
    }

    #[test]
    fn test_prepare_applies_filters_and_layout() {
        let text = r#"<fetch><entity name="account"><attribute name="a"/><attribute name="b"/></entity></fetch>"#;
        let prepared = prepare(
            text,
            Some(r#"{"Object":1,"Rows":[{"Cells":[{"Name":"b"},{"Name":"a"}]}]}"#.into()),
            &[r#"<condition attribute="statecode" operator="eq" value="0"/>"#.to_string()],
        )
        .unwrap();

        assert!(prepared.fetch_xml.contains(r#"<filter type="and"><condition attribute="statecode""#));
        let order: Vec<&str> = prepared.query.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(order, ["b", "a"]);
        assert_eq!(prepared.layout.unwrap().object_id, Some(1));
    }

    #[test]
    fn test_prepare_rejects_bad_input() {
        assert!(matches!(prepare("<fetch/>", None, &[]), Err(GridError::MalformedDocument(_))));
        let text = r#"<fetch><entity name="account"/></fetch>"#;
        assert!(matches!(
            prepare(text, Some("[".into()), &[]),
            Err(GridError::MalformedLayout { .. })
        ));
    }
}
