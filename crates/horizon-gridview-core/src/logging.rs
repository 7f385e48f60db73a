//! Logging facilities for Horizon GridView.
//!
//! Horizon GridView uses the `tracing` crate for instrumentation. To see
//! logs, install a subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_gridview=debug,horizon_gridview_net=info")
//!         .init();
//! }
//! ```

/// `tracing` targets, one per subsystem.
pub mod targets {
    pub const CORE: &str = "horizon_gridview_core";
    pub const SIGNAL: &str = "horizon_gridview_core::signal";
    pub const PIPELINE: &str = "horizon_gridview";
    /// Query document parsing and filter injection.
    pub const FETCH: &str = "horizon_gridview::fetch";
    /// Layout descriptor parsing and merge.
    pub const LAYOUT: &str = "horizon_gridview::layout";
    /// Metadata resolution.
    pub const METADATA: &str = "horizon_gridview::metadata";
    /// Column model building.
    pub const COLUMNS: &str = "horizon_gridview::columns";
    /// View switching.
    pub const VIEW: &str = "horizon_gridview::view";
    /// Performance spans.
    pub const PERF: &str = "horizon_gridview::perf";
}

/// Keeps an `info` span on the perf target entered until dropped.
///
/// Only for synchronous sections; never hold one across an `.await`.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
