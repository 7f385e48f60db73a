//! Core systems for Horizon GridView.
//!
//! This crate provides the notification plumbing shared by the networking
//! and pipeline crates:
//!
//! - [`Signal`]: subscriber lists with connection ids
//! - [`Property`]: a cell holding the latest value
//! - [`logging`]: tracing targets and performance spans
//!
//! # Example
//!
//! ```
//! use horizon_gridview_core::{Property, Signal};
//!
//! // Latest value plus change notification, readable by late subscribers.
//! struct Latest {
//!     value: Property<Option<u32>>,
//!     changed: Signal<u32>,
//! }
//!
//! impl Latest {
//!     fn publish(&self, value: u32) {
//!         if self.value.set(Some(value)) {
//!             self.changed.emit(value);
//!         }
//!     }
//! }
//!
//! let latest = Latest { value: Property::default(), changed: Signal::new() };
//! latest.publish(7);
//! assert_eq!(latest.value.get(), Some(7));
//! ```

pub mod logging;
pub mod property;
pub mod signal;

pub use logging::PerfSpan;
pub use property::Property;
pub use signal::{ConnectionId, Signal};
