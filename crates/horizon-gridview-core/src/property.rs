//! Latest-value cell.
//!
//! Paired with a [`Signal`](crate::Signal), a [`Property`] lets late
//! subscribers read the value that earlier subscribers were notified about.

use std::fmt;

use parking_lot::RwLock;

/// A value behind a read-write lock.
///
/// ```
/// use horizon_gridview_core::Property;
///
/// let state = Property::new("Idle");
/// assert!(!state.set("Idle"));
/// assert!(state.set("Loading"));
/// assert_eq!(state.get(), "Loading");
/// ```
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// A clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Borrows the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Stores `value` unconditionally.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Stores `value` and reports whether it differs from the previous one.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        let changed = *current != value;
        if changed {
            *current = value;
        }
        changed
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with(|value| f.debug_tuple("Property").field(value).finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_set_reports_change() {
        let prop = Property::new(String::from("Idle"));
        assert!(!prop.set("Idle".into()));
        assert!(prop.set("Loading".into()));
        assert_eq!(prop.with(|value| value.len()), 7);
    }

    #[test]
    fn test_holds_shared_snapshot() {
        let prop: Property<Option<Arc<String>>> = Property::default();
        assert!(prop.get().is_none());

        let snapshot = Arc::new(String::from("account"));
        prop.set_silent(Some(snapshot.clone()));
        assert!(Arc::ptr_eq(&prop.get().unwrap(), &snapshot));
    }
}
