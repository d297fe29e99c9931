//! Property - a thread-safe value updated by one or more writers
//!
//! A property only points at the latest version node. History is kept alive
//! by the streams observing it, not by the property itself.

use crate::state::State;
use crate::stream::Stream;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// An observable value that writers update and streams follow
///
/// Cloning a `Property` returns another handle to the same property, which is
/// how writers and readers on other threads get hold of it.
///
/// # Example
///
/// ```
/// use observer_core::Property;
///
/// let prop = Property::new(10);
/// let mut stream = prop.observe();
///
/// prop.update(15);
/// assert_eq!(prop.value(), 15);
/// assert_eq!(*stream.value(), 10);
/// assert_eq!(*stream.wait_next(), 15);
/// ```
pub struct Property<T> {
    current: Arc<RwLock<Arc<State<T>>>>,
}

impl<T> Property<T> {
    /// Create a property holding `value`
    pub fn new(value: T) -> Self {
        Self {
            current: Arc::new(RwLock::new(State::new(value))),
        }
    }

    /// Get a copy of the current value
    pub fn value(&self) -> T
    where
        T: Clone,
    {
        self.current.read().value().clone()
    }

    /// Run `f` on the current value without cloning it
    ///
    /// The read lock is held while `f` runs, so keep it short: updates wait
    /// for it to return.
    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(self.current.read().value())
    }

    /// Number of updates applied since the property was created
    pub fn version(&self) -> u64 {
        self.current.read().version()
    }

    /// Set a new value, appending it to the history every stream follows
    ///
    /// Concurrent updates are serialized; none are lost and each one becomes
    /// exactly one step in the chain.
    pub fn update(&self, value: T) {
        let mut current = self.current.write();
        let next = current.advance(value);
        *current = next;
    }

    /// Create a stream positioned at the current value
    pub fn observe(&self) -> Stream<T> {
        Stream::new(Arc::clone(&self.current.read()))
    }
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
        }
    }
}

impl<T: Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for Property<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = self.current.read();
        f.debug_struct("Property")
            .field("value", current.value())
            .field("version", &current.version())
            .finish()
    }
}
