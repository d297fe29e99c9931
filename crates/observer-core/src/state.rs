//! Version nodes - the immutable chain a property's history is built from
//!
//! Each node holds one value, a write-once link to its successor and the
//! [`Signal`] that fires when that link is installed. Nodes are shared through
//! `Arc`: a node lives for as long as the property or any stream still points
//! at it, and everything after it stays alive through the `next` links.

use crate::signal::Signal;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::trace;

pub(crate) struct State<T> {
    value: T,
    version: u64,
    next: OnceLock<Arc<State<T>>>,
    ready: Arc<Signal>,
}

impl<T> State<T> {
    /// Create the first node of a chain
    pub(crate) fn new(value: T) -> Arc<Self> {
        Arc::new(Self::with_version(value, 0))
    }

    fn with_version(value: T, version: u64) -> Self {
        Self {
            value,
            version,
            next: OnceLock::new(),
            ready: Arc::new(Signal::new()),
        }
    }

    pub(crate) fn value(&self) -> &T {
        &self.value
    }

    /// Position of this node in its chain; the first node is version 0
    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    /// The successor, if this node has been advanced
    pub(crate) fn next(&self) -> Option<&Arc<State<T>>> {
        self.next.get()
    }

    pub(crate) fn ready(&self) -> &Arc<Signal> {
        &self.ready
    }

    /// Append a node holding `value` after this one and fire the ready signal
    ///
    /// The link is stored before the signal fires, so anyone who sees the
    /// signal set also sees `next`. Callers must serialize advances on a node;
    /// advancing the same node twice panics.
    pub(crate) fn advance(&self, value: T) -> Arc<State<T>> {
        let next = Arc::new(Self::with_version(value, self.version + 1));
        if self.next.set(Arc::clone(&next)).is_err() {
            panic!("version {} was advanced twice", self.version);
        }
        self.ready.fire();
        trace!(version = next.version, "advanced version chain");
        next
    }
}

impl<T> Drop for State<T> {
    fn drop(&mut self) {
        // Unlink iteratively so a long unobserved tail can't overflow the stack.
        let mut next = self.next.take();
        while let Some(node) = next {
            next = match Arc::try_unwrap(node) {
                Ok(mut node) => node.next.take(),
                Err(_) => None,
            };
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("value", &self.value)
            .field("version", &self.version)
            .field("has_next", &self.next.get().is_some())
            .finish()
    }
}
