//! Observer Core - Observable properties with lossless per-reader streams
//!
//! This crate provides a thread-safe value that writers update over time and
//! cursors that let each reader consume every update at its own pace:
//! - [`Property`] - the current value; `update`, `value`, `observe`
//! - [`Stream`] - a reader's position in the history; `next`, `wait_next`, ...
//! - [`CancelToken`] - cancellation and deadlines for blocking waits
//! - [`Signal`] - the one-shot "newer value available" notification
//!
//! ## Architecture
//!
//! ```text
//! Property ──▶ v3
//!
//! v0 ──next──▶ v1 ──next──▶ v2 ──next──▶ v3
//!  ▲                         ▲            ▲
//!  stream A                  stream B     stream C
//! ```
//!
//! History is a singly-linked chain of immutable version nodes. An update
//! appends a node and fires the previous node's signal; streams follow the
//! links. Nodes nobody points at any more are freed, so a slow reader costs
//! memory for the values it hasn't consumed, but never blocks the writer.
//!
//! ## Example
//!
//! ```
//! use observer_core::Property;
//! use std::thread;
//!
//! let prop = Property::new(0);
//! let mut stream = prop.observe();
//!
//! let writer = {
//!     let prop = prop.clone();
//!     thread::spawn(move || {
//!         for i in 1..=3 {
//!             prop.update(i);
//!         }
//!     })
//! };
//!
//! assert_eq!(*stream.wait_next(), 1);
//! assert_eq!(*stream.wait_next(), 2);
//! assert_eq!(*stream.wait_next(), 3);
//! writer.join().unwrap();
//! ```

mod cancel;
mod error;
mod property;
mod signal;
mod state;
mod stream;

pub use cancel::CancelToken;
pub use error::{Error, Result};
pub use property::Property;
pub use signal::Signal;
pub use stream::{Iter, Stream, TryIter};
