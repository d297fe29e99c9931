//! Error types for observer-core
//!
//! The only runtime failure is an aborted wait. Calling `Stream::next` or
//! `Stream::peek` without a successor is a programming error and panics.

use thiserror::Error;

/// Result type for cancellable waits
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a cancellable wait gave up before a new value arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The token was cancelled explicitly
    #[error("wait cancelled")]
    Cancelled,

    /// The token's deadline passed
    #[error("wait deadline exceeded")]
    DeadlineExceeded,
}

impl Error {
    /// Check whether the wait ended because of a deadline rather than `cancel()`
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::DeadlineExceeded)
    }
}

// Compile-time check that Error is Send + Sync so waits can run on any thread.
fn _assert_error_send_sync<T: Send + Sync>() {}
fn _error_is_send_sync() {
    _assert_error_send_sync::<Error>();
}
