//! Cancellation tokens for bounded waits
//!
//! A [`CancelToken`] aborts `Stream::wait_next_ctx` and friends, either when
//! [`CancelToken::cancel`] is called or when its deadline passes. Clones share
//! the same state, so one thread can cancel a wait running on another.

use crate::error::{Error, Result};
use crate::signal::Signal;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Inner {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
    /// Signals that threads are currently blocked on under this token
    waiters: Mutex<Vec<Arc<Signal>>>,
}

/// Shared cancellation state with an optional deadline
///
/// # Example
///
/// ```
/// use observer_core::{CancelToken, Error, Property};
/// use std::time::Duration;
///
/// let prop = Property::new(1);
/// let mut stream = prop.observe();
///
/// let token = CancelToken::with_timeout(Duration::from_millis(5));
/// assert_eq!(stream.wait_next_ctx(&token), Err(Error::DeadlineExceeded));
/// assert_eq!(*stream.value(), 1);
/// ```
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// Create a token that is only done once `cancel()` is called
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a token that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::build(Some(deadline))
    }

    /// Create a token that expires `timeout` from now
    ///
    /// A timeout too large to represent as an `Instant` never expires.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Instant::now().checked_add(timeout))
    }

    fn build(deadline: Option<Instant>) -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                deadline,
                waiters: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Cancel the token and wake every wait currently blocked on it
    ///
    /// Cancelling twice is a no-op.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let waiters = self.inner.waiters.lock();
        for signal in waiters.iter() {
            signal.wake_all();
        }
    }

    /// Check whether `cancel()` has been called
    ///
    /// Does not consider the deadline; use [`CancelToken::check`] for that.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Get the deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Return the reason this token is done, or `Ok(())` if it is still live
    ///
    /// Explicit cancellation is reported ahead of an expired deadline.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Check whether the token is cancelled or expired
    pub fn is_done(&self) -> bool {
        self.check().is_err()
    }

    /// Register a signal to be woken on cancellation for as long as the guard lives
    pub(crate) fn register(&self, signal: &Arc<Signal>) -> Registration<'_> {
        self.inner.waiters.lock().push(Arc::clone(signal));
        Registration {
            token: self,
            signal: Arc::clone(signal),
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.inner.deadline)
            .finish()
    }
}

/// Removes a signal from its token's waiter list on drop
pub(crate) struct Registration<'a> {
    token: &'a CancelToken,
    signal: Arc<Signal>,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        let mut waiters = self.token.inner.waiters.lock();
        if let Some(index) = waiters.iter().position(|s| Arc::ptr_eq(s, &self.signal)) {
            waiters.swap_remove(index);
        }
    }
}
