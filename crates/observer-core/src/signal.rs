//! One-shot broadcast signal
//!
//! Every version node owns a `Signal` that fires exactly once, when the node's
//! successor is installed. Any number of threads may wait on it; all of them
//! are released by the fire, and waiting after the fire returns immediately.

use crate::cancel::CancelToken;
use crate::error::Result;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A flag that transitions from unset to set exactly once and wakes all waiters
#[derive(Debug, Default)]
pub struct Signal {
    fired: Mutex<bool>,
    cond: Condvar,
}

impl Signal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fire the signal, releasing every waiter
    ///
    /// Returns `false` if the signal had already fired.
    pub(crate) fn fire(&self) -> bool {
        let mut fired = self.fired.lock();
        if *fired {
            return false;
        }
        *fired = true;
        self.cond.notify_all();
        true
    }

    /// Wake all waiters without firing, so they re-check their cancel tokens
    pub(crate) fn wake_all(&self) {
        let _fired = self.fired.lock();
        self.cond.notify_all();
    }

    /// Check whether the signal has fired, without blocking
    pub fn is_set(&self) -> bool {
        *self.fired.lock()
    }

    /// Block until the signal fires
    pub fn wait(&self) {
        let mut fired = self.fired.lock();
        while !*fired {
            self.cond.wait(&mut fired);
        }
    }

    /// Block until the signal fires or `deadline` passes
    ///
    /// Returns `true` if the signal fired.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let mut fired = self.fired.lock();
        while !*fired {
            if self.cond.wait_until(&mut fired, deadline).timed_out() {
                return *fired;
            }
        }
        true
    }

    /// Block until the signal fires or `timeout` elapses
    ///
    /// Returns `true` if the signal fired. A timeout too large to represent
    /// as an `Instant` waits without limit.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.wait_until(deadline),
            None => {
                self.wait();
                true
            }
        }
    }

    /// Block until the signal fires or `token` is cancelled or expires
    ///
    /// The token is checked before the flag on every wakeup, so a token that
    /// is already done wins over a signal that fired at the same moment.
    pub(crate) fn wait_or_cancel(self: &Arc<Self>, token: &CancelToken) -> Result<()> {
        let _registration = token.register(self);
        let mut fired = self.fired.lock();
        loop {
            token.check()?;
            if *fired {
                return Ok(());
            }
            match token.deadline() {
                Some(deadline) => {
                    self.cond.wait_until(&mut fired, deadline);
                }
                None => self.cond.wait(&mut fired),
            }
        }
    }
}
