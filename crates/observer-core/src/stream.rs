//! Stream - a per-reader cursor over a property's history
//!
//! A stream points at one version node and only ever moves to that node's
//! successor: it never skips a value and never moves backwards. Readers
//! advance at their own pace; the writer never waits for them.
//!
//! A stream is owned by one reader. Give each thread its own stream, either
//! from `Property::observe` or by cloning an existing one.

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::signal::Signal;
use crate::state::State;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Cursor over the sequence of values a property is updated to
///
/// # Example
///
/// ```
/// use observer_core::Property;
///
/// let prop = Property::new(10);
/// let mut stream = prop.observe();
/// assert_eq!(*stream.value(), 10);
/// assert!(!stream.has_next());
///
/// prop.update(15);
/// assert!(stream.has_next());
/// assert_eq!(*stream.next(), 15);
/// assert!(!stream.has_next());
/// ```
pub struct Stream<T> {
    pub(crate) state: Arc<State<T>>,
}

impl<T> Stream<T> {
    pub(crate) fn new(state: Arc<State<T>>) -> Self {
        Self { state }
    }

    /// Value at the current position
    pub fn value(&self) -> &T {
        self.state.value()
    }

    /// Version of the current position
    ///
    /// Increases by exactly one every time the stream advances.
    pub fn version(&self) -> u64 {
        self.state.version()
    }

    /// Check whether a newer value is available, without blocking
    pub fn has_next(&self) -> bool {
        self.state.next().is_some()
    }

    /// Signal that fires when a value newer than the current one is published
    ///
    /// Waiting on it does not move the stream; call [`Stream::next`] afterwards.
    pub fn changes(&self) -> &Signal {
        self.state.ready()
    }

    /// Advance to the next value and return it
    ///
    /// # Panics
    ///
    /// Panics if there is no newer value. Only call this after `has_next()`
    /// returned `true` or `changes()` fired.
    pub fn next(&mut self) -> &T {
        let version = self.state.version();
        match self.try_next() {
            Some(value) => value,
            None => panic!("Stream::next called at version {version} with no newer value"),
        }
    }

    /// Advance to the next value if one has been published
    pub fn try_next(&mut self) -> Option<&T> {
        let next = Arc::clone(self.state.next()?);
        self.state = next;
        Some(self.state.value())
    }

    /// Look at the next value without advancing
    ///
    /// # Panics
    ///
    /// Panics if there is no newer value, like [`Stream::next`].
    pub fn peek(&self) -> &T {
        match self.try_peek() {
            Some(value) => value,
            None => panic!(
                "Stream::peek called at version {} with no newer value",
                self.state.version()
            ),
        }
    }

    /// Look at the next value without advancing, if one has been published
    pub fn try_peek(&self) -> Option<&T> {
        self.state.next().map(|next| next.value())
    }

    /// Block until a newer value is published, then advance to it
    pub fn wait_next(&mut self) -> &T {
        self.state.ready().wait();
        self.next()
    }

    /// Block until a newer value is published or `token` is done
    ///
    /// On cancellation or timeout the stream stays where it was. If the token
    /// is already done when a value arrives, the error wins; the value is not
    /// lost and the next wait returns it.
    pub fn wait_next_ctx(&mut self, token: &CancelToken) -> Result<&T> {
        if let Err(err) = Signal::wait_or_cancel(self.state.ready(), token) {
            debug!(version = self.state.version(), error = %err, "stream wait aborted");
            return Err(err);
        }
        Ok(self.next())
    }

    /// Block for at most `timeout` waiting for a newer value
    pub fn wait_next_timeout(&mut self, timeout: Duration) -> Result<&T> {
        self.wait_next_ctx(&CancelToken::with_timeout(timeout))
    }

    /// Advance until a value matching `predicate` is published and return it
    ///
    /// Values that don't match are consumed. To accept every value use
    /// [`Stream::wait_next`].
    pub fn wait_next_filtered<P>(&mut self, mut predicate: P) -> &T
    where
        P: FnMut(&T) -> bool,
    {
        loop {
            self.wait_next();
            if predicate(self.state.value()) {
                return self.state.value();
            }
        }
    }

    /// Like [`Stream::wait_next_filtered`], giving up when `token` is done
    ///
    /// Non-matching values consumed before the cancellation stay consumed; the
    /// stream is left on the last one.
    pub fn wait_next_ctx_filtered<P>(
        &mut self,
        mut predicate: P,
        token: &CancelToken,
    ) -> Result<&T>
    where
        P: FnMut(&T) -> bool,
    {
        loop {
            self.wait_next_ctx(token)?;
            if predicate(self.state.value()) {
                return Ok(self.state.value());
            }
        }
    }

    /// Iterate over the values already published, without blocking
    pub fn try_iter(&mut self) -> TryIter<'_, T> {
        TryIter { stream: self }
    }

    /// Iterate over every future value, blocking for each one
    ///
    /// The iterator never ends.
    pub fn iter(&mut self) -> Iter<'_, T> {
        Iter { stream: self }
    }
}

impl<T> Clone for Stream<T> {
    /// Create an independent cursor at the same position
    ///
    /// Both cursors follow the same chain, so they see the same future values,
    /// but advancing one never moves the other.
    fn clone(&self) -> Self {
        trace!(version = self.state.version(), "stream cloned");
        Self::new(Arc::clone(&self.state))
    }
}

impl<T: fmt::Debug> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("value", self.state.value())
            .field("version", &self.state.version())
            .field("has_next", &self.has_next())
            .finish()
    }
}

/// Non-blocking iterator over published values, see [`Stream::try_iter`]
#[derive(Debug)]
pub struct TryIter<'a, T> {
    stream: &'a mut Stream<T>,
}

impl<T: Clone> Iterator for TryIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.stream.try_next().cloned()
    }
}

/// Blocking iterator over future values, see [`Stream::iter`]
#[derive(Debug)]
pub struct Iter<'a, T> {
    stream: &'a mut Stream<T>,
}

impl<T: Clone> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        Some(self.stream.wait_next().clone())
    }
}

// Streams move between threads; State is shared read-only once published.
fn _assert_send<T: Send>() {}
fn _stream_is_send() {
    _assert_send::<Stream<String>>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Property};
    use std::thread;

    fn stream_at(state: &Arc<State<i32>>) -> Stream<i32> {
        Stream::new(Arc::clone(state))
    }

    #[test]
    fn test_initial_value() {
        let state = State::new(10);
        let stream = stream_at(&state);
        assert_eq!(*stream.value(), 10);
        assert_eq!(stream.version(), 0);
    }

    #[test]
    fn test_value_is_stable_while_chain_grows() {
        let first = State::new(10);
        let second = first.advance(15);
        let stream = stream_at(&first);
        assert_eq!(*stream.value(), 10);

        second.advance(20);
        assert_eq!(*stream.value(), 10);
    }

    #[test]
    fn test_next_value() {
        let first = State::new(10);
        let mut stream = stream_at(&first);
        let second = first.advance(15);
        assert_eq!(*stream.next(), 15);
        second.advance(20);
        assert_eq!(*stream.next(), 20);
        assert_eq!(stream.version(), 2);
    }

    #[test]
    fn test_has_next() {
        let prop = Property::new(10);
        let mut stream = prop.observe();
        assert_eq!(*stream.value(), 10);
        assert!(!stream.has_next());

        prop.update(15);
        assert!(stream.has_next());
        assert_eq!(*stream.next(), 15);
        assert!(!stream.has_next());
    }

    #[test]
    #[should_panic(expected = "no newer value")]
    fn test_next_without_successor_panics() {
        let prop = Property::new(1);
        let mut stream = prop.observe();
        stream.next();
    }

    #[test]
    #[should_panic(expected = "no newer value")]
    fn test_peek_without_successor_panics() {
        let prop = Property::new(1);
        let stream = prop.observe();
        stream.peek();
    }

    #[test]
    fn test_try_next_and_try_peek() {
        let prop = Property::new(1);
        let mut stream = prop.observe();
        assert!(stream.try_peek().is_none());
        assert!(stream.try_next().is_none());
        assert_eq!(*stream.value(), 1);

        prop.update(2);
        assert_eq!(stream.try_peek(), Some(&2));
        assert_eq!(*stream.value(), 1);
        assert_eq!(stream.try_next(), Some(&2));
    }

    #[test]
    fn test_peek_does_not_advance() {
        let prop = Property::new(1);
        let mut stream = prop.observe();
        prop.update(2);
        prop.update(3);

        assert_eq!(*stream.peek(), 2);
        assert_eq!(*stream.peek(), 2);
        assert_eq!(*stream.value(), 1);
        assert_eq!(*stream.next(), 2);
        assert_eq!(*stream.peek(), 3);
    }

    #[test]
    fn test_wait_next_sequential() {
        let mut state = State::new(10);
        let mut stream = stream_at(&state);
        for i in 15..=100 {
            state = state.advance(i);
            assert_eq!(*stream.wait_next(), i);
        }
        assert!(!stream.has_next());
    }

    #[test]
    fn test_wait_next_blocks_until_update() {
        let prop = Property::new(0);
        let mut stream = prop.observe();

        let writer = {
            let prop = prop.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                prop.update(7);
            })
        };

        assert_eq!(*stream.wait_next(), 7);
        writer.join().unwrap();
    }

    #[test]
    fn test_changes_fires_without_advancing() {
        let prop = Property::new(0);
        let stream = prop.observe();
        assert!(!stream.changes().is_set());

        prop.update(1);
        assert!(stream.changes().is_set());
        stream.changes().wait();
        assert_eq!(*stream.value(), 0);
    }

    #[test]
    fn test_independent_cursors() {
        let prop = Property::new(0);
        let mut early = prop.observe();
        prop.update(1);
        let late = prop.observe();

        assert!(early.has_next());
        assert!(!late.has_next());
        assert_eq!(*early.value(), 0);
        assert_eq!(*late.value(), 1);

        assert_eq!(*early.next(), 1);
        assert_eq!(*late.value(), 1);
        assert_eq!(early.version(), late.version());
    }

    #[test]
    fn test_clone_isolation() {
        let prop = Property::new(0);
        let mut s1 = prop.observe();
        let mut s2 = s1.clone();

        prop.update(1);
        prop.update(2);

        assert_eq!(*s1.next(), 1);
        assert_eq!(*s2.value(), 0);

        assert_eq!(*s2.next(), 1);
        assert_eq!(*s2.next(), 2);
        assert_eq!(*s1.value(), 1);

        // Both follow the same chain
        assert_eq!(*s1.next(), 2);
        prop.update(3);
        assert_eq!(*s1.wait_next(), 3);
        assert_eq!(*s2.wait_next(), 3);
    }

    #[test]
    fn test_cancelled_wait_does_not_advance() {
        let prop = Property::new(5);
        let mut stream = prop.observe();
        let token = CancelToken::new();
        token.cancel();

        assert_eq!(stream.wait_next_ctx(&token), Err(Error::Cancelled));
        assert_eq!(*stream.value(), 5);

        // A value that is already available still loses to a cancelled token
        prop.update(6);
        assert_eq!(stream.wait_next_ctx(&token), Err(Error::Cancelled));
        assert_eq!(*stream.value(), 5);

        // ...and is delivered by the next wait
        assert_eq!(stream.wait_next_ctx(&CancelToken::new()), Ok(&6));
    }

    #[test]
    fn test_wait_next_timeout() {
        let prop = Property::new(5);
        let mut stream = prop.observe();

        let result = stream.wait_next_timeout(Duration::from_millis(10));
        assert_eq!(result, Err(Error::DeadlineExceeded));
        assert_eq!(*stream.value(), 5);

        prop.update(6);
        assert_eq!(stream.wait_next_timeout(Duration::from_secs(5)), Ok(&6));
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let prop = Property::new(0);
        let mut stream = prop.observe();
        let token = CancelToken::new();

        let canceller = {
            let token = token.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                token.cancel();
            })
        };

        assert_eq!(stream.wait_next_ctx(&token), Err(Error::Cancelled));
        assert_eq!(stream.version(), 0);
        canceller.join().unwrap();
    }

    #[test]
    fn test_wait_next_ctx_receives_update() {
        let prop = Property::new(0);
        let mut stream = prop.observe();
        let token = CancelToken::with_timeout(Duration::from_secs(5));

        let writer = {
            let prop = prop.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                prop.update(1);
            })
        };

        assert_eq!(stream.wait_next_ctx(&token), Ok(&1));
        writer.join().unwrap();
    }

    #[test]
    fn test_filtered_skips_non_matching() {
        let prop = Property::new(0);
        let mut stream = prop.observe();
        for i in 1..=6 {
            prop.update(i);
        }

        let is_even = |v: &i32| v % 2 == 0;
        assert_eq!(*stream.wait_next_filtered(is_even), 2);
        assert_eq!(*stream.value(), 2);
        assert_eq!(*stream.wait_next_filtered(is_even), 4);
        assert_eq!(*stream.wait_next_filtered(is_even), 6);
        assert!(!stream.has_next());
    }

    #[test]
    fn test_filtered_waits_across_updates() {
        let prop = Property::new(0);
        let mut stream = prop.observe();

        let writer = {
            let prop = prop.clone();
            thread::spawn(move || {
                for i in 1..=10 {
                    prop.update(i);
                }
            })
        };

        assert_eq!(*stream.wait_next_filtered(|v| *v >= 10), 10);
        writer.join().unwrap();
    }

    #[test]
    fn test_ctx_filtered() {
        let prop = Property::new(0);
        let mut stream = prop.observe();
        for i in 1..=3 {
            prop.update(i);
        }

        let token = CancelToken::with_timeout(Duration::from_millis(200));
        assert_eq!(stream.wait_next_ctx_filtered(|v| v % 2 == 0, &token), Ok(&2));

        // Only 3 remains and it doesn't match; the deadline ends the wait
        let result = stream.wait_next_ctx_filtered(|v| v % 2 == 0, &token);
        assert_eq!(result, Err(Error::DeadlineExceeded));
        assert_eq!(*stream.value(), 3);
    }

    #[test]
    fn test_try_iter_drains_published() {
        let prop = Property::new(0);
        let mut stream = prop.observe();
        for i in 1..=4 {
            prop.update(i);
        }

        let drained: Vec<_> = stream.try_iter().collect();
        assert_eq!(drained, vec![1, 2, 3, 4]);
        assert_eq!(stream.try_iter().count(), 0);
    }

    #[test]
    fn test_iter_blocks_for_values() {
        let prop = Property::new(0);
        let mut stream = prop.observe();

        let writer = {
            let prop = prop.clone();
            thread::spawn(move || {
                for i in 1..=3 {
                    prop.update(i);
                }
            })
        };

        let values: Vec<_> = stream.iter().take(3).collect();
        assert_eq!(values, vec![1, 2, 3]);
        writer.join().unwrap();
    }

    #[test]
    fn test_slow_stream_keeps_history_alive() {
        let prop = Property::new(0u32);
        let mut slow = prop.observe();
        for i in 1..=1000 {
            prop.update(i);
        }

        let mut expected = 1;
        while let Some(value) = slow.try_next() {
            assert_eq!(*value, expected);
            expected += 1;
        }
        assert_eq!(expected, 1001);
    }

    #[test]
    fn test_works_with_non_comparable_values() {
        struct Opaque(#[allow(dead_code)] Box<dyn Fn() + Send + Sync>);

        let prop = Property::new(Opaque(Box::new(|| ())));
        let mut stream = prop.observe();
        prop.update(Opaque(Box::new(|| ())));
        stream.next();
        assert_eq!(stream.version(), 1);
    }
}
