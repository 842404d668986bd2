//! Shared FIFO channel between the producer and the consumer
//!
//! One queue carries both requests and acknowledgments. Receivers block on a
//! condition variable instead of polling, and take the oldest entry that
//! matches what they are waiting for, so FIFO order holds per kind.
//!
//! Capacity bounds queued requests only. An acknowledgment never waits for
//! room, so the consumer can always answer what it took off the queue.
//! Closing the channel is the cancellation signal: every waiter wakes up,
//! new requests are refused, and acknowledgments for requests still being
//! drained are accepted.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::core::errors::{FrameworkError, Result};
use crate::exchange::envelope::Envelope;

struct ChannelState {
    queue: VecDeque<Envelope>,
    requests: usize,
    closed: bool,
    /// Times a receiver went to sleep on the condition variable
    waits: u64,
}

impl ChannelState {
    fn push_back(&mut self, envelope: Envelope) {
        if envelope.is_request() {
            self.requests += 1;
        }
        self.queue.push_back(envelope);
    }

    fn remove(&mut self, position: usize) -> Option<Envelope> {
        let envelope = self.queue.remove(position)?;
        if envelope.is_request() {
            self.requests -= 1;
        }
        Some(envelope)
    }
}

pub struct SharedChannel {
    state: Mutex<ChannelState>,
    changed: Condvar,
    capacity: Option<usize>,
}

impl SharedChannel {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(ChannelState {
                queue: VecDeque::new(),
                requests: 0,
                closed: false,
                waits: 0,
            }),
            changed: Condvar::new(),
            capacity,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn bounded(capacity: usize) -> Self {
        Self::new(Some(capacity))
    }

    fn has_room(&self, state: &ChannelState, envelope: &Envelope) -> bool {
        envelope.is_ack()
            || self
                .capacity
                .map_or(true, |capacity| state.requests < capacity)
    }

    fn accepts(state: &ChannelState, envelope: &Envelope) -> bool {
        !state.closed || envelope.is_ack()
    }

    /// Append an envelope. A request blocks while `capacity` requests are
    /// queued; an acknowledgment never blocks.
    ///
    /// After [`close`](Self::close) requests fail with
    /// [`FrameworkError::ChannelClosed`]; acknowledgments are still queued.
    pub fn push(&self, envelope: Envelope) -> Result<()> {
        let mut state = self.state.lock();
        loop {
            if !Self::accepts(&state, &envelope) {
                return Err(FrameworkError::ChannelClosed);
            }
            if self.has_room(&state, &envelope) {
                break;
            }
            state.waits += 1;
            self.changed.wait(&mut state);
        }
        state.push_back(envelope);
        drop(state);
        self.changed.notify_all();
        Ok(())
    }

    /// Attempts to append without blocking.
    /// Returns false if there is no room or the channel refuses the envelope.
    pub fn try_push(&self, envelope: Envelope) -> bool {
        let mut state = self.state.lock();
        if !Self::accepts(&state, &envelope) || !self.has_room(&state, &envelope) {
            return false;
        }
        state.push_back(envelope);
        drop(state);
        self.changed.notify_all();
        true
    }

    /// Pop the front entry, whatever it is
    pub fn try_pop(&self) -> Option<Envelope> {
        let mut state = self.state.lock();
        let envelope = state.remove(0);
        drop(state);
        if envelope.is_some() {
            self.changed.notify_all();
        }
        envelope
    }

    fn take_matching<P>(
        &self,
        state: &mut MutexGuard<'_, ChannelState>,
        predicate: &P,
    ) -> Option<Envelope>
    where
        P: Fn(&Envelope) -> bool,
    {
        let position = state.queue.iter().position(predicate)?;
        state.remove(position)
    }

    /// Remove the oldest entry matching `predicate`, blocking until one shows
    /// up.
    ///
    /// Returns `Ok(None)` when `timeout` elapses first, and
    /// [`FrameworkError::ChannelClosed`] once the channel is closed and no
    /// matching entry is left.
    pub fn recv_matching<P>(
        &self,
        predicate: P,
        timeout: Option<Duration>,
    ) -> Result<Option<Envelope>>
    where
        P: Fn(&Envelope) -> bool,
    {
        // a timeout too large to represent waits without one
        let deadline = timeout.and_then(|timeout| Instant::now().checked_add(timeout));
        let mut state = self.state.lock();
        loop {
            if let Some(envelope) = self.take_matching(&mut state, &predicate) {
                drop(state);
                self.changed.notify_all();
                return Ok(Some(envelope));
            }
            if state.closed {
                return Err(FrameworkError::ChannelClosed);
            }
            match deadline {
                Some(deadline) => {
                    state.waits += 1;
                    if self.changed.wait_until(&mut state, deadline).timed_out() {
                        let envelope = self.take_matching(&mut state, &predicate);
                        drop(state);
                        if envelope.is_some() {
                            self.changed.notify_all();
                        }
                        return Ok(envelope);
                    }
                }
                None => {
                    state.waits += 1;
                    self.changed.wait(&mut state);
                }
            }
        }
    }

    /// Block until a request is available
    pub fn recv_request(&self) -> Result<Envelope> {
        loop {
            if let Some(envelope) = self.recv_matching(Envelope::is_request, None)? {
                return Ok(envelope);
            }
        }
    }

    /// Close the channel for new requests and wake every waiter
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.changed.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Requests currently queued
    pub fn queued_requests(&self) -> usize {
        self.state.lock().requests
    }

    /// How many times a caller blocked on the channel so far
    pub fn wait_count(&self) -> u64 {
        self.state.lock().waits
    }

    /// Copy of the queued entries, front first
    pub fn snapshot(&self) -> Vec<Envelope> {
        self.state.lock().queue.iter().cloned().collect()
    }
}

impl Default for SharedChannel {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl std::fmt::Debug for SharedChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SharedChannel")
            .field("len", &state.queue.len())
            .field("capacity", &self.capacity)
            .field("closed", &state.closed)
            .finish()
    }
}
