//! Pending Payload Handoff
//!
//! A freshly promoted cache entry has no value yet: the caller that received
//! the miss is expected to compute it and `put` it. Readers that arrive in
//! the meantime wait on the entry's [`PayloadSlot`] for a bounded time.
//!
//! The slot is a small state machine guarded by a `parking_lot::Mutex`, with
//! a `Condvar` that is notified whenever the state leaves `Pending`:
//!
//! ```text
//!   Pending ──fill──▶ Ready(v) ──fill──▶ Ready(v')
//!      │
//!      └──close──▶ Closed          (entry evicted before any put)
//! ```
//!
//! Waiting never holds a tier lock; the waiter only owns an `Arc` of the slot.

use core::fmt;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug)]
enum SlotState<V> {
    Pending,
    Ready(V),
    Closed,
}

/// Outcome of [`PayloadSlot::wait`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<V> {
    /// A payload was present or arrived before the deadline.
    Ready(V),
    /// The deadline passed with no payload.
    TimedOut,
    /// The owning entry was discarded while pending.
    Closed,
}

impl<V> WaitOutcome<V> {
    /// Converts the outcome into the payload, if any.
    pub fn into_value(self) -> Option<V> {
        match self {
            WaitOutcome::Ready(value) => Some(value),
            WaitOutcome::TimedOut | WaitOutcome::Closed => None,
        }
    }
}

/// Single-entry completion signal for a cached payload.
pub struct PayloadSlot<V> {
    state: Mutex<SlotState<V>>,
    ready: Condvar,
}

impl<V> PayloadSlot<V> {
    /// Creates a slot with no payload.
    pub fn pending() -> Self {
        Self {
            state: Mutex::new(SlotState::Pending),
            ready: Condvar::new(),
        }
    }

    /// Stores `value`, replacing any earlier payload, and wakes all waiters.
    ///
    /// Returns false without storing anything if the slot was closed.
    pub fn fill(&self, value: V) -> bool {
        let mut state = self.state.lock();
        if matches!(*state, SlotState::Closed) {
            return false;
        }
        *state = SlotState::Ready(value);
        drop(state);
        self.ready.notify_all();
        true
    }

    /// Marks a pending slot as abandoned and wakes all waiters.
    ///
    /// A slot that already holds a payload keeps it.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if matches!(*state, SlotState::Pending) {
            *state = SlotState::Closed;
            drop(state);
            self.ready.notify_all();
        }
    }

    /// Returns true while no payload has been stored and the slot is open.
    pub fn is_pending(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Pending)
    }
}

impl<V: Clone> PayloadSlot<V> {
    /// Returns a copy of the payload without waiting.
    pub fn peek(&self) -> Option<V> {
        match &*self.state.lock() {
            SlotState::Ready(value) => Some(value.clone()),
            SlotState::Pending | SlotState::Closed => None,
        }
    }

    /// Waits up to `timeout` for a payload.
    ///
    /// Returns immediately when the slot is already filled or closed. A zero
    /// timeout never blocks.
    pub fn wait(&self, timeout: Duration) -> WaitOutcome<V> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        loop {
            match &*state {
                SlotState::Ready(value) => return WaitOutcome::Ready(value.clone()),
                SlotState::Closed => return WaitOutcome::Closed,
                SlotState::Pending => {}
            }
            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return WaitOutcome::TimedOut;
                    }
                    // Spurious and timed-out wakeups both fall through to the
                    // state check above.
                    let _ = self.ready.wait_until(&mut state, deadline);
                }
                None => self.ready.wait(&mut state),
            }
        }
    }
}

impl<V> Default for PayloadSlot<V> {
    fn default() -> Self {
        Self::pending()
    }
}

impl<V: fmt::Debug> fmt::Debug for PayloadSlot<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadSlot")
            .field("state", &*self.state.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_pending_slot_times_out() {
        let slot: PayloadSlot<i32> = PayloadSlot::pending();
        let started = Instant::now();
        assert_eq!(slot.wait(Duration::from_millis(20)), WaitOutcome::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert!(slot.is_pending());
    }

    #[test]
    fn test_zero_timeout_does_not_block() {
        let slot: PayloadSlot<i32> = PayloadSlot::pending();
        assert_eq!(slot.wait(Duration::ZERO), WaitOutcome::TimedOut);
    }

    #[test]
    fn test_filled_slot_returns_immediately() {
        let slot = PayloadSlot::pending();
        assert!(slot.fill(42));
        assert_eq!(slot.peek(), Some(42));
        assert_eq!(slot.wait(Duration::from_secs(10)), WaitOutcome::Ready(42));
    }

    #[test]
    fn test_fill_replaces_payload() {
        let slot = PayloadSlot::pending();
        slot.fill("first");
        slot.fill("second");
        assert_eq!(slot.peek(), Some("second"));
    }

    #[test]
    fn test_close_wakes_waiter_and_rejects_fill() {
        let slot: Arc<PayloadSlot<i32>> = Arc::new(PayloadSlot::pending());
        let waiter = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || slot.wait(Duration::from_secs(10)))
        };

        thread::sleep(Duration::from_millis(20));
        slot.close();

        assert_eq!(waiter.join().unwrap(), WaitOutcome::Closed);
        assert!(!slot.fill(1));
        assert_eq!(slot.peek(), None);
    }

    #[test]
    fn test_close_keeps_existing_payload() {
        let slot = PayloadSlot::pending();
        slot.fill(5);
        slot.close();
        assert_eq!(slot.peek(), Some(5));
    }

    #[test]
    fn test_fill_wakes_waiter() {
        let slot: Arc<PayloadSlot<String>> = Arc::new(PayloadSlot::pending());
        let waiter = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || slot.wait(Duration::from_secs(10)))
        };

        thread::sleep(Duration::from_millis(20));
        slot.fill("value".to_string());

        assert_eq!(
            waiter.join().unwrap(),
            WaitOutcome::Ready("value".to_string())
        );
    }
}
