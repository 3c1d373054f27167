//! Manual-reset [`Event`] and the bounded, blocking [`HandoffBuffer`] built on it.
//!
//! These are the two foundation layers of the runtime: everything a
//! [`crate::stage::StageWorker`] does to block or wake up goes through one of
//! these two types. The latch-and-broadcast shape follows the familiar
//! `Mutex<bool>` + `Condvar` flush-signal pattern, generalized here to
//! manual-reset (non-self-clearing) semantics so a late waiter still
//! observes a signal that already fired.

use crate::error::{BufferError, EventError};
use std::collections::VecDeque;

#[cfg(feature = "loom")]
use loom::sync::{Condvar, Mutex};
#[cfg(not(feature = "loom"))]
use std::sync::{Condvar, Mutex};

/// A boolean, latched, broadcast-on-signal condition.
///
/// Unlike a plain condvar wait, a `signal` that arrives before anyone is
/// waiting is not lost: the next `wait` observes it immediately. Multiple
/// waiters parked on the same `Event` are all released by a single
/// `signal` (manual-reset / broadcast semantics) — `wait` does not clear
/// the latch itself, callers `reset` explicitly when they want to wait
/// again for a *subsequent* signal.
pub struct Event {
    latched: Mutex<bool>,
    condvar: Condvar,
}

impl Event {
    /// A new, unlatched event.
    pub fn new() -> Self {
        Event {
            latched: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Latch the event and wake every current waiter. Idempotent: signaling
    /// an already-latched event wakes no one (there is nothing new to
    /// observe) and leaves it latched.
    pub fn signal(&self) {
        let mut latched = match self.latched.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *latched = true;
        self.condvar.notify_all();
    }

    /// Clear the latch. Wakes no one.
    pub fn reset(&self) {
        let mut latched = match self.latched.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *latched = false;
    }

    /// Block until the event is latched. Returns immediately if it already is.
    pub fn wait(&self) -> Result<(), EventError> {
        let mut latched = self.latched.lock().map_err(|_| EventError::Poisoned)?;
        while !*latched {
            latched = self
                .condvar
                .wait(latched)
                .map_err(|_| EventError::Poisoned)?;
        }
        Ok(())
    }

    /// Non-blocking peek at the current latch state, without consuming it.
    ///
    /// Used by [`HandoffBuffer::get`] to check `finished` after waking from a
    /// `not_empty` wait, rather than introducing a second independent wait.
    pub fn is_signaled(&self) -> bool {
        match self.latched.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

/// A bounded FIFO of owned records with blocking put/get and a completion
/// event, shared between exactly one producer side and one consumer side.
///
/// The slot storage is a `VecDeque`; `capacity` bounds how many elements may
/// be queued at once. `not_full` is signaled eagerly at construction (an
/// empty buffer is never full) so the first `put` never blocks.
pub struct HandoffBuffer<T> {
    capacity: usize,
    queue: Mutex<VecDeque<T>>,
    not_full: Event,
    not_empty: Event,
    finished: Event,
}

impl<T> HandoffBuffer<T> {
    /// Allocate a new buffer. `capacity` must be positive; `capacity == 1` is
    /// legal and exercised by the boundary tests in this module.
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::InvalidCapacity(capacity));
        }
        let not_full = Event::new();
        not_full.signal();
        Ok(HandoffBuffer {
            capacity,
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            not_full,
            not_empty: Event::new(),
            finished: Event::new(),
        })
    }

    /// Append `item` to the tail, blocking while the buffer is full.
    ///
    /// `BufferError::ShuttingDown` is reserved for a concurrent teardown
    /// racing a live producer; under this crate's ownership discipline (a
    /// buffer's producer side is retired before `fini` ever touches it) that
    /// race cannot occur, so the variant exists to complete the error
    /// taxonomy rather than because this method raises it today.
    pub fn put(&self, item: T) -> Result<(), BufferError> {
        loop {
            {
                let mut queue = self.queue.lock().map_err(|_| EventError::Poisoned)?;
                if queue.len() < self.capacity {
                    queue.push_back(item);
                    drop(queue);
                    self.not_empty.signal();
                    return Ok(());
                }
            }
            self.not_full.reset();
            // Re-check under the guard before parking: a get() may have freed
            // a slot and signaled not_full between releasing the lock above
            // and this reset — without the recheck we'd wait on a latch that
            // will never fire again.
            {
                let mut queue = self.queue.lock().map_err(|_| EventError::Poisoned)?;
                if queue.len() < self.capacity {
                    queue.push_back(item);
                    drop(queue);
                    self.not_empty.signal();
                    return Ok(());
                }
            }
            self.not_full.wait()?;
        }
    }

    /// Remove and return the head record, blocking while the buffer is
    /// empty. Returns `None` once the buffer has drained and
    /// [`HandoffBuffer::signal_finished`] has been called — the caller (the
    /// worker loop) must treat that as a clean end-of-stream exit, not an
    /// error.
    pub fn get(&self) -> Option<T> {
        loop {
            {
                let mut queue = self.queue.lock().ok()?;
                if let Some(item) = queue.pop_front() {
                    drop(queue);
                    self.not_full.signal();
                    return Some(item);
                }
                if self.finished.is_signaled() {
                    return None;
                }
            }
            self.not_empty.reset();
            {
                let mut queue = self.queue.lock().ok()?;
                if let Some(item) = queue.pop_front() {
                    drop(queue);
                    self.not_full.signal();
                    return Some(item);
                }
                if self.finished.is_signaled() {
                    return None;
                }
            }
            self.not_empty.wait().ok()?;
        }
    }

    /// Latch `finished` and wake any getter parked on an empty buffer.
    /// Idempotent; called exactly once in normal operation, by the worker
    /// draining this buffer, right after it has observed and propagated the
    /// sentinel. May also be invoked by [`crate::stage::StageWorker::fini`]
    /// during abnormal teardown to force a worker stuck on an empty input
    /// buffer to exit.
    pub fn signal_finished(&self) {
        self.finished.signal();
        self.not_empty.signal();
    }

    /// Block until [`HandoffBuffer::signal_finished`] has been called.
    pub fn wait_finished(&self) -> Result<(), EventError> {
        self.finished.wait()
    }

    /// Fixed capacity this buffer was constructed with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current occupancy. Racy by nature (another thread may mutate the
    /// instant after this returns) — intended for diagnostics and tests, not
    /// for making blocking decisions.
    pub fn len(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn signal_before_wait_is_still_observed() {
        let e = Event::new();
        e.signal();
        assert!(e.wait().is_ok());
    }

    #[test]
    fn reset_then_wait_blocks_until_next_signal() {
        let e = Arc::new(Event::new());
        e.signal();
        e.reset();
        assert!(!e.is_signaled());

        let e2 = Arc::clone(&e);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            e2.signal();
        });
        e.wait().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn single_signal_releases_all_waiters() {
        let e = Arc::new(Event::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let e = Arc::clone(&e);
            handles.push(thread::spawn(move || e.wait().is_ok()));
        }
        thread::sleep(Duration::from_millis(20));
        e.signal();
        for h in handles {
            assert!(h.join().unwrap());
        }
    }

    #[test]
    fn zero_capacity_is_invalid() {
        assert!(matches!(
            HandoffBuffer::<i32>::new(0),
            Err(BufferError::InvalidCapacity(0))
        ));
    }

    #[test]
    fn capacity_one_put_get_round_trips() {
        let buf = HandoffBuffer::<i32>::new(1).unwrap();
        buf.put(1).unwrap();
        assert_eq!(buf.get(), Some(1));
        buf.put(2).unwrap();
        assert_eq!(buf.get(), Some(2));
    }

    #[test]
    fn fifo_is_preserved_for_a_single_producer() {
        let buf = HandoffBuffer::<i32>::new(4).unwrap();
        for i in 0..10 {
            buf.put(i).unwrap();
            assert_eq!(buf.get(), Some(i));
        }
    }

    #[test]
    fn blocked_putter_unblocks_after_a_get() {
        let buf = Arc::new(HandoffBuffer::<i32>::new(1).unwrap());
        buf.put(1).unwrap();

        let producer = Arc::clone(&buf);
        let handle = thread::spawn(move || {
            producer.put(2).unwrap(); // blocks until the slot frees up
        });

        thread::sleep(Duration::from_millis(20));
        assert_eq!(buf.get(), Some(1));
        handle.join().unwrap();
        assert_eq!(buf.get(), Some(2));
    }

    #[test]
    fn get_returns_none_after_finished_on_empty_buffer() {
        let buf = Arc::new(HandoffBuffer::<i32>::new(4).unwrap());
        let getter = Arc::clone(&buf);
        let handle = thread::spawn(move || getter.get());

        thread::sleep(Duration::from_millis(20));
        buf.signal_finished();
        assert_eq!(handle.join().unwrap(), None);
    }

    #[test]
    fn multi_producer_multi_consumer_preserves_multiset_equality() {
        let buf = Arc::new(HandoffBuffer::<u64>::new(5).unwrap());
        let mut producers = Vec::new();
        for p in 0..3u64 {
            let buf = Arc::clone(&buf);
            producers.push(thread::spawn(move || {
                for i in 0..5u64 {
                    buf.put(p * 100 + i).unwrap();
                }
            }));
        }

        let collected = Arc::new(Mutex::new(Vec::new()));
        let mut consumers = Vec::new();
        for _ in 0..3 {
            let buf = Arc::clone(&buf);
            let collected = Arc::clone(&collected);
            consumers.push(thread::spawn(move || loop {
                // Consumers race producers; stop once all 15 items are seen.
                if collected.lock().unwrap().len() >= 15 {
                    return;
                }
                let mut q = buf.queue.lock().unwrap();
                if let Some(item) = q.pop_front() {
                    drop(q);
                    buf.not_full.signal();
                    collected.lock().unwrap().push(item);
                } else {
                    drop(q);
                    thread::yield_now();
                }
            }));
        }

        for p in producers {
            p.join().unwrap();
        }
        for c in consumers {
            c.join().unwrap();
        }

        let mut got = collected.lock().unwrap().clone();
        got.sort_unstable();
        let mut expected: Vec<u64> = (0..3).flat_map(|p| (0..5).map(move |i| p * 100 + i)).collect();
        expected.sort_unstable();
        assert_eq!(got, expected);
        assert!(buf.is_empty());
    }

    #[cfg(feature = "loom")]
    #[test]
    fn loom_single_signal_releases_both_waiters() {
        loom::model(|| {
            let e = loom::sync::Arc::new(Event::new());
            let e1 = loom::sync::Arc::clone(&e);
            let e2 = loom::sync::Arc::clone(&e);
            let t1 = loom::thread::spawn(move || e1.wait().is_ok());
            let t2 = loom::thread::spawn(move || e2.wait().is_ok());
            e.signal();
            assert!(t1.join().unwrap());
            assert!(t2.join().unwrap());
        });
    }

    proptest::proptest! {
        #[test]
        fn fifo_holds_for_any_single_producer_sequence(items: Vec<i32>) {
            let buf = HandoffBuffer::<i32>::new(8).unwrap();
            for &item in &items {
                buf.put(item).unwrap();
            }
            let mut out = Vec::with_capacity(items.len());
            for _ in 0..items.len() {
                out.push(buf.get().unwrap());
            }
            prop_assert_eq!(out, items);
        }
    }
}
