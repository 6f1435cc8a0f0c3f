//! # Frame Buffer
//!
//! The bounded, time-ordered queue between the producer (simulation)
//! thread and the dispatch thread, and the single point of
//! synchronization between them.
//!
//! ## Monitor discipline
//!
//! One mutex guards the queue; three condition variables carry three
//! distinct wait predicates, so a wakeup can never be missed or
//! misrouted:
//!
//! - `space` - producers blocked on a full buffer; exactly one is woken
//!   per freed slot
//! - `ready` - the dispatch thread waiting for a head frame (or for its
//!   due time)
//! - `empty` - flush callers waiting for the queue to drain and the
//!   last popped frame to finish dispatching; a popped frame stays in
//!   flight until [`FrameBuffer::dispatch_complete`]
//!
//! A full buffer is not an error. Blocking the producer here is the
//! backpressure that couples simulation speed to renderer speed.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::clock::Clock;
use crate::error::{SchedulerError, SchedulerResult};
use crate::frame::Frame;

/// Queue state under the monitor lock.
#[derive(Debug)]
struct Queue<S> {
    frames: VecDeque<Frame<S>>,
    capacity: usize,
    /// A popped frame is being dispatched; the buffer is not yet
    /// "empty" for flush purposes.
    dispatching: bool,
    shutdown: bool,
}

/// Bounded FIFO of pending frames with blocking backpressure.
///
/// Capacity 0 means unbuffered: `enqueue` is never legal and the
/// scheduler renders synchronously instead.
#[derive(Debug)]
pub struct FrameBuffer<S> {
    queue: Mutex<Queue<S>>,
    space: Condvar,
    ready: Condvar,
    empty: Condvar,
}

impl<S> FrameBuffer<S> {
    /// Creates a buffer holding at most `capacity` frames.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(Queue {
                frames: VecDeque::with_capacity(capacity),
                capacity,
                dispatching: false,
                shutdown: false,
            }),
            space: Condvar::new(),
            ready: Condvar::new(),
            empty: Condvar::new(),
        }
    }

    /// Changes the capacity.
    ///
    /// Frames already queued beyond a shrunken capacity are kept - only
    /// teardown may discard pending frames - but further enqueues block
    /// until the queue falls below the new limit.
    pub fn set_capacity(&self, capacity: usize) {
        let mut q = self.queue.lock();
        q.capacity = capacity;
        // Growing may free several producers at once.
        self.space.notify_all();
    }

    /// Current capacity in frames.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.queue.lock().capacity
    }

    /// Number of queued frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().frames.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().frames.is_empty()
    }

    /// Appends a frame, blocking while the buffer is at capacity.
    ///
    /// Returns the time spent blocked and the occupancy after the push.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::ShuttingDown`] if the scheduler tears down
    /// while this producer is blocked (the terminal wakeup).
    pub fn enqueue(&self, frame: Frame<S>) -> SchedulerResult<(Duration, usize)> {
        let start = Instant::now();
        let mut q = self.queue.lock();
        while q.frames.len() >= q.capacity && !q.shutdown {
            self.space.wait(&mut q);
        }
        if q.shutdown {
            return Err(SchedulerError::ShuttingDown);
        }
        // The producer submits in simulated-time order; the queue never
        // reorders, so the head-to-tail sequence stays non-decreasing.
        debug_assert!(
            q.frames.back().map_or(true, |back| back.sim_time <= frame.sim_time),
            "frame buffer received out-of-order simulated times"
        );
        q.frames.push_back(frame);
        let occupancy = q.frames.len();
        self.ready.notify_one();
        Ok((start.elapsed(), occupancy))
    }

    /// Blocks until a head frame exists, returning its simulated time.
    ///
    /// Returns `None` once the buffer has shut down; any frames still
    /// queued at that point are teardown discards, not dispatch work.
    #[must_use]
    pub fn wait_ready(&self) -> Option<f64> {
        let mut q = self.queue.lock();
        while q.frames.is_empty() && !q.shutdown {
            self.ready.wait(&mut q);
        }
        if q.shutdown {
            None
        } else {
            q.frames.front().map(|frame| frame.sim_time)
        }
    }

    /// Blocks until `deadline` has arrived (or already passed), as
    /// judged by the supplied clock.
    ///
    /// Returns `false` if the buffer shut down while waiting.
    #[must_use]
    pub fn wait_until_due(&self, clock: &dyn Clock, deadline: Instant) -> bool {
        let mut q = self.queue.lock();
        loop {
            if q.shutdown {
                return false;
            }
            let now = clock.now();
            if now >= deadline {
                return true;
            }
            // Enqueue notifications land here too; spurious wakeups
            // just re-check the clock.
            let _ = self.ready.wait_for(&mut q, deadline - now);
        }
    }

    /// Removes the head frame, marking it in flight until
    /// [`FrameBuffer::dispatch_complete`].
    ///
    /// Returns the frame and the occupancy after the pop. Wakes exactly
    /// one blocked producer for the freed slot.
    #[must_use]
    pub fn pop(&self) -> Option<(Frame<S>, usize)> {
        let mut q = self.queue.lock();
        let frame = q.frames.pop_front()?;
        q.dispatching = true;
        let occupancy = q.frames.len();
        self.space.notify_one();
        Some((frame, occupancy))
    }

    /// Marks the frame taken by the last `pop` as dispatched, waking
    /// flush callers once the queue is also empty. A frame counts as
    /// delivered only after this call.
    pub fn dispatch_complete(&self) {
        let mut q = self.queue.lock();
        q.dispatching = false;
        if q.frames.is_empty() {
            self.empty.notify_all();
        }
    }

    /// Blocks until the queue is empty and no popped frame is still
    /// being dispatched.
    ///
    /// Frames drain at their scheduled pace; this only waits, it never
    /// hurries them.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::ShuttingDown`] if teardown interrupts the wait.
    pub fn wait_empty(&self) -> SchedulerResult<()> {
        let mut q = self.queue.lock();
        while (!q.frames.is_empty() || q.dispatching) && !q.shutdown {
            self.empty.wait(&mut q);
        }
        if q.shutdown && (!q.frames.is_empty() || q.dispatching) {
            Err(SchedulerError::ShuttingDown)
        } else {
            Ok(())
        }
    }

    /// Enters the terminal state: no more enqueues, every waiter woken.
    pub fn shutdown(&self) {
        let mut q = self.queue.lock();
        q.shutdown = true;
        self.space.notify_all();
        self.ready.notify_all();
        self.empty.notify_all();
    }

    /// Discards every queued frame, returning how many were dropped.
    ///
    /// Only teardown calls this.
    pub fn drain(&self) -> usize {
        let mut q = self.queue.lock();
        let discarded = q.frames.len();
        q.frames.clear();
        self.space.notify_all();
        self.empty.notify_all();
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, RealClock};
    use std::sync::Arc;
    use std::thread;

    fn frame(t: f64) -> Frame<f64> {
        Frame {
            sim_time: t,
            snapshot: t,
        }
    }

    #[test]
    fn fifo_order_is_preserved() {
        let buffer = FrameBuffer::new(4);
        for t in [0.0, 0.5, 1.0] {
            buffer.enqueue(frame(t)).unwrap();
        }
        assert_eq!(buffer.len(), 3);
        let (first, remaining) = buffer.pop().unwrap();
        assert_eq!(first.sim_time, 0.0);
        assert_eq!(remaining, 2);
        assert_eq!(buffer.pop().unwrap().0.sim_time, 0.5);
        assert_eq!(buffer.pop().unwrap().0.sim_time, 1.0);
        assert!(buffer.pop().is_none());
    }

    #[test]
    fn enqueue_blocks_until_a_slot_frees() {
        let buffer = Arc::new(FrameBuffer::new(1));
        buffer.enqueue(frame(0.0)).unwrap();

        let producer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.enqueue(frame(1.0)))
        };

        // Give the producer time to block on the full buffer.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(buffer.len(), 1);

        let (head, _) = buffer.pop().unwrap();
        assert_eq!(head.sim_time, 0.0);

        let (blocked, occupancy) = producer.join().unwrap().unwrap();
        assert!(blocked >= Duration::from_millis(30));
        assert_eq!(occupancy, 1);
    }

    #[test]
    fn shutdown_wakes_a_blocked_producer_with_terminal_error() {
        let buffer = Arc::new(FrameBuffer::new(1));
        buffer.enqueue(frame(0.0)).unwrap();

        let producer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.enqueue(frame(1.0)))
        };

        thread::sleep(Duration::from_millis(50));
        buffer.shutdown();

        assert!(matches!(
            producer.join().unwrap(),
            Err(SchedulerError::ShuttingDown)
        ));
    }

    #[test]
    fn wait_empty_returns_once_drained() {
        let buffer = Arc::new(FrameBuffer::new(4));
        buffer.enqueue(frame(0.0)).unwrap();
        buffer.enqueue(frame(1.0)).unwrap();

        let flusher = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.wait_empty())
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!flusher.is_finished());

        let _ = buffer.pop();
        buffer.dispatch_complete();
        let _ = buffer.pop();

        // The queue is empty but the last frame is still in flight.
        thread::sleep(Duration::from_millis(20));
        assert!(!flusher.is_finished());

        buffer.dispatch_complete();
        flusher.join().unwrap().unwrap();
    }

    #[test]
    fn capacity_zero_is_always_full() {
        let buffer = Arc::new(FrameBuffer::new(0));
        let producer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.enqueue(frame(0.0)))
        };
        thread::sleep(Duration::from_millis(20));
        assert!(!producer.is_finished());
        buffer.shutdown();
        assert!(producer.join().unwrap().is_err());
    }

    #[test]
    fn shrinking_capacity_keeps_queued_frames() {
        let buffer = FrameBuffer::new(4);
        for t in [0.0, 1.0, 2.0] {
            buffer.enqueue(frame(t)).unwrap();
        }
        buffer.set_capacity(1);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.pop().unwrap().0.sim_time, 0.0);
    }

    #[test]
    fn wait_until_due_respects_past_deadlines() {
        let buffer: FrameBuffer<f64> = FrameBuffer::new(1);
        let clock = RealClock;
        assert!(buffer.wait_until_due(&clock, Instant::now() - Duration::from_millis(1)));
        let start = Instant::now();
        assert!(buffer.wait_until_due(&clock, start + Duration::from_millis(40)));
        assert!(start.elapsed() >= Duration::from_millis(35));
    }

    #[test]
    fn due_times_follow_the_supplied_clock() {
        let buffer: FrameBuffer<f64> = FrameBuffer::new(1);
        let clock = ManualClock::new();
        let deadline = clock.now() + Duration::from_secs(5);
        clock.advance(Duration::from_secs(5));

        // The deadline has passed on the manual clock, so the wait
        // must return without consuming real time.
        let start = Instant::now();
        assert!(buffer.wait_until_due(&clock, deadline));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
