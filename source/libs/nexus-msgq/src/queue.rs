// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Thread message queue (pending sequence, quit slot, waiters, timer stubs)
//! OWNERS: @win32k
//! PUBLIC API: ThreadMessageQueue (post_message/get_message_no_wait/post_quit_message/...)
//! DEPENDS_ON: binding (scheduler, paint, clock), record
//! INVARIANTS: post drains a waiter before enqueuing; bounded pending sequence with
//!             deterministic reject; no partial mutation on failure; quit before paint

use std::collections::{BTreeMap, VecDeque};
use std::fmt::Debug;

use log::{debug, warn};

use crate::binding::{PaintSource, SchedulerBinding, TickSource};
use crate::record::{DeliverySlot, MessageRecord, Waiter};
use crate::types::{Hwnd, LParam, Msg, Point, WParam, WM_PAINT, WM_QUIT};
use crate::{QueueError, Result};

/// Posted-message limit applied when none is configured.
pub const DEFAULT_MAX_PENDING: usize = 10_000;

/// Resource bounds of a single queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueLimits {
    /// Pending records beyond this count are refused as an allocation failure.
    pub max_pending: usize,
}

impl Default for QueueLimits {
    fn default() -> Self {
        Self { max_pending: DEFAULT_MAX_PENDING }
    }
}

/// Where a successful post ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// Written straight into a blocked caller's buffer; that caller was resumed.
    HandedOff,
    /// Appended to the pending sequence.
    Queued,
}

/// Key of a registered timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerKey {
    pub hwnd: Hwnd,
    pub id: u32,
}

/// Expiry parameters of a registered timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSpec {
    pub elapse_ms: u32,
    /// Guest address of the timer procedure, 0 for `WM_TIMER` delivery.
    pub callback: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct QuitSlot {
    pending: bool,
    exit_code: u32,
}

/// Message queue of one guest thread.
///
/// `T` identifies guest threads; it is the [`SchedulerBinding::Thread`] of
/// whatever binding drives blocking retrieval.
pub struct ThreadMessageQueue<T> {
    pending: VecDeque<MessageRecord>,
    quit: QuitSlot,
    waiters: VecDeque<Waiter<T>>,
    // Populated once timer expiry delivery exists; the stubs below never insert.
    timers: BTreeMap<TimerKey, TimerSpec>,
    limits: QueueLimits,
}

impl<T: Clone + Eq + Debug> Default for ThreadMessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Eq + Debug> ThreadMessageQueue<T> {
    /// Creates an empty queue with default limits.
    pub fn new() -> Self {
        Self::with_limits(QueueLimits::default())
    }

    /// Creates an empty queue with explicit limits.
    pub fn with_limits(limits: QueueLimits) -> Self {
        Self {
            pending: VecDeque::new(),
            quit: QuitSlot::default(),
            waiters: VecDeque::new(),
            timers: BTreeMap::new(),
            limits,
        }
    }

    pub fn limits(&self) -> QueueLimits {
        self.limits
    }

    /// Number of posted messages not yet retrieved.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of threads blocked in a retrieval call on this queue.
    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }

    pub fn has_waiter(&self, thread: &T) -> bool {
        self.waiters.iter().any(|w| w.thread == *thread)
    }

    pub fn quit_pending(&self) -> bool {
        self.quit.pending
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Posts a message to this queue.
    ///
    /// The first waiter, if any, receives the message directly and is resumed
    /// after the queue has finished mutating. Otherwise a record is appended.
    pub fn post_message<S>(
        &mut self,
        sched: &S,
        clock: &impl TickSource,
        hwnd: Hwnd,
        message: u32,
        wparam: WParam,
        lparam: LParam,
    ) -> Result<PostOutcome>
    where
        S: SchedulerBinding<Thread = T>,
    {
        let time = clock.tick_count();

        if let Some(waiter) = self.waiters.pop_front() {
            waiter.slot.fill(Msg { hwnd, message, wparam, lparam, time, pt: Point::default() });
            debug!("msgq: hand-off {:#06x} to {:?}", message, waiter.thread);
            // may reschedule here
            sched.resume(&waiter.thread);
            return Ok(PostOutcome::HandedOff);
        }

        if self.pending.len() >= self.limits.max_pending {
            warn!(
                "msgq: refusing {:#06x} for {:?}, {} messages pending",
                message,
                hwnd,
                self.pending.len()
            );
            return Err(QueueError::AllocationFailure);
        }
        self.pending.try_reserve(1).map_err(|_| QueueError::AllocationFailure)?;
        self.pending.push_back(MessageRecord::new(hwnd, message, wparam, lparam, time));
        Ok(PostOutcome::Queued)
    }

    /// Arms the one-shot quit notification, replacing any pending exit code.
    ///
    /// Blocked waiters are not woken; the quit is observed by the next retrieval.
    pub fn post_quit_message(&mut self, exit_code: u32) {
        self.quit = QuitSlot { pending: true, exit_code };
    }

    /// Non-blocking retrieval: posted message, then quit, then paint.
    ///
    /// `min` and `max` are accepted for interface compatibility and not applied.
    pub fn get_message_no_wait<P>(
        &mut self,
        caller: &T,
        paint: &P,
        clock: &impl TickSource,
        hwnd: Hwnd,
        _min: u32,
        _max: u32,
    ) -> Option<Msg>
    where
        P: PaintSource<T> + ?Sized,
    {
        self.get_posted_message(hwnd)
            .or_else(|| self.get_quit_message())
            .or_else(|| Self::get_paint_message(caller, paint, clock, hwnd))
    }

    // Not filtered by window: the oldest record wins regardless of `hwnd`.
    fn get_posted_message(&mut self, _hwnd: Hwnd) -> Option<Msg> {
        self.pending.pop_front().map(MessageRecord::into_msg)
    }

    fn get_quit_message(&mut self) -> Option<Msg> {
        if !self.quit.pending {
            return None;
        }
        self.quit.pending = false;
        Some(Msg { message: WM_QUIT, wparam: self.quit.exit_code, ..Msg::zeroed() })
    }

    fn get_paint_message<P>(caller: &T, paint: &P, clock: &impl TickSource, hwnd: Hwnd) -> Option<Msg>
    where
        P: PaintSource<T> + ?Sized,
    {
        let window = paint.find_window_to_repaint(hwnd, caller)?;
        Some(Msg { hwnd: window, message: WM_PAINT, time: clock.tick_count(), ..Msg::zeroed() })
    }

    /// Registers `thread` as blocked on this queue and returns its output buffer.
    ///
    /// A thread already registered keeps its existing record.
    pub fn register_waiter(&mut self, thread: T) -> Result<DeliverySlot> {
        if let Some(existing) = self.waiters.iter().find(|w| w.thread == thread) {
            return Ok(existing.slot.clone());
        }
        self.waiters.try_reserve(1).map_err(|_| QueueError::AllocationFailure)?;
        let waiter = Waiter::new(thread);
        let slot = waiter.slot.clone();
        self.waiters.push_back(waiter);
        Ok(slot)
    }

    /// Unlinks the waiter record of `thread`, if still linked.
    ///
    /// Idempotent: delivery, termination and the resumed caller may all call it.
    pub fn remove_waiter(&mut self, thread: &T) -> bool {
        match self.waiters.iter().position(|w| w.thread == *thread) {
            Some(index) => {
                self.waiters.remove(index);
                true
            }
            None => false,
        }
    }

    /// Timer registration. Not implemented; never mutates the queue.
    pub fn set_timer(&mut self, _hwnd: Hwnd, _id: u32, _elapse_ms: u32, _callback: u32) -> Result<()> {
        Err(QueueError::NotImplemented)
    }

    /// Timer cancellation. Not implemented; never mutates the queue.
    pub fn kill_timer(&mut self, _hwnd: Hwnd, _id: u32) -> Result<()> {
        Err(QueueError::NotImplemented)
    }

    /// Waitable-object state of the queue. Never signalled.
    pub fn is_signalled(&self) -> bool {
        false
    }
}

impl<T> ThreadMessageQueue<T> {
    /// Releases every undelivered record and returns how many there were.
    pub fn drain(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }
}

impl<T> Drop for ThreadMessageQueue<T> {
    fn drop(&mut self) {
        let dropped = self.drain();
        if dropped > 0 {
            debug!("msgq: released {} undelivered messages", dropped);
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::cell::{Cell, RefCell};

    use crate::binding::{PaintSource, SchedulerBinding, TickSource};
    use crate::types::Hwnd;

    /// Scheduler that records resumes instead of switching threads.
    #[derive(Default)]
    pub struct RecordingScheduler {
        pub resumed: RefCell<Vec<u32>>,
        pub terminated: RefCell<Vec<u32>>,
    }

    impl SchedulerBinding for RecordingScheduler {
        type Thread = u32;

        fn suspend_current(&self, _current: &u32) {}

        fn resume(&self, thread: &u32) {
            self.resumed.borrow_mut().push(*thread);
        }

        fn is_terminated(&self, thread: &u32) -> bool {
            self.terminated.borrow().contains(thread)
        }
    }

    pub struct ManualClock(pub Cell<u32>);

    impl ManualClock {
        pub fn at(tick: u32) -> Self {
            Self(Cell::new(tick))
        }

        pub fn advance(&self, ms: u32) {
            self.0.set(self.0.get().wrapping_add(ms));
        }
    }

    impl TickSource for ManualClock {
        fn tick_count(&self) -> u32 {
            self.0.get()
        }
    }

    /// Reports one window of one owner as needing a repaint.
    pub struct DirtyWindow {
        pub owner: u32,
        pub hwnd: Hwnd,
    }

    impl PaintSource<u32> for DirtyWindow {
        fn find_window_to_repaint(&self, scope: Hwnd, caller: &u32) -> Option<Hwnd> {
            let in_scope = scope.is_null() || scope == self.hwnd;
            (in_scope && *caller == self.owner).then_some(self.hwnd)
        }
    }
}
