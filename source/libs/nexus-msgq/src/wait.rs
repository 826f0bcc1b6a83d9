// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Blocking retrieval.
//!
//! The queue sits in a [`Mutex`] that both the poster and the waiter go
//! through. The waiter registers under the lock, releases it, and suspends;
//! a post that lands in between fills the slot and resumes the thread, and the
//! scheduler binding keeps that resume until the suspend consumes it.

use log::{debug, warn};
use parking_lot::Mutex;

use crate::binding::{PaintSource, SchedulerBinding, TickSource};
use crate::queue::ThreadMessageQueue;
use crate::types::{Hwnd, Msg};
use crate::Result;

/// Result of a blocking retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetOutcome {
    /// A message was retrieved or handed off.
    Message(Msg),
    /// The caller was terminated while waiting; nothing was delivered.
    Terminated,
}

impl GetOutcome {
    pub fn message(&self) -> Option<&Msg> {
        match self {
            Self::Message(msg) => Some(msg),
            Self::Terminated => None,
        }
    }

    /// Whether the caller's dispatch loop should keep running.
    ///
    /// Only a delivered quit message stops it; a terminated caller never
    /// returns to its loop, so nothing is reported for it.
    pub fn keep_going(&self) -> bool {
        !matches!(self, Self::Message(msg) if msg.is_quit())
    }
}

/// Retrieves the next message for `caller`, suspending until one is posted.
///
/// On return the caller's waiter record is unlinked, whichever of delivery,
/// termination or the caller itself got to it first.
#[allow(clippy::too_many_arguments)]
pub fn get_message<S, P>(
    queue: &Mutex<ThreadMessageQueue<S::Thread>>,
    sched: &S,
    paint: &P,
    clock: &impl TickSource,
    caller: &S::Thread,
    hwnd: Hwnd,
    min: u32,
    max: u32,
) -> Result<GetOutcome>
where
    S: SchedulerBinding,
    P: PaintSource<S::Thread> + ?Sized,
{
    loop {
        let slot = {
            let mut q = queue.lock();
            if let Some(msg) = q.get_message_no_wait(caller, paint, clock, hwnd, min, max) {
                return Ok(GetOutcome::Message(msg));
            }
            q.register_waiter(caller.clone())?
        };

        debug!("msgq: {:?} waiting for a message", caller);
        sched.suspend_current(caller);

        let delivered = {
            let mut q = queue.lock();
            q.remove_waiter(caller);
            slot.take()
        };

        if sched.is_terminated(caller) {
            debug!("msgq: {:?} terminated while waiting", caller);
            return Ok(GetOutcome::Terminated);
        }
        if let Some(msg) = delivered {
            return Ok(GetOutcome::Message(msg));
        }
        warn!("msgq: {:?} resumed without a message", caller);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::NoPaint;
    use crate::queue::fixtures::{ManualClock, RecordingScheduler};
    use crate::types::{WM_PAINT, WM_QUIT};

    #[test]
    fn available_message_returns_without_waiting() {
        let sched = RecordingScheduler::default();
        let clock = ManualClock::at(1);
        let queue = Mutex::new(ThreadMessageQueue::new());
        queue.lock().post_quit_message(0);

        let outcome = get_message(&queue, &sched, &NoPaint, &clock, &1, Hwnd::NULL, 0, 0).unwrap();
        assert_eq!(outcome.message().map(|m| m.message), Some(WM_QUIT));
        assert!(!outcome.keep_going());
        assert_eq!(queue.lock().waiter_count(), 0);
    }

    #[test]
    fn terminated_waiter_is_unlinked() {
        let sched = RecordingScheduler::default();
        sched.terminated.borrow_mut().push(5);
        let clock = ManualClock::at(1);
        let queue = Mutex::new(ThreadMessageQueue::new());

        let outcome = get_message(&queue, &sched, &NoPaint, &clock, &5, Hwnd::NULL, 0, 0).unwrap();
        assert_eq!(outcome, GetOutcome::Terminated);
        assert!(outcome.keep_going());
        assert!(outcome.message().is_none());
        assert_eq!(queue.lock().waiter_count(), 0);
    }

    #[test]
    fn keep_going_for_ordinary_messages() {
        let outcome = GetOutcome::Message(Msg { message: WM_PAINT, ..Msg::zeroed() });
        assert!(outcome.keep_going());
    }
}
