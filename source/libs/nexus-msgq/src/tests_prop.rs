// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg(test)]
//! CONTEXT: Property-based tests for the thread message queue
//! OWNERS: @win32k
//! NOTE: Tests only; no queue logic.
//!
//! TEST_SCOPE:
//!   - FIFO delivery of posted messages without waiters
//!   - Hand-off bypasses the pending sequence
//!   - Quit slot keeps only the latest exit code, consumed once
//!
//! TEST_SCENARIOS:
//!   - posted_messages_come_back_in_post_order()
//!   - handoff_leaves_pending_length_unchanged()
//!   - last_quit_wins()

use proptest::prelude::*;

use crate::binding::NoPaint;
use crate::queue::fixtures::{ManualClock, RecordingScheduler};
use crate::{Hwnd, PostOutcome, ThreadMessageQueue, WM_QUIT};

fn arb_post() -> impl Strategy<Value = (u32, u32, u32, i32)> {
    (1u32..0x100, 0x400u32..0x8000, any::<u32>(), any::<i32>())
}

proptest! {
    #[test]
    fn posted_messages_come_back_in_post_order(posts in proptest::collection::vec(arb_post(), 0..64)) {
        let sched = RecordingScheduler::default();
        let clock = ManualClock::at(0);
        let mut q = ThreadMessageQueue::<u32>::new();
        for (hwnd, message, wparam, lparam) in &posts {
            clock.advance(1);
            let outcome = q.post_message(&sched, &clock, Hwnd::from_raw(*hwnd), *message, *wparam, *lparam);
            prop_assert_eq!(outcome, Ok(PostOutcome::Queued));
        }
        prop_assert_eq!(q.pending_len(), posts.len());

        for (hwnd, message, wparam, lparam) in &posts {
            let msg = q.get_message_no_wait(&1, &NoPaint, &clock, Hwnd::NULL, 0, 0).unwrap();
            prop_assert_eq!((msg.hwnd.as_raw(), msg.message, msg.wparam, msg.lparam), (*hwnd, *message, *wparam, *lparam));
        }
        prop_assert!(q.get_message_no_wait(&1, &NoPaint, &clock, Hwnd::NULL, 0, 0).is_none());
    }

    #[test]
    fn handoff_leaves_pending_length_unchanged(waiters in 1u32..8, posts in 1usize..16) {
        let sched = RecordingScheduler::default();
        let clock = ManualClock::at(0);
        let mut q = ThreadMessageQueue::<u32>::new();
        for thread in 0..waiters {
            q.register_waiter(thread).unwrap();
        }
        for i in 0..posts {
            let before = q.pending_len();
            let outcome = q.post_message(&sched, &clock, Hwnd::from_raw(1), 0x400 + i as u32, 0, 0).unwrap();
            if i < waiters as usize {
                prop_assert_eq!(outcome, PostOutcome::HandedOff);
                prop_assert_eq!(q.pending_len(), before);
            } else {
                prop_assert_eq!(outcome, PostOutcome::Queued);
            }
            prop_assert!(q.waiter_count() == 0 || q.pending_len() == 0);
        }
        let resumed: Vec<u32> = (0..waiters.min(posts as u32)).collect();
        prop_assert_eq!(sched.resumed.borrow().clone(), resumed);
    }

    #[test]
    fn last_quit_wins(codes in proptest::collection::vec(any::<u32>(), 1..8)) {
        let clock = ManualClock::at(0);
        let mut q = ThreadMessageQueue::<u32>::new();
        for code in &codes {
            q.post_quit_message(*code);
        }
        let msg = q.get_message_no_wait(&1, &NoPaint, &clock, Hwnd::NULL, 0, 0).unwrap();
        prop_assert_eq!(msg.message, WM_QUIT);
        prop_assert_eq!(Some(&msg.wparam), codes.last());
        prop_assert!(q.get_message_no_wait(&1, &NoPaint, &clock, Hwnd::NULL, 0, 0).is_none());
    }
}
