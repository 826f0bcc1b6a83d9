// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Message and waiter records owned by a [`crate::ThreadMessageQueue`].

use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::{Hwnd, LParam, Msg, Point, WParam};

/// A posted message waiting in the pending sequence.
///
/// Immutable once created. The timestamp is captured at post time, not at
/// retrieval time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    hwnd: Hwnd,
    message: u32,
    wparam: WParam,
    lparam: LParam,
    time: u32,
}

impl MessageRecord {
    pub(crate) const fn new(hwnd: Hwnd, message: u32, wparam: WParam, lparam: LParam, time: u32) -> Self {
        Self { hwnd, message, wparam, lparam, time }
    }

    pub fn hwnd(&self) -> Hwnd {
        self.hwnd
    }

    pub fn message(&self) -> u32 {
        self.message
    }

    pub fn params(&self) -> (WParam, LParam) {
        (self.wparam, self.lparam)
    }

    pub fn time(&self) -> u32 {
        self.time
    }

    /// Consumes the record into an output message with a zeroed cursor.
    pub fn into_msg(self) -> Msg {
        Msg {
            hwnd: self.hwnd,
            message: self.message,
            wparam: self.wparam,
            lparam: self.lparam,
            time: self.time,
            pt: Point::default(),
        }
    }
}

/// Output buffer of a thread blocked in a retrieval call.
///
/// The waiter record keeps one clone, the blocked caller keeps the other. A
/// posting thread fills it in place before resuming the waiter.
#[derive(Debug, Clone, Default)]
pub struct DeliverySlot(Arc<Mutex<Option<Msg>>>);

impl DeliverySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fill(&self, msg: Msg) {
        *self.0.lock() = Some(msg);
    }

    /// Takes the delivered message, leaving the slot empty.
    pub fn take(&self) -> Option<Msg> {
        self.0.lock().take()
    }

    pub fn is_filled(&self) -> bool {
        self.0.lock().is_some()
    }
}

/// A thread blocked inside a retrieval call on this queue.
#[derive(Debug)]
pub(crate) struct Waiter<T> {
    pub(crate) thread: T,
    pub(crate) slot: DeliverySlot,
}

impl<T> Waiter<T> {
    pub(crate) fn new(thread: T) -> Self {
        Self { thread, slot: DeliverySlot::new() }
    }
}
