// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Scheduler binding for emulated guest threads on the host
//! OWNERS: @win32k
//! PUBLIC API: HostScheduler (register/unregister/terminate + SchedulerBinding), ThreadId
//! INVARIANTS: A resume is kept as a permit until the next suspend consumes it;
//!             termination releases any suspend, present or future

use std::collections::HashMap;
use std::fmt;

use log::debug;
use nexus_msgq::SchedulerBinding;
use parking_lot::{Condvar, Mutex};

/// Identifier of an emulated guest thread.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(u32);

impl ThreadId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Identifier printed in front of trace lines.
    pub const fn trace_id(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tid:{:04x}", self.0)
    }
}

#[derive(Debug, Default)]
struct ThreadControl {
    permit: bool,
    terminated: bool,
}

/// Park/resume scheduler for guest threads backed by OS threads.
///
/// Each guest thread runs on its own OS thread; suspension parks it on a
/// condition variable until a resume permit or a termination shows up.
#[derive(Default)]
pub struct HostScheduler {
    threads: Mutex<HashMap<ThreadId, ThreadControl>>,
    wake: Condvar,
}

impl HostScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, thread: ThreadId) {
        self.threads.lock().insert(thread, ThreadControl::default());
    }

    pub fn unregister(&self, thread: ThreadId) {
        self.threads.lock().remove(&thread);
        self.wake.notify_all();
    }

    /// Marks `thread` terminated and releases it if suspended.
    pub fn terminate(&self, thread: ThreadId) {
        if let Some(control) = self.threads.lock().get_mut(&thread) {
            control.terminated = true;
        }
        debug!("sched: {:?} terminated", thread);
        self.wake.notify_all();
    }
}

impl SchedulerBinding for HostScheduler {
    type Thread = ThreadId;

    fn suspend_current(&self, current: &ThreadId) {
        let mut threads = self.threads.lock();
        loop {
            // An unregistered thread has nothing to wait for.
            let Some(control) = threads.get_mut(current) else {
                return;
            };
            if control.terminated {
                return;
            }
            if control.permit {
                control.permit = false;
                return;
            }
            self.wake.wait(&mut threads);
        }
    }

    fn resume(&self, thread: &ThreadId) {
        if let Some(control) = self.threads.lock().get_mut(thread) {
            control.permit = true;
        }
        self.wake.notify_all();
    }

    fn is_terminated(&self, thread: &ThreadId) -> bool {
        self.threads.lock().get(thread).map_or(true, |c| c.terminated)
    }
}
