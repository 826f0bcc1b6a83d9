// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Collaborator seams consumed by the queue.
//!
//! The queue never reaches for an ambient "current thread"; every operation
//! receives the calling thread explicitly and talks to the scheduler, the
//! window tree and the clock through these traits.

use core::fmt::Debug;

use crate::types::Hwnd;

/// Suspend/resume primitives of the cooperative scheduler.
pub trait SchedulerBinding {
    /// Identity of a schedulable thread.
    type Thread: Clone + Eq + Debug;

    /// Suspends `current` until another context resumes it or it is terminated.
    ///
    /// A resume delivered after the waiter was registered but before this call
    /// must not be lost.
    fn suspend_current(&self, current: &Self::Thread);

    /// Makes `thread` runnable again. May let it run before the caller returns.
    fn resume(&self, thread: &Self::Thread);

    /// Returns `true` once `thread` has been marked for termination.
    fn is_terminated(&self, thread: &Self::Thread) -> bool;
}

/// Source of synthesized paint messages.
pub trait PaintSource<T> {
    /// Returns a window within `scope` owned by `caller` that needs repainting.
    ///
    /// A null `scope` covers every window of the caller.
    fn find_window_to_repaint(&self, scope: Hwnd, caller: &T) -> Option<Hwnd>;
}

/// Monotonic tick counter used to stamp messages.
pub trait TickSource {
    /// Milliseconds since an arbitrary origin, wrapping.
    fn tick_count(&self) -> u32;
}

/// Paint source for threads without windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPaint;

impl<T> PaintSource<T> for NoPaint {
    fn find_window_to_repaint(&self, _scope: Hwnd, _caller: &T) -> Option<Hwnd> {
        None
    }
}
