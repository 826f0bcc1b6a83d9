// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Per-thread window message queue for the win32k subsystem
//! OWNERS: @win32k
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests per module, property tests, threaded hand-off tests
//!
//! PUBLIC API:
//!   - ThreadMessageQueue: pending messages, quit slot, waiters, timer stubs
//!   - get_message(): blocking retrieval with a single suspension point
//!   - SchedulerBinding / PaintSource / TickSource: collaborator seams
//!   - Msg, Hwnd, MessageRecord: message values
//!
//! INVARIANTS:
//!   - Pending messages and waiters are never both non-empty between operations
//!   - A record is delivered at most once and released on delivery
//!   - Quit is a flag + exit code, never a queue entry
//!   - Retrieval priority: posted, then quit, then paint
//!
//! DEPENDENCIES:
//!   - parking_lot::Mutex: queue cell shared between poster and waiter
//!   - log: hand-off and wait diagnostics
//!   - thiserror: QueueError

#![forbid(unsafe_code)]
#![deny(clippy::all)]

mod binding;
mod queue;
mod record;
mod types;
mod wait;

#[cfg(test)]
mod tests_prop;

pub use binding::{NoPaint, PaintSource, SchedulerBinding, TickSource};
pub use queue::{
    PostOutcome, QueueLimits, ThreadMessageQueue, TimerKey, TimerSpec, DEFAULT_MAX_PENDING,
};
pub use record::{DeliverySlot, MessageRecord};
pub use types::{
    message_name, Hwnd, LParam, Msg, Point, WParam, WM_CLOSE, WM_CREATE, WM_DESTROY, WM_KEYDOWN,
    WM_KEYUP, WM_NULL, WM_PAINT, WM_QUIT, WM_TIMER, WM_USER,
};
pub use wait::{get_message, GetOutcome};

/// Result alias for queue operations.
pub type Result<T> = core::result::Result<T, QueueError>;

/// Failures reported by queue operations.
///
/// A thread terminated while waiting is not an error; see [`GetOutcome::Terminated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// A message or waiter record could not be created.
    #[error("message record allocation failed")]
    AllocationFailure,
    /// The target window or thread could not be resolved.
    #[error("target window or thread not found")]
    InvalidTarget,
    /// The operation is reserved for a fuller implementation.
    #[error("operation not implemented")]
    NotImplemented,
}
