// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: win32k message syscalls over the per-thread message queue
//! OWNERS: @win32k
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests per module; integration tests in tests/
//!
//! PUBLIC API:
//!   - Win32k: thread/window tables plus the message syscalls
//!     (nt_user_get_message, nt_user_peek_message, nt_user_post_message,
//!      nt_user_post_quit_message, nt_user_set_timer, nt_user_kill_timer)
//!   - HostScheduler: park/resume binding for emulated guest threads
//!   - WindowTable: window ownership and paint synthesis
//!   - GuestMemory: guest address space with verify/copy-out
//!   - Config: TOML service configuration
//!
//! DEPENDENCIES:
//!   - nexus-msgq: queue semantics
//!   - parking_lot: tables and scheduler state
//!   - serde + toml: configuration
//!   - log: syscall tracing

#![forbid(unsafe_code)]
#![deny(clippy::all)]

pub mod abi;
pub mod cli;
mod clock;
pub mod config;
mod memory;
mod sched;
mod server;
mod window;

#[cfg(test)]
mod tests_prop;

pub use abi::{decode_msg, encode_msg, PeekFlags, MSG_WIRE_SIZE};
pub use cli::{execute, help, run};
pub use clock::MonotonicClock;
pub use config::{Config, ConfigError};
pub use memory::{GuestMemory, Protection, UserAddr};
pub use sched::{HostScheduler, ThreadId};
pub use server::{QueueRef, Win32k};
pub use window::WindowTable;

use nexus_msgq::{Hwnd, QueueError};

/// Result alias for win32k operations.
pub type Result<T> = core::result::Result<T, Win32kError>;

/// Errors surfaced by the syscall layer and its collaborators.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Win32kError {
    /// The thread is not known to the server.
    #[error("no such thread {0:?}")]
    NoSuchThread(ThreadId),
    /// The thread exists but was never granted a message queue.
    #[error("thread {0:?} has no message queue")]
    NoQueue(ThreadId),
    /// The window handle does not resolve.
    #[error("invalid window handle {0:?}")]
    InvalidWindow(Hwnd),
    /// Guest memory is not mapped or not writable.
    #[error("guest access violation at {addr:#010x} ({len} bytes)")]
    AccessViolation { addr: UserAddr, len: usize },
    /// A guest mapping overlaps an existing one.
    #[error("guest mapping at {0:#010x} overlaps an existing region")]
    Overlap(UserAddr),
    /// Queue level failure.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl Win32kError {
    /// Returns `true` when the failure means the target could not be resolved.
    pub fn is_invalid_target(&self) -> bool {
        matches!(
            self,
            Self::NoSuchThread(_)
                | Self::NoQueue(_)
                | Self::InvalidWindow(_)
                | Self::Queue(QueueError::InvalidTarget)
        )
    }
}
