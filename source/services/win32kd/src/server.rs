// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Message syscall surface of the win32k service
//! OWNERS: @win32k
//! PUBLIC API: Win32k (thread/window lifecycle, queue contract, nt_user_* adapters), QueueRef
//! DEPENDS_ON: nexus-msgq, sched, window, memory, clock
//! INVARIANTS:
//!   - The thread table lock is never held while a queue lock is taken
//!   - Adapters validate the output buffer before consuming a message; a
//!     buffer unmapped while the caller is blocked loses the message (logged)
//!   - Window resolution happens before any queue is touched

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use nexus_msgq::{
    get_message, message_name, GetOutcome, Hwnd, LParam, Msg, PostOutcome, ThreadMessageQueue, WParam,
};
use parking_lot::{Mutex, MutexGuard};

use crate::abi::{encode_msg, PeekFlags, MSG_WIRE_SIZE};
use crate::clock::MonotonicClock;
use crate::config::Config;
use crate::memory::{GuestMemory, UserAddr};
use crate::sched::{HostScheduler, ThreadId};
use crate::window::WindowTable;
use crate::{Result, Win32kError};

/// Shared handle to one thread's message queue.
pub type QueueRef = Arc<Mutex<ThreadMessageQueue<ThreadId>>>;

const FIRST_TID: u32 = 0x20;

struct ThreadEntry {
    queue: Option<QueueRef>,
}

/// The win32k service: thread and window tables plus the message syscalls.
pub struct Win32k {
    config: Config,
    sched: HostScheduler,
    clock: MonotonicClock,
    windows: WindowTable,
    threads: Mutex<HashMap<ThreadId, ThreadEntry>>,
    memory: Mutex<GuestMemory>,
    next_tid: AtomicU32,
}

impl Win32k {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sched: HostScheduler::new(),
            clock: MonotonicClock::new(),
            windows: WindowTable::new(),
            threads: Mutex::new(HashMap::new()),
            memory: Mutex::new(GuestMemory::new()),
            next_tid: AtomicU32::new(FIRST_TID),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Guest address space shared by every thread of the emulated process.
    pub fn memory(&self) -> MutexGuard<'_, GuestMemory> {
        self.memory.lock()
    }

    // ----- thread lifecycle -------------------------------------------------

    /// Creates a guest thread, optionally granting it a message queue.
    pub fn create_thread(&self, with_queue: bool) -> ThreadId {
        let tid = ThreadId::from_raw(self.next_tid.fetch_add(1, Ordering::Relaxed));
        let queue = with_queue
            .then(|| Arc::new(Mutex::new(ThreadMessageQueue::with_limits(self.config.queue_limits()))));
        self.sched.register(tid);
        self.threads.lock().insert(tid, ThreadEntry { queue });
        debug!("win32k: created {:?} (queue: {})", tid, with_queue);
        tid
    }

    /// Queue of `thread`.
    pub fn queue_of(&self, thread: ThreadId) -> Result<QueueRef> {
        let threads = self.threads.lock();
        let entry = threads.get(&thread).ok_or(Win32kError::NoSuchThread(thread))?;
        entry.queue.clone().ok_or(Win32kError::NoQueue(thread))
    }

    /// Marks `thread` for termination and releases it from any blocking call.
    pub fn terminate_thread(&self, thread: ThreadId) -> Result<()> {
        if let Ok(queue) = self.queue_of(thread) {
            if queue.lock().remove_waiter(&thread) {
                debug!("win32k: scrubbed waiter of {:?}", thread);
            }
        } else if !self.threads.lock().contains_key(&thread) {
            return Err(Win32kError::NoSuchThread(thread));
        }
        self.sched.terminate(thread);
        Ok(())
    }

    /// Removes `thread`, dropping its queue and the windows it owns.
    pub fn destroy_thread(&self, thread: ThreadId) -> Result<()> {
        let entry = self.threads.lock().remove(&thread).ok_or(Win32kError::NoSuchThread(thread))?;
        let windows = self.windows.destroy_owned_by(thread);
        self.sched.unregister(thread);
        debug!("win32k: destroyed {:?} with {} window(s)", thread, windows);
        drop(entry);
        Ok(())
    }

    // ----- windows ----------------------------------------------------------

    pub fn create_window(&self, owner: ThreadId) -> Result<Hwnd> {
        if !self.threads.lock().contains_key(&owner) {
            return Err(Win32kError::NoSuchThread(owner));
        }
        Ok(self.windows.create(owner))
    }

    pub fn destroy_window(&self, hwnd: Hwnd) -> Result<()> {
        self.windows.destroy(hwnd)
    }

    pub fn invalidate_window(&self, hwnd: Hwnd) -> Result<()> {
        self.windows.invalidate(hwnd)
    }

    pub fn validate_window(&self, hwnd: Hwnd) -> Result<()> {
        self.windows.validate(hwnd)
    }

    fn queue_of_window(&self, hwnd: Hwnd) -> Result<QueueRef> {
        let owner = self.windows.owner_of(hwnd)?;
        self.queue_of(owner)
    }

    // ----- queue contract ---------------------------------------------------

    /// Blocking retrieval for `caller`.
    pub fn get_message(&self, caller: ThreadId, hwnd: Hwnd, min: u32, max: u32) -> Result<GetOutcome> {
        let queue = self.queue_of(caller)?;
        let outcome = get_message(&queue, &self.sched, &self.windows, &self.clock, &caller, hwnd, min, max)?;
        Ok(outcome)
    }

    /// Non-blocking retrieval for `caller`.
    pub fn peek_message(&self, caller: ThreadId, hwnd: Hwnd, min: u32, max: u32) -> Result<Option<Msg>> {
        let queue = self.queue_of(caller)?;
        let msg = queue.lock().get_message_no_wait(&caller, &self.windows, &self.clock, hwnd, min, max);
        Ok(msg)
    }

    /// Posts to the queue of the thread owning `hwnd`.
    pub fn post_message(&self, hwnd: Hwnd, message: u32, wparam: WParam, lparam: LParam) -> Result<PostOutcome> {
        let queue = self.queue_of_window(hwnd)?;
        let outcome = queue.lock().post_message(&self.sched, &self.clock, hwnd, message, wparam, lparam)?;
        Ok(outcome)
    }

    pub fn post_quit(&self, caller: ThreadId, exit_code: u32) -> Result<()> {
        self.queue_of(caller)?.lock().post_quit_message(exit_code);
        Ok(())
    }

    pub fn set_timer(&self, hwnd: Hwnd, id: u32, elapse_ms: u32, callback: u32) -> Result<()> {
        let queue = self.queue_of_window(hwnd)?;
        queue.lock().set_timer(hwnd, id, elapse_ms, callback)?;
        Ok(())
    }

    pub fn kill_timer(&self, hwnd: Hwnd, id: u32) -> Result<()> {
        let queue = self.queue_of_window(hwnd)?;
        queue.lock().kill_timer(hwnd, id)?;
        Ok(())
    }

    // ----- NtUser* adapters -------------------------------------------------

    /// `NtUserGetMessage`. Returns `false` on `WM_QUIT` and on any failure.
    ///
    /// A caller terminated while blocked gets `true` and nothing is copied out.
    pub fn nt_user_get_message(&self, caller: ThreadId, msg_ptr: UserAddr, hwnd: Hwnd, min: u32, max: u32) -> bool {
        if let Err(err) = self.check_output(caller, msg_ptr) {
            debug!("win32k: NtUserGetMessage({:?}): {}", caller, err);
            return false;
        }

        let msg = match self.get_message(caller, hwnd, min, max) {
            Ok(GetOutcome::Message(msg)) => msg,
            Ok(GetOutcome::Terminated) => {
                self.trace(caller, "NtUserGetMessage", &Msg::zeroed());
                return true;
            }
            Err(err) => {
                debug!("win32k: NtUserGetMessage({:?}): {}", caller, err);
                return false;
            }
        };

        if let Err(err) = self.copy_msg_out(msg_ptr, &msg) {
            warn!(
                "win32k: NtUserGetMessage({:?}) dropped {:#06x} ({}): {}",
                caller,
                msg.message,
                message_name(msg.message),
                err
            );
            return false;
        }
        self.trace(caller, "NtUserGetMessage", &msg);
        !msg.is_quit()
    }

    /// `NtUserPeekMessage`. Guest argument order puts `max` before `min`.
    ///
    /// `flags` is accepted for ABI compatibility; a returned message is always removed.
    #[allow(clippy::too_many_arguments)]
    pub fn nt_user_peek_message(
        &self,
        caller: ThreadId,
        msg_ptr: UserAddr,
        hwnd: Hwnd,
        max: u32,
        min: u32,
        flags: PeekFlags,
    ) -> bool {
        if let Err(err) = self.check_output(caller, msg_ptr) {
            debug!("win32k: NtUserPeekMessage({:?}): {}", caller, err);
            return false;
        }
        if !flags.contains(PeekFlags::REMOVE) {
            debug!("win32k: NtUserPeekMessage({:?}) flags {:?}, removing anyway", caller, flags);
        }

        match self.peek_message(caller, hwnd, min, max) {
            Ok(Some(msg)) => match self.copy_msg_out(msg_ptr, &msg) {
                Ok(()) => {
                    self.trace(caller, "NtUserPeekMessage", &msg);
                    true
                }
                Err(err) => {
                    warn!(
                        "win32k: NtUserPeekMessage({:?}) dropped {:#06x} ({}): {}",
                        caller,
                        msg.message,
                        message_name(msg.message),
                        err
                    );
                    false
                }
            },
            Ok(None) => false,
            Err(err) => {
                debug!("win32k: NtUserPeekMessage({:?}): {}", caller, err);
                false
            }
        }
    }

    /// `NtUserPostMessage`.
    pub fn nt_user_post_message(&self, hwnd: Hwnd, message: u32, wparam: WParam, lparam: LParam) -> bool {
        match self.post_message(hwnd, message, wparam, lparam) {
            Ok(_) => true,
            Err(err) => {
                debug!("win32k: NtUserPostMessage({:?}, {:#06x}): {}", hwnd, message, err);
                false
            }
        }
    }

    /// `NtUserPostQuitMessage`.
    pub fn nt_user_post_quit_message(&self, caller: ThreadId, exit_code: u32) -> bool {
        self.post_quit(caller, exit_code).is_ok()
    }

    /// `NtUserSetTimer`. Returns the timer identifier, always 0 for now.
    pub fn nt_user_set_timer(&self, hwnd: Hwnd, id: u32, elapse_ms: u32, callback: u32) -> u32 {
        match self.set_timer(hwnd, id, elapse_ms, callback) {
            Ok(()) => id,
            Err(err) => {
                debug!("win32k: NtUserSetTimer({:?}, {}): {}", hwnd, id, err);
                0
            }
        }
    }

    /// `NtUserKillTimer`.
    pub fn nt_user_kill_timer(&self, hwnd: Hwnd, id: u32) -> bool {
        match self.kill_timer(hwnd, id) {
            Ok(()) => true,
            Err(err) => {
                debug!("win32k: NtUserKillTimer({:?}, {}): {}", hwnd, id, err);
                false
            }
        }
    }

    fn check_output(&self, caller: ThreadId, msg_ptr: UserAddr) -> Result<()> {
        self.queue_of(caller)?;
        self.memory.lock().verify_for_write(msg_ptr, MSG_WIRE_SIZE)
    }

    fn copy_msg_out(&self, msg_ptr: UserAddr, msg: &Msg) -> Result<()> {
        self.memory.lock().copy_to_user(msg_ptr, &encode_msg(msg))
    }

    fn trace(&self, caller: ThreadId, call: &str, msg: &Msg) {
        if !self.config.trace.messages {
            return;
        }
        info!(
            "{:04x}: {} hwnd={:08x} message={:08x} ({}) wParam={:08x} lParam={:08x} time={:08x} pt=({:08x},{:08x})",
            caller.trace_id(),
            call,
            msg.hwnd.as_raw(),
            msg.message,
            message_name(msg.message),
            msg.wparam,
            msg.lparam,
            msg.time,
            msg.pt.x,
            msg.pt.y,
        );
    }
}
