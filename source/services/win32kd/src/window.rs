// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Window ownership and repaint state.

use std::collections::BTreeMap;

use nexus_msgq::{Hwnd, PaintSource};
use parking_lot::Mutex;

use crate::sched::ThreadId;
use crate::{Result, Win32kError};

const FIRST_HWND: u32 = 0x0001_0020;

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    owner: ThreadId,
    needs_paint: bool,
}

#[derive(Default)]
struct Windows {
    entries: BTreeMap<Hwnd, WindowEntry>,
    next: u32,
}

/// Handle table of every window known to the server.
#[derive(Default)]
pub struct WindowTable {
    inner: Mutex<Windows>,
}

impl WindowTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a window owned by `owner`. New windows start fully valid.
    pub fn create(&self, owner: ThreadId) -> Hwnd {
        let mut windows = self.inner.lock();
        let raw = FIRST_HWND.max(windows.next);
        windows.next = raw + 1;
        let hwnd = Hwnd::from_raw(raw);
        windows.entries.insert(hwnd, WindowEntry { owner, needs_paint: false });
        hwnd
    }

    pub fn destroy(&self, hwnd: Hwnd) -> Result<()> {
        self.inner.lock().entries.remove(&hwnd).map(|_| ()).ok_or(Win32kError::InvalidWindow(hwnd))
    }

    /// Drops every window owned by `owner`, returning how many went away.
    pub fn destroy_owned_by(&self, owner: ThreadId) -> usize {
        let mut windows = self.inner.lock();
        let before = windows.entries.len();
        windows.entries.retain(|_, w| w.owner != owner);
        before - windows.entries.len()
    }

    /// Resolves the thread owning `hwnd`.
    pub fn owner_of(&self, hwnd: Hwnd) -> Result<ThreadId> {
        self.inner.lock().entries.get(&hwnd).map(|w| w.owner).ok_or(Win32kError::InvalidWindow(hwnd))
    }

    /// Marks `hwnd` as needing a repaint.
    pub fn invalidate(&self, hwnd: Hwnd) -> Result<()> {
        self.set_needs_paint(hwnd, true)
    }

    /// Clears the repaint flag, as painting the window does.
    pub fn validate(&self, hwnd: Hwnd) -> Result<()> {
        self.set_needs_paint(hwnd, false)
    }

    fn set_needs_paint(&self, hwnd: Hwnd, needs_paint: bool) -> Result<()> {
        let mut windows = self.inner.lock();
        let entry = windows.entries.get_mut(&hwnd).ok_or(Win32kError::InvalidWindow(hwnd))?;
        entry.needs_paint = needs_paint;
        Ok(())
    }
}

impl PaintSource<ThreadId> for WindowTable {
    fn find_window_to_repaint(&self, scope: Hwnd, caller: &ThreadId) -> Option<Hwnd> {
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|(hwnd, _)| scope.is_null() || **hwnd == scope)
            .find(|(_, w)| w.owner == *caller && w.needs_paint)
            .map(|(hwnd, _)| *hwnd)
    }
}
