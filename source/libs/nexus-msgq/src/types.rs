// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Message values exchanged with guest threads.

use core::fmt;

/// First parameter of a window message (32-bit guest machine word).
pub type WParam = u32;
/// Second parameter of a window message (32-bit guest machine word, signed).
pub type LParam = i32;

pub const WM_NULL: u32 = 0x0000;
pub const WM_CREATE: u32 = 0x0001;
pub const WM_DESTROY: u32 = 0x0002;
pub const WM_PAINT: u32 = 0x000f;
pub const WM_CLOSE: u32 = 0x0010;
pub const WM_QUIT: u32 = 0x0012;
pub const WM_KEYDOWN: u32 = 0x0100;
pub const WM_KEYUP: u32 = 0x0101;
pub const WM_TIMER: u32 = 0x0113;
pub const WM_USER: u32 = 0x0400;

/// Window handle as seen by the guest.
///
/// The null handle doubles as "every window of the calling thread" when used
/// as a retrieval scope.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hwnd(u32);

impl Hwnd {
    /// The null window handle.
    pub const NULL: Self = Self(0);

    /// Wraps a raw guest handle value.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw guest handle value.
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns `true` for the null handle.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Hwnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hwnd({:#x})", self.0)
    }
}

/// Cursor position attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// The caller's output message buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Msg {
    pub hwnd: Hwnd,
    pub message: u32,
    pub wparam: WParam,
    pub lparam: LParam,
    pub time: u32,
    pub pt: Point,
}

impl Msg {
    /// An all-zero message, the state of a fresh output buffer.
    pub const fn zeroed() -> Self {
        Self {
            hwnd: Hwnd::NULL,
            message: WM_NULL,
            wparam: 0,
            lparam: 0,
            time: 0,
            pt: Point { x: 0, y: 0 },
        }
    }

    /// Returns `true` when this is the quit notification.
    pub const fn is_quit(&self) -> bool {
        self.message == WM_QUIT
    }
}

/// Symbolic name of a message identifier, for tracing.
pub fn message_name(message: u32) -> &'static str {
    match message {
        WM_NULL => "WM_NULL",
        WM_CREATE => "WM_CREATE",
        WM_DESTROY => "WM_DESTROY",
        WM_PAINT => "WM_PAINT",
        WM_CLOSE => "WM_CLOSE",
        WM_QUIT => "WM_QUIT",
        WM_KEYDOWN => "WM_KEYDOWN",
        WM_KEYUP => "WM_KEYUP",
        WM_TIMER => "WM_TIMER",
        m if m >= WM_USER && m < 0x8000 => "WM_USER+n",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_buffer_is_not_quit() {
        let msg = Msg::zeroed();
        assert_eq!(msg, Msg::default());
        assert!(!msg.is_quit());
    }

    #[test]
    fn names_cover_synthesized_messages() {
        assert_eq!(message_name(WM_QUIT), "WM_QUIT");
        assert_eq!(message_name(WM_PAINT), "WM_PAINT");
        assert_eq!(message_name(WM_USER + 5), "WM_USER+n");
        assert_eq!(message_name(0xc123), "?");
    }

    #[test]
    fn null_handle() {
        assert!(Hwnd::NULL.is_null());
        assert!(!Hwnd::from_raw(7).is_null());
        assert_eq!(format!("{:?}", Hwnd::from_raw(0x1a)), "Hwnd(0x1a)");
    }
}
