// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Guest ABI of the message syscalls.
//!
//! `MSG` is copied out as the 32-bit guest lays it out: seven little-endian
//! 32-bit fields, 28 bytes, no padding.

use bitflags::bitflags;

use nexus_msgq::{Hwnd, Msg, Point};

/// Size of the guest `MSG` structure.
pub const MSG_WIRE_SIZE: usize = 28;

const _: () = assert!(MSG_WIRE_SIZE == 7 * core::mem::size_of::<u32>());

bitflags! {
    /// `wRemoveMsg` flags of `NtUserPeekMessage`.
    ///
    /// Accepted for compatibility; retrieval always removes the message.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct PeekFlags: u32 {
        const REMOVE = 0x0001;
        const NOYIELD = 0x0002;
    }
}

/// Serialises `msg` into the guest layout.
pub fn encode_msg(msg: &Msg) -> [u8; MSG_WIRE_SIZE] {
    let mut bytes = [0u8; MSG_WIRE_SIZE];
    bytes[0..4].copy_from_slice(&msg.hwnd.as_raw().to_le_bytes());
    bytes[4..8].copy_from_slice(&msg.message.to_le_bytes());
    bytes[8..12].copy_from_slice(&msg.wparam.to_le_bytes());
    bytes[12..16].copy_from_slice(&msg.lparam.to_le_bytes());
    bytes[16..20].copy_from_slice(&msg.time.to_le_bytes());
    bytes[20..24].copy_from_slice(&msg.pt.x.to_le_bytes());
    bytes[24..28].copy_from_slice(&msg.pt.y.to_le_bytes());
    bytes
}

/// Deserialises a guest `MSG`.
pub fn decode_msg(bytes: &[u8; MSG_WIRE_SIZE]) -> Msg {
    let word = |at: usize| [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]];
    Msg {
        hwnd: Hwnd::from_raw(u32::from_le_bytes(word(0))),
        message: u32::from_le_bytes(word(4)),
        wparam: u32::from_le_bytes(word(8)),
        lparam: i32::from_le_bytes(word(12)),
        time: u32::from_le_bytes(word(16)),
        pt: Point { x: i32::from_le_bytes(word(20)), y: i32::from_le_bytes(word(24)) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_msgq::WM_QUIT;

    #[test]
    fn layout_matches_guest_msg() {
        let msg = Msg {
            hwnd: Hwnd::from_raw(0x0102_0304),
            message: WM_QUIT,
            wparam: 0xdead_beef,
            lparam: -2,
            time: 0x1122_3344,
            pt: Point { x: 1, y: -1 },
        };
        let bytes = encode_msg(&msg);
        assert_eq!(&bytes[0..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&bytes[4..8], &[0x12, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(&bytes[24..28], &[0xff, 0xff, 0xff, 0xff]);
        assert_eq!(decode_msg(&bytes), msg);
    }

    #[test]
    fn zeroed_msg_encodes_to_zero_bytes() {
        assert_eq!(encode_msg(&Msg::zeroed()), [0u8; MSG_WIRE_SIZE]);
    }

    #[test]
    fn no_remove_is_empty() {
        assert!(PeekFlags::from_bits_truncate(0).is_empty());
        assert_eq!(PeekFlags::from_bits_truncate(3), PeekFlags::REMOVE | PeekFlags::NOYIELD);
    }
}
