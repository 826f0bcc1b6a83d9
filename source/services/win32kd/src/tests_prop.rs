// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use proptest::prelude::*;

use crate::memory::{GuestMemory, Protection};

const BASE: u32 = 0x1000;
const LEN: usize = 0x100;

proptest! {
    #[test]
    fn copy_out_is_all_or_nothing(addr in 0x0f00u32..0x1200, data in prop::collection::vec(any::<u8>(), 1..64)) {
        let mut mem = GuestMemory::new();
        mem.map(BASE, LEN, Protection::READ | Protection::WRITE).unwrap();

        let fits = addr >= BASE && (addr - BASE) as usize + data.len() <= LEN;
        prop_assert_eq!(mem.verify_for_write(addr, data.len()).is_ok(), fits);
        prop_assert_eq!(mem.copy_to_user(addr, &data).is_ok(), fits);

        let mut image = vec![0u8; LEN];
        mem.read(BASE, &mut image).unwrap();
        if fits {
            let at = (addr - BASE) as usize;
            prop_assert_eq!(&image[at..at + data.len()], &data[..]);
        } else {
            prop_assert!(image.iter().all(|b| *b == 0));
        }
    }
}
