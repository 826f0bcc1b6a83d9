// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Guest address space used by the syscall layer for copy-out
//! OWNERS: @win32k
//! PUBLIC API: GuestMemory (map/unmap/verify_for_write/copy_to_user/read), Protection, UserAddr
//! INVARIANTS: Regions never overlap; a copy either lands entirely inside one
//!             writable region or is rejected without writing anything

use bitflags::bitflags;

use crate::{Result, Win32kError};

/// Guest virtual address (32-bit guest).
pub type UserAddr = u32;

bitflags! {
    /// Access rights of a guest region.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct Protection: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
    }
}

struct Region {
    base: UserAddr,
    prot: Protection,
    bytes: Vec<u8>,
}

impl Region {
    fn end(&self) -> u64 {
        u64::from(self.base) + self.bytes.len() as u64
    }

    fn contains(&self, addr: UserAddr, len: usize) -> bool {
        let start = u64::from(addr);
        start >= u64::from(self.base) && start + len as u64 <= self.end()
    }

    fn offset(&self, addr: UserAddr) -> usize {
        (addr - self.base) as usize
    }
}

/// Flat model of one guest process's address space.
#[derive(Default)]
pub struct GuestMemory {
    regions: Vec<Region>,
}

impl GuestMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `len` zeroed bytes at `base`.
    pub fn map(&mut self, base: UserAddr, len: usize, prot: Protection) -> Result<()> {
        let end = u64::from(base) + len as u64;
        let overlaps = self
            .regions
            .iter()
            .any(|r| u64::from(base) < r.end() && u64::from(r.base) < end);
        if overlaps || end > u64::from(u32::MAX) + 1 {
            return Err(Win32kError::Overlap(base));
        }
        self.regions.push(Region { base, prot, bytes: vec![0; len] });
        Ok(())
    }

    /// Unmaps the region starting exactly at `base`.
    pub fn unmap(&mut self, base: UserAddr) -> Result<()> {
        let index = self
            .regions
            .iter()
            .position(|r| r.base == base)
            .ok_or(Win32kError::AccessViolation { addr: base, len: 0 })?;
        self.regions.swap_remove(index);
        Ok(())
    }

    fn region_for(&self, addr: UserAddr, len: usize, prot: Protection) -> Option<&Region> {
        self.regions.iter().find(|r| r.contains(addr, len) && r.prot.contains(prot))
    }

    /// Checks that `len` bytes at `addr` may be written by the server.
    pub fn verify_for_write(&self, addr: UserAddr, len: usize) -> Result<()> {
        self.region_for(addr, len, Protection::WRITE)
            .map(|_| ())
            .ok_or(Win32kError::AccessViolation { addr, len })
    }

    /// Copies `data` to guest memory at `addr`.
    pub fn copy_to_user(&mut self, addr: UserAddr, data: &[u8]) -> Result<()> {
        let len = data.len();
        let region = self
            .regions
            .iter_mut()
            .find(|r| r.contains(addr, len) && r.prot.contains(Protection::WRITE))
            .ok_or(Win32kError::AccessViolation { addr, len })?;
        let offset = region.offset(addr);
        region.bytes[offset..offset + len].copy_from_slice(data);
        Ok(())
    }

    /// Copies guest memory at `addr` into `out`.
    pub fn read(&self, addr: UserAddr, out: &mut [u8]) -> Result<()> {
        let len = out.len();
        let region = self
            .region_for(addr, len, Protection::READ)
            .ok_or(Win32kError::AccessViolation { addr, len })?;
        let offset = region.offset(addr);
        out.copy_from_slice(&region.bytes[offset..offset + len]);
        Ok(())
    }
}
