// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use std::time::Instant;

use nexus_msgq::TickSource;

/// Tick counter in milliseconds since the server started, wrapping at 2^32.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for MonotonicClock {
    fn tick_count(&self) -> u32 {
        // Truncation is the wrap-around the guest expects from GetTickCount.
        self.origin.elapsed().as_millis() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_do_not_go_backwards() {
        let clock = MonotonicClock::new();
        let first = clock.tick_count();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(clock.tick_count() >= first);
    }
}
