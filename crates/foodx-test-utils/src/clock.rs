// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A clock driven by the test.

use std::sync::atomic::{AtomicI64, Ordering};

use foodx_core::{Clock, Timestamp};

/// Clock whose time only changes through [`advance`](ManualClock::advance)
/// and [`set`](ManualClock::set).
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn advance(&self, millis: i64) -> Timestamp {
        self.now.fetch_add(millis, Ordering::SeqCst) + millis
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    /// 2026-01-01T00:00:00Z
    fn default() -> Self {
        Self::new(1_767_225_600_000)
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_returns_new_time() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.advance(50), 150);
        assert_eq!(clock.now_millis(), 150);
        clock.set(7);
        assert_eq!(clock.now_millis(), 7);
    }
}
