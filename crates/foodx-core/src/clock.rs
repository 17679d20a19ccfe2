// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock source for timestamps and durations.

use crate::types::Timestamp;

/// Source of the current time in Unix milliseconds.
///
/// Services take an `Arc<dyn Clock>` so that expiry and duration logic can
/// be driven deterministically in tests.
pub trait Clock: Send + Sync + 'static {
    fn now_millis(&self) -> Timestamp;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> Timestamp {
        chrono::Utc::now().timestamp_millis()
    }
}
