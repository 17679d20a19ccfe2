// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for FoodX integration tests.
//!
//! Deterministic stand-ins for the pieces of the SDK that touch the outside
//! world, plus a harness that assembles an offline service from them.
//!
//! # Components
//!
//! - [`ManualClock`] - clock that only moves when told to
//! - [`RecordingListener`] / [`FailingListener`] - event capture and misbehaving listeners
//! - [`FailingStorage`] - in-memory storage with switchable faults
//! - [`TestHarness`] - offline service wired to all of the above

pub mod clock;
pub mod failing_storage;
pub mod harness;
pub mod listeners;

pub use clock::ManualClock;
pub use failing_storage::FailingStorage;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use listeners::{FailingListener, RecordingListener};
