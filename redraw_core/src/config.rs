// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scheduler configuration.

use crate::time::{Duration, Timebase};

/// Default idle window, in milliseconds.
pub const IDLE_WINDOW_MS: u64 = 100;

/// Tuning knobs for [`RedrawScheduler`](crate::scheduler::RedrawScheduler).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RedrawConfig {
    /// How long the loop keeps re-arming after the last redraw request or
    /// hook invocation, in host ticks.
    pub idle_window: Duration,
}

impl RedrawConfig {
    /// Preset for hosts whose clock ticks in microseconds
    /// (`performance.now()` scaled by the web backend).
    #[must_use]
    pub const fn web() -> Self {
        Self::with_idle_window_ms(IDLE_WINDOW_MS, Timebase::MICROS)
    }

    /// Preset for hosts whose clock ticks in nanoseconds.
    #[must_use]
    pub const fn nanos() -> Self {
        Self::with_idle_window_ms(IDLE_WINDOW_MS, Timebase::NANOS)
    }

    /// A config with an idle window of `millis` milliseconds in `timebase`.
    #[must_use]
    pub const fn with_idle_window_ms(millis: u64, timebase: Timebase) -> Self {
        Self {
            idle_window: Duration::from_millis(millis, timebase),
        }
    }
}

impl Default for RedrawConfig {
    fn default() -> Self {
        Self::web()
    }
}
