// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-tick outcome and running totals.

use crate::time::HostTime;

/// What happened during one tick.
///
/// Failures inside a tick never escape it; they are counted here instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Index of the tick.
    pub frame_index: u64,
    /// Tick timestamp.
    pub now: HostTime,
    /// Surfaces that were owed a render pass.
    pub drained: u32,
    /// Surfaces rendered successfully.
    pub rendered: u32,
    /// Surfaces skipped because their context no longer resolves.
    pub unresolved: u32,
    /// Render calls that returned an error.
    pub render_failures: u32,
    /// Post-render hook invocations.
    pub hooks_invoked: u32,
    /// Hook invocations that returned an error.
    pub hook_failures: u32,
    /// Whether a frame is armed after the tick.
    pub rearmed: bool,
}

impl TickReport {
    /// Returns `true` if any collaborator failed during the tick.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.render_failures > 0 || self.hook_failures > 0
    }
}

/// Totals since the scheduler was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RedrawStats {
    /// Ticks processed.
    pub ticks: u64,
    /// Successful renders.
    pub renders: u64,
    /// Surfaces skipped as unresolved.
    pub unresolved: u64,
    /// Failed renders.
    pub render_failures: u64,
    /// Hook invocations.
    pub hooks_invoked: u64,
    /// Failed hook invocations.
    pub hook_failures: u64,
    /// Times the loop went dormant after the idle window elapsed.
    pub idle_stops: u64,
    /// Times the loop was stopped because output became hidden.
    pub hidden_stops: u64,
}

impl RedrawStats {
    /// Folds one tick into the totals.
    pub fn record(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.renders += u64::from(report.rendered);
        self.unresolved += u64::from(report.unresolved);
        self.render_failures += u64::from(report.render_failures);
        self.hooks_invoked += u64::from(report.hooks_invoked);
        self.hook_failures += u64::from(report.hook_failures);
    }
}
