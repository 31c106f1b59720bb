// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host clock ticks and their conversion to wall-clock units.
//!
//! The scheduler never interprets ticks itself. It compares [`HostTime`]s
//! against idle deadlines and adds [`Duration`]s to them. A [`Timebase`] only
//! matters at the edges: turning "100 ms" into ticks when a
//! [`RedrawConfig`](crate::config::RedrawConfig) is built, and turning ticks
//! back into readable times in diagnostics.

use core::fmt;
use core::ops::Add;

/// An instant on the host's monotonic clock, in host ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Raw ticks.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// `self + span`, pinned to the last representable instant on overflow.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, span: Duration) -> Self {
        Self(self.0.saturating_add(span.0))
    }
}

/// Saturating; a deadline far in the future never wraps into the past.
impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, span: Duration) -> Self {
        self.saturating_add(span)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.0)
    }
}

/// How long one tick is: `numer / denom` nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timebase {
    /// Nanoseconds per `denom` ticks.
    pub numer: u32,
    /// Ticks per `numer` nanoseconds.
    pub denom: u32,
}

impl Timebase {
    /// One tick per nanosecond.
    pub const NANOS: Self = Self { numer: 1, denom: 1 };

    /// One tick per microsecond, as reported by `performance.now()` once
    /// scaled by the browser backend.
    pub const MICROS: Self = Self {
        numer: 1000,
        denom: 1,
    };

    /// A timebase where `denom` ticks last `numer` nanoseconds.
    ///
    /// # Panics
    ///
    /// If either part is zero.
    #[inline]
    #[must_use]
    pub const fn new(numer: u32, denom: u32) -> Self {
        assert!(
            numer != 0 && denom != 0,
            "timebase ratio must be finite and non-zero"
        );
        Self { numer, denom }
    }

    /// Nanoseconds spanned by `ticks`.
    #[inline]
    #[must_use]
    pub const fn ticks_to_nanos(self, ticks: u64) -> u64 {
        scale(ticks, self.numer, self.denom)
    }

    /// Whole ticks that fit in `nanos`.
    #[inline]
    #[must_use]
    pub const fn nanos_to_ticks(self, nanos: u64) -> u64 {
        scale(nanos, self.denom, self.numer)
    }
}

impl fmt::Debug for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timebase({}ns/{}t)", self.numer, self.denom)
    }
}

/// `value * mul / div`, widened so that the product cannot overflow.
#[expect(
    clippy::cast_possible_truncation,
    reason = "results are clamped to u64::MAX before narrowing"
)]
const fn scale(value: u64, mul: u32, div: u32) -> u64 {
    let wide = value as u128 * mul as u128 / div as u128;
    if wide > u64::MAX as u128 {
        u64::MAX
    } else {
        wide as u64
    }
}

/// A span of host ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// No time at all.
    pub const ZERO: Self = Self(0);

    /// Raw ticks.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// `millis` milliseconds expressed in `timebase` ticks.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64, timebase: Timebase) -> Self {
        Self(timebase.nanos_to_ticks(millis.saturating_mul(1_000_000)))
    }

    /// This span in nanoseconds.
    #[inline]
    #[must_use]
    pub const fn to_nanos(self, timebase: Timebase) -> u64 {
        timebase.ticks_to_nanos(self.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}t", self.0)
    }
}
