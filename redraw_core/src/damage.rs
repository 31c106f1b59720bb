// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Accumulated invalidation for a single surface.

use kurbo::Rect;

/// The part of a surface that must be repainted.
///
/// Requests made between two ticks merge into one `Damage`: any full-surface
/// request wins, and region requests grow to their bounding union.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Damage {
    /// The whole surface.
    Full,
    /// An axis-aligned region in surface coordinates.
    Region(Rect),
}

impl Damage {
    /// Merges `other` into `self`.
    pub fn merge(&mut self, other: Self) {
        *self = match (*self, other) {
            (Self::Full, _) | (_, Self::Full) => Self::Full,
            (Self::Region(a), Self::Region(b)) => Self::Region(a.union(b)),
        };
    }

    /// Returns `true` if this covers the whole surface.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }
}
