// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface identity.

use core::fmt;

/// A handle to a drawable surface owned by the host.
///
/// Hosts mint these handles; the scheduler treats them as opaque keys. The
/// slot index addresses the scheduler's per-surface entry and the generation
/// distinguishes successive surfaces that reuse a slot after the earlier one
/// was torn down. A request carrying an older generation than the slot's
/// current one is stale and ignored.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl SurfaceId {
    /// Creates a handle for slot `index` at the given `generation`.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self {
            idx: index,
            generation,
        }
    }

    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Returns the handle for the next surface to occupy this slot.
    #[inline]
    #[must_use]
    pub const fn next_generation(self) -> Self {
        Self {
            idx: self.idx,
            generation: self.generation.wrapping_add(1),
        }
    }
}

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({}@gen{})", self.idx, self.generation)
    }
}
