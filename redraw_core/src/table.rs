// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-surface scheduling state.
//!
//! The [`DirtyTable`] maps each surface slot to its pending invalidation and
//! its registered post-render hooks. Dirtiness is tracked on a single
//! [`REDRAW`] channel of an [`understory_dirty`] tracker, so draining yields
//! every owed surface exactly once in a deterministic order.
//!
//! Entries are created lazily by the first redraw request or hook
//! registration for a slot and are never removed. Slots are keyed sparsely,
//! so memory follows the number of surfaces seen, not the largest index. A handle with a newer
//! generation replaces the slot's entry (hooks of the torn-down surface are
//! dropped); a handle with an older generation is stale and ignored.

use alloc::collections::BTreeMap;
use alloc::collections::btree_map::Entry;
use alloc::vec::Vec;
use core::fmt;

use understory_dirty::{Channel, DirtyTracker};

use crate::damage::Damage;
use crate::hook::PostRenderHook;
use crate::surface::SurfaceId;

/// The only dirty channel: "owes a render pass".
pub const REDRAW: Channel = Channel::new(0);

struct SurfaceEntry<C> {
    generation: u32,
    force_invalidate: bool,
    damage: Option<Damage>,
    hooks: Vec<PostRenderHook<C>>,
}

impl<C> SurfaceEntry<C> {
    fn new(generation: u32) -> Self {
        Self {
            generation,
            force_invalidate: false,
            damage: None,
            hooks: Vec::new(),
        }
    }
}

/// A surface taken out of the table by [`DirtyTable::drain`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrainedSurface {
    /// The surface that owes a render pass.
    pub surface: SurfaceId,
    /// Whether any request since the last pass asked for a full, uncached
    /// render.
    pub force_invalidate: bool,
    /// Accumulated damage.
    pub damage: Damage,
}

/// Per-surface dirty flags and post-render hooks.
pub struct DirtyTable<C> {
    slots: BTreeMap<u32, SurfaceEntry<C>>,
    dirty: DirtyTracker<u32>,
}

impl<C> Default for DirtyTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for DirtyTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirtyTable")
            .field("entries", &self.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl<C> DirtyTable<C> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
            dirty: DirtyTracker::new(),
        }
    }

    /// Number of surfaces with an entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no surface has an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Marks `surface` as owing a render pass.
    ///
    /// `force_invalidate` and `damage` accumulate until the next drain.
    /// Returns `false` if the handle is stale.
    pub fn mark_dirty(
        &mut self,
        surface: SurfaceId,
        force_invalidate: bool,
        damage: Damage,
    ) -> bool {
        let Some(entry) = self.entry_mut(surface) else {
            return false;
        };
        entry.force_invalidate |= force_invalidate;
        entry.damage = Some(match entry.damage {
            Some(mut pending) => {
                pending.merge(damage);
                pending
            }
            None => damage,
        });
        self.dirty.mark(surface.idx, REDRAW);
        true
    }

    /// Adds `hook` to the surface's hook set.
    ///
    /// Returns `true` if the hook was not already registered.
    pub fn register_hook(&mut self, surface: SurfaceId, hook: PostRenderHook<C>) -> bool {
        let Some(entry) = self.entry_mut(surface) else {
            return false;
        };
        if entry.hooks.contains(&hook) {
            return false;
        }
        entry.hooks.push(hook);
        true
    }

    /// Removes `hook` from the surface's hook set.
    ///
    /// Unknown surfaces, stale handles and unknown hooks are no-ops. Returns
    /// `true` if a registration was removed.
    pub fn unregister_hook(&mut self, surface: SurfaceId, hook: &PostRenderHook<C>) -> bool {
        let Some(entry) = self.current_mut(surface) else {
            return false;
        };
        let before = entry.hooks.len();
        entry.hooks.retain(|h| !h.ptr_eq(hook));
        entry.hooks.len() != before
    }

    /// Returns the hooks currently registered for `surface`.
    #[must_use]
    pub fn hooks(&self, surface: SurfaceId) -> Vec<PostRenderHook<C>> {
        self.current(surface)
            .map(|entry| entry.hooks.clone())
            .unwrap_or_default()
    }

    /// Returns `true` if `hook` is registered for `surface`.
    #[must_use]
    pub fn has_hook(&self, surface: SurfaceId, hook: &PostRenderHook<C>) -> bool {
        self.current(surface)
            .is_some_and(|entry| entry.hooks.iter().any(|h| h.ptr_eq(hook)))
    }

    /// Number of hooks registered for `surface`.
    #[must_use]
    pub fn hook_count(&self, surface: SurfaceId) -> usize {
        self.current(surface).map_or(0, |entry| entry.hooks.len())
    }

    /// Takes every dirty surface out of the table.
    ///
    /// Each owed surface appears exactly once. Its pending flags are reset, so
    /// requests made after the drain start a fresh accumulation.
    pub fn drain(&mut self) -> Vec<DrainedSurface> {
        let keys: Vec<u32> = self.dirty.drain(REDRAW).deterministic().run().collect();
        let mut drained = Vec::with_capacity(keys.len());
        for idx in keys {
            let Some(entry) = self.slots.get_mut(&idx) else {
                continue;
            };
            drained.push(DrainedSurface {
                surface: SurfaceId::new(idx, entry.generation),
                force_invalidate: core::mem::take(&mut entry.force_invalidate),
                damage: entry.damage.take().unwrap_or(Damage::Full),
            });
        }
        drained
    }

    /// Puts surfaces back after an interrupted drain.
    ///
    /// Anything requested since the drain is merged with the restored state.
    pub fn restore(&mut self, surfaces: impl IntoIterator<Item = DrainedSurface>) {
        for s in surfaces {
            self.mark_dirty(s.surface, s.force_invalidate, s.damage);
        }
    }

    /// Returns the entry for `surface`, creating or replacing it as needed.
    fn entry_mut(&mut self, surface: SurfaceId) -> Option<&mut SurfaceEntry<C>> {
        match self.slots.entry(surface.idx) {
            Entry::Vacant(vacant) => Some(vacant.insert(SurfaceEntry::new(surface.generation))),
            Entry::Occupied(occupied) => {
                let entry = occupied.into_mut();
                if entry.generation == surface.generation {
                    Some(entry)
                } else if is_newer(surface.generation, entry.generation) {
                    self.dirty.remove_key(surface.idx);
                    *entry = SurfaceEntry::new(surface.generation);
                    Some(entry)
                } else {
                    None
                }
            }
        }
    }

    fn current(&self, surface: SurfaceId) -> Option<&SurfaceEntry<C>> {
        self.slots
            .get(&surface.idx)
            .filter(|entry| entry.generation == surface.generation)
    }

    fn current_mut(&mut self, surface: SurfaceId) -> Option<&mut SurfaceEntry<C>> {
        self.slots
            .get_mut(&surface.idx)
            .filter(|entry| entry.generation == surface.generation)
    }
}

/// Wrapping comparison so a slot survives generation counter overflow.
const fn is_newer(candidate: u32, current: u32) -> bool {
    let delta = candidate.wrapping_sub(current);
    delta != 0 && delta < u32::MAX / 2
}
