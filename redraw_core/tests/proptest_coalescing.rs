// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property-based invariants for request coalescing.
//!
//! 1. Every surface requested between two ticks renders exactly once on the
//!    next tick, with `force_invalidate` set iff any request set it.
//! 2. Surfaces with no request in the window are never rendered.
//! 3. Whatever the interleaving of requests, ticks and visibility changes, at
//!    most one frame is outstanding, and a visible scheduler with queued work
//!    always has one.

use std::collections::BTreeMap;

use proptest::prelude::*;
use redraw_core::config::RedrawConfig;
use redraw_core::host::Visibility;
use redraw_core::surface::SurfaceId;
use redraw_core::time::Duration;
use redraw_harness::Harness;

const SURFACES: u32 = 6;

// ── Helpers ─────────────────────────────────────────────────────────────

fn request_strategy() -> impl Strategy<Value = (u32, bool)> {
    (0..SURFACES, any::<bool>())
}

#[derive(Clone, Copy, Debug)]
enum Op {
    Request(u32, bool),
    Tick(u64),
    Hide,
    Show,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => request_strategy().prop_map(|(index, force)| Op::Request(index, force)),
        3 => (1_u64..60_000).prop_map(Op::Tick),
        1 => Just(Op::Hide),
        1 => Just(Op::Show),
    ]
}

// ═════════════════════════════════════════════════════════════════════════
// 1 + 2. One render per requested surface, force iff any
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn each_window_renders_each_surface_once(
        windows in prop::collection::vec(prop::collection::vec(request_strategy(), 0..20), 1..6)
    ) {
        let h = Harness::new(RedrawConfig::web());
        for window in &windows {
            let mut expected: BTreeMap<u32, bool> = BTreeMap::new();
            for &(index, force) in window {
                h.scheduler.request_redraw(SurfaceId::new(index, 0), force);
                *expected.entry(index).or_default() |= force;
            }

            h.host.take_renders();
            h.clock.advance(Duration(16_667));
            let report = h.tick();
            let renders = h.host.take_renders();

            if window.is_empty() && report.is_none() {
                continue;
            }
            prop_assert_eq!(renders.len(), expected.len(), "renders in window {:?}", window);
            for record in &renders {
                let index = record.surface.index();
                prop_assert_eq!(
                    expected.get(&index).copied(),
                    Some(record.request.force_invalidate),
                    "surface {} force flag", index
                );
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Single outstanding frame; queued visible work is always armed
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn never_more_than_one_frame_outstanding(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let h = Harness::new(RedrawConfig::web());
        let mut queued = false;
        for op in ops {
            match op {
                Op::Request(index, force) => {
                    h.scheduler.request_redraw(SurfaceId::new(index, 0), force);
                    queued = true;
                }
                Op::Tick(dt) => {
                    if h.advance_and_tick(Duration(dt)).is_some_and(|r| r.drained > 0) {
                        queued = false;
                    }
                }
                Op::Hide => h.visibility.set(Visibility::Hidden),
                Op::Show => h.visibility.set(Visibility::Visible),
            }
            prop_assert_eq!(h.frames.overlapping_requests(), 0);
            prop_assert_eq!(h.scheduler.is_armed(), h.frames.pending().is_some());
            if queued && !h.scheduler.is_suspended() {
                prop_assert!(h.scheduler.is_armed(), "visible queued work left unscheduled");
            }
        }
    }
}
