// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end behavior of the refresh loop, driven through the harness.

use std::cell::Cell;
use std::rc::Rc;

use kurbo::Rect;
use redraw_core::config::RedrawConfig;
use redraw_core::damage::Damage;
use redraw_core::error::{HookError, RenderError};
use redraw_core::hook::PostRenderHook;
use redraw_core::host::Visibility;
use redraw_core::scheduler::RedrawScheduler;
use redraw_core::surface::SurfaceId;
use redraw_core::time::{Duration, HostTime};
use redraw_harness::{Harness, ManualClock, ManualFrames, ManualVisibility, RecordingHost};

/// One 60 Hz refresh interval in microsecond ticks.
const FRAME: Duration = Duration(16_667);
const MS: u64 = 1_000;

fn s(index: u32) -> SurfaceId {
    SurfaceId::new(index, 0)
}

fn counting_hook(count: &Rc<Cell<u32>>) -> PostRenderHook<SurfaceId> {
    let count = Rc::clone(count);
    PostRenderHook::infallible(move |_| count.set(count.get() + 1))
}

// ---------------------------------------------------------------------------
// Coalescing
// ---------------------------------------------------------------------------

#[test]
fn repeated_requests_render_once_with_force_if_any() {
    let h = Harness::new(RedrawConfig::web());
    h.scheduler.request_redraw(s(1), false);
    h.scheduler.request_redraw(s(1), true);
    h.scheduler.request_redraw(s(1), false);

    let report = h.tick().expect("first request arms a frame");
    assert_eq!(report.rendered, 1);
    let renders = h.host.renders();
    assert_eq!(renders.len(), 1, "one render per surface per tick");
    assert!(renders[0].request.force_invalidate, "force is sticky");
    assert_eq!(h.frames.overlapping_requests(), 0);
}

#[test]
fn force_does_not_leak_into_next_tick() {
    let h = Harness::new(RedrawConfig::web());
    h.scheduler.request_redraw(s(1), true);
    h.tick();
    h.scheduler.request_redraw(s(1), false);
    h.advance_and_tick(FRAME);

    let renders = h.host.renders();
    assert_eq!(renders.len(), 2);
    assert!(!renders[1].request.force_invalidate);
}

#[test]
fn surfaces_without_requests_are_not_rendered() {
    let h = Harness::new(RedrawConfig::web());
    let hooked = Rc::new(Cell::new(0));
    h.scheduler.register_hook(s(2), counting_hook(&hooked));
    h.scheduler.request_redraw(s(1), false);

    h.tick();
    assert_eq!(h.host.render_count(s(1)), 1);
    assert_eq!(h.host.render_count(s(2)), 0, "hook registration is not a request");
    assert_eq!(hooked.get(), 0);

    let later = h.advance_and_tick(FRAME).expect("idle window keeps the loop armed");
    assert_eq!(later.drained, 0);
    assert_eq!(h.host.renders().len(), 1, "nothing dirty, nothing rendered");
}

#[test]
fn drain_order_is_ascending_slot_index() {
    let h = Harness::new(RedrawConfig::web());
    for index in [7, 2, 5, 0] {
        h.scheduler.request_redraw(s(index), false);
    }
    h.tick();
    let order: Vec<u32> = h.host.renders().iter().map(|r| r.surface.index()).collect();
    assert_eq!(order, [0, 2, 5, 7]);
}

#[test]
fn regions_accumulate_and_full_requests_win() {
    let h = Harness::new(RedrawConfig::web());
    h.scheduler
        .request_redraw_region(s(0), Rect::new(0.0, 0.0, 10.0, 10.0));
    h.scheduler
        .request_redraw_region(s(0), Rect::new(20.0, 5.0, 30.0, 15.0));
    h.scheduler
        .request_redraw_region(s(1), Rect::new(1.0, 1.0, 2.0, 2.0));
    h.scheduler.request_redraw(s(1), false);
    h.tick();

    let renders = h.host.renders();
    assert_eq!(
        renders[0].request.damage,
        Damage::Region(Rect::new(0.0, 0.0, 30.0, 15.0)),
        "regions union"
    );
    assert_eq!(renders[1].request.damage, Damage::Full);
}

#[test]
fn pre_render_notification_precedes_each_render() {
    let h = Harness::new(RedrawConfig::web());
    h.clock.set(HostTime(5 * MS));
    h.scheduler.request_redraw(s(0), false);
    h.scheduler.request_redraw(s(3), false);
    h.clock.set(HostTime(16 * MS));
    h.tick();

    assert_eq!(h.host.notification_count(), 2);
    for record in h.host.renders() {
        assert_eq!(record.at, HostTime(16 * MS), "notification carries tick time");
        assert_eq!(record.frame_index, 0);
    }
}

// ---------------------------------------------------------------------------
// Handles and resolution
// ---------------------------------------------------------------------------

#[test]
fn released_surface_is_skipped_and_not_retried() {
    let h = Harness::new(RedrawConfig::web());
    h.scheduler.request_redraw(s(0), false);
    h.scheduler.request_redraw(s(1), false);
    h.host.release(s(0));

    let report = h.tick().expect("armed");
    assert_eq!(report.unresolved, 1);
    assert_eq!(report.rendered, 1);
    assert_eq!(h.host.render_count(s(0)), 0);

    let next = h.advance_and_tick(FRAME).expect("idle window open");
    assert_eq!(next.unresolved, 0, "skipped entry was cleared");
}

#[test]
fn requests_for_unresolvable_surfaces_do_nothing() {
    let h = Harness::new(RedrawConfig::web());
    h.host.release(s(4));
    h.scheduler.request_redraw(s(4), true);
    assert!(!h.scheduler.is_armed());
    assert_eq!(h.frames.request_count(), 0);
}

#[test]
fn stale_handles_are_ignored_after_recreation() {
    let h = Harness::new(RedrawConfig::web());
    let old = SurfaceId::new(3, 0);
    let new = old.next_generation();
    let old_hook = Rc::new(Cell::new(0));
    h.scheduler.register_hook(old, counting_hook(&old_hook));

    h.scheduler.request_redraw(new, false);
    assert_eq!(h.scheduler.hook_count(new), 0, "recreated surface starts clean");
    h.scheduler.request_redraw(old, true);
    h.tick();

    let renders = h.host.renders();
    assert_eq!(renders.len(), 1);
    assert_eq!(renders[0].surface, new);
    assert!(!renders[0].request.force_invalidate, "stale request had no effect");
    assert_eq!(old_hook.get(), 0);
}

#[test]
fn largest_slot_index_is_an_ordinary_surface() {
    let h = Harness::new(RedrawConfig::web());
    let top = SurfaceId::new(u32::MAX, 0);
    let hooked = Rc::new(Cell::new(0));
    assert!(h.scheduler.register_hook(top, counting_hook(&hooked)));
    h.scheduler.request_redraw(top, true);

    let report = h.tick().expect("request arms a frame");
    assert_eq!(report.rendered, 1);
    assert_eq!(h.host.render_count(top), 1);
    assert_eq!(hooked.get(), 1, "hook runs after the render");
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

#[test]
fn duplicate_hook_registration_runs_once() {
    let h = Harness::new(RedrawConfig::web());
    let count = Rc::new(Cell::new(0));
    let hook = counting_hook(&count);
    assert!(h.scheduler.register_hook(s(0), hook.clone()));
    assert!(!h.scheduler.register_hook(s(0), hook));

    h.scheduler.request_redraw(s(0), false);
    let report = h.tick().expect("armed");
    assert_eq!(count.get(), 1);
    assert_eq!(report.hooks_invoked, 1);
}

#[test]
fn unregistered_hook_is_never_called_again() {
    let h = Harness::new(RedrawConfig::web());
    let count = Rc::new(Cell::new(0));
    let hook = counting_hook(&count);
    h.scheduler.register_hook(s(0), hook.clone());

    h.scheduler.request_redraw(s(0), false);
    h.tick();
    assert_eq!(count.get(), 1);

    assert!(h.scheduler.unregister_hook(s(0), &hook));
    h.scheduler.request_redraw(s(0), false);
    h.advance_and_tick(FRAME);
    assert_eq!(count.get(), 1);
    assert_eq!(h.host.render_count(s(0)), 2, "surface still renders");
}

#[test]
fn unregistering_an_unknown_hook_is_a_noop() {
    let h = Harness::new(RedrawConfig::web());
    let hook = PostRenderHook::infallible(|_: &SurfaceId| {});
    assert!(!h.scheduler.unregister_hook(s(9), &hook));
    h.scheduler.register_hook(s(9), PostRenderHook::infallible(|_| {}));
    assert!(!h.scheduler.unregister_hook(s(9), &hook));
    assert_eq!(h.scheduler.hook_count(s(9)), 1);
}

#[test]
fn hook_unregistered_mid_tick_is_skipped() {
    let h = Harness::new(RedrawConfig::web());
    let late = Rc::new(Cell::new(0));
    let late_hook = counting_hook(&late);

    let scheduler = h.scheduler.clone();
    let victim = late_hook.clone();
    h.scheduler.register_hook(
        s(0),
        PostRenderHook::infallible(move |surface: &SurfaceId| {
            scheduler.unregister_hook(*surface, &victim);
        }),
    );
    h.scheduler.register_hook(s(0), late_hook);

    h.scheduler.request_redraw(s(0), false);
    let report = h.tick().expect("armed");
    assert_eq!(late.get(), 0, "removal takes effect within the tick");
    assert_eq!(report.hooks_invoked, 1);
}

#[test]
fn failing_hook_does_not_stop_other_surfaces() {
    let h = Harness::new(RedrawConfig::web());
    h.scheduler.register_hook(
        s(1),
        PostRenderHook::new(|_| Err(HookError::Failed("s1 hook"))),
    );
    let s2_ran = Rc::new(Cell::new(0));
    h.scheduler.register_hook(s(2), counting_hook(&s2_ran));

    h.scheduler.request_redraw(s(1), false);
    h.scheduler.request_redraw(s(2), false);
    let report = h.tick().expect("armed");

    assert_eq!(s2_ran.get(), 1, "S2's hook runs in the same tick");
    assert_eq!(report.hook_failures, 1);
    assert_eq!(report.hooks_invoked, 2);
    assert!(report.rearmed, "a failure never stops the loop");
    assert_eq!(h.scheduler.stats().hook_failures, 1);
}

#[test]
fn redraw_requested_from_a_hook_runs_next_tick() {
    let h = Harness::new(RedrawConfig::web());
    let scheduler = h.scheduler.clone();
    let remaining = Rc::new(Cell::new(2));
    let remaining2 = Rc::clone(&remaining);
    h.scheduler.register_hook(
        s(0),
        PostRenderHook::infallible(move |surface: &SurfaceId| {
            if remaining2.get() > 0 {
                remaining2.set(remaining2.get() - 1);
                scheduler.request_redraw(*surface, false);
            }
        }),
    );

    h.scheduler.request_redraw(s(0), false);
    let first = h.tick().expect("armed");
    assert_eq!(first.rendered, 1, "hook request does not re-enter the drain");
    assert!(first.rearmed);

    h.advance_and_tick(FRAME);
    h.advance_and_tick(FRAME);
    assert_eq!(h.host.render_count(s(0)), 3, "one render per tick for the chain");
    assert_eq!(h.frames.overlapping_requests(), 0);
}

#[test]
fn render_failure_is_counted_and_skips_hooks() {
    let h = Harness::new(RedrawConfig::web());
    let count = Rc::new(Cell::new(0));
    h.scheduler.register_hook(s(0), counting_hook(&count));
    h.host.fail_renders_for(s(0), RenderError::Backend("device lost"));

    h.scheduler.request_redraw(s(0), false);
    h.scheduler.request_redraw(s(1), false);
    let report = h.tick().expect("armed");

    assert_eq!(report.render_failures, 1);
    assert_eq!(report.rendered, 1, "other surfaces still render");
    assert_eq!(count.get(), 0);
    assert!(report.has_failures());
    assert!(report.rearmed);
}

// ---------------------------------------------------------------------------
// Idle timeout
// ---------------------------------------------------------------------------

#[test]
fn loop_stops_once_idle_window_elapses() {
    let h = Harness::new(RedrawConfig::web());
    h.scheduler.request_redraw(s(0), false);

    let reports = h.run_until_idle(FRAME, 100);
    let last = reports.last().expect("at least one tick");
    assert!(!last.rearmed, "loop went dormant");
    assert!(
        last.now >= HostTime(100 * MS),
        "loop ran until the window closed"
    );
    assert!(reports[..reports.len() - 1].iter().all(|r| r.rearmed));

    let requests = h.frames.request_count();
    h.clock.advance(Duration(1_000 * MS));
    assert!(h.tick().is_none(), "nothing pending");
    assert_eq!(h.frames.request_count(), requests, "no further arming");
    assert_eq!(h.scheduler.stats().idle_stops, 1);
}

#[test]
fn late_tick_renders_once_then_goes_dormant() {
    let h = Harness::new(RedrawConfig::web());
    h.scheduler.request_redraw(s(1), false);
    h.clock.set(HostTime(150 * MS));

    let report = h.tick().expect("armed");
    assert_eq!(report.rendered, 1);
    assert!(!report.rearmed, "window closed at 100 ms");
    assert_eq!(h.frames.request_count(), 1, "exactly one tick occurred");
    assert!(!h.scheduler.is_armed());

    h.scheduler.request_redraw(s(1), false);
    assert_eq!(h.frames.request_count(), 2, "new request arms exactly one tick");
    assert!(h.scheduler.is_armed());
}

#[test]
fn hook_activity_extends_the_window() {
    let h = Harness::new(RedrawConfig::web());
    h.scheduler
        .register_hook(s(0), PostRenderHook::infallible(|_| {}));
    h.scheduler.request_redraw(s(0), false);

    h.clock.set(HostTime(90 * MS));
    h.tick();
    assert_eq!(h.scheduler.idle_deadline(), Some(HostTime(190 * MS)));

    h.clock.set(HostTime(180 * MS));
    let report = h.tick().expect("re-armed by hook activity");
    assert!(report.rearmed, "deadline moved past 180 ms");
}

#[test]
fn empty_ticks_do_not_extend_the_window() {
    let h = Harness::new(RedrawConfig::web());
    h.scheduler.request_redraw(s(0), false);
    h.tick();
    let deadline = h.scheduler.idle_deadline();
    h.advance_and_tick(FRAME);
    h.advance_and_tick(FRAME);
    assert_eq!(h.scheduler.idle_deadline(), deadline);
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

#[test]
fn hiding_cancels_and_showing_arms_exactly_one() {
    let h = Harness::new(RedrawConfig::web());
    h.scheduler.request_redraw(s(0), false);
    assert!(h.frames.pending().is_some());

    h.clock.set(HostTime(5 * MS));
    h.visibility.set(Visibility::Hidden);
    assert_eq!(h.frames.cancel_count(), 1);
    assert!(h.frames.pending().is_none(), "pending tick cancelled at once");
    assert!(h.scheduler.is_suspended());

    h.scheduler.request_redraw(s(1), false);
    assert!(!h.scheduler.is_armed(), "nothing armed while hidden");

    h.clock.set(HostTime(500 * MS));
    let before = h.frames.request_count();
    h.visibility.set(Visibility::Visible);
    assert_eq!(h.frames.request_count(), before + 1);
    assert_eq!(h.scheduler.idle_deadline(), Some(HostTime(600 * MS)));

    let report = h.tick().expect("armed on resume");
    assert_eq!(report.rendered, 2, "work queued while hidden drains");
    assert!(report.rearmed);
    assert_eq!(h.scheduler.stats().hidden_stops, 1);
}

#[test]
fn showing_arms_even_with_nothing_dirty() {
    let h = Harness::with_visibility(RedrawConfig::web(), Visibility::Hidden);
    h.scheduler.request_redraw(s(0), false);
    assert_eq!(h.frames.request_count(), 0, "starts hidden");

    h.visibility.set(Visibility::Visible);
    h.tick();
    h.visibility.set(Visibility::Hidden);
    h.visibility.set(Visibility::Visible);
    let report = h.tick().expect("resume arms unconditionally");
    assert_eq!(report.drained, 0);
    assert_eq!(h.frames.overlapping_requests(), 0);
}

#[test]
fn repeated_visibility_reports_are_ignored() {
    let h = Harness::new(RedrawConfig::web());
    h.visibility.set(Visibility::Visible);
    assert_eq!(h.frames.request_count(), 0, "already visible");
    h.visibility.set(Visibility::Hidden);
    h.visibility.set(Visibility::Hidden);
    assert_eq!(h.scheduler.stats().hidden_stops, 1);
}

#[test]
fn visibility_listener_is_installed_once_and_outlived() {
    let host = RecordingHost::new();
    let frames = ManualFrames::new();
    let visibility = ManualVisibility::new(Visibility::Visible);
    let scheduler = RedrawScheduler::new(
        RedrawConfig::web(),
        host,
        frames.clone(),
        ManualClock::default(),
        &visibility,
    );
    assert_eq!(visibility.subscriber_count(), 1);

    drop(scheduler);
    visibility.set(Visibility::Hidden);
    visibility.set(Visibility::Visible);
    assert_eq!(frames.request_count(), 0, "dropped scheduler ignores changes");
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[test]
fn frame_indices_and_stats_accumulate() {
    let h = Harness::new(RedrawConfig::web());
    h.scheduler.request_redraw(s(0), false);
    let first = h.tick().expect("armed");
    h.scheduler.request_redraw(s(0), false);
    let second = h.advance_and_tick(FRAME).expect("armed");

    assert_eq!(first.frame_index, 0);
    assert_eq!(second.frame_index, 1);
    assert_eq!(h.scheduler.next_frame_index(), 2);
    let stats = h.scheduler.stats();
    assert_eq!(stats.ticks, 2);
    assert_eq!(stats.renders, 2);
}
