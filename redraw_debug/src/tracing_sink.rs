// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bridge into the `tracing` ecosystem.
//!
//! [`TracingSink`] forwards every scheduler event to `tracing` under the
//! `redraw` target: normal flow at `debug`/`trace`, collaborator failures at
//! `warn`. Install it with
//! [`RedrawScheduler::set_trace_sink`](redraw_core::scheduler::RedrawScheduler::set_trace_sink)
//! and any subscriber picks the events up.

use redraw_core::trace::{
    FrameArmedEvent, HookFailedEvent, LoopStoppedEvent, RedrawRequestedEvent, RenderOutcome,
    SurfaceRenderedEvent, TickBeginEvent, TickEndEvent, TraceSink, VisibilityChangedEvent,
};
use tracing::{debug, trace, warn};

/// A [`TraceSink`] that emits `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn on_redraw_requested(&mut self, e: &RedrawRequestedEvent) {
        trace!(
            target: "redraw",
            surface = ?e.surface,
            force_invalidate = e.force_invalidate,
            armed = e.armed,
            at = e.at.ticks(),
            "redraw requested"
        );
    }

    fn on_frame_armed(&mut self, e: &FrameArmedEvent) {
        trace!(
            target: "redraw",
            request = e.request.0,
            reason = ?e.reason,
            "frame armed"
        );
    }

    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        debug!(
            target: "redraw",
            frame_index = e.frame_index,
            dirty = e.dirty,
            now = e.now.ticks(),
            "tick"
        );
    }

    fn on_surface_rendered(&mut self, e: &SurfaceRenderedEvent) {
        match e.outcome {
            RenderOutcome::Rendered => trace!(
                target: "redraw",
                frame_index = e.frame_index,
                surface = ?e.surface,
                force_invalidate = e.force_invalidate,
                "surface rendered"
            ),
            RenderOutcome::Failed(error) => warn!(
                target: "redraw",
                frame_index = e.frame_index,
                surface = ?e.surface,
                error = %error,
                "render failed"
            ),
            RenderOutcome::Unresolved(error) => debug!(
                target: "redraw",
                frame_index = e.frame_index,
                surface = ?e.surface,
                error = %error,
                "surface skipped"
            ),
        }
    }

    fn on_hook_failed(&mut self, e: &HookFailedEvent) {
        warn!(
            target: "redraw",
            frame_index = e.frame_index,
            surface = ?e.surface,
            error = %e.error,
            "post-render hook failed"
        );
    }

    fn on_tick_end(&mut self, e: &TickEndEvent) {
        let r = &e.report;
        debug!(
            target: "redraw",
            frame_index = r.frame_index,
            rendered = r.rendered,
            unresolved = r.unresolved,
            render_failures = r.render_failures,
            hooks_invoked = r.hooks_invoked,
            hook_failures = r.hook_failures,
            rearmed = r.rearmed,
            "tick done"
        );
    }

    fn on_loop_stopped(&mut self, e: &LoopStoppedEvent) {
        debug!(
            target: "redraw",
            frame_index = e.frame_index,
            reason = ?e.reason,
            "loop stopped"
        );
    }

    fn on_visibility_changed(&mut self, e: &VisibilityChangedEvent) {
        debug!(target: "redraw", visibility = ?e.visibility, "visibility changed");
    }
}
