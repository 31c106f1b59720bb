// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fan-out to two sinks.

use redraw_core::trace::{
    FrameArmedEvent, HookFailedEvent, LoopStoppedEvent, RedrawRequestedEvent,
    SurfaceRenderedEvent, TickBeginEvent, TickEndEvent, TraceSink, VisibilityChangedEvent,
};

/// Delivers every event to `first`, then to `second`.
///
/// Nest tees for more than two destinations.
#[derive(Debug, Default)]
pub struct TeeSink<A, B> {
    /// Receives each event first.
    pub first: A,
    /// Receives each event second.
    pub second: B,
}

impl<A, B> TeeSink<A, B> {
    /// Combines two sinks.
    #[must_use]
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: TraceSink, B: TraceSink> TraceSink for TeeSink<A, B> {
    fn on_redraw_requested(&mut self, e: &RedrawRequestedEvent) {
        self.first.on_redraw_requested(e);
        self.second.on_redraw_requested(e);
    }

    fn on_frame_armed(&mut self, e: &FrameArmedEvent) {
        self.first.on_frame_armed(e);
        self.second.on_frame_armed(e);
    }

    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        self.first.on_tick_begin(e);
        self.second.on_tick_begin(e);
    }

    fn on_surface_rendered(&mut self, e: &SurfaceRenderedEvent) {
        self.first.on_surface_rendered(e);
        self.second.on_surface_rendered(e);
    }

    fn on_hook_failed(&mut self, e: &HookFailedEvent) {
        self.first.on_hook_failed(e);
        self.second.on_hook_failed(e);
    }

    fn on_tick_end(&mut self, e: &TickEndEvent) {
        self.first.on_tick_end(e);
        self.second.on_tick_end(e);
    }

    fn on_loop_stopped(&mut self, e: &LoopStoppedEvent) {
        self.first.on_loop_stopped(e);
        self.second.on_loop_stopped(e);
    }

    fn on_visibility_changed(&mut self, e: &VisibilityChangedEvent) {
        self.first.on_visibility_changed(e);
        self.second.on_visibility_changed(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{RecordedEvent, RecorderSink, decode};
    use redraw_core::error::{HookError, RenderError};
    use redraw_core::host::{FrameRequest, Visibility};
    use redraw_core::report::TickReport;
    use redraw_core::surface::SurfaceId;
    use redraw_core::time::HostTime;
    use redraw_core::trace::{ArmReason, NoopSink, RenderOutcome, StopReason};

    fn feed(sink: &mut impl TraceSink) {
        let surface = SurfaceId::new(4, 1);
        sink.on_redraw_requested(&RedrawRequestedEvent {
            surface,
            force_invalidate: true,
            armed: true,
            at: HostTime(10),
        });
        sink.on_frame_armed(&FrameArmedEvent {
            request: FrameRequest(1),
            at: HostTime(10),
            reason: ArmReason::Request,
        });
        sink.on_tick_begin(&TickBeginEvent {
            frame_index: 0,
            now: HostTime(26),
            dirty: 1,
        });
        sink.on_surface_rendered(&SurfaceRenderedEvent {
            frame_index: 0,
            surface,
            force_invalidate: true,
            outcome: RenderOutcome::Failed(RenderError::Backend("lost device")),
        });
        sink.on_hook_failed(&HookFailedEvent {
            frame_index: 0,
            surface,
            error: HookError::Reentrant,
        });
        sink.on_tick_end(&TickEndEvent {
            report: TickReport {
                now: HostTime(26),
                drained: 1,
                render_failures: 1,
                hook_failures: 1,
                rearmed: true,
                ..TickReport::default()
            },
        });
        sink.on_visibility_changed(&VisibilityChangedEvent {
            visibility: Visibility::Hidden,
            at: HostTime(30),
        });
        sink.on_loop_stopped(&LoopStoppedEvent {
            frame_index: 0,
            at: HostTime(30),
            reason: StopReason::Hidden,
        });
    }

    #[test]
    fn both_recorders_see_the_same_stream() {
        let mut tee = TeeSink::new(RecorderSink::new(), RecorderSink::new());
        feed(&mut tee);

        assert!(!tee.first.as_bytes().is_empty(), "first recorded nothing");
        assert_eq!(
            tee.first.as_bytes(),
            tee.second.as_bytes(),
            "recordings diverge"
        );

        let first: Vec<RecordedEvent> = decode(tee.first.as_bytes()).collect();
        let second: Vec<RecordedEvent> = decode(tee.second.as_bytes()).collect();
        assert_eq!(first.len(), 8, "every event forwarded");
        assert_eq!(
            format!("{first:?}"),
            format!("{second:?}"),
            "decoded streams differ"
        );
    }

    #[test]
    fn tee_matches_a_lone_recorder() {
        let mut alone = RecorderSink::new();
        feed(&mut alone);
        let mut tee = TeeSink::new(RecorderSink::new(), NoopSink);
        feed(&mut tee);
        assert_eq!(
            tee.first.as_bytes(),
            alone.as_bytes(),
            "tee changes what is recorded"
        );
    }
}
