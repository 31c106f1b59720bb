// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to microseconds using a [`Timebase`].

use std::io::Write;

use redraw_core::time::{HostTime, Timebase};
use redraw_core::trace::{
    FrameArmedEvent, HookFailedEvent, LoopStoppedEvent, RedrawRequestedEvent, RenderOutcome,
    SurfaceRenderedEvent, TickBeginEvent, TickEndEvent, TraceSink, VisibilityChangedEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn us(&self, t: HostTime) -> f64 {
        self.timebase.ticks_to_nanos(t.ticks()) as f64 / 1000.0
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_redraw_requested(&mut self, e: &RedrawRequestedEvent) {
        let _ = writeln!(
            self.writer,
            "[request] {:?} force={} armed={} at {:.1}µs",
            e.surface,
            e.force_invalidate,
            e.armed,
            self.us(e.at),
        );
    }

    fn on_frame_armed(&mut self, e: &FrameArmedEvent) {
        let _ = writeln!(
            self.writer,
            "[arm] request={} reason={:?} at {:.1}µs",
            e.request.0,
            e.reason,
            self.us(e.at),
        );
    }

    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[tick] frame={} dirty={} now={:.1}µs",
            e.frame_index,
            e.dirty,
            self.us(e.now),
        );
    }

    fn on_surface_rendered(&mut self, e: &SurfaceRenderedEvent) {
        let outcome = match e.outcome {
            RenderOutcome::Rendered => "ok".to_owned(),
            RenderOutcome::Failed(error) => format!("FAILED ({error})"),
            RenderOutcome::Unresolved(error) => format!("skipped ({error})"),
        };
        let _ = writeln!(
            self.writer,
            "[render] frame={} {:?} force={} {outcome}",
            e.frame_index, e.surface, e.force_invalidate,
        );
    }

    fn on_hook_failed(&mut self, e: &HookFailedEvent) {
        let _ = writeln!(
            self.writer,
            "[hook] frame={} {:?} FAILED ({})",
            e.frame_index, e.surface, e.error,
        );
    }

    fn on_tick_end(&mut self, e: &TickEndEvent) {
        let r = &e.report;
        let _ = writeln!(
            self.writer,
            "[tick:end] frame={} rendered={}/{} skipped={} render_failures={} \
             hooks={} hook_failures={} rearmed={}",
            r.frame_index,
            r.rendered,
            r.drained,
            r.unresolved,
            r.render_failures,
            r.hooks_invoked,
            r.hook_failures,
            r.rearmed,
        );
    }

    fn on_loop_stopped(&mut self, e: &LoopStoppedEvent) {
        let _ = writeln!(
            self.writer,
            "[stop] after frame={} reason={:?} at {:.1}µs",
            e.frame_index,
            e.reason,
            self.us(e.at),
        );
    }

    fn on_visibility_changed(&mut self, e: &VisibilityChangedEvent) {
        let _ = writeln!(
            self.writer,
            "[visibility] {:?} at {:.1}µs",
            e.visibility,
            self.us(e.at),
        );
    }
}
