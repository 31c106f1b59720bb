// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binary event log for post-mortem inspection.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, one tag byte followed by the event's
//! fields. [`decode`] reads them back as an iterator of [`RecordedEvent`].
//!
//! Collaborator errors are stored as their `Display` text.

use redraw_core::host::{FrameRequest, Visibility};
use redraw_core::report::TickReport;
use redraw_core::surface::SurfaceId;
use redraw_core::time::HostTime;
use redraw_core::trace::{
    ArmReason, FrameArmedEvent, HookFailedEvent, LoopStoppedEvent, RedrawRequestedEvent,
    RenderOutcome, StopReason, SurfaceRenderedEvent, TickBeginEvent, TickEndEvent, TraceSink,
    VisibilityChangedEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_REDRAW_REQUESTED: u8 = 1;
const TAG_FRAME_ARMED: u8 = 2;
const TAG_TICK_BEGIN: u8 = 3;
const TAG_SURFACE_RENDERED: u8 = 4;
const TAG_HOOK_FAILED: u8 = 5;
const TAG_TICK_END: u8 = 6;
const TAG_LOOP_STOPPED: u8 = 7;
const TAG_VISIBILITY_CHANGED: u8 = 8;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// Appends every event to an in-memory byte log.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The log so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Gives up the log.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_surface(&mut self, s: SurfaceId) {
        self.write_u32(s.index());
        self.write_u32(s.generation());
    }

    fn write_str(&mut self, s: &str) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "error messages are capped at u32::MAX bytes for recording"
        )]
        let len = s.len().min(u32::MAX as usize) as u32;
        self.write_u32(len);
        self.buf.extend_from_slice(&s.as_bytes()[..len as usize]);
    }
}

impl TraceSink for RecorderSink {
    fn on_redraw_requested(&mut self, e: &RedrawRequestedEvent) {
        self.write_u8(TAG_REDRAW_REQUESTED);
        self.write_surface(e.surface);
        self.write_bool(e.force_invalidate);
        self.write_bool(e.armed);
        self.write_u64(e.at.ticks());
    }

    fn on_frame_armed(&mut self, e: &FrameArmedEvent) {
        self.write_u8(TAG_FRAME_ARMED);
        self.write_u64(e.request.0);
        self.write_u64(e.at.ticks());
        self.write_u8(match e.reason {
            ArmReason::Request => 0,
            ArmReason::Rearm => 1,
            ArmReason::Resume => 2,
        });
    }

    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        self.write_u8(TAG_TICK_BEGIN);
        self.write_u64(e.frame_index);
        self.write_u64(e.now.ticks());
        self.write_u32(e.dirty);
    }

    fn on_surface_rendered(&mut self, e: &SurfaceRenderedEvent) {
        self.write_u8(TAG_SURFACE_RENDERED);
        self.write_u64(e.frame_index);
        self.write_surface(e.surface);
        self.write_bool(e.force_invalidate);
        match e.outcome {
            RenderOutcome::Rendered => self.write_u8(0),
            RenderOutcome::Failed(error) => {
                self.write_u8(1);
                self.write_str(&error.to_string());
            }
            RenderOutcome::Unresolved(error) => {
                self.write_u8(2);
                self.write_str(&error.to_string());
            }
        }
    }

    fn on_hook_failed(&mut self, e: &HookFailedEvent) {
        self.write_u8(TAG_HOOK_FAILED);
        self.write_u64(e.frame_index);
        self.write_surface(e.surface);
        self.write_str(&e.error.to_string());
    }

    fn on_tick_end(&mut self, e: &TickEndEvent) {
        let r = &e.report;
        self.write_u8(TAG_TICK_END);
        self.write_u64(r.frame_index);
        self.write_u64(r.now.ticks());
        self.write_u32(r.drained);
        self.write_u32(r.rendered);
        self.write_u32(r.unresolved);
        self.write_u32(r.render_failures);
        self.write_u32(r.hooks_invoked);
        self.write_u32(r.hook_failures);
        self.write_bool(r.rearmed);
    }

    fn on_loop_stopped(&mut self, e: &LoopStoppedEvent) {
        self.write_u8(TAG_LOOP_STOPPED);
        self.write_u64(e.frame_index);
        self.write_u64(e.at.ticks());
        self.write_u8(match e.reason {
            StopReason::Idle => 0,
            StopReason::Hidden => 1,
        });
    }

    fn on_visibility_changed(&mut self, e: &VisibilityChangedEvent) {
        self.write_u8(TAG_VISIBILITY_CHANGED);
        self.write_u8(match e.visibility {
            Visibility::Visible => 0,
            Visibility::Hidden => 1,
        });
        self.write_u64(e.at.ticks());
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Decoded outcome of one surface's render pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedOutcome {
    /// Rendered successfully.
    Rendered,
    /// The render routine failed; the error's text.
    Failed(String),
    /// The surface did not resolve; the error's text.
    Unresolved(String),
}

/// One record read back from a log.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`RedrawRequestedEvent`].
    RedrawRequested(RedrawRequestedEvent),
    /// A [`FrameArmedEvent`].
    FrameArmed(FrameArmedEvent),
    /// A [`TickBeginEvent`].
    TickBegin(TickBeginEvent),
    /// A [`SurfaceRenderedEvent`], with its outcome in text form.
    SurfaceRendered {
        /// Index of the tick.
        frame_index: u64,
        /// The drained surface.
        surface: SurfaceId,
        /// The invalidation flag passed to the render routine.
        force_invalidate: bool,
        /// What happened.
        outcome: RecordedOutcome,
    },
    /// A [`HookFailedEvent`], with its error in text form.
    HookFailed {
        /// Index of the tick.
        frame_index: u64,
        /// The surface whose hook failed.
        surface: SurfaceId,
        /// The error's text.
        error: String,
    },
    /// A [`TickEndEvent`].
    TickEnd(TickEndEvent),
    /// A [`LoopStoppedEvent`].
    LoopStopped(LoopStoppedEvent),
    /// A [`VisibilityChangedEvent`].
    VisibilityChanged(VisibilityChangedEvent),
}

/// Reads a [`RecorderSink`] log back as [`RecordedEvent`]s.
///
/// Iteration stops at the first truncated record or unknown tag.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Yields the records of a log in order.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DecodeIter<'a> {
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|v| v != 0)
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_surface(&mut self) -> Option<SurfaceId> {
        let index = self.read_u32()?;
        let generation = self.read_u32()?;
        Some(SurfaceId::new(index, generation))
    }

    fn read_string(&mut self) -> Option<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        Some(String::from_utf8_lossy(bytes).into_owned())
    }

    fn decode_redraw_requested(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RedrawRequested(RedrawRequestedEvent {
            surface: self.read_surface()?,
            force_invalidate: self.read_bool()?,
            armed: self.read_bool()?,
            at: self.read_time()?,
        }))
    }

    fn decode_frame_armed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameArmed(FrameArmedEvent {
            request: FrameRequest(self.read_u64()?),
            at: self.read_time()?,
            reason: match self.read_u8()? {
                0 => ArmReason::Request,
                1 => ArmReason::Rearm,
                _ => ArmReason::Resume,
            },
        }))
    }

    fn decode_tick_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TickBegin(TickBeginEvent {
            frame_index: self.read_u64()?,
            now: self.read_time()?,
            dirty: self.read_u32()?,
        }))
    }

    fn decode_surface_rendered(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let surface = self.read_surface()?;
        let force_invalidate = self.read_bool()?;
        let outcome = match self.read_u8()? {
            0 => RecordedOutcome::Rendered,
            1 => RecordedOutcome::Failed(self.read_string()?),
            _ => RecordedOutcome::Unresolved(self.read_string()?),
        };
        Some(RecordedEvent::SurfaceRendered {
            frame_index,
            surface,
            force_invalidate,
            outcome,
        })
    }

    fn decode_hook_failed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::HookFailed {
            frame_index: self.read_u64()?,
            surface: self.read_surface()?,
            error: self.read_string()?,
        })
    }

    fn decode_tick_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TickEnd(TickEndEvent {
            report: TickReport {
                frame_index: self.read_u64()?,
                now: self.read_time()?,
                drained: self.read_u32()?,
                rendered: self.read_u32()?,
                unresolved: self.read_u32()?,
                render_failures: self.read_u32()?,
                hooks_invoked: self.read_u32()?,
                hook_failures: self.read_u32()?,
                rearmed: self.read_bool()?,
            },
        }))
    }

    fn decode_loop_stopped(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LoopStopped(LoopStoppedEvent {
            frame_index: self.read_u64()?,
            at: self.read_time()?,
            reason: match self.read_u8()? {
                0 => StopReason::Idle,
                _ => StopReason::Hidden,
            },
        }))
    }

    fn decode_visibility_changed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::VisibilityChanged(VisibilityChangedEvent {
            visibility: match self.read_u8()? {
                0 => Visibility::Visible,
                _ => Visibility::Hidden,
            },
            at: self.read_time()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_REDRAW_REQUESTED => self.decode_redraw_requested(),
            TAG_FRAME_ARMED => self.decode_frame_armed(),
            TAG_TICK_BEGIN => self.decode_tick_begin(),
            TAG_SURFACE_RENDERED => self.decode_surface_rendered(),
            TAG_HOOK_FAILED => self.decode_hook_failed(),
            TAG_TICK_END => self.decode_tick_end(),
            TAG_LOOP_STOPPED => self.decode_loop_stopped(),
            TAG_VISIBILITY_CHANGED => self.decode_visibility_changed(),
            _ => None,
        }
    }
}
