// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the redraw loop.
//!
//! The scheduler never prints. It reports each step of the loop to an
//! optional [`TraceSink`], whose methods all default to no-ops, so a sink
//! only overrides the events it cares about.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace`
//! feature is **off**, every `Tracer` method compiles to nothing. When **on**,
//! each method performs a single `Option` branch before dispatching.
//!
//! Sinks for development (pretty printing, binary recording, Chrome trace
//! export, forwarding to `tracing`) live in the `redraw_debug` crate.

use alloc::rc::Rc;
use core::cell::RefCell;

use crate::error::{HookError, RenderError, ResolveError};
use crate::host::{FrameRequest, Visibility};
use crate::report::TickReport;
use crate::surface::SurfaceId;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why a frame was requested from the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArmReason {
    /// A redraw request found the loop dormant.
    Request,
    /// The loop re-armed itself at the end of a tick.
    Rearm,
    /// Output became visible again.
    Resume,
}

/// Why the loop went dormant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The idle window elapsed without activity.
    Idle,
    /// Output became hidden.
    Hidden,
}

/// What happened to one drained surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The render routine succeeded.
    Rendered,
    /// The render routine returned an error.
    Failed(RenderError),
    /// The surface's context could not be resolved; nothing was rendered.
    Unresolved(ResolveError),
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted for every accepted redraw request.
#[derive(Clone, Copy, Debug)]
pub struct RedrawRequestedEvent {
    /// The surface that asked to be redrawn.
    pub surface: SurfaceId,
    /// Whether the request asked for an uncached render.
    pub force_invalidate: bool,
    /// Whether a frame is armed after the request.
    pub armed: bool,
    /// Host time of the request.
    pub at: HostTime,
}

/// Emitted whenever a frame is requested from the host.
#[derive(Clone, Copy, Debug)]
pub struct FrameArmedEvent {
    /// The host's handle for the request.
    pub request: FrameRequest,
    /// Host time of arming.
    pub at: HostTime,
    /// What armed it.
    pub reason: ArmReason,
}

/// Emitted at the start of a tick, before any surface is rendered.
#[derive(Clone, Copy, Debug)]
pub struct TickBeginEvent {
    /// Index of the tick.
    pub frame_index: u64,
    /// Tick timestamp.
    pub now: HostTime,
    /// Number of surfaces owed a render pass.
    pub dirty: u32,
}

/// Emitted once per drained surface.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceRenderedEvent {
    /// Index of the tick.
    pub frame_index: u64,
    /// The drained surface.
    pub surface: SurfaceId,
    /// The invalidation flag passed to the render routine.
    pub force_invalidate: bool,
    /// What happened.
    pub outcome: RenderOutcome,
}

/// Emitted when a post-render hook returns an error.
#[derive(Clone, Copy, Debug)]
pub struct HookFailedEvent {
    /// Index of the tick.
    pub frame_index: u64,
    /// The surface whose hook failed.
    pub surface: SurfaceId,
    /// The failure.
    pub error: HookError,
}

/// Emitted at the end of a tick.
#[derive(Clone, Copy, Debug)]
pub struct TickEndEvent {
    /// The tick's outcome.
    pub report: TickReport,
}

/// Emitted when the loop goes dormant.
#[derive(Clone, Copy, Debug)]
pub struct LoopStoppedEvent {
    /// Index of the most recent tick (zero if none has run).
    pub frame_index: u64,
    /// Host time of the stop.
    pub at: HostTime,
    /// Why the loop stopped.
    pub reason: StopReason,
}

/// Emitted on every visibility transition.
#[derive(Clone, Copy, Debug)]
pub struct VisibilityChangedEvent {
    /// The new state.
    pub visibility: Visibility,
    /// Host time of the transition.
    pub at: HostTime,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the redraw loop.
///
/// Every method defaults to doing nothing; implement the ones you want.
pub trait TraceSink {
    /// Called for every accepted redraw request.
    fn on_redraw_requested(&mut self, e: &RedrawRequestedEvent) {
        _ = e;
    }

    /// Called whenever a frame is requested from the host.
    fn on_frame_armed(&mut self, e: &FrameArmedEvent) {
        _ = e;
    }

    /// Called at the start of a tick.
    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        _ = e;
    }

    /// Called once per drained surface.
    fn on_surface_rendered(&mut self, e: &SurfaceRenderedEvent) {
        _ = e;
    }

    /// Called when a post-render hook fails.
    fn on_hook_failed(&mut self, e: &HookFailedEvent) {
        _ = e;
    }

    /// Called at the end of a tick.
    fn on_tick_end(&mut self, e: &TickEndEvent) {
        _ = e;
    }

    /// Called when the loop goes dormant.
    fn on_loop_stopped(&mut self, e: &LoopStoppedEvent) {
        _ = e;
    }

    /// Called on every visibility transition.
    fn on_visibility_changed(&mut self, e: &VisibilityChangedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// Ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Shared sinks
// ---------------------------------------------------------------------------

/// Lets a caller keep a handle to a sink it hands to the scheduler.
///
/// Events arriving while the caller holds a borrow are dropped.
impl<S: TraceSink + ?Sized> TraceSink for Rc<RefCell<S>> {
    fn on_redraw_requested(&mut self, e: &RedrawRequestedEvent) {
        if let Ok(mut s) = self.try_borrow_mut() {
            s.on_redraw_requested(e);
        }
    }

    fn on_frame_armed(&mut self, e: &FrameArmedEvent) {
        if let Ok(mut s) = self.try_borrow_mut() {
            s.on_frame_armed(e);
        }
    }

    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        if let Ok(mut s) = self.try_borrow_mut() {
            s.on_tick_begin(e);
        }
    }

    fn on_surface_rendered(&mut self, e: &SurfaceRenderedEvent) {
        if let Ok(mut s) = self.try_borrow_mut() {
            s.on_surface_rendered(e);
        }
    }

    fn on_hook_failed(&mut self, e: &HookFailedEvent) {
        if let Ok(mut s) = self.try_borrow_mut() {
            s.on_hook_failed(e);
        }
    }

    fn on_tick_end(&mut self, e: &TickEndEvent) {
        if let Ok(mut s) = self.try_borrow_mut() {
            s.on_tick_end(e);
        }
    }

    fn on_loop_stopped(&mut self, e: &LoopStoppedEvent) {
        if let Ok(mut s) = self.try_borrow_mut() {
            s.on_loop_stopped(e);
        }
    }

    fn on_visibility_changed(&mut self, e: &VisibilityChangedEvent) {
        if let Ok(mut s) = self.try_borrow_mut() {
            s.on_visibility_changed(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Dispatch front for an optional [`TraceSink`].
///
/// Without the `trace` feature the methods are empty and the sink is never
/// stored. With it, each call costs one `Option` check before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

/// Generates one dispatching `Tracer` method per event.
macro_rules! tracer_methods {
    ($($(#[$doc:meta])* $name:ident => $hook:ident($event:ty);)*) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $name(&mut self, e: &$event) {
                #[cfg(feature = "trace")]
                if let Some(s) = &mut self.sink {
                    s.$hook(e);
                }
                #[cfg(not(feature = "trace"))]
                {
                    _ = e;
                }
            }
        )*
    };
}

impl<'a> Tracer<'a> {
    /// Forwards to `sink`.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Forwards nowhere.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    tracer_methods! {
        /// Emits a [`RedrawRequestedEvent`].
        redraw_requested => on_redraw_requested(RedrawRequestedEvent);
        /// Emits a [`FrameArmedEvent`].
        frame_armed => on_frame_armed(FrameArmedEvent);
        /// Emits a [`TickBeginEvent`].
        tick_begin => on_tick_begin(TickBeginEvent);
        /// Emits a [`SurfaceRenderedEvent`].
        surface_rendered => on_surface_rendered(SurfaceRenderedEvent);
        /// Emits a [`HookFailedEvent`].
        hook_failed => on_hook_failed(HookFailedEvent);
        /// Emits a [`TickEndEvent`].
        tick_end => on_tick_end(TickEndEvent);
        /// Emits a [`LoopStoppedEvent`].
        loop_stopped => on_loop_stopped(LoopStoppedEvent);
        /// Emits a [`VisibilityChangedEvent`].
        visibility_changed => on_visibility_changed(VisibilityChangedEvent);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
