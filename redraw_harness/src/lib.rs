// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic host doubles for driving a redraw scheduler.
//!
//! Every double is a cheap `Rc` handle: hand one clone to the scheduler and
//! keep another to steer time, fire frames, flip visibility and inspect what
//! was rendered.
//!
//! ```rust,ignore
//! let h = Harness::new(RedrawConfig::web());
//! h.scheduler.request_redraw(SurfaceId::new(0, 0), false);
//! let report = h.tick().unwrap();
//! assert_eq!(h.host.renders().len(), 1);
//! ```

#![no_std]

extern crate alloc;

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use redraw_core::config::RedrawConfig;
use redraw_core::error::{RenderError, ResolveError};
use redraw_core::host::{
    Clock, FrameRequest, FrameSource, PreRenderEvent, RenderRequest, SurfaceHost, Visibility,
    VisibilitySource,
};
use redraw_core::report::TickReport;
use redraw_core::scheduler::RedrawScheduler;
use redraw_core::surface::SurfaceId;
use redraw_core::time::{Duration, HostTime};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// A clock that only moves when told to.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<HostTime>>,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub fn new(start: HostTime) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Jumps to `now`.
    pub fn set(&self, now: HostTime) {
        self.now.set(now);
    }

    /// Moves forward by `by` and returns the new time.
    pub fn advance(&self, by: Duration) -> HostTime {
        let now = self.now.get() + by;
        self.now.set(now);
        now
    }
}

impl Clock for ManualClock {
    fn now(&self) -> HostTime {
        self.now.get()
    }
}

// ---------------------------------------------------------------------------
// Frame source
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct FrameState {
    next_id: Cell<u64>,
    pending: Cell<Option<FrameRequest>>,
    requested: Cell<u32>,
    cancelled: Cell<u32>,
    overlapping: Cell<u32>,
}

/// A frame source whose frames fire only when the test says so.
///
/// It never fires on its own: call [`take_pending`](Self::take_pending) and
/// deliver the tick to the scheduler, or use [`Harness::tick`].
#[derive(Clone, Debug, Default)]
pub struct ManualFrames {
    state: Rc<FrameState>,
}

impl ManualFrames {
    /// Creates a source with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The outstanding request, if any.
    #[must_use]
    pub fn pending(&self) -> Option<FrameRequest> {
        self.state.pending.get()
    }

    /// Consumes the outstanding request, as if the display refreshed.
    pub fn take_pending(&self) -> Option<FrameRequest> {
        self.state.pending.take()
    }

    /// Total calls to `request_frame`.
    #[must_use]
    pub fn request_count(&self) -> u32 {
        self.state.requested.get()
    }

    /// Total calls to `cancel_frame`.
    #[must_use]
    pub fn cancel_count(&self) -> u32 {
        self.state.cancelled.get()
    }

    /// Requests made while another was still outstanding.
    ///
    /// Always zero for a correct scheduler.
    #[must_use]
    pub fn overlapping_requests(&self) -> u32 {
        self.state.overlapping.get()
    }
}

impl FrameSource for ManualFrames {
    fn request_frame(&self) -> FrameRequest {
        let s = &self.state;
        if s.pending.get().is_some() {
            s.overlapping.set(s.overlapping.get() + 1);
        }
        let request = FrameRequest(s.next_id.get());
        s.next_id.set(request.0 + 1);
        s.pending.set(Some(request));
        s.requested.set(s.requested.get() + 1);
        request
    }

    fn cancel_frame(&self, request: FrameRequest) {
        let s = &self.state;
        s.cancelled.set(s.cancelled.get() + 1);
        if s.pending.get() == Some(request) {
            s.pending.set(None);
        }
    }
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

type Handler = Box<dyn FnMut(Visibility)>;

#[derive(Default)]
struct VisibilityState {
    current: Cell<Visibility>,
    handlers: RefCell<Vec<Handler>>,
}

/// A visibility source flipped by hand.
#[derive(Clone, Default)]
pub struct ManualVisibility {
    state: Rc<VisibilityState>,
}

impl ManualVisibility {
    /// Creates a source in the given state.
    #[must_use]
    pub fn new(initial: Visibility) -> Self {
        let source = Self::default();
        source.state.current.set(initial);
        source
    }

    /// Changes the state and notifies every subscriber.
    ///
    /// Subscribers are notified even if the state did not change; filtering
    /// repeats is the subscriber's job.
    pub fn set(&self, visibility: Visibility) {
        self.state.current.set(visibility);
        let mut handlers = core::mem::take(&mut *self.state.handlers.borrow_mut());
        for handler in &mut handlers {
            handler(visibility);
        }
        let mut slot = self.state.handlers.borrow_mut();
        handlers.append(&mut slot);
        *slot = handlers;
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.handlers.borrow().len()
    }
}

impl VisibilitySource for ManualVisibility {
    fn visibility(&self) -> Visibility {
        self.state.current.get()
    }

    fn subscribe(&self, handler: Box<dyn FnMut(Visibility)>) {
        self.state.handlers.borrow_mut().push(handler);
    }
}

impl fmt::Debug for ManualVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualVisibility")
            .field("current", &self.state.current.get())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Surface host
// ---------------------------------------------------------------------------

/// One call to [`SurfaceHost::render`] as seen by [`RecordingHost`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderRecord {
    /// Index of the tick, from the preceding pre-render notification.
    pub frame_index: u64,
    /// Tick timestamp, from the preceding pre-render notification.
    pub at: HostTime,
    /// The rendered surface.
    pub surface: SurfaceId,
    /// What the scheduler asked for.
    pub request: RenderRequest,
}

#[derive(Debug, Default)]
struct HostState {
    released: RefCell<Vec<SurfaceId>>,
    failing: RefCell<Vec<(SurfaceId, RenderError)>>,
    notified: RefCell<Vec<(SurfaceId, u64, HostTime)>>,
    renders: RefCell<Vec<RenderRecord>>,
}

/// A surface host that records every render and can be told to fail.
///
/// The render context is the surface handle itself. Every surface resolves
/// until [`release`](Self::release)d.
#[derive(Clone, Debug, Default)]
pub struct RecordingHost {
    state: Rc<HostState>,
}

impl RecordingHost {
    /// Creates a host where every surface is live.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tears `surface` down; it no longer resolves.
    pub fn release(&self, surface: SurfaceId) {
        self.state.released.borrow_mut().push(surface);
    }

    /// Makes every render of `surface` fail with `error`.
    pub fn fail_renders_for(&self, surface: SurfaceId, error: RenderError) {
        self.state.failing.borrow_mut().push((surface, error));
    }

    /// Every render so far, in call order.
    #[must_use]
    pub fn renders(&self) -> Vec<RenderRecord> {
        self.state.renders.borrow().clone()
    }

    /// Returns and forgets every render so far.
    pub fn take_renders(&self) -> Vec<RenderRecord> {
        core::mem::take(&mut *self.state.renders.borrow_mut())
    }

    /// Number of renders of `surface` so far.
    #[must_use]
    pub fn render_count(&self, surface: SurfaceId) -> usize {
        self.state
            .renders
            .borrow()
            .iter()
            .filter(|r| r.surface == surface)
            .count()
    }

    /// Number of pre-render notifications so far.
    #[must_use]
    pub fn notification_count(&self) -> usize {
        self.state.notified.borrow().len()
    }
}

impl SurfaceHost for RecordingHost {
    type Context = SurfaceId;

    fn resolve(&self, surface: SurfaceId) -> Result<SurfaceId, ResolveError> {
        if self.state.released.borrow().contains(&surface) {
            Err(ResolveError::Released)
        } else {
            Ok(surface)
        }
    }

    fn will_render(&self, event: &PreRenderEvent<'_, SurfaceId>) {
        self.state
            .notified
            .borrow_mut()
            .push((*event.context, event.frame_index, event.timestamp));
    }

    fn render(&self, context: &SurfaceId, request: RenderRequest) -> Result<(), RenderError> {
        let (frame_index, at) = self
            .state
            .notified
            .borrow()
            .last()
            .map_or((0, HostTime(0)), |&(_, index, at)| (index, at));
        self.state.renders.borrow_mut().push(RenderRecord {
            frame_index,
            at,
            surface: *context,
            request,
        });
        let failing = self.state.failing.borrow();
        match failing.iter().find(|(s, _)| s == context) {
            Some(&(_, error)) => Err(error),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A scheduler wired to the doubles in this crate.
pub type HarnessScheduler = RedrawScheduler<RecordingHost, ManualFrames, ManualClock>;

/// A scheduler plus handles to all of its collaborators.
#[derive(Clone, Debug)]
pub struct Harness {
    /// The scheduler under test.
    pub scheduler: HarnessScheduler,
    /// Its surface host.
    pub host: RecordingHost,
    /// Its frame source.
    pub frames: ManualFrames,
    /// Its clock.
    pub clock: ManualClock,
    /// Its visibility source.
    pub visibility: ManualVisibility,
}

impl Harness {
    /// A visible harness starting at time zero.
    #[must_use]
    pub fn new(config: RedrawConfig) -> Self {
        Self::with_visibility(config, Visibility::Visible)
    }

    /// A harness starting at time zero in the given visibility state.
    #[must_use]
    pub fn with_visibility(config: RedrawConfig, initial: Visibility) -> Self {
        let host = RecordingHost::new();
        let frames = ManualFrames::new();
        let clock = ManualClock::new(HostTime(0));
        let visibility = ManualVisibility::new(initial);
        let scheduler = RedrawScheduler::new(
            config,
            host.clone(),
            frames.clone(),
            clock.clone(),
            &visibility,
        );
        Self {
            scheduler,
            host,
            frames,
            clock,
            visibility,
        }
    }

    /// Fires the pending frame, if any, at the clock's current time.
    pub fn tick(&self) -> Option<TickReport> {
        fire_pending(&self.scheduler, &self.frames, self.clock.now())
    }

    /// Advances the clock by `by`, then fires the pending frame, if any.
    pub fn advance_and_tick(&self, by: Duration) -> Option<TickReport> {
        self.clock.advance(by);
        self.tick()
    }

    /// Fires frames every `interval` until the loop goes dormant or `limit`
    /// ticks have run. Returns the reports in order.
    pub fn run_until_idle(&self, interval: Duration, limit: usize) -> Vec<TickReport> {
        let mut reports = Vec::new();
        while reports.len() < limit {
            let Some(report) = self.advance_and_tick(interval) else {
                break;
            };
            reports.push(report);
        }
        reports
    }
}

/// Delivers the pending frame of `frames` to `scheduler`.
///
/// Returns `None` if no frame was outstanding.
pub fn fire_pending<H, K>(
    scheduler: &RedrawScheduler<H, ManualFrames, K>,
    frames: &ManualFrames,
    now: HostTime,
) -> Option<TickReport>
where
    H: SurfaceHost + 'static,
    K: Clock + 'static,
{
    frames.take_pending()?;
    Some(scheduler.on_refresh_tick(now))
}
