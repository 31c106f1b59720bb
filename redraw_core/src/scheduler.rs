// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The refresh loop driver.
//!
//! [`RedrawScheduler`] turns any number of redraw requests into at most one
//! render pass per surface per display refresh. It keeps exactly one frame
//! request outstanding with the host while there is work (or recent
//! activity), and none otherwise.
//!
//! ```text
//!   request_redraw ──► DirtyTable::mark_dirty ──► arm (if dormant)
//!                                                   │
//!                       FrameSource::request_frame ◄┘
//!                                │
//!                                ▼
//!   on_refresh_tick ──► drain ──► resolve ──► will_render ──► render ──► hooks
//!          │
//!          └──► idle window open? ── yes ──► re-arm
//!                                  └─ no ──► dormant
//! ```
//!
//! The scheduler is a cheaply cloneable handle. Render routines and
//! post-render hooks may hold a clone and call back into it: the active frame
//! marker is cleared before a tick drains, so a request made during a tick
//! arms the next frame instead of re-entering the drain in progress.
//!
//! While output is hidden, requests still mark surfaces dirty but nothing is
//! armed; becoming visible arms one frame that drains everything queued.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::{IntoIter, Vec};
use core::cell::{Cell, RefCell};
use core::fmt;

use kurbo::Rect;

use crate::config::RedrawConfig;
use crate::damage::Damage;
use crate::hook::PostRenderHook;
use crate::host::{
    Clock, FrameRequest, FrameSource, PreRenderEvent, RenderRequest, SurfaceHost, Visibility,
    VisibilitySource,
};
use crate::idle::IdlePolicy;
use crate::report::{RedrawStats, TickReport};
use crate::surface::SurfaceId;
use crate::table::{DirtyTable, DrainedSurface};
use crate::time::HostTime;
use crate::trace::{
    ArmReason, FrameArmedEvent, HookFailedEvent, LoopStoppedEvent, RedrawRequestedEvent,
    RenderOutcome, StopReason, SurfaceRenderedEvent, TickBeginEvent, TickEndEvent, TraceSink,
    Tracer, VisibilityChangedEvent,
};

/// Coalesces redraw requests into one render pass per surface per tick.
///
/// See the [module docs](self) for the control flow.
pub struct RedrawScheduler<H: SurfaceHost, F, K> {
    inner: Rc<Inner<H, F, K>>,
}

/// A non-owning handle to a [`RedrawScheduler`].
///
/// Host callbacks that outlive the scheduler (frame closures, visibility
/// listeners) hold one of these to avoid reference cycles.
pub struct WeakRedrawScheduler<H: SurfaceHost, F, K> {
    inner: Weak<Inner<H, F, K>>,
}

struct Inner<H: SurfaceHost, F, K> {
    config: RedrawConfig,
    table: RefCell<DirtyTable<H::Context>>,
    host: H,
    frames: F,
    clock: K,
    /// The outstanding frame request, if any. At most one exists at a time.
    active: Cell<Option<FrameRequest>>,
    idle: Cell<IdlePolicy>,
    visibility: Cell<Visibility>,
    /// Index the next tick will carry.
    next_frame: Cell<u64>,
    stats: Cell<RedrawStats>,
    sink: RefCell<Option<Box<dyn TraceSink>>>,
}

impl<H, F, K> RedrawScheduler<H, F, K>
where
    H: SurfaceHost + 'static,
    F: FrameSource + 'static,
    K: Clock + 'static,
{
    /// Creates a dormant scheduler.
    ///
    /// Reads the current visibility from `visibility` and subscribes to its
    /// changes. This is the only subscription the scheduler makes; the
    /// listener holds a weak handle and does nothing once the scheduler is
    /// dropped.
    pub fn new<V>(config: RedrawConfig, host: H, frames: F, clock: K, visibility: &V) -> Self
    where
        V: VisibilitySource + ?Sized,
    {
        let scheduler = Self {
            inner: Rc::new(Inner {
                config,
                table: RefCell::new(DirtyTable::new()),
                host,
                frames,
                clock,
                active: Cell::new(None),
                idle: Cell::new(IdlePolicy::new(config.idle_window)),
                visibility: Cell::new(visibility.visibility()),
                next_frame: Cell::new(0),
                stats: Cell::new(RedrawStats::default()),
                sink: RefCell::new(None),
            }),
        };
        let weak = scheduler.downgrade();
        visibility.subscribe(Box::new(move |state| {
            if let Some(scheduler) = weak.upgrade() {
                scheduler.set_visibility(state);
            }
        }));
        scheduler
    }

    /// Asks for `surface` to be rendered on the next tick.
    ///
    /// Any number of requests before a tick result in one render pass;
    /// `force_invalidate` is passed to the render routine if any of them set
    /// it. Requests for surfaces that do not resolve, or that carry a stale
    /// handle, are ignored.
    pub fn request_redraw(&self, surface: SurfaceId, force_invalidate: bool) {
        self.request(surface, force_invalidate, Damage::Full);
    }

    /// Like [`request_redraw`](Self::request_redraw), damaging only `rect`.
    ///
    /// Regions accumulate by union until the next tick. An empty `rect` is
    /// ignored.
    pub fn request_redraw_region(&self, surface: SurfaceId, rect: Rect) {
        if rect.is_zero_area() {
            return;
        }
        self.request(surface, false, Damage::Region(rect));
    }

    fn request(&self, surface: SurfaceId, force_invalidate: bool, damage: Damage) {
        let inner = &*self.inner;
        if !inner.host.is_live(surface) {
            return;
        }
        if !inner
            .table
            .borrow_mut()
            .mark_dirty(surface, force_invalidate, damage)
        {
            return;
        }
        let now = inner.clock.now();
        self.extend_idle(now);
        if inner.visibility.get() == Visibility::Visible {
            self.arm(now, ArmReason::Request);
        }
        let armed = self.is_armed();
        self.trace(|t| {
            t.redraw_requested(&RedrawRequestedEvent {
                surface,
                force_invalidate,
                armed,
                at: now,
            });
        });
    }

    /// Adds `hook` to the hooks run after each successful render of
    /// `surface`.
    ///
    /// Returns `false` if the hook was already registered or the handle is
    /// stale. Registration alone does not schedule a render.
    pub fn register_hook(&self, surface: SurfaceId, hook: PostRenderHook<H::Context>) -> bool {
        self.inner.table.borrow_mut().register_hook(surface, hook)
    }

    /// Removes `hook` from `surface`.
    ///
    /// Takes effect immediately, including for the remainder of a tick in
    /// progress. Returns `false` if nothing was removed.
    pub fn unregister_hook(&self, surface: SurfaceId, hook: &PostRenderHook<H::Context>) -> bool {
        self.inner.table.borrow_mut().unregister_hook(surface, hook)
    }

    /// Number of hooks registered for `surface`.
    #[must_use]
    pub fn hook_count(&self, surface: SurfaceId) -> usize {
        self.inner.table.borrow().hook_count(surface)
    }

    /// Runs one tick. The host calls this when a requested frame fires.
    ///
    /// Renders every dirty surface once, runs its hooks, then re-arms if the
    /// idle window is still open. Collaborator failures are counted in the
    /// returned report and never abort the tick.
    ///
    /// A panic inside a collaborator unwinds out of this call. The surface
    /// being rendered and every surface not yet reached stay dirty, and the
    /// next request re-arms the loop.
    pub fn on_refresh_tick(&self, now: HostTime) -> TickReport {
        let inner = &*self.inner;
        inner.active.set(None);

        let frame_index = inner.next_frame.get();
        if inner.visibility.get() == Visibility::Hidden {
            return TickReport {
                frame_index,
                now,
                ..TickReport::default()
            };
        }
        inner.next_frame.set(frame_index + 1);

        let drained = inner.table.borrow_mut().drain();
        let mut report = TickReport {
            frame_index,
            now,
            drained: count(drained.len()),
            ..TickReport::default()
        };
        self.trace(|t| {
            t.tick_begin(&TickBeginEvent {
                frame_index,
                now,
                dirty: report.drained,
            });
        });

        let rearm = || {
            if inner.visibility.get() == Visibility::Visible {
                self.arm(now, ArmReason::Rearm);
            }
        };
        let mut guard = DrainGuard::new(&inner.table, drained, &rearm);
        while let Some(owed) = guard.next_owed() {
            let surface = owed.surface;
            let outcome = match inner.host.resolve(surface) {
                Ok(context) => {
                    inner.host.will_render(&PreRenderEvent {
                        surface,
                        context: &context,
                        timestamp: now,
                        frame_index,
                    });
                    let result = inner.host.render(
                        &context,
                        RenderRequest {
                            force_invalidate: owed.force_invalidate,
                            damage: owed.damage,
                        },
                    );
                    guard.settle();
                    match result {
                        Ok(()) => {
                            self.trace_render(frame_index, &owed, RenderOutcome::Rendered);
                            self.run_hooks(surface, &context, frame_index, now, &mut report);
                            RenderOutcome::Rendered
                        }
                        Err(error) => RenderOutcome::Failed(error),
                    }
                }
                Err(error) => {
                    guard.settle();
                    RenderOutcome::Unresolved(error)
                }
            };
            match outcome {
                RenderOutcome::Rendered => report.rendered += 1,
                RenderOutcome::Failed(_) => {
                    report.render_failures += 1;
                    self.trace_render(frame_index, &owed, outcome);
                }
                RenderOutcome::Unresolved(_) => {
                    report.unresolved += 1;
                    self.trace_render(frame_index, &owed, outcome);
                }
            }
        }
        drop(guard);

        let mut stats = inner.stats.get();
        if inner.visibility.get() == Visibility::Visible && inner.idle.get().is_active(now) {
            self.arm(now, ArmReason::Rearm);
        } else if inner.active.get().is_none() && inner.visibility.get() == Visibility::Visible {
            stats.idle_stops += 1;
            self.trace(|t| {
                t.loop_stopped(&LoopStoppedEvent {
                    frame_index,
                    at: now,
                    reason: StopReason::Idle,
                });
            });
        }
        report.rearmed = self.is_armed();
        stats.record(&report);
        inner.stats.set(stats);

        self.trace(|t| t.tick_end(&TickEndEvent { report }));
        report
    }

    fn run_hooks(
        &self,
        surface: SurfaceId,
        context: &H::Context,
        frame_index: u64,
        now: HostTime,
        report: &mut TickReport,
    ) {
        let hooks = self.inner.table.borrow().hooks(surface);
        for hook in hooks {
            // An earlier hook may have unregistered this one.
            if !self.inner.table.borrow().has_hook(surface, &hook) {
                continue;
            }
            report.hooks_invoked += 1;
            self.extend_idle(now);
            if let Err(error) = hook.invoke(context) {
                report.hook_failures += 1;
                self.trace(|t| {
                    t.hook_failed(&HookFailedEvent {
                        frame_index,
                        surface,
                        error,
                    });
                });
            }
        }
    }

    /// Applies a visibility transition.
    ///
    /// Hiding cancels the outstanding frame regardless of dirty state.
    /// Showing restarts the idle window and arms exactly one frame. Repeating
    /// the current state does nothing.
    pub fn set_visibility(&self, visibility: Visibility) {
        let inner = &*self.inner;
        if inner.visibility.replace(visibility) == visibility {
            return;
        }
        let now = inner.clock.now();
        self.trace(|t| t.visibility_changed(&VisibilityChangedEvent { visibility, at: now }));
        match visibility {
            Visibility::Hidden => {
                if let Some(request) = inner.active.take() {
                    inner.frames.cancel_frame(request);
                }
                let mut stats = inner.stats.get();
                stats.hidden_stops += 1;
                inner.stats.set(stats);
                let frame_index = inner.next_frame.get().saturating_sub(1);
                self.trace(|t| {
                    t.loop_stopped(&LoopStoppedEvent {
                        frame_index,
                        at: now,
                        reason: StopReason::Hidden,
                    });
                });
            }
            Visibility::Visible => {
                let mut idle = inner.idle.get();
                idle.reset(now);
                inner.idle.set(idle);
                self.arm(now, ArmReason::Resume);
            }
        }
    }

    /// Installs a trace sink, returning the previous one.
    ///
    /// Events are only dispatched when the `trace` feature is enabled.
    pub fn set_trace_sink(&self, sink: Box<dyn TraceSink>) -> Option<Box<dyn TraceSink>> {
        self.inner.sink.replace(Some(sink))
    }

    /// Removes the trace sink.
    pub fn take_trace_sink(&self) -> Option<Box<dyn TraceSink>> {
        self.inner.sink.take()
    }

    fn arm(&self, now: HostTime, reason: ArmReason) {
        let inner = &*self.inner;
        if inner.active.get().is_some() {
            return;
        }
        let request = inner.frames.request_frame();
        inner.active.set(Some(request));
        self.trace(|t| t.frame_armed(&FrameArmedEvent { request, at: now, reason }));
    }

    fn extend_idle(&self, now: HostTime) {
        let mut idle = self.inner.idle.get();
        idle.extend(now);
        self.inner.idle.set(idle);
    }

    fn trace_render(&self, frame_index: u64, owed: &DrainedSurface, outcome: RenderOutcome) {
        self.trace(|t| {
            t.surface_rendered(&SurfaceRenderedEvent {
                frame_index,
                surface: owed.surface,
                force_invalidate: owed.force_invalidate,
                outcome,
            });
        });
    }

    fn trace(&self, emit: impl FnOnce(&mut Tracer<'_>)) {
        #[cfg(feature = "trace")]
        if let Ok(mut slot) = self.inner.sink.try_borrow_mut()
            && let Some(sink) = slot.as_deref_mut()
        {
            emit(&mut Tracer::new(sink));
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = emit;
        }
    }
}

impl<H: SurfaceHost, F, K> RedrawScheduler<H, F, K> {
    /// Returns a weak handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakRedrawScheduler<H, F, K> {
        WeakRedrawScheduler {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// The configuration the scheduler was created with.
    #[must_use]
    pub fn config(&self) -> RedrawConfig {
        self.inner.config
    }

    /// The surface host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.inner.host
    }

    /// The frame source.
    #[must_use]
    pub fn frames(&self) -> &F {
        &self.inner.frames
    }

    /// The clock.
    #[must_use]
    pub fn clock(&self) -> &K {
        &self.inner.clock
    }

    /// Returns `true` while a frame request is outstanding.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.inner.active.get().is_some()
    }

    /// Returns `true` while output is hidden.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.inner.visibility.get() == Visibility::Hidden
    }

    /// The current visibility.
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.inner.visibility.get()
    }

    /// The time after which an idle loop stops re-arming.
    #[must_use]
    pub fn idle_deadline(&self) -> Option<HostTime> {
        self.inner.idle.get().deadline()
    }

    /// Index the next tick will carry.
    #[must_use]
    pub fn next_frame_index(&self) -> u64 {
        self.inner.next_frame.get()
    }

    /// Totals since creation.
    #[must_use]
    pub fn stats(&self) -> RedrawStats {
        self.inner.stats.get()
    }
}

impl<H: SurfaceHost, F, K> Clone for RedrawScheduler<H, F, K> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: SurfaceHost, F, K> fmt::Debug for RedrawScheduler<H, F, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedrawScheduler")
            .field("active", &self.inner.active.get())
            .field("visibility", &self.inner.visibility.get())
            .field("idle", &self.inner.idle.get())
            .field("next_frame", &self.inner.next_frame.get())
            .finish_non_exhaustive()
    }
}

impl<H: SurfaceHost, F, K> WeakRedrawScheduler<H, F, K> {
    /// Returns the scheduler if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<RedrawScheduler<H, F, K>> {
        self.inner.upgrade().map(|inner| RedrawScheduler { inner })
    }
}

impl<H: SurfaceHost, F, K> Clone for WeakRedrawScheduler<H, F, K> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<H: SurfaceHost, F, K> fmt::Debug for WeakRedrawScheduler<H, F, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakRedrawScheduler").finish_non_exhaustive()
    }
}

/// Puts unprocessed surfaces back into the table if a tick unwinds, then
/// calls `rearm` so restored work is never left without a frame.
///
/// A surface stays "in flight" from the moment it is handed out until its
/// render call returns.
struct DrainGuard<'a, C> {
    table: &'a RefCell<DirtyTable<C>>,
    pending: IntoIter<DrainedSurface>,
    in_flight: Option<DrainedSurface>,
    rearm: &'a dyn Fn(),
}

impl<'a, C> DrainGuard<'a, C> {
    fn new(
        table: &'a RefCell<DirtyTable<C>>,
        drained: Vec<DrainedSurface>,
        rearm: &'a dyn Fn(),
    ) -> Self {
        Self {
            table,
            pending: drained.into_iter(),
            in_flight: None,
            rearm,
        }
    }

    fn next_owed(&mut self) -> Option<DrainedSurface> {
        let owed = self.pending.next()?;
        self.in_flight = Some(owed);
        Some(owed)
    }

    fn settle(&mut self) {
        self.in_flight = None;
    }
}

impl<C> Drop for DrainGuard<'_, C> {
    fn drop(&mut self) {
        let unfinished: Vec<DrainedSurface> = self
            .in_flight
            .take()
            .into_iter()
            .chain(self.pending.by_ref())
            .collect();
        if unfinished.is_empty() {
            return;
        }
        // The table borrow must end before re-arming reaches the host.
        let restored = match self.table.try_borrow_mut() {
            Ok(mut table) => {
                table.restore(unfinished);
                true
            }
            Err(_) => false,
        };
        if restored {
            (self.rearm)();
        }
    }
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
