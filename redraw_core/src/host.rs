// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract.
//!
//! The scheduler owns no pixels, surfaces, timers or event loops. A host
//! provides them through four pieces:
//!
//! - **[`SurfaceHost`]**: Resolves a [`SurfaceId`] to a render context,
//!   receives the pre-render notification, and renders.
//! - **[`FrameSource`]**: The single-shot "call me before the next display
//!   refresh" primitive and its cancellation. The host delivers the callback
//!   by calling [`RedrawScheduler::on_refresh_tick`].
//! - **[`Clock`]**: The monotonic clock used for idle deadlines.
//! - **[`VisibilitySource`]**: Foreground/background state and change
//!   notifications.
//!
//! All methods take `&self`: collaborators are called while the scheduler is
//! mid-tick and may themselves call back into the scheduler, so hosts keep
//! their mutable state behind `Cell`/`RefCell`.
//!
//! [`RedrawScheduler::on_refresh_tick`]: crate::scheduler::RedrawScheduler::on_refresh_tick

use alloc::boxed::Box;

use crate::damage::Damage;
use crate::error::{RenderError, ResolveError};
use crate::surface::SurfaceId;
use crate::time::HostTime;

/// What the render routine is asked to do for one surface in one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderRequest {
    /// Skip any cached output and render from scratch.
    pub force_invalidate: bool,
    /// The area that changed since the last pass.
    pub damage: Damage,
}

/// Payload of the pre-render notification.
#[derive(Debug)]
pub struct PreRenderEvent<'a, C> {
    /// The surface about to be rendered.
    pub surface: SurfaceId,
    /// Its resolved render context.
    pub context: &'a C,
    /// Tick timestamp.
    pub timestamp: HostTime,
    /// Index of the tick.
    pub frame_index: u64,
}

/// Resolves surfaces and renders them.
///
/// # Tick pseudocode
///
/// ```rust,ignore
/// for owed in table.drain() {
///     let Ok(ctx) = host.resolve(owed.surface) else { continue };
///     host.will_render(&PreRenderEvent { context: &ctx, .. });
///     host.render(&ctx, RenderRequest { .. })?; // counted, not fatal
///     for hook in hooks(owed.surface) { hook(&ctx); }
/// }
/// ```
pub trait SurfaceHost {
    /// Everything the render routine and post-render hooks need for one
    /// surface.
    type Context;

    /// Looks up the render context for `surface`.
    ///
    /// Must be cheap; it is also used to filter redraw requests for surfaces
    /// that no longer exist.
    fn resolve(&self, surface: SurfaceId) -> Result<Self::Context, ResolveError>;

    /// Returns `true` if `surface` currently resolves.
    fn is_live(&self, surface: SurfaceId) -> bool {
        self.resolve(surface).is_ok()
    }

    /// Called immediately before [`render`](Self::render).
    fn will_render(&self, event: &PreRenderEvent<'_, Self::Context>) {
        _ = event;
    }

    /// Renders one surface.
    fn render(&self, context: &Self::Context, request: RenderRequest) -> Result<(), RenderError>;
}

/// Handle for one outstanding frame request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// The host's single-shot refresh primitive.
pub trait FrameSource {
    /// Asks for one callback before the next display refresh.
    fn request_frame(&self) -> FrameRequest;

    /// Withdraws a request made by [`request_frame`](Self::request_frame).
    ///
    /// Cancelling a request that already fired must be harmless.
    fn cancel_frame(&self, request: FrameRequest);
}

/// A monotonic clock.
pub trait Clock {
    /// The current host time.
    fn now(&self) -> HostTime;
}

/// Whether the host's output can currently be seen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Output is on screen.
    #[default]
    Visible,
    /// Output is hidden (background tab, minimized window).
    Hidden,
}

/// Foreground/background notifications.
pub trait VisibilitySource {
    /// The current state.
    fn visibility(&self) -> Visibility;

    /// Registers `handler` to be called on every change.
    fn subscribe(&self, handler: Box<dyn FnMut(Visibility)>);
}

/// A [`VisibilitySource`] for hosts that are never hidden.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysVisible;

impl VisibilitySource for AlwaysVisible {
    fn visibility(&self) -> Visibility {
        Visibility::Visible
    }

    fn subscribe(&self, handler: Box<dyn FnMut(Visibility)>) {
        drop(handler);
    }
}
