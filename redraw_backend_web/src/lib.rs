// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for redraw.
//!
//! This crate binds the scheduler's host traits to browser APIs:
//!
//! - [`RafFrames`]: single-shot `requestAnimationFrame` frame source
//! - [`PerformanceClock`]: `performance.now()` in microsecond ticks
//! - [`DocumentVisibility`]: the Page Visibility API
//!
//! [`WebRedraw::new`] wires all three to a [`RedrawScheduler`] for a given
//! [`SurfaceHost`].

#![no_std]

extern crate alloc;

mod raf;
mod visibility;

use core::fmt;

pub use raf::{PerformanceClock, RafFrames};
pub use visibility::DocumentVisibility;

use redraw_core::config::RedrawConfig;
use redraw_core::host::SurfaceHost;
use redraw_core::scheduler::RedrawScheduler;
use redraw_core::time::Timebase;

/// Returns the web [`Timebase`]: 1 tick = 1 µs.
#[must_use]
pub fn timebase() -> Timebase {
    Timebase::MICROS
}

/// Errors from [`WebRedraw::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WebError {
    /// There is no global `window` (e.g. inside a worker).
    NoWindow,
    /// The window has no document.
    NoDocument,
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWindow => f.write_str("no global window"),
            Self::NoDocument => f.write_str("window has no document"),
        }
    }
}

impl core::error::Error for WebError {}

/// A scheduler driven by the browser.
pub type WebScheduler<H> = RedrawScheduler<H, RafFrames, PerformanceClock>;

/// A [`WebScheduler`] plus the visibility source it listens to.
///
/// Dropping this detaches the `visibilitychange` listener. Frames already
/// requested fire into a dead handler and are ignored.
#[derive(Debug)]
pub struct WebRedraw<H: SurfaceHost> {
    scheduler: WebScheduler<H>,
    visibility: DocumentVisibility,
}

impl<H: SurfaceHost + 'static> WebRedraw<H> {
    /// Builds a scheduler for `host` on the current page.
    pub fn new(config: RedrawConfig, host: H) -> Result<Self, WebError> {
        let window = web_sys::window().ok_or(WebError::NoWindow)?;
        let document = window.document().ok_or(WebError::NoDocument)?;
        let visibility = DocumentVisibility::new(document);
        let frames = RafFrames::new();
        let scheduler =
            RedrawScheduler::new(config, host, frames.clone(), PerformanceClock, &visibility);

        let weak = scheduler.downgrade();
        frames.set_handler(move |now| {
            if let Some(scheduler) = weak.upgrade() {
                _ = scheduler.on_refresh_tick(now);
            }
        });

        Ok(Self {
            scheduler,
            visibility,
        })
    }

    /// The scheduler. Clone it to hand out to surfaces.
    #[must_use]
    pub fn scheduler(&self) -> &WebScheduler<H> {
        &self.scheduler
    }

    /// The page's visibility source.
    #[must_use]
    pub fn visibility(&self) -> &DocumentVisibility {
        &self.visibility
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn timebase_is_microsecond() {
        let tb = timebase();
        assert_eq!(tb.ticks_to_nanos(1), 1000, "1 tick = 1 µs");
        assert_eq!(
            tb.ticks_to_nanos(100_000),
            100_000_000,
            "idle window is 100 ms"
        );
    }

    #[test]
    fn errors_display() {
        assert_eq!(WebError::NoDocument.to_string(), "window has no document");
    }
}
