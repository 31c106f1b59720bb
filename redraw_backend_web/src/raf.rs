// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` as a single-shot [`FrameSource`].
//!
//! Each [`request_frame`](FrameSource::request_frame) registers exactly one
//! callback. The callback receives a [`DOMHighResTimeStamp`][mdn]
//! (milliseconds), which is converted to microsecond [`HostTime`] ticks and
//! handed to the installed handler. Nothing re-registers on its own: the
//! scheduler decides whether another frame is wanted.
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use redraw_core::host::{Clock, FrameRequest, FrameSource};
use redraw_core::time::HostTime;

// Direct global bindings instead of `web_sys::Window` methods; avoids
// fetching the Window/Performance objects on every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

/// Converts a millisecond `DOMHighResTimeStamp` to microsecond ticks.
pub(crate) fn ms_to_host_time(ms: f64) -> HostTime {
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "timestamps are small positive f64; µs fits in u64"
    )]
    let us = (ms * 1000.0) as u64;
    HostTime(us)
}

/// [`Clock`] backed by `performance.now()`, in microsecond ticks.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerformanceClock;

impl Clock for PerformanceClock {
    fn now(&self) -> HostTime {
        ms_to_host_time(performance_now())
    }
}

type RafClosure = Closure<dyn FnMut(f64)>;

struct RafInner {
    /// Registered with every `requestAnimationFrame` call. Built lazily on
    /// the first request and reused afterwards.
    closure: RefCell<Option<RafClosure>>,

    /// Receives the timestamp of each fired frame.
    handler: RefCell<Option<Box<dyn FnMut(HostTime)>>>,

    /// The outstanding request and its browser id.
    pending: Cell<Option<(FrameRequest, i32)>>,

    next_request: Cell<u64>,
}

/// A [`FrameSource`] over `requestAnimationFrame`.
///
/// Clones share state, so one clone can live inside the scheduler while
/// another installs the handler with [`set_handler`](Self::set_handler).
#[derive(Clone)]
pub struct RafFrames {
    inner: Rc<RafInner>,
}

impl fmt::Debug for RafFrames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RafFrames")
            .field("pending", &self.inner.pending.get().map(|(r, _)| r))
            .field("has_handler", &self.inner.handler.borrow().is_some())
            .finish_non_exhaustive()
    }
}

impl Default for RafFrames {
    fn default() -> Self {
        Self::new()
    }
}

impl RafFrames {
    /// Creates a frame source with no handler installed.
    ///
    /// Frames that fire before a handler is installed are dropped.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RafInner {
                closure: RefCell::new(None),
                handler: RefCell::new(None),
                pending: Cell::new(None),
                next_request: Cell::new(0),
            }),
        }
    }

    /// Installs the callback that receives fired frames, replacing any
    /// previous one.
    pub fn set_handler(&self, handler: impl FnMut(HostTime) + 'static) {
        *self.inner.handler.borrow_mut() = Some(Box::new(handler));
    }

    /// Whether a frame is outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.pending.get().is_some()
    }

    fn ensure_closure(&self) {
        if self.inner.closure.borrow().is_some() {
            return;
        }
        // Weak, so the closure stored inside `inner` does not keep it alive.
        let weak = Rc::downgrade(&self.inner);
        let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.pending.set(None);
            let now = ms_to_host_time(timestamp_ms);
            // Taken out for the call so the handler may request the next
            // frame or replace itself.
            let handler = inner.handler.borrow_mut().take();
            if let Some(mut handler) = handler {
                handler(now);
                let mut slot = inner.handler.borrow_mut();
                if slot.is_none() {
                    *slot = Some(handler);
                }
            }
        }) as Box<dyn FnMut(f64)>);
        *self.inner.closure.borrow_mut() = Some(closure);
    }
}

impl FrameSource for RafFrames {
    fn request_frame(&self) -> FrameRequest {
        self.ensure_closure();
        let request = FrameRequest(self.inner.next_request.get());
        self.inner.next_request.set(request.0 + 1);
        if let Some(ref closure) = *self.inner.closure.borrow() {
            let id = request_animation_frame(closure.as_ref().unchecked_ref());
            self.inner.pending.set(Some((request, id)));
        }
        request
    }

    fn cancel_frame(&self, request: FrameRequest) {
        if let Some((pending, id)) = self.inner.pending.get()
            && pending == request
        {
            cancel_animation_frame(id);
            self.inner.pending.set(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_convert_to_microseconds() {
        assert_eq!(ms_to_host_time(16.0), HostTime(16_000), "one rAF period");
        assert_eq!(ms_to_host_time(0.5), HostTime(500), "sub-millisecond");
        assert_eq!(ms_to_host_time(0.0), HostTime(0), "origin");
    }
}
