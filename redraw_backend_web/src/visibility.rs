// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page Visibility API as a [`VisibilitySource`].

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::Document;

use redraw_core::host::{Visibility, VisibilitySource};

const EVENT: &str = "visibilitychange";

fn read(document: &Document) -> Visibility {
    if document.hidden() {
        Visibility::Hidden
    } else {
        Visibility::Visible
    }
}

/// Follows `document.hidden` and the `visibilitychange` event.
///
/// Listeners installed through [`subscribe`](VisibilitySource::subscribe)
/// stay attached for as long as this value lives and are removed on drop.
pub struct DocumentVisibility {
    document: Document,
    listeners: RefCell<Vec<Closure<dyn FnMut()>>>,
}

impl fmt::Debug for DocumentVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentVisibility")
            .field("listeners", &self.listeners.borrow().len())
            .finish_non_exhaustive()
    }
}

impl DocumentVisibility {
    /// Watches `document`.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document,
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Number of installed listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl VisibilitySource for DocumentVisibility {
    fn visibility(&self) -> Visibility {
        read(&self.document)
    }

    fn subscribe(&self, mut handler: Box<dyn FnMut(Visibility)>) {
        let document = self.document.clone();
        let closure = Closure::wrap(Box::new(move || {
            handler(read(&document));
        }) as Box<dyn FnMut()>);
        // Only fails for a non-callable listener, which a Closure never is.
        if self
            .document
            .add_event_listener_with_callback(EVENT, closure.as_ref().unchecked_ref())
            .is_ok()
        {
            self.listeners.borrow_mut().push(closure);
        }
    }
}

impl Drop for DocumentVisibility {
    fn drop(&mut self) {
        for closure in self.listeners.get_mut().drain(..) {
            _ = self
                .document
                .remove_event_listener_with_callback(EVENT, closure.as_ref().unchecked_ref());
        }
    }
}
