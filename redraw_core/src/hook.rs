// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Post-render hooks.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use crate::error::HookError;

type HookFn<C> = dyn FnMut(&C) -> Result<(), HookError>;

/// A callback run after a surface's render pass succeeds.
///
/// Hooks compare by identity: clones of one `PostRenderHook` are the same
/// hook, two hooks built from identical closures are not. Registering the
/// same hook twice for a surface keeps one registration, and unregistering
/// needs a clone of the registered value.
///
/// A hook receives the render context resolved for the tick. It may call
/// back into the scheduler (for example to request another frame).
pub struct PostRenderHook<C> {
    f: Rc<RefCell<HookFn<C>>>,
}

impl<C> PostRenderHook<C> {
    /// Wraps a fallible callback.
    pub fn new(f: impl FnMut(&C) -> Result<(), HookError> + 'static) -> Self {
        Self {
            f: Rc::new(RefCell::new(f)),
        }
    }

    /// Wraps a callback that cannot fail.
    pub fn infallible(mut f: impl FnMut(&C) + 'static) -> Self {
        Self::new(move |ctx| {
            f(ctx);
            Ok(())
        })
    }

    /// Returns `true` if both values refer to the same hook.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.f, &other.f)
    }

    pub(crate) fn invoke(&self, ctx: &C) -> Result<(), HookError> {
        let Ok(mut f) = self.f.try_borrow_mut() else {
            return Err(HookError::Reentrant);
        };
        f(ctx)
    }
}

impl<C> Clone for PostRenderHook<C> {
    fn clone(&self) -> Self {
        Self {
            f: Rc::clone(&self.f),
        }
    }
}

impl<C> PartialEq for PostRenderHook<C> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<C> Eq for PostRenderHook<C> {}

impl<C> fmt::Debug for PostRenderHook<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostRenderHook")
            .field("ptr", &Rc::as_ptr(&self.f).cast::<()>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn clones_are_the_same_hook() {
        let a = PostRenderHook::<u32>::infallible(|_| {});
        let b = a.clone();
        let c = PostRenderHook::<u32>::infallible(|_| {});
        assert_eq!(a, b);
        assert_ne!(a, c, "distinct closures are distinct hooks");
    }

    #[test]
    fn invoke_passes_context_and_error() {
        let seen = Rc::new(Cell::new(0));
        let seen2 = Rc::clone(&seen);
        let ok = PostRenderHook::infallible(move |v: &u32| seen2.set(*v));
        assert_eq!(ok.invoke(&7), Ok(()));
        assert_eq!(seen.get(), 7);

        let failing = PostRenderHook::new(|_: &u32| Err(HookError::Failed("nope")));
        assert_eq!(failing.invoke(&0), Err(HookError::Failed("nope")));
    }

    #[test]
    fn nested_invoke_reports_reentrancy() {
        let slot: Rc<RefCell<Option<PostRenderHook<u32>>>> = Rc::new(RefCell::new(None));
        let inner_result = Rc::new(Cell::new(None));
        let (slot2, result2) = (Rc::clone(&slot), Rc::clone(&inner_result));
        let hook = PostRenderHook::infallible(move |v: &u32| {
            if let Some(me) = slot2.borrow().as_ref() {
                result2.set(Some(me.invoke(v)));
            }
        });
        *slot.borrow_mut() = Some(hook.clone());
        assert_eq!(hook.invoke(&1), Ok(()));
        assert_eq!(inner_result.get(), Some(Err(HookError::Reentrant)));
        slot.borrow_mut().take();
    }
}
