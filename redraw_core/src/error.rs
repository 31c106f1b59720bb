// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Failure values reported by host collaborators.
//!
//! None of these cross the scheduler's public API. They are counted in the
//! per-tick [`TickReport`](crate::report::TickReport) and forwarded to the
//! trace sink.

use core::fmt;

/// The host could not produce a render context for a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResolveError {
    /// The surface was torn down.
    Released,
    /// The handle's generation does not match the live surface in its slot.
    Stale,
    /// The surface exists but has no usable context right now (for example a
    /// lost GPU device or a detached canvas).
    Unavailable,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Released => f.write_str("surface was released"),
            Self::Stale => f.write_str("surface handle is stale"),
            Self::Unavailable => f.write_str("surface has no render context"),
        }
    }
}

impl core::error::Error for ResolveError {}

/// The render routine failed for a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderError {
    /// The render context became invalid while drawing.
    ContextLost,
    /// Backend-specific failure.
    Backend(&'static str),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContextLost => f.write_str("render context lost"),
            Self::Backend(reason) => write!(f, "render failed: {reason}"),
        }
    }
}

impl core::error::Error for RenderError {}

/// A post-render hook failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookError {
    /// The hook reported a failure.
    Failed(&'static str),
    /// The hook was invoked while it was already running.
    Reentrant,
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "post-render hook failed: {reason}"),
            Self::Reentrant => f.write_str("post-render hook re-entered"),
        }
    }
}

impl core::error::Error for HookError {}
