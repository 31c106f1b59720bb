// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-refresh coalescing of redraw requests.
//!
//! `redraw_core` batches any number of "please redraw" requests against any
//! number of independently owned surfaces into one render pass per surface per
//! display refresh. It is `no_std` compatible (with `alloc`) and owns no
//! platform resources: surfaces, refresh callbacks, clocks and visibility
//! notifications come from the host through the traits in [`host`].
//!
//! # Architecture
//!
//! ```text
//!   request_redraw(surface) ──► DirtyTable ──► FrameSource::request_frame
//!                                                    │ (host refresh)
//!                 ┌──────────────────────────────────┘
//!                 ▼
//!   on_refresh_tick(now) ──► render each dirty surface once ──► hooks
//!                 │
//!                 └──► IdlePolicy: re-arm while recent activity, else stop
//!
//!   VisibilitySource ──► hidden: cancel frame / visible: re-arm
//! ```
//!
//! **[`scheduler`]**: [`RedrawScheduler`](scheduler::RedrawScheduler), the
//! refresh loop driver. Keeps at most one frame request outstanding and
//! reports each tick as a [`TickReport`](report::TickReport).
//!
//! **[`table`]**: Per-surface dirty state and post-render hook sets, backed
//! by `understory_dirty`.
//!
//! **[`idle`]**: The rolling deadline after which a quiet loop stops.
//!
//! **[`host`]**: Collaborator traits: surface resolution and rendering, the
//! single-shot refresh primitive, the clock, and visibility.
//!
//! **[`surface`]**: Generation-checked surface handles.
//!
//! **[`damage`]**: Full-surface or rectangular invalidation.
//!
//! **[`hook`]**: Identity-compared post-render callbacks.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! loop instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod damage;
pub mod error;
pub mod hook;
pub mod host;
pub mod idle;
pub mod report;
pub mod scheduler;
pub mod surface;
pub mod table;
pub mod time;
pub mod trace;
