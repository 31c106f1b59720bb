// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, Chrome trace export and `tracing` forwarding
//! for redraw diagnostics.
//!
//! This crate provides [`TraceSink`](redraw_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: Human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: Compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: Writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//! - [`tracing_sink::TracingSink`]: Forwards events to the `tracing` crate.
//! - [`tee::TeeSink`]: Sends every event to two sinks.

pub mod chrome;
pub mod pretty;
pub mod recorder;
pub mod tee;
pub mod tracing_sink;
