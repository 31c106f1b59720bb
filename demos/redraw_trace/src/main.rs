// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated redraw session that exercises the tracing and diagnostics
//! pipeline.
//!
//! Drives three surfaces through a deterministic harness: one healthy with a
//! hook, one with a failing hook, and one whose renders fail. The page is
//! then hidden and shown again, and a surface is released. Events go to a
//! [`PrettyPrintSink`], a [`RecorderSink`] and `tracing` at once; the
//! recording is exported as a Chrome trace.
//!
//! Set `RUST_LOG=redraw=debug` to see the `tracing` output.

use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use kurbo::Rect;
use redraw_core::config::RedrawConfig;
use redraw_core::error::{HookError, RenderError};
use redraw_core::hook::PostRenderHook;
use redraw_core::host::Visibility;
use redraw_core::surface::SurfaceId;
use redraw_core::time::{Duration, Timebase};
use redraw_debug::pretty::PrettyPrintSink;
use redraw_debug::recorder::RecorderSink;
use redraw_debug::tee::TeeSink;
use redraw_debug::tracing_sink::TracingSink;
use redraw_harness::Harness;
use tracing_subscriber::EnvFilter;

/// One 60 Hz refresh in microsecond ticks.
const FRAME: Duration = Duration(16_667);
const TICK_LIMIT: usize = 64;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let timebase = Timebase::MICROS;
    let h = Harness::new(RedrawConfig::web());

    // -- sinks -------------------------------------------------------------
    let recorder = Rc::new(RefCell::new(RecorderSink::new()));
    let pretty = PrettyPrintSink::new(Box::new(std::io::stdout()), timebase);
    let sink = TeeSink::new(TeeSink::new(pretty, Rc::clone(&recorder)), TracingSink);
    h.scheduler.set_trace_sink(Box::new(sink));

    // -- surfaces ----------------------------------------------------------
    let canvas = SurfaceId::new(0, 0);
    let overlay = SurfaceId::new(1, 0);
    let minimap = SurfaceId::new(2, 0);

    let presented = Rc::new(Cell::new(0_u32));
    let counter = Rc::clone(&presented);
    h.scheduler.register_hook(
        canvas,
        PostRenderHook::infallible(move |_: &SurfaceId| counter.set(counter.get() + 1)),
    );
    h.scheduler.register_hook(
        overlay,
        PostRenderHook::new(|_: &SurfaceId| Err(HookError::Failed("texture upload"))),
    );
    h.host.fail_renders_for(minimap, RenderError::ContextLost);

    // -- burst -------------------------------------------------------------
    h.scheduler.request_redraw(canvas, false);
    h.scheduler.request_redraw(canvas, true);
    h.scheduler
        .request_redraw_region(overlay, Rect::new(0.0, 0.0, 64.0, 64.0));
    h.scheduler
        .request_redraw_region(overlay, Rect::new(32.0, 32.0, 128.0, 96.0));
    h.scheduler.request_redraw(minimap, false);
    let mut ticks = h.run_until_idle(FRAME, TICK_LIMIT).len();

    // -- hidden page -------------------------------------------------------
    h.clock.advance(FRAME);
    h.visibility.set(Visibility::Hidden);
    h.scheduler.request_redraw(canvas, false);
    h.clock.advance(Duration::from_millis(500, timebase));
    h.visibility.set(Visibility::Visible);
    ticks += h.run_until_idle(FRAME, TICK_LIMIT).len();

    // -- released surface --------------------------------------------------
    h.clock.advance(FRAME);
    h.scheduler.request_redraw(overlay, false);
    h.host.release(overlay);
    ticks += h.run_until_idle(FRAME, TICK_LIMIT).len();

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    redraw_debug::chrome::export(recorder.borrow().as_bytes(), timebase, &mut writer)
        .expect("failed to write Chrome trace");

    let stats = h.scheduler.stats();
    println!(
        "Wrote {path} ({ticks} ticks, {} renders, {} hooks presented)",
        stats.renders,
        presented.get(),
    );
    println!("{stats:?}");
}
