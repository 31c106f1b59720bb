// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Ticks become duration slices on the loop track; each surface's render
//! outcome is an instant on a per-surface track (`tid` = slot index + 1).
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use redraw_core::time::Timebase;

use crate::recorder::{RecordedEvent, RecordedOutcome, decode};

const LOOP_TID: u32 = 0;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
/// Per-surface events carry no timestamp of their own and are placed at the
/// start of their tick.
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut tick_ts = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::RedrawRequested(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "RedrawRequested",
                    "cat": "Request",
                    "ts": ticks_to_us(e.at.ticks(), timebase),
                    "pid": 0,
                    "tid": surface_tid(e.surface.index()),
                    "s": "t",
                    "args": {
                        "surface": format!("{:?}", e.surface),
                        "force_invalidate": e.force_invalidate,
                        "armed": e.armed,
                    }
                }));
            }
            RecordedEvent::FrameArmed(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameArmed",
                    "cat": "Loop",
                    "ts": ticks_to_us(e.at.ticks(), timebase),
                    "pid": 0,
                    "tid": LOOP_TID,
                    "s": "t",
                    "args": {
                        "request": e.request.0,
                        "reason": format!("{:?}", e.reason),
                    }
                }));
            }
            RecordedEvent::TickBegin(e) => {
                tick_ts = ticks_to_us(e.now.ticks(), timebase);
                events.push(json!({
                    "ph": "B",
                    "name": "Tick",
                    "cat": "Loop",
                    "ts": tick_ts,
                    "pid": 0,
                    "tid": LOOP_TID,
                    "args": {
                        "frame_index": e.frame_index,
                        "dirty": e.dirty,
                    }
                }));
            }
            RecordedEvent::SurfaceRendered {
                frame_index,
                surface,
                force_invalidate,
                outcome,
            } => {
                let (name, detail) = match outcome {
                    RecordedOutcome::Rendered => ("Render", None),
                    RecordedOutcome::Failed(text) => ("RenderFailed", Some(text)),
                    RecordedOutcome::Unresolved(text) => ("Unresolved", Some(text)),
                };
                events.push(json!({
                    "ph": "i",
                    "name": name,
                    "cat": "Surface",
                    "ts": tick_ts,
                    "pid": 0,
                    "tid": surface_tid(surface.index()),
                    "s": "t",
                    "args": {
                        "frame_index": frame_index,
                        "surface": format!("{surface:?}"),
                        "force_invalidate": force_invalidate,
                        "error": detail,
                    }
                }));
            }
            RecordedEvent::HookFailed {
                frame_index,
                surface,
                error,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "HookFailed",
                    "cat": "Surface",
                    "ts": tick_ts,
                    "pid": 0,
                    "tid": surface_tid(surface.index()),
                    "s": "t",
                    "args": {
                        "frame_index": frame_index,
                        "error": error,
                    }
                }));
            }
            RecordedEvent::TickEnd(e) => {
                let r = e.report;
                events.push(json!({
                    "ph": "E",
                    "name": "Tick",
                    "cat": "Loop",
                    "ts": ticks_to_us(r.now.ticks(), timebase),
                    "pid": 0,
                    "tid": LOOP_TID,
                    "args": {
                        "frame_index": r.frame_index,
                        "drained": r.drained,
                        "rendered": r.rendered,
                        "unresolved": r.unresolved,
                        "render_failures": r.render_failures,
                        "hooks_invoked": r.hooks_invoked,
                        "hook_failures": r.hook_failures,
                        "rearmed": r.rearmed,
                    }
                }));
            }
            RecordedEvent::LoopStopped(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "LoopStopped",
                    "cat": "Loop",
                    "ts": ticks_to_us(e.at.ticks(), timebase),
                    "pid": 0,
                    "tid": LOOP_TID,
                    "s": "g",
                    "args": {
                        "frame_index": e.frame_index,
                        "reason": format!("{:?}", e.reason),
                    }
                }));
            }
            RecordedEvent::VisibilityChanged(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "VisibilityChanged",
                    "cat": "Host",
                    "ts": ticks_to_us(e.at.ticks(), timebase),
                    "pid": 0,
                    "tid": LOOP_TID,
                    "s": "g",
                    "args": {
                        "visibility": format!("{:?}", e.visibility),
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}

fn surface_tid(index: u32) -> u64 {
    u64::from(index) + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use redraw_core::report::TickReport;
    use redraw_core::surface::SurfaceId;
    use redraw_core::time::HostTime;
    use redraw_core::trace::{
        RenderOutcome, SurfaceRenderedEvent, TickBeginEvent, TickEndEvent, TraceSink,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_tick_begin(&TickBeginEvent {
            frame_index: 0,
            now: HostTime(1_000),
            dirty: 1,
        });
        rec.on_surface_rendered(&SurfaceRenderedEvent {
            frame_index: 0,
            surface: SurfaceId::new(2, 0),
            force_invalidate: false,
            outcome: RenderOutcome::Rendered,
        });
        rec.on_tick_end(&TickEndEvent {
            report: TickReport {
                now: HostTime(1_000),
                drained: 1,
                rendered: 1,
                rearmed: true,
                ..TickReport::default()
            },
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), Timebase::MICROS, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["ts"], 1_000.0);

        assert_eq!(parsed[1]["name"], "Render");
        assert_eq!(parsed[1]["tid"], 3, "surface track is slot index + 1");
        assert_eq!(parsed[1]["ts"], 1_000.0, "placed at tick start");

        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["args"]["rearmed"], true);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], Timebase::NANOS, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty());
    }
}
