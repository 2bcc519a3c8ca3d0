// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use kurbo::Rect;
use tessera_core::trace::{
    BuildSummary, OpRecordedEvent, OpSkippedEvent, RestoreEvent, SaveEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    rich: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("rich", &self.rich)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            rich: false,
        }
    }

    /// Also print every rectangle handed to the bounds accumulator.
    #[must_use]
    pub fn with_bounds(mut self, rich: bool) -> Self {
        self.rich = rich;
        self
    }

    /// Consumes the sink and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn yes_no(v: bool) -> &'static str {
    if v { "yes" } else { "no" }
}

fn fmt_rect(r: &Rect) -> String {
    format!("[{}, {}, {}, {}]", r.x0, r.y0, r.x1, r.y1)
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_save(&mut self, e: &SaveEvent) {
        let kind = if e.is_layer { "layer" } else { "save" };
        let nop = if e.is_nop { " nop" } else { "" };
        let _ = writeln!(self.writer, "[save] depth={} {kind}{nop}", e.depth);
    }

    fn on_restore(&mut self, e: &RestoreEvent) {
        let _ = writeln!(
            self.writer,
            "[restore] depth={} recorded={} layer={} opacity={} unbounded={}",
            e.depth,
            yes_no(e.materialized),
            yes_no(e.has_layer),
            yes_no(e.can_distribute_opacity),
            yes_no(e.unbounded),
        );
    }

    fn on_op_recorded(&mut self, e: &OpRecordedEvent) {
        let _ = writeln!(
            self.writer,
            "[op] #{} {:?} at {}+{}",
            e.op_index, e.kind, e.offset, e.size,
        );
    }

    fn on_op_skipped(&mut self, e: &OpSkippedEvent) {
        let _ = writeln!(self.writer, "[skip] {:?} ({:?})", e.kind, e.reason);
    }

    fn on_build(&mut self, s: &BuildSummary) {
        let _ = writeln!(
            self.writer,
            "[build] ops={} records={} bytes={} bounds={} group_opacity={} \
             thread_safe={} unbounded={}",
            s.op_count,
            s.op_index_count,
            s.byte_count,
            fmt_rect(&s.bounds),
            yes_no(s.can_apply_group_opacity),
            yes_no(s.is_ui_thread_safe),
            yes_no(s.is_unbounded),
        );
    }

    fn on_bounds_accumulated(&mut self, op_index: u32, rect: &Rect) {
        if self.rich {
            let _ = writeln!(self.writer, "[bounds] #{op_index} {}", fmt_rect(rect));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::op::DlOpType;
    use tessera_core::trace::SkipReason;

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_writer()).unwrap()
    }

    #[test]
    fn pretty_print_recorded_and_skipped() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_op_recorded(&OpRecordedEvent {
            op_index: 3,
            kind: DlOpType::DrawRect,
            offset: 64,
            size: 40,
        });
        sink.on_op_skipped(&OpSkippedEvent {
            kind: DlOpType::DrawOval,
            reason: SkipReason::Culled,
        });
        let output = output(sink);
        assert!(
            output.contains("[op] #3 DrawRect at 64+40"),
            "got: {output}"
        );
        assert!(output.contains("[skip] DrawOval (Culled)"), "got: {output}");
    }

    #[test]
    fn bounds_lines_are_opt_in() {
        let rect = Rect::new(0.0, 0.0, 1.0, 2.0);
        let mut quiet = PrettyPrintSink::with_writer(Vec::<u8>::new());
        quiet.on_bounds_accumulated(0, &rect);
        assert!(output(quiet).is_empty());

        let mut rich = PrettyPrintSink::with_writer(Vec::<u8>::new()).with_bounds(true);
        rich.on_bounds_accumulated(7, &rect);
        let output = output(rich);
        assert_eq!(output, "[bounds] #7 [0, 0, 1, 2]\n");
    }
}
