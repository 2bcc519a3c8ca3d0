// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for recording.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! builder calls as it records. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) additionally reports every rectangle
//!   handed to the bounds accumulator.

use kurbo::Rect;

use crate::op::DlOpType;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why a call was dropped without recording anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The paint cannot change any pixel.
    NoEffect,
    /// The op's bounds miss the current clip.
    Culled,
    /// The enclosing layer was found to have no visible effect.
    NopLayer,
    /// Non-finite or otherwise unusable arguments.
    InvalidInput,
    /// The call is an identity (zero translate, unit scale, ...) or its
    /// geometry is empty.
    Degenerate,
    /// The op arena could not grow.
    AllocationFailed,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted for every `save` and `save_layer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaveEvent {
    /// Stack depth after the save (the root is depth 1).
    pub depth: usize,
    /// `save_layer` rather than `save`.
    pub is_layer: bool,
    /// Everything inside will be skipped.
    pub is_nop: bool,
}

/// Emitted for every `restore` that pops a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestoreEvent {
    /// Stack depth after the restore.
    pub depth: usize,
    /// A save record had been written and a restore record was written now.
    pub materialized: bool,
    /// The popped frame was a layer.
    pub has_layer: bool,
    /// The layer's save record was marked as able to distribute opacity.
    pub can_distribute_opacity: bool,
    /// The frame's bounds could not be mapped and the clip was flooded.
    pub unbounded: bool,
}

/// Emitted after a record is written to the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpRecordedEvent {
    /// Op index of the record.
    pub op_index: u32,
    /// Record kind.
    pub kind: DlOpType,
    /// Byte offset of the record.
    pub offset: usize,
    /// Record size in bytes.
    pub size: usize,
}

/// Emitted when a call is dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpSkippedEvent {
    /// The kind the call would have recorded.
    pub kind: DlOpType,
    /// Why it was dropped.
    pub reason: SkipReason,
}

/// Emitted once by `build`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildSummary {
    /// Rendering records.
    pub op_count: u32,
    /// All records, attribute ops included.
    pub op_index_count: u32,
    /// Size of the record stream.
    pub byte_count: usize,
    /// Accumulated device-space bounds.
    pub bounds: Rect,
    /// The list may be drawn with group opacity folded into its ops.
    pub can_apply_group_opacity: bool,
    /// Every embedded resource may be used off the recording thread.
    pub is_ui_thread_safe: bool,
    /// Some content could not be bounded.
    pub is_unbounded: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the builder.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called on `save` and `save_layer`.
    fn on_save(&mut self, e: &SaveEvent) {
        _ = e;
    }

    /// Called when a frame is popped.
    fn on_restore(&mut self, e: &RestoreEvent) {
        _ = e;
    }

    /// Called after a record is written.
    fn on_op_recorded(&mut self, e: &OpRecordedEvent) {
        _ = e;
    }

    /// Called when a call is dropped.
    fn on_op_skipped(&mut self, e: &OpSkippedEvent) {
        _ = e;
    }

    /// Called once per `build`.
    fn on_build(&mut self, s: &BuildSummary) {
        _ = s;
    }

    /// Called with every device rect accumulated for an op (requires
    /// `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_bounds_accumulated(&mut self, op_index: u32, rect: &Rect) {
        _ = (op_index, rect);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer over an optional sink.
    #[inline]
    #[must_use]
    pub fn from_option(sink: Option<&'a mut dyn TraceSink>) -> Self {
        match sink {
            Some(sink) => Self::new(sink),
            None => Self::none(),
        }
    }

    /// Emits a [`SaveEvent`].
    #[inline]
    pub fn save(&mut self, e: &SaveEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_save(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RestoreEvent`].
    #[inline]
    pub fn restore(&mut self, e: &RestoreEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_restore(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`OpRecordedEvent`].
    #[inline]
    pub fn op_recorded(&mut self, e: &OpRecordedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_op_recorded(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`OpSkippedEvent`].
    #[inline]
    pub fn op_skipped(&mut self, e: &OpSkippedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_op_skipped(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BuildSummary`].
    #[inline]
    pub fn build(&mut self, s: &BuildSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_build(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits an accumulated rect (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn bounds_accumulated(&mut self, op_index: u32, rect: &Rect) {
        if let Some(s) = &mut self.sink {
            s.on_bounds_accumulated(op_index, rect);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_save(&SaveEvent {
            depth: 2,
            is_layer: false,
            is_nop: false,
        });
        sink.on_op_skipped(&OpSkippedEvent {
            kind: DlOpType::Translate,
            reason: SkipReason::Degenerate,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::from_option(None);
        tracer.restore(&RestoreEvent {
            depth: 1,
            materialized: false,
            has_layer: false,
            can_distribute_opacity: false,
            unbounded: false,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            kinds: Vec<DlOpType>,
        }
        impl TraceSink for RecordingSink {
            fn on_op_recorded(&mut self, e: &OpRecordedEvent) {
                self.kinds.push(e.kind);
            }
        }

        let mut sink = RecordingSink { kinds: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.op_recorded(&OpRecordedEvent {
            op_index: 0,
            kind: DlOpType::DrawRect,
            offset: 0,
            size: 40,
        });
        drop(tracer);
        assert_eq!(sink.kinds, &[DlOpType::DrawRect]);
    }
}
