// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The recording canvas.
//!
//! [`DisplayListBuilder`] offers a canvas-like API and turns each call into
//! zero or one records in an [`OpBuffer`]. While recording it keeps:
//!
//! - **Attribute state**: the current [`DlPaint`]. Attribute setters only
//!   record when a value actually changes, and the `*_with_paint` draw
//!   variants diff the whole paint before drawing.
//! - **Transform and clip**: a [`MatrixClipTracker`], used to map op bounds
//!   to device space and to drop ops the clip hides.
//! - **Bounds**: a [`BoundsAccumulator`] per the configured
//!   [`BoundsStrategy`], fed with the device bounds of every visible op.
//! - **The save stack**: one frame per open save, tracking the deferred
//!   `Save` record, group-opacity compatibility, and whether everything
//!   inside is invisible.
//!
//! Every call follows the same pattern: drop it if its input is non-finite,
//! an identity, or invisible; write the enclosing deferred save; record it;
//! then update the tracker (state calls) or the bounds and opacity
//! bookkeeping (draw calls).
//!
//! [`build`](DisplayListBuilder::build) closes every open save, moves the
//! recording into an immutable [`DisplayList`], and leaves the builder empty
//! and ready for reuse.
//!
//! ```rust
//! use kurbo::Rect;
//! use tessera_core::builder::DisplayListBuilder;
//! use tessera_core::color::DlColor;
//! use tessera_core::paint::DlPaint;
//!
//! let mut builder = DisplayListBuilder::new(None, false);
//! builder.save();
//! builder.translate(5.0, 5.0);
//! let red = DlPaint::from_color(DlColor::RED);
//! builder.draw_rect_with_paint(&Rect::new(0.0, 0.0, 10.0, 10.0), &red);
//! builder.restore();
//! let list = builder.build();
//! assert_eq!(list.op_count(false), 4);
//! assert_eq!(list.bounds(), Rect::new(5.0, 5.0, 15.0, 15.0));
//! ```

mod attributes;
mod draw;
mod layer;
mod matrix_clip;
mod paint_result;

#[cfg(test)]
mod tests;

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::{Affine, Rect};

use self::layer::LayerFrame;
pub use self::paint_result::{PaintResult, classify as classify_paint, nops_on_transparency};
use crate::accumulator::{BoundsAccumulator, BoundsStrategy};
use crate::buffer::{DEFAULT_PAGE_SIZE, OpBuffer};
use crate::display_list::{DisplayList, DisplayListParts};
use crate::error::DisplayListError;
use crate::flags::DisplayListAttributeFlags;
use crate::geometry::{self, MAX_CULL_RECT};
use crate::op::DlOp;
use crate::paint::DlPaint;
use crate::trace::{BuildSummary, OpRecordedEvent, SkipReason, TraceSink, Tracer};
use crate::tracker::MatrixClipTracker;
use crate::transform::DlMatrix;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a [`DisplayListBuilder`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuilderConfig {
    /// Device-space bounds of the recording; content outside is culled.
    pub cull_rect: Rect,
    /// How op bounds are accumulated.
    pub bounds_strategy: BoundsStrategy,
    /// Growth granularity of the op arena, in bytes.
    pub page_size: usize,
}

impl BuilderConfig {
    /// Default configuration culled to `cull_rect`.
    #[must_use]
    pub const fn new(cull_rect: Rect) -> Self {
        Self {
            cull_rect,
            bounds_strategy: BoundsStrategy::Rect,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Returns the configuration with the given bounds strategy.
    #[must_use]
    pub const fn with_bounds_strategy(mut self, strategy: BoundsStrategy) -> Self {
        self.bounds_strategy = strategy;
        self
    }

    /// Returns the configuration with the given arena page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self::new(MAX_CULL_RECT)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Device bounds of a visible draw.
#[derive(Clone, Copy, Debug)]
struct DeviceBounds {
    rect: Rect,
    /// The op could not be bounded and covers the whole clip.
    unbounded: bool,
}

/// Records canvas calls into a [`DisplayList`].
///
/// The builder is single-threaded and reusable: [`build`](Self::build)
/// resets it to a fresh recording.
pub struct DisplayListBuilder {
    config: BuilderConfig,
    buffer: OpBuffer,
    tracker: MatrixClipTracker,
    accumulator: Box<dyn BoundsAccumulator>,
    /// Frames below the top of the save stack.
    layers: Vec<LayerFrame>,
    current_layer: LayerFrame,
    /// Attribute state as last recorded.
    current: DlPaint,
    nested_op_count: u32,
    nested_byte_count: usize,
    is_ui_thread_safe: bool,
    is_unbounded: bool,
    /// First arena failure; latched until `build`.
    failure: Option<DisplayListError>,
    trace_sink: Option<Box<dyn TraceSink>>,
}

impl core::fmt::Debug for DisplayListBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DisplayListBuilder")
            .field("config", &self.config)
            .field("used", &self.buffer.used())
            .field("save_count", &self.save_count())
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

impl Default for DisplayListBuilder {
    fn default() -> Self {
        Self::with_config(BuilderConfig::default())
    }
}

impl DisplayListBuilder {
    /// Creates a builder culled to `cull_rect` (unbounded for `None`),
    /// optionally collecting a spatial index.
    #[must_use]
    pub fn new(cull_rect: Option<Rect>, prepare_rtree: bool) -> Self {
        let strategy = if prepare_rtree {
            BoundsStrategy::SpatialIndex
        } else {
            BoundsStrategy::Rect
        };
        Self::with_config(
            BuilderConfig::new(cull_rect.unwrap_or(MAX_CULL_RECT)).with_bounds_strategy(strategy),
        )
    }

    /// Creates a builder from a full configuration.
    #[must_use]
    pub fn with_config(config: BuilderConfig) -> Self {
        Self {
            config,
            buffer: OpBuffer::new(config.page_size),
            tracker: MatrixClipTracker::new(config.cull_rect),
            accumulator: config.bounds_strategy.create(),
            layers: Vec::new(),
            current_layer: LayerFrame::root(),
            current: DlPaint::new(),
            nested_op_count: 0,
            nested_byte_count: 0,
            is_ui_thread_safe: true,
            is_unbounded: false,
            failure: None,
            trace_sink: None,
        }
    }

    /// The configuration this builder was created with.
    #[must_use]
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Installs a sink for trace events, replacing any previous one.
    ///
    /// Events are only delivered when the `trace` feature is enabled.
    pub fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink>>) {
        self.trace_sink = sink;
    }

    /// Removes and returns the trace sink.
    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.trace_sink.take()
    }

    // -- queries ------------------------------------------------------------

    /// Number of open saves, counting the root.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.layers.len() + 1
    }

    /// The current transform.
    #[must_use]
    pub fn matrix(&self) -> DlMatrix {
        *self.tracker.matrix()
    }

    /// The current transform as a 2-D affine, unless it has perspective.
    #[must_use]
    pub fn affine(&self) -> Option<Affine> {
        self.tracker.affine()
    }

    /// Current clip bounds in device space.
    #[must_use]
    pub fn device_cull_rect(&self) -> Rect {
        self.tracker.device_cull_rect()
    }

    /// Current clip bounds in local space.
    #[must_use]
    pub fn local_cull_rect(&self) -> Rect {
        self.tracker.local_cull_rect()
    }

    /// Would content with local bounds `bounds` be clipped out entirely?
    #[must_use]
    pub fn quick_reject(&self, bounds: &Rect) -> bool {
        self.tracker.content_culled(bounds)
    }

    /// The attribute state as last recorded.
    #[must_use]
    pub fn current_attributes(&self) -> &DlPaint {
        &self.current
    }

    /// Bytes recorded so far.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.buffer.used()
    }

    /// Rendering records written so far.
    #[must_use]
    pub fn op_count(&self) -> u32 {
        self.buffer.render_op_count()
    }

    // -- build --------------------------------------------------------------

    /// Closes all open saves and moves the recording into a [`DisplayList`].
    ///
    /// The builder is reset and may be reused.
    ///
    /// # Panics
    ///
    /// If the op arena failed to grow during recording. Use
    /// [`try_build`](Self::try_build) to handle that case.
    #[must_use]
    pub fn build(&mut self) -> DisplayList {
        match self.try_build() {
            Ok(list) => list,
            Err(err) => panic!("display list recording failed: {err}"),
        }
    }

    /// Like [`build`](Self::build), but reports a failed recording.
    ///
    /// The builder is reset in either case.
    ///
    /// # Errors
    ///
    /// [`DisplayListError::AllocationFailed`] if the op arena failed to grow
    /// at any point during recording.
    pub fn try_build(&mut self) -> Result<DisplayList, DisplayListError> {
        self.restore_to_count(1);
        let result = self.finish();
        self.reset();
        result
    }

    fn finish(&mut self) -> Result<DisplayList, DisplayListError> {
        if let Some(err) = self.failure {
            return Err(err);
        }
        let bounds = self.accumulator.bounds()?;
        let rtree = self.accumulator.build_rtree()?;
        let root = &self.current_layer;
        let recorded = self.buffer.take();
        let summary = BuildSummary {
            op_count: recorded.render_op_count,
            op_index_count: recorded.op_index_count,
            byte_count: recorded.storage.len(),
            bounds,
            can_apply_group_opacity: root.opacity.is_compatible(),
            is_ui_thread_safe: self.is_ui_thread_safe,
            is_unbounded: self.is_unbounded,
        };
        let parts = DisplayListParts {
            recorded,
            nested_op_count: self.nested_op_count,
            nested_byte_count: self.nested_byte_count,
            bounds,
            rtree,
            can_apply_group_opacity: summary.can_apply_group_opacity,
            is_ui_thread_safe: summary.is_ui_thread_safe,
            modifies_transparent_black: root.affects_transparent_layer,
            root_has_backdrop_filter: root.contains_backdrop_filter,
            max_root_blend_mode: root.max_blend_mode,
            is_unbounded: summary.is_unbounded,
        };
        self.tracer().build(&summary);
        Ok(DisplayList::from_parts(parts))
    }

    fn reset(&mut self) {
        self.buffer = OpBuffer::new(self.config.page_size);
        self.tracker = MatrixClipTracker::new(self.config.cull_rect);
        self.accumulator.reset();
        self.layers.clear();
        self.current_layer = LayerFrame::root();
        self.current = DlPaint::new();
        self.nested_op_count = 0;
        self.nested_byte_count = 0;
        self.is_ui_thread_safe = true;
        self.is_unbounded = false;
        self.failure = None;
    }

    // -- internals ----------------------------------------------------------

    fn tracer(&mut self) -> Tracer<'_> {
        match self.trace_sink.as_deref_mut() {
            Some(sink) => Tracer::new(sink),
            None => Tracer::none(),
        }
    }

    /// Appends `op` and returns its offset, or `None` once the arena has
    /// failed.
    fn push_op(&mut self, op: &DlOp<'_>) -> Option<usize> {
        if self.failure.is_some() {
            self.trace_skip(op.op_type(), SkipReason::AllocationFailed);
            return None;
        }
        let op_index = self.buffer.op_index();
        match self.buffer.push(op) {
            Ok(offset) => {
                let e = OpRecordedEvent {
                    op_index,
                    kind: op.op_type(),
                    offset,
                    size: self.buffer.used() - offset,
                };
                self.tracer().op_recorded(&e);
                Some(offset)
            }
            Err(err) => {
                self.failure = Some(err);
                self.trace_skip(op.op_type(), SkipReason::AllocationFailed);
                None
            }
        }
    }

    fn accumulate(&mut self, rect: Rect, op_index: u32) {
        #[cfg(feature = "trace-rich")]
        self.tracer().bounds_accumulated(op_index, &rect);
        self.accumulator
            .accumulate(rect, i32::try_from(op_index).unwrap_or(i32::MAX));
    }

    /// Accumulates the whole device clip for content that cannot be bounded.
    ///
    /// Returns `false` if the clip is empty.
    fn accumulate_unbounded(&mut self, op_index: u32) -> bool {
        let clip = self.tracker.device_cull_rect();
        if geometry::is_empty(&clip) {
            return false;
        }
        self.is_unbounded = true;
        self.accumulate(clip, op_index);
        true
    }

    /// Can an op drawn with the current attributes under `flags` take an
    /// inherited opacity?
    fn opacity_compatible(&self, flags: DisplayListAttributeFlags) -> bool {
        if flags.ignores_paint() {
            return true;
        }
        let paint = &self.current;
        let blend_ok = !flags.applies_blend() || paint.blend_mode.is_opacity_compatible();
        let filter_ok = !flags.applies_color_filter()
            || (!paint.invert_colors
                && paint
                    .color_filter
                    .as_ref()
                    .is_none_or(|f| f.can_commute_with_opacity()));
        blend_ok && filter_ok
    }
}
