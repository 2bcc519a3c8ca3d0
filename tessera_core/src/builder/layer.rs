// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The save/restore stack.
//!
//! Each open `save` or `save_layer` owns a [`LayerFrame`]. A plain save's
//! `Save` record is deferred until something is recorded inside it, so an
//! empty `save(); restore();` pair leaves no trace in the stream. Popping a
//! frame either writes its summary into the layer's own record (layers) or
//! folds it into the parent frame (plain saves).

use alloc::sync::Arc;
use core::mem;

use kurbo::Rect;

use super::DisplayListBuilder;
use super::paint_result::{self, PaintResult};
use crate::color::DlBlendMode;
use crate::effects::DlImageFilter;
use crate::flags::DisplayListOpFlags;
use crate::geometry;
use crate::op::{DlClipOp, DlOp, DlOpType, SaveLayerOptions};
use crate::paint::DlPaint;
use crate::trace::{OpSkippedEvent, RestoreEvent, SaveEvent, SkipReason};

/// Where a frame's save record stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum SaveRecord {
    /// Nothing to open or close (the root, or a save whose record could not
    /// be written).
    Implicit,
    /// A plain save with nothing recorded inside it yet.
    Deferred,
    /// Written at this byte offset; a restore record will close it.
    Opened(usize),
}

/// Group-opacity bookkeeping for one frame.
///
/// One compatible op can take an inherited opacity. A second one might
/// overlap the first and blend twice, so it makes the frame incompatible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) enum OpacityState {
    #[default]
    Empty,
    One,
    Incompatible,
}

impl OpacityState {
    pub(super) fn add_compatible_op(&mut self) {
        *self = match self {
            Self::Empty => Self::One,
            Self::One | Self::Incompatible => Self::Incompatible,
        };
    }

    pub(super) fn mark_incompatible(&mut self) {
        *self = Self::Incompatible;
    }

    pub(super) fn update(&mut self, compatible: bool) {
        if compatible {
            self.add_compatible_op();
        } else {
            self.mark_incompatible();
        }
    }

    pub(super) fn is_compatible(self) -> bool {
        self != Self::Incompatible
    }
}

/// One entry of the save stack.
#[derive(Clone, Debug)]
pub(super) struct LayerFrame {
    pub(super) save: SaveRecord,
    pub(super) is_layer: bool,
    pub(super) opacity: OpacityState,
    /// Image filter the layer applies when it is composited.
    pub(super) filter: Option<Arc<dyn DlImageFilter>>,
    /// Nothing inside can be visible; every call is dropped.
    pub(super) is_nop: bool,
    /// A clip was recorded in this frame or an enclosing one.
    pub(super) has_valid_clip: bool,
    pub(super) max_blend_mode: DlBlendMode,
    pub(super) contains_backdrop_filter: bool,
    /// Some op could turn transparent pixels non-transparent.
    pub(super) affects_transparent_layer: bool,
}

impl LayerFrame {
    pub(super) fn root() -> Self {
        Self {
            save: SaveRecord::Implicit,
            is_layer: false,
            opacity: OpacityState::Empty,
            filter: None,
            is_nop: false,
            has_valid_clip: false,
            max_blend_mode: DlBlendMode::Clear,
            contains_backdrop_filter: false,
            affects_transparent_layer: false,
        }
    }

    /// A plain save nested in `parent`.
    fn nested_in(parent: &Self) -> Self {
        Self {
            save: SaveRecord::Deferred,
            is_nop: parent.is_nop,
            has_valid_clip: parent.has_valid_clip,
            ..Self::root()
        }
    }

    pub(super) fn update_result(&mut self, result: PaintResult, mode: DlBlendMode) {
        if result == PaintResult::AffectsAll {
            self.affects_transparent_layer = true;
        }
        self.max_blend_mode = self.max_blend_mode.max(mode);
    }
}

impl DisplayListBuilder {
    /// Writes the current frame's deferred `Save` record, if it has one.
    pub(super) fn check_for_deferred_save(&mut self) {
        if self.current_layer.save != SaveRecord::Deferred {
            return;
        }
        if let Some(offset) = self.push_op(&DlOp::Save { restore_index: 0 }) {
            self.current_layer.save = SaveRecord::Opened(offset);
        }
    }

    fn push_frame(&mut self, frame: LayerFrame) {
        let parent = mem::replace(&mut self.current_layer, frame);
        self.layers.push(parent);
        self.tracker.save();
        self.accumulator.save();
    }

    fn trace_save(&mut self) {
        let e = SaveEvent {
            depth: self.save_count(),
            is_layer: self.current_layer.is_layer,
            is_nop: self.current_layer.is_nop,
        };
        self.tracer().save(&e);
    }

    /// Saves the transform and clip.
    ///
    /// No record is written until something is recorded before the matching
    /// [`restore`](Self::restore).
    pub fn save(&mut self) {
        let frame = LayerFrame::nested_in(&self.current_layer);
        self.push_frame(frame);
        self.trace_save();
    }

    /// Opens an offscreen layer, composited with `paint` on restore.
    ///
    /// `bounds` is a local-space hint that also clips the layer's content.
    /// `backdrop` filters what is already drawn under the layer before the
    /// content is drawn on top.
    pub fn save_layer(
        &mut self,
        bounds: Option<&Rect>,
        paint: Option<&DlPaint>,
        backdrop: Option<&Arc<dyn DlImageFilter>>,
    ) {
        if let Some(paint) = paint {
            self.set_attributes_from_paint(paint, DisplayListOpFlags::SAVE_LAYER_WITH_PAINT);
        }
        self.save_layer_with_attributes(bounds, paint.is_some(), backdrop);
    }

    /// Opens an offscreen layer composited with the current attributes if
    /// `renders_with_attributes` is set, or plainly otherwise.
    pub fn save_layer_with_attributes(
        &mut self,
        bounds: Option<&Rect>,
        renders_with_attributes: bool,
        backdrop: Option<&Arc<dyn DlImageFilter>>,
    ) {
        let bounds = bounds.filter(|b| geometry::is_finite(b)).copied();
        let flags = if renders_with_attributes {
            DisplayListOpFlags::SAVE_LAYER_WITH_PAINT
        } else {
            DisplayListOpFlags::SAVE_LAYER
        };
        let result = if self.current_layer.is_nop {
            PaintResult::NoEffect
        } else {
            paint_result::classify(&self.current, flags)
        };
        if result == PaintResult::NoEffect {
            // Keep the stack balanced but drop everything up to the restore.
            let reason = if self.current_layer.is_nop {
                SkipReason::NopLayer
            } else {
                SkipReason::NoEffect
            };
            self.trace_skip(DlOpType::SaveLayer, reason);
            let mut frame = LayerFrame::nested_in(&self.current_layer);
            frame.is_nop = true;
            self.push_frame(frame);
            self.trace_save();
            return;
        }

        let (options, filter, compatible, mode) = if renders_with_attributes {
            let filter = self.current.image_filter.clone();
            // A layer that filters its content cannot pass an opacity on.
            let compatible = self.opacity_compatible(flags) && filter.is_none();
            (
                SaveLayerOptions::RENDERS_WITH_ATTRIBUTES,
                filter,
                compatible,
                self.current.blend_mode,
            )
        } else {
            (SaveLayerOptions::empty(), None, true, DlBlendMode::SrcOver)
        };
        let will_flood = backdrop.is_some()
            || (renders_with_attributes && !paint_result::nops_on_transparency(&self.current));
        self.current_layer.opacity.update(compatible);
        self.current_layer.update_result(result, mode);
        if backdrop.is_some() {
            self.current_layer.contains_backdrop_filter = true;
        }

        self.check_for_deferred_save();
        let index = self.buffer.op_index();
        if will_flood {
            // Tagged with the layer's own index so that culling keeps it.
            self.accumulate_unbounded(index);
        }
        let offset = self.push_op(&DlOp::SaveLayer {
            options,
            restore_index: 0,
            bounds,
            backdrop,
        });

        let has_filter = filter.is_some();
        let mut frame = LayerFrame {
            save: offset.map_or(SaveRecord::Implicit, SaveRecord::Opened),
            is_layer: true,
            filter,
            has_valid_clip: self.current_layer.has_valid_clip && !has_filter,
            ..LayerFrame::root()
        };
        if !compatible {
            frame.opacity.mark_incompatible();
        }
        self.push_frame(frame);

        if has_filter {
            // Content is culled before the filter moves it, so the outer clip
            // does not apply inside.
            self.tracker.reset_cull_rect(bounds.as_ref());
        } else if let Some(bounds) = &bounds {
            self.tracker.clip_rect(bounds, DlClipOp::Intersect, false);
        }
        if self.tracker.is_cull_rect_empty() {
            self.current_layer.is_nop = true;
        }
        self.trace_save();
    }

    /// Restores the transform and clip saved by the matching `save` or
    /// `save_layer`. Does nothing at the root.
    pub fn restore(&mut self) {
        let Some(parent) = self.layers.pop() else {
            return;
        };
        let frame = mem::replace(&mut self.current_layer, parent);

        let mut materialized = false;
        let mut can_distribute_opacity = false;
        let restore_index = self.buffer.op_index();
        if let SaveRecord::Opened(offset) = frame.save {
            self.buffer.update_restore_index(offset, restore_index);
            materialized = self.push_op(&DlOp::Restore).is_some();
            if frame.is_layer && frame.opacity.is_compatible() {
                self.buffer.set_can_distribute_opacity(offset);
                can_distribute_opacity = true;
            }
        }

        self.tracker.restore();
        let mut unbounded = false;
        if let Some(filter) = &frame.filter {
            let matrix = *self.tracker.matrix();
            let clip = self.tracker.device_cull_rect();
            let mapped = self.accumulator.restore_with(
                &mut |r: Rect| filter.map_device_bounds(&r.expand(), &matrix),
                Some(clip),
            );
            if !mapped {
                unbounded = true;
                self.accumulate_unbounded(restore_index);
            }
        } else {
            self.accumulator.restore();
        }

        if !frame.is_layer {
            let current = &mut self.current_layer;
            // Nothing isolated the plain save's content from the parent.
            match frame.opacity {
                OpacityState::Empty => {}
                OpacityState::One => current.opacity.add_compatible_op(),
                OpacityState::Incompatible => current.opacity.mark_incompatible(),
            }
            current.max_blend_mode = current.max_blend_mode.max(frame.max_blend_mode);
            current.contains_backdrop_filter |= frame.contains_backdrop_filter;
            current.affects_transparent_layer |= frame.affects_transparent_layer;
        }

        let e = RestoreEvent {
            depth: self.save_count(),
            materialized,
            has_layer: frame.is_layer,
            can_distribute_opacity,
            unbounded,
        };
        self.tracer().restore(&e);
    }

    /// Restores until at most `count` saves remain open (the root counts as
    /// one).
    pub fn restore_to_count(&mut self, count: usize) {
        let target = count.max(1);
        while self.save_count() > target {
            self.restore();
        }
    }

    pub(super) fn trace_skip(&mut self, kind: DlOpType, reason: SkipReason) {
        self.tracer().op_skipped(&OpSkippedEvent { kind, reason });
    }
}
