// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute setters.
//!
//! Each setter records one attribute op, and only when the value differs
//! from what was last recorded. Attribute ops never open a deferred save:
//! they change no pixels, so a save that only saw attribute changes stays
//! elided.

use alloc::sync::Arc;

use super::DisplayListBuilder;
use crate::color::{DlBlendMode, DlColor};
use crate::effects::{DlColorFilter, DlColorSource, DlImageFilter, DlPathEffect};
use crate::flags::DisplayListAttributeFlags;
use crate::op::{DlOp, DlOpType};
use crate::paint::{DlBlurMaskFilter, DlDrawStyle, DlPaint, DlStrokeCap, DlStrokeJoin, same_arc};
use crate::trace::SkipReason;

impl DisplayListBuilder {
    /// Sets edge anti-aliasing.
    pub fn set_anti_alias(&mut self, anti_alias: bool) {
        if self.current.anti_alias != anti_alias {
            self.current.anti_alias = anti_alias;
            self.push_op(&DlOp::SetAntiAlias(anti_alias));
        }
    }

    /// Sets dithering.
    pub fn set_dither(&mut self, dither: bool) {
        if self.current.dither != dither {
            self.current.dither = dither;
            self.push_op(&DlOp::SetDither(dither));
        }
    }

    /// Sets color inversion, applied after the color filter.
    pub fn set_invert_colors(&mut self, invert: bool) {
        if self.current.invert_colors != invert {
            self.current.invert_colors = invert;
            self.push_op(&DlOp::SetInvertColors(invert));
        }
    }

    /// Sets the stroke cap.
    pub fn set_stroke_cap(&mut self, cap: DlStrokeCap) {
        if self.current.stroke_cap != cap {
            self.current.stroke_cap = cap;
            self.push_op(&DlOp::SetStrokeCap(cap));
        }
    }

    /// Sets the stroke join.
    pub fn set_stroke_join(&mut self, join: DlStrokeJoin) {
        if self.current.stroke_join != join {
            self.current.stroke_join = join;
            self.push_op(&DlOp::SetStrokeJoin(join));
        }
    }

    /// Sets fill or stroke.
    pub fn set_draw_style(&mut self, style: DlDrawStyle) {
        if self.current.draw_style != style {
            self.current.draw_style = style;
            self.push_op(&DlOp::SetStyle(style));
        }
    }

    /// Sets the stroke width; 0 draws hairlines. Non-finite widths are
    /// dropped.
    pub fn set_stroke_width(&mut self, width: f64) {
        if !width.is_finite() {
            self.trace_skip(DlOpType::SetStrokeWidth, SkipReason::InvalidInput);
        } else if self.current.stroke_width != width {
            self.current.stroke_width = width;
            self.push_op(&DlOp::SetStrokeWidth(width));
        }
    }

    /// Sets the miter limit. Non-finite limits are dropped.
    pub fn set_stroke_miter(&mut self, limit: f64) {
        if !limit.is_finite() {
            self.trace_skip(DlOpType::SetStrokeMiter, SkipReason::InvalidInput);
        } else if self.current.stroke_miter != limit {
            self.current.stroke_miter = limit;
            self.push_op(&DlOp::SetStrokeMiter(limit));
        }
    }

    /// Sets the paint color.
    pub fn set_color(&mut self, color: DlColor) {
        if self.current.color != color {
            self.current.color = color;
            self.push_op(&DlOp::SetColor(color));
        }
    }

    /// Sets the blend mode.
    pub fn set_blend_mode(&mut self, mode: DlBlendMode) {
        if self.current.blend_mode != mode {
            self.current.blend_mode = mode;
            self.push_op(&DlOp::SetBlendMode(mode));
        }
    }

    /// Sets or clears the color source.
    pub fn set_color_source(&mut self, source: Option<&Arc<dyn DlColorSource>>) {
        if same_arc(self.current.color_source.as_ref(), source) {
            return;
        }
        if let Some(source) = source {
            self.is_ui_thread_safe &= source.is_ui_thread_safe();
        }
        self.current.color_source = source.cloned();
        self.push_op(&DlOp::SetColorSource(source));
    }

    /// Sets or clears the color filter.
    pub fn set_color_filter(&mut self, filter: Option<&Arc<dyn DlColorFilter>>) {
        if same_arc(self.current.color_filter.as_ref(), filter) {
            return;
        }
        self.current.color_filter = filter.cloned();
        self.push_op(&DlOp::SetColorFilter(filter));
    }

    /// Sets or clears the image filter.
    pub fn set_image_filter(&mut self, filter: Option<&Arc<dyn DlImageFilter>>) {
        if same_arc(self.current.image_filter.as_ref(), filter) {
            return;
        }
        self.current.image_filter = filter.cloned();
        self.push_op(&DlOp::SetImageFilter(filter));
    }

    /// Sets or clears the path effect.
    pub fn set_path_effect(&mut self, effect: Option<&Arc<dyn DlPathEffect>>) {
        if same_arc(self.current.path_effect.as_ref(), effect) {
            return;
        }
        self.current.path_effect = effect.cloned();
        self.push_op(&DlOp::SetPathEffect(effect));
    }

    /// Sets or clears the mask filter.
    pub fn set_mask_filter(&mut self, filter: Option<DlBlurMaskFilter>) {
        if self.current.mask_filter != filter {
            self.current.mask_filter = filter;
            self.push_op(&DlOp::SetMaskFilter(filter));
        }
    }

    /// Brings every attribute an op with `flags` consults in line with
    /// `paint`. Attributes the op ignores keep their current value.
    pub(super) fn set_attributes_from_paint(
        &mut self,
        paint: &DlPaint,
        flags: DisplayListAttributeFlags,
    ) {
        if flags.ignores_paint() {
            return;
        }
        if flags.applies_anti_alias() {
            self.set_anti_alias(paint.anti_alias);
        }
        if flags.applies_dither() {
            self.set_dither(paint.dither);
        }
        if flags.applies_alpha() {
            self.set_color(paint.color);
        }
        if flags.applies_blend() {
            self.set_blend_mode(paint.blend_mode);
        }
        if flags.applies_style() {
            self.set_draw_style(paint.draw_style);
        }
        if flags.is_stroked(paint.draw_style) {
            self.set_stroke_width(paint.stroke_width);
            self.set_stroke_miter(paint.stroke_miter);
            self.set_stroke_cap(paint.stroke_cap);
            self.set_stroke_join(paint.stroke_join);
        }
        if flags.applies_shader() {
            self.set_color_source(paint.color_source.as_ref());
        }
        if flags.applies_color_filter() {
            self.set_invert_colors(paint.invert_colors);
            self.set_color_filter(paint.color_filter.as_ref());
        }
        if flags.applies_image_filter() {
            self.set_image_filter(paint.image_filter.as_ref());
        }
        if flags.applies_path_effect() {
            self.set_path_effect(paint.path_effect.as_ref());
        }
        if flags.applies_mask_filter() {
            self.set_mask_filter(paint.mask_filter);
        }
    }
}
