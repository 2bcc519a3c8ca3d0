// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw calls.
//!
//! Every draw goes through the same pipeline:
//!
//! 1. Drop it inside a no-op frame, or if the current paint makes it
//!    invisible ([`PaintResult::NoEffect`]).
//! 2. Bound it: outset the local geometry for stroke, mask blur, and image
//!    filter, map it to device space, and intersect with the clip. Ops the
//!    paint cannot bound flood the clip instead.
//! 3. Write the enclosing deferred save, record the op, and accumulate its
//!    device bounds under its op index.
//! 4. Update the frame's group-opacity and blend bookkeeping.
//!
//! The `*_with_paint` variants first bring the attribute state in line with
//! the given paint, then run the ambient variant.

use alloc::borrow::Cow;
use alloc::sync::Arc;
use core::f64::consts::SQRT_2;

use kurbo::{Point, Rect, RoundedRect, Vec2};

use super::paint_result::{self, PaintResult};
use super::{DeviceBounds, DisplayListBuilder};
use crate::color::{DlBlendMode, DlColor};
use crate::display_list::DisplayList;
use crate::flags::{DisplayListAttributeFlags, DisplayListOpFlags, SpecialGeometryFlags};
use crate::geometry::{self, DlRSTransform};
use crate::op::{DlOp, DlOpType, DlPointMode};
use crate::paint::{DlPaint, DlStrokeCap, DlStrokeJoin};
use crate::path::{self, DlPath};
use crate::resource::{DlFilterMode, DlImage, DlImageSampling, DlSrcRectConstraint, DlTextBlob};
use crate::trace::SkipReason;
use crate::vertices::DlVertices;

/// Smallest stroke half-width used for bounds, so hairlines still cover a
/// sliver.
const MIN_STROKE_RADIUS: f64 = 0.01;

/// Nested lists drawn at or below this opacity are dropped.
const OPACITY_NEARLY_ZERO: f64 = 1.0 / 4096.0;

/// Height of the shadow light above the canvas.
const LIGHT_HEIGHT: f64 = 600.0;

/// Radius of the shadow light, in logical pixels.
const LIGHT_RADIUS: f64 = 800.0;

/// Local bounds of a shadow cast by `path` at `elevation`.
fn shadow_bounds(path: &DlPath, elevation: f64, dpr: f64) -> Rect {
    let bounds = path.bounds();
    let elevation = elevation.max(0.0);
    let outset = |extent: f64| elevation * (LIGHT_RADIUS * dpr + extent * 0.5) / LIGHT_HEIGHT;
    bounds.inflate(outset(bounds.width()), outset(bounds.height()))
}

/// Reversed or NaN rects describe no geometry. Zero-area ones still might,
/// once stroked.
fn is_inverted(r: &Rect) -> bool {
    !(r.x0 <= r.x1 && r.y0 <= r.y1)
}

impl DisplayListBuilder {
    // -- pipeline -----------------------------------------------------------

    /// `local` outset for everything the current paint draws beyond the
    /// geometry, or `None` if the paint cannot bound it.
    fn adjust_bounds_for_paint(
        &self,
        local: Rect,
        flags: DisplayListAttributeFlags,
    ) -> Option<Rect> {
        if flags.ignores_paint() {
            return Some(local);
        }
        let paint = &self.current;
        let mut bounds = local;
        if flags.is_geometric() {
            let is_stroked = flags.is_stroked(paint.draw_style);
            let special = flags.with_path_effect(paint.path_effect.as_deref(), is_stroked);
            if flags.applies_path_effect()
                && let Some(effect) = &paint.path_effect
            {
                bounds = effect.effect_bounds(&bounds)?;
            }
            if is_stroked {
                let mut multiplier = 1.0_f64;
                if paint.stroke_join == DlStrokeJoin::Miter
                    && special.contains(SpecialGeometryFlags::ACUTE_JOINS)
                {
                    multiplier = multiplier.max(paint.stroke_miter);
                }
                if paint.stroke_cap == DlStrokeCap::Square
                    && special.contains(SpecialGeometryFlags::DIAGONAL_CAPS)
                {
                    multiplier = multiplier.max(SQRT_2);
                }
                let pad = (paint.stroke_width * 0.5).max(MIN_STROKE_RADIUS) * multiplier;
                bounds = bounds.inflate(pad, pad);
            }
        }
        if flags.applies_mask_filter()
            && let Some(mask) = paint.mask_filter
        {
            let pad = mask.sigma * 3.0;
            bounds = bounds.inflate(pad, pad);
        }
        if flags.applies_image_filter()
            && let Some(filter) = &paint.image_filter
        {
            bounds = filter.map_local_bounds(&bounds)?;
        }
        Some(bounds)
    }

    /// Device bounds of a draw with local geometry `local`, or `None` if
    /// nothing of it can be seen. Flood ops and draws without local geometry
    /// cover the whole clip.
    fn visible_bounds(
        &mut self,
        kind: DlOpType,
        local: Option<Rect>,
        flags: DisplayListAttributeFlags,
    ) -> Option<DeviceBounds> {
        let local = local.filter(|_| !flags.is_flood());
        let device = match local {
            None => None,
            Some(r) if is_inverted(&r) => {
                self.trace_skip(kind, SkipReason::Degenerate);
                return None;
            }
            Some(r) => match self.adjust_bounds_for_paint(r, flags) {
                None => None,
                Some(r) if geometry::is_empty(&r) => {
                    self.trace_skip(kind, SkipReason::Degenerate);
                    return None;
                }
                Some(r) => self.tracker.matrix().map_rect(&r),
            },
        };
        let clip = self.tracker.device_cull_rect();
        let bounds = match device {
            Some(device) => geometry::intersect(&device, &clip).map(|rect| DeviceBounds {
                rect,
                unbounded: false,
            }),
            None if geometry::is_empty(&clip) => None,
            None => Some(DeviceBounds {
                rect: clip,
                unbounded: true,
            }),
        };
        if bounds.is_none() {
            self.trace_skip(kind, SkipReason::Culled);
        }
        bounds
    }

    /// Runs the visibility checks for an op about to be recorded.
    fn begin_draw(
        &mut self,
        kind: DlOpType,
        local: Option<Rect>,
        flags: DisplayListAttributeFlags,
        result: PaintResult,
    ) -> Option<DeviceBounds> {
        if self.current_layer.is_nop {
            self.trace_skip(kind, SkipReason::NopLayer);
            return None;
        }
        if result == PaintResult::NoEffect {
            self.trace_skip(kind, SkipReason::NoEffect);
            return None;
        }
        self.visible_bounds(kind, local, flags)
    }

    /// Records a visible op and updates the frame bookkeeping. Accumulates
    /// `bounds` when given; otherwise the caller accumulates under the
    /// returned op index.
    fn commit_draw(
        &mut self,
        op: &DlOp<'_>,
        bounds: Option<DeviceBounds>,
        result: PaintResult,
        mode: DlBlendMode,
        compatible: bool,
    ) -> Option<u32> {
        self.check_for_deferred_save();
        let index = self.buffer.op_index();
        self.push_op(op)?;
        if let Some(bounds) = bounds {
            self.is_unbounded |= bounds.unbounded;
            self.accumulate(bounds.rect, index);
        }
        self.current_layer.opacity.update(compatible);
        self.current_layer.update_result(result, mode);
        Some(index)
    }

    /// Records `op`, drawn with the current attributes under `flags`.
    ///
    /// Returns whether it was recorded.
    fn draw_with_attributes(
        &mut self,
        op: &DlOp<'_>,
        local: Option<Rect>,
        flags: DisplayListAttributeFlags,
        compatible: bool,
    ) -> bool {
        let result = paint_result::classify(&self.current, flags);
        let mode = if flags.applies_blend() {
            self.current.blend_mode
        } else {
            DlBlendMode::SrcOver
        };
        let Some(bounds) = self.begin_draw(op.op_type(), local, flags, result) else {
            return false;
        };
        self.commit_draw(op, Some(bounds), result, mode, compatible)
            .is_some()
    }

    /// Opacity compatibility of geometry drawn with the current attributes.
    fn geometry_compatible(&self, flags: DisplayListAttributeFlags) -> bool {
        let hairline =
            flags.is_stroked(self.current.draw_style) && self.current.stroke_width == 0.0;
        !hairline && self.opacity_compatible(flags)
    }

    fn draw_geometry(
        &mut self,
        op: &DlOp<'_>,
        local: Option<Rect>,
        flags: DisplayListAttributeFlags,
    ) {
        let compatible = self.geometry_compatible(flags);
        self.draw_with_attributes(op, local, flags, compatible);
    }

    // -- floods -------------------------------------------------------------

    /// Fills the whole clip with the current attributes.
    pub fn draw_paint(&mut self) {
        let flags = DisplayListOpFlags::DRAW_PAINT;
        let compatible = self.opacity_compatible(flags);
        self.draw_with_attributes(&DlOp::DrawPaint, None, flags, compatible);
    }

    /// Fills the whole clip with `paint`.
    pub fn draw_paint_with_paint(&mut self, paint: &DlPaint) {
        self.set_attributes_from_paint(paint, DisplayListOpFlags::DRAW_PAINT);
        self.draw_paint();
    }

    /// Fills the whole clip with `color` blended by `mode`, ignoring the
    /// current attributes.
    pub fn draw_color(&mut self, color: DlColor, mode: DlBlendMode) {
        let op = DlOp::DrawColor { color, mode };
        let paint = DlPaint::from_color(color).with_blend_mode(mode);
        let result = paint_result::classify(&paint, DisplayListOpFlags::DRAW_PAINT);
        let flags = DisplayListOpFlags::DRAW_COLOR;
        let Some(bounds) = self.begin_draw(op.op_type(), None, flags, result) else {
            return;
        };
        self.commit_draw(
            &op,
            Some(bounds),
            result,
            mode,
            mode.is_opacity_compatible(),
        );
    }

    // -- geometry -----------------------------------------------------------

    /// Draws a line segment; always stroked.
    pub fn draw_line(&mut self, p0: Point, p1: Point) {
        let flags = line_flags(p0, p1);
        if !(p0.is_finite() && p1.is_finite()) {
            self.trace_skip(DlOpType::DrawLine, SkipReason::InvalidInput);
            return;
        }
        self.draw_geometry(
            &DlOp::DrawLine { p0, p1 },
            Some(Rect::from_points(p0, p1)),
            flags,
        );
    }

    /// Draws a line segment with `paint`.
    pub fn draw_line_with_paint(&mut self, p0: Point, p1: Point, paint: &DlPaint) {
        self.set_attributes_from_paint(paint, line_flags(p0, p1));
        self.draw_line(p0, p1);
    }

    /// Draws a rect.
    pub fn draw_rect(&mut self, rect: &Rect) {
        if !geometry::is_finite(rect) {
            self.trace_skip(DlOpType::DrawRect, SkipReason::InvalidInput);
            return;
        }
        self.draw_geometry(
            &DlOp::DrawRect(*rect),
            Some(*rect),
            DisplayListOpFlags::DRAW_RECT,
        );
    }

    /// Draws a rect with `paint`.
    pub fn draw_rect_with_paint(&mut self, rect: &Rect, paint: &DlPaint) {
        self.set_attributes_from_paint(paint, DisplayListOpFlags::DRAW_RECT);
        self.draw_rect(rect);
    }

    /// Draws the oval inscribed in `bounds`.
    pub fn draw_oval(&mut self, bounds: &Rect) {
        if !geometry::is_finite(bounds) {
            self.trace_skip(DlOpType::DrawOval, SkipReason::InvalidInput);
            return;
        }
        self.draw_geometry(
            &DlOp::DrawOval(*bounds),
            Some(*bounds),
            DisplayListOpFlags::DRAW_OVAL,
        );
    }

    /// Draws an oval with `paint`.
    pub fn draw_oval_with_paint(&mut self, bounds: &Rect, paint: &DlPaint) {
        self.set_attributes_from_paint(paint, DisplayListOpFlags::DRAW_OVAL);
        self.draw_oval(bounds);
    }

    /// Draws a circle.
    pub fn draw_circle(&mut self, center: Point, radius: f64) {
        if !(center.is_finite() && radius.is_finite() && radius >= 0.0) {
            self.trace_skip(DlOpType::DrawCircle, SkipReason::InvalidInput);
            return;
        }
        let bounds = Rect::from_center_size(center, (radius * 2.0, radius * 2.0));
        self.draw_geometry(
            &DlOp::DrawCircle { center, radius },
            Some(bounds),
            DisplayListOpFlags::DRAW_CIRCLE,
        );
    }

    /// Draws a circle with `paint`.
    pub fn draw_circle_with_paint(&mut self, center: Point, radius: f64, paint: &DlPaint) {
        self.set_attributes_from_paint(paint, DisplayListOpFlags::DRAW_CIRCLE);
        self.draw_circle(center, radius);
    }

    /// Draws a rounded rect. Square-cornered and circular ones are recorded
    /// as rect and oval draws.
    pub fn draw_rrect(&mut self, rrect: &RoundedRect) {
        if path::rrect_is_rect(rrect) {
            self.draw_rect(&rrect.rect());
        } else if path::rrect_is_oval(rrect) {
            self.draw_oval(&rrect.rect());
        } else if !geometry::is_finite(&rrect.rect()) {
            self.trace_skip(DlOpType::DrawRRect, SkipReason::InvalidInput);
        } else {
            self.draw_geometry(
                &DlOp::DrawRRect(*rrect),
                Some(rrect.rect()),
                DisplayListOpFlags::DRAW_RRECT,
            );
        }
    }

    /// Draws a rounded rect with `paint`.
    pub fn draw_rrect_with_paint(&mut self, rrect: &RoundedRect, paint: &DlPaint) {
        self.set_attributes_from_paint(paint, DisplayListOpFlags::DRAW_RRECT);
        self.draw_rrect(rrect);
    }

    /// Draws the area between two rounded rects.
    pub fn draw_drrect(&mut self, outer: &RoundedRect, inner: &RoundedRect) {
        if !(geometry::is_finite(&outer.rect()) && geometry::is_finite(&inner.rect())) {
            self.trace_skip(DlOpType::DrawDRRect, SkipReason::InvalidInput);
            return;
        }
        self.draw_geometry(
            &DlOp::DrawDRRect {
                outer: *outer,
                inner: *inner,
            },
            Some(outer.rect()),
            DisplayListOpFlags::DRAW_DRRECT,
        );
    }

    /// Draws the area between two rounded rects with `paint`.
    pub fn draw_drrect_with_paint(
        &mut self,
        outer: &RoundedRect,
        inner: &RoundedRect,
        paint: &DlPaint,
    ) {
        self.set_attributes_from_paint(paint, DisplayListOpFlags::DRAW_DRRECT);
        self.draw_drrect(outer, inner);
    }

    /// Draws a path. Paths tracing a rect, oval or rounded rect are recorded
    /// as the matching shape draw; inverse-filled paths cover the whole clip.
    pub fn draw_path(&mut self, path: &DlPath) {
        let inverse = path.fill_type().is_inverse();
        if !inverse {
            if let Some(rect) = path.as_rect() {
                self.draw_rect(&rect);
                return;
            }
            if let Some(bounds) = path.as_oval() {
                self.draw_oval(&bounds);
                return;
            }
            if let Some(rrect) = path.as_rounded_rect() {
                self.draw_rrect(&rrect);
                return;
            }
        }
        let bounds = path.bounds();
        if !geometry::is_finite(&bounds) {
            self.trace_skip(DlOpType::DrawPath, SkipReason::InvalidInput);
            return;
        }
        let local = (!inverse).then_some(bounds);
        self.draw_geometry(&DlOp::DrawPath(path), local, DisplayListOpFlags::DRAW_PATH);
    }

    /// Draws a path with `paint`.
    pub fn draw_path_with_paint(&mut self, path: &DlPath, paint: &DlPaint) {
        self.set_attributes_from_paint(paint, DisplayListOpFlags::DRAW_PATH);
        self.draw_path(path);
    }

    /// Draws an arc of the oval inscribed in `bounds`, optionally closed
    /// through the center.
    pub fn draw_arc(
        &mut self,
        bounds: &Rect,
        start_degrees: f64,
        sweep_degrees: f64,
        use_center: bool,
    ) {
        let angles_finite = start_degrees.is_finite() && sweep_degrees.is_finite();
        if !(geometry::is_finite(bounds) && angles_finite) {
            self.trace_skip(DlOpType::DrawArc, SkipReason::InvalidInput);
            return;
        }
        self.draw_geometry(
            &DlOp::DrawArc {
                bounds: *bounds,
                start_degrees,
                sweep_degrees,
                use_center,
            },
            Some(*bounds),
            arc_flags(use_center),
        );
    }

    /// Draws an arc with `paint`.
    pub fn draw_arc_with_paint(
        &mut self,
        bounds: &Rect,
        start_degrees: f64,
        sweep_degrees: f64,
        use_center: bool,
        paint: &DlPaint,
    ) {
        self.set_attributes_from_paint(paint, arc_flags(use_center));
        self.draw_arc(bounds, start_degrees, sweep_degrees, use_center);
    }

    /// Draws points, separate segments, or a polyline.
    ///
    /// Never opacity compatible: neighboring primitives may overlap.
    pub fn draw_points(&mut self, mode: DlPointMode, points: &[Point]) {
        let op = DlOp::DrawPoints {
            mode,
            points: Cow::Borrowed(points),
        };
        if points.iter().any(|p| !p.is_finite()) {
            self.trace_skip(op.op_type(), SkipReason::InvalidInput);
            return;
        }
        let Some(bounds) = geometry::point_bounds(points.iter().copied()) else {
            self.trace_skip(op.op_type(), SkipReason::Degenerate);
            return;
        };
        let flags = DisplayListOpFlags::for_point_mode(mode);
        self.draw_with_attributes(&op, Some(bounds), flags, false);
    }

    /// Draws points with `paint`.
    pub fn draw_points_with_paint(&mut self, mode: DlPointMode, points: &[Point], paint: &DlPaint) {
        self.set_attributes_from_paint(paint, DisplayListOpFlags::for_point_mode(mode));
        self.draw_points(mode, points);
    }

    /// Draws a triangle mesh. `mode` blends per-vertex colors with the color
    /// source.
    pub fn draw_vertices(&mut self, vertices: &DlVertices, mode: DlBlendMode) {
        let flags = DisplayListOpFlags::DRAW_VERTICES;
        // Per-vertex colors may overlap within the mesh.
        let compatible = vertices.colors().is_none() && self.opacity_compatible(flags);
        self.draw_with_attributes(
            &DlOp::DrawVertices {
                vertices: Cow::Borrowed(vertices),
                mode,
            },
            Some(vertices.bounds()),
            flags,
            compatible,
        );
    }

    /// Draws a triangle mesh with `paint`.
    pub fn draw_vertices_with_paint(
        &mut self,
        vertices: &DlVertices,
        mode: DlBlendMode,
        paint: &DlPaint,
    ) {
        self.set_attributes_from_paint(paint, DisplayListOpFlags::DRAW_VERTICES);
        self.draw_vertices(vertices, mode);
    }

    // -- images -------------------------------------------------------------

    fn draw_image_op(
        &mut self,
        op: &DlOp<'_>,
        image: &Arc<dyn DlImage>,
        dst: Rect,
        flags: DisplayListAttributeFlags,
        compatible: bool,
    ) {
        if !geometry::is_finite(&dst) {
            self.trace_skip(op.op_type(), SkipReason::InvalidInput);
            return;
        }
        if self.draw_with_attributes(op, Some(dst), flags, compatible) {
            self.is_ui_thread_safe &= image.is_ui_thread_safe();
        }
    }

    /// Draws `image` with its top-left corner at `point`, composited with the
    /// current attributes if `render_with_attributes` is set.
    pub fn draw_image(
        &mut self,
        image: &Arc<dyn DlImage>,
        point: Point,
        sampling: DlImageSampling,
        render_with_attributes: bool,
    ) {
        let flags = if render_with_attributes {
            DisplayListOpFlags::DRAW_IMAGE_WITH_PAINT
        } else {
            DisplayListOpFlags::DRAW_IMAGE
        };
        let compatible = self.opacity_compatible(flags);
        let dst = image.bounds() + point.to_vec2();
        let op = DlOp::DrawImage {
            image,
            point,
            sampling,
            with_attributes: render_with_attributes,
        };
        self.draw_image_op(&op, image, dst, flags, compatible);
    }

    /// Draws `image` at `point`, with `paint` if given.
    pub fn draw_image_with_paint(
        &mut self,
        image: &Arc<dyn DlImage>,
        point: Point,
        sampling: DlImageSampling,
        paint: Option<&DlPaint>,
    ) {
        if let Some(paint) = paint {
            self.set_attributes_from_paint(paint, DisplayListOpFlags::DRAW_IMAGE_WITH_PAINT);
        }
        self.draw_image(image, point, sampling, paint.is_some());
    }

    /// Draws the `src` part of `image` scaled into `dst`.
    pub fn draw_image_rect(
        &mut self,
        image: &Arc<dyn DlImage>,
        src: &Rect,
        dst: &Rect,
        sampling: DlImageSampling,
        render_with_attributes: bool,
        constraint: DlSrcRectConstraint,
    ) {
        let flags = if render_with_attributes {
            DisplayListOpFlags::DRAW_IMAGE_RECT_WITH_PAINT
        } else {
            DisplayListOpFlags::DRAW_IMAGE_RECT
        };
        let compatible = self.opacity_compatible(flags);
        let op = DlOp::DrawImageRect {
            image,
            src: *src,
            dst: *dst,
            sampling,
            with_attributes: render_with_attributes,
            constraint,
        };
        self.draw_image_op(&op, image, *dst, flags, compatible);
    }

    /// Draws the `src` part of `image` into `dst`, with `paint` if given.
    pub fn draw_image_rect_with_paint(
        &mut self,
        image: &Arc<dyn DlImage>,
        src: &Rect,
        dst: &Rect,
        sampling: DlImageSampling,
        paint: Option<&DlPaint>,
        constraint: DlSrcRectConstraint,
    ) {
        if let Some(paint) = paint {
            self.set_attributes_from_paint(paint, DisplayListOpFlags::DRAW_IMAGE_RECT_WITH_PAINT);
        }
        self.draw_image_rect(image, src, dst, sampling, paint.is_some(), constraint);
    }

    /// Draws `image` as a nine-patch: `center` stretches, the corners keep
    /// their size.
    pub fn draw_image_nine(
        &mut self,
        image: &Arc<dyn DlImage>,
        center: &Rect,
        dst: &Rect,
        filter: DlFilterMode,
        render_with_attributes: bool,
    ) {
        let flags = if render_with_attributes {
            DisplayListOpFlags::DRAW_IMAGE_NINE_WITH_PAINT
        } else {
            DisplayListOpFlags::DRAW_IMAGE_NINE
        };
        let compatible = self.opacity_compatible(flags);
        let op = DlOp::DrawImageNine {
            image,
            center: *center,
            dst: *dst,
            filter,
            with_attributes: render_with_attributes,
        };
        self.draw_image_op(&op, image, *dst, flags, compatible);
    }

    /// Draws a nine-patch, with `paint` if given.
    pub fn draw_image_nine_with_paint(
        &mut self,
        image: &Arc<dyn DlImage>,
        center: &Rect,
        dst: &Rect,
        filter: DlFilterMode,
        paint: Option<&DlPaint>,
    ) {
        if let Some(paint) = paint {
            self.set_attributes_from_paint(paint, DisplayListOpFlags::DRAW_IMAGE_NINE_WITH_PAINT);
        }
        self.draw_image_nine(image, center, dst, filter, paint.is_some());
    }

    /// Draws sprites from `atlas`: sprite `i` is `tex[i]` placed by
    /// `transforms[i]` and, if given, blended with `colors[i]` by `mode`.
    ///
    /// `cull_rect` is a caller hint recorded for playback. Never opacity
    /// compatible: sprites may overlap.
    pub fn draw_atlas(
        &mut self,
        atlas: &Arc<dyn DlImage>,
        transforms: &[DlRSTransform],
        tex: &[Rect],
        colors: Option<&[DlColor]>,
        mode: DlBlendMode,
        sampling: DlImageSampling,
        cull_rect: Option<&Rect>,
        render_with_attributes: bool,
    ) {
        let op = DlOp::DrawAtlas {
            atlas,
            transforms: Cow::Borrowed(transforms),
            tex: Cow::Borrowed(tex),
            colors: colors.map(Cow::Borrowed),
            mode,
            sampling,
            cull_rect: cull_rect.copied(),
            with_attributes: render_with_attributes,
        };
        if transforms.len() != tex.len() || colors.is_some_and(|c| c.len() != tex.len()) {
            self.trace_skip(op.op_type(), SkipReason::InvalidInput);
            return;
        }
        let corners = transforms
            .iter()
            .zip(tex)
            .flat_map(|(xform, sprite)| xform.to_quad(sprite.width(), sprite.height()));
        let Some(bounds) = geometry::point_bounds(corners) else {
            self.trace_skip(op.op_type(), SkipReason::Degenerate);
            return;
        };
        let flags = if render_with_attributes {
            DisplayListOpFlags::DRAW_ATLAS_WITH_PAINT
        } else {
            DisplayListOpFlags::DRAW_ATLAS
        };
        self.draw_image_op(&op, atlas, bounds, flags, false);
    }

    /// Draws sprites from `atlas`, with `paint` if given.
    pub fn draw_atlas_with_paint(
        &mut self,
        atlas: &Arc<dyn DlImage>,
        transforms: &[DlRSTransform],
        tex: &[Rect],
        colors: Option<&[DlColor]>,
        mode: DlBlendMode,
        sampling: DlImageSampling,
        cull_rect: Option<&Rect>,
        paint: Option<&DlPaint>,
    ) {
        if let Some(paint) = paint {
            self.set_attributes_from_paint(paint, DisplayListOpFlags::DRAW_ATLAS_WITH_PAINT);
        }
        self.draw_atlas(
            atlas,
            transforms,
            tex,
            colors,
            mode,
            sampling,
            cull_rect,
            paint.is_some(),
        );
    }

    // -- nested content -----------------------------------------------------

    /// Draws a nested display list at `opacity` (clamped to 1).
    ///
    /// When the nested list carries a spatial index, its individual op
    /// regions are accumulated instead of its overall bounds.
    pub fn draw_display_list(&mut self, display_list: &Arc<DisplayList>, opacity: f64) {
        let kind = DlOpType::DrawDisplayList;
        if !opacity.is_finite() || opacity <= OPACITY_NEARLY_ZERO {
            self.trace_skip(kind, SkipReason::NoEffect);
            return;
        }
        let nested = display_list.as_ref();
        if nested.op_count(false) == 0 || geometry::is_empty(&nested.bounds()) {
            self.trace_skip(kind, SkipReason::Degenerate);
            return;
        }
        let result = if nested.modifies_transparent_black() {
            PaintResult::AffectsAll
        } else {
            PaintResult::PreservesTransparency
        };
        let local = (!nested.is_unbounded()).then(|| nested.bounds());
        let flags = DisplayListOpFlags::DRAW_DISPLAY_LIST;
        let Some(bounds) = self.begin_draw(kind, local, flags, result) else {
            return;
        };
        // Mapped per region under either bounds strategy.
        let regions = nested
            .rtree()
            .filter(|_| !bounds.unbounded)
            .map(|rtree| rtree.search_and_consolidate_rects(&nested.bounds(), false));
        let op = DlOp::DrawDisplayList {
            display_list,
            opacity: opacity.min(1.0),
        };
        let whole = regions.is_none().then_some(bounds);
        let Some(index) = self.commit_draw(
            &op,
            whole,
            result,
            nested.max_root_blend_mode(),
            nested.can_apply_group_opacity(),
        ) else {
            return;
        };
        if let Some(regions) = regions {
            let clip = self.tracker.device_cull_rect();
            for region in regions {
                let device = self
                    .tracker
                    .matrix()
                    .map_rect(&region)
                    .and_then(|device| geometry::intersect(&device, &clip));
                if let Some(device) = device {
                    self.accumulate(device, index);
                }
            }
        }
        self.nested_op_count = self
            .nested_op_count
            .saturating_add(nested.op_count(true).saturating_sub(1));
        self.nested_byte_count = self.nested_byte_count.saturating_add(nested.bytes(true));
        self.is_ui_thread_safe &= nested.is_ui_thread_safe();
        if nested.root_has_backdrop_filter() {
            self.current_layer.contains_backdrop_filter = true;
        }
    }

    /// Draws a text blob with its origin at `(x, y)`.
    ///
    /// Never opacity compatible: glyphs may overlap.
    pub fn draw_text_blob(&mut self, blob: &Arc<dyn DlTextBlob>, x: f64, y: f64) {
        if !(x.is_finite() && y.is_finite()) {
            self.trace_skip(DlOpType::DrawTextBlob, SkipReason::InvalidInput);
            return;
        }
        let bounds = blob.bounds() + Vec2::new(x, y);
        self.draw_with_attributes(
            &DlOp::DrawTextBlob { blob, x, y },
            Some(bounds),
            DisplayListOpFlags::DRAW_TEXT_BLOB,
            false,
        );
    }

    /// Draws a text blob with `paint`.
    pub fn draw_text_blob_with_paint(
        &mut self,
        blob: &Arc<dyn DlTextBlob>,
        x: f64,
        y: f64,
        paint: &DlPaint,
    ) {
        self.set_attributes_from_paint(paint, DisplayListOpFlags::DRAW_TEXT_BLOB);
        self.draw_text_blob(blob, x, y);
    }

    /// Draws the shadow `path` casts at `elevation`, ignoring the current
    /// attributes. `dpr` is the device pixel ratio.
    pub fn draw_shadow(
        &mut self,
        path: &DlPath,
        color: DlColor,
        elevation: f64,
        transparent_occluder: bool,
        dpr: f64,
    ) {
        let op = DlOp::DrawShadow {
            path,
            color,
            elevation,
            transparent_occluder,
            dpr,
        };
        if !(elevation.is_finite() && dpr.is_finite() && geometry::is_finite(&path.bounds())) {
            self.trace_skip(op.op_type(), SkipReason::InvalidInput);
            return;
        }
        let paint = DlPaint::from_color(color);
        let result = paint_result::classify(&paint, DisplayListOpFlags::DRAW_PAINT);
        let local = shadow_bounds(path, elevation, dpr);
        let flags = DisplayListOpFlags::DRAW_SHADOW;
        let Some(bounds) = self.begin_draw(op.op_type(), Some(local), flags, result) else {
            return;
        };
        self.commit_draw(&op, Some(bounds), result, DlBlendMode::SrcOver, false);
    }
}

fn line_flags(p0: Point, p1: Point) -> DisplayListAttributeFlags {
    if p0.x == p1.x || p0.y == p1.y {
        DisplayListOpFlags::DRAW_HV_LINE
    } else {
        DisplayListOpFlags::DRAW_LINE
    }
}

fn arc_flags(use_center: bool) -> DisplayListAttributeFlags {
    if use_center {
        DisplayListOpFlags::DRAW_ARC_WITH_CENTER
    } else {
        DisplayListOpFlags::DRAW_ARC_NO_CENTER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_outset_grows_with_elevation_and_extent() {
        let path = DlPath::rect(Rect::new(0.0, 0.0, 600.0, 0.0));
        let flat = shadow_bounds(&path, 0.0, 1.0);
        assert_eq!(flat, path.bounds(), "no elevation, no shadow outset");
        let raised = shadow_bounds(&path, 6.0, 1.0);
        // x: 6 * (800 + 300) / 600 = 11, y: 6 * 800 / 600 = 8.
        assert_eq!(raised, Rect::new(-11.0, -8.0, 611.0, 8.0));
    }

    #[test]
    fn reversed_rects_are_inverted_but_lines_are_not() {
        assert!(
            is_inverted(&Rect::new(10.0, 10.0, 5.0, 5.0)),
            "left > right"
        );
        assert!(is_inverted(&Rect::new(f64::NAN, 0.0, 1.0, 1.0)), "NaN");
        assert!(!is_inverted(&Rect::new(0.0, 5.0, 10.0, 5.0)), "zero height");
    }

    #[test]
    fn line_flags_follow_direction() {
        let o = Point::ORIGIN;
        assert_eq!(
            line_flags(o, Point::new(10.0, 0.0)),
            DisplayListOpFlags::DRAW_HV_LINE
        );
        assert_eq!(
            line_flags(o, Point::new(0.0, 10.0)),
            DisplayListOpFlags::DRAW_HV_LINE
        );
        assert_eq!(
            line_flags(o, Point::new(10.0, 10.0)),
            DisplayListOpFlags::DRAW_LINE
        );
    }
}
