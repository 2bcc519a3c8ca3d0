// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transform and clip calls.
//!
//! Non-finite arguments and identity transforms are dropped without
//! touching any state. Valid calls always update the tracker, so queries
//! stay exact, but nothing is recorded inside a frame that cannot be
//! visible. A clip that empties the clip region is not recorded either: it
//! turns the frame into a no-op frame instead.

use kurbo::{Affine, Rect, RoundedRect};

use super::DisplayListBuilder;
use crate::geometry;
use crate::op::{DlClipOp, DlOp, DlOpType};
use crate::path::{self, DlPath};
use crate::trace::SkipReason;
use crate::transform::DlMatrix;

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

fn rrect_is_finite(rrect: &RoundedRect) -> bool {
    let r = rrect.radii();
    geometry::is_finite(&rrect.rect())
        && all_finite(&[r.top_left, r.top_right, r.bottom_right, r.bottom_left])
}

/// The clip op an inverse-filled shape turns `op` into.
fn effective_clip_op(op: DlClipOp, inverse: bool) -> DlClipOp {
    match (op, inverse) {
        (op, false) => op,
        (DlClipOp::Intersect, true) => DlClipOp::Difference,
        (DlClipOp::Difference, true) => DlClipOp::Intersect,
    }
}

impl DisplayListBuilder {
    /// Records a transform op unless the frame is a no-op frame.
    fn record_transform(&mut self, op: &DlOp<'_>) {
        if self.current_layer.is_nop {
            self.trace_skip(op.op_type(), SkipReason::NopLayer);
            return;
        }
        self.check_for_deferred_save();
        self.push_op(op);
    }

    // -- transforms ---------------------------------------------------------

    /// Translates the coordinate space.
    pub fn translate(&mut self, tx: f64, ty: f64) {
        if !all_finite(&[tx, ty]) {
            self.trace_skip(DlOpType::Translate, SkipReason::InvalidInput);
        } else if tx == 0.0 && ty == 0.0 {
            self.trace_skip(DlOpType::Translate, SkipReason::Degenerate);
        } else {
            self.record_transform(&DlOp::Translate { tx, ty });
            self.tracker.translate(tx, ty);
        }
    }

    /// Scales the coordinate space.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        if !all_finite(&[sx, sy]) {
            self.trace_skip(DlOpType::Scale, SkipReason::InvalidInput);
        } else if sx == 1.0 && sy == 1.0 {
            self.trace_skip(DlOpType::Scale, SkipReason::Degenerate);
        } else {
            self.record_transform(&DlOp::Scale { sx, sy });
            self.tracker.scale(sx, sy);
        }
    }

    /// Rotates the coordinate space clockwise by `degrees`.
    pub fn rotate(&mut self, degrees: f64) {
        if !degrees.is_finite() {
            self.trace_skip(DlOpType::Rotate, SkipReason::InvalidInput);
        } else if degrees % 360.0 == 0.0 {
            self.trace_skip(DlOpType::Rotate, SkipReason::Degenerate);
        } else {
            self.record_transform(&DlOp::Rotate { degrees });
            self.tracker.rotate(degrees);
        }
    }

    /// Skews the coordinate space.
    pub fn skew(&mut self, sx: f64, sy: f64) {
        if !all_finite(&[sx, sy]) {
            self.trace_skip(DlOpType::Skew, SkipReason::InvalidInput);
        } else if sx == 0.0 && sy == 0.0 {
            self.trace_skip(DlOpType::Skew, SkipReason::Degenerate);
        } else {
            self.record_transform(&DlOp::Skew { sx, sy });
            self.tracker.skew(sx, sy);
        }
    }

    /// Pre-concatenates `x' = mxx*x + mxy*y + mxt`, `y' = myx*x + myy*y + myt`.
    ///
    /// A pure translation is recorded as a translate op.
    pub fn transform_2d_affine(
        &mut self,
        mxx: f64,
        mxy: f64,
        mxt: f64,
        myx: f64,
        myy: f64,
        myt: f64,
    ) {
        if !all_finite(&[mxx, mxy, mxt, myx, myy, myt]) {
            self.trace_skip(DlOpType::Transform2DAffine, SkipReason::InvalidInput);
        } else if mxx == 1.0 && mxy == 0.0 && myx == 0.0 && myy == 1.0 {
            self.translate(mxt, myt);
        } else {
            self.record_transform(&DlOp::Transform2DAffine([mxx, mxy, mxt, myx, myy, myt]));
            self.tracker.transform_2d_affine(mxx, mxy, mxt, myx, myy, myt);
        }
    }

    /// Pre-concatenates a 4×4 transform given in row-major order.
    ///
    /// A matrix whose `z` row and column and perspective row are trivial is
    /// recorded as a 2-D affine.
    pub fn transform_full_perspective(&mut self, m: &[f64; 16]) {
        if !all_finite(m) {
            self.trace_skip(DlOpType::TransformFullPerspective, SkipReason::InvalidInput);
        } else if m[2] == 0.0
            && m[6] == 0.0
            && m[8..12] == [0.0, 0.0, 1.0, 0.0]
            && m[12..16] == [0.0, 0.0, 0.0, 1.0]
        {
            self.transform_2d_affine(m[0], m[1], m[3], m[4], m[5], m[7]);
        } else {
            self.record_transform(&DlOp::TransformFullPerspective(*m));
            self.tracker.transform_full_perspective(m);
        }
    }

    /// Resets the transform to identity.
    pub fn transform_reset(&mut self) {
        self.record_transform(&DlOp::TransformReset);
        self.tracker.set_identity();
    }

    /// Pre-concatenates a kurbo affine.
    pub fn transform(&mut self, affine: &Affine) {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        self.transform_2d_affine(a, c, e, b, d, f);
    }

    /// Pre-concatenates a 4×4 matrix.
    pub fn transform_matrix(&mut self, m: &DlMatrix) {
        self.transform_full_perspective(&m.to_row_major());
    }

    /// Replaces the transform with `m`.
    pub fn set_transform(&mut self, m: &DlMatrix) {
        self.transform_reset();
        self.transform_matrix(m);
    }

    // -- clips --------------------------------------------------------------

    /// Records a clip op once the tracker has applied it.
    fn record_clip(&mut self, op: &DlOp<'_>) {
        if self.current_layer.is_nop {
            self.trace_skip(op.op_type(), SkipReason::NopLayer);
            return;
        }
        if self.tracker.is_cull_rect_empty() {
            self.current_layer.is_nop = true;
            self.trace_skip(op.op_type(), SkipReason::Culled);
            return;
        }
        self.current_layer.has_valid_clip = true;
        self.check_for_deferred_save();
        self.push_op(op);
    }

    /// Clips to a rect.
    pub fn clip_rect(&mut self, rect: &Rect, op: DlClipOp, is_aa: bool) {
        let clip = DlOp::ClipRect {
            op,
            rect: *rect,
            is_aa,
        };
        if !geometry::is_finite(rect) {
            self.trace_skip(clip.op_type(), SkipReason::InvalidInput);
            return;
        }
        let cull = self.tracker.device_cull_rect();
        if op == DlClipOp::Intersect
            && self.current_layer.has_valid_clip
            && self.tracker.matrix().rect_stays_rect()
            && self
                .tracker
                .matrix()
                .map_rect(rect)
                .is_some_and(|device| geometry::contains(&device, &cull))
        {
            // Already inside the clip.
            self.trace_skip(clip.op_type(), SkipReason::Degenerate);
            return;
        }
        self.tracker.clip_rect(rect, op, is_aa);
        self.record_clip(&clip);
    }

    /// Clips to the oval inscribed in `bounds`.
    pub fn clip_oval(&mut self, bounds: &Rect, op: DlClipOp, is_aa: bool) {
        let clip = DlOp::ClipOval {
            op,
            bounds: *bounds,
            is_aa,
        };
        if !geometry::is_finite(bounds) {
            self.trace_skip(clip.op_type(), SkipReason::InvalidInput);
            return;
        }
        self.tracker.clip_oval(bounds, op, is_aa);
        self.record_clip(&clip);
    }

    /// Clips to a rounded rect. Rect- and circle-shaped ones are recorded as
    /// rect and oval clips.
    pub fn clip_rrect(&mut self, rrect: &RoundedRect, op: DlClipOp, is_aa: bool) {
        if !rrect_is_finite(rrect) {
            self.trace_skip(DlOpType::ClipIntersectRRect, SkipReason::InvalidInput);
        } else if path::rrect_is_rect(rrect) {
            self.clip_rect(&rrect.rect(), op, is_aa);
        } else if path::rrect_is_oval(rrect) {
            self.clip_oval(&rrect.rect(), op, is_aa);
        } else {
            self.tracker.clip_rrect(rrect, op, is_aa);
            self.record_clip(&DlOp::ClipRRect {
                op,
                rrect: *rrect,
                is_aa,
            });
        }
    }

    /// Clips to a path. Paths that trace a rect, oval or rounded rect are
    /// recorded as the matching shape clip.
    pub fn clip_path(&mut self, path: &DlPath, op: DlClipOp, is_aa: bool) {
        let inverse = path.fill_type().is_inverse();
        let shape_op = effective_clip_op(op, inverse);
        if let Some(rect) = path.as_rect() {
            self.clip_rect(&rect, shape_op, is_aa);
        } else if let Some(bounds) = path.as_oval() {
            self.clip_oval(&bounds, shape_op, is_aa);
        } else if let Some(rrect) = path.as_rounded_rect() {
            self.clip_rrect(&rrect, shape_op, is_aa);
        } else if !geometry::is_finite(&path.bounds()) {
            self.trace_skip(DlOpType::ClipIntersectPath, SkipReason::InvalidInput);
        } else {
            self.tracker.clip_path(path, op, is_aa);
            self.record_clip(&DlOp::ClipPath { op, path, is_aa });
        }
    }
}
