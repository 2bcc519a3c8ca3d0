// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Current transform and conservative device-space clip bounds.
//!
//! The tracker never stores clip shapes, only the device-space rectangle
//! that still receives content. Intersecting clips shrink it to the mapped
//! bounds of the clip shape. Difference clips only shrink it when a mapped
//! rectangle covers a whole edge span; everything else leaves it unchanged,
//! which can only make the rectangle larger than the true clip, never
//! smaller.

use alloc::vec::Vec;

use kurbo::{Affine, Rect, RoundedRect};

use crate::geometry::{self, MAX_CULL_RECT};
use crate::op::DlClipOp;
use crate::path::{self, DlPath};
use crate::transform::DlMatrix;

#[derive(Clone, Copy, Debug, PartialEq)]
struct State {
    matrix: DlMatrix,
    /// Device-space bounds that can still be drawn into; empty means
    /// everything is clipped out.
    cull: Rect,
}

/// Transform and clip-bounds stack.
#[derive(Clone, Debug)]
pub struct MatrixClipTracker {
    current: State,
    saved: Vec<State>,
    /// Device cull rect supplied at construction.
    base_cull: Rect,
}

impl Default for MatrixClipTracker {
    fn default() -> Self {
        Self::new(MAX_CULL_RECT)
    }
}

fn sanitize(cull: Rect) -> Rect {
    if geometry::is_empty(&cull) {
        Rect::ZERO
    } else {
        cull
    }
}

impl MatrixClipTracker {
    /// Creates a tracker with the identity transform and `cull_rect` as the
    /// device clip.
    #[must_use]
    pub fn new(cull_rect: Rect) -> Self {
        let cull = sanitize(cull_rect);
        Self {
            current: State {
                matrix: DlMatrix::IDENTITY,
                cull,
            },
            saved: Vec::new(),
            base_cull: cull,
        }
    }

    /// Pushes a copy of the current state.
    pub fn save(&mut self) {
        self.saved.push(self.current);
    }

    /// Pops to the previously saved state; does nothing at the root.
    pub fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.current = state;
        }
    }

    /// `1 +` the number of unmatched saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saved.len() + 1
    }

    // -- transforms ---------------------------------------------------------

    /// Pre-concatenates `m` onto the current transform.
    pub fn transform(&mut self, m: &DlMatrix) {
        self.current.matrix = self.current.matrix * *m;
    }

    /// Pre-concatenates a translation.
    pub fn translate(&mut self, tx: f64, ty: f64) {
        self.transform(&DlMatrix::from_translation(tx, ty));
    }

    /// Pre-concatenates a scale.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.transform(&DlMatrix::from_scale(sx, sy));
    }

    /// Pre-concatenates a rotation in degrees.
    pub fn rotate(&mut self, degrees: f64) {
        self.transform(&DlMatrix::from_rotation_degrees(degrees));
    }

    /// Pre-concatenates a skew.
    pub fn skew(&mut self, sx: f64, sy: f64) {
        self.transform(&DlMatrix::from_skew(sx, sy));
    }

    /// Pre-concatenates the 2-D affine transform
    /// `x' = mxx*x + mxy*y + mxt`, `y' = myx*x + myy*y + myt`.
    pub fn transform_2d_affine(
        &mut self,
        mxx: f64,
        mxy: f64,
        mxt: f64,
        myx: f64,
        myy: f64,
        myt: f64,
    ) {
        self.transform(&DlMatrix::from_affine(Affine::new([
            mxx, myx, mxy, myy, mxt, myt,
        ])));
    }

    /// Pre-concatenates a 4×4 transform given in row-major order.
    pub fn transform_full_perspective(&mut self, m: &[f64; 16]) {
        self.transform(&DlMatrix::from_row_major(*m));
    }

    /// Replaces the current transform.
    pub fn set_transform(&mut self, m: &DlMatrix) {
        self.current.matrix = *m;
    }

    /// Resets the current transform to identity.
    pub fn set_identity(&mut self) {
        self.current.matrix = DlMatrix::IDENTITY;
    }

    // -- clips --------------------------------------------------------------

    /// Applies a rectangular clip.
    pub fn clip_rect(&mut self, rect: &Rect, op: DlClipOp, _is_aa: bool) {
        match op {
            DlClipOp::Intersect => self.intersect_local(rect),
            DlClipOp::Difference => self.subtract_local(rect),
        }
    }

    /// Applies an oval clip (by its bounds when intersecting).
    pub fn clip_oval(&mut self, bounds: &Rect, op: DlClipOp, _is_aa: bool) {
        if op == DlClipOp::Intersect {
            self.intersect_local(bounds);
        }
    }

    /// Applies a rounded-rect clip.
    pub fn clip_rrect(&mut self, rrect: &RoundedRect, op: DlClipOp, is_aa: bool) {
        if path::rrect_is_rect(rrect) {
            self.clip_rect(&rrect.rect(), op, is_aa);
        } else if op == DlClipOp::Intersect {
            self.intersect_local(&rrect.rect());
        }
    }

    /// Applies a path clip.
    ///
    /// Inverse fill types swap the sense of the clip.
    pub fn clip_path(&mut self, path: &DlPath, op: DlClipOp, is_aa: bool) {
        let op = match (op, path.fill_type().is_inverse()) {
            (op, false) => op,
            (DlClipOp::Intersect, true) => DlClipOp::Difference,
            (DlClipOp::Difference, true) => DlClipOp::Intersect,
        };
        if let Some(rect) = path.as_rect() {
            self.clip_rect(&rect, op, is_aa);
        } else if op == DlClipOp::Intersect {
            self.intersect_local(&path.bounds());
        }
    }

    fn intersect_local(&mut self, rect: &Rect) {
        if geometry::is_empty(&self.current.cull) {
            return;
        }
        if geometry::is_empty(rect) {
            self.current.cull = Rect::ZERO;
            return;
        }
        if let Some(device) = self.current.matrix.map_rect(rect) {
            self.current.cull =
                geometry::intersect(&self.current.cull, &device).unwrap_or(Rect::ZERO);
        }
    }

    fn subtract_local(&mut self, rect: &Rect) {
        let cull = &mut self.current.cull;
        if geometry::is_empty(cull)
            || geometry::is_empty(rect)
            || !self.current.matrix.rect_stays_rect()
        {
            return;
        }
        let Some(r) = self.current.matrix.map_rect(rect) else {
            return;
        };
        if geometry::contains(&r, cull) {
            *cull = Rect::ZERO;
        } else if r.y0 <= cull.y0 && r.y1 >= cull.y1 {
            if r.x0 <= cull.x0 {
                cull.x0 = cull.x0.max(r.x1);
            }
            if r.x1 >= cull.x1 {
                cull.x1 = cull.x1.min(r.x0);
            }
        } else if r.x0 <= cull.x0 && r.x1 >= cull.x1 {
            if r.y0 <= cull.y0 {
                cull.y0 = cull.y0.max(r.y1);
            }
            if r.y1 >= cull.y1 {
                cull.y1 = cull.y1.min(r.y0);
            }
        }
        *cull = sanitize(*cull);
    }

    /// Replaces the device clip with `local` mapped through the current
    /// transform, or with the construction-time cull rect for `None`.
    pub fn reset_cull_rect(&mut self, local: Option<&Rect>) {
        self.current.cull = match local {
            None => self.base_cull,
            Some(r) if geometry::is_empty(r) => Rect::ZERO,
            Some(r) => self.current.matrix.map_rect(r).map_or(self.base_cull, sanitize),
        };
    }

    // -- queries ------------------------------------------------------------

    /// The current 4×4 transform.
    #[must_use]
    pub fn matrix(&self) -> &DlMatrix {
        &self.current.matrix
    }

    /// The current transform as a 2-D affine, unless it has perspective.
    #[must_use]
    pub fn affine(&self) -> Option<Affine> {
        self.current.matrix.to_affine()
    }

    /// Device-space clip bounds (zero-sized when everything is clipped).
    #[must_use]
    pub fn device_cull_rect(&self) -> Rect {
        self.current.cull
    }

    /// Clip bounds in the current local coordinate space.
    ///
    /// Zero-sized when everything is clipped or the transform is singular.
    #[must_use]
    pub fn local_cull_rect(&self) -> Rect {
        if self.is_cull_rect_empty() {
            return Rect::ZERO;
        }
        self.current
            .matrix
            .invert()
            .and_then(|inverse| inverse.map_rect(&self.current.cull))
            .unwrap_or(Rect::ZERO)
    }

    /// Is everything clipped out?
    #[must_use]
    pub fn is_cull_rect_empty(&self) -> bool {
        geometry::is_empty(&self.current.cull)
    }

    /// Quick reject: can content with local bounds `rect` not be visible?
    ///
    /// Content whose bounds cannot be mapped is never rejected.
    #[must_use]
    pub fn content_culled(&self, rect: &Rect) -> bool {
        if self.is_cull_rect_empty() || geometry::is_empty(rect) {
            return true;
        }
        self.current
            .matrix
            .map_rect(rect)
            .is_some_and(|device| !geometry::intersects(&device, &self.current.cull))
    }
}
