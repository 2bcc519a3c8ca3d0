// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major 4×4 matrix for the recorder's current transform.
//!
//! Most recordings only ever need a 2-D affine transform, which
//! [`DlMatrix::to_affine`] hands back as a [`kurbo::Affine`]. The full 4×4
//! form exists so that perspective transforms survive recording and so that
//! bounds can be mapped conservatively through them.

use core::ops::Mul;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Point, Rect};

/// Homogeneous `w` below this value is treated as behind the viewer.
const W_EPSILON: f64 = 1.0 / 16384.0;

/// A column-major 4×4 transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* `[x, y, z, w]`. Points are column vectors,
/// so `a * b` applies `b` first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DlMatrix {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl DlMatrix {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a matrix from four column arrays.
    #[inline]
    #[must_use]
    pub const fn from_cols(col0: [f64; 4], col1: [f64; 4], col2: [f64; 4], col3: [f64; 4]) -> Self {
        Self {
            cols: [col0, col1, col2, col3],
        }
    }

    /// Creates a matrix from sixteen values listed row by row.
    #[must_use]
    pub const fn from_row_major(m: [f64; 16]) -> Self {
        Self {
            cols: [
                [m[0], m[4], m[8], m[12]],
                [m[1], m[5], m[9], m[13]],
                [m[2], m[6], m[10], m[14]],
                [m[3], m[7], m[11], m[15]],
            ],
        }
    }

    /// Returns the sixteen values row by row.
    #[must_use]
    pub const fn to_row_major(&self) -> [f64; 16] {
        let c = &self.cols;
        [
            c[0][0], c[1][0], c[2][0], c[3][0], //
            c[0][1], c[1][1], c[2][1], c[3][1], //
            c[0][2], c[1][2], c[2][2], c[3][2], //
            c[0][3], c[1][3], c[2][3], c[3][3],
        ]
    }

    /// Returns column `i` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `i >= 4`.
    #[inline]
    #[must_use]
    pub const fn col(self, i: usize) -> [f64; 4] {
        self.cols[i]
    }

    /// Creates a 2-D translation.
    #[inline]
    #[must_use]
    pub const fn from_translation(tx: f64, ty: f64) -> Self {
        Self::from_cols(
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [tx, ty, 0.0, 1.0],
        )
    }

    /// Creates a 2-D non-uniform scale.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64) -> Self {
        Self::from_cols(
            [sx, 0.0, 0.0, 0.0],
            [0.0, sy, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    /// Creates a 2-D skew: `x' = x + sx * y`, `y' = sy * x + y`.
    #[inline]
    #[must_use]
    pub const fn from_skew(sx: f64, sy: f64) -> Self {
        Self::from_cols(
            [1.0, sy, 0.0, 0.0],
            [sx, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    /// Creates a rotation around the Z axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_z(radians: f64) -> Self {
        #[cfg(feature = "std")]
        let (s, c) = radians.sin_cos();
        #[cfg(not(feature = "std"))]
        let (s, c) = (radians.sin(), radians.cos());
        Self::from_cols(
            [c, s, 0.0, 0.0],
            [-s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    /// Creates a rotation around the Z axis, snapping quarter turns so that
    /// axis-aligned rotations stay exactly axis-aligned.
    #[must_use]
    pub fn from_rotation_degrees(degrees: f64) -> Self {
        let turns = degrees % 360.0;
        let (s, c) = if turns == 0.0 {
            (0.0, 1.0)
        } else if turns == 90.0 || turns == -270.0 {
            (1.0, 0.0)
        } else if turns == 180.0 || turns == -180.0 {
            (0.0, -1.0)
        } else if turns == 270.0 || turns == -90.0 {
            (-1.0, 0.0)
        } else {
            let m = Self::from_rotation_z(degrees.to_radians());
            (m.cols[0][1], m.cols[0][0])
        };
        Self::from_cols(
            [c, s, 0.0, 0.0],
            [-s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    /// Embeds a 2-D affine transform.
    #[must_use]
    pub fn from_affine(affine: Affine) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        Self::from_cols(
            [a, b, 0.0, 0.0],
            [c, d, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [e, f, 0.0, 1.0],
        )
    }

    /// Projects to a 2-D affine transform, dropping the Z row and column.
    ///
    /// Returns `None` if the matrix has perspective.
    #[must_use]
    pub fn to_affine(&self) -> Option<Affine> {
        if self.has_perspective() {
            return None;
        }
        let c = &self.cols;
        Some(Affine::new([
            c[0][0], c[0][1], c[1][0], c[1][1], c[3][0], c[3][1],
        ]))
    }

    /// Does the `w` row depend on `x` or `y`, or differ from 1?
    #[inline]
    #[must_use]
    pub fn has_perspective(&self) -> bool {
        let c = &self.cols;
        c[0][3] != 0.0 || c[1][3] != 0.0 || c[3][3] != 1.0
    }

    /// Are the `z` row and column trivial, so that the matrix is fully
    /// described by its 2-D affine part plus the `w` row?
    #[inline]
    #[must_use]
    pub fn is_2d(&self) -> bool {
        let c = &self.cols;
        c[0][2] == 0.0
            && c[1][2] == 0.0
            && c[3][2] == 0.0
            && c[2] == [0.0, 0.0, 1.0, 0.0]
    }

    /// Does this matrix map axis-aligned rects to axis-aligned rects?
    ///
    /// True for scales and quarter-turn rotations with non-zero scale, false
    /// for skews, arbitrary rotations and perspective.
    #[must_use]
    pub fn rect_stays_rect(&self) -> bool {
        if self.has_perspective() {
            return false;
        }
        let c = &self.cols;
        let (a, b, cc, d) = (c[0][0], c[0][1], c[1][0], c[1][1]);
        (a != 0.0 && d != 0.0 && b == 0.0 && cc == 0.0)
            || (a == 0.0 && d == 0.0 && b != 0.0 && cc != 0.0)
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    /// Maps a 2-D point (z = 0) through the matrix with perspective divide.
    ///
    /// Returns `None` if the point lands on or behind the `w = 0` plane.
    #[must_use]
    pub fn transform_point(&self, p: Point) -> Option<Point> {
        let c = &self.cols;
        let x = c[0][0] * p.x + c[1][0] * p.y + c[3][0];
        let y = c[0][1] * p.x + c[1][1] * p.y + c[3][1];
        let w = c[0][3] * p.x + c[1][3] * p.y + c[3][3];
        if w < W_EPSILON {
            return None;
        }
        if w == 1.0 {
            Some(Point::new(x, y))
        } else {
            Some(Point::new(x / w, y / w))
        }
    }

    /// Bounding box of the four mapped corners of `r`.
    ///
    /// Returns `None` when any corner cannot be projected; callers treat
    /// that as unbounded.
    #[must_use]
    pub fn map_rect(&self, r: &Rect) -> Option<Rect> {
        let corners = [
            Point::new(r.x0, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, r.y1),
            Point::new(r.x0, r.y1),
        ];
        let mut out = [Point::ORIGIN; 4];
        for (dst, src) in out.iter_mut().zip(corners) {
            *dst = self.transform_point(src)?;
        }
        let (mut x0, mut y0) = (out[0].x, out[0].y);
        let (mut x1, mut y1) = (x0, y0);
        for p in &out[1..] {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }
        Some(Rect::new(x0, y0, x1, y1))
    }

    /// Maps a direction vector through the linear 2-D part only.
    #[inline]
    #[must_use]
    pub fn map_vector(&self, x: f64, y: f64) -> (f64, f64) {
        let c = &self.cols;
        (c[0][0] * x + c[1][0] * y, c[0][1] * x + c[1][1] * y)
    }

    /// General 4×4 inverse by cofactor expansion.
    ///
    /// Returns `None` for singular or non-finite matrices.
    #[must_use]
    pub fn invert(&self) -> Option<Self> {
        let mut m = [0.0_f64; 16];
        for (i, v) in self.cols.iter().flatten().enumerate() {
            m[i] = *v;
        }
        let mut inv = [0.0_f64; 16];
        inv[0] = m[5] * m[10] * m[15] - m[5] * m[11] * m[14] - m[9] * m[6] * m[15]
            + m[9] * m[7] * m[14]
            + m[13] * m[6] * m[11]
            - m[13] * m[7] * m[10];
        inv[4] = -m[4] * m[10] * m[15] + m[4] * m[11] * m[14] + m[8] * m[6] * m[15]
            - m[8] * m[7] * m[14]
            - m[12] * m[6] * m[11]
            + m[12] * m[7] * m[10];
        inv[8] = m[4] * m[9] * m[15] - m[4] * m[11] * m[13] - m[8] * m[5] * m[15]
            + m[8] * m[7] * m[13]
            + m[12] * m[5] * m[11]
            - m[12] * m[7] * m[9];
        inv[12] = -m[4] * m[9] * m[14] + m[4] * m[10] * m[13] + m[8] * m[5] * m[14]
            - m[8] * m[6] * m[13]
            - m[12] * m[5] * m[10]
            + m[12] * m[6] * m[9];
        inv[1] = -m[1] * m[10] * m[15] + m[1] * m[11] * m[14] + m[9] * m[2] * m[15]
            - m[9] * m[3] * m[14]
            - m[13] * m[2] * m[11]
            + m[13] * m[3] * m[10];
        inv[5] = m[0] * m[10] * m[15] - m[0] * m[11] * m[14] - m[8] * m[2] * m[15]
            + m[8] * m[3] * m[14]
            + m[12] * m[2] * m[11]
            - m[12] * m[3] * m[10];
        inv[9] = -m[0] * m[9] * m[15] + m[0] * m[11] * m[13] + m[8] * m[1] * m[15]
            - m[8] * m[3] * m[13]
            - m[12] * m[1] * m[11]
            + m[12] * m[3] * m[9];
        inv[13] = m[0] * m[9] * m[14] - m[0] * m[10] * m[13] - m[8] * m[1] * m[14]
            + m[8] * m[2] * m[13]
            + m[12] * m[1] * m[10]
            - m[12] * m[2] * m[9];
        inv[2] = m[1] * m[6] * m[15] - m[1] * m[7] * m[14] - m[5] * m[2] * m[15]
            + m[5] * m[3] * m[14]
            + m[13] * m[2] * m[7]
            - m[13] * m[3] * m[6];
        inv[6] = -m[0] * m[6] * m[15] + m[0] * m[7] * m[14] + m[4] * m[2] * m[15]
            - m[4] * m[3] * m[14]
            - m[12] * m[2] * m[7]
            + m[12] * m[3] * m[6];
        inv[10] = m[0] * m[5] * m[15] - m[0] * m[7] * m[13] - m[4] * m[1] * m[15]
            + m[4] * m[3] * m[13]
            + m[12] * m[1] * m[7]
            - m[12] * m[3] * m[5];
        inv[14] = -m[0] * m[5] * m[14] + m[0] * m[6] * m[13] + m[4] * m[1] * m[14]
            - m[4] * m[2] * m[13]
            - m[12] * m[1] * m[6]
            + m[12] * m[2] * m[5];
        inv[3] = -m[1] * m[6] * m[11] + m[1] * m[7] * m[10] + m[5] * m[2] * m[11]
            - m[5] * m[3] * m[10]
            - m[9] * m[2] * m[7]
            + m[9] * m[3] * m[6];
        inv[7] = m[0] * m[6] * m[11] - m[0] * m[7] * m[10] - m[4] * m[2] * m[11]
            + m[4] * m[3] * m[10]
            + m[8] * m[2] * m[7]
            - m[8] * m[3] * m[6];
        inv[11] = -m[0] * m[5] * m[11] + m[0] * m[7] * m[9] + m[4] * m[1] * m[11]
            - m[4] * m[3] * m[9]
            - m[8] * m[1] * m[7]
            + m[8] * m[3] * m[5];
        inv[15] = m[0] * m[5] * m[10] - m[0] * m[6] * m[9] - m[4] * m[1] * m[10]
            + m[4] * m[2] * m[9]
            + m[8] * m[1] * m[6]
            - m[8] * m[2] * m[5];

        let det = m[0] * inv[0] + m[1] * inv[4] + m[2] * inv[8] + m[3] * inv[12];
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;
        let mut cols = [[0.0_f64; 4]; 4];
        for (i, v) in inv.iter().enumerate() {
            cols[i / 4][i % 4] = v * inv_det;
        }
        let out = Self { cols };
        out.is_finite().then_some(out)
    }
}

impl Default for DlMatrix {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Affine> for DlMatrix {
    #[inline]
    fn from(affine: Affine) -> Self {
        Self::from_affine(affine)
    }
}

impl Mul for DlMatrix {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        let mut j = 0;
        while j < 4 {
            let mut i = 0;
            while i < 4 {
                out[j][i] =
                    a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
                i += 1;
            }
            j += 1;
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: &DlMatrix, b: &DlMatrix) -> bool {
        a.cols
            .iter()
            .flatten()
            .zip(b.cols.iter().flatten())
            .all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn default_is_identity() {
        assert_eq!(DlMatrix::default(), DlMatrix::IDENTITY);
    }

    #[test]
    fn translate_then_scale_maps_rect() {
        let m = DlMatrix::from_translation(5.0, 5.0) * DlMatrix::from_scale(2.0, 3.0);
        let r = m.map_rect(&Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(r, Some(Rect::new(5.0, 5.0, 25.0, 35.0)));
    }

    #[test]
    fn row_major_round_trip() {
        let values: [f64; 16] = core::array::from_fn(|i| i as f64);
        let m = DlMatrix::from_row_major(values);
        assert_eq!(m.to_row_major(), values);
        // Row 0, column 3 is the x translation.
        assert_eq!(m.col(3)[0], 3.0);
    }

    #[test]
    fn affine_round_trip() {
        let a = Affine::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let m = DlMatrix::from_affine(a);
        assert_eq!(m.to_affine(), Some(a));
        assert!(!m.has_perspective());
    }

    #[test]
    fn quarter_turns_are_exact() {
        let r = DlMatrix::from_rotation_degrees(90.0);
        assert_eq!(r.col(0), [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(r.col(1), [-1.0, 0.0, 0.0, 0.0]);
        assert!(r.rect_stays_rect());
        assert!(!DlMatrix::from_rotation_degrees(45.0).rect_stays_rect());
        assert!(!DlMatrix::from_skew(0.5, 0.0).rect_stays_rect());
        assert!(!DlMatrix::from_scale(0.0, 1.0).rect_stays_rect());
    }

    #[test]
    fn invert_undoes_transform() {
        let m = DlMatrix::from_translation(3.0, -4.0)
            * DlMatrix::from_rotation_degrees(30.0)
            * DlMatrix::from_scale(2.0, 0.5);
        let inv = m.invert().unwrap();
        assert!(approx(&(m * inv), &DlMatrix::IDENTITY), "{:?}", m * inv);
        assert!(DlMatrix::from_scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn perspective_behind_viewer_is_unmappable() {
        let mut m = DlMatrix::IDENTITY;
        // w = 1 - x / 10: the plane x = 10 maps to infinity.
        m.cols[0][3] = -0.1;
        assert!(m.has_perspective());
        assert_eq!(m.to_affine(), None);
        assert!(m.map_rect(&Rect::new(0.0, 0.0, 5.0, 5.0)).is_some());
        assert!(m.map_rect(&Rect::new(0.0, 0.0, 20.0, 5.0)).is_none());
    }

    #[test]
    fn infinity_detected() {
        let mut t = DlMatrix::IDENTITY;
        t.cols[0][3] = f64::INFINITY;
        assert!(!t.is_finite());
        assert!(DlMatrix::IDENTITY.is_finite());
    }
}
