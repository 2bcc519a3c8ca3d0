// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle predicates and the rotation-scale transform used by atlases.
//!
//! `kurbo::Rect` treats a reversed rectangle as having positive area. The
//! recorder needs the stricter notion used throughout this crate: a rect is
//! empty unless `x0 < x1` and `y0 < y1`. Comparisons are written so that NaN
//! coordinates also read as empty.

use bytemuck::{Pod, Zeroable};
use kurbo::{Point, Rect};

/// The effectively infinite cull rectangle used when none is supplied.
pub const MAX_CULL_RECT: Rect = Rect::new(-1e9, -1e9, 1e9, 1e9);

/// Returns `true` if `r` covers no area (including reversed or NaN rects).
#[inline]
#[must_use]
pub fn is_empty(r: &Rect) -> bool {
    !(r.x0 < r.x1 && r.y0 < r.y1)
}

/// Returns `true` if every coordinate of `r` is finite.
#[inline]
#[must_use]
pub fn is_finite(r: &Rect) -> bool {
    r.x0.is_finite() && r.y0.is_finite() && r.x1.is_finite() && r.y1.is_finite()
}

/// Returns `true` if the interiors of `a` and `b` overlap.
///
/// Rects that only share an edge do not intersect.
#[inline]
#[must_use]
pub fn intersects(a: &Rect, b: &Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1 && !is_empty(a) && !is_empty(b)
}

/// Intersects `a` with `b`, returning `None` when the result is empty.
#[inline]
#[must_use]
pub fn intersect(a: &Rect, b: &Rect) -> Option<Rect> {
    let r = Rect::new(
        a.x0.max(b.x0),
        a.y0.max(b.y0),
        a.x1.min(b.x1),
        a.y1.min(b.y1),
    );
    (!is_empty(&r)).then_some(r)
}

/// Returns `true` if `outer` fully contains `inner`.
#[inline]
#[must_use]
pub fn contains(outer: &Rect, inner: &Rect) -> bool {
    !is_empty(outer)
        && !is_empty(inner)
        && outer.x0 <= inner.x0
        && outer.y0 <= inner.y0
        && outer.x1 >= inner.x1
        && outer.y1 >= inner.y1
}

/// Smallest rect containing both inputs; empty inputs are ignored.
#[inline]
#[must_use]
pub fn join(a: &Rect, b: &Rect) -> Rect {
    match (is_empty(a), is_empty(b)) {
        (true, true) => Rect::ZERO,
        (true, false) => *b,
        (false, true) => *a,
        (false, false) => Rect::new(
            a.x0.min(b.x0),
            a.y0.min(b.y0),
            a.x1.max(b.x1),
            a.y1.max(b.y1),
        ),
    }
}

/// Inclusive bounds of a point set.
///
/// Unlike rect accumulation a single point (or a collinear set) produces a
/// zero-area rect, which stroke padding can later inflate.
#[must_use]
pub fn point_bounds(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
    let mut min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    (min.x <= max.x && min.y <= max.y).then(|| Rect::new(min.x, min.y, max.x, max.y))
}

/// A compressed rotation + uniform scale + translation, one per atlas sprite.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct DlRSTransform {
    /// `scale * cos(angle)`.
    pub scos: f64,
    /// `scale * sin(angle)`.
    pub ssin: f64,
    /// Horizontal translation.
    pub tx: f64,
    /// Vertical translation.
    pub ty: f64,
}

impl DlRSTransform {
    /// Creates a transform from its four components.
    #[inline]
    #[must_use]
    pub const fn new(scos: f64, ssin: f64, tx: f64, ty: f64) -> Self {
        Self { scos, ssin, tx, ty }
    }

    /// Pure translation with unit scale.
    #[inline]
    #[must_use]
    pub const fn from_translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, tx, ty)
    }

    /// Maps a `width` x `height` sprite anchored at the origin to its four
    /// destination corners, in winding order.
    #[must_use]
    pub fn to_quad(&self, width: f64, height: f64) -> [Point; 4] {
        let Self { scos, ssin, tx, ty } = *self;
        [
            Point::new(tx, ty),
            Point::new(tx + scos * width, ty + ssin * width),
            Point::new(
                tx + scos * width - ssin * height,
                ty + ssin * width + scos * height,
            ),
            Point::new(tx - ssin * height, ty + scos * height),
        ]
    }
}
