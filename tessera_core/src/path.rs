// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared path geometry with a shape hint.
//!
//! A [`DlPath`] remembers whether it was built from (or recognized as) a
//! rect, oval, or rounded rect. The builder uses the hint to record cheaper
//! clip and draw ops.

use alloc::sync::Arc;

use kurbo::{BezPath, Ellipse, PathEl, Point, Rect, RoundedRect, Shape};

use crate::geometry;

/// Flattening tolerance used when converting primitives to paths.
const TOLERANCE: f64 = 0.1;

/// Fill rule for a path.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DlPathFillType {
    /// Non-zero winding inside.
    #[default]
    NonZero,
    /// Even-odd inside.
    EvenOdd,
    /// Everything outside the non-zero interior.
    InverseNonZero,
    /// Everything outside the even-odd interior.
    InverseEvenOdd,
}

impl DlPathFillType {
    /// Does this rule fill the outside of the path?
    #[inline]
    #[must_use]
    pub const fn is_inverse(self) -> bool {
        matches!(self, Self::InverseNonZero | Self::InverseEvenOdd)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum PathShape {
    General,
    Rect(Rect),
    Oval(Rect),
    RoundedRect(RoundedRect),
}

/// Immutable, cheaply cloned path geometry.
#[derive(Clone, Debug)]
pub struct DlPath {
    path: Arc<BezPath>,
    shape: PathShape,
    fill_type: DlPathFillType,
    bounds: Rect,
}

impl DlPath {
    /// Wraps arbitrary geometry, recognizing closed axis-aligned rectangles.
    #[must_use]
    pub fn new(path: BezPath) -> Self {
        let bounds = path.bounding_box();
        let shape = detect_rect(&path).map_or(PathShape::General, PathShape::Rect);
        Self {
            path: Arc::new(path),
            shape,
            fill_type: DlPathFillType::NonZero,
            bounds,
        }
    }

    /// A closed rectangle.
    #[must_use]
    pub fn rect(rect: Rect) -> Self {
        Self {
            path: Arc::new(rect.to_path(TOLERANCE)),
            shape: PathShape::Rect(rect),
            fill_type: DlPathFillType::NonZero,
            bounds: rect,
        }
    }

    /// An ellipse inscribed in `rect`.
    #[must_use]
    pub fn oval(rect: Rect) -> Self {
        Self {
            path: Arc::new(Ellipse::from_rect(rect).to_path(TOLERANCE)),
            shape: PathShape::Oval(rect),
            fill_type: DlPathFillType::NonZero,
            bounds: rect,
        }
    }

    /// A circle.
    #[must_use]
    pub fn circle(center: Point, radius: f64) -> Self {
        Self::oval(Rect::new(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        ))
    }

    /// A rounded rectangle, demoted to a rect or oval when its radii allow.
    #[must_use]
    pub fn rounded_rect(rrect: RoundedRect) -> Self {
        let shape = if rrect_is_rect(&rrect) {
            PathShape::Rect(rrect.rect())
        } else if rrect_is_oval(&rrect) {
            PathShape::Oval(rrect.rect())
        } else {
            PathShape::RoundedRect(rrect)
        };
        Self {
            path: Arc::new(rrect.to_path(TOLERANCE)),
            shape,
            fill_type: DlPathFillType::NonZero,
            bounds: rrect.rect(),
        }
    }

    /// Returns the path with a different fill rule.
    #[must_use]
    pub fn with_fill_type(mut self, fill_type: DlPathFillType) -> Self {
        self.fill_type = fill_type;
        self
    }

    /// The underlying geometry.
    #[inline]
    #[must_use]
    pub fn bez_path(&self) -> &BezPath {
        &self.path
    }

    /// Bounds of the geometry, ignoring the fill rule.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Fill rule.
    #[inline]
    #[must_use]
    pub fn fill_type(&self) -> DlPathFillType {
        self.fill_type
    }

    /// The rect this path traces, if it is one.
    #[must_use]
    pub fn as_rect(&self) -> Option<Rect> {
        match self.shape {
            PathShape::Rect(r) => Some(r),
            _ => None,
        }
    }

    /// The bounds of the oval this path traces, if it is one.
    #[must_use]
    pub fn as_oval(&self) -> Option<Rect> {
        match self.shape {
            PathShape::Oval(r) => Some(r),
            _ => None,
        }
    }

    /// The rounded rect this path traces, if it is one.
    #[must_use]
    pub fn as_rounded_rect(&self) -> Option<RoundedRect> {
        match self.shape {
            PathShape::RoundedRect(r) => Some(r),
            _ => None,
        }
    }

    /// Do both handles share the same geometry allocation?
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.path, &other.path) && self.fill_type == other.fill_type
    }
}

/// All four corner radii are zero.
pub(crate) fn rrect_is_rect(rrect: &RoundedRect) -> bool {
    let r = rrect.radii();
    r.top_left == 0.0 && r.top_right == 0.0 && r.bottom_right == 0.0 && r.bottom_left == 0.0
}

/// The rounded rect is a circle: square, with every radius half the side.
pub(crate) fn rrect_is_oval(rrect: &RoundedRect) -> bool {
    let rect = rrect.rect();
    let r = rrect.radii();
    let half = rect.width() * 0.5;
    !geometry::is_empty(&rect)
        && rect.width() == rect.height()
        && r.top_left == half
        && r.top_right == half
        && r.bottom_right == half
        && r.bottom_left == half
}

/// Recognizes `M L L L [L] Z` contours that trace an axis-aligned rectangle.
fn detect_rect(path: &BezPath) -> Option<Rect> {
    let els = path.elements();
    let PathEl::MoveTo(start) = *els.first()? else {
        return None;
    };
    if !matches!(els.last()?, PathEl::ClosePath) {
        return None;
    }
    let mut pts = alloc::vec![start];
    for el in &els[1..els.len() - 1] {
        match *el {
            PathEl::LineTo(p) => pts.push(p),
            _ => return None,
        }
    }
    if pts.len() == 5 && pts[4] == start {
        pts.pop();
    }
    if pts.len() != 4 {
        return None;
    }
    for i in 0..4 {
        let a = pts[i];
        let b = pts[(i + 1) % 4];
        if a.x != b.x && a.y != b.y {
            return None;
        }
    }
    let rect = geometry::point_bounds(pts.iter().copied())?;
    let corners_on_edges = pts
        .iter()
        .all(|p| (p.x == rect.x0 || p.x == rect.x1) && (p.y == rect.y0 || p.y == rect.y1));
    (corners_on_edges && !geometry::is_empty(&rect)).then_some(rect)
}
