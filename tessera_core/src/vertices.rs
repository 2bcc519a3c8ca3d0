// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Triangle meshes for `draw_vertices`.

use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::color::DlColor;
use crate::geometry;

/// How consecutive vertices form triangles.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DlVertexMode {
    /// Every three vertices form an independent triangle.
    #[default]
    Triangles,
    /// Each vertex after the second forms a triangle with the previous two.
    TriangleStrip,
    /// Each vertex after the second forms a triangle with the first and the
    /// previous one.
    TriangleFan,
}

impl DlVertexMode {
    /// Decodes a discriminant written by the op buffer.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Triangles),
            1 => Some(Self::TriangleStrip),
            2 => Some(Self::TriangleFan),
            _ => None,
        }
    }
}

/// An immutable mesh with optional per-vertex texture coordinates and colors.
///
/// Bounds are computed once, at construction, from the positions.
#[derive(Clone, Debug, PartialEq)]
pub struct DlVertices {
    mode: DlVertexMode,
    positions: Vec<Point>,
    texture_coordinates: Option<Vec<Point>>,
    colors: Option<Vec<DlColor>>,
    indices: Option<Vec<u16>>,
    bounds: Rect,
}

impl DlVertices {
    /// Creates a mesh.
    ///
    /// Per-vertex arrays whose length differs from `positions` are dropped.
    #[must_use]
    pub fn new(
        mode: DlVertexMode,
        positions: Vec<Point>,
        texture_coordinates: Option<Vec<Point>>,
        colors: Option<Vec<DlColor>>,
        indices: Option<Vec<u16>>,
    ) -> Self {
        let n = positions.len();
        let bounds = geometry::point_bounds(positions.iter().copied()).unwrap_or(Rect::ZERO);
        Self {
            mode,
            texture_coordinates: texture_coordinates.filter(|t| t.len() == n),
            colors: colors.filter(|c| c.len() == n),
            indices,
            positions,
            bounds,
        }
    }

    /// Triangle assembly mode.
    #[must_use]
    pub fn mode(&self) -> DlVertexMode {
        self.mode
    }

    /// Vertex positions.
    #[must_use]
    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    /// Per-vertex texture coordinates, if any.
    #[must_use]
    pub fn texture_coordinates(&self) -> Option<&[Point]> {
        self.texture_coordinates.as_deref()
    }

    /// Per-vertex colors, if any.
    #[must_use]
    pub fn colors(&self) -> Option<&[DlColor]> {
        self.colors.as_deref()
    }

    /// Index buffer, if any.
    #[must_use]
    pub fn indices(&self) -> Option<&[u16]> {
        self.indices.as_deref()
    }

    /// Bounds of all positions (zero-sized for an empty mesh).
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn bounds_cover_positions() {
        let v = DlVertices::new(
            DlVertexMode::Triangles,
            vec![Point::new(1.0, 5.0), Point::new(4.0, 2.0), Point::new(-1.0, 3.0)],
            None,
            None,
            None,
        );
        assert_eq!(
            v.bounds(),
            Rect::new(-1.0, 2.0, 4.0, 5.0),
            "bounds span every vertex"
        );
    }

    #[test]
    fn mismatched_attributes_are_dropped() {
        let v = DlVertices::new(
            DlVertexMode::TriangleFan,
            vec![Point::ZERO, Point::new(1.0, 0.0), Point::new(0.0, 1.0)],
            Some(vec![Point::ZERO]),
            Some(vec![DlColor::RED; 3]),
            Some(vec![0, 1, 2]),
        );
        assert!(
            v.texture_coordinates().is_none(),
            "short texture array is dropped"
        );
        assert_eq!(
            v.colors().map(<[DlColor]>::len),
            Some(3),
            "matching colors kept"
        );
        assert_eq!(
            DlVertexMode::from_raw(2),
            Some(DlVertexMode::TriangleFan),
            "raw decode"
        );
    }
}
