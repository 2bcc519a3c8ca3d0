// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounds accumulation with save/restore scoping.
//!
//! The builder reports the device-space bounds of every visible op to a
//! [`BoundsAccumulator`], tagged with the op's index. Two strategies share
//! the interface:
//!
//! - [`RectBoundsAccumulator`] keeps one running rectangle per scope.
//! - [`RTreeBoundsAccumulator`] keeps every `(rect, id)` pair so that a
//!   [`DlRTree`] can be built at the end.
//!
//! They differ when a scope is restored through a remap (a layer's image
//! filter): the rect variant remaps the scope's aggregate, the R-tree variant
//! remaps each entry individually and so ends up with tighter bounds.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::Rect;

use crate::error::DisplayListError;
use crate::geometry;
use crate::rtree::DlRTree;

/// Id used for entries that are not real draw ops (merged child scopes).
pub const SYNTHETIC_ID: i32 = -1;

/// Which accumulator a builder uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoundsStrategy {
    /// A single running rectangle; cheapest, no spatial index.
    #[default]
    Rect,
    /// Every op's bounds kept for an R-tree.
    SpatialIndex,
}

impl BoundsStrategy {
    /// Creates an empty accumulator of this kind.
    #[must_use]
    pub fn create(self) -> Box<dyn BoundsAccumulator> {
        match self {
            Self::Rect => Box::new(RectBoundsAccumulator::new()),
            Self::SpatialIndex => Box::new(RTreeBoundsAccumulator::new()),
        }
    }
}

/// Scoped accumulation of op bounds.
pub trait BoundsAccumulator: Debug {
    /// Which strategy this is.
    fn strategy(&self) -> BoundsStrategy;

    /// Merges `rect` into the current scope. Empty rects are ignored.
    fn accumulate(&mut self, rect: Rect, id: i32);

    /// Opens a fresh, empty scope.
    fn save(&mut self);

    /// Closes the current scope and merges it into its parent unchanged.
    ///
    /// Does nothing if no scope is open.
    fn restore(&mut self);

    /// Closes the current scope, passing its bounds through `remap` and then
    /// `clip` before merging them into the parent.
    ///
    /// Returns `false` if any `remap` call failed; the unmapped bounds are
    /// kept in that case. Does nothing (and succeeds) if no scope is open.
    fn restore_with(
        &mut self,
        remap: &mut dyn FnMut(Rect) -> Option<Rect>,
        clip: Option<Rect>,
    ) -> bool;

    /// Number of open scopes.
    fn depth(&self) -> usize;

    /// Everything accumulated so far.
    ///
    /// # Errors
    ///
    /// [`DisplayListError::UnbalancedSave`] while a scope is open.
    fn bounds(&self) -> Result<Rect, DisplayListError>;

    /// Builds the spatial index over everything accumulated, for strategies
    /// that keep one.
    ///
    /// # Errors
    ///
    /// [`DisplayListError::UnbalancedSave`] while a scope is open.
    fn build_rtree(&self) -> Result<Option<DlRTree>, DisplayListError> {
        self.bounds().map(|_| None)
    }

    /// Discards everything, including open scopes.
    fn reset(&mut self);
}

fn unbalanced(depth: usize) -> Result<(), DisplayListError> {
    if depth == 0 {
        Ok(())
    } else {
        Err(DisplayListError::UnbalancedSave { depth })
    }
}

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// Running min/max extents of one scope.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Extents {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Extents {
    const EMPTY: Self = Self {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    fn add(&mut self, r: &Rect) {
        self.min_x = self.min_x.min(r.x0);
        self.min_y = self.min_y.min(r.y0);
        self.max_x = self.max_x.max(r.x1);
        self.max_y = self.max_y.max(r.y1);
    }

    fn rect(&self) -> Rect {
        if self.min_x < self.max_x && self.min_y < self.max_y {
            Rect::new(self.min_x, self.min_y, self.max_x, self.max_y)
        } else {
            Rect::ZERO
        }
    }
}

/// Accumulates a single bounding rectangle per scope.
#[derive(Clone, Debug)]
pub struct RectBoundsAccumulator {
    current: Extents,
    saved: Vec<Extents>,
}

impl Default for RectBoundsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl RectBoundsAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: Extents::EMPTY,
            saved: Vec::new(),
        }
    }

    fn pop(&mut self) -> Option<Rect> {
        let parent = self.saved.pop()?;
        let child = core::mem::replace(&mut self.current, parent).rect();
        Some(child)
    }
}

impl BoundsAccumulator for RectBoundsAccumulator {
    fn strategy(&self) -> BoundsStrategy {
        BoundsStrategy::Rect
    }

    fn accumulate(&mut self, rect: Rect, _id: i32) {
        if !geometry::is_empty(&rect) {
            self.current.add(&rect);
        }
    }

    fn save(&mut self) {
        self.saved.push(self.current);
        self.current = Extents::EMPTY;
    }

    fn restore(&mut self) {
        if let Some(child) = self.pop() {
            self.accumulate(child, SYNTHETIC_ID);
        }
    }

    fn restore_with(
        &mut self,
        remap: &mut dyn FnMut(Rect) -> Option<Rect>,
        clip: Option<Rect>,
    ) -> bool {
        let Some(mut child) = self.pop() else {
            return true;
        };
        let mut success = true;
        if !geometry::is_empty(&child) {
            match remap(child) {
                Some(mapped) => child = mapped,
                None => success = false,
            }
            if let Some(clip) = clip {
                child = geometry::intersect(&child, &clip).unwrap_or(Rect::ZERO);
            }
            self.accumulate(child, SYNTHETIC_ID);
        }
        success
    }

    fn depth(&self) -> usize {
        self.saved.len()
    }

    fn bounds(&self) -> Result<Rect, DisplayListError> {
        unbalanced(self.depth())?;
        Ok(self.current.rect())
    }

    fn reset(&mut self) {
        self.current = Extents::EMPTY;
        self.saved.clear();
    }
}

// ---------------------------------------------------------------------------
// R-tree
// ---------------------------------------------------------------------------

/// Keeps every accumulated `(rect, id)` pair for a spatial index.
#[derive(Clone, Debug, Default)]
pub struct RTreeBoundsAccumulator {
    rects: Vec<Rect>,
    ids: Vec<i32>,
    /// Length of `rects` when each open scope began.
    saved: Vec<usize>,
}

impl RTreeBoundsAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rects: Vec::new(),
            ids: Vec::new(),
            saved: Vec::new(),
        }
    }

    /// Number of entries kept so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Has nothing been accumulated?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

impl BoundsAccumulator for RTreeBoundsAccumulator {
    fn strategy(&self) -> BoundsStrategy {
        BoundsStrategy::SpatialIndex
    }

    fn accumulate(&mut self, rect: Rect, id: i32) {
        if !geometry::is_empty(&rect) {
            self.rects.push(rect);
            self.ids.push(id);
        }
    }

    fn save(&mut self) {
        self.saved.push(self.rects.len());
    }

    fn restore(&mut self) {
        self.saved.pop();
    }

    fn restore_with(
        &mut self,
        remap: &mut dyn FnMut(Rect) -> Option<Rect>,
        clip: Option<Rect>,
    ) -> bool {
        let Some(start) = self.saved.pop() else {
            return true;
        };
        let mut success = true;
        let mut kept = start;
        for i in start..self.rects.len() {
            let mut rect = match remap(self.rects[i]) {
                Some(mapped) => mapped,
                None => {
                    success = false;
                    self.rects[i]
                }
            };
            if let Some(clip) = clip {
                rect = geometry::intersect(&rect, &clip).unwrap_or(Rect::ZERO);
            }
            if !geometry::is_empty(&rect) {
                self.rects[kept] = rect;
                self.ids[kept] = self.ids[i];
                kept += 1;
            }
        }
        self.rects.truncate(kept);
        self.ids.truncate(kept);
        success
    }

    fn depth(&self) -> usize {
        self.saved.len()
    }

    fn bounds(&self) -> Result<Rect, DisplayListError> {
        unbalanced(self.depth())?;
        Ok(self
            .rects
            .iter()
            .fold(Rect::ZERO, |acc, r| geometry::join(&acc, r)))
    }

    fn build_rtree(&self) -> Result<Option<DlRTree>, DisplayListError> {
        unbalanced(self.depth())?;
        Ok(Some(DlRTree::new(&self.rects, &self.ids, |id| id >= 0)))
    }

    fn reset(&mut self) {
        self.rects.clear();
        self.ids.clear();
        self.saved.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn both() -> [Box<dyn BoundsAccumulator>; 2] {
        [
            BoundsStrategy::Rect.create(),
            BoundsStrategy::SpatialIndex.create(),
        ]
    }

    #[test]
    fn empty_accumulation_is_zero() {
        for acc in both() {
            assert_eq!(acc.bounds().unwrap(), Rect::ZERO, "{:?}", acc.strategy());
        }
    }

    #[test]
    fn empty_rects_are_ignored() {
        for mut acc in both() {
            acc.accumulate(Rect::new(10.0, 10.0, 5.0, 5.0), 0);
            acc.accumulate(Rect::new(0.0, 0.0, 0.0, 10.0), 1);
            assert_eq!(acc.bounds().unwrap(), Rect::ZERO, "{:?}", acc.strategy());
        }
    }

    #[test]
    fn plain_restore_merges_child_scope() {
        for mut acc in both() {
            acc.accumulate(Rect::new(0.0, 0.0, 10.0, 10.0), 0);
            acc.save();
            acc.accumulate(Rect::new(20.0, 20.0, 30.0, 30.0), 1);
            assert!(acc.bounds().is_err(), "bounds need balanced saves");
            acc.restore();
            assert_eq!(
                acc.bounds().unwrap(),
                Rect::new(0.0, 0.0, 30.0, 30.0),
                "{:?}",
                acc.strategy()
            );
        }
    }

    #[test]
    fn restore_without_save_is_a_noop() {
        for mut acc in both() {
            acc.accumulate(Rect::new(0.0, 0.0, 1.0, 1.0), 0);
            acc.restore();
            assert!(acc.restore_with(&mut |r| Some(r), None));
            assert_eq!(acc.depth(), 0);
            assert_eq!(acc.bounds().unwrap(), Rect::new(0.0, 0.0, 1.0, 1.0));
        }
    }

    #[test]
    fn remap_failure_is_reported() {
        for mut acc in both() {
            acc.save();
            acc.accumulate(Rect::new(0.0, 0.0, 10.0, 10.0), 0);
            assert!(
                !acc.restore_with(&mut |_| None, None),
                "{:?}",
                acc.strategy()
            );
            assert_eq!(acc.bounds().unwrap(), Rect::new(0.0, 0.0, 10.0, 10.0));
        }
    }

    #[test]
    fn spatial_remap_is_per_entry() {
        let grow = |r: Rect| Some(r.inflate(1.0, 1.0));
        let mut rect = RectBoundsAccumulator::new();
        let mut tree = RTreeBoundsAccumulator::new();
        for acc in [&mut rect as &mut dyn BoundsAccumulator, &mut tree] {
            acc.save();
            acc.accumulate(Rect::new(0.0, 0.0, 10.0, 10.0), 0);
            acc.accumulate(Rect::new(90.0, 90.0, 100.0, 100.0), 1);
            assert!(
                acc.restore_with(&mut { grow }, Some(Rect::new(0.0, 0.0, 50.0, 50.0)))
            );
        }
        assert_eq!(
            rect.bounds().unwrap(),
            Rect::new(0.0, 0.0, 50.0, 50.0),
            "aggregate remap then clip"
        );
        assert_eq!(
            tree.bounds().unwrap(),
            Rect::new(0.0, 0.0, 11.0, 11.0),
            "far entry clipped away"
        );
        assert_eq!(tree.len(), 1, "compacted in place");
    }

    #[test]
    fn rtree_excludes_synthetic_ids() {
        let mut acc = RTreeBoundsAccumulator::new();
        acc.accumulate(Rect::new(0.0, 0.0, 10.0, 10.0), 0);
        acc.accumulate(Rect::new(0.0, 0.0, 100.0, 100.0), SYNTHETIC_ID);
        let tree = acc.build_rtree().unwrap().unwrap();
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(acc.bounds().unwrap(), Rect::new(0.0, 0.0, 100.0, 100.0));
        assert!(
            RectBoundsAccumulator::new().build_rtree().unwrap().is_none()
        );
    }
}
