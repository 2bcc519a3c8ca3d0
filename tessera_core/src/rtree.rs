// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A static R-tree over the bounds of recorded draw ops.
//!
//! The tree is bulk-built once, bottom-up, from leaves kept in insertion
//! order: every run of [`FAN_OUT`] consecutive nodes gets a parent, until a
//! single root remains. Since draw ops are recorded roughly in painter order
//! and neighbors tend to be spatially close, insertion order is a reasonable
//! packing without any sorting.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::Rect;

use crate::geometry;

/// Children per interior node.
pub const FAN_OUT: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Node {
    bounds: Rect,
    /// First child in `nodes` (interior) or the leaf's id (leaf level).
    first: usize,
    /// Number of children; zero for leaves.
    count: usize,
}

/// Immutable spatial index mapping rects to op ids.
#[derive(Clone, Debug, PartialEq)]
pub struct DlRTree {
    /// Leaves first (in insertion order), then each interior level.
    nodes: Vec<Node>,
    ids: Vec<i32>,
    leaf_count: usize,
}

impl DlRTree {
    /// Builds a tree from parallel `rects` and `ids`, keeping only entries
    /// whose rect is non-empty and whose id passes `predicate`.
    #[must_use]
    pub fn new(rects: &[Rect], ids: &[i32], predicate: impl Fn(i32) -> bool) -> Self {
        debug_assert_eq!(rects.len(), ids.len(), "one id per rect");
        let mut nodes = Vec::new();
        let mut kept_ids = Vec::new();
        for (rect, &id) in rects.iter().zip(ids) {
            if predicate(id) && !geometry::is_empty(rect) {
                nodes.push(Node {
                    bounds: *rect,
                    first: kept_ids.len(),
                    count: 0,
                });
                kept_ids.push(id);
            }
        }
        let leaf_count = nodes.len();

        let mut level_start = 0;
        let mut level_len = leaf_count;
        while level_len > 1 {
            let next_start = nodes.len();
            for chunk_start in (level_start..level_start + level_len).step_by(FAN_OUT) {
                let chunk_end = (chunk_start + FAN_OUT).min(level_start + level_len);
                let bounds = nodes[chunk_start..chunk_end]
                    .iter()
                    .fold(Rect::ZERO, |acc, n| geometry::join(&acc, &n.bounds));
                nodes.push(Node {
                    bounds,
                    first: chunk_start,
                    count: chunk_end - chunk_start,
                });
            }
            level_start = next_start;
            level_len = nodes.len() - next_start;
        }

        Self {
            nodes,
            ids: kept_ids,
            leaf_count,
        }
    }

    /// Number of indexed rects.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Number of nodes, leaves included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Union of every indexed rect (zero for an empty tree).
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.nodes.last().map_or(Rect::ZERO, |root| root.bounds)
    }

    /// Union of the rects indexed under `id`, if any.
    #[must_use]
    pub fn bounds_for(&self, id: i32) -> Option<Rect> {
        self.ids
            .iter()
            .zip(&self.nodes[..self.leaf_count])
            .filter(|(leaf_id, _)| **leaf_id == id)
            .map(|(_, leaf)| leaf.bounds)
            .reduce(|a, b| geometry::join(&a, &b))
    }

    /// The indexed rect of every leaf, in insertion order.
    pub fn rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.nodes[..self.leaf_count].iter().map(|n| n.bounds)
    }

    /// Leaf positions overlapping `query`, ascending.
    fn search_leaves(&self, query: &Rect) -> Vec<usize> {
        let mut hits = Vec::new();
        let Some(root) = self.nodes.len().checked_sub(1) else {
            return hits;
        };
        if geometry::is_empty(query) {
            return hits;
        }
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !geometry::intersects(&node.bounds, query) {
                continue;
            }
            if index < self.leaf_count {
                hits.push(index);
            } else {
                // Reverse so that children pop in ascending order.
                stack.extend((node.first..node.first + node.count).rev());
            }
        }
        hits
    }

    /// Ids of every indexed rect that overlaps `query`, in ascending order.
    #[must_use]
    pub fn search(&self, query: &Rect) -> Vec<i32> {
        self.search_leaves(query)
            .into_iter()
            .map(|leaf| self.ids[leaf])
            .collect()
    }

    /// Rects overlapping `query`, with mutually overlapping hits merged.
    ///
    /// With `deband`, rects that stack vertically with identical left and
    /// right edges are additionally fused into one.
    #[must_use]
    pub fn search_and_consolidate_rects(&self, query: &Rect, deband: bool) -> Vec<Rect> {
        let mut merged: Vec<Rect> = Vec::new();
        for leaf in self.search_leaves(query) {
            let mut current = self.nodes[leaf].bounds;
            merged.retain(|r| {
                if geometry::intersects(r, &current) {
                    current = geometry::join(&current, r);
                    false
                } else {
                    true
                }
            });
            merged.insert(0, current);
        }
        if deband {
            merged = remove_banding(merged);
        }
        merged
    }
}

/// Fuses rects whose top edge meets another's bottom edge exactly and whose
/// horizontal extents match.
fn remove_banding(mut rects: Vec<Rect>) -> Vec<Rect> {
    rects.sort_by(|a, b| a.y0.total_cmp(&b.y0).then(a.x0.total_cmp(&b.x0)));
    let mut out: Vec<Rect> = Vec::with_capacity(rects.len());
    for rect in rects {
        match out
            .iter_mut()
            .find(|r| r.y1 == rect.y0 && r.x0 == rect.x0 && r.x1 == rect.x1)
        {
            Some(above) => above.y1 = rect.y1,
            None => out.push(rect),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize) -> (Vec<Rect>, Vec<i32>) {
        let mut rects = Vec::new();
        let mut ids = Vec::new();
        for i in 0..n {
            let x = (i % 10) as f64 * 10.0;
            let y = (i / 10) as f64 * 10.0;
            rects.push(Rect::new(x, y, x + 5.0, y + 5.0));
            ids.push(i32::try_from(i).unwrap());
        }
        (rects, ids)
    }

    #[test]
    fn search_finds_overlapping_ids_in_order() {
        let (rects, ids) = grid(100);
        let tree = DlRTree::new(&rects, &ids, |id| id >= 0);
        assert_eq!(tree.leaf_count(), 100);
        // 100 leaves, 13 level-1 nodes, 2 level-2 nodes, 1 root.
        assert_eq!(tree.node_count(), 116);
        let hits = tree.search(&Rect::new(12.0, 12.0, 33.0, 23.0));
        assert_eq!(hits, vec![11, 12, 13, 21, 22, 23]);
        assert_eq!(tree.bounds(), Rect::new(0.0, 0.0, 95.0, 95.0));
    }

    #[test]
    fn predicate_and_empty_rects_are_excluded() {
        let rects = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(5.0, 5.0, 5.0, 20.0),
            Rect::new(0.0, 0.0, 50.0, 50.0),
        ];
        let tree = DlRTree::new(&rects, &[0, 1, -1], |id| id >= 0);
        assert_eq!(
            tree.leaf_count(),
            1,
            "zero-width rect and synthetic id dropped"
        );
        assert_eq!(tree.search(&Rect::new(0.0, 0.0, 100.0, 100.0)), vec![0]);
        assert_eq!(tree.bounds_for(0), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(tree.bounds_for(2), None);
    }

    #[test]
    fn touching_edges_do_not_hit() {
        let tree = DlRTree::new(&[Rect::new(0.0, 0.0, 10.0, 10.0)], &[0], |_| true);
        assert!(tree.search(&Rect::new(10.0, 0.0, 20.0, 10.0)).is_empty());
    }

    #[test]
    fn empty_tree() {
        let tree = DlRTree::new(&[], &[], |_| true);
        assert_eq!(tree.bounds(), Rect::ZERO);
        assert!(tree.search(&Rect::new(0.0, 0.0, 1.0, 1.0)).is_empty());
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn consolidation_merges_overlaps() {
        let rects = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(5.0, 5.0, 15.0, 15.0),
            Rect::new(50.0, 50.0, 60.0, 60.0),
        ];
        let tree = DlRTree::new(&rects, &[0, 1, 2], |_| true);
        let query = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut merged = tree.search_and_consolidate_rects(&query, false);
        merged.sort_by(|a, b| a.x0.total_cmp(&b.x0));
        assert_eq!(
            merged,
            vec![Rect::new(0.0, 0.0, 15.0, 15.0), Rect::new(50.0, 50.0, 60.0, 60.0)]
        );
    }

    #[test]
    fn deband_fuses_stacked_rows() {
        let rects = [
            Rect::new(0.0, 0.0, 10.0, 5.0),
            Rect::new(0.0, 5.0, 10.0, 10.0),
            Rect::new(20.0, 5.0, 30.0, 10.0),
        ];
        let tree = DlRTree::new(&rects, &[0, 1, 2], |_| true);
        let query = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(tree.search_and_consolidate_rects(&query, false).len(), 3);
        let debanded = tree.search_and_consolidate_rects(&query, true);
        assert_eq!(
            debanded,
            vec![Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(20.0, 5.0, 30.0, 10.0)]
        );
    }
}
