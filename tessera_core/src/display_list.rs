// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The immutable recording produced by
//! [`DisplayListBuilder::build`](crate::builder::DisplayListBuilder::build).
//!
//! A [`DisplayList`] owns the record stream and its resource table together
//! with everything the builder derived while recording: device bounds, the
//! optional spatial index, and the opacity and thread-safety summaries a
//! compositor needs before it decides how to draw the list.
//!
//! Lists are `Send + Sync` and are shared as `Arc<DisplayList>`, including
//! when nested inside other lists.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

use kurbo::Rect;

use crate::buffer::{DlOpEntry, OpIter, RecordedOps};
use crate::color::DlBlendMode;
use crate::op::DlOp;
use crate::resource::DlResource;
use crate::rtree::DlRTree;

static NEXT_UNIQUE_ID: AtomicU32 = AtomicU32::new(1);

fn next_unique_id() -> u32 {
    NEXT_UNIQUE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Everything the builder hands over when it finishes a recording.
#[derive(Debug)]
pub(crate) struct DisplayListParts {
    pub(crate) recorded: RecordedOps,
    pub(crate) nested_op_count: u32,
    pub(crate) nested_byte_count: usize,
    pub(crate) bounds: Rect,
    pub(crate) rtree: Option<DlRTree>,
    pub(crate) can_apply_group_opacity: bool,
    pub(crate) is_ui_thread_safe: bool,
    pub(crate) modifies_transparent_black: bool,
    pub(crate) root_has_backdrop_filter: bool,
    pub(crate) max_root_blend_mode: DlBlendMode,
    pub(crate) is_unbounded: bool,
}

/// A finished, immutable recording.
pub struct DisplayList {
    storage: Vec<u8>,
    resources: Vec<DlResource>,
    op_count: u32,
    op_index_count: u32,
    nested_op_count: u32,
    nested_byte_count: usize,
    unique_id: u32,
    bounds: Rect,
    rtree: Option<Arc<DlRTree>>,
    can_apply_group_opacity: bool,
    is_ui_thread_safe: bool,
    modifies_transparent_black: bool,
    root_has_backdrop_filter: bool,
    max_root_blend_mode: DlBlendMode,
    is_unbounded: bool,
}

impl core::fmt::Debug for DisplayList {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DisplayList")
            .field("unique_id", &self.unique_id)
            .field("op_count", &self.op_count)
            .field("byte_count", &self.storage.len())
            .field("bounds", &self.bounds)
            .field("has_rtree", &self.rtree.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for DisplayList {
    /// An empty list with no bounds.
    fn default() -> Self {
        Self::from_parts(DisplayListParts {
            recorded: RecordedOps::default(),
            nested_op_count: 0,
            nested_byte_count: 0,
            bounds: Rect::ZERO,
            rtree: None,
            can_apply_group_opacity: true,
            is_ui_thread_safe: true,
            modifies_transparent_black: false,
            root_has_backdrop_filter: false,
            max_root_blend_mode: DlBlendMode::Clear,
            is_unbounded: false,
        })
    }
}

impl DisplayList {
    pub(crate) fn from_parts(parts: DisplayListParts) -> Self {
        Self {
            storage: parts.recorded.storage,
            resources: parts.recorded.resources,
            op_count: parts.recorded.render_op_count,
            op_index_count: parts.recorded.op_index_count,
            nested_op_count: parts.nested_op_count,
            nested_byte_count: parts.nested_byte_count,
            unique_id: next_unique_id(),
            bounds: parts.bounds,
            rtree: parts.rtree.map(Arc::new),
            can_apply_group_opacity: parts.can_apply_group_opacity,
            is_ui_thread_safe: parts.is_ui_thread_safe,
            modifies_transparent_black: parts.modifies_transparent_black,
            root_has_backdrop_filter: parts.root_has_backdrop_filter,
            max_root_blend_mode: parts.max_root_blend_mode,
            is_unbounded: parts.is_unbounded,
        }
    }

    /// Rendering records, attribute ops excluded.
    ///
    /// With `nested`, the ops of nested lists are counted in place of the
    /// records that draw them.
    #[must_use]
    pub fn op_count(&self, nested: bool) -> u32 {
        if nested {
            self.op_count.saturating_add(self.nested_op_count)
        } else {
            self.op_count
        }
    }

    /// Number of records, attribute ops included.
    #[must_use]
    pub fn total_op_index_count(&self) -> u32 {
        self.op_index_count
    }

    /// Size of the record stream in bytes, optionally including the streams
    /// of nested lists.
    #[must_use]
    pub fn bytes(&self, nested: bool) -> usize {
        if nested {
            self.storage.len().saturating_add(self.nested_byte_count)
        } else {
            self.storage.len()
        }
    }

    /// Process-wide identifier, distinct for every list built.
    #[inline]
    #[must_use]
    pub fn unique_id(&self) -> u32 {
        self.unique_id
    }

    /// Device-space bounds of everything drawn.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The spatial index, when the list was recorded with one.
    #[must_use]
    pub fn rtree(&self) -> Option<&Arc<DlRTree>> {
        self.rtree.as_ref()
    }

    /// Can a group opacity be applied to each op instead of to a layer?
    #[inline]
    #[must_use]
    pub fn can_apply_group_opacity(&self) -> bool {
        self.can_apply_group_opacity
    }

    /// Can every embedded resource be used off the recording thread?
    #[inline]
    #[must_use]
    pub fn is_ui_thread_safe(&self) -> bool {
        self.is_ui_thread_safe
    }

    /// Does some root-level op change pixels it does not cover?
    #[inline]
    #[must_use]
    pub fn modifies_transparent_black(&self) -> bool {
        self.modifies_transparent_black
    }

    /// Does a root-level save layer carry a backdrop filter?
    #[inline]
    #[must_use]
    pub fn root_has_backdrop_filter(&self) -> bool {
        self.root_has_backdrop_filter
    }

    /// Highest blend mode used at the root level.
    #[inline]
    #[must_use]
    pub fn max_root_blend_mode(&self) -> DlBlendMode {
        self.max_root_blend_mode
    }

    /// Does some content reach the edge of the cull rect because it could
    /// not be bounded?
    #[inline]
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.is_unbounded
    }

    /// The raw record stream.
    #[must_use]
    pub fn storage(&self) -> &[u8] {
        &self.storage
    }

    /// The resource table the stream refers to.
    #[must_use]
    pub fn resources(&self) -> &[DlResource] {
        &self.resources
    }

    /// Decodes every record in order.
    #[must_use]
    pub fn iter(&self) -> OpIter<'_> {
        OpIter::new(&self.storage, &self.resources)
    }

    /// Decodes the records that matter for drawing into `cull_rect`.
    ///
    /// Without a spatial index this is the same as [`iter`](Self::iter).
    /// With one, draw records whose bounds miss `cull_rect` are dropped and
    /// so are save/restore ranges that contain no hit. Attribute records are
    /// never dropped, since they outlive the save that encloses them.
    #[must_use]
    pub fn iter_culled(&self, cull_rect: &Rect) -> CulledOpIter<'_> {
        let hits = self.rtree.as_ref().map(|rtree| {
            let mut ids = rtree.search(cull_rect);
            ids.sort_unstable();
            ids
        });
        CulledOpIter {
            ops: self.iter(),
            hits,
            next_hit: 0,
            skip_until: None,
        }
    }

    /// Are both lists the same recording?
    ///
    /// Streams must be byte-identical and every resource slot must refer to
    /// the very same shared object.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        if core::ptr::eq(self, other) {
            return true;
        }
        self.op_count == other.op_count
            && self.storage == other.storage
            && self.resources.len() == other.resources.len()
            && self
                .resources
                .iter()
                .zip(&other.resources)
                .all(|(a, b)| a.same_as(b))
    }
}

/// Iterator returned by [`DisplayList::iter_culled`].
#[derive(Clone, Debug)]
pub struct CulledOpIter<'a> {
    ops: OpIter<'a>,
    hits: Option<Vec<i32>>,
    next_hit: usize,
    skip_until: Option<u32>,
}

impl CulledOpIter<'_> {
    /// First spatial hit at or after `index`.
    fn next_hit_from(&mut self, index: u32) -> Option<u32> {
        let hits = self.hits.as_ref()?;
        while let Some(&id) = hits.get(self.next_hit) {
            match u32::try_from(id) {
                Ok(id) if id >= index => return Some(id),
                _ => self.next_hit += 1,
            }
        }
        None
    }
}

impl<'a> Iterator for CulledOpIter<'a> {
    type Item = DlOpEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = self.ops.next()?;
            if self.hits.is_none() {
                return Some(entry);
            }
            let kind = entry.op.op_type();
            if let Some(end) = self.skip_until {
                if entry.index >= end {
                    self.skip_until = None;
                    if entry.index == end {
                        continue;
                    }
                } else if kind.is_attribute() {
                    return Some(entry);
                } else {
                    continue;
                }
            }
            let next_hit = self.next_hit_from(entry.index);
            if kind.is_draw() {
                if next_hit == Some(entry.index) {
                    return Some(entry);
                }
                continue;
            }
            let restore_index = match entry.op {
                DlOp::Save { restore_index } | DlOp::SaveLayer { restore_index, .. } => {
                    restore_index
                }
                _ => return Some(entry),
            };
            // A hit tagged with the restore index itself is a flood from the
            // layer's filter and keeps the range alive.
            if restore_index > entry.index && next_hit.is_none_or(|hit| hit > restore_index) {
                self.skip_until = Some(restore_index);
                continue;
            }
            return Some(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DisplayListBuilder;
    use crate::paint::DlPaint;
    use alloc::vec;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn display_list_is_send_and_sync() {
        assert_send_sync::<DisplayList>();
        assert_send_sync::<Arc<DisplayList>>();
    }

    #[test]
    fn unique_ids_differ() {
        let a = DisplayList::default();
        let b = DisplayList::default();
        assert_ne!(a.unique_id(), b.unique_id());
        assert_eq!(a.op_count(true), 0);
        assert_eq!(a.bytes(false), 0);
        assert!(a.iter().next().is_none());
    }

    fn two_rects(prepare_rtree: bool) -> DisplayList {
        let mut b = DisplayListBuilder::new(None, prepare_rtree);
        let paint = DlPaint::new();
        b.draw_rect_with_paint(&Rect::new(0.0, 0.0, 10.0, 10.0), &paint);
        b.save();
        b.translate(100.0, 0.0);
        b.draw_rect_with_paint(&Rect::new(0.0, 0.0, 10.0, 10.0), &paint);
        b.restore();
        b.build()
    }

    #[test]
    fn equal_recordings_compare_equal() {
        let a = two_rects(false);
        let b = two_rects(false);
        assert!(a.equals(&b));
        assert!(a.equals(&a));
        assert_ne!(a.unique_id(), b.unique_id());
        assert!(!a.equals(&DisplayList::default()));
    }

    #[test]
    fn culled_iteration_skips_missed_ranges() {
        let dl = two_rects(true);
        let all: Vec<_> = dl.iter().map(|e| e.op.op_type()).collect();
        let culled: Vec<_> = dl
            .iter_culled(&Rect::new(0.0, 0.0, 20.0, 20.0))
            .map(|e| e.op.op_type())
            .collect();
        assert_eq!(all.len(), 5, "draw, save, translate, draw, restore");
        assert_eq!(culled, vec![crate::op::DlOpType::DrawRect]);

        let right: Vec<_> = dl
            .iter_culled(&Rect::new(100.0, 0.0, 120.0, 20.0))
            .map(|e| e.index)
            .collect();
        assert_eq!(
            right,
            vec![1, 2, 3, 4],
            "only the translated range survives"
        );
    }

    #[test]
    fn culled_iteration_without_rtree_keeps_everything() {
        let dl = two_rects(false);
        assert_eq!(
            dl.iter_culled(&Rect::new(500.0, 500.0, 600.0, 600.0)).count(),
            dl.iter().count()
        );
    }
}
