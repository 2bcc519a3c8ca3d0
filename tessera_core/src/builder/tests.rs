// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Builder behavior tests.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Point, Rect, RoundedRect};

use super::*;
use crate::color::{DlBlendMode, DlColor};
use crate::effects::{
    DlBlendColorFilter, DlBlurImageFilter, DlColorFilter, DlImageFilter, DlImageFilterType,
    DlOffsetImageFilter,
};
use crate::geometry::DlRSTransform;
use crate::op::{DlClipOp, DlOp, DlOpType, DlPointMode, SaveLayerOptions};
use crate::paint::{DlBlurMaskFilter, DlBlurStyle, DlDrawStyle};
use crate::path::{DlPath, DlPathFillType};
use crate::resource::{DlImage, DlImageSampling};

fn r(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect {
    Rect::new(x0, y0, x1, y1)
}

fn red() -> DlPaint {
    DlPaint::from_color(DlColor::RED)
}

fn kinds(list: &DisplayList) -> Vec<DlOpType> {
    list.iter().map(|e| e.op.op_type()).collect()
}

fn layer_options(list: &DisplayList) -> Vec<SaveLayerOptions> {
    list.iter()
        .filter_map(|e| match e.op {
            DlOp::SaveLayer { options, .. } => Some(options),
            _ => None,
        })
        .collect()
}

/// Records `draw` inside a plain save layer and reports whether the layer
/// may distribute opacity.
fn layer_distributes(draw: impl FnOnce(&mut DisplayListBuilder)) -> bool {
    let mut b = DisplayListBuilder::new(None, false);
    b.save_layer(None, None, None);
    draw(&mut b);
    b.restore();
    let options = layer_options(&b.build());
    assert_eq!(options.len(), 1, "one layer recorded");
    options[0].contains(SaveLayerOptions::CAN_DISTRIBUTE_OPACITY)
}

#[derive(Debug)]
struct Unbounded;

impl DlImageFilter for Unbounded {
    fn kind(&self) -> DlImageFilterType {
        DlImageFilterType::Matrix
    }

    fn modifies_transparent_black(&self) -> bool {
        false
    }

    fn map_local_bounds(&self, _input: &Rect) -> Option<Rect> {
        None
    }

    fn map_device_bounds(&self, _input: &Rect, _ctm: &DlMatrix) -> Option<Rect> {
        None
    }
}

#[derive(Debug)]
struct Picture {
    thread_safe: bool,
}

impl DlImage for Picture {
    fn width(&self) -> u32 {
        20
    }

    fn height(&self) -> u32 {
        10
    }

    fn is_ui_thread_safe(&self) -> bool {
        self.thread_safe
    }
}

// -- end-to-end ---------------------------------------------------------------

#[test]
fn single_rect() {
    let mut b = DisplayListBuilder::default();
    b.draw_rect_with_paint(&r(0.0, 0.0, 10.0, 10.0), &red());
    let list = b.build();
    assert_eq!(list.op_count(false), 1);
    assert_eq!(list.bounds(), r(0.0, 0.0, 10.0, 10.0));
    assert!(!list.is_unbounded());
    assert!(list.can_apply_group_opacity());
    assert!(list.is_ui_thread_safe());
    assert_eq!(kinds(&list), vec![DlOpType::SetColor, DlOpType::DrawRect]);
}

#[test]
fn translated_rect_in_save() {
    let mut b = DisplayListBuilder::default();
    b.save();
    b.translate(5.0, 5.0);
    b.draw_rect_with_paint(&r(0.0, 0.0, 10.0, 10.0), &red());
    b.restore();
    let list = b.build();
    assert_eq!(list.op_count(false), 4, "save, translate, draw, restore");
    assert_eq!(list.bounds(), r(5.0, 5.0, 15.0, 15.0));
    assert_eq!(
        kinds(&list),
        vec![
            DlOpType::Save,
            DlOpType::Translate,
            DlOpType::SetColor,
            DlOpType::DrawRect,
            DlOpType::Restore,
        ]
    );
}

#[test]
fn draw_color_in_plain_layer_distributes_opacity() {
    let mut b = DisplayListBuilder::new(Some(r(0.0, 0.0, 100.0, 100.0)), false);
    b.save_layer(None, None, None);
    b.draw_color(DlColor::BLUE, DlBlendMode::SrcOver);
    b.restore();
    let list = b.build();
    assert_eq!(
        list.bounds(),
        r(0.0, 0.0, 100.0, 100.0),
        "draw_color floods the clip"
    );
    assert!(list.is_unbounded());
    let options = layer_options(&list);
    assert_eq!(options.len(), 1);
    assert!(
        options[0].contains(SaveLayerOptions::CAN_DISTRIBUTE_OPACITY)
    );
    assert!(
        !options[0].contains(SaveLayerOptions::RENDERS_WITH_ATTRIBUTES)
    );
}

#[test]
fn reversed_rect_is_ignored() {
    let mut b = DisplayListBuilder::default();
    b.draw_rect_with_paint(&r(10.0, 10.0, 5.0, 5.0), &red());
    let list = b.build();
    assert_eq!(list.op_count(false), 0);
    assert_eq!(list.bounds(), Rect::ZERO);
}

// -- deferred saves -----------------------------------------------------------

#[test]
fn empty_save_restore_records_nothing() {
    let mut b = DisplayListBuilder::default();
    b.draw_rect_with_paint(&r(0.0, 0.0, 1.0, 1.0), &red());
    let used = b.used_bytes();
    let count = b.op_count();
    b.save();
    b.translate(0.0, 0.0);
    b.restore();
    assert_eq!(b.used_bytes(), used, "no growth");
    assert_eq!(b.op_count(), count);
}

#[test]
fn attribute_changes_do_not_open_a_save() {
    let mut b = DisplayListBuilder::default();
    b.save();
    b.set_color(DlColor::GREEN);
    b.restore();
    let list = b.build();
    assert_eq!(kinds(&list), vec![DlOpType::SetColor]);
    assert_eq!(list.op_count(false), 0, "attribute ops are not render ops");
    assert_eq!(list.total_op_index_count(), 1);
}

#[test]
fn only_the_save_with_content_materializes() {
    let mut b = DisplayListBuilder::default();
    b.save();
    b.save();
    b.draw_rect(&r(0.0, 0.0, 1.0, 1.0));
    b.restore();
    b.restore();
    let list = b.build();
    assert_eq!(
        kinds(&list),
        vec![DlOpType::Save, DlOpType::DrawRect, DlOpType::Restore]
    );
}

#[test]
fn restore_indices_point_at_matching_restores() {
    let mut b = DisplayListBuilder::default();
    b.save();
    b.translate(1.0, 2.0);
    b.save_layer(Some(&r(0.0, 0.0, 50.0, 50.0)), None, None);
    b.draw_rect(&r(0.0, 0.0, 10.0, 10.0));
    b.save();
    b.scale(2.0, 2.0);
    b.draw_oval(&r(0.0, 0.0, 10.0, 10.0));
    b.restore();
    b.restore();
    b.draw_rect(&r(20.0, 20.0, 30.0, 30.0));
    b.restore();
    let list = b.build();

    let mut open = Vec::new();
    let mut saves = 0;
    for e in list.iter() {
        match e.op {
            DlOp::Save { restore_index } | DlOp::SaveLayer { restore_index, .. } => {
                saves += 1;
                open.push(restore_index);
            }
            DlOp::Restore => {
                let expected = open.pop().expect("every restore closes a save");
                assert_eq!(expected, e.index, "restore index of the save closed here");
            }
            _ => {}
        }
    }
    assert!(open.is_empty(), "every save is closed");
    assert_eq!(saves, 3);
}

#[test]
fn restore_to_count_clamps_at_root() {
    let mut b = DisplayListBuilder::default();
    b.save();
    b.save();
    b.save();
    assert_eq!(b.save_count(), 4);
    b.restore_to_count(2);
    assert_eq!(b.save_count(), 2);
    b.restore_to_count(0);
    assert_eq!(b.save_count(), 1);
    b.restore();
    assert_eq!(b.save_count(), 1, "restore at the root is a no-op");
}

// -- transforms ---------------------------------------------------------------

#[test]
fn identity_and_invalid_transforms_are_dropped() {
    let mut b = DisplayListBuilder::default();
    b.translate(0.0, 0.0);
    b.scale(1.0, 1.0);
    b.rotate(0.0);
    b.rotate(360.0);
    b.rotate(-720.0);
    b.skew(0.0, 0.0);
    b.translate(f64::NAN, 1.0);
    b.scale(f64::INFINITY, 1.0);
    b.transform_2d_affine(1.0, 0.0, 0.0, 0.0, 1.0, 0.0);
    b.transform(&Affine::IDENTITY);
    b.transform_matrix(&DlMatrix::IDENTITY);
    assert_eq!(b.matrix(), DlMatrix::IDENTITY);
    b.draw_rect(&r(0.0, 0.0, 10.0, 10.0));
    let list = b.build();
    assert_eq!(kinds(&list), vec![DlOpType::DrawRect]);
    assert_eq!(list.bounds(), r(0.0, 0.0, 10.0, 10.0));
}

#[test]
fn transforms_collapse_to_cheaper_forms() {
    let mut b = DisplayListBuilder::default();
    b.transform_2d_affine(1.0, 0.0, 5.0, 0.0, 1.0, 7.0);
    b.transform(&Affine::scale(2.0));
    let mut m = DlMatrix::IDENTITY.to_row_major();
    m[1] = 0.5;
    b.transform_full_perspective(&m);
    m[12] = 0.001;
    b.transform_full_perspective(&m);
    let list = b.build();
    assert_eq!(
        kinds(&list),
        vec![
            DlOpType::Translate,
            DlOpType::Transform2DAffine,
            DlOpType::Transform2DAffine,
            DlOpType::TransformFullPerspective,
        ]
    );
}

#[test]
fn set_transform_replaces_and_records_a_reset() {
    let mut b = DisplayListBuilder::default();
    b.translate(10.0, 10.0);
    b.set_transform(&DlMatrix::from_scale(3.0, 3.0));
    assert_eq!(b.affine(), Some(Affine::scale(3.0)));
    let list = b.build();
    assert_eq!(
        kinds(&list),
        vec![
            DlOpType::Translate,
            DlOpType::TransformReset,
            DlOpType::Transform2DAffine,
        ]
    );
    assert_eq!(
        list.op_count(false),
        3,
        "a transform reset counts as a render op"
    );
}

#[test]
fn restore_restores_the_transform() {
    let mut b = DisplayListBuilder::default();
    b.save();
    b.rotate(30.0);
    b.restore();
    assert_eq!(b.matrix(), DlMatrix::IDENTITY);
}

// -- clips and culling --------------------------------------------------------

#[test]
fn quick_reject_and_culled_draws() {
    let mut b = DisplayListBuilder::new(Some(r(0.0, 0.0, 100.0, 100.0)), false);
    assert!(b.quick_reject(&r(200.0, 200.0, 300.0, 300.0)));
    assert!(!b.quick_reject(&r(50.0, 50.0, 150.0, 150.0)));
    b.draw_rect(&r(20.0, 20.0, 30.0, 30.0));
    b.draw_rect(&r(200.0, 200.0, 300.0, 300.0));
    b.draw_rect(&r(90.0, 90.0, 150.0, 150.0));
    let list = b.build();
    assert_eq!(
        list.op_count(false),
        2,
        "the rect outside the clip is dropped"
    );
    assert_eq!(
        list.bounds(),
        r(20.0, 20.0, 100.0, 100.0),
        "clipped to the cull rect"
    );
}

#[test]
fn clip_queries_follow_the_transform() {
    let mut b = DisplayListBuilder::default();
    b.translate(10.0, 10.0);
    b.clip_rect(&r(0.0, 0.0, 20.0, 20.0), DlClipOp::Intersect, false);
    assert_eq!(b.device_cull_rect(), r(10.0, 10.0, 30.0, 30.0));
    assert_eq!(b.local_cull_rect(), r(0.0, 0.0, 20.0, 20.0));
}

#[test]
fn redundant_clips_are_dropped() {
    let mut b = DisplayListBuilder::default();
    b.clip_rect(&r(0.0, 0.0, 50.0, 50.0), DlClipOp::Intersect, false);
    b.clip_rect(&r(-10.0, -10.0, 100.0, 100.0), DlClipOp::Intersect, false);
    b.clip_rect(&r(10.0, 10.0, 40.0, 40.0), DlClipOp::Intersect, false);
    let list = b.build();
    assert_eq!(
        kinds(&list),
        vec![DlOpType::ClipIntersectRect, DlOpType::ClipIntersectRect]
    );
}

#[test]
fn clip_shapes_are_demoted() {
    let mut b = DisplayListBuilder::default();
    b.clip_rrect(
        &RoundedRect::from_rect(r(0.0, 0.0, 100.0, 100.0), 0.0),
        DlClipOp::Intersect,
        true,
    );
    b.clip_rrect(
        &RoundedRect::from_rect(r(0.0, 0.0, 90.0, 90.0), 45.0),
        DlClipOp::Intersect,
        true,
    );
    b.clip_path(
        &DlPath::oval(r(0.0, 0.0, 80.0, 40.0)),
        DlClipOp::Intersect,
        true,
    );
    let inverse =
        DlPath::rect(r(0.0, 0.0, 10.0, 10.0)).with_fill_type(DlPathFillType::InverseNonZero);
    b.clip_path(&inverse, DlClipOp::Intersect, true);
    let list = b.build();
    assert_eq!(
        kinds(&list),
        vec![
            DlOpType::ClipIntersectRect,
            DlOpType::ClipIntersectOval,
            DlOpType::ClipIntersectOval,
            DlOpType::ClipDifferenceRect,
        ]
    );
}

#[test]
fn emptied_clip_turns_the_frame_into_a_nop() {
    let mut b = DisplayListBuilder::default();
    b.save();
    b.clip_rect(&r(0.0, 0.0, 0.0, 0.0), DlClipOp::Intersect, false);
    b.draw_rect(&r(0.0, 0.0, 10.0, 10.0));
    b.translate(5.0, 5.0);
    b.save();
    b.draw_paint();
    b.restore();
    b.restore();
    b.draw_rect(&r(0.0, 0.0, 10.0, 10.0));
    let list = b.build();
    assert_eq!(kinds(&list), vec![DlOpType::DrawRect]);
    assert_eq!(list.bounds(), r(0.0, 0.0, 10.0, 10.0));
}

// -- paint and bounds ---------------------------------------------------------

#[test]
fn unchanged_attributes_are_not_recorded() {
    let mut b = DisplayListBuilder::default();
    b.draw_rect_with_paint(&r(0.0, 0.0, 1.0, 1.0), &red());
    b.draw_rect_with_paint(&r(2.0, 2.0, 3.0, 3.0), &red());
    b.set_color(DlColor::RED);
    let list = b.build();
    assert_eq!(
        kinds(&list),
        vec![DlOpType::SetColor, DlOpType::DrawRect, DlOpType::DrawRect]
    );
}

#[test]
fn non_finite_stroke_values_are_dropped() {
    let mut b = DisplayListBuilder::default();
    b.set_stroke_width(f64::NAN);
    b.set_stroke_width(f64::NAN);
    b.set_stroke_miter(f64::INFINITY);
    b.set_stroke_width(2.0);
    b.set_stroke_width(2.0);
    assert_eq!(b.current_attributes().stroke_width, 2.0);
    assert_eq!(
        b.current_attributes().stroke_miter,
        DlPaint::new().stroke_miter
    );
    let list = b.build();
    assert_eq!(
        kinds(&list),
        vec![DlOpType::SetStrokeWidth],
        "one valid change"
    );
}

#[test]
fn shared_attributes_compare_by_identity() {
    let make = || -> Arc<dyn DlColorFilter> {
        Arc::new(DlBlendColorFilter {
            color: DlColor::RED,
            mode: DlBlendMode::SrcIn,
        })
    };
    let (a, b_filter) = (make(), make());
    let mut b = DisplayListBuilder::default();
    b.set_color_filter(Some(&a));
    b.set_color_filter(Some(&a));
    b.set_color_filter(Some(&b_filter));
    b.set_color_filter(None);
    b.set_color_filter(None);
    let list = b.build();
    assert_eq!(
        kinds(&list),
        vec![
            DlOpType::SetColorFilter,
            DlOpType::SetColorFilter,
            DlOpType::ClearColorFilter,
        ]
    );
}

#[test]
fn stroke_and_mask_outset_bounds() {
    let mut b = DisplayListBuilder::default();
    let stroke = DlPaint::new()
        .with_draw_style(DlDrawStyle::Stroke)
        .with_stroke_width(4.0);
    b.draw_rect_with_paint(&r(0.0, 0.0, 10.0, 10.0), &stroke);
    assert_eq!(b.build().bounds(), r(-2.0, -2.0, 12.0, 12.0));

    let blurred =
        DlPaint::new().with_mask_filter(Some(DlBlurMaskFilter::new(DlBlurStyle::Normal, 2.0)));
    b.draw_rect_with_paint(&r(0.0, 0.0, 10.0, 10.0), &blurred);
    assert_eq!(b.build().bounds(), r(-6.0, -6.0, 16.0, 16.0), "three sigma");
}

#[test]
fn horizontal_lines_are_bounded_by_their_stroke() {
    let mut b = DisplayListBuilder::default();
    let paint = DlPaint::new().with_stroke_width(2.0);
    b.draw_line_with_paint(Point::new(0.0, 5.0), Point::new(10.0, 5.0), &paint);
    let list = b.build();
    assert_eq!(list.op_count(false), 1);
    assert_eq!(list.bounds(), r(-1.0, 4.0, 11.0, 6.0));
}

#[test]
fn invisible_paints_are_dropped() {
    let mut b = DisplayListBuilder::default();
    b.draw_rect_with_paint(
        &r(0.0, 0.0, 10.0, 10.0),
        &DlPaint::from_color(DlColor::TRANSPARENT),
    );
    b.draw_color(DlColor::RED, DlBlendMode::Dst);
    b.draw_paint_with_paint(&DlPaint::new().with_blend_mode(DlBlendMode::Dst));
    let list = b.build();
    assert_eq!(list.op_count(false), 0);
    assert_eq!(list.bounds(), Rect::ZERO);
}

#[test]
fn clear_preserves_transparency() {
    let mut b = DisplayListBuilder::new(Some(r(0.0, 0.0, 10.0, 10.0)), false);
    b.draw_color(DlColor::RED, DlBlendMode::Clear);
    let list = b.build();
    assert_eq!(list.op_count(false), 1);
    assert!(!list.modifies_transparent_black());
    assert_eq!(list.max_root_blend_mode(), DlBlendMode::Clear);

    b.draw_color(DlColor::RED, DlBlendMode::Src);
    let list = b.build();
    assert!(list.modifies_transparent_black());
    assert_eq!(list.max_root_blend_mode(), DlBlendMode::Src);
}

#[test]
fn paths_are_demoted_and_inverse_fills_flood() {
    let mut b = DisplayListBuilder::new(Some(r(0.0, 0.0, 100.0, 100.0)), false);
    b.draw_path(&DlPath::rect(r(0.0, 0.0, 10.0, 10.0)));
    b.draw_path(&DlPath::oval(r(0.0, 0.0, 10.0, 20.0)));
    b.draw_rrect(&RoundedRect::from_rect(r(0.0, 0.0, 10.0, 10.0), 0.0));
    let list = b.build();
    assert_eq!(
        kinds(&list),
        vec![DlOpType::DrawRect, DlOpType::DrawOval, DlOpType::DrawRect]
    );
    assert!(!list.is_unbounded());

    let mut triangle = BezPath::new();
    triangle.move_to((10.0, 10.0));
    triangle.line_to((20.0, 10.0));
    triangle.line_to((15.0, 20.0));
    triangle.close_path();
    b.draw_path(
        &DlPath::new(triangle).with_fill_type(DlPathFillType::InverseEvenOdd),
    );
    let list = b.build();
    assert_eq!(kinds(&list), vec![DlOpType::DrawPath]);
    assert!(list.is_unbounded());
    assert_eq!(list.bounds(), r(0.0, 0.0, 100.0, 100.0));
}

// -- group opacity ------------------------------------------------------------

#[test]
fn one_compatible_op_distributes_opacity() {
    assert!(layer_distributes(|b| b.draw_rect(&r(0.0, 0.0, 10.0, 10.0))));
}

#[test]
fn second_compatible_op_breaks_distribution() {
    assert!(!layer_distributes(|b| {
        b.draw_rect(&r(0.0, 0.0, 10.0, 10.0));
        b.draw_oval(&r(20.0, 0.0, 30.0, 10.0));
    }));
}

#[test]
fn incompatible_ops_break_distribution() {
    assert!(!layer_distributes(|b| {
        b.draw_points(
            DlPointMode::Points,
            &[Point::new(1.0, 1.0), Point::new(5.0, 5.0)],
        );
    }));
    assert!(!layer_distributes(|b| {
        b.draw_rect_with_paint(
            &r(0.0, 0.0, 10.0, 10.0),
            &DlPaint::new().with_blend_mode(DlBlendMode::Multiply),
        );
    }));
    assert!(!layer_distributes(|b| {
        let hairline = DlPaint::new()
            .with_draw_style(DlDrawStyle::Stroke)
            .with_stroke_width(0.0);
        b.draw_rect_with_paint(&r(0.0, 0.0, 10.0, 10.0), &hairline);
    }));
    assert!(!layer_distributes(|b| {
        b.draw_color(DlColor::RED, DlBlendMode::Src);
    }));
}

#[test]
fn plain_saves_fold_into_their_parent() {
    assert!(!layer_distributes(|b| {
        b.save();
        b.translate(1.0, 1.0);
        b.draw_rect(&r(0.0, 0.0, 10.0, 10.0));
        b.restore();
        b.draw_rect(&r(20.0, 0.0, 30.0, 10.0));
    }));
    assert!(layer_distributes(|b| {
        b.save();
        b.translate(1.0, 1.0);
        b.draw_rect(&r(0.0, 0.0, 10.0, 10.0));
        b.restore();
    }));
}

#[test]
fn nested_layers_count_once_in_their_parent() {
    assert!(layer_distributes(|b| {
        b.save_layer(None, None, None);
        b.draw_rect(&r(0.0, 0.0, 10.0, 10.0));
        b.draw_rect(&r(20.0, 0.0, 30.0, 10.0));
        b.restore();
    }));
}

#[test]
fn root_group_opacity() {
    let mut b = DisplayListBuilder::default();
    b.draw_rect(&r(0.0, 0.0, 10.0, 10.0));
    assert!(b.build().can_apply_group_opacity());
    b.draw_rect(&r(0.0, 0.0, 10.0, 10.0));
    b.draw_rect(&r(20.0, 0.0, 30.0, 10.0));
    assert!(!b.build().can_apply_group_opacity());
}

// -- layers -------------------------------------------------------------------

#[test]
fn transparent_layer_becomes_a_nop_frame() {
    let mut b = DisplayListBuilder::default();
    b.save_layer(None, Some(&DlPaint::from_color(DlColor::TRANSPARENT)), None);
    b.draw_rect(&r(0.0, 0.0, 10.0, 10.0));
    b.draw_paint();
    b.restore();
    assert_eq!(b.save_count(), 1);
    let list = b.build();
    assert_eq!(list.op_count(false), 0);
    assert_eq!(list.bounds(), Rect::ZERO);
    assert!(!kinds(&list).contains(&DlOpType::SaveLayer));
}

#[test]
fn layer_bounds_clip_their_content() {
    let mut b = DisplayListBuilder::default();
    b.save_layer(Some(&r(0.0, 0.0, 5.0, 5.0)), None, None);
    b.draw_rect(&r(0.0, 0.0, 10.0, 10.0));
    b.restore();
    let list = b.build();
    assert_eq!(list.bounds(), r(0.0, 0.0, 5.0, 5.0));
    assert_eq!(kinds(&list)[0], DlOpType::SaveLayerBounds);
}

#[test]
fn layer_filter_moves_content_bounds() {
    let offset: Arc<dyn DlImageFilter> = Arc::new(DlOffsetImageFilter { dx: 10.0, dy: 0.0 });
    let mut b = DisplayListBuilder::default();
    b.save_layer(
        None,
        Some(&DlPaint::new().with_image_filter(Some(offset))),
        None,
    );
    b.draw_rect_with_paint(&r(0.0, 0.0, 10.0, 10.0), &DlPaint::new());
    b.restore();
    let list = b.build();
    assert_eq!(list.bounds(), r(10.0, 0.0, 20.0, 10.0));
    assert!(!list.is_unbounded());
    let options = layer_options(&list);
    assert!(
        options[0].contains(SaveLayerOptions::RENDERS_WITH_ATTRIBUTES)
    );
    assert!(
        !options[0].contains(SaveLayerOptions::CAN_DISTRIBUTE_OPACITY),
        "a filtering layer cannot take an inherited opacity"
    );
}

#[test]
fn unmappable_layer_filter_floods_the_clip() {
    let filter: Arc<dyn DlImageFilter> = Arc::new(Unbounded);
    let mut b = DisplayListBuilder::new(Some(r(0.0, 0.0, 100.0, 100.0)), false);
    b.save_layer(
        None,
        Some(&DlPaint::new().with_image_filter(Some(filter))),
        None,
    );
    b.draw_rect_with_paint(&r(0.0, 0.0, 10.0, 10.0), &DlPaint::new());
    b.restore();
    let list = b.build();
    assert!(list.is_unbounded());
    assert_eq!(list.bounds(), r(0.0, 0.0, 100.0, 100.0));
}

#[test]
fn backdrop_layers_flood_and_are_reported() {
    let blur: Arc<dyn DlImageFilter> = Arc::new(DlBlurImageFilter {
        sigma_x: 4.0,
        sigma_y: 4.0,
    });
    let mut b = DisplayListBuilder::new(Some(r(0.0, 0.0, 50.0, 50.0)), false);
    b.save_layer(None, None, Some(&blur));
    b.draw_rect(&r(0.0, 0.0, 10.0, 10.0));
    b.restore();
    let list = b.build();
    assert!(list.root_has_backdrop_filter());
    assert!(list.is_unbounded());
    assert_eq!(list.bounds(), r(0.0, 0.0, 50.0, 50.0));
    assert_eq!(kinds(&list)[0], DlOpType::SaveLayerBackdrop);
}

// -- nested lists and resources -----------------------------------------------

fn two_shapes(prepare_rtree: bool) -> Arc<DisplayList> {
    let mut b = DisplayListBuilder::new(None, prepare_rtree);
    b.draw_rect(&r(0.0, 0.0, 10.0, 10.0));
    b.draw_oval(&r(20.0, 20.0, 30.0, 30.0));
    Arc::new(b.build())
}

#[test]
fn nested_display_lists_fold_counts_and_flags() {
    let nested = two_shapes(false);
    let mut b = DisplayListBuilder::default();
    b.translate(5.0, 5.0);
    b.draw_display_list(&nested, 1.0);
    let list = b.build();
    assert_eq!(list.op_count(false), 2);
    assert_eq!(list.op_count(true), 3, "the nested op replaces the draw");
    assert_eq!(list.bytes(true), list.bytes(false) + nested.bytes(true));
    assert_eq!(list.bounds(), r(5.0, 5.0, 35.0, 35.0));
    assert!(
        !list.can_apply_group_opacity(),
        "the nested list has two ops"
    );
}

#[test]
fn nested_spatial_index_contributes_regions() {
    let nested = two_shapes(true);
    let mut b = DisplayListBuilder::new(None, true);
    b.draw_display_list(&nested, 2.0);
    let list = b.build();
    let rtree = list.rtree().expect("spatial index requested");
    assert_eq!(
        rtree.leaf_count(),
        2,
        "one region per separate nested shape"
    );
    assert!(
        rtree.search(&r(12.0, 12.0, 18.0, 18.0)).is_empty(),
        "gap between shapes"
    );
    assert_eq!(list.bounds(), r(0.0, 0.0, 30.0, 30.0));
}

#[test]
fn faint_or_empty_nested_lists_are_dropped() {
    let nested = two_shapes(false);
    let empty = Arc::new(DisplayList::default());
    let mut b = DisplayListBuilder::default();
    b.draw_display_list(&nested, 0.0);
    b.draw_display_list(&nested, f64::NAN);
    b.draw_display_list(&empty, 1.0);
    assert_eq!(b.build().op_count(false), 0);
}

#[test]
fn thread_safety_follows_resources() {
    let safe: Arc<dyn DlImage> = Arc::new(Picture { thread_safe: true });
    let unsafe_image: Arc<dyn DlImage> = Arc::new(Picture { thread_safe: false });
    let mut b = DisplayListBuilder::default();
    b.draw_image(&safe, Point::new(5.0, 5.0), DlImageSampling::Linear, false);
    let list = b.build();
    assert!(list.is_ui_thread_safe());
    assert_eq!(list.bounds(), r(5.0, 5.0, 25.0, 15.0));

    b.draw_image_with_paint(
        &unsafe_image,
        Point::ORIGIN,
        DlImageSampling::Linear,
        Some(&red()),
    );
    let list = b.build();
    assert!(!list.is_ui_thread_safe());
    assert_eq!(
        kinds(&list),
        vec![DlOpType::SetColor, DlOpType::DrawImageWithAttr]
    );
}

#[test]
fn atlas_bounds_cover_every_sprite() {
    let atlas: Arc<dyn DlImage> = Arc::new(Picture { thread_safe: true });
    let transforms = [
        DlRSTransform::from_translation(0.0, 0.0),
        DlRSTransform::from_translation(40.0, 30.0),
    ];
    let tex = [r(0.0, 0.0, 5.0, 5.0), r(5.0, 0.0, 15.0, 10.0)];
    let mut b = DisplayListBuilder::default();
    b.draw_atlas(
        &atlas,
        &transforms,
        &tex,
        None,
        DlBlendMode::SrcOver,
        DlImageSampling::NearestNeighbor,
        None,
        false,
    );
    b.draw_atlas(
        &atlas,
        &transforms,
        &tex[..1],
        None,
        DlBlendMode::SrcOver,
        DlImageSampling::NearestNeighbor,
        None,
        false,
    );
    let list = b.build();
    assert_eq!(list.op_count(false), 1, "mismatched arrays are dropped");
    assert_eq!(list.bounds(), r(0.0, 0.0, 50.0, 40.0));
    assert!(!list.can_apply_group_opacity());
}

// -- strategies and reuse -----------------------------------------------------

fn busy_recording(b: &mut DisplayListBuilder) {
    b.draw_rect_with_paint(&r(0.0, 0.0, 10.0, 10.0), &red());
    b.save();
    b.translate(50.0, 20.0);
    b.rotate(45.0);
    let stroke = DlPaint::new()
        .with_draw_style(DlDrawStyle::Stroke)
        .with_stroke_width(3.0);
    b.draw_oval_with_paint(&r(0.0, 0.0, 20.0, 10.0), &stroke);
    b.restore();
    b.clip_rect(&r(0.0, 0.0, 80.0, 80.0), DlClipOp::Intersect, false);
    b.draw_circle_with_paint(Point::new(70.0, 70.0), 30.0, &red());
}

/// Records with both bounds strategies and checks they agree, returning the
/// common bounds.
fn bounds_by_both_strategies(record: impl Fn(&mut DisplayListBuilder)) -> Rect {
    let mut rect_builder = DisplayListBuilder::new(None, false);
    let mut index_builder = DisplayListBuilder::new(None, true);
    record(&mut rect_builder);
    record(&mut index_builder);
    let by_rect = rect_builder.build();
    let by_index = index_builder.build();
    assert!(by_rect.rtree().is_none(), "no spatial index requested");
    let rtree = by_index.rtree().expect("spatial index requested");
    assert_eq!(by_rect.bounds(), rtree.bounds(), "rect and index bounds");
    assert_eq!(by_rect.bounds(), by_index.bounds(), "rect and list bounds");
    by_rect.bounds()
}

#[test]
fn rect_and_spatial_index_bounds_agree() {
    let bounds = bounds_by_both_strategies(busy_recording);
    assert!(!crate::geometry::is_empty(&bounds), "something was drawn");
}

fn corner_rects() -> Arc<DisplayList> {
    let mut b = DisplayListBuilder::new(None, true);
    b.draw_rect(&r(0.0, 0.0, 10.0, 10.0));
    b.draw_rect(&r(90.0, 90.0, 100.0, 100.0));
    Arc::new(b.build())
}

#[test]
fn rotated_nested_list_bounds_agree() {
    let nested = corner_rects();
    let bounds = bounds_by_both_strategies(|b| {
        b.rotate(45.0);
        b.draw_display_list(&nested, 1.0);
    });
    // Each corner rect rotates into a diamond 10 * sqrt(2) wide, stacked on
    // the y axis; the rotated whole list would be ten times as wide.
    let width = 10.0 * core::f64::consts::SQRT_2;
    assert!((bounds.width() - width).abs() < 1e-9, "got {bounds:?}");
    assert!((bounds.x0 + width / 2.0).abs() < 1e-9, "got {bounds:?}");
    let height = 100.0 * core::f64::consts::SQRT_2;
    assert!((bounds.height() - height).abs() < 1e-9, "got {bounds:?}");
}

#[test]
fn skewed_and_layered_recordings_agree() {
    let nested = corner_rects();
    bounds_by_both_strategies(|b| {
        b.save();
        b.skew(0.5, 0.0);
        b.draw_display_list(&nested, 0.5);
        b.restore();
        b.save_layer(Some(&r(0.0, 0.0, 150.0, 150.0)), Some(&red()), None);
        b.translate(20.0, 10.0);
        b.draw_oval(&r(0.0, 0.0, 60.0, 30.0));
        b.draw_display_list(&nested, 1.0);
        b.restore();
        b.transform_full_perspective(&[
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.001, 0.0, 0.0, 1.0,
        ]);
        b.draw_rect(&r(10.0, 10.0, 40.0, 40.0));
        b.draw_display_list(&nested, 1.0);
    });
}

#[test]
fn build_resets_the_builder() {
    let mut b = DisplayListBuilder::new(Some(r(0.0, 0.0, 10.0, 10.0)), false);
    b.save();
    b.translate(3.0, 3.0);
    b.set_color(DlColor::BLUE);
    b.draw_paint();
    let first = b.build();
    assert_eq!(first.op_count(false), 4, "the open save is closed by build");
    assert_eq!(b.save_count(), 1);
    assert_eq!(b.matrix(), DlMatrix::IDENTITY);
    assert_eq!(b.current_attributes().color, DlColor::BLACK);
    assert_eq!(b.device_cull_rect(), r(0.0, 0.0, 10.0, 10.0));
    let second = b.build();
    assert_eq!(second.op_count(false), 0);
    assert!(!second.is_unbounded());
    assert_eq!(second.bounds(), Rect::ZERO);
}

#[test]
fn config_selects_page_size_and_strategy() {
    let config = BuilderConfig::new(r(0.0, 0.0, 10.0, 10.0))
        .with_bounds_strategy(BoundsStrategy::SpatialIndex)
        .with_page_size(64);
    let mut b = DisplayListBuilder::with_config(config);
    assert_eq!(b.config().page_size, 64);
    b.draw_rect(&r(0.0, 0.0, 1.0, 1.0));
    let list = b.try_build().expect("recording fits in memory");
    assert!(list.rtree().is_some());
    assert_eq!(
        BuilderConfig::default().cull_rect,
        crate::geometry::MAX_CULL_RECT
    );
}

// -- tracing ------------------------------------------------------------------

#[cfg(feature = "trace")]
mod trace {
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use core::cell::RefCell;

    use super::*;
    use crate::trace::{OpSkippedEvent, RestoreEvent};

    #[derive(Default)]
    struct Log {
        recorded: Vec<DlOpType>,
        skipped: Vec<OpSkippedEvent>,
        restores: Vec<RestoreEvent>,
        builds: usize,
    }

    struct Shared(Rc<RefCell<Log>>);

    impl TraceSink for Shared {
        fn on_op_recorded(&mut self, e: &OpRecordedEvent) {
            self.0.borrow_mut().recorded.push(e.kind);
        }

        fn on_op_skipped(&mut self, e: &OpSkippedEvent) {
            self.0.borrow_mut().skipped.push(*e);
        }

        fn on_restore(&mut self, e: &RestoreEvent) {
            self.0.borrow_mut().restores.push(*e);
        }

        fn on_build(&mut self, _s: &BuildSummary) {
            self.0.borrow_mut().builds += 1;
        }
    }

    #[test]
    fn sink_sees_records_skips_and_builds() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut b = DisplayListBuilder::new(Some(r(0.0, 0.0, 10.0, 10.0)), false);
        b.set_trace_sink(Some(Box::new(Shared(Rc::clone(&log)))));
        b.save();
        b.translate(0.0, 0.0);
        b.draw_rect(&r(50.0, 50.0, 60.0, 60.0));
        b.draw_rect(&r(0.0, 0.0, 5.0, 5.0));
        b.restore();
        let _ = b.build();

        let log = log.borrow();
        assert_eq!(
            log.recorded,
            vec![DlOpType::Save, DlOpType::DrawRect, DlOpType::Restore]
        );
        let reasons: Vec<_> = log.skipped.iter().map(|e| e.reason).collect();
        assert_eq!(reasons, vec![SkipReason::Degenerate, SkipReason::Culled]);
        assert_eq!(log.restores.len(), 1);
        assert!(log.restores[0].materialized);
        assert_eq!(log.builds, 1);
    }

    #[test]
    fn only_the_filtered_layer_reports_unbounded() {
        let log = Rc::new(RefCell::new(Log::default()));
        let filter: Arc<dyn DlImageFilter> = Arc::new(Unbounded);
        let mut b = DisplayListBuilder::new(Some(r(0.0, 0.0, 100.0, 100.0)), false);
        b.set_trace_sink(Some(Box::new(Shared(Rc::clone(&log)))));
        b.save();
        b.translate(5.0, 5.0);
        b.save_layer(
            None,
            Some(&DlPaint::new().with_image_filter(Some(filter))),
            None,
        );
        b.draw_rect_with_paint(&r(0.0, 0.0, 10.0, 10.0), &DlPaint::new());
        b.restore();
        b.restore();
        let list = b.build();

        let log = log.borrow();
        let unbounded: Vec<_> = log.restores.iter().map(|e| e.unbounded).collect();
        assert_eq!(unbounded, vec![true, false], "layer first, then the save");
        assert!(list.is_unbounded());
    }
}
