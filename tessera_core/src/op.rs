// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Op kinds and their record payloads.
//!
//! [`DlOpType`] is the discriminant stored in every record header.
//! [`DlOp`] is the decoded form of one record: the builder constructs one and
//! hands it to the arena, and readers get one back from the decoder. Payload
//! layout per kind is defined by [`DlOp::encode`] and mirrored by
//! [`DlOp::decode`].
//!
//! Two fields are written at fixed offsets so they can be patched after the
//! fact: the restore index of a save (first payload word) and the options
//! and restore index of a save-layer (first and second payload words).

use alloc::borrow::Cow;
use alloc::sync::Arc;

use bitflags::bitflags;
use kurbo::{Point, Rect, RoundedRect};

use crate::buffer::{OpReader, OpSink};
use crate::color::{DlBlendMode, DlColor};
use crate::display_list::DisplayList;
use crate::effects::{DlColorFilter, DlColorSource, DlImageFilter, DlPathEffect};
use crate::geometry::DlRSTransform;
use crate::paint::{DlBlurMaskFilter, DlBlurStyle, DlDrawStyle, DlStrokeCap, DlStrokeJoin};
use crate::path::DlPath;
use crate::resource::{
    DlFilterMode, DlImage, DlImageSampling, DlResource, DlSrcRectConstraint, DlTextBlob,
};
use crate::vertices::{DlVertexMode, DlVertices};

/// Discriminant of every recordable op.
///
/// Ordered in groups: attribute ops, save/restore, transforms, clips, draws.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[expect(missing_docs, reason = "variant names are the op names")]
pub enum DlOpType {
    SetAntiAlias,
    SetDither,
    SetInvertColors,
    SetStrokeCap,
    SetStrokeJoin,
    SetStyle,
    SetStrokeWidth,
    SetStrokeMiter,
    SetColor,
    SetBlendMode,
    SetColorSource,
    ClearColorSource,
    SetColorFilter,
    ClearColorFilter,
    SetImageFilter,
    ClearImageFilter,
    SetPathEffect,
    ClearPathEffect,
    SetMaskFilter,
    ClearMaskFilter,

    Save,
    SaveLayer,
    SaveLayerBounds,
    SaveLayerBackdrop,
    SaveLayerBackdropBounds,
    Restore,

    Translate,
    Scale,
    Rotate,
    Skew,
    Transform2DAffine,
    TransformFullPerspective,
    TransformReset,

    ClipIntersectRect,
    ClipIntersectOval,
    ClipIntersectRRect,
    ClipIntersectPath,
    ClipDifferenceRect,
    ClipDifferenceOval,
    ClipDifferenceRRect,
    ClipDifferencePath,

    DrawPaint,
    DrawColor,
    DrawLine,
    DrawRect,
    DrawOval,
    DrawCircle,
    DrawRRect,
    DrawDRRect,
    DrawPath,
    DrawArc,
    DrawPoints,
    DrawLines,
    DrawPolygon,
    DrawVertices,
    DrawImage,
    DrawImageWithAttr,
    DrawImageRect,
    DrawImageNine,
    DrawImageNineWithAttr,
    DrawAtlas,
    DrawAtlasCulled,
    DrawDisplayList,
    DrawTextBlob,
    DrawShadow,
    DrawShadowTransparentOccluder,
}

impl DlOpType {
    /// Every kind, in discriminant order.
    pub const ALL: [Self; 66] = [
        Self::SetAntiAlias,
        Self::SetDither,
        Self::SetInvertColors,
        Self::SetStrokeCap,
        Self::SetStrokeJoin,
        Self::SetStyle,
        Self::SetStrokeWidth,
        Self::SetStrokeMiter,
        Self::SetColor,
        Self::SetBlendMode,
        Self::SetColorSource,
        Self::ClearColorSource,
        Self::SetColorFilter,
        Self::ClearColorFilter,
        Self::SetImageFilter,
        Self::ClearImageFilter,
        Self::SetPathEffect,
        Self::ClearPathEffect,
        Self::SetMaskFilter,
        Self::ClearMaskFilter,
        Self::Save,
        Self::SaveLayer,
        Self::SaveLayerBounds,
        Self::SaveLayerBackdrop,
        Self::SaveLayerBackdropBounds,
        Self::Restore,
        Self::Translate,
        Self::Scale,
        Self::Rotate,
        Self::Skew,
        Self::Transform2DAffine,
        Self::TransformFullPerspective,
        Self::TransformReset,
        Self::ClipIntersectRect,
        Self::ClipIntersectOval,
        Self::ClipIntersectRRect,
        Self::ClipIntersectPath,
        Self::ClipDifferenceRect,
        Self::ClipDifferenceOval,
        Self::ClipDifferenceRRect,
        Self::ClipDifferencePath,
        Self::DrawPaint,
        Self::DrawColor,
        Self::DrawLine,
        Self::DrawRect,
        Self::DrawOval,
        Self::DrawCircle,
        Self::DrawRRect,
        Self::DrawDRRect,
        Self::DrawPath,
        Self::DrawArc,
        Self::DrawPoints,
        Self::DrawLines,
        Self::DrawPolygon,
        Self::DrawVertices,
        Self::DrawImage,
        Self::DrawImageWithAttr,
        Self::DrawImageRect,
        Self::DrawImageNine,
        Self::DrawImageNineWithAttr,
        Self::DrawAtlas,
        Self::DrawAtlasCulled,
        Self::DrawDisplayList,
        Self::DrawTextBlob,
        Self::DrawShadow,
        Self::DrawShadowTransparentOccluder,
    ];

    /// Decodes a header discriminant.
    #[must_use]
    pub fn from_raw(raw: u8) -> Option<Self> {
        Self::ALL.get(usize::from(raw)).copied()
    }

    /// Attribute ops change the current paint and do not count as rendering.
    #[inline]
    #[must_use]
    pub const fn is_attribute(self) -> bool {
        (self as u8) <= (Self::ClearMaskFilter as u8)
    }

    /// `Save` or any save-layer variant.
    #[inline]
    #[must_use]
    pub const fn is_save(self) -> bool {
        matches!(self, Self::Save) || self.is_save_layer()
    }

    /// Any of the four save-layer variants.
    #[inline]
    #[must_use]
    pub const fn is_save_layer(self) -> bool {
        matches!(
            self,
            Self::SaveLayer
                | Self::SaveLayerBounds
                | Self::SaveLayerBackdrop
                | Self::SaveLayerBackdropBounds
        )
    }

    /// Transform ops.
    #[inline]
    #[must_use]
    pub const fn is_transform(self) -> bool {
        let raw = self as u8;
        raw >= Self::Translate as u8 && raw <= Self::TransformReset as u8
    }

    /// Clip ops.
    #[inline]
    #[must_use]
    pub const fn is_clip(self) -> bool {
        let raw = self as u8;
        raw >= Self::ClipIntersectRect as u8 && raw <= Self::ClipDifferencePath as u8
    }

    /// Draw ops, the only records the spatial index refers to.
    #[inline]
    #[must_use]
    pub const fn is_draw(self) -> bool {
        (self as u8) >= (Self::DrawPaint as u8)
    }
}

/// How a clip shape combines with the current clip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DlClipOp {
    /// Keep only what is inside the shape.
    #[default]
    Intersect,
    /// Keep only what is outside the shape.
    Difference,
}

/// How `draw_points` interprets its point list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DlPointMode {
    /// Each point on its own.
    #[default]
    Points,
    /// Each pair of points is a separate segment.
    Lines,
    /// Consecutive points form an open polyline.
    Polygon,
}

bitflags! {
    /// Options stored in every save-layer record.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SaveLayerOptions: u32 {
        /// The layer is composited with the current paint attributes.
        const RENDERS_WITH_ATTRIBUTES = 1 << 0;
        /// Group opacity may be pushed down into the layer's content.
        const CAN_DISTRIBUTE_OPACITY = 1 << 1;
    }
}

/// One decoded op.
///
/// Shared objects are borrowed from the resource table; variable-length
/// arrays borrow from the arena where alignment allows.
#[derive(Clone, Debug)]
#[expect(
    missing_docs,
    reason = "fields mirror the builder call that recorded them"
)]
pub enum DlOp<'a> {
    SetAntiAlias(bool),
    SetDither(bool),
    SetInvertColors(bool),
    SetStrokeCap(DlStrokeCap),
    SetStrokeJoin(DlStrokeJoin),
    SetStyle(DlDrawStyle),
    SetStrokeWidth(f64),
    SetStrokeMiter(f64),
    SetColor(DlColor),
    SetBlendMode(DlBlendMode),
    /// `None` records the matching clear op.
    SetColorSource(Option<&'a Arc<dyn DlColorSource>>),
    SetColorFilter(Option<&'a Arc<dyn DlColorFilter>>),
    SetImageFilter(Option<&'a Arc<dyn DlImageFilter>>),
    SetPathEffect(Option<&'a Arc<dyn DlPathEffect>>),
    SetMaskFilter(Option<DlBlurMaskFilter>),

    Save {
        /// Op index of the matching restore.
        restore_index: u32,
    },
    /// The presence of `bounds` and `backdrop` selects one of four kinds.
    SaveLayer {
        options: SaveLayerOptions,
        /// Op index of the matching restore.
        restore_index: u32,
        bounds: Option<Rect>,
        backdrop: Option<&'a Arc<dyn DlImageFilter>>,
    },
    Restore,

    Translate {
        tx: f64,
        ty: f64,
    },
    Scale {
        sx: f64,
        sy: f64,
    },
    Rotate {
        degrees: f64,
    },
    Skew {
        sx: f64,
        sy: f64,
    },
    /// `[mxx, mxy, mxt, myx, myy, myt]`.
    Transform2DAffine([f64; 6]),
    /// Sixteen values in row-major order.
    TransformFullPerspective([f64; 16]),
    TransformReset,

    ClipRect {
        op: DlClipOp,
        rect: Rect,
        is_aa: bool,
    },
    ClipOval {
        op: DlClipOp,
        bounds: Rect,
        is_aa: bool,
    },
    ClipRRect {
        op: DlClipOp,
        rrect: RoundedRect,
        is_aa: bool,
    },
    ClipPath {
        op: DlClipOp,
        path: &'a DlPath,
        is_aa: bool,
    },

    DrawPaint,
    DrawColor {
        color: DlColor,
        mode: DlBlendMode,
    },
    DrawLine {
        p0: Point,
        p1: Point,
    },
    DrawRect(Rect),
    DrawOval(Rect),
    DrawCircle {
        center: Point,
        radius: f64,
    },
    DrawRRect(RoundedRect),
    DrawDRRect {
        outer: RoundedRect,
        inner: RoundedRect,
    },
    DrawPath(&'a DlPath),
    DrawArc {
        bounds: Rect,
        start_degrees: f64,
        sweep_degrees: f64,
        use_center: bool,
    },
    /// `mode` selects one of three kinds.
    DrawPoints {
        mode: DlPointMode,
        points: Cow<'a, [Point]>,
    },
    DrawVertices {
        vertices: Cow<'a, DlVertices>,
        mode: DlBlendMode,
    },
    DrawImage {
        image: &'a Arc<dyn DlImage>,
        point: Point,
        sampling: DlImageSampling,
        with_attributes: bool,
    },
    DrawImageRect {
        image: &'a Arc<dyn DlImage>,
        src: Rect,
        dst: Rect,
        sampling: DlImageSampling,
        with_attributes: bool,
        constraint: DlSrcRectConstraint,
    },
    DrawImageNine {
        image: &'a Arc<dyn DlImage>,
        center: Rect,
        dst: Rect,
        filter: DlFilterMode,
        with_attributes: bool,
    },
    /// A present `cull_rect` selects the culled kind.
    DrawAtlas {
        atlas: &'a Arc<dyn DlImage>,
        transforms: Cow<'a, [DlRSTransform]>,
        tex: Cow<'a, [Rect]>,
        colors: Option<Cow<'a, [DlColor]>>,
        mode: DlBlendMode,
        sampling: DlImageSampling,
        cull_rect: Option<Rect>,
        with_attributes: bool,
    },
    DrawDisplayList {
        display_list: &'a Arc<DisplayList>,
        opacity: f64,
    },
    DrawTextBlob {
        blob: &'a Arc<dyn DlTextBlob>,
        x: f64,
        y: f64,
    },
    DrawShadow {
        path: &'a DlPath,
        color: DlColor,
        elevation: f64,
        transparent_occluder: bool,
        dpr: f64,
    },
}

impl DlOp<'_> {
    /// The header discriminant this op is recorded under.
    #[must_use]
    pub fn op_type(&self) -> DlOpType {
        use DlOpType as T;
        match self {
            Self::SetAntiAlias(_) => T::SetAntiAlias,
            Self::SetDither(_) => T::SetDither,
            Self::SetInvertColors(_) => T::SetInvertColors,
            Self::SetStrokeCap(_) => T::SetStrokeCap,
            Self::SetStrokeJoin(_) => T::SetStrokeJoin,
            Self::SetStyle(_) => T::SetStyle,
            Self::SetStrokeWidth(_) => T::SetStrokeWidth,
            Self::SetStrokeMiter(_) => T::SetStrokeMiter,
            Self::SetColor(_) => T::SetColor,
            Self::SetBlendMode(_) => T::SetBlendMode,
            Self::SetColorSource(Some(_)) => T::SetColorSource,
            Self::SetColorSource(None) => T::ClearColorSource,
            Self::SetColorFilter(Some(_)) => T::SetColorFilter,
            Self::SetColorFilter(None) => T::ClearColorFilter,
            Self::SetImageFilter(Some(_)) => T::SetImageFilter,
            Self::SetImageFilter(None) => T::ClearImageFilter,
            Self::SetPathEffect(Some(_)) => T::SetPathEffect,
            Self::SetPathEffect(None) => T::ClearPathEffect,
            Self::SetMaskFilter(Some(_)) => T::SetMaskFilter,
            Self::SetMaskFilter(None) => T::ClearMaskFilter,
            Self::Save { .. } => T::Save,
            Self::SaveLayer {
                bounds, backdrop, ..
            } => match (bounds.is_some(), backdrop.is_some()) {
                (false, false) => T::SaveLayer,
                (true, false) => T::SaveLayerBounds,
                (false, true) => T::SaveLayerBackdrop,
                (true, true) => T::SaveLayerBackdropBounds,
            },
            Self::Restore => T::Restore,
            Self::Translate { .. } => T::Translate,
            Self::Scale { .. } => T::Scale,
            Self::Rotate { .. } => T::Rotate,
            Self::Skew { .. } => T::Skew,
            Self::Transform2DAffine(_) => T::Transform2DAffine,
            Self::TransformFullPerspective(_) => T::TransformFullPerspective,
            Self::TransformReset => T::TransformReset,
            Self::ClipRect { op, .. } => match op {
                DlClipOp::Intersect => T::ClipIntersectRect,
                DlClipOp::Difference => T::ClipDifferenceRect,
            },
            Self::ClipOval { op, .. } => match op {
                DlClipOp::Intersect => T::ClipIntersectOval,
                DlClipOp::Difference => T::ClipDifferenceOval,
            },
            Self::ClipRRect { op, .. } => match op {
                DlClipOp::Intersect => T::ClipIntersectRRect,
                DlClipOp::Difference => T::ClipDifferenceRRect,
            },
            Self::ClipPath { op, .. } => match op {
                DlClipOp::Intersect => T::ClipIntersectPath,
                DlClipOp::Difference => T::ClipDifferencePath,
            },
            Self::DrawPaint => T::DrawPaint,
            Self::DrawColor { .. } => T::DrawColor,
            Self::DrawLine { .. } => T::DrawLine,
            Self::DrawRect(_) => T::DrawRect,
            Self::DrawOval(_) => T::DrawOval,
            Self::DrawCircle { .. } => T::DrawCircle,
            Self::DrawRRect(_) => T::DrawRRect,
            Self::DrawDRRect { .. } => T::DrawDRRect,
            Self::DrawPath(_) => T::DrawPath,
            Self::DrawArc { .. } => T::DrawArc,
            Self::DrawPoints { mode, .. } => match mode {
                DlPointMode::Points => T::DrawPoints,
                DlPointMode::Lines => T::DrawLines,
                DlPointMode::Polygon => T::DrawPolygon,
            },
            Self::DrawVertices { .. } => T::DrawVertices,
            Self::DrawImage {
                with_attributes, ..
            } => {
                if *with_attributes {
                    T::DrawImageWithAttr
                } else {
                    T::DrawImage
                }
            }
            Self::DrawImageRect { .. } => T::DrawImageRect,
            Self::DrawImageNine {
                with_attributes, ..
            } => {
                if *with_attributes {
                    T::DrawImageNineWithAttr
                } else {
                    T::DrawImageNine
                }
            }
            Self::DrawAtlas { cull_rect, .. } => {
                if cull_rect.is_some() {
                    T::DrawAtlasCulled
                } else {
                    T::DrawAtlas
                }
            }
            Self::DrawDisplayList { .. } => T::DrawDisplayList,
            Self::DrawTextBlob { .. } => T::DrawTextBlob,
            Self::DrawShadow {
                transparent_occluder,
                ..
            } => {
                if *transparent_occluder {
                    T::DrawShadowTransparentOccluder
                } else {
                    T::DrawShadow
                }
            }
        }
    }

    /// Writes the payload (everything after the header).
    pub fn encode(&self, s: &mut impl OpSink) {
        match self {
            Self::SetAntiAlias(v) | Self::SetDither(v) | Self::SetInvertColors(v) => s.put_bool(*v),
            Self::SetStrokeCap(cap) => s.put_u32(u32::from(*cap as u8)),
            Self::SetStrokeJoin(join) => s.put_u32(u32::from(*join as u8)),
            Self::SetStyle(style) => s.put_u32(u32::from(*style as u8)),
            Self::SetStrokeWidth(v) | Self::SetStrokeMiter(v) => s.put_f64(*v),
            Self::SetColor(color) => s.put_u32(color.0),
            Self::SetBlendMode(mode) => s.put_u32(u32::from(*mode as u8)),
            Self::SetColorSource(source) => {
                if let Some(source) = source {
                    s.put_resource(DlResource::ColorSource(Arc::clone(source)));
                }
            }
            Self::SetColorFilter(filter) => {
                if let Some(filter) = filter {
                    s.put_resource(DlResource::ColorFilter(Arc::clone(filter)));
                }
            }
            Self::SetImageFilter(filter) => {
                if let Some(filter) = filter {
                    s.put_resource(DlResource::ImageFilter(Arc::clone(filter)));
                }
            }
            Self::SetPathEffect(effect) => {
                if let Some(effect) = effect {
                    s.put_resource(DlResource::PathEffect(Arc::clone(effect)));
                }
            }
            Self::SetMaskFilter(mask) => {
                if let Some(mask) = mask {
                    s.put_u32(u32::from(mask.style as u8));
                    s.put_f64(mask.sigma);
                }
            }
            Self::Save { restore_index } => s.put_u32(*restore_index),
            Self::SaveLayer {
                options,
                restore_index,
                bounds,
                backdrop,
            } => {
                s.put_u32(options.bits());
                s.put_u32(*restore_index);
                if let Some(bounds) = bounds {
                    s.put_rect(bounds);
                }
                if let Some(backdrop) = backdrop {
                    s.put_resource(DlResource::ImageFilter(Arc::clone(backdrop)));
                }
            }
            Self::Restore | Self::TransformReset | Self::DrawPaint => {}
            Self::Translate { tx: x, ty: y }
            | Self::Scale { sx: x, sy: y }
            | Self::Skew { sx: x, sy: y } => {
                s.put_f64(*x);
                s.put_f64(*y);
            }
            Self::Rotate { degrees } => s.put_f64(*degrees),
            Self::Transform2DAffine(m) => m.iter().for_each(|v| s.put_f64(*v)),
            Self::TransformFullPerspective(m) => m.iter().for_each(|v| s.put_f64(*v)),
            Self::ClipRect { rect, is_aa, .. }
            | Self::ClipOval {
                bounds: rect,
                is_aa,
                ..
            } => {
                s.put_rect(rect);
                s.put_bool(*is_aa);
            }
            Self::ClipRRect { rrect, is_aa, .. } => {
                s.put_rrect(rrect);
                s.put_bool(*is_aa);
            }
            Self::ClipPath { path, is_aa, .. } => {
                s.put_resource(DlResource::Path((*path).clone()));
                s.put_bool(*is_aa);
            }
            Self::DrawColor { color, mode } => {
                s.put_u32(color.0);
                s.put_u32(u32::from(*mode as u8));
            }
            Self::DrawLine { p0, p1 } => {
                s.put_point(*p0);
                s.put_point(*p1);
            }
            Self::DrawRect(rect) | Self::DrawOval(rect) => s.put_rect(rect),
            Self::DrawCircle { center, radius } => {
                s.put_point(*center);
                s.put_f64(*radius);
            }
            Self::DrawRRect(rrect) => s.put_rrect(rrect),
            Self::DrawDRRect { outer, inner } => {
                s.put_rrect(outer);
                s.put_rrect(inner);
            }
            Self::DrawPath(path) => s.put_resource(DlResource::Path((*path).clone())),
            Self::DrawArc {
                bounds,
                start_degrees,
                sweep_degrees,
                use_center,
            } => {
                s.put_rect(bounds);
                s.put_f64(*start_degrees);
                s.put_f64(*sweep_degrees);
                s.put_bool(*use_center);
            }
            Self::DrawPoints { points, .. } => {
                s.put_len(points.len());
                points.iter().for_each(|p| s.put_point(*p));
            }
            Self::DrawVertices { vertices, mode } => encode_vertices(s, vertices, *mode),
            Self::DrawImage {
                image,
                point,
                sampling,
                ..
            } => {
                s.put_resource(DlResource::Image(Arc::clone(image)));
                s.put_point(*point);
                s.put_u32(u32::from(*sampling as u8));
            }
            Self::DrawImageRect {
                image,
                src,
                dst,
                sampling,
                with_attributes,
                constraint,
            } => {
                s.put_resource(DlResource::Image(Arc::clone(image)));
                s.put_rect(src);
                s.put_rect(dst);
                s.put_u32(u32::from(*sampling as u8));
                s.put_u32(u32::from(*constraint as u8));
                s.put_bool(*with_attributes);
            }
            Self::DrawImageNine {
                image,
                center,
                dst,
                filter,
                ..
            } => {
                s.put_resource(DlResource::Image(Arc::clone(image)));
                s.put_rect(center);
                s.put_rect(dst);
                s.put_u32(u32::from(*filter as u8));
            }
            Self::DrawAtlas {
                atlas,
                transforms,
                tex,
                colors,
                mode,
                sampling,
                cull_rect,
                with_attributes,
            } => {
                s.put_resource(DlResource::Image(Arc::clone(atlas)));
                s.put_len(transforms.len());
                s.put_bool(colors.is_some());
                s.put_u32(u32::from(*mode as u8));
                s.put_u32(u32::from(*sampling as u8));
                s.put_bool(*with_attributes);
                if let Some(cull) = cull_rect {
                    s.put_rect(cull);
                }
                s.put_pod(transforms);
                tex.iter().for_each(|r| s.put_rect(r));
                if let Some(colors) = colors {
                    s.put_pod(colors);
                }
            }
            Self::DrawDisplayList {
                display_list,
                opacity,
            } => {
                s.put_resource(DlResource::DisplayList(Arc::clone(display_list)));
                s.put_f64(*opacity);
            }
            Self::DrawTextBlob { blob, x, y } => {
                s.put_resource(DlResource::TextBlob(Arc::clone(blob)));
                s.put_f64(*x);
                s.put_f64(*y);
            }
            Self::DrawShadow {
                path,
                color,
                elevation,
                dpr,
                ..
            } => {
                s.put_resource(DlResource::Path((*path).clone()));
                s.put_u32(color.0);
                s.put_f64(*elevation);
                s.put_f64(*dpr);
            }
        }
    }
}

fn encode_vertices(s: &mut impl OpSink, vertices: &DlVertices, mode: DlBlendMode) {
    s.put_u32(u32::from(mode as u8));
    s.put_u32(u32::from(vertices.mode() as u8));
    s.put_len(vertices.positions().len());
    s.put_len(vertices.indices().map_or(0, <[u16]>::len));
    s.put_bool(vertices.texture_coordinates().is_some());
    s.put_bool(vertices.colors().is_some());
    s.put_bool(vertices.indices().is_some());
    vertices.positions().iter().for_each(|p| s.put_point(*p));
    if let Some(tex) = vertices.texture_coordinates() {
        tex.iter().for_each(|p| s.put_point(*p));
    }
    if let Some(colors) = vertices.colors() {
        s.put_pod(colors);
    }
    if let Some(indices) = vertices.indices() {
        s.put_pod(indices);
    }
}

fn color_source(r: &DlResource) -> Option<&Arc<dyn DlColorSource>> {
    match r {
        DlResource::ColorSource(v) => Some(v),
        _ => None,
    }
}

fn color_filter(r: &DlResource) -> Option<&Arc<dyn DlColorFilter>> {
    match r {
        DlResource::ColorFilter(v) => Some(v),
        _ => None,
    }
}

fn image_filter(r: &DlResource) -> Option<&Arc<dyn DlImageFilter>> {
    match r {
        DlResource::ImageFilter(v) => Some(v),
        _ => None,
    }
}

fn path_effect(r: &DlResource) -> Option<&Arc<dyn DlPathEffect>> {
    match r {
        DlResource::PathEffect(v) => Some(v),
        _ => None,
    }
}

fn image(r: &DlResource) -> Option<&Arc<dyn DlImage>> {
    match r {
        DlResource::Image(v) => Some(v),
        _ => None,
    }
}

fn path(r: &DlResource) -> Option<&DlPath> {
    match r {
        DlResource::Path(v) => Some(v),
        _ => None,
    }
}

impl<'a> DlOp<'a> {
    /// Reads the payload of a `kind` record.
    ///
    /// Returns `None` if the payload is truncated or holds an out-of-range
    /// value.
    pub fn decode(kind: DlOpType, r: &mut OpReader<'a>) -> Option<Self> {
        use DlOpType as T;
        let op = match kind {
            T::SetAntiAlias => Self::SetAntiAlias(r.read_bool()?),
            T::SetDither => Self::SetDither(r.read_bool()?),
            T::SetInvertColors => Self::SetInvertColors(r.read_bool()?),
            T::SetStrokeCap => Self::SetStrokeCap(DlStrokeCap::from_raw(r.read_tag()?)?),
            T::SetStrokeJoin => Self::SetStrokeJoin(DlStrokeJoin::from_raw(r.read_tag()?)?),
            T::SetStyle => Self::SetStyle(DlDrawStyle::from_raw(r.read_tag()?)?),
            T::SetStrokeWidth => Self::SetStrokeWidth(r.read_f64()?),
            T::SetStrokeMiter => Self::SetStrokeMiter(r.read_f64()?),
            T::SetColor => Self::SetColor(DlColor(r.read_u32()?)),
            T::SetBlendMode => Self::SetBlendMode(DlBlendMode::from_raw(r.read_tag()?)?),
            T::SetColorSource => Self::SetColorSource(Some(color_source(r.read_resource()?)?)),
            T::ClearColorSource => Self::SetColorSource(None),
            T::SetColorFilter => Self::SetColorFilter(Some(color_filter(r.read_resource()?)?)),
            T::ClearColorFilter => Self::SetColorFilter(None),
            T::SetImageFilter => Self::SetImageFilter(Some(image_filter(r.read_resource()?)?)),
            T::ClearImageFilter => Self::SetImageFilter(None),
            T::SetPathEffect => Self::SetPathEffect(Some(path_effect(r.read_resource()?)?)),
            T::ClearPathEffect => Self::SetPathEffect(None),
            T::SetMaskFilter => Self::SetMaskFilter(Some(DlBlurMaskFilter::new(
                DlBlurStyle::from_raw(r.read_tag()?)?,
                r.read_f64()?,
            ))),
            T::ClearMaskFilter => Self::SetMaskFilter(None),
            T::Save => Self::Save {
                restore_index: r.read_u32()?,
            },
            T::SaveLayer
            | T::SaveLayerBounds
            | T::SaveLayerBackdrop
            | T::SaveLayerBackdropBounds => {
                let options = SaveLayerOptions::from_bits(r.read_u32()?)?;
                let restore_index = r.read_u32()?;
                let bounds = if matches!(kind, T::SaveLayerBounds | T::SaveLayerBackdropBounds) {
                    Some(r.read_rect()?)
                } else {
                    None
                };
                let has_backdrop =
                    matches!(kind, T::SaveLayerBackdrop | T::SaveLayerBackdropBounds);
                let backdrop = if has_backdrop {
                    Some(image_filter(r.read_resource()?)?)
                } else {
                    None
                };
                Self::SaveLayer {
                    options,
                    restore_index,
                    bounds,
                    backdrop,
                }
            }
            T::Restore => Self::Restore,
            T::Translate => Self::Translate {
                tx: r.read_f64()?,
                ty: r.read_f64()?,
            },
            T::Scale => Self::Scale {
                sx: r.read_f64()?,
                sy: r.read_f64()?,
            },
            T::Rotate => Self::Rotate {
                degrees: r.read_f64()?,
            },
            T::Skew => Self::Skew {
                sx: r.read_f64()?,
                sy: r.read_f64()?,
            },
            T::Transform2DAffine => {
                let mut m = [0.0; 6];
                for v in &mut m {
                    *v = r.read_f64()?;
                }
                Self::Transform2DAffine(m)
            }
            T::TransformFullPerspective => {
                let mut m = [0.0; 16];
                for v in &mut m {
                    *v = r.read_f64()?;
                }
                Self::TransformFullPerspective(m)
            }
            T::TransformReset => Self::TransformReset,
            T::ClipIntersectRect
            | T::ClipIntersectOval
            | T::ClipIntersectRRect
            | T::ClipIntersectPath
            | T::ClipDifferenceRect
            | T::ClipDifferenceOval
            | T::ClipDifferenceRRect
            | T::ClipDifferencePath => {
                let op = if kind <= T::ClipIntersectPath {
                    DlClipOp::Intersect
                } else {
                    DlClipOp::Difference
                };
                match kind {
                    T::ClipIntersectRect | T::ClipDifferenceRect => Self::ClipRect {
                        op,
                        rect: r.read_rect()?,
                        is_aa: r.read_bool()?,
                    },
                    T::ClipIntersectOval | T::ClipDifferenceOval => Self::ClipOval {
                        op,
                        bounds: r.read_rect()?,
                        is_aa: r.read_bool()?,
                    },
                    T::ClipIntersectRRect | T::ClipDifferenceRRect => Self::ClipRRect {
                        op,
                        rrect: r.read_rrect()?,
                        is_aa: r.read_bool()?,
                    },
                    _ => Self::ClipPath {
                        op,
                        path: path(r.read_resource()?)?,
                        is_aa: r.read_bool()?,
                    },
                }
            }
            T::DrawPaint => Self::DrawPaint,
            T::DrawColor => Self::DrawColor {
                color: DlColor(r.read_u32()?),
                mode: DlBlendMode::from_raw(r.read_tag()?)?,
            },
            T::DrawLine => Self::DrawLine {
                p0: r.read_point()?,
                p1: r.read_point()?,
            },
            T::DrawRect => Self::DrawRect(r.read_rect()?),
            T::DrawOval => Self::DrawOval(r.read_rect()?),
            T::DrawCircle => Self::DrawCircle {
                center: r.read_point()?,
                radius: r.read_f64()?,
            },
            T::DrawRRect => Self::DrawRRect(r.read_rrect()?),
            T::DrawDRRect => Self::DrawDRRect {
                outer: r.read_rrect()?,
                inner: r.read_rrect()?,
            },
            T::DrawPath => Self::DrawPath(path(r.read_resource()?)?),
            T::DrawArc => Self::DrawArc {
                bounds: r.read_rect()?,
                start_degrees: r.read_f64()?,
                sweep_degrees: r.read_f64()?,
                use_center: r.read_bool()?,
            },
            T::DrawPoints | T::DrawLines | T::DrawPolygon => {
                let mode = match kind {
                    T::DrawPoints => DlPointMode::Points,
                    T::DrawLines => DlPointMode::Lines,
                    _ => DlPointMode::Polygon,
                };
                let count = r.read_len()?;
                Self::DrawPoints {
                    mode,
                    points: Cow::Owned(r.read_points(count)?),
                }
            }
            T::DrawVertices => decode_vertices(r)?,
            T::DrawImage | T::DrawImageWithAttr => Self::DrawImage {
                image: image(r.read_resource()?)?,
                point: r.read_point()?,
                sampling: DlImageSampling::from_raw(r.read_tag()?)?,
                with_attributes: kind == T::DrawImageWithAttr,
            },
            T::DrawImageRect => Self::DrawImageRect {
                image: image(r.read_resource()?)?,
                src: r.read_rect()?,
                dst: r.read_rect()?,
                sampling: DlImageSampling::from_raw(r.read_tag()?)?,
                constraint: DlSrcRectConstraint::from_raw(r.read_tag()?)?,
                with_attributes: r.read_bool()?,
            },
            T::DrawImageNine | T::DrawImageNineWithAttr => Self::DrawImageNine {
                image: image(r.read_resource()?)?,
                center: r.read_rect()?,
                dst: r.read_rect()?,
                filter: DlFilterMode::from_raw(r.read_tag()?)?,
                with_attributes: kind == T::DrawImageNineWithAttr,
            },
            T::DrawAtlas | T::DrawAtlasCulled => {
                let atlas = image(r.read_resource()?)?;
                let count = r.read_len()?;
                let has_colors = r.read_bool()?;
                let mode = DlBlendMode::from_raw(r.read_tag()?)?;
                let sampling = DlImageSampling::from_raw(r.read_tag()?)?;
                let with_attributes = r.read_bool()?;
                let cull_rect = if kind == T::DrawAtlasCulled {
                    Some(r.read_rect()?)
                } else {
                    None
                };
                let transforms = r.read_pod::<DlRSTransform>(count)?;
                let tex = Cow::Owned(r.read_rects(count)?);
                let colors = if has_colors {
                    Some(r.read_pod::<DlColor>(count)?)
                } else {
                    None
                };
                Self::DrawAtlas {
                    atlas,
                    transforms,
                    tex,
                    colors,
                    mode,
                    sampling,
                    cull_rect,
                    with_attributes,
                }
            }
            T::DrawDisplayList => {
                let display_list = match r.read_resource()? {
                    DlResource::DisplayList(dl) => dl,
                    _ => return None,
                };
                Self::DrawDisplayList {
                    display_list,
                    opacity: r.read_f64()?,
                }
            }
            T::DrawTextBlob => {
                let blob = match r.read_resource()? {
                    DlResource::TextBlob(blob) => blob,
                    _ => return None,
                };
                Self::DrawTextBlob {
                    blob,
                    x: r.read_f64()?,
                    y: r.read_f64()?,
                }
            }
            T::DrawShadow | T::DrawShadowTransparentOccluder => Self::DrawShadow {
                path: path(r.read_resource()?)?,
                color: DlColor(r.read_u32()?),
                elevation: r.read_f64()?,
                dpr: r.read_f64()?,
                transparent_occluder: kind == T::DrawShadowTransparentOccluder,
            },
        };
        Some(op)
    }
}

fn decode_vertices<'a>(r: &mut OpReader<'a>) -> Option<DlOp<'a>> {
    let mode = DlBlendMode::from_raw(r.read_tag()?)?;
    let vertex_mode = DlVertexMode::from_raw(r.read_tag()?)?;
    let count = r.read_len()?;
    let index_count = r.read_len()?;
    let has_tex = r.read_bool()?;
    let has_colors = r.read_bool()?;
    let has_indices = r.read_bool()?;
    let positions = r.read_points(count)?;
    let tex = if has_tex {
        Some(r.read_points(count)?)
    } else {
        None
    };
    let colors = if has_colors {
        Some(r.read_pod::<DlColor>(count)?.into_owned())
    } else {
        None
    };
    let indices = if has_indices {
        Some(r.read_pod::<u16>(index_count)?.into_owned())
    } else {
        None
    };
    Some(DlOp::DrawVertices {
        vertices: Cow::Owned(DlVertices::new(vertex_mode, positions, tex, colors, indices)),
        mode,
    })
}
