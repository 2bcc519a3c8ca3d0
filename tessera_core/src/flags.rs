// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Which paint attributes each kind of op consumes.
//!
//! Every op kind has one constant [`DisplayListAttributeFlags`] descriptor in
//! [`DisplayListOpFlags`]. The builder consults it to decide which parts of
//! a paint to diff and record, whether the op's bounds must be padded for
//! strokes, masks and filters, and whether it floods the clip.
//!
//! Descriptors are compile-time data. An op that ignores the paint must not
//! claim any other attribute; [`DisplayListAttributeFlags::new`] rejects such
//! a combination during constant evaluation.

use bitflags::bitflags;

use crate::effects::{DlPathEffect, DlPathEffectType};
use crate::op::DlPointMode;
use crate::paint::DlDrawStyle;

bitflags! {
    /// Paint attributes and geometry classes an op uses.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct AttributeFlags: u32 {
        /// The op renders without consulting the paint at all.
        const IGNORES_PAINT = 1 << 0;
        /// Anti-aliasing applies.
        const ANTI_ALIAS = 1 << 1;
        /// Dithering applies.
        const DITHER = 1 << 2;
        /// The paint's alpha applies.
        const ALPHA = 1 << 3;
        /// The paint's full color applies (implies alpha).
        const COLOR = 1 << 4;
        /// The blend mode applies.
        const BLEND = 1 << 5;
        /// The color source applies.
        const SHADER = 1 << 6;
        /// The color filter (and color inversion) applies.
        const COLOR_FILTER = 1 << 7;
        /// The path effect applies.
        const PATH_EFFECT = 1 << 8;
        /// The mask filter applies.
        const MASK_FILTER = 1 << 9;
        /// The image filter applies.
        const IMAGE_FILTER = 1 << 10;
        /// Geometry that is always filled.
        const FILLED = 1 << 11;
        /// Geometry that is always stroked.
        const STROKED = 1 << 12;
        /// Geometry that follows the paint's draw style.
        const DRAWN = 1 << 13;
        /// The op covers the whole clip.
        const FLOODS = 1 << 14;
    }
}

bitflags! {
    /// Hints about how far stroke decorations can reach past the geometry.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct SpecialGeometryFlags: u8 {
        /// Open ends that receive caps.
        const CAPS = 1 << 0;
        /// Caps that may sit at a diagonal, so square caps reach `√2`.
        const DIAGONAL_CAPS = 1 << 1;
        /// Corners that receive joins.
        const JOINS = 1 << 2;
        /// Corners sharp enough for miter joins to reach the miter limit.
        const ACUTE_JOINS = 1 << 3;
        /// Point-mode rendering turns butt caps into squares.
        const BUTT_CAP_IS_SQUARE = 1 << 4;
    }
}

/// The attribute descriptor for one kind of op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DisplayListAttributeFlags {
    attributes: AttributeFlags,
    geometry: SpecialGeometryFlags,
}

impl DisplayListAttributeFlags {
    /// Creates a descriptor.
    ///
    /// # Panics
    ///
    /// Panics if `IGNORES_PAINT` is combined with any bit other than
    /// `FLOODS`. In constant position this is a compile error.
    #[must_use]
    pub const fn new(attributes: AttributeFlags, geometry: SpecialGeometryFlags) -> Self {
        let paint_free = AttributeFlags::IGNORES_PAINT.union(AttributeFlags::FLOODS);
        assert!(
            !attributes.contains(AttributeFlags::IGNORES_PAINT)
                || (paint_free.contains(attributes) && geometry.is_empty()),
            "an op that ignores the paint cannot use paint attributes"
        );
        Self {
            attributes,
            geometry,
        }
    }

    const fn attrs(attributes: AttributeFlags) -> Self {
        Self::new(attributes, SpecialGeometryFlags::empty())
    }

    /// Adds attribute bits.
    #[must_use]
    pub const fn with(self, attributes: AttributeFlags) -> Self {
        Self::new(self.attributes.union(attributes), self.geometry)
    }

    /// Removes attribute bits.
    #[must_use]
    pub const fn without(self, attributes: AttributeFlags) -> Self {
        Self::new(self.attributes.difference(attributes), self.geometry)
    }

    /// Adds special geometry bits.
    #[must_use]
    pub const fn with_geometry(self, geometry: SpecialGeometryFlags) -> Self {
        Self::new(self.attributes, self.geometry.union(geometry))
    }

    /// The raw attribute bits.
    #[inline]
    #[must_use]
    pub const fn attributes(&self) -> AttributeFlags {
        self.attributes
    }

    /// The raw special-geometry bits.
    #[inline]
    #[must_use]
    pub const fn geometry_flags(&self) -> SpecialGeometryFlags {
        self.geometry
    }

    #[inline]
    const fn has(&self, bit: AttributeFlags) -> bool {
        self.attributes.contains(bit)
    }

    /// The op renders without the paint.
    #[inline]
    #[must_use]
    pub const fn ignores_paint(&self) -> bool {
        self.has(AttributeFlags::IGNORES_PAINT)
    }

    /// Anti-aliasing applies.
    #[inline]
    #[must_use]
    pub const fn applies_anti_alias(&self) -> bool {
        self.has(AttributeFlags::ANTI_ALIAS)
    }

    /// Dithering applies.
    #[inline]
    #[must_use]
    pub const fn applies_dither(&self) -> bool {
        self.has(AttributeFlags::DITHER)
    }

    /// Alpha applies (always true when color applies).
    #[inline]
    #[must_use]
    pub const fn applies_alpha(&self) -> bool {
        self.attributes
            .intersects(AttributeFlags::ALPHA.union(AttributeFlags::COLOR))
    }

    /// The full color applies.
    #[inline]
    #[must_use]
    pub const fn applies_color(&self) -> bool {
        self.has(AttributeFlags::COLOR)
    }

    /// Blend mode applies.
    #[inline]
    #[must_use]
    pub const fn applies_blend(&self) -> bool {
        self.has(AttributeFlags::BLEND)
    }

    /// The color source applies.
    #[inline]
    #[must_use]
    pub const fn applies_shader(&self) -> bool {
        self.has(AttributeFlags::SHADER)
    }

    /// The color filter applies.
    #[inline]
    #[must_use]
    pub const fn applies_color_filter(&self) -> bool {
        self.has(AttributeFlags::COLOR_FILTER)
    }

    /// The image filter applies.
    #[inline]
    #[must_use]
    pub const fn applies_image_filter(&self) -> bool {
        self.has(AttributeFlags::IMAGE_FILTER)
    }

    /// The mask filter applies.
    #[inline]
    #[must_use]
    pub const fn applies_mask_filter(&self) -> bool {
        self.has(AttributeFlags::MASK_FILTER)
    }

    /// The path effect applies.
    #[inline]
    #[must_use]
    pub const fn applies_path_effect(&self) -> bool {
        self.has(AttributeFlags::PATH_EFFECT)
    }

    /// The draw style applies.
    #[inline]
    #[must_use]
    pub const fn applies_style(&self) -> bool {
        self.has(AttributeFlags::DRAWN)
    }

    /// The op draws geometry (filled, stroked, or style-dependent).
    #[inline]
    #[must_use]
    pub const fn is_geometric(&self) -> bool {
        self.attributes.intersects(
            AttributeFlags::FILLED
                .union(AttributeFlags::STROKED)
                .union(AttributeFlags::DRAWN),
        )
    }

    /// The op covers the whole clip.
    #[inline]
    #[must_use]
    pub const fn is_flood(&self) -> bool {
        self.has(AttributeFlags::FLOODS)
    }

    /// Is the geometry stroked under `style`?
    #[inline]
    #[must_use]
    pub const fn is_stroked(&self, style: DlDrawStyle) -> bool {
        self.has(AttributeFlags::STROKED)
            || (self.has(AttributeFlags::DRAWN) && !matches!(style, DlDrawStyle::Fill))
    }

    /// Special geometry flags once `effect` has reshaped the geometry.
    ///
    /// Dashing a stroke can open new ends anywhere along it, so it adds
    /// (diagonal) caps but never joins. Dashing a fill changes nothing. Any
    /// other effect may do anything.
    #[must_use]
    pub fn with_path_effect(
        &self,
        effect: Option<&dyn DlPathEffect>,
        is_stroked: bool,
    ) -> SpecialGeometryFlags {
        let Some(effect) = effect else {
            return self.geometry;
        };
        if !self.is_geometric() {
            return self.geometry;
        }
        match effect.kind() {
            DlPathEffectType::Dash if is_stroked => self
                .geometry
                .union(SpecialGeometryFlags::CAPS)
                .union(SpecialGeometryFlags::DIAGONAL_CAPS),
            DlPathEffectType::Dash => self.geometry,
            DlPathEffectType::Custom => SpecialGeometryFlags::all(),
        }
    }
}

/// Descriptor constants, one per op kind.
#[derive(Clone, Copy, Debug)]
pub struct DisplayListOpFlags;

const BASE_PAINT: AttributeFlags = AttributeFlags::ANTI_ALIAS
    .union(AttributeFlags::DITHER)
    .union(AttributeFlags::ALPHA)
    .union(AttributeFlags::COLOR)
    .union(AttributeFlags::BLEND)
    .union(AttributeFlags::SHADER)
    .union(AttributeFlags::COLOR_FILTER)
    .union(AttributeFlags::IMAGE_FILTER);

const STROKE_OR_FILL: AttributeFlags = BASE_PAINT
    .union(AttributeFlags::MASK_FILTER)
    .union(AttributeFlags::PATH_EFFECT);

const IMAGE_PAINT: AttributeFlags = AttributeFlags::ALPHA
    .union(AttributeFlags::DITHER)
    .union(AttributeFlags::BLEND)
    .union(AttributeFlags::COLOR_FILTER)
    .union(AttributeFlags::IMAGE_FILTER);

const IGNORES: DisplayListAttributeFlags =
    DisplayListAttributeFlags::attrs(AttributeFlags::IGNORES_PAINT);

const CAPS: SpecialGeometryFlags = SpecialGeometryFlags::CAPS;
const DIAGONAL_CAPS: SpecialGeometryFlags =
    SpecialGeometryFlags::CAPS.union(SpecialGeometryFlags::DIAGONAL_CAPS);
const JOINS: SpecialGeometryFlags = SpecialGeometryFlags::JOINS;
const ACUTE_JOINS: SpecialGeometryFlags =
    SpecialGeometryFlags::JOINS.union(SpecialGeometryFlags::ACUTE_JOINS);

impl DisplayListOpFlags {
    /// `save_layer` without a paint.
    pub const SAVE_LAYER: DisplayListAttributeFlags = IGNORES;
    /// `save_layer` with a paint.
    pub const SAVE_LAYER_WITH_PAINT: DisplayListAttributeFlags = DisplayListAttributeFlags::attrs(
        AttributeFlags::ALPHA
            .union(AttributeFlags::BLEND)
            .union(AttributeFlags::COLOR_FILTER)
            .union(AttributeFlags::IMAGE_FILTER),
    );
    /// `draw_color`.
    pub const DRAW_COLOR: DisplayListAttributeFlags = DisplayListAttributeFlags::attrs(
        AttributeFlags::IGNORES_PAINT.union(AttributeFlags::FLOODS),
    );
    /// `draw_paint`.
    pub const DRAW_PAINT: DisplayListAttributeFlags =
        DisplayListAttributeFlags::attrs(BASE_PAINT.union(AttributeFlags::FLOODS));
    /// Horizontal or vertical `draw_line`.
    pub const DRAW_HV_LINE: DisplayListAttributeFlags =
        DisplayListAttributeFlags::new(STROKE_OR_FILL.union(AttributeFlags::STROKED), CAPS);
    /// Diagonal `draw_line`.
    pub const DRAW_LINE: DisplayListAttributeFlags =
        Self::DRAW_HV_LINE.with_geometry(DIAGONAL_CAPS);
    /// `draw_rect`.
    pub const DRAW_RECT: DisplayListAttributeFlags =
        DisplayListAttributeFlags::new(STROKE_OR_FILL.union(AttributeFlags::DRAWN), JOINS);
    /// `draw_oval`.
    pub const DRAW_OVAL: DisplayListAttributeFlags =
        DisplayListAttributeFlags::attrs(STROKE_OR_FILL.union(AttributeFlags::DRAWN));
    /// `draw_circle`.
    pub const DRAW_CIRCLE: DisplayListAttributeFlags = Self::DRAW_OVAL;
    /// `draw_rrect`.
    pub const DRAW_RRECT: DisplayListAttributeFlags = Self::DRAW_OVAL;
    /// `draw_drrect`.
    pub const DRAW_DRRECT: DisplayListAttributeFlags = Self::DRAW_OVAL;
    /// `draw_path`.
    pub const DRAW_PATH: DisplayListAttributeFlags = DisplayListAttributeFlags::new(
        STROKE_OR_FILL.union(AttributeFlags::DRAWN),
        DIAGONAL_CAPS.union(ACUTE_JOINS),
    );
    /// `draw_arc` without the center.
    pub const DRAW_ARC_NO_CENTER: DisplayListAttributeFlags = DisplayListAttributeFlags::new(
        STROKE_OR_FILL.union(AttributeFlags::DRAWN),
        DIAGONAL_CAPS,
    );
    /// `draw_arc` through the center.
    pub const DRAW_ARC_WITH_CENTER: DisplayListAttributeFlags = DisplayListAttributeFlags::new(
        STROKE_OR_FILL.union(AttributeFlags::DRAWN),
        ACUTE_JOINS,
    );
    /// `draw_points` in point mode.
    pub const DRAW_POINTS_AS_POINTS: DisplayListAttributeFlags = DisplayListAttributeFlags::new(
        STROKE_OR_FILL.union(AttributeFlags::STROKED),
        CAPS.union(SpecialGeometryFlags::BUTT_CAP_IS_SQUARE),
    );
    /// `draw_points` in line mode.
    pub const DRAW_POINTS_AS_LINES: DisplayListAttributeFlags =
        DisplayListAttributeFlags::new(
            STROKE_OR_FILL.union(AttributeFlags::STROKED),
            DIAGONAL_CAPS,
        );
    /// `draw_points` in polygon mode.
    pub const DRAW_POINTS_AS_POLYGON: DisplayListAttributeFlags = Self::DRAW_POINTS_AS_LINES;
    /// `draw_vertices`.
    pub const DRAW_VERTICES: DisplayListAttributeFlags = DisplayListAttributeFlags::attrs(
        AttributeFlags::DITHER
            .union(AttributeFlags::ALPHA)
            .union(AttributeFlags::SHADER)
            .union(AttributeFlags::BLEND)
            .union(AttributeFlags::COLOR_FILTER)
            .union(AttributeFlags::IMAGE_FILTER),
    );
    /// `draw_image` without a paint.
    pub const DRAW_IMAGE: DisplayListAttributeFlags = IGNORES;
    /// `draw_image` with a paint.
    pub const DRAW_IMAGE_WITH_PAINT: DisplayListAttributeFlags = DisplayListAttributeFlags::attrs(
        IMAGE_PAINT
            .union(AttributeFlags::ANTI_ALIAS)
            .union(AttributeFlags::MASK_FILTER),
    );
    /// `draw_image_rect` without a paint.
    pub const DRAW_IMAGE_RECT: DisplayListAttributeFlags = IGNORES;
    /// `draw_image_rect` with a paint.
    pub const DRAW_IMAGE_RECT_WITH_PAINT: DisplayListAttributeFlags = Self::DRAW_IMAGE_WITH_PAINT;
    /// `draw_image_nine` without a paint.
    pub const DRAW_IMAGE_NINE: DisplayListAttributeFlags = IGNORES;
    /// `draw_image_nine` with a paint.
    pub const DRAW_IMAGE_NINE_WITH_PAINT: DisplayListAttributeFlags =
        DisplayListAttributeFlags::attrs(IMAGE_PAINT);
    /// `draw_atlas` without a paint.
    pub const DRAW_ATLAS: DisplayListAttributeFlags = IGNORES;
    /// `draw_atlas` with a paint.
    pub const DRAW_ATLAS_WITH_PAINT: DisplayListAttributeFlags =
        DisplayListAttributeFlags::attrs(IMAGE_PAINT);
    /// `draw_display_list`.
    pub const DRAW_DISPLAY_LIST: DisplayListAttributeFlags = IGNORES;
    /// `draw_text_blob`.
    pub const DRAW_TEXT_BLOB: DisplayListAttributeFlags = DisplayListAttributeFlags::attrs(
        STROKE_OR_FILL
            .union(AttributeFlags::DRAWN)
            .difference(AttributeFlags::ANTI_ALIAS),
    );
    /// `draw_shadow`.
    pub const DRAW_SHADOW: DisplayListAttributeFlags = IGNORES;

    /// Descriptor for `draw_points` in the given mode.
    #[must_use]
    pub const fn for_point_mode(mode: DlPointMode) -> DisplayListAttributeFlags {
        match mode {
            DlPointMode::Points => Self::DRAW_POINTS_AS_POINTS,
            DlPointMode::Lines => Self::DRAW_POINTS_AS_LINES,
            DlPointMode::Polygon => Self::DRAW_POINTS_AS_POLYGON,
        }
    }
}
