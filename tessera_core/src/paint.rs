// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The full set of paint attributes a draw call can consume.
//!
//! [`DlPaint::new`] is the default paint: opaque black, source-over, filled,
//! hairline stroke width, no shaders or filters. It is a plain value; the
//! builder keeps its own copy as the current attribute state and diffs
//! incoming paints against it.

use alloc::sync::Arc;

use crate::color::{DlBlendMode, DlColor};
use crate::effects::{DlColorFilter, DlColorSource, DlImageFilter, DlPathEffect};

/// Whether geometry is filled, stroked, or both.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DlDrawStyle {
    /// Fill the interior.
    #[default]
    Fill,
    /// Stroke the outline.
    Stroke,
    /// Fill, then stroke.
    StrokeAndFill,
}

impl DlDrawStyle {
    /// Decodes a discriminant written by the op buffer.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Fill),
            1 => Some(Self::Stroke),
            2 => Some(Self::StrokeAndFill),
            _ => None,
        }
    }
}

/// Shape of open stroke ends.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DlStrokeCap {
    /// Ends exactly at the endpoint.
    #[default]
    Butt,
    /// Semicircle past the endpoint.
    Round,
    /// Half-square past the endpoint.
    Square,
}

impl DlStrokeCap {
    /// Decodes a discriminant written by the op buffer.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Butt),
            1 => Some(Self::Round),
            2 => Some(Self::Square),
            _ => None,
        }
    }
}

/// Shape of stroke corners.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DlStrokeJoin {
    /// Sharp corner, limited by the miter limit.
    #[default]
    Miter,
    /// Rounded corner.
    Round,
    /// Flattened corner.
    Bevel,
}

impl DlStrokeJoin {
    /// Decodes a discriminant written by the op buffer.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Miter),
            1 => Some(Self::Round),
            2 => Some(Self::Bevel),
            _ => None,
        }
    }
}

/// Which side of the shape edge a blur mask covers.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DlBlurStyle {
    /// Blur inside and outside.
    #[default]
    Normal,
    /// Solid inside, blurred outside.
    Solid,
    /// Nothing inside, blurred outside.
    Outer,
    /// Blurred inside, nothing outside.
    Inner,
}

impl DlBlurStyle {
    /// Decodes a discriminant written by the op buffer.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Normal),
            1 => Some(Self::Solid),
            2 => Some(Self::Outer),
            3 => Some(Self::Inner),
            _ => None,
        }
    }
}

/// A Gaussian coverage mask applied to geometry before shading.
///
/// Plain data, recorded inline rather than shared.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DlBlurMaskFilter {
    /// Which side of the edge is blurred.
    pub style: DlBlurStyle,
    /// Standard deviation of the blur.
    pub sigma: f64,
}

impl DlBlurMaskFilter {
    /// Creates a blur mask filter.
    #[inline]
    #[must_use]
    pub const fn new(style: DlBlurStyle, sigma: f64) -> Self {
        Self { style, sigma }
    }
}

/// Rendering attributes for a draw call or layer.
///
/// Shared effect objects are compared by identity: two paints holding
/// different `Arc`s to equal filters are different paints.
#[derive(Clone, Debug)]
pub struct DlPaint {
    /// Smooth geometry edges.
    pub anti_alias: bool,
    /// Dither gradients.
    pub dither: bool,
    /// Invert the colors of the output.
    pub invert_colors: bool,
    /// Source color when no color source is set; its alpha applies always.
    pub color: DlColor,
    /// How the result is composited.
    pub blend_mode: DlBlendMode,
    /// Fill, stroke, or both.
    pub draw_style: DlDrawStyle,
    /// Stroke width; zero is a hairline.
    pub stroke_width: f64,
    /// Miter limit for [`DlStrokeJoin::Miter`].
    pub stroke_miter: f64,
    /// End cap style.
    pub stroke_cap: DlStrokeCap,
    /// Corner join style.
    pub stroke_join: DlStrokeJoin,
    /// Shader replacing `color`.
    pub color_source: Option<Arc<dyn DlColorSource>>,
    /// Per-pixel color transform.
    pub color_filter: Option<Arc<dyn DlColorFilter>>,
    /// Filter applied to the rendered primitive.
    pub image_filter: Option<Arc<dyn DlImageFilter>>,
    /// Geometry transform applied before stroking.
    pub path_effect: Option<Arc<dyn DlPathEffect>>,
    /// Coverage mask.
    pub mask_filter: Option<DlBlurMaskFilter>,
}

impl DlPaint {
    /// Default miter limit.
    pub const DEFAULT_MITER_LIMIT: f64 = 4.0;

    /// The default paint.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            anti_alias: false,
            dither: false,
            invert_colors: false,
            color: DlColor::BLACK,
            blend_mode: DlBlendMode::SrcOver,
            draw_style: DlDrawStyle::Fill,
            stroke_width: 0.0,
            stroke_miter: Self::DEFAULT_MITER_LIMIT,
            stroke_cap: DlStrokeCap::Butt,
            stroke_join: DlStrokeJoin::Miter,
            color_source: None,
            color_filter: None,
            image_filter: None,
            path_effect: None,
            mask_filter: None,
        }
    }

    /// A default paint with the given color.
    #[must_use]
    pub const fn from_color(color: DlColor) -> Self {
        let mut paint = Self::new();
        paint.color = color;
        paint
    }

    /// Returns the paint with `color` set.
    #[must_use]
    pub fn with_color(mut self, color: DlColor) -> Self {
        self.color = color;
        self
    }

    /// Returns the paint with its alpha replaced.
    #[must_use]
    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.color = self.color.with_alpha(alpha);
        self
    }

    /// Returns the paint with `blend_mode` set.
    #[must_use]
    pub fn with_blend_mode(mut self, mode: DlBlendMode) -> Self {
        self.blend_mode = mode;
        self
    }

    /// Returns the paint with `draw_style` set.
    #[must_use]
    pub fn with_draw_style(mut self, style: DlDrawStyle) -> Self {
        self.draw_style = style;
        self
    }

    /// Returns the paint with `stroke_width` set.
    #[must_use]
    pub fn with_stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = width;
        self
    }

    /// Returns the paint with `stroke_miter` set.
    #[must_use]
    pub fn with_stroke_miter(mut self, miter: f64) -> Self {
        self.stroke_miter = miter;
        self
    }

    /// Returns the paint with `stroke_cap` set.
    #[must_use]
    pub fn with_stroke_cap(mut self, cap: DlStrokeCap) -> Self {
        self.stroke_cap = cap;
        self
    }

    /// Returns the paint with `stroke_join` set.
    #[must_use]
    pub fn with_stroke_join(mut self, join: DlStrokeJoin) -> Self {
        self.stroke_join = join;
        self
    }

    /// Returns the paint with `anti_alias` set.
    #[must_use]
    pub fn with_anti_alias(mut self, anti_alias: bool) -> Self {
        self.anti_alias = anti_alias;
        self
    }

    /// Returns the paint with `invert_colors` set.
    #[must_use]
    pub fn with_invert_colors(mut self, invert: bool) -> Self {
        self.invert_colors = invert;
        self
    }

    /// Returns the paint with `color_source` set.
    #[must_use]
    pub fn with_color_source(mut self, source: Option<Arc<dyn DlColorSource>>) -> Self {
        self.color_source = source;
        self
    }

    /// Returns the paint with `color_filter` set.
    #[must_use]
    pub fn with_color_filter(mut self, filter: Option<Arc<dyn DlColorFilter>>) -> Self {
        self.color_filter = filter;
        self
    }

    /// Returns the paint with `image_filter` set.
    #[must_use]
    pub fn with_image_filter(mut self, filter: Option<Arc<dyn DlImageFilter>>) -> Self {
        self.image_filter = filter;
        self
    }

    /// Returns the paint with `path_effect` set.
    #[must_use]
    pub fn with_path_effect(mut self, effect: Option<Arc<dyn DlPathEffect>>) -> Self {
        self.path_effect = effect;
        self
    }

    /// Returns the paint with `mask_filter` set.
    #[must_use]
    pub fn with_mask_filter(mut self, filter: Option<DlBlurMaskFilter>) -> Self {
        self.mask_filter = filter;
        self
    }

    /// The alpha of `color`.
    #[inline]
    #[must_use]
    pub const fn alpha(&self) -> u8 {
        self.color.alpha()
    }
}

impl Default for DlPaint {
    fn default() -> Self {
        Self::new()
    }
}

/// Compares two optional shared objects by identity.
#[inline]
pub(crate) fn same_arc<T: ?Sized>(a: Option<&Arc<T>>, b: Option<&Arc<T>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::DlBlurImageFilter;

    #[test]
    fn default_paint() {
        let p = DlPaint::default();
        assert_eq!(p.color, DlColor::BLACK);
        assert_eq!(p.blend_mode, DlBlendMode::SrcOver);
        assert_eq!(p.draw_style, DlDrawStyle::Fill);
        assert_eq!(p.stroke_width, 0.0);
        assert_eq!(p.stroke_miter, 4.0);
        assert!(p.color_source.is_none() && p.image_filter.is_none());
    }

    #[test]
    fn identity_comparison() {
        let a: Arc<dyn DlImageFilter> = Arc::new(DlBlurImageFilter {
            sigma_x: 1.0,
            sigma_y: 1.0,
        });
        let b: Arc<dyn DlImageFilter> = Arc::new(DlBlurImageFilter {
            sigma_x: 1.0,
            sigma_y: 1.0,
        });
        assert!(same_arc(Some(&a), Some(&a.clone())));
        assert!(!same_arc(Some(&a), Some(&b)));
        assert!(same_arc::<dyn DlImageFilter>(None, None));
        assert!(!same_arc(Some(&a), None));
    }

    #[test]
    fn raw_round_trip() {
        for raw in 0..3 {
            assert_eq!(DlDrawStyle::from_raw(raw).map(|s| s as u8), Some(raw));
            assert_eq!(DlStrokeCap::from_raw(raw).map(|s| s as u8), Some(raw));
            assert_eq!(DlStrokeJoin::from_raw(raw).map(|s| s as u8), Some(raw));
        }
        assert_eq!(DlBlurStyle::from_raw(4), None);
    }
}
