// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capability interfaces for shaders, filters and path effects.
//!
//! The recorder never renders any of these. It only asks each object a few
//! questions: what kind it is, whether it can turn transparent black into
//! something visible, whether it commutes with group opacity, and how it
//! changes the bounds of what it is applied to. Objects are shared by `Arc`
//! and compared by identity.
//!
//! A handful of concrete implementations cover the common cases.

use alloc::vec::Vec;
use core::fmt::Debug;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Rect};

use crate::color::{DlBlendMode, DlColor};
use crate::transform::DlMatrix;

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Concrete family of a [`DlColorSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DlColorSourceType {
    /// A single solid color.
    Color,
    /// Linear gradient.
    LinearGradient,
    /// Radial gradient.
    RadialGradient,
    /// Sweep gradient.
    SweepGradient,
    /// Image shader.
    Image,
    /// Runtime-compiled shader.
    RuntimeEffect,
}

/// Concrete family of a [`DlColorFilter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DlColorFilterType {
    /// Blend a constant color with each pixel.
    Blend,
    /// 4×5 color matrix.
    Matrix,
    /// sRGB to linear gamma.
    SrgbToLinearGamma,
    /// Linear to sRGB gamma.
    LinearToSrgbGamma,
}

/// Concrete family of a [`DlImageFilter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DlImageFilterType {
    /// Gaussian blur.
    Blur,
    /// Morphological dilate.
    Dilate,
    /// Morphological erode.
    Erode,
    /// Pixel offset.
    Offset,
    /// Transform of the filtered content.
    Matrix,
    /// Two filters chained.
    Compose,
    /// A color filter applied as an image filter.
    ColorFilter,
}

/// Concrete family of a [`DlPathEffect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DlPathEffectType {
    /// Dashed stroking.
    Dash,
    /// Any other effect; assumed to change geometry arbitrarily.
    Custom,
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// A shader that supplies per-pixel source color.
pub trait DlColorSource: Debug + Send + Sync {
    /// Which family this source belongs to.
    fn kind(&self) -> DlColorSourceType;

    /// The single color this source produces, if it is a solid color.
    fn as_color(&self) -> Option<DlColor> {
        None
    }

    /// Is every pixel produced by this source fully opaque?
    fn is_opaque(&self) -> bool;

    /// Can this source be used off the thread that created it?
    fn is_ui_thread_safe(&self) -> bool {
        true
    }
}

/// A per-pixel color transform.
pub trait DlColorFilter: Debug + Send + Sync {
    /// Which family this filter belongs to.
    fn kind(&self) -> DlColorFilterType;

    /// Does filtering transparent black produce a non-transparent color?
    fn modifies_transparent_black(&self) -> bool;

    /// Is `filter(color) * opacity == filter(color * opacity)`?
    fn can_commute_with_opacity(&self) -> bool {
        false
    }
}

/// A filter applied to rendered content as a whole.
pub trait DlImageFilter: Debug + Send + Sync {
    /// Which family this filter belongs to.
    fn kind(&self) -> DlImageFilterType;

    /// Does this filter produce output where its input is transparent?
    fn modifies_transparent_black(&self) -> bool;

    /// Output bounds for `input` in the filter's local space.
    ///
    /// `None` means the filter cannot bound its output.
    fn map_local_bounds(&self, input: &Rect) -> Option<Rect>;

    /// Output bounds for device-space `input` when the filter is applied
    /// under the transform `ctm`.
    ///
    /// `None` means the filter cannot bound its output.
    fn map_device_bounds(&self, input: &Rect, ctm: &DlMatrix) -> Option<Rect>;
}

/// A geometry transform applied before stroking or filling.
pub trait DlPathEffect: Debug + Send + Sync {
    /// Which family this effect belongs to.
    fn kind(&self) -> DlPathEffectType;

    /// Conservative bounds of the effected geometry given its source bounds.
    ///
    /// `None` means the effect cannot bound its output.
    fn effect_bounds(&self, source: &Rect) -> Option<Rect>;
}

// ---------------------------------------------------------------------------
// Color sources
// ---------------------------------------------------------------------------

/// A color source that produces one solid color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DlColorColorSource {
    /// The color.
    pub color: DlColor,
}

impl DlColorSource for DlColorColorSource {
    fn kind(&self) -> DlColorSourceType {
        DlColorSourceType::Color
    }

    fn as_color(&self) -> Option<DlColor> {
        Some(self.color)
    }

    fn is_opaque(&self) -> bool {
        self.color.is_opaque()
    }
}

/// A two-point linear gradient.
#[derive(Clone, Debug, PartialEq)]
pub struct DlLinearGradient {
    /// Where the first stop lies.
    pub start: Point,
    /// Where the last stop lies.
    pub end: Point,
    /// Stop colors.
    pub colors: Vec<DlColor>,
    /// Stop offsets in `[0, 1]`, one per color.
    pub stops: Vec<f64>,
}

impl DlColorSource for DlLinearGradient {
    fn kind(&self) -> DlColorSourceType {
        DlColorSourceType::LinearGradient
    }

    fn is_opaque(&self) -> bool {
        self.colors.iter().all(|c| c.is_opaque())
    }
}

// ---------------------------------------------------------------------------
// Color filters
// ---------------------------------------------------------------------------

/// Blends a constant color into every pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DlBlendColorFilter {
    /// The constant source color.
    pub color: DlColor,
    /// How it is blended onto the pixel.
    pub mode: DlBlendMode,
}

impl DlColorFilter for DlBlendColorFilter {
    fn kind(&self) -> DlColorFilterType {
        DlColorFilterType::Blend
    }

    fn modifies_transparent_black(&self) -> bool {
        match self.mode {
            // Against a zero destination these leave zero, or scale by it.
            DlBlendMode::Dst
            | DlBlendMode::Clear
            | DlBlendMode::SrcIn
            | DlBlendMode::DstIn
            | DlBlendMode::SrcATop
            | DlBlendMode::DstOut
            | DlBlendMode::Modulate => false,
            // The rest behave like `Src` over zero.
            _ => !self.color.is_transparent(),
        }
    }
}

/// A 4×5 row-major color matrix; column 4 holds the offsets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DlMatrixColorFilter {
    /// Twenty coefficients, `[r; g; b; a]` rows of `[r g b a offset]`.
    pub matrix: [f64; 20],
}

impl DlColorFilter for DlMatrixColorFilter {
    fn kind(&self) -> DlColorFilterType {
        DlColorFilterType::Matrix
    }

    fn modifies_transparent_black(&self) -> bool {
        let m = &self.matrix;
        m[4] != 0.0 || m[9] != 0.0 || m[14] != 0.0 || m[19] != 0.0
    }

    fn can_commute_with_opacity(&self) -> bool {
        // Color channels must not read alpha, and alpha must only be scaled.
        let m = &self.matrix;
        m[3] == 0.0
            && m[8] == 0.0
            && m[13] == 0.0
            && m[15] == 0.0
            && m[16] == 0.0
            && m[17] == 0.0
            && (0.0..=1.0).contains(&m[18])
            && m[19] == 0.0
    }
}

// ---------------------------------------------------------------------------
// Image filters
// ---------------------------------------------------------------------------

/// Gaussian blur with independent sigmas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DlBlurImageFilter {
    /// Horizontal standard deviation.
    pub sigma_x: f64,
    /// Vertical standard deviation.
    pub sigma_y: f64,
}

impl DlImageFilter for DlBlurImageFilter {
    fn kind(&self) -> DlImageFilterType {
        DlImageFilterType::Blur
    }

    fn modifies_transparent_black(&self) -> bool {
        false
    }

    fn map_local_bounds(&self, input: &Rect) -> Option<Rect> {
        Some(input.inflate(self.sigma_x * 3.0, self.sigma_y * 3.0))
    }

    fn map_device_bounds(&self, input: &Rect, ctm: &DlMatrix) -> Option<Rect> {
        let (dx, dy) = ctm.map_vector(self.sigma_x * 3.0, self.sigma_y * 3.0);
        Some(input.inflate(dx.abs(), dy.abs()))
    }
}

/// Shifts content by a fixed offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DlOffsetImageFilter {
    /// Horizontal shift in local units.
    pub dx: f64,
    /// Vertical shift in local units.
    pub dy: f64,
}

impl DlImageFilter for DlOffsetImageFilter {
    fn kind(&self) -> DlImageFilterType {
        DlImageFilterType::Offset
    }

    fn modifies_transparent_black(&self) -> bool {
        false
    }

    fn map_local_bounds(&self, input: &Rect) -> Option<Rect> {
        Some(*input + kurbo::Vec2::new(self.dx, self.dy))
    }

    fn map_device_bounds(&self, input: &Rect, ctm: &DlMatrix) -> Option<Rect> {
        let (dx, dy) = ctm.map_vector(self.dx, self.dy);
        Some(*input + kurbo::Vec2::new(dx, dy))
    }
}

/// Applies a color filter to the content as an image filter.
///
/// If the color filter lights up transparent black the output covers the
/// whole clip, so bounds cannot be computed.
#[derive(Clone, Debug)]
pub struct DlColorFilterImageFilter {
    /// The wrapped color filter.
    pub filter: alloc::sync::Arc<dyn DlColorFilter>,
}

impl DlImageFilter for DlColorFilterImageFilter {
    fn kind(&self) -> DlImageFilterType {
        DlImageFilterType::ColorFilter
    }

    fn modifies_transparent_black(&self) -> bool {
        self.filter.modifies_transparent_black()
    }

    fn map_local_bounds(&self, input: &Rect) -> Option<Rect> {
        (!self.modifies_transparent_black()).then_some(*input)
    }

    fn map_device_bounds(&self, input: &Rect, _ctm: &DlMatrix) -> Option<Rect> {
        (!self.modifies_transparent_black()).then_some(*input)
    }
}

// ---------------------------------------------------------------------------
// Path effects
// ---------------------------------------------------------------------------

/// Dashed stroking with alternating on/off intervals.
#[derive(Clone, Debug, PartialEq)]
pub struct DlDashPathEffect {
    /// On/off lengths; an even count.
    pub intervals: Vec<f64>,
    /// Offset into the pattern at the start of each contour.
    pub phase: f64,
}

impl DlPathEffect for DlDashPathEffect {
    fn kind(&self) -> DlPathEffectType {
        DlPathEffectType::Dash
    }

    fn effect_bounds(&self, source: &Rect) -> Option<Rect> {
        // Dashing removes geometry, it never adds any.
        Some(*source)
    }
}
