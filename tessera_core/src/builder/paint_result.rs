// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! What a paint can do to the pixels under and around an op.
//!
//! Two questions are answered separately and must stay separate:
//!
//! - [`classify`] decides whether an op can be skipped and whether it can
//!   turn transparent destination pixels non-transparent where it draws.
//! - [`nops_on_transparency`] decides whether a layer composited with the
//!   paint leaves destination pixels outside its content untouched.

use crate::color::{DlBlendMode, DlColor};
use crate::flags::DisplayListAttributeFlags;
use crate::paint::DlPaint;

/// Stand-in for a source color nothing is known about.
const ANY_COLOR: DlColor = DlColor::MID_GREY.with_alpha(0x80);

/// Effect of one op on the destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaintResult {
    /// No pixel can change; the op may be dropped.
    NoEffect,
    /// Pixels may change, but transparent ones stay transparent.
    PreservesTransparency,
    /// Anything may happen.
    AffectsAll,
}

impl PaintResult {
    /// Outcome of blending with `mode` given whether the source is known to
    /// be fully transparent.
    ///
    /// Result alpha per mode, with `Sa`/`Da` the source and destination
    /// alpha:
    ///
    /// | mode | result alpha | transparent source | other source |
    /// |------|--------------|--------------------|--------------|
    /// | `Clear` | 0 | preserves | preserves |
    /// | `Dst` | Da | no effect | no effect |
    /// | `Src`, `DstATop` | Sa | preserves | affects all |
    /// | `SrcOut` | Sa·(1−Da) | preserves | affects all |
    /// | `SrcIn`, `DstIn`, `Modulate` | Sa·Da | preserves | preserves |
    /// | `DstOut` | Da·(1−Sa) | no effect | preserves |
    /// | `SrcATop` | Da | no effect | preserves |
    /// | everything else | ≥ Sa | no effect | affects all |
    #[must_use]
    pub const fn for_blend(mode: DlBlendMode, transparent_source: bool) -> Self {
        use DlBlendMode as M;
        match mode {
            M::Clear => Self::PreservesTransparency,
            M::Dst => Self::NoEffect,
            M::Src | M::DstATop | M::SrcOut => {
                if transparent_source {
                    Self::PreservesTransparency
                } else {
                    Self::AffectsAll
                }
            }
            M::SrcIn | M::DstIn | M::Modulate => Self::PreservesTransparency,
            M::DstOut | M::SrcATop => {
                if transparent_source {
                    Self::NoEffect
                } else {
                    Self::PreservesTransparency
                }
            }
            M::SrcOver
            | M::DstOver
            | M::Xor
            | M::Plus
            | M::Screen
            | M::Overlay
            | M::Darken
            | M::Lighten
            | M::ColorDodge
            | M::ColorBurn
            | M::HardLight
            | M::SoftLight
            | M::Difference
            | M::Exclusion
            | M::Multiply
            | M::Hue
            | M::Saturation
            | M::Color
            | M::Luminosity => {
                if transparent_source {
                    Self::NoEffect
                } else {
                    Self::AffectsAll
                }
            }
        }
    }
}

/// Best guess at the source color an op renders with.
///
/// Only a fully transparent result is ever relied upon; anything uncertain
/// resolves to a translucent grey.
pub(crate) fn effective_color(paint: &DlPaint, flags: DisplayListAttributeFlags) -> DlColor {
    let mut color = if flags.applies_color() {
        match &paint.color_source {
            Some(source) => match source.as_color() {
                Some(color) => color,
                None if source.is_opaque() => DlColor::BLACK,
                None => ANY_COLOR,
            },
            None => paint.color,
        }
    } else if flags.applies_alpha() {
        // Alpha alone can only prove transparency, never opacity.
        if paint.alpha() == 0 {
            DlColor::TRANSPARENT
        } else {
            ANY_COLOR
        }
    } else {
        ANY_COLOR
    };
    if flags.applies_image_filter()
        && let Some(filter) = &paint.image_filter
        && (!color.is_transparent() || filter.modifies_transparent_black())
    {
        color = ANY_COLOR;
    }
    if flags.applies_color_filter()
        && let Some(filter) = &paint.color_filter
        && (!color.is_transparent() || filter.modifies_transparent_black())
    {
        color = ANY_COLOR;
    }
    color
}

/// Does a filter the op applies turn transparent black into color?
fn filters_modify_transparent_black(paint: &DlPaint, flags: DisplayListAttributeFlags) -> bool {
    let image = flags.applies_image_filter()
        && paint
            .image_filter
            .as_ref()
            .is_some_and(|f| f.modifies_transparent_black());
    let color = flags.applies_color_filter()
        && paint
            .color_filter
            .as_ref()
            .is_some_and(|f| f.modifies_transparent_black());
    image || color
}

/// Classifies an op drawn with `paint` under the attribute set `flags`.
///
/// Ops that do not apply the blend mode are treated as `SrcOver`.
#[must_use]
pub fn classify(paint: &DlPaint, flags: DisplayListAttributeFlags) -> PaintResult {
    let mode = if flags.applies_blend() {
        paint.blend_mode
    } else {
        DlBlendMode::SrcOver
    };
    let transparent = effective_color(paint, flags).is_transparent();
    match PaintResult::for_blend(mode, transparent) {
        PaintResult::AffectsAll => PaintResult::AffectsAll,
        _ if filters_modify_transparent_black(paint, flags) => PaintResult::AffectsAll,
        result => result,
    }
}

/// Does compositing a layer with `paint` leave destination pixels the layer
/// did not draw into unchanged?
///
/// The layer's untouched area is transparent black; this asks whether
/// blending transparent black with `paint` is the identity.
#[must_use]
pub fn nops_on_transparency(paint: &DlPaint) -> bool {
    if paint
        .image_filter
        .as_ref()
        .is_some_and(|f| f.modifies_transparent_black())
    {
        return false;
    }
    if paint
        .color_filter
        .as_ref()
        .is_some_and(|f| f.modifies_transparent_black())
    {
        return false;
    }
    use DlBlendMode as M;
    match paint.blend_mode {
        // r = 0, s, s·da, d·sa, s·(1−da), d·sa + s·(1−da), s·d
        M::Clear | M::Src | M::SrcIn | M::DstIn | M::SrcOut | M::DstATop | M::Modulate => false,
        // r = d whenever s = 0
        M::Dst
        | M::SrcOver
        | M::DstOver
        | M::DstOut
        | M::SrcATop
        | M::Xor
        | M::Plus
        | M::Screen
        | M::Overlay
        | M::Darken
        | M::Lighten
        | M::ColorDodge
        | M::ColorBurn
        | M::HardLight
        | M::SoftLight
        | M::Difference
        | M::Exclusion
        | M::Multiply
        | M::Hue
        | M::Saturation
        | M::Color
        | M::Luminosity => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{DlBlendColorFilter, DlColorColorSource};
    use crate::flags::DisplayListOpFlags;
    use alloc::sync::Arc;

    #[test]
    fn blend_table() {
        for transparent in [false, true] {
            assert_eq!(
                PaintResult::for_blend(DlBlendMode::Clear, transparent),
                PaintResult::PreservesTransparency
            );
            assert_eq!(
                PaintResult::for_blend(DlBlendMode::Dst, transparent),
                PaintResult::NoEffect
            );
        }
        assert_eq!(
            PaintResult::for_blend(DlBlendMode::SrcOver, true),
            PaintResult::NoEffect
        );
        assert_eq!(
            PaintResult::for_blend(DlBlendMode::SrcOver, false),
            PaintResult::AffectsAll
        );
        assert_eq!(
            PaintResult::for_blend(DlBlendMode::Src, true),
            PaintResult::PreservesTransparency,
            "a transparent Src clears what it covers"
        );
        assert_eq!(
            PaintResult::for_blend(DlBlendMode::DstOut, true),
            PaintResult::NoEffect
        );
    }

    #[test]
    fn every_mode_agrees_with_transparency_nop() {
        // A mode leaves the destination alone under a transparent source
        // exactly when a transparent draw with it has no effect.
        for mode in DlBlendMode::ALL {
            let paint = DlPaint::new().with_blend_mode(mode);
            let result = PaintResult::for_blend(mode, true);
            if nops_on_transparency(&paint) {
                assert_eq!(result, PaintResult::NoEffect, "{mode:?}");
            } else {
                assert_ne!(result, PaintResult::NoEffect, "{mode:?}");
            }
        }
    }

    #[test]
    fn transparent_paint_has_no_effect() {
        let paint = DlPaint::from_color(DlColor::TRANSPARENT);
        assert_eq!(
            classify(&paint, DisplayListOpFlags::DRAW_RECT),
            PaintResult::NoEffect
        );
        let paint = DlPaint::from_color(DlColor::RED);
        assert_eq!(
            classify(&paint, DisplayListOpFlags::DRAW_RECT),
            PaintResult::AffectsAll
        );
    }

    #[test]
    fn solid_color_source_overrides_color() {
        let source = Arc::new(DlColorColorSource {
            color: DlColor::TRANSPARENT,
        });
        let paint = DlPaint::from_color(DlColor::RED).with_color_source(Some(source));
        assert_eq!(
            classify(&paint, DisplayListOpFlags::DRAW_RECT),
            PaintResult::NoEffect
        );
    }

    #[test]
    fn flooding_color_filter_downgrades() {
        let filter = Arc::new(DlBlendColorFilter {
            color: DlColor::RED,
            mode: DlBlendMode::SrcOver,
        });
        let paint = DlPaint::from_color(DlColor::TRANSPARENT)
            .with_blend_mode(DlBlendMode::Clear)
            .with_color_filter(Some(filter));
        assert_eq!(
            classify(&paint, DisplayListOpFlags::DRAW_RECT),
            PaintResult::AffectsAll
        );
        assert!(!nops_on_transparency(&paint));
    }

    #[test]
    fn ignored_paint_is_unknown_color() {
        let paint = DlPaint::from_color(DlColor::TRANSPARENT);
        assert_eq!(
            classify(&paint, DisplayListOpFlags::DRAW_IMAGE),
            PaintResult::AffectsAll,
            "an image draw without attributes ignores the paint color"
        );
    }
}
