// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared objects referenced by recorded ops.
//!
//! Records never embed owning pointers. Instead every shared object a record
//! refers to is appended to a side table of [`DlResource`]s and the record
//! stores its index. Dropping the table releases every reference at once.

use alloc::sync::Arc;
use core::fmt::Debug;

use kurbo::Rect;

use crate::display_list::DisplayList;
use crate::effects::{DlColorFilter, DlColorSource, DlImageFilter, DlPathEffect};
use crate::path::DlPath;

/// A decoded raster image.
pub trait DlImage: Debug + Send + Sync {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Does every pixel have full alpha?
    fn is_opaque(&self) -> bool {
        false
    }

    /// Can this image be used off the thread that created it?
    fn is_ui_thread_safe(&self) -> bool {
        true
    }

    /// `(0, 0, width, height)`.
    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width()), f64::from(self.height()))
    }
}

/// A run of shaped glyphs.
pub trait DlTextBlob: Debug + Send + Sync {
    /// Conservative bounds of the glyphs relative to the blob origin.
    fn bounds(&self) -> Rect;
}

/// How image pixels are sampled.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DlImageSampling {
    /// Nearest neighbor.
    #[default]
    NearestNeighbor,
    /// Bilinear.
    Linear,
    /// Bilinear with linear mipmap interpolation.
    MipmapLinear,
    /// Bicubic.
    Cubic,
}

impl DlImageSampling {
    /// Decodes a discriminant written by the op buffer.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::NearestNeighbor),
            1 => Some(Self::Linear),
            2 => Some(Self::MipmapLinear),
            3 => Some(Self::Cubic),
            _ => None,
        }
    }
}

/// Pixel filter for nine-patch drawing.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DlFilterMode {
    /// Nearest neighbor.
    #[default]
    Nearest,
    /// Bilinear.
    Linear,
}

impl DlFilterMode {
    /// Decodes a discriminant written by the op buffer.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Nearest),
            1 => Some(Self::Linear),
            _ => None,
        }
    }
}

/// Whether sampling may read outside the source rect of `draw_image_rect`.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DlSrcRectConstraint {
    /// Sampling stays inside the source rect.
    Strict,
    /// Sampling may bleed for speed.
    #[default]
    Fast,
}

impl DlSrcRectConstraint {
    /// Decodes a discriminant written by the op buffer.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Strict),
            1 => Some(Self::Fast),
            _ => None,
        }
    }
}

/// One entry of a display list's resource table.
#[derive(Clone, Debug)]
pub enum DlResource {
    /// Shader.
    ColorSource(Arc<dyn DlColorSource>),
    /// Color filter.
    ColorFilter(Arc<dyn DlColorFilter>),
    /// Image filter, including backdrop filters.
    ImageFilter(Arc<dyn DlImageFilter>),
    /// Path effect.
    PathEffect(Arc<dyn DlPathEffect>),
    /// Image.
    Image(Arc<dyn DlImage>),
    /// Text blob.
    TextBlob(Arc<dyn DlTextBlob>),
    /// Path geometry for clips, draws and shadows.
    Path(DlPath),
    /// Nested display list.
    DisplayList(Arc<DisplayList>),
}

impl DlResource {
    /// Do both entries refer to the very same shared object?
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::ColorSource(a), Self::ColorSource(b)) => Arc::ptr_eq(a, b),
            (Self::ColorFilter(a), Self::ColorFilter(b)) => Arc::ptr_eq(a, b),
            (Self::ImageFilter(a), Self::ImageFilter(b)) => Arc::ptr_eq(a, b),
            (Self::PathEffect(a), Self::PathEffect(b)) => Arc::ptr_eq(a, b),
            (Self::Image(a), Self::Image(b)) => Arc::ptr_eq(a, b),
            (Self::TextBlob(a), Self::TextBlob(b)) => Arc::ptr_eq(a, b),
            (Self::Path(a), Self::Path(b)) => a.ptr_eq(b),
            (Self::DisplayList(a), Self::DisplayList(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Tex;

    impl DlImage for Tex {
        fn width(&self) -> u32 {
            4
        }

        fn height(&self) -> u32 {
            2
        }
    }

    #[test]
    fn image_bounds_from_size() {
        assert_eq!(Tex.bounds(), Rect::new(0.0, 0.0, 4.0, 2.0));
        assert!(Tex.is_ui_thread_safe());
    }

    #[test]
    fn resources_compare_by_identity() {
        let a: Arc<dyn DlImage> = Arc::new(Tex);
        let b: Arc<dyn DlImage> = Arc::new(Tex);
        let ra = DlResource::Image(a.clone());
        assert!(ra.same_as(&DlResource::Image(a)));
        assert!(!ra.same_as(&DlResource::Image(b)));
    }
}
