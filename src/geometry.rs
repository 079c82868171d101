//! Rectangles and the transforms between coordinate spaces
//!
//! A selection passes through four spaces on its way to the engine:
//!
//! - display: pixels of the scaled on-screen preview
//! - native: pixels of the decoded image, same origin as display
//! - flipped: native with the vertical axis inverted, as used for cropping
//! - normalized: native divided by the image size, handed to the engine
//!
//! Each space has its own rectangle type and the functions in this module are
//! the only conversions between them.

use std::fmt;

/// Margin kept around the preview when it is scaled down to fit the viewport.
const PREVIEW_MARGIN: f64 = 0.9;

/// Width and height in some unit (pixels for images and viewports)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A pointer position in display space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

macro_rules! rect_in_space {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name {
            pub x: f64,
            pub y: f64,
            pub width: f64,
            pub height: f64,
        }

        impl $name {
            pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
                Self {
                    x,
                    y,
                    width,
                    height,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    "({:.2}, {:.2}, {:.2}x{:.2})",
                    self.x, self.y, self.width, self.height
                )
            }
        }
    };
}

rect_in_space!(
    /// Rectangle in the scaled preview
    DisplayRect
);
rect_in_space!(
    /// Rectangle in unscaled image pixels
    NativeRect
);
rect_in_space!(
    /// Rectangle in image pixels with the vertical axis inverted
    FlippedRect
);
rect_in_space!(
    /// Rectangle as fractions of the image size, the engine's region of interest
    NormalizedRect
);

impl DisplayRect {
    /// Axis-aligned bounding box of two pointer positions
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(
            a.x.min(b.x),
            a.y.min(b.y),
            (a.x - b.x).abs(),
            (a.y - b.y).abs(),
        )
    }
}

impl NativeRect {
    /// True when the rectangle covers no area
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

impl FlippedRect {
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Factor between native and display space. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale(f64);

impl Scale {
    pub const IDENTITY: Scale = Scale(1.0);

    /// Returns `None` unless `factor` is finite and greater than zero
    pub fn new(factor: f64) -> Option<Self> {
        (factor.is_finite() && factor > 0.0).then_some(Self(factor))
    }

    pub fn factor(self) -> f64 {
        self.0
    }

    /// Size of the preview for an image of `image_size`
    pub fn apply(self, image_size: Size) -> Size {
        Size::new(image_size.width * self.0, image_size.height * self.0)
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Compute the preview scale for an image shown inside `viewport`.
///
/// Without scaling the preview is shown at native size. Otherwise the image
/// is shrunk (never enlarged) to fit the viewport and then reduced by a
/// further 10% to leave a margin around it.
pub fn compute_scale(viewport: Size, image_size: Size, allow_scaling: bool) -> Scale {
    if !allow_scaling {
        return Scale::IDENTITY;
    }

    let fit = (viewport.width / image_size.width).min(viewport.height / image_size.height);
    Scale::new(PREVIEW_MARGIN * fit.min(1.0)).unwrap_or(Scale::IDENTITY)
}

/// Display space to native space
pub fn to_native(rect: DisplayRect, scale: Scale) -> NativeRect {
    let s = scale.factor();
    NativeRect::new(rect.x / s, rect.y / s, rect.width / s, rect.height / s)
}

/// Native space to flipped space for an image `image_height` pixels tall
pub fn to_flipped(rect: NativeRect, image_height: f64) -> FlippedRect {
    FlippedRect::new(
        rect.x,
        image_height - rect.y - rect.height,
        rect.width,
        rect.height,
    )
}

/// Flipped space back to native space. The flip is its own inverse.
pub fn from_flipped(rect: FlippedRect, image_height: f64) -> NativeRect {
    NativeRect::new(
        rect.x,
        image_height - rect.y - rect.height,
        rect.width,
        rect.height,
    )
}

/// Native space to normalized space.
///
/// Components fall inside `[0, 1]` only when `rect` lies inside the image;
/// nothing is clamped here.
pub fn to_normalized(rect: NativeRect, image_size: Size) -> NormalizedRect {
    NormalizedRect::new(
        rect.x / image_size.width,
        rect.y / image_size.height,
        rect.width / image_size.width,
        rect.height / image_size.height,
    )
}
