//! Orientation and Fit Geometry
//!
//! Pure functions that position frame content on the output canvas.
//!
//! All transforms live in raster space: origin at the top-left corner,
//! x growing right, y growing down. A transform maps a source point to
//! a destination point as
//!
//! ```text
//! x' = a·x + c·y + tx
//! y' = b·x + d·y + ty
//! ```
//!
//! Normalizing a frame is two steps:
//!
//! 1. [`upright_transform`] rotates content captured in a landscape or
//!    upside-down orientation back to upright, keeping its bounding box at
//!    the origin.
//! 2. [`fit_transform`] scales the upright content to fit the canvas while
//!    keeping its aspect ratio, and centres it. The uncovered area is left
//!    to the pre-cleared background, which produces pillarbox bars for tall
//!    content and letterbox bars for wide content from the same code path.
//!
//! ```rust
//! use screencaster_video::geometry::{fit_transform, Rect};
//! use screencaster_video::Size;
//!
//! let fit = fit_transform(Size::new(1080, 1920), Size::new(1920, 1080)).unwrap();
//! let placed = fit.apply_rect(&Rect::from_size(Size::new(1080, 1920)));
//! assert_eq!(placed.height, 1080.0);
//! assert_eq!(placed.width, 607.5);
//! assert_eq!(placed.x, 656.25);
//! ```

use crate::frame::{Orientation, Size};

/// Determinant magnitude below which a transform is treated as singular
const SINGULAR_EPSILON: f64 = 1e-12;

/// Axis-aligned rectangle in raster space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Create a rectangle
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle of `size` anchored at the origin
    #[must_use]
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, f64::from(size.width), f64::from(size.height))
    }

    /// Right edge
    #[must_use]
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    #[must_use]
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }
}

/// 2D affine transform (scale, rotation, translation)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    /// x contribution to x'
    pub a: f64,
    /// x contribution to y'
    pub b: f64,
    /// y contribution to x'
    pub c: f64,
    /// y contribution to y'
    pub d: f64,
    /// Translation along x
    pub tx: f64,
    /// Translation along y
    pub ty: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineTransform {
    /// The transform that changes nothing
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    /// Create a transform from its six coefficients
    #[must_use]
    pub const fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    /// Uniform or non-uniform scale about the origin
    #[must_use]
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Pure translation
    #[must_use]
    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `true` if this is exactly the identity
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Transform that applies `self` first and `then` second
    #[must_use]
    pub fn concatenating(&self, then: &Self) -> Self {
        Self {
            a: self.a * then.a + self.b * then.c,
            b: self.a * then.b + self.b * then.d,
            c: self.c * then.a + self.d * then.c,
            d: self.c * then.b + self.d * then.d,
            tx: self.tx * then.a + self.ty * then.c + then.tx,
            ty: self.tx * then.b + self.ty * then.d + then.ty,
        }
    }

    /// Inverse transform, `None` if the transform is singular
    #[must_use]
    pub fn inverted(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < SINGULAR_EPSILON {
            return None;
        }

        Some(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            tx: (self.c * self.ty - self.d * self.tx) / det,
            ty: (self.b * self.tx - self.a * self.ty) / det,
        })
    }

    /// Map a point
    #[must_use]
    pub fn apply_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.tx,
            self.b * x + self.d * y + self.ty,
        )
    }

    /// Bounding box of a mapped rectangle
    #[must_use]
    pub fn apply_rect(&self, rect: &Rect) -> Rect {
        let corners = [
            self.apply_point(rect.x, rect.y),
            self.apply_point(rect.max_x(), rect.y),
            self.apply_point(rect.x, rect.max_y()),
            self.apply_point(rect.max_x(), rect.max_y()),
        ];

        let (mut min_x, mut min_y) = corners[0];
        let (mut max_x, mut max_y) = corners[0];
        for &(x, y) in &corners[1..] {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Transform that turns content captured in `orientation` upright
///
/// - `Up`: identity
/// - `Left`: quarter turn clockwise, `w×h` becomes `h×w`
/// - `Right`: quarter turn counter-clockwise, `w×h` becomes `h×w`
/// - `Down`: half turn, size unchanged
///
/// The rotated content always starts at the origin.
#[must_use]
pub fn upright_transform(
    orientation: Orientation,
    source_width: u32,
    source_height: u32,
) -> AffineTransform {
    let w = f64::from(source_width);
    let h = f64::from(source_height);

    match orientation {
        Orientation::Up => AffineTransform::IDENTITY,
        Orientation::Left => AffineTransform::new(0.0, 1.0, -1.0, 0.0, h, 0.0),
        Orientation::Right => AffineTransform::new(0.0, -1.0, 1.0, 0.0, 0.0, w),
        Orientation::Down => AffineTransform::new(-1.0, 0.0, 0.0, -1.0, w, h),
    }
}

/// Dimensions of `size` content after [`upright_transform`]
#[must_use]
pub const fn upright_size(orientation: Orientation, size: Size) -> Size {
    if orientation.swaps_dimensions() {
        size.transposed()
    } else {
        size
    }
}

/// Aspect-fit and centre `content` inside `canvas`
///
/// Returns `None` when the sizes already match. Otherwise the content is
/// scaled by `min(canvas.w / content.w, canvas.h / content.h)` and
/// translated so the bars on opposite sides are equal.
#[must_use]
pub fn fit_transform(content: Size, canvas: Size) -> Option<AffineTransform> {
    if content == canvas {
        return None;
    }

    let (cw, ch) = (f64::from(content.width), f64::from(content.height));
    let (vw, vh) = (f64::from(canvas.width), f64::from(canvas.height));

    let scale = (vw / cw).min(vh / ch);
    let offset_x = (vw - cw * scale) / 2.0;
    let offset_y = (vh - ch * scale) / 2.0;

    Some(
        AffineTransform::scale(scale, scale)
            .concatenating(&AffineTransform::translation(offset_x, offset_y)),
    )
}

/// Landscape canvas for a first frame of `size`: wider side first
#[must_use]
pub fn canonical_landscape(size: Size) -> Size {
    if size.is_landscape() {
        size
    } else {
        size.transposed()
    }
}
