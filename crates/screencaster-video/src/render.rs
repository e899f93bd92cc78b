//! Frame rendering
//!
//! A [`Renderer`] draws a source frame, mapped through an
//! [`AffineTransform`], into a cleared canvas buffer. The compositor only
//! depends on the trait; [`SoftwareRenderer`] is the portable CPU
//! implementation used by default.

use tracing::trace;

use crate::error::{Result, VideoError};
use crate::frame::Frame;
use crate::geometry::{AffineTransform, Rect};
use crate::pool::PooledBuffer;

/// Draws transformed frame content into a canvas buffer
pub trait Renderer: Send {
    /// Render `source` through `transform` into `target`
    ///
    /// Pixels of `target` outside the transformed content must be left
    /// untouched so the pre-cleared background shows through.
    fn render(
        &mut self,
        source: &Frame,
        transform: &AffineTransform,
        target: &mut PooledBuffer,
    ) -> Result<()>;
}

/// CPU renderer using inverse-mapped nearest-neighbour sampling
///
/// Only destination pixels inside the bounding box of the transformed
/// content are visited. Quarter-turn rotations and 1:1 copies are exact
/// pixel permutations.
#[derive(Debug, Clone, Default)]
pub struct SoftwareRenderer {
    pixels_written: u64,
}

impl SoftwareRenderer {
    /// Create a renderer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total pixels written since creation
    #[must_use]
    pub fn pixels_written(&self) -> u64 {
        self.pixels_written
    }
}

impl Renderer for SoftwareRenderer {
    fn render(
        &mut self,
        source: &Frame,
        transform: &AffineTransform,
        target: &mut PooledBuffer,
    ) -> Result<()> {
        if source.format() != target.format() {
            return Err(VideoError::FormatMismatch {
                frame: source.format(),
                canvas: target.format(),
            });
        }

        let inverse = transform.inverted().ok_or(VideoError::SingularTransform)?;

        let canvas = target.size();
        let bounds = transform.apply_rect(&Rect::from_size(source.size()));
        let x0 = bounds.x.floor().max(0.0) as u32;
        let y0 = bounds.y.floor().max(0.0) as u32;
        let x1 = (bounds.max_x().ceil().max(0.0) as u32).min(canvas.width);
        let y1 = (bounds.max_y().ceil().max(0.0) as u32).min(canvas.height);

        let bpp = source.format().bytes_per_pixel();
        let src_w = f64::from(source.width());
        let src_h = f64::from(source.height());
        let src_stride = source.stride();
        let dst_stride = target.stride();
        let src = source.data();
        let dst = target.as_mut_slice();

        let mut written = 0u64;
        for dy in y0..y1 {
            let row = dy as usize * dst_stride;
            for dx in x0..x1 {
                let (sx, sy) = inverse.apply_point(f64::from(dx) + 0.5, f64::from(dy) + 0.5);
                if sx < 0.0 || sy < 0.0 || sx >= src_w || sy >= src_h {
                    continue;
                }

                let s = sy as usize * src_stride + sx as usize * bpp;
                let d = row + dx as usize * bpp;
                dst[d..d + bpp].copy_from_slice(&src[s..s + bpp]);
                written += 1;
            }
        }

        trace!(
            "Rendered {}x{} into {} ({} pixels)",
            source.width(),
            source.height(),
            canvas,
            written
        );
        self.pixels_written += written;
        Ok(())
    }
}
