//! Frame Compositor
//!
//! Turns a captured frame of arbitrary size and orientation into a frame
//! that exactly fills the broadcast canvas:
//!
//! ```text
//! Frame ──► orientation ──► upright transform ──► fit transform
//!                                                      │
//!     ┌────────────────────────────────────────────────┘
//!     ▼
//! pooled buffer (black) ──► render ──► Frame (original pts)
//! ```
//!
//! Any failure along the way (pool exhausted, allocation failure, render
//! error) is absorbed: the original frame is returned unchanged with
//! [`CompositeOutcome::Fallback`] so the broadcast never loses a frame to a
//! transient problem.
//!
//! # Examples
//!
//! ```rust
//! use screencaster_video::{
//!     CanvasSpec, CompositeOutcome, CompositorConfig, Frame, FrameCompositor, MediaTime,
//!     PixelFormat, Size,
//! };
//!
//! let mut compositor = FrameCompositor::new(CompositorConfig::default());
//! let canvas = CanvasSpec::new(Size::new(16, 8), PixelFormat::Bgra);
//!
//! // Portrait content is pillarboxed onto the landscape canvas
//! let frame = Frame::new(vec![0xFF; 8 * 16 * 4], 8, 16, 8 * 4, PixelFormat::Bgra,
//!     MediaTime::new(42, 600)).unwrap();
//! let composed = compositor.compose(frame, &canvas);
//!
//! assert_eq!(composed.outcome, CompositeOutcome::Normalized);
//! assert_eq!(composed.frame.size(), Size::new(16, 8));
//! assert_eq!(composed.frame.pts(), MediaTime::new(42, 600));
//! ```

use std::fmt;

use tracing::{debug, warn};

use crate::error::{Result, VideoError};
use crate::frame::{CanvasSpec, Frame, Orientation, PixelFormat, Size};
use crate::geometry::{fit_transform, upright_size, upright_transform, AffineTransform};
use crate::pool::{CanvasBufferPool, PoolStats, DEFAULT_MAX_BUFFERS};
use crate::render::{Renderer, SoftwareRenderer};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Configuration for the frame compositor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositorConfig {
    /// Canvas buffers that may be in flight at once (default: 6)
    ///
    /// Each normalized frame holds one buffer until the sink drops it. When
    /// all are in use, frames fall back to passing through unmodified.
    pub max_buffers: usize,

    /// Pixel format of the canvas (default: BGRA)
    pub output_format: PixelFormat,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            max_buffers: DEFAULT_MAX_BUFFERS,
            output_format: PixelFormat::Bgra,
        }
    }
}

impl CompositorConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> CompositorConfigBuilder {
        CompositorConfigBuilder::default()
    }

    /// Validate configuration and return any issues
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut issues = Vec::new();

        if self.max_buffers == 0 {
            issues.push("max_buffers must be at least 1".to_string());
        }

        if self.max_buffers > 32 {
            issues.push("max_buffers should not exceed 32".to_string());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

/// Builder for [`CompositorConfig`]
#[derive(Debug, Clone, Default)]
pub struct CompositorConfigBuilder {
    max_buffers: Option<usize>,
    output_format: Option<PixelFormat>,
}

impl CompositorConfigBuilder {
    /// Set the number of canvas buffers that may be in flight
    #[must_use]
    pub fn max_buffers(mut self, max: usize) -> Self {
        self.max_buffers = Some(max);
        self
    }

    /// Set the canvas pixel format
    #[must_use]
    pub fn output_format(mut self, format: PixelFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> CompositorConfig {
        let defaults = CompositorConfig::default();

        CompositorConfig {
            max_buffers: self.max_buffers.unwrap_or(defaults.max_buffers),
            output_format: self.output_format.unwrap_or(defaults.output_format),
        }
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

/// How a frame left the compositor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositeOutcome {
    /// Rendered into a canvas buffer
    Normalized,
    /// Already upright and canvas-sized; forwarded without a copy
    Passthrough,
    /// Normalization failed; the original frame is forwarded unchanged
    Fallback(VideoError),
}

/// A frame ready for the sink, with the path it took
#[derive(Debug)]
pub struct Composed {
    /// Frame to forward
    pub frame: Frame,
    /// Which path produced it
    pub outcome: CompositeOutcome,
}

impl Composed {
    /// `true` if the frame is the unmodified input after a failure
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, CompositeOutcome::Fallback(_))
    }

    /// Take the frame, discarding the outcome
    #[must_use]
    pub fn into_frame(self) -> Frame {
        self.frame
    }
}

/// Compositor counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingStats {
    /// Frames handed to [`FrameCompositor::compose`]
    pub frames_in: u64,
    /// Frames rendered onto the canvas
    pub normalized: u64,
    /// Frames forwarded without a copy
    pub passthrough: u64,
    /// Frames forwarded unchanged after a failure
    pub fallback: u64,
    /// Frames whose orientation tag was present but not recognised
    pub unrecognized_orientation: u64,
}

// =============================================================================
// COMPOSITOR
// =============================================================================

/// Normalizes frames onto a fixed canvas
///
/// Owned by a single consumer; `compose` takes `&mut self` and is not meant to
/// be shared across threads.
pub struct FrameCompositor {
    config: CompositorConfig,
    pool: CanvasBufferPool,
    renderer: Box<dyn Renderer>,
    stats: ProcessingStats,
}

impl FrameCompositor {
    /// Create a compositor using the [`SoftwareRenderer`]
    #[must_use]
    pub fn new(config: CompositorConfig) -> Self {
        Self::with_renderer(config, SoftwareRenderer::new())
    }

    /// Create a compositor with a custom renderer
    pub fn with_renderer(config: CompositorConfig, renderer: impl Renderer + 'static) -> Self {
        let pool = CanvasBufferPool::new(config.output_format, config.max_buffers);
        Self {
            config,
            pool,
            renderer: Box::new(renderer),
            stats: ProcessingStats::default(),
        }
    }

    /// Canvas of `size` in the configured output format
    #[must_use]
    pub fn canvas_for(&self, size: Size) -> CanvasSpec {
        CanvasSpec::new(size, self.config.output_format)
    }

    /// Normalize `frame` onto `canvas`
    ///
    /// Never fails: on any error the input frame is returned untouched with
    /// [`CompositeOutcome::Fallback`].
    pub fn compose(&mut self, frame: Frame, canvas: &CanvasSpec) -> Composed {
        self.stats.frames_in += 1;

        let orientation = self.resolve_orientation(&frame);
        let upright = upright_transform(orientation, frame.width(), frame.height());
        let content = upright_size(orientation, frame.size());
        let fit = fit_transform(content, canvas.size());

        if upright.is_identity() && fit.is_none() && frame.format() == canvas.format() {
            self.stats.passthrough += 1;
            return Composed {
                frame,
                outcome: CompositeOutcome::Passthrough,
            };
        }

        let transform = match fit {
            Some(fit) => upright.concatenating(&fit),
            None => upright,
        };

        match self.render(&frame, &transform, canvas) {
            Ok(output) => {
                self.stats.normalized += 1;
                Composed {
                    frame: output,
                    outcome: CompositeOutcome::Normalized,
                }
            }
            Err(e) => {
                warn!(
                    "Frame normalization failed, forwarding original {} frame at {}: {}",
                    frame.size(),
                    frame.pts(),
                    e
                );
                self.stats.fallback += 1;
                Composed {
                    frame,
                    outcome: CompositeOutcome::Fallback(e),
                }
            }
        }
    }

    fn resolve_orientation(&mut self, frame: &Frame) -> Orientation {
        let Some(raw) = frame.orientation_tag() else {
            return Orientation::Up;
        };

        Orientation::from_raw(raw).unwrap_or_else(|| {
            debug!("Unrecognised orientation tag {}, treating frame as upright", raw);
            self.stats.unrecognized_orientation += 1;
            Orientation::Up
        })
    }

    fn render(
        &mut self,
        frame: &Frame,
        transform: &AffineTransform,
        canvas: &CanvasSpec,
    ) -> Result<Frame> {
        if self.pool.format() != canvas.format() {
            debug!(
                "Canvas format changed {:?} -> {:?}, replacing buffer pool",
                self.pool.format(),
                canvas.format()
            );
            self.pool = CanvasBufferPool::new(canvas.format(), self.config.max_buffers);
        }

        let mut buffer = self.pool.acquire(canvas.size())?;
        self.renderer.render(frame, transform, &mut buffer)?;
        Frame::from_pooled(buffer, frame.pts())
    }

    /// Drop the canvas pool; buffers still held by frames are freed on drop
    pub fn release_pool(&mut self) {
        self.pool.release();
    }

    /// Current configuration
    #[must_use]
    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Compositor counters
    #[must_use]
    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    /// Buffer pool counters
    #[must_use]
    pub fn pool_stats(&self) -> &PoolStats {
        self.pool.stats()
    }
}

impl fmt::Debug for FrameCompositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameCompositor")
            .field("config", &self.config)
            .field("pool", &self.pool)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
