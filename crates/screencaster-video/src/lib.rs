//! # screencaster-video
//!
//! Frame throttling, orientation correction and canvas compositing for
//! screen broadcast.
//!
//! This crate is part of the [screencaster](https://github.com/screencaster/screencaster)
//! workspace. It holds the pure frame-normalization core; the broadcast
//! session, queueing and sink plumbing live in `screencaster-broadcast`.
//!
//! # Features
//!
//! - **Frame Rate Throttle**: Timestamp-based admission with jitter tolerance
//! - **Orientation Correction**: Upright transforms for rotated captures
//! - **Aspect Fit**: One centred scale for pillarbox and letterbox
//! - **Buffer Pooling**: Reusable black-cleared canvas buffers, 64-byte rows
//! - **Fallback Forwarding**: Transient failures never lose a frame
//!
//! # Quick Start
//!
//! ```rust
//! use screencaster_video::{
//!     canonical_landscape, CompositorConfig, Frame, FrameCompositor, FrameThrottle,
//!     MediaTime, PixelFormat, Size,
//! };
//!
//! let mut throttle = FrameThrottle::new();
//! let mut compositor = FrameCompositor::new(CompositorConfig::default());
//!
//! // A portrait frame, rotated by the capture device (tag 6 = Right)
//! let frame = Frame::new(vec![0u8; 32 * 64 * 4], 32, 64, 32 * 4, PixelFormat::Bgra,
//!     MediaTime::new(0, 600)).unwrap().with_orientation_tag(6);
//!
//! // The canvas is fixed from the first frame, landscape
//! let canvas = compositor.canvas_for(canonical_landscape(frame.size()));
//! assert_eq!(canvas.size(), Size::new(64, 32));
//!
//! if throttle.accept(frame.pts(), 30) {
//!     let composed = compositor.compose(frame, &canvas);
//!     assert_eq!(composed.frame.size(), canvas.size());
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐
//! │  Capture callback  │
//! │  (Frame + tag)     │
//! └─────────┬──────────┘
//!           │
//!           ▼
//! ┌────────────────────┐
//! │  FrameThrottle     │ ◄── Target fps, 0.8 jitter tolerance
//! └─────────┬──────────┘
//!           │
//!           ▼
//! ┌────────────────────┐
//! │  FrameCompositor   │ ◄── Upright + fit transforms (geometry)
//! │                    │     CanvasBufferPool, Renderer
//! └─────────┬──────────┘
//!           │
//!           ▼
//! ┌────────────────────┐
//! │  Canvas-sized      │ ◄── Original timestamp preserved
//! │  Frame             │
//! └────────────────────┘
//! ```
//!
//! # Orientation Tags
//!
//! | Tag | Orientation | Correction |
//! |-----|-------------|------------|
//! | 1 | Up | none |
//! | 3 | Down | half turn |
//! | 6 | Right | quarter turn counter-clockwise |
//! | 8 | Left | quarter turn clockwise |
//!
//! Any other tag, or none, is treated as Up.

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod compositor;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod pool;
pub mod render;
pub mod throttle;

// =============================================================================
// RE-EXPORTS - PRIMARY API
// =============================================================================

// Compositor types
pub use compositor::{
    CompositeOutcome, Composed, CompositorConfig, CompositorConfigBuilder, FrameCompositor,
    ProcessingStats,
};

// Error types
pub use error::{Result, VideoError};

// Frame model
pub use frame::{CanvasSpec, Frame, FrameData, MediaTime, Orientation, PixelFormat, Size};

// Geometry
pub use geometry::{
    canonical_landscape, fit_transform, upright_size, upright_transform, AffineTransform, Rect,
};

// Buffer pool
pub use pool::{aligned_stride, CanvasBufferPool, PoolStats, PooledBuffer};

// Rendering
pub use render::{Renderer, SoftwareRenderer};

// Throttle
pub use throttle::{FrameThrottle, JITTER_TOLERANCE};

// =============================================================================
// CRATE-LEVEL ITEMS
// =============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Recommended frame queue size for a given frame rate
///
/// Returns the channel buffer size that holds approximately 500ms of
/// frames, clamped to 15-72.
///
/// # Arguments
///
/// * `fps` - Target frame rate
#[must_use]
pub fn recommended_queue_size(fps: u32) -> usize {
    ((fps / 2) as usize).clamp(15, 72)
}
