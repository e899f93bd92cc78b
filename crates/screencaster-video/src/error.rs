//! Error types for frame processing
//!
//! Every error in this crate is *transient* from the broadcast's point of
//! view: the compositor absorbs them and forwards the original frame instead.
//! They are still typed so callers driving the pieces directly (tests, custom
//! pipelines) can match on the failure.

use thiserror::Error;

use crate::frame::{PixelFormat, Size};

/// Errors that can occur while normalizing a frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VideoError {
    /// A width or height of zero was supplied
    #[error("Invalid size {0}")]
    InvalidSize(Size),

    /// All buffers of the active pool are in flight
    ///
    /// Buffers return to the pool when the frame wrapping them is dropped,
    /// typically after the sink has consumed it.
    #[error("Canvas buffer pool exhausted ({outstanding} of {max} buffers in use)")]
    PoolExhausted {
        /// Buffers currently checked out
        outstanding: usize,
        /// Configured pool capacity
        max: usize,
    },

    /// The allocator could not provide memory for a new canvas buffer
    #[error("Failed to allocate {bytes} bytes for canvas buffer")]
    AllocationFailed {
        /// Requested allocation size
        bytes: usize,
    },

    /// Source and canvas pixel formats differ
    #[error("Pixel format mismatch: frame {frame:?}, canvas {canvas:?}")]
    FormatMismatch {
        /// Format of the incoming frame
        frame: PixelFormat,
        /// Format of the canvas buffer
        canvas: PixelFormat,
    },

    /// The content transform collapses the image and cannot be inverted
    #[error("Transform is not invertible")]
    SingularTransform,

    /// Pixel storage is shorter than `stride * height`
    #[error("Buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall {
        /// Bytes required by the frame geometry
        needed: usize,
        /// Bytes actually present
        actual: usize,
    },

    /// Output frame could not be assembled from the rendered buffer
    #[error("Failed to build output frame: {0}")]
    OutputFrame(String),
}

/// Result type for frame processing
pub type Result<T> = std::result::Result<T, VideoError>;

impl VideoError {
    /// Create an output frame construction error
    pub(crate) fn output_frame(msg: impl Into<String>) -> Self {
        Self::OutputFrame(msg.into())
    }
}
