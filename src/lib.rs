//! # screencaster
//!
//! Screen broadcast frame normalization for Rust: throttling, orientation
//! correction and fixed-canvas compositing in front of a hardware encoder.
//!
//! This crate provides a unified interface to the screencaster libraries:
//!
//! - **[`video`]** - Frame model, throttle, geometry, canvas pool and compositor
//! - **[`broadcast`]** - Broadcast session, encoder trigger and sink plumbing
//!
//! # Features
//!
//! All features are enabled by default. You can selectively enable only what you need:
//!
//! ```toml
//! # Use everything (default)
//! screencaster = "0.1"
//!
//! # Frame normalization only, no tokio
//! screencaster = { version = "0.1", default-features = false, features = ["video"] }
//! ```
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `video` | Yes | Frame normalization core |
//! | `broadcast` | Yes | Session, queueing and sink (implies `video`) |
//! | `full` | No | All features from all sub-crates |
//!
//! # Quick Start
//!
//! ## Normalizing Frames Directly
//!
//! ```rust
//! use screencaster::prelude::*;
//!
//! let mut compositor = FrameCompositor::new(CompositorConfig::default());
//! let canvas = compositor.canvas_for(Size::new(64, 36));
//!
//! let frame = Frame::new(vec![0u8; 36 * 64 * 4], 36, 64, 36 * 4, PixelFormat::Bgra,
//!     MediaTime::new(0, 600)).unwrap();
//! let composed = compositor.compose(frame, &canvas);
//! assert_eq!(composed.frame.size(), Size::new(64, 36));
//! ```
//!
//! ## Full Pipeline: Capture → Session → Sink
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use screencaster::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1. Sink feeding the transport
//!     let (sink, mut events) = ChannelSink::new();
//!
//!     // 2. Start the session
//!     let config = BroadcastConfig::builder()
//!         .stream_url("https://whip.example.com/ingest")
//!         .build();
//!     let session = BroadcastSession::start(config, Arc::new(sink))?;
//!
//!     // 3. From the capture callback
//!     session.process_sample(SampleBuffer::Video(frame))?;
//!
//!     // ... transport consumes `events`
//!     session.finish().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                       screencaster                      │
//! ├───────────────────────────┬─────────────────────────────┤
//! │    screencaster-video     │   screencaster-broadcast    │
//! │                           │                             │
//! │  FrameThrottle            │  BroadcastSession           │
//! │  FrameCompositor          │  EncoderConfigTrigger       │
//! │  CanvasBufferPool         │  FrameSink / ChannelSink    │
//! └─────────────┬─────────────┴──────────────┬──────────────┘
//!               │                            │
//!               ▼                            ▼
//!       Canvas-sized frames          Encoder + transport
//! ```
//!
//! # Related Crates
//!
//! You can also use the individual crates directly:
//!
//! - [`screencaster-video`](https://crates.io/crates/screencaster-video) - Frame normalization only
//! - [`screencaster-broadcast`](https://crates.io/crates/screencaster-broadcast) - Session plumbing

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// RE-EXPORTS
// =============================================================================

/// Frame normalization core.
///
/// - Timestamp-based frame rate throttle
/// - Upright and aspect-fit transforms
/// - Pooled, black-cleared canvas buffers
/// - Compositor with fallback forwarding
///
/// See [`screencaster_video`] documentation for details.
#[cfg(feature = "video")]
#[cfg_attr(docsrs, doc(cfg(feature = "video")))]
pub use screencaster_video as video;

/// Broadcast session plumbing.
///
/// - Non-blocking capture entry point
/// - Ordered single-consumer pipeline worker
/// - One-shot encoder configuration
/// - Sink capability and protocol detection
///
/// See [`screencaster_broadcast`] documentation for details.
#[cfg(feature = "broadcast")]
#[cfg_attr(docsrs, doc(cfg(feature = "broadcast")))]
pub use screencaster_broadcast as broadcast;

// =============================================================================
// PRELUDE - Common types for convenience
// =============================================================================

/// Prelude module with commonly used types.
///
/// ```rust
/// use screencaster::prelude::*;
/// ```
pub mod prelude {
    #[cfg(feature = "video")]
    pub use screencaster_video::{
        CanvasSpec, CompositorConfig, Frame, FrameCompositor, FrameThrottle, MediaTime,
        PixelFormat, Size, VideoError,
    };

    #[cfg(feature = "broadcast")]
    pub use screencaster_broadcast::{
        AudioFrame, BroadcastConfig, BroadcastError, BroadcastSession, ChannelSink, FrameSink,
        SampleBuffer, SinkEvent,
    };
}
