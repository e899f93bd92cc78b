//! # screencaster-broadcast
//!
//! Broadcast session plumbing for screen capture: throttled ingest, an
//! ordered pipeline worker and the encoder sink capability.
//!
//! This crate is part of the [screencaster](https://github.com/screencaster/screencaster)
//! workspace and drives [`screencaster-video`](https://crates.io/crates/screencaster-video)
//! for frame normalization.
//!
//! # Features
//!
//! - **Non-blocking Ingest**: The capture callback never waits; overload drops samples
//! - **Ordered Delivery**: One worker, one queue, video and audio in arrival order
//! - **One-shot Encoder Setup**: Landscape canvas fixed by the first frame
//! - **Protocol Detection**: RTMP or WHIP from the URL scheme, with matching audio settings
//! - **Sink Abstraction**: Any transport behind [`FrameSink`], or [`ChannelSink`] for async consumers
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use screencaster_broadcast::{BroadcastConfig, BroadcastSession, ChannelSink, SinkEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (sink, mut events) = ChannelSink::new();
//!     let config = BroadcastConfig::builder()
//!         .stream_url("rtmp://live.example.com/app/key")
//!         .video_bitrate_mbps(8)
//!         .fps(30)
//!         .build();
//!     let session = Arc::new(BroadcastSession::start(config, Arc::new(sink))?);
//!
//!     // Transport task consuming the normalized stream
//!     tokio::spawn(async move {
//!         while let Some(event) = events.recv().await {
//!             if let SinkEvent::Video(frame) = event {
//!                 println!("frame {} at {}", frame.size(), frame.pts());
//!             }
//!         }
//!     });
//!
//!     // Capture callback: session.process_sample(sample) for every sample
//!
//!     let stats = session.finish().await?;
//!     println!("{} frames forwarded", stats.video_forwarded);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐
//! │  Capture callback  │
//! │  (SampleBuffer)    │
//! └─────────┬──────────┘
//!           │
//!           ▼
//! ┌────────────────────┐
//! │  BroadcastSession  │ ◄── FrameThrottle (video)
//! │  (process_sample)  │     Readiness check (audio)
//! └─────────┬──────────┘
//!           │ bounded queue, try_send
//!           ▼
//! ┌────────────────────┐
//! │  FramePipeline     │ ◄── EncoderConfigTrigger (first frame)
//! │  (blocking worker) │     FrameCompositor (every frame)
//! └─────────┬──────────┘
//!           │
//!           ▼
//! ┌────────────────────┐
//! │  FrameSink         │ ◄── Encoder + transport, outside this crate
//! └────────────────────┘
//! ```
//!
//! # Configuration
//!
//! | Setting | Default | Range |
//! |---------|---------|-------|
//! | `stream_url` | `rtmp://127.0.0.1:1935/live/screen` | `scheme://host/...` |
//! | `video_bitrate_mbps` | 10 | 1-15 |
//! | `fps` | 30 | 15, 20, 24, 30, 60 |
//! | `queue_depth` | half a second of frames | 1+ |
//! | `pool_buffer_count` | 6 | 1-32 |

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod config;
pub mod encoder;
pub mod error;
mod pipeline;
pub mod protocol;
pub mod session;
pub mod sink;

// =============================================================================
// RE-EXPORTS - PRIMARY API
// =============================================================================

// Configuration
pub use config::{
    resolve_bitrate_mbps, resolve_fps, validate_stream_url, BroadcastConfig,
    BroadcastConfigBuilder, DEFAULT_FPS, DEFAULT_VIDEO_BITRATE_MBPS, SUPPORTED_FPS,
};

// Encoder configuration
pub use encoder::{
    mbps_to_bps, EncoderConfigTrigger, EncoderPolicy, EncoderSettings, ProfileLevel, RateControl,
};

// Error types
pub use error::{BroadcastError, Result, SinkError};

// Protocol
pub use protocol::StreamProtocol;

// Session
pub use session::{
    BroadcastSession, SampleBuffer, SampleKind, SessionStats, ERROR_CHANNEL_CAPACITY,
};

// Sink
pub use sink::{
    AudioCodec, AudioFrame, AudioSettings, AudioTrack, ChannelSink, FrameSink, SinkEvent,
};

// =============================================================================
// CRATE-LEVEL ITEMS
// =============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
