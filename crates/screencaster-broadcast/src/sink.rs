//! Frame sink capability
//!
//! The transport that pushes the stream over the wire is outside this crate.
//! The pipeline only sees it through [`FrameSink`]: a handful of synchronous,
//! non-blocking submissions. [`ChannelSink`] adapts that to a tokio channel so
//! an async transport task can consume the stream.

use std::fmt;

use bytes::Bytes;
use screencaster_video::{Frame, MediaTime};
use tokio::sync::mpsc;

use crate::encoder::EncoderSettings;
use crate::error::SinkError;

// =============================================================================
// AUDIO
// =============================================================================

/// Audio codec announced to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    /// AAC, used over RTMP
    Aac,
    /// Opus, used over WebRTC
    Opus,
}

/// Audio encoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSettings {
    /// Codec
    pub codec: AudioCodec,
    /// Target bitrate in bits per second
    pub bitrate_bps: u32,
}

/// Mixer track an audio sample is appended to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioTrack {
    /// Microphone, track 0
    Microphone,
    /// Application audio, track 1
    Application,
}

impl AudioTrack {
    /// Mixer track index
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Microphone => 0,
            Self::Application => 1,
        }
    }
}

/// Opaque audio sample passed through to the sink
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Encoded or PCM payload, untouched by the pipeline
    pub data: Bytes,
    /// Presentation timestamp
    pub pts: MediaTime,
    /// Whether the payload is complete; incomplete samples are not forwarded
    pub data_ready: bool,
}

impl AudioFrame {
    /// Create a ready audio frame
    pub fn new(data: impl Into<Bytes>, pts: MediaTime) -> Self {
        Self {
            data: data.into(),
            pts,
            data_ready: true,
        }
    }

    /// Mark the payload as not ready
    #[must_use]
    pub fn not_ready(mut self) -> Self {
        self.data_ready = false;
        self
    }
}

// =============================================================================
// SINK
// =============================================================================

/// Consumer of the normalized stream
///
/// Implementations must not block: submissions are fire-and-forget and are
/// made from the single pipeline worker in arrival order.
pub trait FrameSink: Send + Sync {
    /// Configure audio encoding, called once when the session starts
    fn configure_audio(&self, settings: AudioSettings) -> Result<(), SinkError>;

    /// Configure video encoding, called once on the first video frame
    fn configure_encoder(&self, settings: EncoderSettings) -> Result<(), SinkError>;

    /// Append a canvas-sized video frame
    fn append_video_frame(&self, frame: Frame) -> Result<(), SinkError>;

    /// Append an audio sample to `track`
    fn append_audio_frame(&self, frame: AudioFrame, track: AudioTrack) -> Result<(), SinkError>;
}

/// Submission observed by a [`ChannelSink`] consumer
#[derive(Debug)]
pub enum SinkEvent {
    /// Audio encoder configuration
    AudioConfigured(AudioSettings),
    /// Video encoder configuration
    EncoderConfigured(EncoderSettings),
    /// Video frame
    Video(Frame),
    /// Audio sample for a track
    Audio {
        /// Sample
        frame: AudioFrame,
        /// Destination track
        track: AudioTrack,
    },
}

/// Sink that forwards every submission over an unbounded channel
///
/// Sending never blocks. Once the receiver is dropped, every submission fails
/// with [`SinkError::Closed`].
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SinkEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver a transport task reads from
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: SinkEvent) -> Result<(), SinkError> {
        self.tx.send(event).map_err(|_| SinkError::Closed)
    }
}

impl FrameSink for ChannelSink {
    fn configure_audio(&self, settings: AudioSettings) -> Result<(), SinkError> {
        self.send(SinkEvent::AudioConfigured(settings))
    }

    fn configure_encoder(&self, settings: EncoderSettings) -> Result<(), SinkError> {
        self.send(SinkEvent::EncoderConfigured(settings))
    }

    fn append_video_frame(&self, frame: Frame) -> Result<(), SinkError> {
        self.send(SinkEvent::Video(frame))
    }

    fn append_audio_frame(&self, frame: AudioFrame, track: AudioTrack) -> Result<(), SinkError> {
        self.send(SinkEvent::Audio { frame, track })
    }
}

impl fmt::Debug for ChannelSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSink")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}
