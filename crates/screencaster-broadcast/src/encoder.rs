//! Encoder configuration
//!
//! The hardware encoder needs one fixed canvas for the whole broadcast.
//! [`EncoderConfigTrigger`] derives it from the first video frame, always in
//! landscape, and produces the settings the sink is configured with exactly
//! once. The same [`CanvasSpec`] is then handed to the compositor for every
//! frame.

use std::time::Duration;

use screencaster_video::{canonical_landscape, CanvasSpec, PixelFormat, Size};
use tracing::info;

/// Bitrate control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateControl {
    /// Average bitrate over time
    Average,
}

/// H.264 profile and level hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileLevel {
    /// High profile, level 4.2
    H264High42,
}

/// Encoder behaviour that does not depend on the session's configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderPolicy {
    /// Rate control mode (default: average)
    pub rate_control: RateControl,

    /// Longest allowed gap between keyframes (default: 1s)
    pub max_keyframe_interval: Duration,

    /// Whether B-frame reordering is allowed (default: false)
    pub allow_frame_reordering: bool,

    /// Prefer a hardware encoder when available (default: true)
    pub hardware_accelerated: bool,

    /// Profile and level hint (default: H.264 High 4.2)
    pub profile_level: ProfileLevel,
}

impl Default for EncoderPolicy {
    fn default() -> Self {
        Self {
            rate_control: RateControl::Average,
            max_keyframe_interval: Duration::from_secs(1),
            allow_frame_reordering: false,
            hardware_accelerated: true,
            profile_level: ProfileLevel::H264High42,
        }
    }
}

/// One-time encoder configuration request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    /// Output canvas, always landscape
    pub canvas: Size,
    /// Target bitrate in bits per second
    pub bitrate_bps: u64,
    /// Expected frame rate
    pub fps: u32,
    /// Fixed encoder behaviour
    pub policy: EncoderPolicy,
}

/// Convert a bitrate in Mbps to bits per second
#[must_use]
pub fn mbps_to_bps(mbps: u32) -> u64 {
    u64::from(mbps) * 1_000_000
}

/// Fires once, on the first video frame, to fix the canvas and configure the encoder
#[derive(Debug, Clone)]
pub struct EncoderConfigTrigger {
    bitrate_mbps: u32,
    fps: u32,
    format: PixelFormat,
    canvas: Option<CanvasSpec>,
}

impl EncoderConfigTrigger {
    /// Create an unfired trigger
    #[must_use]
    pub fn new(bitrate_mbps: u32, fps: u32, format: PixelFormat) -> Self {
        Self {
            bitrate_mbps,
            fps,
            format,
            canvas: None,
        }
    }

    /// Observe a video frame's intrinsic size
    ///
    /// Returns the settings to submit on the first call and `None` on every
    /// later call, whatever the frame size.
    pub fn observe(&mut self, frame_size: Size) -> Option<EncoderSettings> {
        if self.canvas.is_some() {
            return None;
        }

        let canvas = canonical_landscape(frame_size);
        self.canvas = Some(CanvasSpec::new(canvas, self.format));

        let settings = EncoderSettings {
            canvas,
            bitrate_bps: mbps_to_bps(self.bitrate_mbps),
            fps: self.fps,
            policy: EncoderPolicy::default(),
        };
        info!(
            "Encoder configured: {} at {} Mbps, {} fps (first frame {})",
            canvas, self.bitrate_mbps, self.fps, frame_size
        );
        Some(settings)
    }

    /// The canvas fixed by the first frame
    #[must_use]
    pub fn canvas(&self) -> Option<CanvasSpec> {
        self.canvas
    }

    /// `true` once the first frame has been observed
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.canvas.is_some()
    }
}
