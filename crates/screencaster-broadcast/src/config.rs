//! Broadcast Configuration
//!
//! Provides configuration options for a broadcast session with a builder
//! pattern for ergonomic construction.
//!
//! Values usually come from a settings store written by a UI. Stored values
//! are resolved the same way every time ([`resolve_fps`],
//! [`resolve_bitrate_mbps`]) so a missing or stale entry never produces an
//! unusable session.
//!
//! # Examples
//!
//! ```rust
//! use screencaster_broadcast::BroadcastConfig;
//!
//! // Using builder pattern
//! let config = BroadcastConfig::builder()
//!     .stream_url("rtmp://live.example.com/app/key")
//!     .video_bitrate_mbps(8)
//!     .fps(60)
//!     .build();
//! assert!(config.validate().is_ok());
//!
//! // From raw settings-store values
//! let config = BroadcastConfig::from_settings("rtmp://live.example.com/app", 0, 40);
//! assert_eq!(config.fps, 30);
//! assert_eq!(config.video_bitrate_mbps, 15);
//! ```

use screencaster_video::{recommended_queue_size, CompositorConfig, PixelFormat};

use crate::encoder::mbps_to_bps;
use crate::protocol::StreamProtocol;

/// Frame rates offered to the user
pub const SUPPORTED_FPS: [u32; 5] = [15, 20, 24, 30, 60];

/// Frame rate used when the stored value is not supported
pub const DEFAULT_FPS: u32 = 30;

/// Bitrate used when no positive value is stored
pub const DEFAULT_VIDEO_BITRATE_MBPS: u32 = 10;

/// Lowest selectable bitrate
pub const MIN_VIDEO_BITRATE_MBPS: u32 = 1;

/// Highest selectable bitrate
pub const MAX_VIDEO_BITRATE_MBPS: u32 = 15;

/// Stream URL used when none is configured
pub const DEFAULT_STREAM_URL: &str = "rtmp://127.0.0.1:1935/live/screen";

/// Resolve a stored frame rate: supported values pass, anything else is 30
#[must_use]
pub fn resolve_fps(raw: u32) -> u32 {
    if SUPPORTED_FPS.contains(&raw) {
        raw
    } else {
        DEFAULT_FPS
    }
}

/// Resolve a stored bitrate: positive values are capped at 15, zero is 10
#[must_use]
pub fn resolve_bitrate_mbps(raw: u32) -> u32 {
    if raw > 0 {
        raw.min(MAX_VIDEO_BITRATE_MBPS)
    } else {
        DEFAULT_VIDEO_BITRATE_MBPS
    }
}

/// Check that `url` has a scheme and a host
///
/// Returns a description of the first problem found.
pub fn validate_stream_url(url: &str) -> Result<(), String> {
    if url.trim().is_empty() {
        return Err("stream URL is empty".to_string());
    }

    let Some((scheme, rest)) = url.split_once("://") else {
        return Err(format!("'{url}' has no scheme"));
    };

    let mut chars = scheme.chars();
    let scheme_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !scheme_ok {
        return Err(format!("'{scheme}' is not a valid URL scheme"));
    }

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();
    if host.is_empty() || host.chars().any(char::is_whitespace) {
        return Err(format!("'{url}' has no valid host"));
    }

    Ok(())
}

/// Configuration for a broadcast session
///
/// Use [`BroadcastConfig::builder()`] for ergonomic construction or struct
/// literal syntax with [`Default::default()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Ingest URL (default: `rtmp://127.0.0.1:1935/live/screen`)
    ///
    /// The scheme selects the protocol, see [`StreamProtocol::from_url`].
    pub stream_url: String,

    /// Video bitrate in Mbps, 1-15 (default: 10)
    pub video_bitrate_mbps: u32,

    /// Target frame rate, one of 15, 20, 24, 30, 60 (default: 30)
    pub fps: u32,

    /// Samples buffered between the capture callback and the worker (default: 15)
    ///
    /// When full, new samples are dropped rather than blocking capture.
    pub queue_depth: usize,

    /// Canvas buffers that may be in flight (default: 6)
    pub pool_buffer_count: usize,

    /// Canvas pixel format (default: BGRA)
    pub pixel_format: PixelFormat,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            stream_url: DEFAULT_STREAM_URL.to_string(),
            video_bitrate_mbps: DEFAULT_VIDEO_BITRATE_MBPS,
            fps: DEFAULT_FPS,
            queue_depth: recommended_queue_size(DEFAULT_FPS),
            pool_buffer_count: CompositorConfig::default().max_buffers,
            pixel_format: PixelFormat::Bgra,
        }
    }
}

impl BroadcastConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> BroadcastConfigBuilder {
        BroadcastConfigBuilder::default()
    }

    /// Build from raw settings-store values, resolving them like the UI does
    #[must_use]
    pub fn from_settings(stream_url: impl Into<String>, raw_fps: u32, raw_bitrate_mbps: u32) -> Self {
        let fps = resolve_fps(raw_fps);
        Self {
            stream_url: stream_url.into(),
            video_bitrate_mbps: resolve_bitrate_mbps(raw_bitrate_mbps),
            fps,
            queue_depth: recommended_queue_size(fps),
            ..Self::default()
        }
    }

    /// Protocol selected by the URL scheme
    #[must_use]
    pub fn protocol(&self) -> StreamProtocol {
        StreamProtocol::from_url(&self.stream_url)
    }

    /// Video bitrate in bits per second
    #[must_use]
    pub fn video_bitrate_bps(&self) -> u64 {
        mbps_to_bps(self.video_bitrate_mbps)
    }

    /// Compositor configuration derived from this configuration
    #[must_use]
    pub fn compositor_config(&self) -> CompositorConfig {
        CompositorConfig::builder()
            .max_buffers(self.pool_buffer_count)
            .output_format(self.pixel_format)
            .build()
    }

    /// Validate configuration and return any issues
    ///
    /// Returns `Ok(())` if configuration is valid, or a list of issues.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut issues = Vec::new();

        if let Err(issue) = validate_stream_url(&self.stream_url) {
            issues.push(issue);
        }

        if !(MIN_VIDEO_BITRATE_MBPS..=MAX_VIDEO_BITRATE_MBPS).contains(&self.video_bitrate_mbps) {
            issues.push(format!(
                "video_bitrate_mbps must be between {MIN_VIDEO_BITRATE_MBPS} and {MAX_VIDEO_BITRATE_MBPS}"
            ));
        }

        if !SUPPORTED_FPS.contains(&self.fps) {
            issues.push("fps must be one of 15, 20, 24, 30, 60".to_string());
        }

        if self.queue_depth == 0 {
            issues.push("queue_depth must be at least 1".to_string());
        }

        if let Err(compositor_issues) = self.compositor_config().validate() {
            issues.extend(
                compositor_issues
                    .into_iter()
                    .map(|issue| issue.replace("max_buffers", "pool_buffer_count")),
            );
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

/// Builder for [`BroadcastConfig`]
///
/// Provides a fluent interface for constructing configuration.
#[derive(Debug, Clone, Default)]
pub struct BroadcastConfigBuilder {
    stream_url: Option<String>,
    video_bitrate_mbps: Option<u32>,
    fps: Option<u32>,
    queue_depth: Option<usize>,
    pool_buffer_count: Option<usize>,
    pixel_format: Option<PixelFormat>,
}

impl BroadcastConfigBuilder {
    /// Set the ingest URL
    #[must_use]
    pub fn stream_url(mut self, url: impl Into<String>) -> Self {
        self.stream_url = Some(url.into());
        self
    }

    /// Set the video bitrate, clamped to 1-15 Mbps
    #[must_use]
    pub fn video_bitrate_mbps(mut self, mbps: u32) -> Self {
        self.video_bitrate_mbps = Some(mbps.clamp(MIN_VIDEO_BITRATE_MBPS, MAX_VIDEO_BITRATE_MBPS));
        self
    }

    /// Set the target frame rate
    #[must_use]
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = Some(fps);
        self
    }

    /// Set the ingest queue depth
    ///
    /// Defaults to [`recommended_queue_size`] for the chosen frame rate.
    #[must_use]
    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = Some(depth);
        self
    }

    /// Set the number of canvas buffers that may be in flight
    #[must_use]
    pub fn pool_buffer_count(mut self, count: usize) -> Self {
        self.pool_buffer_count = Some(count);
        self
    }

    /// Set the canvas pixel format
    #[must_use]
    pub fn pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = Some(format);
        self
    }

    /// Build the configuration
    ///
    /// Returns a [`BroadcastConfig`] with builder values overriding defaults.
    #[must_use]
    pub fn build(self) -> BroadcastConfig {
        let defaults = BroadcastConfig::default();
        let fps = self.fps.unwrap_or(defaults.fps);

        BroadcastConfig {
            stream_url: self.stream_url.unwrap_or(defaults.stream_url),
            video_bitrate_mbps: self
                .video_bitrate_mbps
                .unwrap_or(defaults.video_bitrate_mbps),
            fps,
            queue_depth: self
                .queue_depth
                .unwrap_or_else(|| recommended_queue_size(fps)),
            pool_buffer_count: self
                .pool_buffer_count
                .unwrap_or(defaults.pool_buffer_count),
            pixel_format: self.pixel_format.unwrap_or(defaults.pixel_format),
        }
    }
}
