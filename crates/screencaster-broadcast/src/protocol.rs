//! Stream protocol detection
//!
//! The ingest protocol is inferred from the stream URL scheme. It decides the
//! audio codec and bitrate announced to the sink when the session starts.

use std::fmt;

use crate::sink::{AudioCodec, AudioSettings};

/// Audio bitrate for RTMP ingest (AAC)
pub const RTMP_AUDIO_BITRATE: u32 = 192_000;

/// Audio bitrate for WHIP ingest (Opus)
pub const WHIP_AUDIO_BITRATE: u32 = 128_000;

/// Wire protocol used to reach the ingest server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamProtocol {
    /// RTMP or RTMPS
    Rtmp,
    /// WebRTC-HTTP ingestion
    Whip,
}

impl StreamProtocol {
    /// Detect the protocol from a stream URL
    ///
    /// `rtmp://` and `rtmps://` (any case) select RTMP; everything else is
    /// treated as a WHIP endpoint.
    ///
    /// ```rust
    /// use screencaster_broadcast::StreamProtocol;
    ///
    /// assert_eq!(StreamProtocol::from_url("RTMPS://live.example.com/app"), StreamProtocol::Rtmp);
    /// assert_eq!(StreamProtocol::from_url("https://whip.example.com/ingest"), StreamProtocol::Whip);
    /// ```
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("rtmp://") || lower.starts_with("rtmps://") {
            Self::Rtmp
        } else {
            Self::Whip
        }
    }

    /// Human readable name
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rtmp => "RTMP",
            Self::Whip => "WebRTC (WHIP)",
        }
    }

    /// Audio configuration expected by ingest servers speaking this protocol
    #[must_use]
    pub const fn audio_settings(self) -> AudioSettings {
        match self {
            Self::Rtmp => AudioSettings {
                codec: AudioCodec::Aac,
                bitrate_bps: RTMP_AUDIO_BITRATE,
            },
            Self::Whip => AudioSettings {
                codec: AudioCodec::Opus,
                bitrate_bps: WHIP_AUDIO_BITRATE,
            },
        }
    }
}

impl fmt::Display for StreamProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
