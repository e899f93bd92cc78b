//! Broadcast session
//!
//! [`BroadcastSession`] is the entry point the capture source drives. The
//! capture callback calls [`process_sample`](BroadcastSession::process_sample)
//! once per delivered sample; it never blocks:
//!
//! ```text
//! capture callback ──► throttle ──► bounded queue ──► FramePipeline ──► FrameSink
//!   (any thread)        (video)      (try_send)       (blocking worker)
//! ```
//!
//! A full queue drops the sample and counts it. Video and audio share the
//! queue so the sink sees them in arrival order.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use screencaster_broadcast::{
//!     BroadcastConfig, BroadcastSession, ChannelSink, SampleBuffer, SinkEvent,
//! };
//! use screencaster_video::{Frame, MediaTime, PixelFormat};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (sink, mut events) = ChannelSink::new();
//! let config = BroadcastConfig::builder()
//!     .stream_url("rtmp://live.example.com/app/key")
//!     .build();
//! let session = BroadcastSession::start(config, Arc::new(sink))?;
//!
//! let frame = Frame::new(vec![0u8; 16 * 8 * 4], 16, 8, 16 * 4, PixelFormat::Bgra,
//!     MediaTime::new(0, 600))?;
//! session.process_sample(SampleBuffer::Video(frame))?;
//!
//! let stats = session.finish().await?;
//! assert_eq!(stats.video_forwarded, 1);
//!
//! assert!(matches!(events.recv().await, Some(SinkEvent::AudioConfigured(_))));
//! assert!(matches!(events.recv().await, Some(SinkEvent::EncoderConfigured(_))));
//! assert!(matches!(events.recv().await, Some(SinkEvent::Video(_))));
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use screencaster_video::{Frame, FrameThrottle};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::{validate_stream_url, BroadcastConfig};
use crate::error::{BroadcastError, Result};
use crate::pipeline::{FramePipeline, PipelineItem};
use crate::protocol::StreamProtocol;
use crate::sink::{AudioFrame, AudioTrack, FrameSink};

// =============================================================================
// SAMPLES
// =============================================================================

/// Kind of sample delivered by the capture source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    /// Screen video
    Video,
    /// Application audio
    AudioApp,
    /// Microphone audio
    AudioMic,
}

/// A sample delivered by the capture source
#[derive(Debug)]
pub enum SampleBuffer {
    /// Screen video frame, with its orientation tag attached
    Video(Frame),
    /// Application audio, forwarded to track 1
    AudioApp(AudioFrame),
    /// Microphone audio, forwarded to track 0
    AudioMic(AudioFrame),
}

impl SampleBuffer {
    /// Kind of this sample
    #[must_use]
    pub fn kind(&self) -> SampleKind {
        match self {
            Self::Video(_) => SampleKind::Video,
            Self::AudioApp(_) => SampleKind::AudioApp,
            Self::AudioMic(_) => SampleKind::AudioMic,
        }
    }
}

/// Sink errors buffered for [`BroadcastSession::take_error_receiver`]
///
/// Errors reported while the buffer is full are dropped and counted in
/// [`SessionStats::errors_dropped`].
pub const ERROR_CHANNEL_CAPACITY: usize = 64;

/// Session counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Video samples delivered by capture
    pub video_received: u64,
    /// Audio samples delivered by capture
    pub audio_received: u64,
    /// Video samples rejected by the throttle
    pub throttled: u64,
    /// Samples dropped because the queue was full
    pub queue_dropped: u64,
    /// Audio samples skipped because their data was not ready
    pub audio_not_ready: u64,
    /// Video frames accepted by the sink
    pub video_forwarded: u64,
    /// Audio samples accepted by the sink
    pub audio_forwarded: u64,
    /// Frames rendered onto the canvas
    pub normalized: u64,
    /// Frames forwarded without a copy
    pub passthrough: u64,
    /// Frames forwarded unchanged after a normalization failure
    pub fallback: u64,
    /// Sink submissions that failed
    pub sink_errors: u64,
    /// Sink errors not delivered because the error channel was full
    pub errors_dropped: u64,
}

// =============================================================================
// SESSION
// =============================================================================

/// Capture-side state, locked briefly once per sample
struct Ingress {
    throttle: FrameThrottle,
    tx: Option<mpsc::Sender<PipelineItem>>,
}

/// A running broadcast
///
/// `BroadcastSession` is `Send + Sync`; share it behind an `Arc` between the
/// capture callback and whatever ends the broadcast.
pub struct BroadcastSession {
    config: BroadcastConfig,
    protocol: StreamProtocol,
    ingress: Mutex<Ingress>,
    stats: Arc<Mutex<SessionStats>>,
    cancelled: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    errors: Mutex<Option<mpsc::Receiver<BroadcastError>>>,
}

impl BroadcastSession {
    /// Validate `config`, prepare `sink` and start the pipeline worker
    ///
    /// Must be called from within a Tokio runtime; the worker runs on its
    /// blocking pool.
    ///
    /// # Errors
    ///
    /// - [`BroadcastError::InvalidUrl`] if the stream URL is unusable
    /// - [`BroadcastError::InvalidConfig`] if any other setting is invalid
    /// - [`BroadcastError::SinkUnavailable`] if the sink refuses audio setup
    /// - [`BroadcastError::Worker`] outside a Tokio runtime
    pub fn start(config: BroadcastConfig, sink: Arc<dyn FrameSink>) -> Result<Self> {
        validate_stream_url(&config.stream_url).map_err(BroadcastError::invalid_url)?;
        config
            .validate()
            .map_err(|issues| BroadcastError::invalid_config(issues.join("; ")))?;

        let runtime = Handle::try_current().map_err(|e| BroadcastError::worker(e.to_string()))?;

        let protocol = config.protocol();
        let audio = protocol.audio_settings();
        debug!(
            "Stream protocol {}, audio {:?} at {} bps",
            protocol, audio.codec, audio.bitrate_bps
        );
        sink.configure_audio(audio)
            .map_err(|e| BroadcastError::sink_unavailable(e.to_string()))?;

        let (tx, rx) = mpsc::channel(config.queue_depth);
        let (error_tx, error_rx) = mpsc::channel(ERROR_CHANNEL_CAPACITY);
        let stats = Arc::new(Mutex::new(SessionStats::default()));
        let cancelled = Arc::new(AtomicBool::new(false));

        let pipeline = FramePipeline::new(
            &config,
            sink,
            Arc::clone(&stats),
            error_tx,
            Arc::clone(&cancelled),
        );
        let worker = runtime.spawn_blocking(move || pipeline.run(rx));

        info!(
            "Broadcast started over {} at {} Mbps, {} fps",
            protocol, config.video_bitrate_mbps, config.fps
        );

        Ok(Self {
            config,
            protocol,
            ingress: Mutex::new(Ingress {
                throttle: FrameThrottle::new(),
                tx: Some(tx),
            }),
            stats,
            cancelled,
            worker: Mutex::new(Some(worker)),
            errors: Mutex::new(Some(error_rx)),
        })
    }

    /// Hand one captured sample to the pipeline
    ///
    /// Never blocks. Video is throttled to the configured frame rate; audio
    /// whose data is not ready is skipped. Throttled, skipped and
    /// queue-dropped samples are counted in [`stats`](Self::stats) and are
    /// not errors.
    ///
    /// # Errors
    ///
    /// - [`BroadcastError::NotRunning`] after `finish` or `abort`
    /// - [`BroadcastError::Worker`] if the pipeline worker has stopped
    pub fn process_sample(&self, sample: SampleBuffer) -> Result<()> {
        let mut ingress = self.ingress.lock();
        let Ingress { throttle, tx } = &mut *ingress;
        let Some(tx) = tx.as_ref() else {
            return Err(BroadcastError::NotRunning);
        };

        let item = match sample {
            SampleBuffer::Video(frame) => {
                self.stats.lock().video_received += 1;
                // A frame the full queue would drop must not become the baseline
                if tx.capacity() == 0
                    && !tx.is_closed()
                    && throttle.would_accept(frame.pts(), self.config.fps) {
                    trace!("Pipeline queue full, dropping frame at {}", frame.pts());
                    self.stats.lock().queue_dropped += 1;
                    return Ok(());
                }
                if !throttle.accept(frame.pts(), self.config.fps) {
                    trace!("Throttled video frame at {}", frame.pts());
                    self.stats.lock().throttled += 1;
                    return Ok(());
                }
                PipelineItem::Video(frame)
            }
            SampleBuffer::AudioApp(frame) => match self.audio_item(frame, AudioTrack::Application) {
                Some(item) => item,
                None => return Ok(()),
            },
            SampleBuffer::AudioMic(frame) => match self.audio_item(frame, AudioTrack::Microphone) {
                Some(item) => item,
                None => return Ok(()),
            },
        };

        match tx.try_send(item) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                trace!("Pipeline queue full, dropping sample");
                self.stats.lock().queue_dropped += 1;
                Ok(())
            }
            Err(TrySendError::Closed(_)) => {
                Err(BroadcastError::worker("pipeline worker is no longer running"))
            }
        }
    }

    fn audio_item(&self, frame: AudioFrame, track: AudioTrack) -> Option<PipelineItem> {
        let mut stats = self.stats.lock();
        stats.audio_received += 1;
        if !frame.data_ready {
            stats.audio_not_ready += 1;
            return None;
        }
        Some(PipelineItem::Audio { frame, track })
    }

    /// Stop accepting samples, let the worker drain the queue and wait for it
    ///
    /// Returns the final counters. The canvas pool is released once the
    /// worker exits.
    ///
    /// # Errors
    ///
    /// - [`BroadcastError::NotRunning`] if already finished or aborted
    /// - [`BroadcastError::Worker`] if the worker panicked
    pub async fn finish(&self) -> Result<SessionStats> {
        let tx = self.ingress.lock().tx.take();
        let Some(tx) = tx else {
            return Err(BroadcastError::NotRunning);
        };
        drop(tx);

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            worker
                .await
                .map_err(|e| BroadcastError::worker(format!("pipeline worker failed: {e}")))?;
        }

        let stats = self.stats();
        info!(
            "Broadcast finished: {} video frames forwarded, {} throttled, {} dropped, {} sink errors",
            stats.video_forwarded, stats.throttled, stats.queue_dropped, stats.sink_errors
        );
        Ok(stats)
    }

    /// Stop immediately, abandoning samples still queued
    ///
    /// Does not wait for the worker; it exits after the sample it is
    /// currently handling.
    ///
    /// # Errors
    ///
    /// Returns [`BroadcastError::NotRunning`] if already finished or aborted.
    pub fn abort(&self) -> Result<()> {
        self.cancelled.store(true, Ordering::Release);
        let tx = self.ingress.lock().tx.take();
        if tx.is_none() {
            return Err(BroadcastError::NotRunning);
        }
        drop(tx);
        // Detach; a blocking task cannot be interrupted mid-sample
        drop(self.worker.lock().take());

        warn!("Broadcast aborted");
        Ok(())
    }

    /// Take the receiver for sink errors reported during streaming
    ///
    /// At most [`ERROR_CHANNEL_CAPACITY`] errors wait unread; later ones are
    /// only counted. Returns `None` after the first call.
    pub fn take_error_receiver(&self) -> Option<mpsc::Receiver<BroadcastError>> {
        self.errors.lock().take()
    }

    /// Snapshot of the session counters
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats.lock().clone()
    }

    /// `true` until `finish` or `abort` is called
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.ingress.lock().tx.is_some()
    }

    /// Session configuration
    #[must_use]
    pub fn config(&self) -> &BroadcastConfig {
        &self.config
    }

    /// Protocol selected by the stream URL
    #[must_use]
    pub fn protocol(&self) -> StreamProtocol {
        self.protocol
    }
}

impl fmt::Debug for BroadcastSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcastSession")
            .field("protocol", &self.protocol)
            .field("fps", &self.config.fps)
            .field("running", &self.is_running())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc as std_mpsc;
    use std::time::Duration;

    use screencaster_video::{MediaTime, PixelFormat, Size};

    use super::*;
    use crate::encoder::EncoderSettings;
    use crate::error::SinkError;
    use crate::sink::{AudioCodec, AudioSettings, ChannelSink, SinkEvent};

    fn config() -> BroadcastConfig {
        BroadcastConfig::builder()
            .stream_url("rtmp://live.example.com/app/key")
            .queue_depth(64)
            .build()
    }

    fn video(width: u32, height: u32, ticks: i64) -> SampleBuffer {
        let stride = width as usize * 4;
        let frame = Frame::new(
            vec![0x20u8; stride * height as usize],
            width,
            height,
            stride,
            PixelFormat::Bgra,
            MediaTime::new(ticks, 600),
        )
        .unwrap();
        SampleBuffer::Video(frame)
    }

    fn audio(ticks: i64) -> AudioFrame {
        AudioFrame::new(vec![0u8; 16], MediaTime::new(ticks, 600))
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<SinkEvent>) -> Vec<SinkEvent> {
        std::iter::from_fn(|| events.try_recv().ok()).collect()
    }

    /// Sink that rejects every video frame
    struct RejectingSink;

    impl FrameSink for RejectingSink {
        fn configure_audio(&self, _: AudioSettings) -> std::result::Result<(), SinkError> {
            Ok(())
        }

        fn configure_encoder(&self, _: EncoderSettings) -> std::result::Result<(), SinkError> {
            Ok(())
        }

        fn append_video_frame(&self, _: Frame) -> std::result::Result<(), SinkError> {
            Err(SinkError::rejected("encoder not ready"))
        }

        fn append_audio_frame(
            &self,
            _: AudioFrame,
            _: AudioTrack,
        ) -> std::result::Result<(), SinkError> {
            Ok(())
        }
    }

    /// Sink whose video submissions announce themselves, then wait for the gate
    struct GatedSink {
        entered: Mutex<std_mpsc::Sender<()>>,
        gate: Mutex<std_mpsc::Receiver<()>>,
    }

    impl GatedSink {
        fn new() -> (Self, std_mpsc::Receiver<()>, std_mpsc::Sender<()>) {
            let (entered_tx, entered_rx) = std_mpsc::channel();
            let (gate_tx, gate_rx) = std_mpsc::channel();
            let sink = Self {
                entered: Mutex::new(entered_tx),
                gate: Mutex::new(gate_rx),
            };
            (sink, entered_rx, gate_tx)
        }
    }

    impl FrameSink for GatedSink {
        fn configure_audio(&self, _: AudioSettings) -> std::result::Result<(), SinkError> {
            Ok(())
        }

        fn configure_encoder(&self, _: EncoderSettings) -> std::result::Result<(), SinkError> {
            Ok(())
        }

        fn append_video_frame(&self, _: Frame) -> std::result::Result<(), SinkError> {
            let _ = self.entered.lock().send(());
            let _ = self.gate.lock().recv();
            Ok(())
        }

        fn append_audio_frame(
            &self,
            _: AudioFrame,
            _: AudioTrack,
        ) -> std::result::Result<(), SinkError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_url() {
        let (sink, _events) = ChannelSink::new();
        let config = BroadcastConfig::builder().stream_url("live/iphone").build();

        let err = BroadcastSession::start(config, Arc::new(sink)).unwrap_err();
        assert!(matches!(err, BroadcastError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_config() {
        let (sink, _events) = ChannelSink::new();
        let config = BroadcastConfig::builder()
            .stream_url("rtmp://live.example.com/app")
            .fps(25)
            .build();

        let err = BroadcastSession::start(config, Arc::new(sink)).unwrap_err();
        match err {
            BroadcastError::InvalidConfig(msg) => assert!(msg.contains("fps")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_start_fails_when_sink_closed() {
        let (sink, events) = ChannelSink::new();
        drop(events);

        let err = BroadcastSession::start(config(), Arc::new(sink)).unwrap_err();
        assert!(matches!(err, BroadcastError::SinkUnavailable(_)));
    }

    #[test]
    fn test_start_outside_runtime() {
        let (sink, _events) = ChannelSink::new();
        let err = BroadcastSession::start(config(), Arc::new(sink)).unwrap_err();
        assert!(matches!(err, BroadcastError::Worker(_)));
    }

    #[tokio::test]
    async fn test_audio_configured_per_protocol() {
        for (url, expected) in [
            ("rtmps://live.example.com/app", AudioCodec::Aac),
            ("https://whip.example.com/ingest", AudioCodec::Opus),
        ] {
            let (sink, mut events) = ChannelSink::new();
            let config = BroadcastConfig::builder().stream_url(url).build();
            let session = BroadcastSession::start(config, Arc::new(sink)).unwrap();
            session.finish().await.unwrap();

            match events.try_recv().unwrap() {
                SinkEvent::AudioConfigured(settings) => assert_eq!(settings.codec, expected),
                other => panic!("expected audio configuration, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_samples_reach_sink_in_arrival_order() {
        let (sink, mut events) = ChannelSink::new();
        let session = BroadcastSession::start(config(), Arc::new(sink)).unwrap();

        // 30 fps capture, one mic sample after each frame
        for i in 0..10 {
            session.process_sample(video(16, 8, i * 20)).unwrap();
            session.process_sample(SampleBuffer::AudioMic(audio(i * 20 + 1))).unwrap();
        }
        let stats = session.finish().await.unwrap();
        assert_eq!(stats.video_forwarded, 10);
        assert_eq!(stats.audio_forwarded, 10);

        let events = drain(&mut events);
        assert!(matches!(events[0], SinkEvent::AudioConfigured(_)));
        assert!(matches!(events[1], SinkEvent::EncoderConfigured(_)));

        let order: Vec<i64> = events[2..]
            .iter()
            .map(|event| match event {
                SinkEvent::Video(frame) => frame.pts().value(),
                SinkEvent::Audio { frame, track } => {
                    assert_eq!(*track, AudioTrack::Microphone);
                    frame.pts.value()
                }
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        let expected: Vec<i64> = (0..10).flat_map(|i| [i * 20, i * 20 + 1]).collect();
        assert_eq!(order, expected);
    }

    #[tokio::test]
    async fn test_encoder_configured_once_per_session() {
        let (sink, mut events) = ChannelSink::new();
        let session = BroadcastSession::start(config(), Arc::new(sink)).unwrap();

        session.process_sample(video(8, 16, 0)).unwrap();
        session.process_sample(video(16, 8, 20)).unwrap();
        session.process_sample(video(8, 16, 40)).unwrap();
        session.finish().await.unwrap();

        let configured: Vec<_> = drain(&mut events)
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::EncoderConfigured(settings) => Some(settings),
                _ => None,
            })
            .collect();
        assert_eq!(configured.len(), 1);
        assert_eq!(configured[0].canvas, Size::new(16, 8));
        assert_eq!(configured[0].bitrate_bps, 10_000_000);
    }

    #[tokio::test]
    async fn test_video_throttled_to_target_rate() {
        let (sink, mut events) = ChannelSink::new();
        let config = BroadcastConfig::builder()
            .stream_url("rtmp://live.example.com/app")
            .fps(15)
            .queue_depth(64)
            .build();
        let session = BroadcastSession::start(config, Arc::new(sink)).unwrap();

        // One second of 60 Hz capture
        for i in 0..60 {
            session.process_sample(video(16, 8, i * 10)).unwrap();
        }
        let stats = session.finish().await.unwrap();

        assert_eq!(stats.video_received, 60);
        assert_eq!(stats.throttled + stats.video_forwarded, 60);
        assert!((13..=17).contains(&stats.video_forwarded), "{stats:?}");

        let frames = drain(&mut events)
            .into_iter()
            .filter(|event| matches!(event, SinkEvent::Video(_)))
            .count();
        assert_eq!(u64::try_from(frames).unwrap(), stats.video_forwarded);
    }

    #[tokio::test]
    async fn test_audio_tracks_and_readiness() {
        let (sink, mut events) = ChannelSink::new();
        let session = BroadcastSession::start(config(), Arc::new(sink)).unwrap();

        session.process_sample(SampleBuffer::AudioMic(audio(0))).unwrap();
        session.process_sample(SampleBuffer::AudioApp(audio(1))).unwrap();
        session
            .process_sample(SampleBuffer::AudioApp(audio(2).not_ready()))
            .unwrap();
        let stats = session.finish().await.unwrap();

        assert_eq!(stats.audio_received, 3);
        assert_eq!(stats.audio_not_ready, 1);
        assert_eq!(stats.audio_forwarded, 2);

        let tracks: Vec<u8> = drain(&mut events)
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Audio { track, .. } => Some(track.index()),
                _ => None,
            })
            .collect();
        assert_eq!(tracks, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let (sink, _entered, gate_tx) = GatedSink::new();
        let config = BroadcastConfig::builder()
            .stream_url("rtmp://live.example.com/app")
            .fps(60)
            .queue_depth(1)
            .build();
        let session = BroadcastSession::start(config, Arc::new(sink)).unwrap();

        // The worker holds at most one frame in the sink and one sits in the queue
        for i in 0..4 {
            session.process_sample(video(16, 8, i * 600)).unwrap();
        }
        drop(gate_tx);
        let stats = session.finish().await.unwrap();

        assert!(stats.queue_dropped >= 2, "{stats:?}");
        assert_eq!(stats.video_forwarded + stats.queue_dropped, 4);
    }

    #[tokio::test]
    async fn test_dropped_frame_does_not_move_throttle_baseline() {
        let wait = Duration::from_secs(5);
        let (sink, entered, gate_tx) = GatedSink::new();
        let config = BroadcastConfig::builder()
            .stream_url("rtmp://live.example.com/app")
            .fps(30)
            .queue_depth(1)
            .build();
        let session = BroadcastSession::start(config, Arc::new(sink)).unwrap();

        // Worker holds the first frame inside the sink
        session.process_sample(video(16, 8, 0)).unwrap();
        entered.recv_timeout(wait).unwrap();

        // Second frame fills the queue, third is dropped
        session.process_sample(video(16, 8, 20)).unwrap();
        session.process_sample(video(16, 8, 40)).unwrap();
        assert_eq!(session.stats().queue_dropped, 1);

        // Release the first frame; the worker takes the second off the queue
        gate_tx.send(()).unwrap();
        entered.recv_timeout(wait).unwrap();

        // Measured from the frame at 20, not the dropped one at 40
        session.process_sample(video(16, 8, 45)).unwrap();
        drop(gate_tx);
        let stats = session.finish().await.unwrap();

        assert_eq!(stats.video_received, 4);
        assert_eq!(stats.throttled, 0);
        assert_eq!(stats.queue_dropped, 1);
        assert_eq!(stats.video_forwarded, 3);
    }

    #[tokio::test]
    async fn test_unread_sink_errors_are_bounded() {
        let config = BroadcastConfig::builder()
            .stream_url("rtmp://live.example.com/app/key")
            .queue_depth(1024)
            .build();
        let session = BroadcastSession::start(config, Arc::new(RejectingSink)).unwrap();

        // 500 frames at 30 fps with nobody reading errors
        for i in 0..500 {
            session.process_sample(video(16, 8, i * 20)).unwrap();
        }
        let stats = session.finish().await.unwrap();

        let failed = stats.video_received - stats.queue_dropped;
        assert_eq!(stats.sink_errors, failed);
        let capacity = u64::try_from(ERROR_CHANNEL_CAPACITY).unwrap();
        assert_eq!(stats.errors_dropped, failed.saturating_sub(capacity));

        let mut errors = session.take_error_receiver().unwrap();
        let buffered = std::iter::from_fn(|| errors.try_recv().ok()).count();
        assert_eq!(buffered, ERROR_CHANNEL_CAPACITY);
    }

    #[tokio::test]
    async fn test_sink_errors_reported_on_channel() {
        let session = BroadcastSession::start(config(), Arc::new(RejectingSink)).unwrap();
        let mut errors = session.take_error_receiver().unwrap();
        assert!(session.take_error_receiver().is_none());

        session.process_sample(video(16, 8, 0)).unwrap();
        let stats = session.finish().await.unwrap();

        assert_eq!(stats.sink_errors, 1);
        assert_eq!(stats.video_forwarded, 0);
        assert!(matches!(
            errors.try_recv(),
            Ok(BroadcastError::Sink(SinkError::Rejected(_)))
        ));
    }

    #[tokio::test]
    async fn test_finish_twice() {
        let (sink, _events) = ChannelSink::new();
        let session = BroadcastSession::start(config(), Arc::new(sink)).unwrap();

        assert!(session.is_running());
        session.finish().await.unwrap();
        assert!(!session.is_running());
        assert!(matches!(session.finish().await, Err(BroadcastError::NotRunning)));
        assert!(matches!(
            session.process_sample(video(16, 8, 0)),
            Err(BroadcastError::NotRunning)
        ));
    }

    #[tokio::test]
    async fn test_abort() {
        let (sink, _events) = ChannelSink::new();
        let session = BroadcastSession::start(config(), Arc::new(sink)).unwrap();

        session.abort().unwrap();
        assert!(!session.is_running());
        assert!(matches!(session.abort(), Err(BroadcastError::NotRunning)));
        assert!(matches!(
            session.process_sample(video(16, 8, 0)),
            Err(BroadcastError::NotRunning)
        ));
    }

    #[test]
    fn test_sample_kind() {
        assert_eq!(video(2, 2, 0).kind(), SampleKind::Video);
        assert_eq!(SampleBuffer::AudioApp(audio(0)).kind(), SampleKind::AudioApp);
        assert_eq!(SampleBuffer::AudioMic(audio(0)).kind(), SampleKind::AudioMic);
    }
}
