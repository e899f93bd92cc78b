//! Ordered pipeline worker
//!
//! A single consumer drains the ingest queue on a blocking thread. It owns
//! every piece of per-session state (encoder trigger, canvas, compositor and
//! its buffer pool), so none of it is shared or locked, and it submits to the
//! sink in exactly the order samples were queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use screencaster_video::{CompositeOutcome, Frame, FrameCompositor};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::config::BroadcastConfig;
use crate::encoder::EncoderConfigTrigger;
use crate::error::{BroadcastError, SinkError};
use crate::session::SessionStats;
use crate::sink::{AudioFrame, AudioTrack, FrameSink};

/// Work item queued by the capture callback
#[derive(Debug)]
pub(crate) enum PipelineItem {
    Video(Frame),
    Audio { frame: AudioFrame, track: AudioTrack },
}

/// Single-consumer worker turning queued samples into sink submissions
pub(crate) struct FramePipeline {
    compositor: FrameCompositor,
    trigger: EncoderConfigTrigger,
    sink: Arc<dyn FrameSink>,
    stats: Arc<Mutex<SessionStats>>,
    errors: mpsc::Sender<BroadcastError>,
    cancelled: Arc<AtomicBool>,
}

impl FramePipeline {
    pub(crate) fn new(
        config: &BroadcastConfig,
        sink: Arc<dyn FrameSink>,
        stats: Arc<Mutex<SessionStats>>,
        errors: mpsc::Sender<BroadcastError>,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            compositor: FrameCompositor::new(config.compositor_config()),
            trigger: EncoderConfigTrigger::new(
                config.video_bitrate_mbps,
                config.fps,
                config.pixel_format,
            ),
            sink,
            stats,
            errors,
            cancelled,
        }
    }

    /// Drain `rx` until every sender is gone, then release the canvas pool
    ///
    /// Blocks the calling thread; run it under `spawn_blocking`.
    pub(crate) fn run(mut self, mut rx: mpsc::Receiver<PipelineItem>) {
        debug!("Pipeline worker started");

        while let Some(item) = rx.blocking_recv() {
            if self.cancelled.load(Ordering::Acquire) {
                debug!("Pipeline cancelled, abandoning queued samples");
                break;
            }
            self.handle(item);
        }

        self.compositor.release_pool();

        let stats = self.compositor.stats();
        info!(
            "Pipeline worker finished: {} normalized, {} passthrough, {} fallback",
            stats.normalized, stats.passthrough, stats.fallback
        );
    }

    pub(crate) fn handle(&mut self, item: PipelineItem) {
        match item {
            PipelineItem::Video(frame) => self.handle_video(frame),
            PipelineItem::Audio { frame, track } => self.handle_audio(frame, track),
        }
    }

    fn handle_video(&mut self, frame: Frame) {
        if let Some(settings) = self.trigger.observe(frame.size()) {
            if let Err(e) = self.sink.configure_encoder(settings) {
                self.report(e);
            }
        }

        let Some(canvas) = self.trigger.canvas() else {
            return;
        };

        let composed = self.compositor.compose(frame, &canvas);
        {
            let mut stats = self.stats.lock();
            match composed.outcome {
                CompositeOutcome::Normalized => stats.normalized += 1,
                CompositeOutcome::Passthrough => stats.passthrough += 1,
                CompositeOutcome::Fallback(_) => stats.fallback += 1,
            }
        }

        match self.sink.append_video_frame(composed.frame) {
            Ok(()) => self.stats.lock().video_forwarded += 1,
            Err(e) => self.report(e),
        }
    }

    fn handle_audio(&mut self, frame: AudioFrame, track: AudioTrack) {
        match self.sink.append_audio_frame(frame, track) {
            Ok(()) => self.stats.lock().audio_forwarded += 1,
            Err(e) => self.report(e),
        }
    }

    fn report(&self, error: SinkError) {
        warn!("Sink submission failed: {}", error);
        let mut stats = self.stats.lock();
        stats.sink_errors += 1;
        match self.errors.try_send(BroadcastError::Sink(error)) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(_)) => stats.errors_dropped += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use screencaster_video::{MediaTime, PixelFormat, Size};

    use super::*;
    use crate::session::ERROR_CHANNEL_CAPACITY;
    use crate::sink::{ChannelSink, SinkEvent};

    struct Harness {
        pipeline: FramePipeline,
        events: mpsc::UnboundedReceiver<SinkEvent>,
        errors: mpsc::Receiver<BroadcastError>,
        stats: Arc<Mutex<SessionStats>>,
    }

    fn harness(config: &BroadcastConfig) -> Harness {
        let (sink, events) = ChannelSink::new();
        let (error_tx, errors) = mpsc::channel(ERROR_CHANNEL_CAPACITY);
        let stats = Arc::new(Mutex::new(SessionStats::default()));
        let pipeline = FramePipeline::new(
            config,
            Arc::new(sink),
            Arc::clone(&stats),
            error_tx,
            Arc::new(AtomicBool::new(false)),
        );
        Harness {
            pipeline,
            events,
            errors,
            stats,
        }
    }

    fn video(width: u32, height: u32, ticks: i64) -> PipelineItem {
        let stride = width as usize * 4;
        let data = vec![0x40u8; stride * height as usize];
        let frame = Frame::new(
            data,
            width,
            height,
            stride,
            PixelFormat::Bgra,
            MediaTime::new(ticks, 600),
        )
        .unwrap();
        PipelineItem::Video(frame)
    }

    #[test]
    fn test_first_frame_configures_landscape_encoder() {
        let mut h = harness(&BroadcastConfig::default());

        h.pipeline.handle(video(8, 16, 0));

        match h.events.try_recv().unwrap() {
            SinkEvent::EncoderConfigured(settings) => {
                assert_eq!(settings.canvas, Size::new(16, 8));
                assert_eq!(settings.bitrate_bps, 10_000_000);
                assert_eq!(settings.fps, 30);
            }
            other => panic!("expected encoder configuration, got {other:?}"),
        }
        match h.events.try_recv().unwrap() {
            SinkEvent::Video(frame) => {
                assert_eq!(frame.size(), Size::new(16, 8));
                assert_eq!(frame.pts(), MediaTime::new(0, 600));
            }
            other => panic!("expected video, got {other:?}"),
        }
        assert_eq!(h.stats.lock().normalized, 1);
    }

    #[test]
    fn test_encoder_configured_once_across_size_changes() {
        let mut h = harness(&BroadcastConfig::default());

        h.pipeline.handle(video(16, 8, 0));
        h.pipeline.handle(video(8, 16, 20));
        h.pipeline.handle(video(12, 4, 40));

        let mut configured = 0;
        let mut sizes = Vec::new();
        while let Ok(event) = h.events.try_recv() {
            match event {
                SinkEvent::EncoderConfigured(_) => configured += 1,
                SinkEvent::Video(frame) => sizes.push(frame.size()),
                _ => {}
            }
        }

        assert_eq!(configured, 1);
        // Every frame lands on the canvas fixed by the first one
        assert_eq!(sizes, vec![Size::new(16, 8); 3]);

        let stats = h.stats.lock();
        assert_eq!(stats.passthrough, 1);
        assert_eq!(stats.normalized, 2);
        assert_eq!(stats.video_forwarded, 3);
    }

    #[test]
    fn test_fallback_frames_are_still_forwarded() {
        let config = BroadcastConfig {
            pool_buffer_count: 1,
            ..BroadcastConfig::default()
        };
        let mut h = harness(&config);

        // Frames stay in the event queue, so the single buffer is never returned
        h.pipeline.handle(video(8, 16, 0));
        h.pipeline.handle(video(8, 16, 20));

        let sizes: Vec<_> = std::iter::from_fn(|| h.events.try_recv().ok())
            .filter_map(|event| match event {
                SinkEvent::Video(frame) => Some(frame.size()),
                _ => None,
            })
            .collect();
        assert_eq!(sizes, vec![Size::new(16, 8), Size::new(8, 16)]);

        let stats = h.stats.lock();
        assert_eq!(stats.normalized, 1);
        assert_eq!(stats.fallback, 1);
        assert_eq!(stats.video_forwarded, 2);
    }

    #[test]
    fn test_audio_forwarded_to_track() {
        let mut h = harness(&BroadcastConfig::default());

        h.pipeline.handle(PipelineItem::Audio {
            frame: AudioFrame::new(vec![1u8; 8], MediaTime::new(0, 48_000)),
            track: AudioTrack::Application,
        });

        assert!(matches!(
            h.events.try_recv(),
            Ok(SinkEvent::Audio { track: AudioTrack::Application, .. })
        ));
        assert_eq!(h.stats.lock().audio_forwarded, 1);
    }

    #[test]
    fn test_sink_failure_reported() {
        let mut h = harness(&BroadcastConfig::default());
        h.events.close();

        h.pipeline.handle(video(16, 8, 0));

        // Encoder configuration and the frame itself both fail
        assert!(matches!(
            h.errors.try_recv(),
            Ok(BroadcastError::Sink(SinkError::Closed))
        ));
        assert!(matches!(
            h.errors.try_recv(),
            Ok(BroadcastError::Sink(SinkError::Closed))
        ));
        let stats = h.stats.lock();
        assert_eq!(stats.sink_errors, 2);
        assert_eq!(stats.video_forwarded, 0);
    }

    #[test]
    fn test_unread_sink_errors_stay_bounded() {
        let mut h = harness(&BroadcastConfig::default());
        h.events.close();

        // The first frame fails twice (encoder setup and the frame itself)
        for i in 0..100 {
            h.pipeline.handle(video(16, 8, i * 20));
        }

        let stats = h.stats.lock().clone();
        assert_eq!(stats.sink_errors, 101);
        assert_eq!(
            stats.errors_dropped,
            101 - u64::try_from(ERROR_CHANNEL_CAPACITY).unwrap()
        );

        let buffered = std::iter::from_fn(|| h.errors.try_recv().ok()).count();
        assert_eq!(buffered, ERROR_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_run_drains_queue_in_order() {
        let h = harness(&BroadcastConfig::default());
        let Harness {
            pipeline,
            mut events,
            stats,
            ..
        } = h;

        let (tx, rx) = mpsc::channel(8);
        for i in 0..4 {
            tx.try_send(video(16, 8, i * 20)).unwrap();
        }
        drop(tx);

        pipeline.run(rx);

        let pts: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .filter_map(|event| match event {
                SinkEvent::Video(frame) => Some(frame.pts().value()),
                _ => None,
            })
            .collect();
        assert_eq!(pts, vec![0, 20, 40, 60]);
        assert_eq!(stats.lock().video_forwarded, 4);
    }

    #[test]
    fn test_cancelled_run_abandons_queue() {
        let (sink, mut events) = ChannelSink::new();
        let (error_tx, _errors) = mpsc::channel(ERROR_CHANNEL_CAPACITY);
        let cancelled = Arc::new(AtomicBool::new(true));
        let pipeline = FramePipeline::new(
            &BroadcastConfig::default(),
            Arc::new(sink),
            Arc::new(Mutex::new(SessionStats::default())),
            error_tx,
            cancelled,
        );

        let (tx, rx) = mpsc::channel(4);
        tx.try_send(video(16, 8, 0)).unwrap();
        drop(tx);

        pipeline.run(rx);
        assert!(events.try_recv().is_err());
    }
}
