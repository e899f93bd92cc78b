//! Broadcast session example
//!
//! Simulates a capture source delivering 60 Hz portrait video with
//! interleaved microphone audio, broadcasting at 30 fps. A transport task
//! consumes the normalized stream from a [`ChannelSink`] and prints what it
//! receives.
//!
//! Usage:
//!   cargo run --example session -- [stream-url]

use std::sync::Arc;
use std::time::Duration;

use screencaster_broadcast::{
    AudioFrame, BroadcastConfig, BroadcastSession, ChannelSink, SampleBuffer, SinkEvent,
};
use screencaster_video::{Frame, MediaTime, PixelFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("screencaster-broadcast Session Example");
    println!("======================================");

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "rtmp://127.0.0.1:1935/live/screen".to_string());

    let config = BroadcastConfig::builder()
        .stream_url(url)
        .video_bitrate_mbps(6)
        .fps(30)
        .build();

    let (sink, mut events) = ChannelSink::new();
    let session = Arc::new(BroadcastSession::start(config, Arc::new(sink))?);
    println!("Protocol: {}", session.protocol());

    let transport = tokio::spawn(async move {
        let mut frames = 0u32;
        while let Some(event) = events.recv().await {
            match event {
                SinkEvent::AudioConfigured(audio) => {
                    println!("  audio: {:?} at {} bps", audio.codec, audio.bitrate_bps);
                }
                SinkEvent::EncoderConfigured(settings) => {
                    println!(
                        "  encoder: {} at {} bps, {} fps, {:?}",
                        settings.canvas, settings.bitrate_bps, settings.fps, settings.policy
                    );
                }
                SinkEvent::Video(frame) => {
                    frames += 1;
                    println!("  video: {} at {}", frame.size(), frame.pts());
                }
                SinkEvent::Audio { frame, track } => {
                    println!("  audio track {}: {} bytes", track.index(), frame.data.len());
                }
            }
        }
        frames
    });

    let mut errors = session
        .take_error_receiver()
        .ok_or("error receiver already taken")?;
    tokio::spawn(async move {
        while let Some(e) = errors.recv().await {
            eprintln!("  sink error: {e}");
        }
    });

    // Half a second of capture: portrait phone screen, turned sideways halfway
    let (width, height) = (360u32, 640u32);
    let stride = width as usize * 4;
    for i in 0..30i64 {
        let tag = if i < 15 { 1 } else { 8 };
        let frame = Frame::new(
            vec![0x80u8; stride * height as usize],
            width,
            height,
            stride,
            PixelFormat::Bgra,
            MediaTime::new(i * 10, 600),
        )?
        .with_orientation_tag(tag);
        session.process_sample(SampleBuffer::Video(frame))?;

        let mic = AudioFrame::new(vec![0u8; 1024], MediaTime::new(i * 10 + 5, 600));
        session.process_sample(SampleBuffer::AudioMic(mic))?;

        tokio::time::sleep(Duration::from_millis(16)).await;
    }

    let stats = session.finish().await?;
    let frames = transport.await?;

    println!();
    println!("Transport received {frames} video frames");
    println!("Session stats: {stats:#?}");
    Ok(())
}
