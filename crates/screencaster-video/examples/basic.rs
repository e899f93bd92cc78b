//! Basic screencaster-video usage example
//!
//! Feeds a synthetic 60 Hz portrait capture through the throttle and the
//! compositor and prints what happens to each frame:
//! - FrameThrottle halving the rate to 30 fps
//! - Orientation tags turning content upright
//! - Pillarboxing onto the landscape canvas

use screencaster_video::{
    canonical_landscape, CompositeOutcome, CompositorConfig, Frame, FrameCompositor,
    FrameThrottle, MediaTime, PixelFormat, Size,
};

const TARGET_FPS: u32 = 30;

fn synthetic_frame(size: Size, index: i64, tag: u32) -> Result<Frame, Box<dyn std::error::Error>> {
    let stride = size.width as usize * 4;
    let shade = (index * 8 % 256) as u8;
    let data = vec![shade; stride * size.height as usize];
    // 60 Hz capture clock, 600 ticks per second
    let pts = MediaTime::new(index * 10, MediaTime::DEFAULT_TIMESCALE);

    Ok(Frame::new(data, size.width, size.height, stride, PixelFormat::Bgra, pts)?
        .with_orientation_tag(tag))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("screencaster-video v{}", screencaster_video::VERSION);
    println!();

    let config = CompositorConfig::builder().max_buffers(4).build();
    if let Err(issues) = config.validate() {
        for issue in issues {
            eprintln!("config: {issue}");
        }
        return Ok(());
    }

    let mut throttle = FrameThrottle::new();
    let mut compositor = FrameCompositor::new(config);

    // Phone-style capture: 720x1280 portrait, later rotated to landscape
    let portrait = Size::new(720, 1280);
    let canvas = compositor.canvas_for(canonical_landscape(portrait));
    println!("Canvas: {} {:?}", canvas.size(), canvas.format());
    println!();

    for index in 0..12 {
        // Device turned on its side halfway through
        let tag = if index < 6 { 1 } else { 6 };
        let frame = synthetic_frame(portrait, index, tag)?;
        let pts = frame.pts();

        if !throttle.accept(pts, TARGET_FPS) {
            println!("  {pts:>10}  throttled");
            continue;
        }

        let composed = compositor.compose(frame, &canvas);
        let label = match &composed.outcome {
            CompositeOutcome::Normalized => "normalized".to_string(),
            CompositeOutcome::Passthrough => "passthrough".to_string(),
            CompositeOutcome::Fallback(e) => format!("fallback ({e})"),
        };
        println!(
            "  {:>10}  tag {}  -> {} {}",
            pts,
            tag,
            composed.frame.size(),
            label
        );
    }

    println!();
    let stats = compositor.stats();
    println!(
        "Throttle: {} accepted, {} rejected",
        throttle.accepted_count(),
        throttle.rejected_count()
    );
    println!(
        "Compositor: {} normalized, {} passthrough, {} fallback",
        stats.normalized, stats.passthrough, stats.fallback
    );
    let pool = compositor.pool_stats();
    println!(
        "Pool: {} allocated, {} reused",
        pool.buffers_allocated, pool.buffers_reused
    );

    Ok(())
}
