//! Canvas Buffer Pool
//!
//! Reusable canvas-sized pixel buffers for the compositor.
//!
//! The pool keeps a single active entry keyed by the most recently requested
//! size. The canvas is fixed for a broadcast session, so in practice one
//! entry is created on the first frame and reused for the whole session.
//! Requesting a different size discards the old entry; buffers still in
//! flight from it are freed instead of recycled when they are dropped.
//!
//! Every buffer handed out is cleared to opaque black first. The compositor
//! only overwrites the region covered by the (possibly pillarboxed) content,
//! so stale pixels from a previous frame must never survive in the bars.
//!
//! ```rust
//! use screencaster_video::{CanvasBufferPool, PixelFormat, Size};
//!
//! let mut pool = CanvasBufferPool::new(PixelFormat::Bgra, 4);
//! let buffer = pool.acquire(Size::new(1280, 720)).unwrap();
//! assert_eq!(buffer.stride() % 64, 0);
//! drop(buffer); // back to the pool
//! assert_eq!(pool.outstanding(), 0);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::{Result, VideoError};
use crate::frame::{PixelFormat, Size};

/// Row alignment of canvas buffers in bytes
pub const STRIDE_ALIGNMENT: usize = 64;

/// Default number of canvas buffers that may be in flight at once
pub const DEFAULT_MAX_BUFFERS: usize = 6;

/// Row stride for `width` pixels of `format`, aligned to [`STRIDE_ALIGNMENT`]
#[must_use]
pub fn aligned_stride(width: u32, format: PixelFormat) -> usize {
    let row_bytes = width as usize * format.bytes_per_pixel();
    (row_bytes + STRIDE_ALIGNMENT - 1) & !(STRIDE_ALIGNMENT - 1)
}

/// State shared between the pool and the buffers it handed out
struct PoolEntry {
    size: Size,
    stride: usize,
    format: PixelFormat,
    free: Mutex<Vec<Vec<u8>>>,
    outstanding: AtomicUsize,
}

impl PoolEntry {
    fn buffer_len(&self) -> usize {
        self.stride * self.size.height as usize
    }
}

/// Pool statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Pool entries created (first use plus every size change)
    pub pools_created: u64,

    /// Fresh buffers allocated
    pub buffers_allocated: u64,

    /// Buffers served from the free list
    pub buffers_reused: u64,

    /// Requests refused because every buffer was in flight
    pub exhausted: u64,

    /// Requests refused because memory could not be reserved
    pub allocation_failures: u64,
}

/// Single-entry pool of canvas buffers
///
/// `acquire` takes `&mut self`: the pool has exactly one owner (the pipeline
/// worker), while buffers may be dropped from any thread.
pub struct CanvasBufferPool {
    format: PixelFormat,
    max_buffers: usize,
    active: Option<Arc<PoolEntry>>,
    stats: PoolStats,
}

impl CanvasBufferPool {
    /// Create an empty pool producing `format` buffers, at most `max_buffers` in flight
    ///
    /// A `max_buffers` of zero yields a pool that refuses every request.
    #[must_use]
    pub fn new(format: PixelFormat, max_buffers: usize) -> Self {
        Self {
            format,
            max_buffers,
            active: None,
            stats: PoolStats::default(),
        }
    }

    /// Get a black buffer of `size`
    ///
    /// # Errors
    ///
    /// - [`VideoError::InvalidSize`] for a zero dimension
    /// - [`VideoError::PoolExhausted`] when `max_buffers` are in flight
    /// - [`VideoError::AllocationFailed`] when memory cannot be reserved
    pub fn acquire(&mut self, size: Size) -> Result<PooledBuffer> {
        if size.is_empty() {
            return Err(VideoError::InvalidSize(size));
        }

        let entry = self.entry_for(size);

        let outstanding = entry.outstanding.load(Ordering::Acquire);
        if outstanding >= self.max_buffers {
            self.stats.exhausted += 1;
            return Err(VideoError::PoolExhausted {
                outstanding,
                max: self.max_buffers,
            });
        }

        let recycled = entry.free.lock().pop();
        let mut data = match recycled {
            Some(data) => {
                self.stats.buffers_reused += 1;
                data
            }
            None => {
                let len = entry.buffer_len();
                let mut data = Vec::new();
                if data.try_reserve_exact(len).is_err() {
                    self.stats.allocation_failures += 1;
                    return Err(VideoError::AllocationFailed { bytes: len });
                }
                data.resize(len, 0);
                self.stats.buffers_allocated += 1;
                debug!("Allocated canvas buffer {} ({} bytes)", size, len);
                data
            }
        };

        fill_pixels(&mut data, entry.format.black());
        entry.outstanding.fetch_add(1, Ordering::AcqRel);

        Ok(PooledBuffer {
            data,
            size: entry.size,
            stride: entry.stride,
            format: entry.format,
            home: Arc::downgrade(&entry),
        })
    }

    fn entry_for(&mut self, size: Size) -> Arc<PoolEntry> {
        if let Some(entry) = &self.active {
            if entry.size == size {
                return Arc::clone(entry);
            }
            info!("Canvas size changed {} -> {}, recreating buffer pool", entry.size, size);
        } else {
            info!("Creating canvas buffer pool for {}", size);
        }

        let entry = Arc::new(PoolEntry {
            size,
            stride: aligned_stride(size.width, self.format),
            format: self.format,
            free: Mutex::new(Vec::with_capacity(self.max_buffers)),
            outstanding: AtomicUsize::new(0),
        });
        self.active = Some(Arc::clone(&entry));
        self.stats.pools_created += 1;
        entry
    }

    /// Drop the active entry; buffers still in flight are freed when dropped
    pub fn release(&mut self) {
        if let Some(entry) = self.active.take() {
            debug!("Releasing canvas buffer pool {}", entry.size);
        }
    }

    /// Size of the active entry, if any
    #[must_use]
    pub fn active_size(&self) -> Option<Size> {
        self.active.as_ref().map(|entry| entry.size)
    }

    /// Buffers of the active entry currently in flight
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.active
            .as_ref()
            .map_or(0, |entry| entry.outstanding.load(Ordering::Acquire))
    }

    /// Buffers of the active entry waiting for reuse
    #[must_use]
    pub fn idle(&self) -> usize {
        self.active.as_ref().map_or(0, |entry| entry.free.lock().len())
    }

    /// Pixel format of produced buffers
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Maximum buffers in flight
    #[must_use]
    pub fn max_buffers(&self) -> usize {
        self.max_buffers
    }

    /// Statistics
    #[must_use]
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }
}

impl fmt::Debug for CanvasBufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasBufferPool")
            .field("format", &self.format)
            .field("max_buffers", &self.max_buffers)
            .field("active_size", &self.active_size())
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

/// Canvas buffer checked out of a [`CanvasBufferPool`]
///
/// Returns to its pool entry on drop, or is freed if that entry was discarded.
pub struct PooledBuffer {
    data: Vec<u8>,
    size: Size,
    stride: usize,
    format: PixelFormat,
    home: Weak<PoolEntry>,
}

impl PooledBuffer {
    /// Buffer dimensions
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Bytes per row
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Pixel format
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Pixel bytes
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Mutable pixel bytes
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Overwrite every pixel with `pixel`
    pub fn fill(&mut self, pixel: [u8; 4]) {
        fill_pixels(&mut self.data, pixel);
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("size", &self.size)
            .field("stride", &self.stride)
            .field("format", &self.format)
            .field("len", &self.data.len())
            .finish()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let Some(entry) = self.home.upgrade() else {
            return;
        };
        entry.outstanding.fetch_sub(1, Ordering::AcqRel);
        if self.data.len() == entry.buffer_len() {
            entry.free.lock().push(std::mem::take(&mut self.data));
        }
    }
}

fn fill_pixels(data: &mut [u8], pixel: [u8; 4]) {
    for chunk in data.chunks_exact_mut(4) {
        chunk.copy_from_slice(&pixel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_stride() {
        assert_eq!(aligned_stride(1920, PixelFormat::Bgra), 7680);
        assert_eq!(aligned_stride(1921, PixelFormat::Bgra), 7744);
        assert_eq!(aligned_stride(1, PixelFormat::Bgra), 64);
    }

    #[test]
    fn test_acquire_returns_black_buffer() {
        let mut pool = CanvasBufferPool::new(PixelFormat::Bgra, 2);
        let buffer = pool.acquire(Size::new(8, 4)).expect("buffer");

        assert_eq!(buffer.size(), Size::new(8, 4));
        assert_eq!(buffer.as_slice().len(), buffer.stride() * 4);
        assert!(buffer.as_slice().chunks_exact(4).all(|px| px == [0, 0, 0, 0xFF]));
    }

    #[test]
    fn test_buffers_are_recycled_and_cleared() {
        let mut pool = CanvasBufferPool::new(PixelFormat::Bgra, 1);
        let mut buffer = pool.acquire(Size::new(8, 4)).expect("buffer");
        buffer.fill([9, 9, 9, 9]);
        drop(buffer);
        assert_eq!(pool.idle(), 1);

        let buffer = pool.acquire(Size::new(8, 4)).expect("recycled buffer");
        assert!(buffer.as_slice().chunks_exact(4).all(|px| px == [0, 0, 0, 0xFF]));
        assert_eq!(pool.stats().buffers_allocated, 1);
        assert_eq!(pool.stats().buffers_reused, 1);
    }

    #[test]
    fn test_exhaustion_is_recoverable() {
        let mut pool = CanvasBufferPool::new(PixelFormat::Bgra, 1);
        let held = pool.acquire(Size::new(4, 4)).expect("first buffer");

        let err = pool.acquire(Size::new(4, 4)).expect_err("pool should be exhausted");
        assert_eq!(err, VideoError::PoolExhausted { outstanding: 1, max: 1 });
        assert_eq!(pool.stats().exhausted, 1);

        drop(held);
        assert!(pool.acquire(Size::new(4, 4)).is_ok());
    }

    #[test]
    fn test_zero_capacity_always_fails() {
        let mut pool = CanvasBufferPool::new(PixelFormat::Bgra, 0);
        assert!(matches!(
            pool.acquire(Size::new(4, 4)),
            Err(VideoError::PoolExhausted { max: 0, .. })
        ));
    }

    #[test]
    fn test_invalid_size() {
        let mut pool = CanvasBufferPool::new(PixelFormat::Bgra, 2);
        assert!(matches!(pool.acquire(Size::new(0, 4)), Err(VideoError::InvalidSize(_))));
        assert!(pool.active_size().is_none());
    }

    #[test]
    fn test_size_change_discards_old_entry() {
        let mut pool = CanvasBufferPool::new(PixelFormat::Bgra, 2);
        let old = pool.acquire(Size::new(4, 4)).expect("old buffer");
        assert_eq!(pool.active_size(), Some(Size::new(4, 4)));

        let new = pool.acquire(Size::new(8, 2)).expect("new buffer");
        assert_eq!(pool.active_size(), Some(Size::new(8, 2)));
        assert_eq!(pool.stats().pools_created, 2);
        assert_eq!(pool.outstanding(), 1);

        // Stale buffer is freed, not recycled into the new entry
        drop(old);
        assert_eq!(pool.idle(), 0);
        drop(new);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_release_frees_in_flight_buffers() {
        let mut pool = CanvasBufferPool::new(PixelFormat::Bgra, 2);
        let buffer = pool.acquire(Size::new(4, 4)).expect("buffer");
        pool.release();
        assert!(pool.active_size().is_none());
        assert_eq!(pool.outstanding(), 0);
        drop(buffer);
    }

    #[test]
    fn test_buffer_returns_from_other_thread() {
        let mut pool = CanvasBufferPool::new(PixelFormat::Bgra, 1);
        let buffer = pool.acquire(Size::new(16, 16)).expect("buffer");
        std::thread::spawn(move || drop(buffer)).join().expect("thread");
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.idle(), 1);
    }
}
