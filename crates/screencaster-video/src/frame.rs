//! Frame model
//!
//! A [`Frame`] is one captured video picture: pixel storage, intrinsic
//! dimensions, a presentation timestamp and the raw orientation attachment
//! delivered by the capture source.
//!
//! Frames are not `Clone`. The pipeline owns a frame for exactly one
//! processing pass and then either moves it into the sink or drops it.
//! Canvas frames hold a [`PooledBuffer`](crate::pool::PooledBuffer) that goes
//! back to its pool when the frame is dropped.

use std::fmt;

use bytes::Bytes;

use crate::error::{Result, VideoError};
use crate::pool::PooledBuffer;

/// Width × height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Size {
    /// Create a new size
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` if either dimension is zero
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Same size with width and height exchanged
    #[must_use]
    pub const fn transposed(&self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// `true` if the size is wider than it is tall
    #[must_use]
    pub const fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Presentation timestamp expressed as `value / timescale` seconds
///
/// The value is carried through the pipeline untouched: a normalized frame
/// reports exactly the same `MediaTime` as the captured frame it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaTime {
    value: i64,
    timescale: u32,
}

impl MediaTime {
    /// Timescale used by [`MediaTime::from_seconds`] when none is given (600 ticks/s)
    pub const DEFAULT_TIMESCALE: u32 = 600;

    /// Create a timestamp of `value` ticks at `timescale` ticks per second
    ///
    /// A timescale of zero is treated as one.
    #[must_use]
    pub const fn new(value: i64, timescale: u32) -> Self {
        Self {
            value,
            timescale: if timescale == 0 { 1 } else { timescale },
        }
    }

    /// Create a timestamp from seconds, rounded to the default timescale
    #[must_use]
    pub fn from_seconds(seconds: f64) -> Self {
        let timescale = Self::DEFAULT_TIMESCALE;
        Self::new((seconds * f64::from(timescale)).round() as i64, timescale)
    }

    /// Raw tick count
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.value
    }

    /// Ticks per second
    #[must_use]
    pub const fn timescale(&self) -> u32 {
        self.timescale
    }

    /// Timestamp in seconds
    #[must_use]
    pub fn as_seconds(&self) -> f64 {
        self.value as f64 / f64::from(self.timescale)
    }

    /// Seconds elapsed since `earlier` (negative if `earlier` is later)
    #[must_use]
    pub fn seconds_since(&self, earlier: &Self) -> f64 {
        self.as_seconds() - earlier.as_seconds()
    }
}

impl fmt::Display for MediaTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.as_seconds())
    }
}

/// Capture orientation of a frame
///
/// `Up` needs no correction, `Left`/`Right` are the two landscape rotations
/// and `Down` is upside-down portrait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    /// Content is already upright
    #[default]
    Up,
    /// Upside-down portrait
    Down,
    /// Landscape, rotated a quarter turn one way
    Left,
    /// Landscape, rotated a quarter turn the other way
    Right,
}

impl Orientation {
    /// Parse the raw orientation attachment (EXIF numbering)
    ///
    /// Returns `None` for values that are not one of the four plain
    /// rotations, including the mirrored variants 2, 4, 5 and 7.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::Up),
            3 => Some(Self::Down),
            6 => Some(Self::Right),
            8 => Some(Self::Left),
            _ => None,
        }
    }

    /// EXIF value for this orientation
    #[must_use]
    pub const fn to_raw(self) -> u32 {
        match self {
            Self::Up => 1,
            Self::Down => 3,
            Self::Right => 6,
            Self::Left => 8,
        }
    }

    /// `true` for the quarter-turn orientations, which swap width and height
    #[must_use]
    pub const fn swaps_dimensions(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Packed 32-bit pixel layouts understood by the compositor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// 32-bit BGRA (capture default)
    #[default]
    Bgra,
    /// 32-bit RGBA
    Rgba,
    /// 32-bit BGR with an unused padding byte
    Bgrx,
}

impl PixelFormat {
    /// Bytes per pixel
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        4
    }

    /// Byte pattern of one opaque black pixel
    #[must_use]
    pub const fn black(self) -> [u8; 4] {
        [0, 0, 0, 0xFF]
    }
}

/// Pixel storage backing a [`Frame`]
#[derive(Debug)]
pub enum FrameData {
    /// Memory handed over by the capture source
    Shared(Bytes),
    /// Canvas buffer borrowed from a [`CanvasBufferPool`](crate::pool::CanvasBufferPool)
    Pooled(PooledBuffer),
}

impl FrameData {
    /// Pixel bytes
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::Shared(bytes) => bytes,
            Self::Pooled(buffer) => buffer.as_slice(),
        }
    }

    /// `true` if the storage came from a canvas pool
    #[must_use]
    pub const fn is_pooled(&self) -> bool {
        matches!(self, Self::Pooled(_))
    }
}

/// A captured or normalized video frame
pub struct Frame {
    data: FrameData,
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
    pts: MediaTime,
    orientation_tag: Option<u32>,
}

impl Frame {
    /// Wrap capture memory in a frame
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::InvalidSize`] for zero dimensions or a stride
    /// shorter than one row, and [`VideoError::BufferTooSmall`] if `data`
    /// holds fewer than `stride * height` bytes.
    pub fn new(
        data: impl Into<Bytes>,
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
        pts: MediaTime,
    ) -> Result<Self> {
        let data = data.into();
        validate_layout(data.len(), width, height, stride, format)?;

        Ok(Self {
            data: FrameData::Shared(data),
            width,
            height,
            stride,
            format,
            pts,
            orientation_tag: None,
        })
    }

    /// Wrap a rendered canvas buffer, taking its geometry from the buffer
    pub(crate) fn from_pooled(buffer: PooledBuffer, pts: MediaTime) -> Result<Self> {
        let size = buffer.size();
        let stride = buffer.stride();
        let format = buffer.format();
        validate_layout(buffer.as_slice().len(), size.width, size.height, stride, format)
            .map_err(|e| VideoError::output_frame(e.to_string()))?;

        Ok(Self {
            data: FrameData::Pooled(buffer),
            width: size.width,
            height: size.height,
            stride,
            format,
            pts,
            orientation_tag: None,
        })
    }

    /// Attach the raw orientation metadata delivered with the frame
    #[must_use]
    pub fn with_orientation_tag(mut self, tag: u32) -> Self {
        self.orientation_tag = Some(tag);
        self
    }

    /// Raw orientation attachment, if any
    #[must_use]
    pub const fn orientation_tag(&self) -> Option<u32> {
        self.orientation_tag
    }

    /// Parsed orientation; absent or unrecognised tags read as [`Orientation::Up`]
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation_tag
            .and_then(Orientation::from_raw)
            .unwrap_or_default()
    }

    /// Intrinsic width in pixels
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Intrinsic height in pixels
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Intrinsic dimensions
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Bytes per row
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Pixel layout
    #[must_use]
    pub const fn format(&self) -> PixelFormat {
        self.format
    }

    /// Presentation timestamp
    #[must_use]
    pub const fn pts(&self) -> MediaTime {
        self.pts
    }

    /// Pixel bytes (`stride * height` at least)
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// Underlying storage
    #[must_use]
    pub const fn storage(&self) -> &FrameData {
        &self.data
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("size", &self.size())
            .field("stride", &self.stride)
            .field("format", &self.format)
            .field("pts", &self.pts)
            .field("orientation_tag", &self.orientation_tag)
            .field("pooled", &self.data.is_pooled())
            .finish()
    }
}

fn validate_layout(
    len: usize,
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
) -> Result<()> {
    let size = Size::new(width, height);
    if size.is_empty() || stride < width as usize * format.bytes_per_pixel() {
        return Err(VideoError::InvalidSize(size));
    }

    let needed = stride * height as usize;
    if len < needed {
        return Err(VideoError::BufferTooSmall { needed, actual: len });
    }
    Ok(())
}

/// Fixed output geometry the encoder was configured with
///
/// Established once per broadcast session and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanvasSpec {
    size: Size,
    format: PixelFormat,
}

impl CanvasSpec {
    /// Create a canvas specification
    #[must_use]
    pub const fn new(size: Size, format: PixelFormat) -> Self {
        Self { size, format }
    }

    /// Canvas dimensions
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Canvas pixel format
    #[must_use]
    pub const fn format(&self) -> PixelFormat {
        self.format
    }
}
