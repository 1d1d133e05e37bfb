//! Owned raw pixel buffers.
//!
//! A [`PixelSurface`] is the hand-off format between pipeline stages: the
//! codec produces one, each stage consumes it by value and returns a new one.
//! The constructor is the only way in, and it enforces the length invariant.

use std::fmt;

/// Number of interleaved 8-bit channels per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    /// R, G, B
    Rgb,
    /// R, G, B, A
    Rgba,
}

impl Channels {
    /// Bytes per pixel.
    #[inline]
    pub fn count(self) -> usize {
        match self {
            Channels::Rgb => 3,
            Channels::Rgba => 4,
        }
    }

    /// Map a raw channel count back to a layout.
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            3 => Some(Channels::Rgb),
            4 => Some(Channels::Rgba),
            _ => None,
        }
    }

    #[inline]
    pub fn has_alpha(self) -> bool {
        matches!(self, Channels::Rgba)
    }
}

/// Error returned when raw bytes do not describe a valid surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// Buffer length does not equal `width * height * channels`
    LengthMismatch {
        /// Length implied by the dimensions
        expected: usize,
        /// Length of the buffer that was supplied
        actual: usize,
    },
    /// `width * height * channels` does not fit in `usize`
    DimensionOverflow {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
    /// Channel count other than 3 or 4
    UnsupportedChannels(usize),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::LengthMismatch { expected, actual } => write!(
                f,
                "pixel buffer length mismatch: expected {} bytes, got {}",
                expected, actual
            ),
            SurfaceError::DimensionOverflow { width, height } => {
                write!(f, "surface dimensions overflow: {}x{}", width, height)
            }
            SurfaceError::UnsupportedChannels(n) => {
                write!(f, "unsupported channel count {} (expected 3 or 4)", n)
            }
        }
    }
}

impl std::error::Error for SurfaceError {}

/// Interleaved 8-bit pixel data with explicit geometry.
///
/// Pixels are stored row-major, channels innermost:
/// `[R, G, B, (A), R, G, B, (A), ...]`.
///
/// The buffer length always equals `width * height * channels.count()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSurface {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: Channels,
}

impl PixelSurface {
    /// Wrap a raw buffer, validating its length against the geometry.
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: Channels,
    ) -> Result<Self, SurfaceError> {
        let expected = Self::byte_len(width, height, channels)?;
        if data.len() != expected {
            return Err(SurfaceError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Wrap a raw buffer described by a numeric channel count.
    pub fn from_raw(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channel_count: usize,
    ) -> Result<Self, SurfaceError> {
        let channels = Channels::from_count(channel_count)
            .ok_or(SurfaceError::UnsupportedChannels(channel_count))?;
        Self::new(data, width, height, channels)
    }

    /// A surface where every pixel is `pixel`.
    ///
    /// `pixel` must hold exactly `channels.count()` bytes.
    pub fn filled(
        width: u32,
        height: u32,
        channels: Channels,
        pixel: &[u8],
    ) -> Result<Self, SurfaceError> {
        if pixel.len() != channels.count() {
            return Err(SurfaceError::LengthMismatch {
                expected: channels.count(),
                actual: pixel.len(),
            });
        }
        let len = Self::byte_len(width, height, channels)?;
        let data = pixel.iter().copied().cycle().take(len).collect();
        Self::new(data, width, height, channels)
    }

    fn byte_len(width: u32, height: u32, channels: Channels) -> Result<usize, SurfaceError> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(channels.count()))
            .ok_or(SurfaceError::DimensionOverflow { width, height })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Number of pixels (`width * height`).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the raw bytes. The length cannot change through a
    /// slice, so the surface invariant holds.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Give up the buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Bytes of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        assert!(
            x < self.width && y < self.height,
            "pixel ({}, {}) out of bounds for {}x{} surface",
            x,
            y,
            self.width,
            self.height
        );
        let stride = self.channels.count();
        let start = (y as usize * self.width as usize + x as usize) * stride;
        &self.data[start..start + stride]
    }

    /// Iterate over pixels in row-major order.
    pub fn pixels(&self) -> std::slice::ChunksExact<'_, u8> {
        self.data.chunks_exact(self.channels.count())
    }

    /// Discard the alpha channel. Color values are kept as stored; nothing is
    /// composited. RGB surfaces are returned unchanged.
    pub fn drop_alpha(self) -> Self {
        match self.channels {
            Channels::Rgb => self,
            Channels::Rgba => {
                let mut rgb = Vec::with_capacity(self.pixel_count() * 3);
                for px in self.data.chunks_exact(4) {
                    rgb.extend_from_slice(&px[..3]);
                }
                Self {
                    data: rgb,
                    width: self.width,
                    height: self.height,
                    channels: Channels::Rgb,
                }
            }
        }
    }

    /// Add a fully opaque alpha channel. RGBA surfaces are returned unchanged.
    pub fn ensure_alpha(self) -> Self {
        match self.channels {
            Channels::Rgba => self,
            Channels::Rgb => {
                let mut rgba = Vec::with_capacity(self.pixel_count() * 4);
                for px in self.data.chunks_exact(3) {
                    rgba.extend_from_slice(px);
                    rgba.push(255);
                }
                Self {
                    data: rgba,
                    width: self.width,
                    height: self.height,
                    channels: Channels::Rgba,
                }
            }
        }
    }
}
