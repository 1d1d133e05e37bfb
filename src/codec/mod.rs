//! Codec adapter: encoded bytes in, raw [`PixelSurface`]s through, encoded
//! bytes out.
//!
//! The pipeline only talks to [`ImageCodec`], so the decoder/resampler/encoder
//! backing it can be swapped without touching the orchestration.

pub mod color;
pub mod fit;
pub mod image_rs;
pub mod lenient;

pub use fit::{FitPlan, SourceRect};
pub use image_rs::ImageRsCodec;

use panel_pixels::PixelSurface;

use crate::error::TranscodeError;
use crate::models::{FitMode, OutputFormat};

/// Ceiling for any single pixel buffer the codec allocates (512 MiB, the
/// same as `image::Limits::default().max_alloc`).
pub const MAX_ALLOC_BYTES: u64 = 512 * 1024 * 1024;

/// EXIF orientation (tag 0x0112), values 1 through 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// 1: no transform
    #[default]
    Normal,
    /// 2
    FlipHorizontal,
    /// 3
    Rotate180,
    /// 4
    FlipVertical,
    /// 5: transpose
    Rotate90FlipHorizontal,
    /// 6
    Rotate90,
    /// 7: transverse
    Rotate270FlipHorizontal,
    /// 8
    Rotate270,
}

impl Orientation {
    /// Map an EXIF orientation value. Unknown values mean no transform.
    pub fn from_exif(value: u8) -> Self {
        match value {
            2 => Self::FlipHorizontal,
            3 => Self::Rotate180,
            4 => Self::FlipVertical,
            5 => Self::Rotate90FlipHorizontal,
            6 => Self::Rotate90,
            7 => Self::Rotate270FlipHorizontal,
            8 => Self::Rotate270,
            _ => Self::Normal,
        }
    }

    pub fn to_exif(self) -> u8 {
        match self {
            Self::Normal => 1,
            Self::FlipHorizontal => 2,
            Self::Rotate180 => 3,
            Self::FlipVertical => 4,
            Self::Rotate90FlipHorizontal => 5,
            Self::Rotate90 => 6,
            Self::Rotate270FlipHorizontal => 7,
            Self::Rotate270 => 8,
        }
    }
}

/// Result of decoding: pixels plus the orientation read from the source
/// metadata before it was discarded.
#[derive(Debug)]
pub struct Decoded {
    pub surface: PixelSurface,
    pub orientation: Orientation,
}

/// The image codec collaborator.
///
/// All surfaces returned are 8-bit sRGB, 3 or 4 channels, with no metadata.
pub trait ImageCodec: Send + Sync {
    /// Decode an encoded image. Format is sniffed from the content.
    fn decode(&self, bytes: &[u8]) -> Result<Decoded, TranscodeError>;

    /// Apply an EXIF orientation to decoded pixels.
    fn orient(
        &self,
        surface: PixelSurface,
        orientation: Orientation,
    ) -> Result<PixelSurface, TranscodeError>;

    /// Scale into a `width` x `height` box according to `fit`, padding with
    /// `background` (RGBA) where the fit leaves uncovered area.
    fn resize(
        &self,
        surface: PixelSurface,
        width: u32,
        height: u32,
        fit: FitMode,
        background: [u8; 4],
    ) -> Result<PixelSurface, TranscodeError>;

    /// Encode to a container format. Raw formats are not a codec concern and
    /// return [`TranscodeError::UnsupportedFormat`].
    fn encode(
        &self,
        surface: &PixelSurface,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>, TranscodeError>;
}
