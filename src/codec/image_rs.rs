use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{
    DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat, ImageReader, Rgba, RgbaImage,
};
use panel_pixels::{Channels, PixelSurface};

use super::lenient::{self, RawDecode};
use super::{color, Decoded, FitPlan, ImageCodec, Orientation, MAX_ALLOC_BYTES};
use crate::error::TranscodeError;
use crate::models::{FitMode, OutputFormat};

/// [`ImageCodec`] backed by the `image` crate for decoding, orientation,
/// resampling and JPEG, and by `png` + `oxipng` for PNG output.
#[derive(Debug, Clone)]
pub struct ImageRsCodec {
    /// oxipng preset (0..=6)
    png_effort: u8,
}

impl ImageRsCodec {
    pub fn new(png_effort: u8) -> Self {
        Self {
            png_effort: png_effort.min(6),
        }
    }

    /// Normalize a decoded image into an 8-bit RGB or RGBA surface.
    ///
    /// Sources with any alpha channel become RGBA, everything else RGB.
    pub fn to_raw(image: DynamicImage) -> Result<PixelSurface, TranscodeError> {
        let (width, height) = (image.width(), image.height());
        let surface = if image.color().has_alpha() {
            PixelSurface::new(image.into_rgba8().into_raw(), width, height, Channels::Rgba)?
        } else {
            PixelSurface::new(image.into_rgb8().into_raw(), width, height, Channels::Rgb)?
        };
        Ok(surface)
    }

    /// Wrap a raw surface as an image without copying.
    pub fn from_raw(surface: PixelSurface) -> Result<DynamicImage, TranscodeError> {
        let (width, height, channels) = (surface.width(), surface.height(), surface.channels());
        let image = match channels {
            Channels::Rgb => image::RgbImage::from_raw(width, height, surface.into_bytes())
                .map(DynamicImage::ImageRgb8),
            Channels::Rgba => image::RgbaImage::from_raw(width, height, surface.into_bytes())
                .map(DynamicImage::ImageRgba8),
        };
        image.ok_or(TranscodeError::InvalidDimensions { width, height })
    }

    /// Formats without a lenient path go through the `image` decoders.
    fn decode_with_reader(bytes: &[u8], format: ImageFormat) -> Result<RawDecode, TranscodeError> {
        let mut decoder = ImageReader::with_format(Cursor::new(bytes), format)
            .into_decoder()
            .map_err(|e| TranscodeError::Decode(e.to_string()))?;

        let (width, height) = decoder.dimensions();
        lenient::check_alloc(width, height)?;

        let orientation = match decoder.orientation() {
            Ok(o) => Orientation::from_exif(o.to_exif()),
            Err(e) => {
                tracing::debug!(error = %e, "Could not read orientation, assuming none");
                Orientation::Normal
            }
        };
        let icc_profile = decoder.icc_profile().unwrap_or_default();

        // Multi-frame formats yield their first frame
        let image =
            DynamicImage::from_decoder(decoder).map_err(|e| TranscodeError::Decode(e.to_string()))?;

        Ok(RawDecode {
            surface: Self::to_raw(image)?,
            orientation,
            icc_profile,
        })
    }

    fn encode_png(&self, surface: &PixelSurface) -> Result<Vec<u8>, TranscodeError> {
        let color_type = match surface.channels() {
            Channels::Rgb => png::ColorType::Rgb,
            Channels::Rgba => png::ColorType::Rgba,
        };

        // Fast settings, oxipng re-compresses
        let mut buf = Cursor::new(Vec::new());
        {
            let mut encoder = png::Encoder::new(&mut buf, surface.width(), surface.height());
            encoder.set_color(color_type);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_compression(png::Compression::Fast);
            encoder.set_filter(png::FilterType::NoFilter);
            let mut writer = encoder
                .write_header()
                .map_err(|e| TranscodeError::Encode(e.to_string()))?;
            writer
                .write_image_data(surface.as_bytes())
                .map_err(|e| TranscodeError::Encode(e.to_string()))?;
        }
        let png_bytes = buf.into_inner();

        // Lossless: reduces bit depth and switches to a palette when the
        // pixels allow it, and drops every ancillary chunk.
        let mut options = oxipng::Options::from_preset(self.png_effort);
        options.strip = oxipng::StripChunks::All;
        options.optimize_alpha = false;

        match oxipng::optimize_from_memory(&png_bytes, &options) {
            Ok(optimized) => Ok(optimized),
            Err(e) => {
                tracing::warn!(error = %e, "oxipng failed, sending unoptimized PNG");
                Ok(png_bytes)
            }
        }
    }

    fn encode_jpeg(surface: &PixelSurface, quality: u8) -> Result<Vec<u8>, TranscodeError> {
        let rgb;
        let source = if surface.channels().has_alpha() {
            rgb = surface.clone().drop_alpha();
            &rgb
        } else {
            surface
        };

        let mut out = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
        encoder
            .encode(
                source.as_bytes(),
                source.width(),
                source.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| TranscodeError::Encode(e.to_string()))?;
        Ok(out)
    }
}

impl Default for ImageRsCodec {
    fn default() -> Self {
        Self::new(6)
    }
}

impl ImageCodec for ImageRsCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Decoded, TranscodeError> {
        let format =
            image::guess_format(bytes).map_err(|e| TranscodeError::Decode(e.to_string()))?;
        let raw = match format {
            ImageFormat::Png => lenient::decode_png(bytes)?,
            ImageFormat::Jpeg => lenient::decode_jpeg(bytes)?,
            other => Self::decode_with_reader(bytes, other)?,
        };

        let surface = match raw.icc_profile.as_deref() {
            Some(icc) => color::apply_icc_profile(raw.surface, icc),
            None => raw.surface,
        };

        tracing::debug!(
            ?format,
            width = surface.width(),
            height = surface.height(),
            channels = surface.channels().count(),
            orientation = raw.orientation.to_exif(),
            icc = raw.icc_profile.is_some(),
            "Decoded upload"
        );

        Ok(Decoded {
            surface,
            orientation: raw.orientation,
        })
    }

    fn orient(
        &self,
        surface: PixelSurface,
        orientation: Orientation,
    ) -> Result<PixelSurface, TranscodeError> {
        if orientation == Orientation::Normal {
            return Ok(surface);
        }
        let Some(transform) = image::metadata::Orientation::from_exif(orientation.to_exif()) else {
            return Ok(surface);
        };
        let mut image = Self::from_raw(surface)?;
        image.apply_orientation(transform);
        Self::to_raw(image)
    }

    fn resize(
        &self,
        surface: PixelSurface,
        width: u32,
        height: u32,
        fit: FitMode,
        background: [u8; 4],
    ) -> Result<PixelSurface, TranscodeError> {
        if width == 0 || height == 0 {
            return Err(TranscodeError::InvalidDimensions { width, height });
        }
        if surface.is_empty() {
            return Err(TranscodeError::Resize(format!(
                "source image is {}x{}",
                surface.width(),
                surface.height()
            )));
        }

        let plan = FitPlan::compute(surface.width(), surface.height(), width, height, fit);
        if plan.peak_rgba_bytes() > MAX_ALLOC_BYTES {
            return Err(TranscodeError::Resize(format!(
                "{fit:?} fit of {}x{} into {width}x{height} needs a {}x{} buffer",
                surface.width(),
                surface.height(),
                plan.scaled_width,
                plan.scaled_height
            )));
        }

        let rgba = Self::from_raw(surface)?.into_rgba8();
        let rgba = match plan.crop {
            Some(rect) => {
                imageops::crop_imm(&rgba, rect.x, rect.y, rect.width, rect.height).to_image()
            }
            None => rgba,
        };

        let scaled = if (rgba.width(), rgba.height()) == (plan.scaled_width, plan.scaled_height) {
            rgba
        } else {
            imageops::resize(
                &rgba,
                plan.scaled_width,
                plan.scaled_height,
                FilterType::Lanczos3,
            )
        };

        let output = if plan.needs_canvas() {
            let mut canvas =
                RgbaImage::from_pixel(plan.canvas_width, plan.canvas_height, Rgba(background));
            imageops::replace(&mut canvas, &scaled, plan.offset_x, plan.offset_y);
            canvas
        } else {
            scaled
        };

        Self::to_raw(DynamicImage::ImageRgba8(output))
    }

    fn encode(
        &self,
        surface: &PixelSurface,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>, TranscodeError> {
        if surface.is_empty() {
            return Err(TranscodeError::InvalidDimensions {
                width: surface.width(),
                height: surface.height(),
            });
        }

        match format {
            OutputFormat::Png => self.encode_png(surface),
            OutputFormat::Jpeg => Self::encode_jpeg(surface, quality),
            OutputFormat::Rgb565 => Err(TranscodeError::UnsupportedFormat(format.as_str())),
        }
    }
}
