use crate::codec::{ImageCodec, ImageRsCodec};
use crate::error::TranscodeError;
use crate::models::{OutputFormat, TranscodeParams};
use panel_pixels::{pack_rgb565_le, NearWhiteKey, PixelSurface};
use std::sync::Arc;
use std::time::Instant;

/// `Cache-Control` for encoded images: same input and query give the same
/// bytes, so they can be cached forever.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// `Cache-Control` for raw panel buffers.
pub const NO_STORE_CACHE_CONTROL: &str = "no-store";

/// The finished response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackedOutput {
    Png(Vec<u8>),
    Jpeg(Vec<u8>),
    /// Little-endian RGB565, row-major, no header
    Rgb565 {
        data: Vec<u8>,
        width: u32,
        height: u32,
    },
}

impl PackedOutput {
    pub fn format(&self) -> OutputFormat {
        match self {
            PackedOutput::Png(_) => OutputFormat::Png,
            PackedOutput::Jpeg(_) => OutputFormat::Jpeg,
            PackedOutput::Rgb565 { .. } => OutputFormat::Rgb565,
        }
    }

    pub fn content_type(&self) -> &'static str {
        self.format().content_type()
    }

    pub fn cache_control(&self) -> &'static str {
        match self {
            PackedOutput::Png(_) | PackedOutput::Jpeg(_) => IMMUTABLE_CACHE_CONTROL,
            PackedOutput::Rgb565 { .. } => NO_STORE_CACHE_CONTROL,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            PackedOutput::Png(data) | PackedOutput::Jpeg(data) => data,
            PackedOutput::Rgb565 { data, .. } => data,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            PackedOutput::Png(data) | PackedOutput::Jpeg(data) => data,
            PackedOutput::Rgb565 { data, .. } => data,
        }
    }
}

/// Runs one upload through decode, orient, resize, key, alpha removal and
/// packing.
///
/// Stateless between calls; clones share the codec.
#[derive(Clone)]
pub struct Transcoder {
    codec: Arc<dyn ImageCodec>,
}

impl Transcoder {
    pub fn new(codec: Arc<dyn ImageCodec>) -> Self {
        Self { codec }
    }

    /// A transcoder over [`ImageRsCodec`] at the given PNG effort.
    pub fn with_png_effort(png_effort: u8) -> Self {
        Self::new(Arc::new(ImageRsCodec::new(png_effort)))
    }

    /// Transcode an uploaded image. CPU-bound; call from a blocking context.
    pub fn transcode(
        &self,
        upload: &[u8],
        params: &TranscodeParams,
    ) -> Result<PackedOutput, TranscodeError> {
        let start = Instant::now();

        let decoded = self.codec.decode(upload)?;
        let mut surface = decoded.surface;

        if params.auto_rotate {
            surface = self.codec.orient(surface, decoded.orientation)?;
        }

        surface = self.codec.resize(
            surface,
            params.width,
            params.height,
            params.fit,
            params.padding(),
        )?;

        if params.keys_white() {
            let key = NearWhiteKey::new(params.strip_tolerance as i64);
            let (keyed, cleared) = key.apply(surface.ensure_alpha());
            tracing::debug!(
                tolerance = key.tolerance(),
                cleared,
                "Keyed near-white pixels"
            );
            surface = keyed;
        }

        if !params.keeps_alpha() {
            surface = surface.drop_alpha();
        }

        let output = self.pack(&surface, params)?;

        tracing::info!(
            format = params.format.as_str(),
            width = surface.width(),
            height = surface.height(),
            input_bytes = upload.len(),
            output_bytes = output.bytes().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Transcoded image"
        );

        Ok(output)
    }

    fn pack(
        &self,
        surface: &PixelSurface,
        params: &TranscodeParams,
    ) -> Result<PackedOutput, TranscodeError> {
        match params.format {
            OutputFormat::Png => Ok(PackedOutput::Png(self.codec.encode(
                surface,
                OutputFormat::Png,
                params.quality,
            )?)),
            OutputFormat::Jpeg => Ok(PackedOutput::Jpeg(self.codec.encode(
                surface,
                OutputFormat::Jpeg,
                params.quality,
            )?)),
            OutputFormat::Rgb565 => Ok(PackedOutput::Rgb565 {
                data: pack_rgb565_le(surface),
                width: surface.width(),
                height: surface.height(),
            }),
        }
    }
}

impl std::fmt::Debug for Transcoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcoder").finish_non_exhaustive()
    }
}
