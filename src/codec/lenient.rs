//! Best-effort decoders for the two upload formats that matter most.
//!
//! Uploads come from phones and scanners and are often slightly damaged: a
//! bad chunk CRC, a truncated tail, a JPEG with a stray marker. These paths
//! keep whatever pixels can be recovered instead of rejecting the file.

use std::io::Cursor;

use panel_pixels::PixelSurface;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

use super::{Orientation, MAX_ALLOC_BYTES};
use crate::error::TranscodeError;

/// Pixels plus the source metadata the pipeline still needs.
#[derive(Debug)]
pub struct RawDecode {
    pub surface: PixelSurface,
    pub orientation: Orientation,
    pub icc_profile: Option<Vec<u8>>,
}

fn decode_err(e: impl std::fmt::Display) -> TranscodeError {
    TranscodeError::Decode(e.to_string())
}

/// Reject geometry whose RGBA buffer would exceed [`MAX_ALLOC_BYTES`].
pub fn check_alloc(width: u32, height: u32) -> Result<(), TranscodeError> {
    let bytes = width as u64 * height as u64 * 4;
    if bytes > MAX_ALLOC_BYTES {
        return Err(TranscodeError::Decode(format!(
            "{width}x{height} image exceeds the {MAX_ALLOC_BYTES} byte pixel limit"
        )));
    }
    Ok(())
}

/// EXIF payload starting at the TIFF header.
fn orientation_from_exif(exif: Option<&[u8]>) -> Orientation {
    exif.and_then(image::metadata::Orientation::from_exif_chunk)
        .map(|o| Orientation::from_exif(o.to_exif()))
        .unwrap_or_default()
}

/// Expand 1- and 2-channel rows to RGB/RGBA and wrap them.
fn surface_from_samples(
    data: Vec<u8>,
    width: u32,
    height: u32,
    samples: usize,
) -> Result<PixelSurface, TranscodeError> {
    let (data, channels) = match samples {
        1 => (data.iter().flat_map(|&l| [l, l, l]).collect(), 3),
        2 => (
            data.chunks_exact(2)
                .flat_map(|la| [la[0], la[0], la[0], la[1]])
                .collect(),
            4,
        ),
        n => (data, n),
    };
    Ok(PixelSurface::from_raw(data, width, height, channels)?)
}

/// Decode a PNG, ignoring chunk CRCs and keeping the rows read before any
/// mid-stream failure. Missing rows stay zero.
///
/// Interlaced images cannot be recovered row by row and still fail on a
/// truncated stream.
pub fn decode_png(bytes: &[u8]) -> Result<RawDecode, TranscodeError> {
    let mut options = png::DecodeOptions::default();
    options.set_ignore_crc(true);
    let mut decoder = png::Decoder::new_with_options(Cursor::new(bytes), options);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(decode_err)?;

    let info = reader.info();
    let (width, height, interlaced) = (info.width, info.height, info.interlaced);
    check_alloc(width, height)?;
    let icc_profile = info.icc_profile.as_ref().map(|p| p.to_vec());
    let orientation = orientation_from_exif(info.exif_metadata.as_deref());

    let (color_type, _) = reader.output_color_type();
    let samples = color_type.samples();
    let row_len = width as usize * samples;
    let mut data = vec![0u8; row_len * height as usize];

    if interlaced {
        reader.next_frame(&mut data).map_err(decode_err)?;
    } else {
        let mut rows = 0usize;
        while rows < height as usize {
            match reader.next_row() {
                Ok(Some(row)) => {
                    let src = row.data();
                    let n = src.len().min(row_len);
                    let start = rows * row_len;
                    data[start..start + n].copy_from_slice(&src[..n]);
                    rows += 1;
                }
                Ok(None) => break,
                Err(e) if rows > 0 => {
                    tracing::warn!(error = %e, rows, height, "PNG stream damaged, keeping decoded rows");
                    break;
                }
                Err(e) => return Err(decode_err(e)),
            }
        }
        if rows == 0 {
            return Err(TranscodeError::Decode("PNG has no image rows".into()));
        }
    }

    Ok(RawDecode {
        surface: surface_from_samples(data, width, height, samples)?,
        orientation,
        icc_profile,
    })
}

/// Decode a baseline or progressive JPEG with zune-jpeg's non-strict mode,
/// which skips over damaged segments instead of failing.
pub fn decode_jpeg(bytes: &[u8]) -> Result<RawDecode, TranscodeError> {
    let options = DecoderOptions::default()
        .set_strict_mode(false)
        .jpeg_set_out_colorspace(ColorSpace::RGB);
    let mut decoder = JpegDecoder::new_with_options(bytes, options);
    decoder.decode_headers().map_err(decode_err)?;

    let (width, height) = decoder
        .dimensions()
        .ok_or_else(|| TranscodeError::Decode("JPEG has no frame header".into()))?;
    let (width, height) = (width as u32, height as u32);
    check_alloc(width, height)?;

    let icc_profile = decoder.icc_profile();
    let orientation = orientation_from_exif(decoder.exif().map(Vec::as_slice));

    let pixels = decoder.decode().map_err(decode_err)?;
    let pixel_count = (width as usize * height as usize).max(1);
    let samples = pixels.len() / pixel_count;

    Ok(RawDecode {
        surface: surface_from_samples(pixels, width, height, samples)?,
        orientation,
        icc_profile,
    })
}
