//! RGB565 little-endian packing.

use crate::surface::PixelSurface;

/// Format tag advertised alongside packed buffers.
pub const RGB565_FORMAT_TAG: &str = "RGB565LE";

/// Quantize one color to RGB565 by truncation.
#[inline]
pub fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    (((r & 0xF8) as u16) << 8) | (((g & 0xFC) as u16) << 3) | ((b >> 3) as u16)
}

/// Pack a surface into RGB565, two bytes per pixel, low byte first.
///
/// The output length is always `width * height * 2`. Pixels are read with
/// the surface's own stride, so an RGBA surface packs the same as its RGB
/// counterpart; alpha never participates.
pub fn pack_rgb565_le(surface: &PixelSurface) -> Vec<u8> {
    let mut out = Vec::with_capacity(surface.pixel_count() * 2);
    for px in surface.pixels() {
        out.extend_from_slice(&rgb565(px[0], px[1], px[2]).to_le_bytes());
    }
    out
}
