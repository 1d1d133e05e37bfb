#![allow(clippy::manual_range_contains)]

//! panel-pixels: raw pixel work for embedded LCD panels
//!
//! This crate holds the parts of the transcoding pipeline that operate
//! directly on interleaved 8-bit pixel buffers and must be bit-exact:
//!
//! - [`PixelSurface`]: an owned RGB or RGBA buffer whose length is always
//!   `width * height * channels`
//! - [`NearWhiteKey`]: clears the alpha of bright, low-saturation pixels so a
//!   white backdrop becomes transparent
//! - [`pack_rgb565_le`]: packs a surface into 16-bit RGB565, low byte first,
//!   the layout an ESP32 LCD DMA buffer expects
//!
//! Decoding, resampling and compression live elsewhere; everything here is
//! plain integer arithmetic with no dependencies.
//!
//! # Example
//!
//! ```
//! use panel_pixels::{pack_rgb565_le, Channels, NearWhiteKey, PixelSurface};
//!
//! let surface = PixelSurface::new(
//!     vec![255, 255, 255, 255, 10, 20, 30, 255],
//!     2,
//!     1,
//!     Channels::Rgba,
//! )
//! .unwrap();
//!
//! let key = NearWhiteKey::new(24);
//! let (keyed, cleared) = key.apply(surface);
//! assert_eq!(cleared, 1);
//! assert_eq!(keyed.pixel(0, 0), &[255, 255, 255, 0]);
//!
//! let packed = pack_rgb565_le(&keyed.drop_alpha());
//! assert_eq!(packed, vec![0xFF, 0xFF, 0xA3, 0x08]);
//! ```
//!
//! # RGB565 Layout
//!
//! ```text
//!  bit 15                             0
//!      R R R R R G G G G G G B B B B B
//!
//!  byte 0 = bits 7..0   (low byte, sent first)
//!  byte 1 = bits 15..8  (high byte)
//! ```
//!
//! Quantization truncates: the low 3 bits of red and blue and the low 2 bits
//! of green are masked off, never rounded.

pub mod keying;
pub mod rgb565;
pub mod surface;


pub use keying::{clamp_tolerance, NearWhiteKey, DEFAULT_TOLERANCE, MAX_TOLERANCE, MIN_TOLERANCE};
pub use rgb565::{pack_rgb565_le, rgb565, RGB565_FORMAT_TAG};
pub use surface::{Channels, PixelSurface, SurfaceError};
