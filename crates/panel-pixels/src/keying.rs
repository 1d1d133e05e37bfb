//! Near-white alpha keying.
//!
//! Product shots and logos are usually delivered on a white backdrop. On a
//! panel that composites the image over its own UI, that backdrop should
//! vanish. [`NearWhiteKey`] clears the alpha of every pixel that is both
//! bright and close to neutral:
//!
//! ```text
//! max(R,G,B) >= 255 - tolerance   &&   max(R,G,B) - min(R,G,B) <= tolerance
//! ```
//!
//! Only alpha bytes are written. Each pixel is classified on its own, so the
//! result does not depend on traversal order.

use crate::surface::{Channels, PixelSurface};

/// Smallest accepted tolerance.
pub const MIN_TOLERANCE: u8 = 1;
/// Largest accepted tolerance.
pub const MAX_TOLERANCE: u8 = 120;
/// Tolerance used when none is given.
pub const DEFAULT_TOLERANCE: u8 = 24;

/// Clamp any integer into `[MIN_TOLERANCE, MAX_TOLERANCE]`.
///
/// Applying it to an already clamped value returns the value unchanged.
#[inline]
pub fn clamp_tolerance(tolerance: i64) -> u8 {
    tolerance.clamp(MIN_TOLERANCE as i64, MAX_TOLERANCE as i64) as u8
}

/// Alpha key for near-white, low-saturation pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearWhiteKey {
    tolerance: u8,
}

impl NearWhiteKey {
    /// Create a key. The tolerance is clamped into `[1, 120]`.
    pub fn new(tolerance: i64) -> Self {
        Self {
            tolerance: clamp_tolerance(tolerance),
        }
    }

    #[inline]
    pub fn tolerance(&self) -> u8 {
        self.tolerance
    }

    /// Minimum brightest-channel value a pixel needs to be keyed.
    #[inline]
    pub fn threshold(&self) -> u8 {
        255 - self.tolerance
    }

    /// Whether an (opaque or partially opaque) pixel with this color is keyed.
    #[inline]
    pub fn matches(&self, r: u8, g: u8, b: u8) -> bool {
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        max >= self.threshold() && max - min <= self.tolerance
    }

    /// Clear alpha on matching pixels in place. Returns how many were cleared.
    ///
    /// Pixels whose alpha is already 0 are skipped and not counted. RGB
    /// surfaces have no alpha to clear and are left untouched.
    pub fn apply_in_place(&self, surface: &mut PixelSurface) -> usize {
        if surface.channels() != Channels::Rgba {
            return 0;
        }
        let mut cleared = 0;
        for px in surface.as_bytes_mut().chunks_exact_mut(4) {
            if px[3] == 0 {
                continue;
            }
            if self.matches(px[0], px[1], px[2]) {
                px[3] = 0;
                cleared += 1;
            }
        }
        cleared
    }

    /// Consume a surface and return the keyed surface with the cleared count.
    pub fn apply(&self, mut surface: PixelSurface) -> (PixelSurface, usize) {
        let cleared = self.apply_in_place(&mut surface);
        (surface, cleared)
    }
}

impl Default for NearWhiteKey {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}
