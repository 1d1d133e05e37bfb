//! Embedded ICC profile to sRGB conversion.

use moxcms::{ColorProfile, Layout, TransformOptions};
use panel_pixels::{Channels, PixelSurface};

use crate::error::TranscodeError;

/// Convert `surface` from the color space described by `profile` to sRGB.
pub fn convert_to_srgb(
    surface: PixelSurface,
    profile: &ColorProfile,
) -> Result<PixelSurface, TranscodeError> {
    let layout = match surface.channels() {
        Channels::Rgb => Layout::Rgb,
        Channels::Rgba => Layout::Rgba,
    };
    let transform = profile
        .create_transform_8bit(
            layout,
            &ColorProfile::new_srgb(),
            layout,
            TransformOptions::default(),
        )
        .map_err(|e| TranscodeError::Decode(e.to_string()))?;

    let mut output = vec![0u8; surface.as_bytes().len()];
    transform
        .transform(surface.as_bytes(), &mut output)
        .map_err(|e| TranscodeError::Decode(e.to_string()))?;

    Ok(PixelSurface::new(
        output,
        surface.width(),
        surface.height(),
        surface.channels(),
    )?)
}

/// Apply an embedded ICC profile, keeping the pixels as they are when the
/// profile cannot be parsed or does not fit the pixel layout.
pub fn apply_icc_profile(surface: PixelSurface, icc: &[u8]) -> PixelSurface {
    let profile = match ColorProfile::new_from_slice(icc) {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(error = %e, bytes = icc.len(), "Ignoring unreadable ICC profile");
            return surface;
        }
    };

    // Keep a copy only for the failure path
    let fallback = surface.clone();
    match convert_to_srgb(surface, &profile) {
        Ok(converted) => {
            tracing::debug!("Converted embedded ICC profile to sRGB");
            converted
        }
        Err(e) => {
            tracing::warn!(error = %e, "ICC transform failed, keeping source pixels");
            fallback
        }
    }
}
