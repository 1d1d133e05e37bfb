use crate::models::FitMode;

/// A rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Where a scaled image lands relative to the output canvas.
///
/// `crop` is the region of the source that gets scaled; `None` means the
/// whole source. `offset_x`/`offset_y` are the position of the scaled
/// image's top-left corner on the canvas and are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitPlan {
    pub crop: Option<SourceRect>,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub offset_x: i64,
    pub offset_y: i64,
}

impl FitPlan {
    /// Plan a `src_width` x `src_height` image into a `box_width` x
    /// `box_height` box.
    ///
    /// All inputs must be non-zero.
    pub fn compute(
        src_width: u32,
        src_height: u32,
        box_width: u32,
        box_height: u32,
        fit: FitMode,
    ) -> Self {
        let sx = box_width as f64 / src_width as f64;
        let sy = box_height as f64 / src_height as f64;

        match fit {
            FitMode::Fill => Self::exact(box_width, box_height),
            FitMode::Contain => {
                let (w, h) = scale_dims(src_width, src_height, sx.min(sy));
                let (w, h) = (w.min(box_width), h.min(box_height));
                Self::centered(w, h, box_width, box_height)
            }
            FitMode::Cover => {
                // Crop in source space first so the scaled buffer never
                // exceeds the box.
                let scale = sx.max(sy);
                let crop_w = source_span(box_width, scale, src_width);
                let crop_h = source_span(box_height, scale, src_height);
                Self {
                    crop: Some(SourceRect {
                        x: (src_width - crop_w) / 2,
                        y: (src_height - crop_h) / 2,
                        width: crop_w,
                        height: crop_h,
                    }),
                    ..Self::exact(box_width, box_height)
                }
            }
            FitMode::Inside => {
                let (w, h) = scale_dims(src_width, src_height, sx.min(sy).min(1.0));
                Self::exact(w.min(box_width), h.min(box_height))
            }
            FitMode::Outside => {
                let (w, h) = scale_dims(src_width, src_height, sx.max(sy));
                Self::exact(w.max(box_width), h.max(box_height))
            }
        }
    }

    fn exact(width: u32, height: u32) -> Self {
        Self {
            crop: None,
            scaled_width: width,
            scaled_height: height,
            canvas_width: width,
            canvas_height: height,
            offset_x: 0,
            offset_y: 0,
        }
    }

    fn centered(width: u32, height: u32, canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            crop: None,
            scaled_width: width,
            scaled_height: height,
            canvas_width,
            canvas_height,
            offset_x: (canvas_width as i64 - width as i64) / 2,
            offset_y: (canvas_height as i64 - height as i64) / 2,
        }
    }

    /// Whether the scaled image has to be padded onto a separate canvas
    /// rather than being the output itself.
    pub fn needs_canvas(&self) -> bool {
        self.scaled_width != self.canvas_width || self.scaled_height != self.canvas_height
    }

    /// Largest RGBA buffer, in bytes, that executing this plan allocates.
    pub fn peak_rgba_bytes(&self) -> u64 {
        let scaled = self.scaled_width as u64 * self.scaled_height as u64;
        let canvas = self.canvas_width as u64 * self.canvas_height as u64;
        scaled.max(canvas) * 4
    }
}

/// How many source pixels map onto `box_len` output pixels at `scale`.
fn source_span(box_len: u32, scale: f64, src_len: u32) -> u32 {
    ((box_len as f64 / scale).round() as u32).clamp(1, src_len)
}

fn scale_dims(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = (width as f64 * scale).round().max(1.0) as u32;
    let h = (height as f64 * scale).round().max(1.0) as u32;
    (w, h)
}
