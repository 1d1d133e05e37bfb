//! Transcode parameters resolved from untrusted query input.
//!
//! Resolution never fails: anything missing, malformed or out of range is
//! replaced by a default or clamped into range.

use panel_pixels::{clamp_tolerance, DEFAULT_TOLERANCE};
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 480;
pub const MAX_DIMENSION: u32 = 4096;
pub const DEFAULT_QUALITY: u8 = 80;

/// How the source aspect ratio is reconciled with the target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Preserve aspect, cover the box, crop the excess
    Cover,
    /// Preserve aspect, fit in the box, pad with the background
    #[default]
    Contain,
    /// Stretch to the exact box
    Fill,
    /// Preserve aspect, fit in the box, never enlarge
    Inside,
    /// Preserve aspect, at least the box
    Outside,
}

impl FitMode {
    /// Exact, case-sensitive match on the query literal.
    pub fn from_literal(s: &str) -> Option<Self> {
        match s {
            "cover" => Some(Self::Cover),
            "contain" => Some(Self::Contain),
            "fill" => Some(Self::Fill),
            "inside" => Some(Self::Inside),
            "outside" => Some(Self::Outside),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Contain => "contain",
            Self::Fill => "fill",
            Self::Inside => "inside",
            Self::Outside => "outside",
        }
    }
}

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    /// Raw 16-bit RGB565, little-endian, no container
    Rgb565,
}

impl OutputFormat {
    pub fn from_literal(s: &str) -> Option<Self> {
        match s {
            "png" => Some(Self::Png),
            "jpeg" => Some(Self::Jpeg),
            "rgb565" => Some(Self::Rgb565),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Rgb565 => "rgb565",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Rgb565 => "application/octet-stream",
        }
    }
}

/// Background removal applied after resizing (PNG with alpha only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StripMode {
    #[default]
    None,
    /// Key out near-white pixels
    White,
}

impl StripMode {
    pub fn from_literal(s: &str) -> Self {
        match s {
            "white" => Self::White,
            _ => Self::None,
        }
    }
}

/// Opaque RGB color parsed from a 6-digit hex string (no `#`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    /// Accepts exactly six hex digits, either case.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != 6 {
            return None;
        }
        let mut rgb = [0u8; 3];
        hex::decode_to_slice(s, &mut rgb).ok()?;
        Some(Self {
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
        })
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Validated, immutable transcode settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeParams {
    pub width: u32,
    pub height: u32,
    pub fit: FitMode,
    pub format: OutputFormat,
    pub quality: u8,
    pub background: HexColor,
    pub auto_rotate: bool,
    /// Only ever true for PNG output
    pub preserve_alpha: bool,
    pub strip: StripMode,
    pub strip_tolerance: u8,
}

impl Default for TranscodeParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fit: FitMode::default(),
            format: OutputFormat::default(),
            quality: DEFAULT_QUALITY,
            background: HexColor::BLACK,
            auto_rotate: true,
            preserve_alpha: false,
            strip: StripMode::None,
            strip_tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl TranscodeParams {
    /// Resolve parameters from raw query pairs (`w,h,fit,fmt,q,bg,rotate,
    /// alpha,strip,strip_tol`). Unknown keys are ignored.
    pub fn resolve(query: &HashMap<String, String>) -> Self {
        let get = |key: &str| query.get(key).map(String::as_str);

        let format = get("fmt")
            .and_then(OutputFormat::from_literal)
            .unwrap_or_default();

        Self {
            width: clamp_int(get("w"), DEFAULT_WIDTH as i64, 1, MAX_DIMENSION as i64) as u32,
            height: clamp_int(get("h"), DEFAULT_HEIGHT as i64, 1, MAX_DIMENSION as i64) as u32,
            fit: get("fit").and_then(FitMode::from_literal).unwrap_or_default(),
            format,
            quality: clamp_int(get("q"), DEFAULT_QUALITY as i64, 1, 100) as u8,
            background: get("bg").and_then(HexColor::parse).unwrap_or(HexColor::BLACK),
            auto_rotate: get("rotate").map_or(true, |v| v == "1"),
            preserve_alpha: get("alpha") == Some("1") && format == OutputFormat::Png,
            strip: get("strip").map(StripMode::from_literal).unwrap_or_default(),
            strip_tolerance: clamp_tolerance(
                parse_leading_int(get("strip_tol")).unwrap_or(DEFAULT_TOLERANCE as i64),
            ),
        }
    }

    /// Whether the near-white keyer runs for these settings.
    pub fn keys_white(&self) -> bool {
        self.preserve_alpha && self.strip == StripMode::White
    }

    /// Whether the alpha channel survives into the output.
    pub fn keeps_alpha(&self) -> bool {
        self.preserve_alpha && self.format == OutputFormat::Png
    }

    /// Padding color handed to the resizer.
    pub fn padding(&self) -> [u8; 4] {
        if self.preserve_alpha {
            [0, 0, 0, 0]
        } else {
            self.background.to_rgba()
        }
    }
}

/// Parse a base-10 integer prefix: leading whitespace, optional sign, then
/// digits. Trailing characters are ignored. Returns `None` if no digit is
/// found. Values beyond `i64` saturate.
fn parse_leading_int(raw: Option<&str>) -> Option<i64> {
    let s = raw?.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let mut value: i64 = 0;
    for d in rest[..digits_len].bytes() {
        let digit = (d - b'0') as i64;
        value = value.saturating_mul(10).saturating_add(digit);
    }
    Some(if negative { -value } else { value })
}

fn clamp_int(raw: Option<&str>, default: i64, min: i64, max: i64) -> i64 {
    parse_leading_int(raw).unwrap_or(default).clamp(min, max)
}
