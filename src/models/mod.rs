pub mod config;
pub mod params;

pub use config::{ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};
pub use params::{FitMode, HexColor, OutputFormat, StripMode, TranscodeParams};
