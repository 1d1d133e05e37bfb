//! Panelpress - image transcoding for fixed-geometry panels
//!
//! Accepts an uploaded image over HTTP, fits it to the panel size and returns
//! PNG, JPEG or a raw little-endian RGB565 frame buffer ready for an LCD
//! driver. This library exposes modules for integration testing.

pub mod api;
pub mod codec;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
