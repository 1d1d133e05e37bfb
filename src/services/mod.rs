pub mod transcoder;

pub use transcoder::{
    PackedOutput, Transcoder, IMMUTABLE_CACHE_CONTROL, NO_STORE_CACHE_CONTROL,
};
