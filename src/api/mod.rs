pub mod health;
pub mod optimize;

pub use health::{handle_health, HealthResponse, __path_handle_health};
pub use optimize::{handle_optimize, UploadForm, __path_handle_optimize};
pub use optimize::{X_FORMAT, X_HEIGHT, X_WIDTH};
