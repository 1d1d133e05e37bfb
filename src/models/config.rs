use serde::Deserialize;
use std::path::Path;

/// 20 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Server configuration, read once at startup.
///
/// Values come from an optional YAML file, then environment overrides
/// (`BIND_ADDR`, `PORT`, `CORS_ORIGIN`).
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Value for `Access-Control-Allow-Origin` (`*` allows any origin)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Largest accepted upload file, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// oxipng preset used for PNG output (0 = fastest, 6 = smallest)
    #[serde(default = "default_png_effort")]
    pub png_effort: u8,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_cors_origin() -> String {
    "*".to_string()
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_png_effort() -> u8 {
    6
}

impl ServerConfig {
    /// Load configuration from an optional YAML file, falling back to
    /// defaults if the file is missing or invalid.
    pub fn load(config_file: Option<&Path>) -> Self {
        let Some(path) = config_file else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<Self>(&content) {
                Ok(config) => {
                    let config = config.normalized();
                    tracing::info!(
                        path = %path.display(),
                        bind_addr = %config.bind_addr,
                        max_upload_bytes = config.max_upload_bytes,
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, path = %path.display(), "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, path = %path.display(), "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Apply environment overrides using the given lookup.
    ///
    /// `BIND_ADDR` wins over `PORT`; `PORT` binds all interfaces.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("BIND_ADDR").filter(|v| !v.is_empty()) {
            self.bind_addr = addr;
        } else if let Some(port) = lookup("PORT").and_then(|v| v.trim().parse::<u16>().ok()) {
            self.bind_addr = format!("0.0.0.0:{port}");
        }

        if let Some(origin) = lookup("CORS_ORIGIN").filter(|v| !v.is_empty()) {
            self.cors_origin = origin;
        }

        self
    }

    /// Load from `CONFIG_FILE` (if set) and apply process environment
    /// overrides.
    pub fn from_env() -> Self {
        let config_file = std::env::var("CONFIG_FILE").ok();
        Self::load(config_file.as_deref().map(Path::new))
            .with_env_overrides(|key| std::env::var(key).ok())
    }

    fn normalized(mut self) -> Self {
        self.png_effort = self.png_effort.min(6);
        if self.max_upload_bytes == 0 {
            self.max_upload_bytes = DEFAULT_MAX_UPLOAD_BYTES;
        }
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors_origin: default_cors_origin(),
            max_upload_bytes: default_max_upload_bytes(),
            png_effort: default_png_effort(),
        }
    }
}
