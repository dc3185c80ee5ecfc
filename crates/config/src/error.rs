use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config validation error (empty file name, etc.).
    #[error("config validation error: {0}")]
    Validation(String),
}
