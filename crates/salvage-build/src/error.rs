//! Input loading errors.

use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuildError>;

#[derive(Error, Debug)]
pub enum BuildError {
    /// A database or config file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid salvage.toml: {0}")]
    ParseToml(#[from] toml::de::Error),

    #[error("Invalid compilation database: {0}")]
    ParseJson(#[from] serde_json::Error),

    /// A config value the pipeline cannot work with.
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

impl BuildError {
    pub(crate) fn read(path: &Path) -> impl FnOnce(std::io::Error) -> BuildError + '_ {
        move |source| BuildError::ReadInput {
            path: path.to_path_buf(),
            source,
        }
    }
}
