use std::path::PathBuf;
use thiserror::Error;

/// A comparison root could not be used
#[derive(Error, Debug)]
pub enum PathError {
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Cannot list {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PathError {
    /// Classify an I/O failure on `path` into the matching variant
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            PathError::NotFound(path)
        } else {
            PathError::Unreadable { path, source }
        }
    }
}

/// A single file could not be opened or read while hashing
#[derive(Error, Debug)]
#[error("Failed to read {path}: {source}")]
pub struct HashError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Comparison cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::Config(err.to_string())
    }
}
