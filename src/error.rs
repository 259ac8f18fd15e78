use std::path::PathBuf;

use thiserror::Error;

/// Central error type for the voice-splitter crate.
#[derive(Debug, Error)]
pub enum SplitError {
    // Generic fallback (wraps anyhow)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),

    // Domain-specific variants
    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Checksum mismatch for {path}")]
    Checksum { path: String },

    #[error("Cache dir not available")]
    CacheDirUnavailable,

    #[error("Failed to load separation model: {0}")]
    ModelLoad(String),

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Separation failed: {0}")]
    Separation(String),

    #[error("Failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

impl SplitError {
    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        SplitError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        SplitError::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

// --- Implement From conversions for common errors ---
impl From<std::io::Error> for SplitError {
    fn from(e: std::io::Error) -> Self {
        SplitError::Anyhow(e.into())
    }
}

impl From<serde_json::Error> for SplitError {
    fn from(e: serde_json::Error) -> Self {
        SplitError::Anyhow(e.into())
    }
}

impl From<reqwest::Error> for SplitError {
    fn from(e: reqwest::Error) -> Self {
        SplitError::Anyhow(e.into())
    }
}

impl From<hex::FromHexError> for SplitError {
    fn from(e: hex::FromHexError) -> Self {
        SplitError::Anyhow(e.into())
    }
}

impl From<ort::Error> for SplitError {
    fn from(e: ort::Error) -> Self {
        SplitError::Anyhow(anyhow::anyhow!("onnx runtime: {e}"))
    }
}

impl From<ndarray::ShapeError> for SplitError {
    fn from(e: ndarray::ShapeError) -> Self {
        SplitError::Anyhow(e.into())
    }
}

pub type Result<T> = std::result::Result<T, SplitError>;
