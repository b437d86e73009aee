use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the sampling runtime and snapshot I/O.
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SamplerError {
    SamplerError::Io {
        path: path.into(),
        source,
    }
}
