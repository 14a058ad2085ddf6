use std::path::PathBuf;
use thiserror::Error;

/// Reasons the reference dataset cannot be turned into an index.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("reference dataset not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read reference dataset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("reference dataset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed reference dataset at {path}: expected {expected}")]
    Malformed { path: String, expected: &'static str },
}
