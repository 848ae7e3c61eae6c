use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to decode image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to load config {path:?}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Failed to save or load record {path:?}: {message}")]
    Record { path: PathBuf, message: String },

    #[error("Malformed sample on line {line}: {message}")]
    MalformedSample { line: u64, message: String },

    #[error("Unknown class label '{label}'")]
    UnknownLabel { label: String },

    #[error("Image {path:?} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        path: PathBuf,
        expected: [usize; 3],
        actual: [usize; 3],
    },

    #[error("Invalid normalization range: min {min} must be below max {max}")]
    InvalidNormalization { min: f64, max: f64 },

    #[error("Invalid network: {0}")]
    InvalidNetwork(String),

    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    #[error("Artifacts error: {0}")]
    Artifacts(String),

    #[error("Usage error: {0}")]
    Usage(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
