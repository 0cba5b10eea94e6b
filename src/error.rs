//! Error taxonomy for the tessellation pipeline.
//!
//! Every variant is fatal: the pipeline aborts and the binaries surface the
//! error at the top level. Partial regions are not errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoronoiError {
    #[error("Dataset not readable: {path}: {source}")]
    MissingDataset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Column '{0}' not found in dataset header")]
    MissingColumn(String),

    #[error("Malformed field '{column}' at row {row}: {value:?}")]
    MalformedField {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Failed to write {path}: {source}")]
    ExportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to parse KML: {0}")]
    Kml(String),
}

impl VoronoiError {
    pub fn export_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VoronoiError::ExportWrite {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, VoronoiError>;
