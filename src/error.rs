use std::path::PathBuf;
use thiserror::Error;

/// The main error type for defectprep operations.
#[derive(Debug, Error)]
pub enum DefectPrepError {
    #[error("IO error at {path}: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed while traversing {path}: {message}")]
    Traversal { path: PathBuf, message: String },

    #[error("Failed to parse annotation XML {path}: {message}")]
    AnnotationParse { path: PathBuf, message: String },

    #[error("Failed to parse label line {line} in {path}: {message}")]
    LabelParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Unknown class '{name}' in {path}; it is not part of the class vocabulary")]
    UnknownClass { path: PathBuf, name: String },

    #[error("Invalid bounding box in {path}: {message}")]
    InvalidBox { path: PathBuf, message: String },

    #[error("Invalid class vocabulary: {message}")]
    InvalidVocabulary { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to parse config YAML from {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write report JSON to {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl DefectPrepError {
    /// Wrap an IO error with the path it happened at.
    pub(crate) fn io_at(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| DefectPrepError::IoAt { path, source }
    }
}
