// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The Error type for pipeline operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Configuration validation error: {0}")]
    ConfigValidationError(String),

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("CSV error: {source}")]
    CsvError {
        #[from]
        source: csv::Error,
    },

    #[error("Serialization/Deserialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    /// Authentication, rate limiting, transport or payload failures of the timeline API.
    #[error("Timeline source error: {0}")]
    SourceError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Required input '{}' does not exist", path.display())]
    MissingInput { path: PathBuf },

    #[error("Input '{}' contains no records", path.display())]
    EmptyCorpus { path: PathBuf },

    #[error("Malformed record in '{}': {reason}", path.display())]
    MalformedRecord { path: PathBuf, reason: String },

    #[error("Analysis error: {0}")]
    AnalysisError(String),

    #[error("Error in action '{step_name}': {source}")]
    StepError {
        step_name: String,
        source: Box<PipelineError>,
    },
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::SourceError(err.to_string())
    }
}
