//! Central error types for gpu-inst-count.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfilerError {
    #[error("Feature unavailable: {0}")]
    FeatureUnavailable(String),

    #[error("Tracing backend failure: {0}")]
    Tracing(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid capture: {0}")]
    InvalidCapture(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
