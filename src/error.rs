// src/error.rs
//
// Fatal error taxonomy. A frame with no detection is not an error
// anywhere in this crate; it flows through the pipeline as `None`.

use thiserror::Error;

/// Video open/decode failures. Always fatal to the run.
#[derive(Debug, Error)]
pub enum VideoError {
    #[error("failed to open video {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("failed to decode frame {index}")]
    Decode {
        index: u64,
        #[source]
        source: opencv::Error,
    },

    #[error("failed to materialize video buffer to a temporary file")]
    Materialize(#[source] std::io::Error),
}

/// Preview sink failures. Logged and swallowed by the driver; a broken
/// sink never aborts a run.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink rejected frame: {0}")]
    Push(String),
}

/// The driver's fatal surface.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Video(#[from] VideoError),

    #[error("pipeline run cancelled")]
    Cancelled,
}
