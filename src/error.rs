//! Error types for each external boundary of the labeller.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of the text measurement port.
#[derive(Debug, Error)]
pub enum MeasureError {
    #[error("rendering engine not found: {0}")]
    EngineNotFound(String),

    #[error("measurement command failed: {message}")]
    CommandFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("unparsable measurement output: {0:?}")]
    Unparsable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of the metadata service.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("exiftool not found in PATH")]
    ExifToolNotFound,

    #[error("exiftool failed: {message}")]
    ExifToolFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("no usable image dimensions for {0}")]
    MissingDimensions(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Failure to hand the draw sequence to the rendering engine.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("ImageMagick not found in PATH")]
    MagickNotFound,

    #[error("ImageMagick command failed: {message}")]
    MagickFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn magick_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::MagickFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("cannot lay out labels for a {0}x{1} photo")]
    EmptyPhoto(u32, u32),

    #[error(transparent)]
    Measure(#[from] MeasureError),
}

/// Per-photo failure surfaced to batch callers.
#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("metadata: {0}")]
    Metadata(#[from] MetadataError),

    #[error("layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("render: {0}")]
    Render(#[from] RenderError),

    /// Writing a preview or layout dump failed.
    #[error("output: {0:#}")]
    Output(anyhow::Error),
}
