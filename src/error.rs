//! Error types for loading, painting and exporting.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to load the document model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CV data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure to load a pipeline configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid pipeline config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// An unknown picker value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("unsupported language '{0}' (expected one of en, fr, de, ar, it)")]
    UnknownLanguage(String),

    #[error("unknown layout '{0}' (expected compact or full)")]
    UnknownLayout(String),
}

/// Failure to load a font face.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font: {0}")]
    Parse(#[from] ttf_parser::FaceParsingError),
}

/// Failure while laying out the visual document.
#[derive(Debug, Error)]
pub enum PaintError {
    #[error("layout failed: {0}")]
    Layout(#[from] taffy::TaffyError),
}

/// Failure of the export pipeline. Every variant is caught at the control
/// surface boundary and turned into a user-visible notice.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing has been painted yet")]
    CaptureNotReady,

    #[error("rasterization failed: {0}")]
    Rasterization(String),

    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("PDF assembly failed: {0}")]
    Pdf(String),

    #[error("export task panicked")]
    TaskPanicked,
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;
