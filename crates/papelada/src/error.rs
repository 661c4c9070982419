//! Error types for papelada.
//!
//! Two layers, following the same discipline throughout the crate:
//!
//! - Module-local error enums (`pdf::RasterError`, `ocr::OcrError`) describe
//!   failures in the vocabulary of their subsystem.
//! - [`PapeladaError`] is the crate-level type every public operation
//!   returns. Module errors convert into it with their context preserved.
//!
//! The pipeline boundary never lets an error escape as a panic or a leaked
//! resource: every failure is mapped to a `failed` outcome carrying an
//! [`ErrorKind`] plus a human-readable detail line, after the worker and any
//! held page surface have been released.
//!
//! System I/O errors bubble up unchanged via the `Io` variant so that real
//! filesystem problems stay diagnosable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ocr::error::OcrError;
use crate::pdf::error::RasterError;

/// Result type alias using [`PapeladaError`].
pub type Result<T> = std::result::Result<T, PapeladaError>;

/// Crate-level error for all pipeline operations.
#[derive(Debug, Error)]
pub enum PapeladaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Document parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Document has no pages")]
    EmptyDocument,

    #[error("Worker initialization failed: {message}")]
    WorkerInit {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to render page {page}: {message}")]
    Render { page: u32, message: String },

    #[error("{}", recognition_display(.page, .message))]
    Recognition {
        page: Option<u32>,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

fn recognition_display(page: &Option<u32>, message: &str) -> String {
    match page {
        Some(page) => format!("Recognition failed on page {page}: {message}"),
        None => format!("Recognition failed: {message}"),
    }
}

impl PapeladaError {
    /// Create a `Parse` error without a source.
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a `WorkerInit` error without a source.
    pub fn worker_init<S: Into<String>>(message: S) -> Self {
        Self::WorkerInit {
            message: message.into(),
            source: None,
        }
    }

    /// Create a `Recognition` error without a source.
    pub fn recognition<S: Into<String>>(page: Option<u32>, message: S) -> Self {
        Self::Recognition {
            page,
            message: message.into(),
            source: None,
        }
    }

    /// The stable kind surfaced in `failed` outcomes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::UnsupportedMediaType(_) => ErrorKind::UnsupportedMediaType,
            Self::Parse { .. } => ErrorKind::DocumentParse,
            Self::EmptyDocument => ErrorKind::EmptyDocument,
            Self::WorkerInit { .. } => ErrorKind::WorkerInitialization,
            Self::Render { .. } => ErrorKind::Render,
            Self::Recognition { .. } => ErrorKind::Recognition,
        }
    }
}

/// Stable error classification carried by `failed` outcomes.
///
/// Kinds, not concrete error types: the consuming layer renders one
/// human-readable line per kind and must be able to match on them without
/// knowing the crate's internal error structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedMediaType,
    DocumentParse,
    EmptyDocument,
    WorkerInitialization,
    Render,
    Recognition,
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::UnsupportedMediaType => "unsupported_media_type",
            Self::DocumentParse => "document_parse",
            Self::EmptyDocument => "empty_document",
            Self::WorkerInitialization => "worker_initialization",
            Self::Render => "render",
            Self::Recognition => "recognition",
            Self::Io => "io",
        };
        f.write_str(name)
    }
}

impl From<RasterError> for PapeladaError {
    fn from(err: RasterError) -> Self {
        match err {
            RasterError::InvalidPdf(message) => PapeladaError::Parse {
                message,
                source: None,
            },
            RasterError::EngineUnavailable(message) => PapeladaError::Parse {
                message: format!("PDF engine unavailable: {message}"),
                source: None,
            },
            RasterError::PageNotFound(page) => PapeladaError::Render {
                page,
                message: "page not found".to_string(),
            },
            RasterError::RenderFailed { page, message } => PapeladaError::Render { page, message },
        }
    }
}

impl From<OcrError> for PapeladaError {
    fn from(err: OcrError) -> Self {
        match err {
            OcrError::InitializationFailed(message) | OcrError::InvalidConfiguration(message) => {
                PapeladaError::WorkerInit {
                    message,
                    source: None,
                }
            }
            OcrError::ImageDecodeFailed(message) => PapeladaError::Recognition {
                page: None,
                message,
                source: None,
            },
            OcrError::RecognitionFailed { page, message } => PapeladaError::Recognition {
                page,
                message,
                source: None,
            },
            OcrError::Terminated => PapeladaError::Recognition {
                page: None,
                message: "worker already terminated".to_string(),
                source: None,
            },
        }
    }
}
