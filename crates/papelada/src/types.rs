//! Input and output types shared across the pipeline.

use image::GenericImageView;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, PapeladaError};

/// Media type of an uploaded document, derived from its declared MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Pdf,
    Image,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Pdf => "pdf",
            MediaType::Image => "image",
        }
    }

    /// Classify a MIME string. Anything that is neither `application/pdf`
    /// nor `image/*` is unsupported and yields `None`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        if mime == crate::core::mime::PDF_MIME_TYPE {
            Some(MediaType::Pdf)
        } else if mime.starts_with("image/") {
            Some(MediaType::Image)
        } else {
            None
        }
    }
}

/// The uploaded artifact handed to the pipeline by the caller.
///
/// Owned exclusively by the operation processing it and dropped when that
/// operation ends; nothing is persisted.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    /// Display name, used in progress messages and logs.
    pub name: String,
    /// Declared MIME type (`application/pdf` or `image/*`).
    pub media_type: String,
    /// Raw document content.
    pub bytes: Vec<u8>,
}

impl DocumentInput {
    pub fn new<N: Into<String>, M: Into<String>>(name: N, media_type: M, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Byte size of the document content.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// One rasterized page surface (or, for image input, the decoded image
/// itself) handed to the recognition worker.
///
/// Pages are produced lazily in index order and never held concurrently:
/// the pipeline drops each `PageImage` as soon as its recognition pass
/// completes, before the next page is rendered, which bounds peak memory
/// to a single page's bitmap regardless of document length.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-based page index (always 1 for image input).
    pub index: u32,
    /// Pixel surface.
    pub image: image::DynamicImage,
}

impl PageImage {
    pub fn new(index: u32, image: image::DynamicImage) -> Self {
        Self { index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// One progress event emitted while a document is being processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Overall completion, clamped to 0..=100 and non-decreasing within one
    /// operation.
    pub overall_percent: u8,
    /// Human-readable status line.
    pub message: String,
}

impl ProgressUpdate {
    pub fn new<S: Into<String>>(overall_percent: u8, message: S) -> Self {
        Self {
            overall_percent: overall_percent.min(100),
            message: message.into(),
        }
    }
}

/// Terminal classification of one document-processing operation.
///
/// `Empty` is a non-error result: recognition succeeded but found no text.
/// It must stay distinguishable from `Failed` so the consuming layer can
/// render it differently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecognitionOutcome {
    Success { text: String },
    Empty,
    Failed { error: ErrorKind, detail: String },
}

impl RecognitionOutcome {
    /// Map a pipeline error to a `Failed` outcome carrying its kind and a
    /// one-line detail.
    pub fn from_error(err: &PapeladaError) -> Self {
        RecognitionOutcome::Failed {
            error: err.kind(),
            detail: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RecognitionOutcome::Success { .. })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RecognitionOutcome::Empty)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RecognitionOutcome::Failed { .. })
    }

    /// Recognized text, if the operation succeeded.
    pub fn text(&self) -> Option<&str> {
        match self {
            RecognitionOutcome::Success { text } => Some(text),
            _ => None,
        }
    }
}
