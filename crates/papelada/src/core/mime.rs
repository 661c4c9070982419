//! Media-type detection and validation.
//!
//! The pipeline accepts exactly two kinds of input: PDF documents and
//! raster images. Validation happens before any resource is allocated, so
//! an unsupported upload never creates a worker or parses a container.
//!
//! When the declared MIME type is missing or the generic
//! `application/octet-stream`, the file extension is used as a fallback;
//! browser-supplied types are absent for some drag-and-drop sources.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;

use crate::error::{PapeladaError, Result};
use crate::types::MediaType;

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const PNG_MIME_TYPE: &str = "image/png";
pub const JPEG_MIME_TYPE: &str = "image/jpeg";
pub const OCTET_STREAM_MIME_TYPE: &str = "application/octet-stream";

/// Extension to MIME type mapping for the supported input kinds.
static EXT_TO_MIME: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("pdf", PDF_MIME_TYPE);

    m.insert("png", PNG_MIME_TYPE);
    m.insert("jpg", JPEG_MIME_TYPE);
    m.insert("jpeg", JPEG_MIME_TYPE);
    m.insert("webp", "image/webp");
    m.insert("bmp", "image/bmp");
    m.insert("gif", "image/gif");
    m.insert("tiff", "image/tiff");
    m.insert("tif", "image/tiff");

    m
});

/// Infer a MIME type from a file name's extension.
pub fn mime_from_extension(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    EXT_TO_MIME.get(ext.as_str()).copied()
}

/// Resolve the effective MIME type of an upload: the declared type when it
/// is meaningful, otherwise the extension fallback.
pub fn resolve_mime<'a>(declared: &'a str, name: &str) -> Option<&'a str> {
    let declared = declared.trim();
    if !declared.is_empty() && declared != OCTET_STREAM_MIME_TYPE {
        return Some(declared);
    }
    mime_from_extension(name)
}

/// Validate an upload's media type, failing fast for anything that is not
/// a PDF or an image.
pub fn validate_media_type(declared: &str, name: &str) -> Result<MediaType> {
    let mime = resolve_mime(declared, name)
        .ok_or_else(|| PapeladaError::UnsupportedMediaType(format!("'{declared}' ({name})")))?;

    MediaType::from_mime(mime).ok_or_else(|| PapeladaError::UnsupportedMediaType(mime.to_string()))
}
