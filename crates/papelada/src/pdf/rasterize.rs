//! Page rasterizer seam.
//!
//! PDF rendering is an external collaborator behind these two traits. The
//! contract the pipeline depends on:
//!
//! - [`PageRasterizer::open`] parses the container once and exposes the
//!   page count; invalid bytes fail here, before any worker exists.
//! - [`PdfPages::render_page`] produces exactly one page surface at a time,
//!   at an oversampling scale chosen for recognition accuracy. The caller
//!   drops each [`PageImage`] as soon as its OCR pass completes, so peak
//!   memory stays at one page's bitmap no matter how long the document is.

use async_trait::async_trait;

use super::error::RasterError;
use crate::types::PageImage;

/// Default oversampling scale relative to the page's native resolution.
///
/// 2x of the 72dpi PDF point grid (~144dpi) is the lowest scale at which
/// the recognition engine stays accurate on typical scanned paperwork.
pub const DEFAULT_RENDER_SCALE: f32 = 2.0;

/// Opens PDF containers.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Parse `bytes` as a PDF container.
    ///
    /// Fails with [`RasterError::InvalidPdf`] when the bytes are not a
    /// valid PDF. A container that parses but reports zero pages is NOT an
    /// error at this layer; the pipeline rejects it before progress
    /// aggregation starts.
    async fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfPages>, RasterError>;
}

/// An open PDF document handle producing one rasterized page at a time.
#[async_trait]
pub trait PdfPages: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Rasterize the 1-based `index` page at `scale` times the page's
    /// native resolution.
    async fn render_page(&self, index: u32, scale: f32) -> Result<PageImage, RasterError>;
}
