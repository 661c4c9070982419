//! Pdfium-backed rasterizer.
//!
//! Binds to the system pdfium library at construction, so the dependency
//! surfaces as an explicit constructor error instead of a panic deep inside
//! page rendering. Each render call reloads the document from the owned
//! byte buffer and rasterizes exactly one page; only that page's bitmap is
//! ever resident.

use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;

use super::error::RasterError;
use super::rasterize::{PageRasterizer, PdfPages};
use crate::types::PageImage;

/// Rasterizer backed by the pdfium rendering library.
pub struct PdfiumRasterizer {
    pdfium: Arc<Pdfium>,
}

impl PdfiumRasterizer {
    /// Bind to the system pdfium library.
    pub fn new() -> Result<Self, RasterError> {
        let bindings = Pdfium::bind_to_system_library()
            .map_err(|e| RasterError::EngineUnavailable(format!("failed to initialize pdfium: {e}")))?;
        Ok(Self {
            pdfium: Arc::new(Pdfium::new(bindings)),
        })
    }
}

fn map_load_error(err: PdfiumError) -> RasterError {
    let message = err.to_string();
    if message.to_ascii_lowercase().contains("password") {
        RasterError::InvalidPdf("PDF is password-protected".to_string())
    } else {
        RasterError::InvalidPdf(message)
    }
}

#[async_trait]
impl PageRasterizer for PdfiumRasterizer {
    async fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfPages>, RasterError> {
        let page_count = {
            let document = self
                .pdfium
                .load_pdf_from_byte_slice(bytes, None)
                .map_err(map_load_error)?;
            document.pages().len() as u32
        };

        Ok(Box::new(PdfiumPages {
            pdfium: Arc::clone(&self.pdfium),
            bytes: bytes.to_vec(),
            page_count,
        }))
    }
}

struct PdfiumPages {
    pdfium: Arc<Pdfium>,
    bytes: Vec<u8>,
    page_count: u32,
}

#[async_trait]
impl PdfPages for PdfiumPages {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    async fn render_page(&self, index: u32, scale: f32) -> Result<PageImage, RasterError> {
        if index == 0 || index > self.page_count {
            return Err(RasterError::PageNotFound(index));
        }

        // Reload per call instead of holding an open document across the
        // whole operation; the container parse is cheap next to rendering
        // and it keeps the handle free of self-referential borrows.
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(&self.bytes, None)
            .map_err(map_load_error)?;

        let page = document
            .pages()
            .get((index - 1) as u16)
            .map_err(|_| RasterError::PageNotFound(index))?;

        let width_points = page.width().value;
        let height_points = page.height().value;

        let config = PdfRenderConfig::new()
            .set_target_width(((width_points * scale) as i32).max(1))
            .set_target_height(((height_points * scale) as i32).max(1))
            .rotate_if_landscape(PdfPageRenderRotation::None, false);

        let bitmap = page.render_with_config(&config).map_err(|e| RasterError::RenderFailed {
            page: index,
            message: e.to_string(),
        })?;

        let image = bitmap.as_image().into_rgb8();

        Ok(PageImage::new(index, DynamicImage::ImageRgb8(image)))
    }
}
