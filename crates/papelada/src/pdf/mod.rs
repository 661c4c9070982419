//! PDF page rasterization.
//!
//! The rasterizer seam ([`PageRasterizer`] / [`PdfPages`]) plus the
//! production pdfium backend (feature `pdf`).

pub mod error;
#[cfg(feature = "pdf")]
pub mod pdfium;
pub mod rasterize;

pub use error::RasterError;
#[cfg(feature = "pdf")]
pub use pdfium::PdfiumRasterizer;
pub use rasterize::{DEFAULT_RENDER_SCALE, PageRasterizer, PdfPages};
