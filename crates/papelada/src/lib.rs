//! Papelada - Document Ingestion & OCR Pipeline
//!
//! Papelada turns an uploaded PDF or image into plain text through optical
//! character recognition, reporting fine-grained monotonic progress while
//! managing the lifecycle of a single recognition worker per document.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use papelada::{DocumentInput, DocumentPipeline, PipelineConfig};
//! use papelada::progress::ChannelSink;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[cfg(all(feature = "pdf", feature = "tesseract"))]
//! # async fn example() -> anyhow::Result<()> {
//! let rasterizer = Arc::new(papelada::pdf::PdfiumRasterizer::new()?);
//! let backend = Arc::new(papelada::ocr::TesseractBackend::new()?);
//! let pipeline = DocumentPipeline::new(rasterizer, backend, PipelineConfig::default());
//!
//! let bytes = tokio::fs::read("despacho.pdf").await?;
//! let document = DocumentInput::new("despacho.pdf", "application/pdf", bytes);
//!
//! let (sink, mut progress) = ChannelSink::new();
//! let status = pipeline
//!     .process(document, Arc::new(sink), CancellationToken::new())
//!     .await;
//! println!("{:?}", status.outcome());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core** (`core`): media-type validation, per-document orchestration,
//!   one-in-flight session management
//! - **OCR** (`ocr`): recognition worker lifecycle plus the engine seam and
//!   the production Tesseract backend
//! - **PDF** (`pdf`): one-page-at-a-time rasterization behind a seam, with
//!   a pdfium production backend
//! - **Progress** (`progress`): monotonic 0-100 aggregation of page-local
//!   engine events
//! - **Accumulate** (`accumulate`): text concatenation and
//!   success/empty/failed outcome classification
//!
//! Pages are processed strictly sequentially: one rasterize-then-recognize
//! cycle at a time bounds peak memory to a single page bitmap and one
//! worker regardless of document size.

#![deny(unsafe_code)]

pub mod accumulate;
pub mod config;
pub mod core;
pub mod error;
pub mod ocr;
pub mod pdf;
pub mod progress;
pub mod types;

pub use accumulate::TextAccumulator;
pub use config::{ConfigError, PipelineConfig};
pub use core::mime::validate_media_type;
pub use core::pipeline::{DocumentPipeline, PipelinePhase, ProcessStatus};
pub use core::session::PipelineSession;
pub use error::{ErrorKind, PapeladaError, Result};
pub use progress::{ChannelSink, NullSink, ProgressSink};
pub use types::{DocumentInput, MediaType, PageImage, ProgressUpdate, RecognitionOutcome};
