//! OCR (Optical Character Recognition) subsystem.
//!
//! Everything between the pipeline and the recognition engine lives here:
//! the engine seam ([`OcrBackend`] / [`RecognitionSession`]), the worker
//! lifecycle ([`WorkerManager`] / [`Worker`]), and the engine event channel
//! the progress aggregator consumes.
//!
//! The production backend drives the system `tesseract` binary and requires
//! the `tesseract` feature:
//!
//! ```toml
//! [dependencies]
//! papelada = { version = "0.4", features = ["tesseract"] }
//! ```

pub mod backend;
pub mod error;
#[cfg(feature = "tesseract")]
pub mod tesseract_backend;
pub mod types;
pub mod worker;

pub use backend::{OcrBackend, RecognitionSession};
pub use error::OcrError;
#[cfg(feature = "tesseract")]
pub use tesseract_backend::TesseractBackend;
pub use types::{EngineEvent, EngineEventSink, EngineMode, EventSender, NullEvents, RecognitionConfig, WorkerState};
pub use worker::{Worker, WorkerManager};
