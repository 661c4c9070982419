//! Recognition engine seam.
//!
//! The OCR engine is an external collaborator. The pipeline talks to it
//! through these two traits so production backends (system Tesseract,
//! anything else capable of image-to-text) and test doubles plug in without
//! touching the worker lifecycle or progress logic.

use async_trait::async_trait;

use super::error::OcrError;
use super::types::{EventSender, RecognitionConfig};
use crate::types::PageImage;

/// Factory for recognition sessions.
///
/// Implementations must be cheap to share (`Arc<dyn OcrBackend>`); the
/// expensive work (loading models, spawning engines) belongs in
/// [`OcrBackend::create_session`], which corresponds to worker
/// initialization and may fail with
/// [`OcrError::InitializationFailed`] when the engine cannot be loaded.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Create one recognition session configured for `config`, routing all
    /// engine lifecycle/progress events through `events`.
    async fn create_session(
        &self,
        config: &RecognitionConfig,
        events: EventSender,
    ) -> Result<Box<dyn RecognitionSession>, OcrError>;
}

/// A live recognition session: one OCR job at a time, explicit teardown.
///
/// Sequential use is enforced by the `&mut` receiver, not internal locking.
/// Dropping an in-flight `recognize` future must abort the job where the
/// engine supports abort; otherwise the job runs to completion and its
/// result is discarded.
#[async_trait]
pub trait RecognitionSession: Send {
    /// Recognize text on one page surface, emitting progress over the event
    /// channel registered at creation.
    async fn recognize(&mut self, page: &PageImage) -> Result<String, OcrError>;

    /// Terminate the session, releasing engine resources. Called exactly
    /// once by the worker that owns this session.
    async fn terminate(&mut self) -> Result<(), OcrError>;
}
