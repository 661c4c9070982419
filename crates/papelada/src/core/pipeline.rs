//! Document processing orchestration.
//!
//! Drives one upload through the whole state machine:
//!
//! ```text
//! idle → validating → (rasterizing ⇄ recognizing)* → finalizing
//!      → { succeeded | empty | failed }
//! ```
//!
//! PDFs alternate rasterize/recognize per page; images collapse to a single
//! recognize step. Pages are processed strictly sequentially, with one page
//! bitmap and one worker alive at any moment, so peak memory is independent
//! of document length.
//!
//! Every error is caught at this boundary, mapped to a `failed` outcome,
//! and surfaced only after the worker and any held page surface have been
//! released. Cancellation is checked at every suspension point and races
//! the in-flight render/recognize call; a cancelled operation yields
//! [`ProcessStatus::Cancelled`] and never emits an outcome.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::accumulate::TextAccumulator;
use crate::config::PipelineConfig;
use crate::core::mime::validate_media_type;
use crate::error::{PapeladaError, Result};
use crate::ocr::backend::OcrBackend;
use crate::ocr::worker::WorkerManager;
use crate::pdf::rasterize::PageRasterizer;
use crate::progress::{ProgressAggregator, ProgressSink};
use crate::types::{DocumentInput, MediaType, PageImage, RecognitionOutcome};

/// Phase of the per-document state machine, for logs and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Idle,
    Validating,
    Rasterizing,
    Recognizing,
    Finalizing,
}

impl PipelinePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelinePhase::Idle => "idle",
            PipelinePhase::Validating => "validating",
            PipelinePhase::Rasterizing => "rasterizing",
            PipelinePhase::Recognizing => "recognizing",
            PipelinePhase::Finalizing => "finalizing",
        }
    }
}

/// How one `process` call ended.
///
/// Errors do not appear here: they are folded into a
/// [`RecognitionOutcome::Failed`]. Cancellation is the only way to finish
/// without an outcome.
#[derive(Debug)]
pub enum ProcessStatus {
    Completed(RecognitionOutcome),
    Cancelled,
}

impl ProcessStatus {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProcessStatus::Cancelled)
    }

    pub fn outcome(&self) -> Option<&RecognitionOutcome> {
        match self {
            ProcessStatus::Completed(outcome) => Some(outcome),
            ProcessStatus::Cancelled => None,
        }
    }
}

/// The document ingestion pipeline.
///
/// Holds the collaborator seams and configuration; each [`process`] call is
/// one independent operation with its own worker manager, aggregator, and
/// rasterizer handle.
///
/// [`process`]: DocumentPipeline::process
pub struct DocumentPipeline {
    rasterizer: Arc<dyn PageRasterizer>,
    backend: Arc<dyn OcrBackend>,
    config: PipelineConfig,
}

impl DocumentPipeline {
    pub fn new(rasterizer: Arc<dyn PageRasterizer>, backend: Arc<dyn OcrBackend>, config: PipelineConfig) -> Self {
        Self {
            rasterizer,
            backend,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one document to a terminal status.
    ///
    /// Progress flows to `sink` while the operation runs; `cancel` aborts
    /// it at the next suspension point.
    pub async fn process(
        &self,
        document: DocumentInput,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> ProcessStatus {
        let name = document.name.clone();
        match self.run(document, sink, &cancel).await {
            Ok(Some(outcome)) => {
                debug!(document = %name, phase = PipelinePhase::Idle.as_str(), "document processing completed");
                ProcessStatus::Completed(outcome)
            }
            Ok(None) => {
                debug!(document = %name, phase = PipelinePhase::Idle.as_str(), "document processing cancelled");
                ProcessStatus::Cancelled
            }
            Err(err) => {
                warn!(document = %name, error = %err, "document processing failed");
                ProcessStatus::Completed(RecognitionOutcome::from_error(&err))
            }
        }
    }

    async fn run(
        &self,
        document: DocumentInput,
        sink: Arc<dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<Option<RecognitionOutcome>> {
        debug!(
            document = %document.name,
            size = document.size(),
            phase = PipelinePhase::Validating.as_str(),
            "validating upload"
        );
        let media = validate_media_type(&document.media_type, &document.name)?;

        if cancel.is_cancelled() {
            return Ok(None);
        }

        match media {
            MediaType::Pdf => self.run_pdf(document, sink, cancel).await,
            MediaType::Image => self.run_image(document, sink, cancel).await,
        }
    }

    async fn run_pdf(
        &self,
        document: DocumentInput,
        sink: Arc<dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<Option<RecognitionOutcome>> {
        let pages = self.rasterizer.open(&document.bytes).await?;
        let page_count = pages.page_count();

        // Rejected before the aggregator exists: 100/N is undefined for
        // N=0, and no progress event may be emitted for an empty document.
        if page_count == 0 {
            return Err(PapeladaError::EmptyDocument);
        }

        if cancel.is_cancelled() {
            return Ok(None);
        }

        debug!(document = %document.name, pages = page_count, "opened PDF container");

        let aggregator = Arc::new(ProgressAggregator::new(
            sink,
            page_count,
            f64::from(self.config.render_reserve),
        ));

        // The aggregator is the engine event observer: backends report into
        // it synchronously, so page-local events can never outlive their
        // page or reorder across pages.
        let manager = WorkerManager::new(
            Arc::clone(&self.backend),
            self.config.recognition.clone(),
            aggregator.clone(),
        );

        let scale = self.config.render_scale;
        let token = cancel.clone();
        let agg = Arc::clone(&aggregator);
        let accumulated = manager
            .scoped(move |worker| {
                Box::pin(async move {
                    let mut acc = TextAccumulator::new();
                    for index in 1..=page_count {
                        if token.is_cancelled() {
                            return Ok(None);
                        }
                        agg.begin_page(index);

                        debug!(page = index, phase = PipelinePhase::Rasterizing.as_str(), "rendering page");
                        let page = tokio::select! {
                            biased;
                            _ = token.cancelled() => return Ok(None),
                            page = pages.render_page(index, scale) => page?,
                        };
                        agg.page_rendered();

                        debug!(page = index, phase = PipelinePhase::Recognizing.as_str(), "recognizing page");
                        let text = tokio::select! {
                            biased;
                            _ = token.cancelled() => return Ok(None),
                            text = worker.recognize(&page) => text?,
                        };

                        // The surface is dropped before the next render, so
                        // at most one page bitmap is ever held.
                        drop(page);
                        acc.append(&text);
                    }
                    Ok(Some(acc))
                })
            })
            .await;

        let acc = match accumulated? {
            Some(acc) => acc,
            None => return Ok(None),
        };

        debug!(document = %document.name, phase = PipelinePhase::Finalizing.as_str(), "finalizing");
        aggregator.complete();
        Ok(Some(acc.finalize()))
    }

    async fn run_image(
        &self,
        document: DocumentInput,
        sink: Arc<dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<Option<RecognitionOutcome>> {
        let image = image::load_from_memory(&document.bytes)
            .map_err(|e| PapeladaError::recognition(None, format!("failed to decode image: {e}")))?;

        if cancel.is_cancelled() {
            return Ok(None);
        }

        let aggregator = Arc::new(ProgressAggregator::for_image(sink));
        let manager = WorkerManager::new(
            Arc::clone(&self.backend),
            self.config.recognition.clone(),
            aggregator.clone(),
        );

        let token = cancel.clone();
        let agg = Arc::clone(&aggregator);
        let page = PageImage::new(1, image);
        let recognized = manager
            .scoped(move |worker| {
                Box::pin(async move {
                    agg.begin_page(1);
                    debug!(phase = PipelinePhase::Recognizing.as_str(), "recognizing image");
                    let text = tokio::select! {
                        biased;
                        _ = token.cancelled() => return Ok(None),
                        text = worker.recognize(&page) => text?,
                    };
                    Ok(Some(text))
                })
            })
            .await;

        let text = match recognized? {
            Some(text) => text,
            None => return Ok(None),
        };

        debug!(document = %document.name, phase = PipelinePhase::Finalizing.as_str(), "finalizing");
        let mut acc = TextAccumulator::new();
        acc.set(&text);
        aggregator.complete();
        Ok(Some(acc.finalize()))
    }
}
