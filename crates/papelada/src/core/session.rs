//! One-in-flight session management.
//!
//! A [`PipelineSession`] owns at most one running operation at a time.
//! Starting a new document implicitly cancels the previous one (the
//! "replace the upload" gesture) and an explicit [`cancel`] covers the
//! "remove the document" gesture. The abandoned operation winds down
//! through the pipeline's own cancellation path, releasing its worker and
//! page surface without emitting an outcome.
//!
//! A replacement operation does not begin until the cancelled one has
//! finished tearing down, so at no point are two recognition workers live.
//!
//! [`cancel`]: PipelineSession::cancel

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::pipeline::{DocumentPipeline, ProcessStatus};
use crate::progress::ProgressSink;
use crate::types::DocumentInput;

struct ActiveOperation {
    cancel: CancellationToken,
    /// Triggered by the operation task once processing (and teardown) has
    /// finished; the next operation waits on it before starting.
    done: CancellationToken,
}

/// Serializes document operations: at most one in flight.
pub struct PipelineSession {
    pipeline: Arc<DocumentPipeline>,
    active: Mutex<Option<ActiveOperation>>,
}

impl PipelineSession {
    pub fn new(pipeline: Arc<DocumentPipeline>) -> Self {
        Self {
            pipeline,
            active: Mutex::new(None),
        }
    }

    /// Start processing `document`, cancelling any operation still in
    /// flight. The returned handle resolves to the new operation's status.
    pub fn start(&self, document: DocumentInput, sink: Arc<dyn ProgressSink>) -> JoinHandle<ProcessStatus> {
        let cancel = CancellationToken::new();
        let done = CancellationToken::new();

        let previous = {
            let mut active = self.active.lock();
            let previous = active.take();
            *active = Some(ActiveOperation {
                cancel: cancel.clone(),
                done: done.clone(),
            });
            previous
        };

        if let Some(prev) = &previous {
            debug!("new upload cancels the in-flight operation");
            prev.cancel.cancel();
        }

        let pipeline = Arc::clone(&self.pipeline);
        tokio::spawn(async move {
            // Fires on every exit, panics included, so a crashed operation
            // can never wedge the session.
            let _done_guard = done.drop_guard();
            if let Some(prev) = previous {
                // The cancelled operation still owns its worker until it
                // reaches a suspension point and unwinds; wait it out.
                prev.done.cancelled().await;
            }
            pipeline.process(document, sink, cancel).await
        })
    }

    /// Cancel the in-flight operation, if any. Safe to call when nothing
    /// is running or after the operation already finished.
    pub fn cancel(&self) {
        if let Some(op) = self.active.lock().take() {
            debug!("operation cancelled by caller");
            op.cancel.cancel();
        }
    }
}
