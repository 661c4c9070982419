//! Recognition worker lifecycle management.
//!
//! One [`WorkerManager`] exists per document-processing operation. It hands
//! out at most one live [`Worker`] at a time and guarantees the worker's
//! engine session is terminated on every exit path through
//! [`WorkerManager::scoped`]: success, error, or cancellation all pass
//! through the same release point, so teardown cannot be missed when a new
//! exit path is added.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use super::backend::{OcrBackend, RecognitionSession};
use super::error::OcrError;
use super::types::{EventSender, RecognitionConfig, WorkerState};
use crate::types::PageImage;

/// Owns worker creation and the at-most-one-live-worker invariant for one
/// document-processing operation.
pub struct WorkerManager {
    backend: Arc<dyn OcrBackend>,
    config: RecognitionConfig,
    events: EventSender,
    live: Arc<AtomicBool>,
}

impl WorkerManager {
    /// Create a manager for one operation. Engine events from every worker
    /// this manager creates flow through `events`.
    pub fn new(backend: Arc<dyn OcrBackend>, config: RecognitionConfig, events: EventSender) -> Self {
        Self {
            backend,
            config,
            events,
            live: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Initialize a recognition worker.
    ///
    /// Fails with [`OcrError::InitializationFailed`] if the engine cannot
    /// be loaded, or if a worker from this manager is still live.
    pub async fn acquire(&self) -> Result<Worker, OcrError> {
        self.config.validate().map_err(OcrError::InvalidConfiguration)?;

        if self
            .live
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(OcrError::InitializationFailed(
                "a recognition worker is already live for this operation".to_string(),
            ));
        }

        match self.backend.create_session(&self.config, self.events.clone()).await {
            Ok(session) => {
                debug!(backend = self.backend.name(), language = %self.config.language, "recognition worker acquired");
                Ok(Worker {
                    session: Some(session),
                    state: WorkerState::Ready,
                    live: Arc::clone(&self.live),
                })
            }
            Err(err) => {
                self.live.store(false, Ordering::Release);
                Err(err)
            }
        }
    }

    /// Run `f` with a freshly acquired worker, releasing it afterwards no
    /// matter how `f` exits.
    pub async fn scoped<T, F>(&self, f: F) -> crate::error::Result<T>
    where
        F: for<'a> FnOnce(&'a mut Worker) -> Pin<Box<dyn Future<Output = crate::error::Result<T>> + Send + 'a>>,
    {
        let mut worker = self.acquire().await?;
        let result = f(&mut worker).await;
        worker.release().await;
        result
    }

    /// Whether a worker from this manager currently holds a live session.
    pub fn has_live_worker(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

/// A live recognition worker: wraps one engine session plus its lifecycle
/// state.
pub struct Worker {
    session: Option<Box<dyn RecognitionSession>>,
    state: WorkerState,
    live: Arc<AtomicBool>,
}

impl Worker {
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Submit one page surface for recognition. Only one call may be in
    /// flight per worker, enforced by the `&mut` receiver.
    ///
    /// Recognition failures carry the page index of `page`.
    pub async fn recognize(&mut self, page: &PageImage) -> Result<String, OcrError> {
        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return Err(OcrError::Terminated),
        };

        self.state = WorkerState::Busy;
        let result = session.recognize(page).await;
        self.state = WorkerState::Ready;

        result.map_err(|err| err.with_page(page.index))
    }

    /// Terminate the worker's engine session. Idempotent: calling this a
    /// second time is a no-op.
    pub async fn release(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(err) = session.terminate().await {
                warn!(error = %err, "recognition worker termination reported an error");
            }
            self.state = WorkerState::Terminated;
            self.live.store(false, Ordering::Release);
            debug!("recognition worker released");
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // release() is async and must be called explicitly; a worker dropped
        // with a live session is a lifecycle bug upstream.
        if self.session.is_some() {
            self.live.store(false, Ordering::Release);
            warn!("recognition worker dropped without release; engine session leaked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::types::{EngineEvent, NullEvents};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// Backend double that tracks live session count and records teardown.
    struct MockBackend {
        live_sessions: Arc<AtomicUsize>,
        max_live: Arc<AtomicUsize>,
        fail_init: bool,
    }

    impl MockBackend {
        fn new() -> Self {
            Self {
                live_sessions: Arc::new(AtomicUsize::new(0)),
                max_live: Arc::new(AtomicUsize::new(0)),
                fail_init: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail_init: true,
                ..Self::new()
            }
        }
    }

    struct MockSession {
        live_sessions: Arc<AtomicUsize>,
        terminations: usize,
        events: EventSender,
    }

    #[async_trait]
    impl OcrBackend for MockBackend {
        fn name(&self) -> &str {
            "mock"
        }

        async fn create_session(
            &self,
            _config: &RecognitionConfig,
            events: EventSender,
        ) -> Result<Box<dyn RecognitionSession>, OcrError> {
            if self.fail_init {
                return Err(OcrError::InitializationFailed("model fetch failed".to_string()));
            }
            let live = self.live_sessions.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_live.fetch_max(live, Ordering::SeqCst);
            Ok(Box::new(MockSession {
                live_sessions: Arc::clone(&self.live_sessions),
                terminations: 0,
                events,
            }))
        }
    }

    #[async_trait]
    impl RecognitionSession for MockSession {
        async fn recognize(&mut self, page: &PageImage) -> Result<String, OcrError> {
            self.events.emit(EngineEvent::Recognizing { fraction: 1.0 });
            Ok(format!("page {}", page.index))
        }

        async fn terminate(&mut self) -> Result<(), OcrError> {
            self.terminations += 1;
            assert_eq!(self.terminations, 1, "session terminated twice");
            self.live_sessions.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn blank_page(index: u32) -> PageImage {
        PageImage::new(index, image::DynamicImage::new_rgb8(4, 4))
    }

    fn manager_with(backend: MockBackend) -> (WorkerManager, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let live = Arc::clone(&backend.live_sessions);
        let max = Arc::clone(&backend.max_live);
        (
            WorkerManager::new(Arc::new(backend), RecognitionConfig::default(), Arc::new(NullEvents)),
            live,
            max,
        )
    }

    #[tokio::test]
    async fn test_acquire_recognize_release() {
        let (manager, live, _) = manager_with(MockBackend::new());

        let mut worker = manager.acquire().await.unwrap();
        assert_eq!(worker.state(), WorkerState::Ready);

        let text = worker.recognize(&blank_page(1)).await.unwrap();
        assert_eq!(text, "page 1");
        assert_eq!(worker.state(), WorkerState::Ready);

        worker.release().await;
        assert_eq!(worker.state(), WorkerState::Terminated);
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let (manager, live, _) = manager_with(MockBackend::new());

        let mut worker = manager.acquire().await.unwrap();
        worker.release().await;
        worker.release().await;
        worker.release().await;

        assert_eq!(worker.state(), WorkerState::Terminated);
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_recognize_after_release_fails() {
        let (manager, _, _) = manager_with(MockBackend::new());

        let mut worker = manager.acquire().await.unwrap();
        worker.release().await;

        let err = worker.recognize(&blank_page(1)).await.unwrap_err();
        assert!(matches!(err, OcrError::Terminated));
    }

    #[tokio::test]
    async fn test_second_acquire_while_live_is_rejected() {
        let (manager, _, _) = manager_with(MockBackend::new());

        let mut first = manager.acquire().await.unwrap();
        let err = manager.acquire().await.err().unwrap();
        assert!(matches!(err, OcrError::InitializationFailed(_)));

        first.release().await;
        let mut second = manager.acquire().await.unwrap();
        second.release().await;
    }

    #[tokio::test]
    async fn test_failed_init_does_not_hold_live_slot() {
        let (manager, live, _) = manager_with(MockBackend::failing());

        let err = manager.acquire().await.err().unwrap();
        assert!(matches!(err, OcrError::InitializationFailed(_)));
        assert!(!manager.has_live_worker());
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_scoped_releases_on_success() {
        let (manager, live, max) = manager_with(MockBackend::new());

        let text = manager
            .scoped(|worker| {
                Box::pin(async move {
                    let text = worker.recognize(&blank_page(3)).await?;
                    Ok(text)
                })
            })
            .await
            .unwrap();

        assert_eq!(text, "page 3");
        assert_eq!(live.load(Ordering::SeqCst), 0);
        assert_eq!(max.load(Ordering::SeqCst), 1);
        assert!(!manager.has_live_worker());
    }

    #[tokio::test]
    async fn test_scoped_releases_on_error() {
        let (manager, live, _) = manager_with(MockBackend::new());

        let result: crate::error::Result<()> = manager
            .scoped(|_worker| Box::pin(async move { Err(crate::error::PapeladaError::EmptyDocument) }))
            .await;

        assert!(result.is_err());
        assert_eq!(live.load(Ordering::SeqCst), 0);
        assert!(!manager.has_live_worker());
    }

    #[tokio::test]
    async fn test_at_most_one_live_across_sequential_operations() {
        let (manager, _, max) = manager_with(MockBackend::new());

        for _ in 0..5 {
            manager
                .scoped(|worker| {
                    Box::pin(async move {
                        worker.recognize(&blank_page(1)).await?;
                        Ok(())
                    })
                })
                .await
                .unwrap();
        }

        assert_eq!(max.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recognition_error_carries_page_index() {
        struct FailingSession;

        #[async_trait]
        impl RecognitionSession for FailingSession {
            async fn recognize(&mut self, _page: &PageImage) -> Result<String, OcrError> {
                Err(OcrError::RecognitionFailed {
                    page: None,
                    message: "engine crash".to_string(),
                })
            }

            async fn terminate(&mut self) -> Result<(), OcrError> {
                Ok(())
            }
        }

        struct FailingBackend;

        #[async_trait]
        impl OcrBackend for FailingBackend {
            fn name(&self) -> &str {
                "failing"
            }

            async fn create_session(
                &self,
                _config: &RecognitionConfig,
                _events: EventSender,
            ) -> Result<Box<dyn RecognitionSession>, OcrError> {
                Ok(Box::new(FailingSession))
            }
        }

        let manager = WorkerManager::new(Arc::new(FailingBackend), RecognitionConfig::default(), Arc::new(NullEvents));

        let mut worker = manager.acquire().await.unwrap();
        let err = worker.recognize(&blank_page(7)).await.unwrap_err();
        assert!(matches!(err, OcrError::RecognitionFailed { page: Some(7), .. }));
        worker.release().await;
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_session_creation() {
        let backend = MockBackend::new();
        let live = Arc::clone(&backend.live_sessions);
        let manager = WorkerManager::new(
            Arc::new(backend),
            RecognitionConfig {
                language: String::new(),
                ..Default::default()
            },
            Arc::new(NullEvents),
        );

        let err = manager.acquire().await.err().unwrap();
        assert!(matches!(err, OcrError::InvalidConfiguration(_)));
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }
}
