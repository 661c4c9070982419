//! Tesseract recognition backend.
//!
//! Drives the system `tesseract` binary, one subprocess per page. The
//! binary is resolved once at backend construction; each recognition call
//! writes the page surface to a scratch PNG and reads recognized text from
//! the child's stdout.
//!
//! Subprocess invocations cannot report fine-grained recognition progress,
//! so sessions emit coarse events: a status message when the page image is
//! prepared, a zero recognition fraction when the child starts, and a full
//! fraction when it exits. The aggregator's budget math works the same
//! either way.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::backend::{OcrBackend, RecognitionSession};
use super::error::OcrError;
use super::types::{EngineEvent, EngineMode, EventSender, RecognitionConfig};
use crate::types::PageImage;

/// Recognition backend using the system `tesseract` binary.
pub struct TesseractBackend {
    binary: PathBuf,
}

impl TesseractBackend {
    /// Resolve `tesseract` from `PATH`.
    pub fn new() -> Result<Self, OcrError> {
        let binary = which::which("tesseract").map_err(|_| {
            OcrError::InitializationFailed("tesseract not found (install tesseract-ocr)".to_string())
        })?;
        Ok(Self { binary })
    }

    /// Use an explicit binary path instead of searching `PATH`.
    pub fn with_binary<P: Into<PathBuf>>(binary: P) -> Self {
        Self { binary: binary.into() }
    }
}

fn oem_flag(mode: EngineMode) -> &'static str {
    match mode {
        EngineMode::Legacy => "0",
        EngineMode::LstmOnly => "1",
        EngineMode::Combined => "2",
    }
}

#[async_trait]
impl OcrBackend for TesseractBackend {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn create_session(
        &self,
        config: &RecognitionConfig,
        events: EventSender,
    ) -> Result<Box<dyn RecognitionSession>, OcrError> {
        config.validate().map_err(OcrError::InvalidConfiguration)?;

        events.emit(EngineEvent::Status("loading recognition engine".to_string()));

        // Engine load check up front: a missing or broken install should
        // fail acquisition, not the first page.
        let probe = Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match probe {
            Ok(status) if status.success() => {}
            Ok(status) => {
                return Err(OcrError::InitializationFailed(format!(
                    "tesseract --version exited with {status}"
                )));
            }
            Err(err) => {
                return Err(OcrError::InitializationFailed(format!(
                    "failed to execute {}: {err}",
                    self.binary.display()
                )));
            }
        }

        debug!(binary = %self.binary.display(), language = %config.language, "tesseract session ready");

        Ok(Box::new(TesseractSession {
            binary: self.binary.clone(),
            config: config.clone(),
            events,
        }))
    }
}

struct TesseractSession {
    binary: PathBuf,
    config: RecognitionConfig,
    events: EventSender,
}

#[async_trait]
impl RecognitionSession for TesseractSession {
    async fn recognize(&mut self, page: &PageImage) -> Result<String, OcrError> {
        self.events
            .emit(EngineEvent::Status("preparing page image".to_string()));

        let scratch = tempfile::tempdir()
            .map_err(|e| OcrError::RecognitionFailed {
                page: None,
                message: format!("failed to create scratch directory: {e}"),
            })?;
        let image_path = scratch.path().join("page.png");
        page.image
            .to_rgb8()
            .save_with_format(&image_path, image::ImageFormat::Png)
            .map_err(|e| OcrError::RecognitionFailed {
                page: None,
                message: format!("failed to encode page image: {e}"),
            })?;

        self.events.emit(EngineEvent::Recognizing { fraction: 0.0 });

        // kill_on_drop ties the child's lifetime to this future: cancelling
        // the recognition call aborts the engine run.
        let output = Command::new(&self.binary)
            .arg(&image_path)
            .arg("stdout")
            .args(["-l", &self.config.language])
            .args(["--oem", oem_flag(self.config.engine_mode)])
            .args(["--psm", &self.config.psm.to_string()])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OcrError::InitializationFailed("tesseract not found (install tesseract-ocr)".to_string())
                } else {
                    OcrError::RecognitionFailed {
                        page: None,
                        message: format!("failed to run tesseract: {e}"),
                    }
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::RecognitionFailed {
                page: None,
                message: format!("tesseract exited with {}: {}", output.status, stderr.trim()),
            });
        }

        self.events.emit(EngineEvent::Recognizing { fraction: 1.0 });

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn terminate(&mut self) -> Result<(), OcrError> {
        // Per-page subprocesses leave nothing resident; termination only
        // marks the session dead for the lifecycle invariants.
        self.events
            .emit(EngineEvent::Status("recognition engine terminated".to_string()));
        Ok(())
    }
}
