//! Recognition configuration and engine event types.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Engine mode the recognition backend runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    /// Neural-net LSTM recognition only. The default, and what the
    /// document-assistant always used.
    LstmOnly,
    /// Legacy character-classifier recognition.
    Legacy,
    /// Both engines combined.
    Combined,
}

impl Default for EngineMode {
    fn default() -> Self {
        EngineMode::LstmOnly
    }
}

/// Configuration for the recognition worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// ISO 639-2 language code. Defaults to Portuguese.
    #[serde(default = "default_language")]
    pub language: String,

    /// Recognition engine mode.
    #[serde(default)]
    pub engine_mode: EngineMode,

    /// Page segmentation mode hint (0-13, Tesseract numbering).
    #[serde(default = "default_psm")]
    pub psm: u8,
}

fn default_language() -> String {
    "por".to_string()
}

fn default_psm() -> u8 {
    3
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            engine_mode: EngineMode::default(),
            psm: default_psm(),
        }
    }
}

impl RecognitionConfig {
    /// Validate configuration values before a worker is created.
    pub fn validate(&self) -> Result<(), String> {
        if self.language.trim().is_empty() {
            return Err("language cannot be empty".to_string());
        }
        if self
            .language
            .chars()
            .any(|c| !c.is_ascii_alphanumeric() && c != '+' && c != '_')
        {
            return Err(format!("invalid language code: '{}'", self.language));
        }
        if self.psm > 13 {
            return Err(format!("page segmentation mode out of range: {}", self.psm));
        }
        Ok(())
    }
}

/// Lifecycle state of a recognition worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Uninitialized,
    Ready,
    Busy,
    Terminated,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Uninitialized => "uninitialized",
            WorkerState::Ready => "ready",
            WorkerState::Busy => "busy",
            WorkerState::Terminated => "terminated",
        }
    }

    /// Whether the worker currently holds live engine resources.
    pub fn is_live(&self) -> bool {
        matches!(self, WorkerState::Ready | WorkerState::Busy)
    }
}

/// One event reported by the recognition engine while a worker is alive.
///
/// Backends hand these to the [`EngineEventSink`] registered at acquire
/// time; the progress aggregator is the only consumer in this crate. This
/// explicit, structured route replaces the original design's shared mutable
/// progress cell updated from inside a logger callback.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A lifecycle status message ("loading model", ...), surfaced verbatim.
    Status(String),
    /// Recognition progress within the current page, 0.0..=1.0.
    Recognizing { fraction: f32 },
}

/// Observer for engine events.
///
/// Called synchronously from the backend, so events arrive in emission
/// order; implementations must be cheap and non-blocking.
pub trait EngineEventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Shared handle to the event observer registered for one operation.
pub type EventSender = Arc<dyn EngineEventSink>;

/// Sink that discards engine events; for backends probed outside a
/// pipeline operation and for tests.
pub struct NullEvents;

impl EngineEventSink for NullEvents {
    fn emit(&self, _event: EngineEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_portuguese_lstm() {
        let config = RecognitionConfig::default();
        assert_eq!(config.language, "por");
        assert_eq!(config.engine_mode, EngineMode::LstmOnly);
        assert_eq!(config.psm, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_language() {
        let config = RecognitionConfig {
            language: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_path_like_language() {
        let config = RecognitionConfig {
            language: "../eng".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_combined_languages() {
        let config = RecognitionConfig {
            language: "por+eng".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_psm_out_of_range() {
        let config = RecognitionConfig {
            psm: 14,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_worker_state_liveness() {
        assert!(WorkerState::Ready.is_live());
        assert!(WorkerState::Busy.is_live());
        assert!(!WorkerState::Uninitialized.is_live());
        assert!(!WorkerState::Terminated.is_live());
    }

    #[test]
    fn test_event_sink_preserves_emission_order() {
        use parking_lot::Mutex;

        #[derive(Default)]
        struct Collecting(Mutex<Vec<EngineEvent>>);

        impl EngineEventSink for Collecting {
            fn emit(&self, event: EngineEvent) {
                self.0.lock().push(event);
            }
        }

        let sink = Collecting::default();
        sink.emit(EngineEvent::Status("loading model".to_string()));
        sink.emit(EngineEvent::Recognizing { fraction: 0.5 });

        let events = sink.0.lock();
        assert_eq!(events[0], EngineEvent::Status("loading model".to_string()));
        assert_eq!(events[1], EngineEvent::Recognizing { fraction: 0.5 });
    }

    #[test]
    fn test_null_events_discards() {
        NullEvents.emit(EngineEvent::Recognizing { fraction: 1.0 });
    }
}
