//! Core orchestration module.
//!
//! Media-type validation, the per-document pipeline, and the
//! one-in-flight session wrapper.

pub mod mime;
pub mod pipeline;
pub mod session;

pub use mime::validate_media_type;
pub use pipeline::{DocumentPipeline, PipelinePhase, ProcessStatus};
pub use session::PipelineSession;
