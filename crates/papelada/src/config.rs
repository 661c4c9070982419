//! Pipeline configuration loading.
//!
//! All tunables are passed explicitly into the pipeline rather than read
//! from process-wide state: language, render scale, and the render reserve
//! were hard-coded in the original application and are config here (the
//! originals remain the defaults).

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ocr::types::RecognitionConfig;
use crate::pdf::rasterize::DEFAULT_RENDER_SCALE;

/// Configuration for one document pipeline.
///
/// Can be loaded from a TOML file or created programmatically.
///
/// # Example
///
/// ```rust
/// use papelada::config::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.recognition.language, "por");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Recognition worker configuration.
    #[serde(default)]
    pub recognition: RecognitionConfig,

    /// Oversampling scale for PDF page rasterization.
    #[serde(default = "default_render_scale")]
    pub render_scale: f32,

    /// Fraction of each page's progress budget granted when the page
    /// finishes rendering, before recognition starts. A guessed constant
    /// in the original, carried as tuning rather than invariant.
    #[serde(default = "default_render_reserve")]
    pub render_reserve: f32,
}

fn default_render_scale() -> f32 {
    DEFAULT_RENDER_SCALE
}

fn default_render_reserve() -> f32 {
    0.1
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            recognition: RecognitionConfig::default(),
            render_scale: default_render_scale(),
            render_reserve: default_render_reserve(),
        }
    }
}

impl PipelineConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.recognition.validate().map_err(ConfigError::Invalid)?;
        if !self.render_scale.is_finite() || self.render_scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "render_scale must be positive, got {}",
                self.render_scale
            )));
        }
        if !self.render_reserve.is_finite() || !(0.0..1.0).contains(&self.render_reserve) {
            return Err(ConfigError::Invalid(format!(
                "render_reserve must be within [0, 1), got {}",
                self.render_reserve
            )));
        }
        Ok(())
    }

    /// Load and validate configuration from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration loading errors.
#[derive(Debug, Clone)]
pub enum ConfigError {
    Io(String),
    ParseFailed(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Failed to read config: {}", msg),
            ConfigError::ParseFailed(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
