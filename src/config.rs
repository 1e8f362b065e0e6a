//! Configuration
//!
//! Tunables for the intensity mapping and the render loop, loadable from a
//! JSON file. Every field has a default, so an empty object is a valid config.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dsp::params::{DenoiseTuning, MAX_INTENSITY, MIN_INTENSITY};
use crate::error::{QuieterError, Result};
use crate::render::progress::DEFAULT_PROGRESS_CAP;

/// Intensity the knob starts at
pub const DEFAULT_INTENSITY: f32 = 50.0;

/// Frames processed between progress reports
pub const DEFAULT_BLOCK_FRAMES: usize = 4096;

/// Render loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Frames processed per block; progress is reported once per block
    pub block_frames: usize,
    /// Ceiling of the progress estimate before completion
    pub progress_cap: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            block_frames: DEFAULT_BLOCK_FRAMES,
            progress_cap: DEFAULT_PROGRESS_CAP,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tuning: DenoiseTuning,
    pub render: RenderConfig,
    pub default_intensity: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tuning: DenoiseTuning::default(),
            render: RenderConfig::default(),
            default_intensity: DEFAULT_INTENSITY,
        }
    }
}

impl Config {
    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a JSON config
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.render.block_frames == 0 {
            return Err(QuieterError::Config {
                reason: "render.block_frames must be at least 1".to_string(),
            });
        }
        if self.render.progress_cap >= 100 {
            return Err(QuieterError::Config {
                reason: format!(
                    "render.progress_cap must be below 100, got {}",
                    self.render.progress_cap
                ),
            });
        }
        if !(MIN_INTENSITY..=MAX_INTENSITY).contains(&self.default_intensity) {
            return Err(QuieterError::Config {
                reason: format!(
                    "default_intensity must be within 0..=100, got {}",
                    self.default_intensity
                ),
            });
        }
        if !(self.tuning.filter_q > 0.0) {
            return Err(QuieterError::Config {
                reason: format!("tuning.filter_q must be positive, got {}", self.tuning.filter_q),
            });
        }
        if !(self.tuning.ratio >= 1.0) {
            return Err(QuieterError::Config {
                reason: format!("tuning.ratio must be at least 1, got {}", self.tuning.ratio),
            });
        }
        if self.tuning.attack_s < 0.0 || self.tuning.release_s < 0.0 {
            return Err(QuieterError::Config {
                reason: "tuning attack/release times must not be negative".to_string(),
            });
        }
        Ok(())
    }
}
