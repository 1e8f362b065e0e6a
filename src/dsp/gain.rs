//! Gain Effect
//!
//! Fixed linear gain, applied last in the denoise chain to restore the
//! loudness the compressor takes away.

use std::ops::Range;

use super::Effect;
use crate::engine::linear_to_db;

/// Fixed linear gain stage
#[derive(Debug, Clone)]
pub struct Gain {
    gain_linear: f32,
}

impl Gain {
    /// Create a gain stage from a linear multiplier
    ///
    /// Negative or non-finite values fall back to unity.
    pub fn new(gain_linear: f32) -> Self {
        let gain_linear = if gain_linear.is_finite() && gain_linear >= 0.0 {
            gain_linear
        } else {
            1.0
        };
        Self { gain_linear }
    }

    pub fn gain_linear(&self) -> f32 {
        self.gain_linear
    }

    /// Current gain in decibels (for display)
    pub fn gain_db(&self) -> f32 {
        linear_to_db(self.gain_linear)
    }
}

impl Default for Gain {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Effect for Gain {
    fn process(&mut self, channels: &mut [Vec<f32>], frames: Range<usize>) {
        // Unity gain optimization
        if (self.gain_linear - 1.0).abs() < f32::EPSILON {
            return;
        }

        for channel in channels.iter_mut() {
            for sample in &mut channel[frames.clone()] {
                *sample *= self.gain_linear;
            }
        }
    }

    fn effect_type(&self) -> &'static str {
        "gain"
    }
}
