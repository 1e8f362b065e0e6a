//! Dynamics compressor
//!
//! Feed-forward compressor with a soft knee centred on the threshold, linked
//! peak detection across channels, and one-pole attack/release smoothing of
//! the applied gain. Makeup gain is a separate stage.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::Effect;
use crate::dsp::params::DenoiseParameters;
use crate::engine::{db_to_linear, linear_to_db};

/// Level floor used in place of -inf for silent samples
const LEVEL_FLOOR_DB: f32 = -120.0;

/// Compressor settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressorSettings {
    /// Threshold level in dB
    pub threshold_db: f32,
    /// Knee width in dB, centred on the threshold (0 = hard knee)
    pub knee_db: f32,
    /// Compression ratio above the knee (12.0 means 12:1)
    pub ratio: f32,
    /// Attack time constant in seconds (0 = instant)
    pub attack_s: f32,
    /// Release time constant in seconds
    pub release_s: f32,
}

impl From<&DenoiseParameters> for CompressorSettings {
    fn from(params: &DenoiseParameters) -> Self {
        Self {
            threshold_db: params.compressor_threshold_db,
            knee_db: params.compressor_knee_db,
            ratio: params.compressor_ratio,
            attack_s: params.compressor_attack_s,
            release_s: params.compressor_release_s,
        }
    }
}

impl CompressorSettings {
    /// Static gain change in dB for an input level in dB (zero or negative)
    ///
    /// Below `threshold - knee/2` the gain is unity, above `threshold + knee/2`
    /// the overshoot is divided by the ratio, and in between a quadratic
    /// curve joins the two segments without a corner.
    pub fn gain_reduction_db(&self, input_db: f32) -> f32 {
        let threshold = self.threshold_db;
        let knee = self.knee_db.max(0.0);
        let slope = 1.0 / self.ratio.max(1.0) - 1.0;
        let overshoot = input_db - threshold;

        if 2.0 * overshoot <= -knee {
            0.0
        } else if knee > 0.0 && 2.0 * overshoot.abs() < knee {
            let into_knee = overshoot + knee / 2.0;
            slope * into_knee * into_knee / (2.0 * knee)
        } else {
            slope * overshoot
        }
    }
}

/// One-pole smoothing coefficient for a time constant
fn time_coeff(seconds: f32, sample_rate: u32) -> f32 {
    let samples = seconds * sample_rate as f32;
    if samples > 0.0 {
        (-1.0 / samples).exp()
    } else {
        0.0
    }
}

/// Compressor dynamics processor
#[derive(Debug, Clone)]
pub struct Compressor {
    settings: CompressorSettings,
    attack_coeff: f32,
    release_coeff: f32,
    /// Currently applied gain (linear, 1.0 = no reduction)
    gain: f32,
}

impl Compressor {
    pub fn new(settings: CompressorSettings, sample_rate: u32) -> Self {
        Self {
            settings,
            attack_coeff: time_coeff(settings.attack_s, sample_rate),
            release_coeff: time_coeff(settings.release_s, sample_rate),
            gain: 1.0,
        }
    }

    pub fn settings(&self) -> &CompressorSettings {
        &self.settings
    }

    /// Current gain reduction in dB, for metering
    pub fn gain_reduction_db(&self) -> f32 {
        linear_to_db(self.gain).max(LEVEL_FLOOR_DB)
    }
}

impl Effect for Compressor {
    fn process(&mut self, channels: &mut [Vec<f32>], frames: Range<usize>) {
        for frame in frames {
            // Linked detection: loudest channel drives every channel
            let level = channels
                .iter()
                .map(|ch| ch[frame].abs())
                .fold(0.0_f32, f32::max);
            let level_db = linear_to_db(level).max(LEVEL_FLOOR_DB);

            let target = db_to_linear(self.settings.gain_reduction_db(level_db));
            let coeff = if target < self.gain {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.gain = coeff * self.gain + (1.0 - coeff) * target;

            for channel in channels.iter_mut() {
                channel[frame] *= self.gain;
            }
        }
    }

    fn effect_type(&self) -> &'static str {
        "compressor"
    }
}
