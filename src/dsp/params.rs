//! Noise-reduction parameter mapper
//!
//! Maps the single intensity knob (0..=100) onto the concrete settings of the
//! denoise chain. Every coefficient is a tunable in [`DenoiseTuning`]; the
//! defaults are the fixed values the pipeline has always shipped with:
//!
//! | parameter             | formula                      |
//! |-----------------------|------------------------------|
//! | compressor threshold  | `-50 - intensity * 0.2` dB   |
//! | knee / ratio          | 40 dB / 12:1                 |
//! | attack / release      | 0 s / 0.25 s                 |
//! | low-pass cutoff       | `7000 - intensity * 50` Hz   |
//! | high-pass cutoff      | `20 + intensity * 2` Hz      |
//! | makeup gain           | `1 + intensity * 0.005`      |

use serde::{Deserialize, Serialize};

/// Lowest accepted intensity
pub const MIN_INTENSITY: f32 = 0.0;

/// Highest accepted intensity
pub const MAX_INTENSITY: f32 = 100.0;

/// Concrete settings for one render of the denoise chain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DenoiseParameters {
    pub compressor_threshold_db: f32,
    pub compressor_knee_db: f32,
    pub compressor_ratio: f32,
    pub compressor_attack_s: f32,
    pub compressor_release_s: f32,
    pub lowpass_hz: f32,
    pub highpass_hz: f32,
    /// Q shared by both pass filters
    pub filter_q: f32,
    pub makeup_gain_linear: f32,
}

impl DenoiseParameters {
    /// Map an intensity with the default tuning
    ///
    /// # Example
    /// ```
    /// use quieter::dsp::DenoiseParameters;
    ///
    /// let params = DenoiseParameters::from_intensity(0.0);
    /// assert_eq!(params.lowpass_hz, 7000.0);
    /// assert_eq!(params.highpass_hz, 20.0);
    /// ```
    pub fn from_intensity(intensity: f32) -> Self {
        DenoiseTuning::default().map(intensity)
    }
}

/// Coefficients of the intensity mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseTuning {
    pub threshold_base_db: f32,
    pub threshold_per_step_db: f32,
    pub knee_db: f32,
    pub ratio: f32,
    pub attack_s: f32,
    pub release_s: f32,
    pub lowpass_base_hz: f32,
    pub lowpass_per_step_hz: f32,
    pub highpass_base_hz: f32,
    pub highpass_per_step_hz: f32,
    pub gain_base: f32,
    pub gain_per_step: f32,
    pub filter_q: f32,
}

impl Default for DenoiseTuning {
    fn default() -> Self {
        Self {
            threshold_base_db: -50.0,
            threshold_per_step_db: -0.2,
            knee_db: 40.0,
            ratio: 12.0,
            attack_s: 0.0,
            release_s: 0.25,
            lowpass_base_hz: 7000.0,
            lowpass_per_step_hz: -50.0,
            highpass_base_hz: 20.0,
            highpass_per_step_hz: 2.0,
            gain_base: 1.0,
            gain_per_step: 0.005,
            filter_q: 1.0,
        }
    }
}

impl DenoiseTuning {
    /// Map an intensity onto chain parameters
    ///
    /// Total: out-of-range input is clamped to `[0, 100]` and NaN reads as 0.
    pub fn map(&self, intensity: f32) -> DenoiseParameters {
        let i = clamp_intensity(intensity);

        DenoiseParameters {
            compressor_threshold_db: self.threshold_base_db + i * self.threshold_per_step_db,
            compressor_knee_db: self.knee_db,
            compressor_ratio: self.ratio,
            compressor_attack_s: self.attack_s,
            compressor_release_s: self.release_s,
            lowpass_hz: self.lowpass_base_hz + i * self.lowpass_per_step_hz,
            highpass_hz: self.highpass_base_hz + i * self.highpass_per_step_hz,
            filter_q: self.filter_q,
            makeup_gain_linear: self.gain_base + i * self.gain_per_step,
        }
    }
}

/// Map an intensity with the default tuning
pub fn map(intensity: f32) -> DenoiseParameters {
    DenoiseParameters::from_intensity(intensity)
}

/// Clamp an intensity to the knob's range
pub fn clamp_intensity(intensity: f32) -> f32 {
    if intensity.is_nan() {
        MIN_INTENSITY
    } else {
        intensity.clamp(MIN_INTENSITY, MAX_INTENSITY)
    }
}
