//! Stage list and effect chain
//!
//! The denoise graph is a fixed, ordered list of [`Stage`] descriptors:
//!
//! 1. High-pass (remove rumble)
//! 2. Low-pass (remove hiss)
//! 3. Compressor
//! 4. Makeup gain
//!
//! A render turns the list into an [`EffectChain`] of fresh processors and
//! pushes the whole buffer through it in order. Nothing is connected or torn
//! down by hand; dropping the chain releases every stage.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::biquad::{BiquadFilter, PassKind};
use super::compressor::{Compressor, CompressorSettings};
use super::gain::Gain;
use super::params::DenoiseParameters;
use super::Effect;

/// Descriptor of one processing stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stage {
    HighPass { cutoff_hz: f32, q: f32 },
    LowPass { cutoff_hz: f32, q: f32 },
    Compressor(CompressorSettings),
    Gain { linear: f32 },
}

impl Stage {
    /// Instantiate the processor for this stage
    pub fn build(&self, sample_rate: u32, num_channels: usize) -> Box<dyn Effect> {
        match *self {
            Stage::HighPass { cutoff_hz, q } => Box::new(BiquadFilter::new(
                PassKind::HighPass,
                sample_rate,
                cutoff_hz,
                q,
                num_channels,
            )),
            Stage::LowPass { cutoff_hz, q } => Box::new(BiquadFilter::new(
                PassKind::LowPass,
                sample_rate,
                cutoff_hz,
                q,
                num_channels,
            )),
            Stage::Compressor(settings) => Box::new(Compressor::new(settings, sample_rate)),
            Stage::Gain { linear } => Box::new(Gain::new(linear)),
        }
    }

    /// Stage type identifier, matching the built effect's `effect_type`
    pub fn name(&self) -> &'static str {
        match self {
            Stage::HighPass { .. } => "highpass",
            Stage::LowPass { .. } => "lowpass",
            Stage::Compressor(_) => "compressor",
            Stage::Gain { .. } => "gain",
        }
    }
}

/// The fixed denoise topology for a set of parameters
pub fn denoise_stages(params: &DenoiseParameters) -> Vec<Stage> {
    vec![
        Stage::HighPass {
            cutoff_hz: params.highpass_hz,
            q: params.filter_q,
        },
        Stage::LowPass {
            cutoff_hz: params.lowpass_hz,
            q: params.filter_q,
        },
        Stage::Compressor(CompressorSettings::from(params)),
        Stage::Gain {
            linear: params.makeup_gain_linear,
        },
    ]
}

/// Chain of effects for processing
pub struct EffectChain {
    effects: Vec<Box<dyn Effect>>,
}

impl EffectChain {
    /// Build fresh processors for every stage, in order
    pub fn from_stages(stages: &[Stage], sample_rate: u32, num_channels: usize) -> Self {
        Self {
            effects: stages
                .iter()
                .map(|stage| stage.build(sample_rate, num_channels))
                .collect(),
        }
    }

    /// Run a frame range through every effect, in chain order
    pub fn process(&mut self, channels: &mut [Vec<f32>], frames: Range<usize>) {
        for effect in &mut self.effects {
            effect.process(channels, frames.clone());
        }
    }

    /// Get the number of effects in the chain
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Effect type identifiers, in processing order
    pub fn effect_types(&self) -> Vec<&'static str> {
        self.effects.iter().map(|e| e.effect_type()).collect()
    }
}
