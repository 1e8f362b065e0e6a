//! DSP Library
//!
//! Signal processing for the denoise chain. All processors implement the
//! `Effect` trait; the chain itself is described by an ordered `Stage` list.

mod biquad;
mod chain;
mod compressor;
mod effect;
mod gain;
pub mod params;

pub use biquad::{BiquadCoeffs, BiquadFilter, PassKind};
pub use chain::{denoise_stages, EffectChain, Stage};
pub use compressor::{Compressor, CompressorSettings};
pub use effect::Effect;
pub use gain::Gain;
pub use params::{map, DenoiseParameters, DenoiseTuning};
