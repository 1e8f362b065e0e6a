//! Biquad pass filters
//!
//! Second-order resonant high-pass and low-pass sections built from the Audio
//! EQ Cookbook formulas. One filter state per channel.

use std::f64::consts::PI;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::Effect;

/// Lowest cutoff accepted, in Hz
const MIN_CUTOFF_HZ: f64 = 10.0;

/// Which side of the cutoff is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    /// Remove below the cutoff
    HighPass,
    /// Remove above the cutoff
    LowPass,
}

/// Biquad filter coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
/// Normalized: all coefficients divided by a0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Calculate coefficients for a pass filter
    ///
    /// The cutoff is clamped to `[10 Hz, nyquist - 1 Hz]` so the filter stays
    /// stable at low sample rates. Reference:
    /// https://www.w3.org/2011/audio/audio-eq-cookbook.html
    pub fn pass(kind: PassKind, sample_rate: f64, cutoff_hz: f64, q: f64) -> Self {
        let nyquist = sample_rate / 2.0;
        let freq = cutoff_hz.clamp(MIN_CUTOFF_HZ, (nyquist - 1.0).max(MIN_CUTOFF_HZ));
        let q = q.max(0.1);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * q);

        let (b0, b1, b2) = match kind {
            PassKind::LowPass => ((1.0 - cos_w0) / 2.0, 1.0 - cos_w0, (1.0 - cos_w0) / 2.0),
            PassKind::HighPass => ((1.0 + cos_w0) / 2.0, -(1.0 + cos_w0), (1.0 + cos_w0) / 2.0),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        BiquadCoeffs {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Magnitude response at a frequency, for inspection and tests
    pub fn magnitude_at(&self, sample_rate: f64, frequency: f64) -> f64 {
        let w = 2.0 * PI * frequency / sample_rate;
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        (num_re.hypot(num_im)) / (den_re.hypot(den_im))
    }
}

/// Biquad filter state for one channel
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64, // x[n-1]
    x2: f64, // x[n-2]
    y1: f64, // y[n-1]
    y2: f64, // y[n-2]
}

impl BiquadState {
    /// Direct Form I
    #[inline]
    fn process(&mut self, input: f64, coeffs: &BiquadCoeffs) -> f64 {
        let output = coeffs.b0 * input + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// A high-pass or low-pass biquad over every channel
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    kind: PassKind,
    coeffs: BiquadCoeffs,
    states: Vec<BiquadState>,
}

impl BiquadFilter {
    pub fn new(kind: PassKind, sample_rate: u32, cutoff_hz: f32, q: f32, num_channels: usize) -> Self {
        Self {
            kind,
            coeffs: BiquadCoeffs::pass(kind, sample_rate as f64, cutoff_hz as f64, q as f64),
            states: vec![BiquadState::default(); num_channels],
        }
    }

    pub fn kind(&self) -> PassKind {
        self.kind
    }

    pub fn coeffs(&self) -> &BiquadCoeffs {
        &self.coeffs
    }
}

impl Effect for BiquadFilter {
    fn process(&mut self, channels: &mut [Vec<f32>], frames: Range<usize>) {
        if self.states.len() < channels.len() {
            self.states.resize(channels.len(), BiquadState::default());
        }

        for (channel, state) in channels.iter_mut().zip(self.states.iter_mut()) {
            for sample in &mut channel[frames.clone()] {
                *sample = state.process(*sample as f64, &self.coeffs) as f32;
            }
        }
    }

    fn effect_type(&self) -> &'static str {
        match self.kind {
            PassKind::HighPass => "highpass",
            PassKind::LowPass => "lowpass",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{calculate_rms, generate_test_tone};

    fn rms_after(kind: PassKind, cutoff: f32, tone_hz: f32) -> f32 {
        let tone = generate_test_tone(tone_hz, 1.0, 48000, 1).unwrap();
        let mut channels = tone.into_channels();
        let len = channels[0].len();
        let mut filter = BiquadFilter::new(kind, 48000, cutoff, 1.0, 1);
        filter.process(&mut channels, 0..len);

        // Skip the transient
        let settled = crate::engine::PcmBuffer::new(vec![channels[0][4800..].to_vec()], 48000).unwrap();
        calculate_rms(&settled)
    }

    #[test]
    fn test_lowpass_passes_low_and_cuts_high() {
        let low = rms_after(PassKind::LowPass, 2000.0, 200.0);
        let high = rms_after(PassKind::LowPass, 2000.0, 12000.0);
        assert!((low - (-3.01)).abs() < 0.5, "low tone rms {}", low);
        assert!(high < -25.0, "high tone rms {}", high);
    }

    #[test]
    fn test_highpass_cuts_rumble() {
        let rumble = rms_after(PassKind::HighPass, 220.0, 20.0);
        let voice = rms_after(PassKind::HighPass, 220.0, 3000.0);
        assert!(rumble < -30.0, "rumble rms {}", rumble);
        assert!((voice - (-3.01)).abs() < 0.5, "voice rms {}", voice);
    }

    #[test]
    fn test_q_one_magnitude_at_cutoff() {
        // A cookbook pass filter has |H| = Q at the cutoff
        let coeffs = BiquadCoeffs::pass(PassKind::LowPass, 48000.0, 1000.0, 1.0);
        assert!((coeffs.magnitude_at(48000.0, 1000.0) - 1.0).abs() < 1e-6);
        let coeffs = BiquadCoeffs::pass(PassKind::HighPass, 48000.0, 1000.0, 1.0);
        assert!((coeffs.magnitude_at(48000.0, 1000.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cutoff_clamped_below_nyquist() {
        // 7 kHz at 8 kHz sample rate would alias; stays stable
        let coeffs = BiquadCoeffs::pass(PassKind::LowPass, 8000.0, 7000.0, 1.0);
        assert!(coeffs.b0.is_finite() && coeffs.a1.is_finite() && coeffs.a2.abs() < 1.0);
    }

    #[test]
    fn test_block_processing_matches_single_pass() {
        let tone = generate_test_tone(440.0, 0.1, 48000, 2).unwrap();
        let mut whole = tone.clone().into_channels();
        let mut blocks = tone.into_channels();
        let len = whole[0].len();

        let mut a = BiquadFilter::new(PassKind::HighPass, 48000, 120.0, 1.0, 2);
        a.process(&mut whole, 0..len);

        let mut b = BiquadFilter::new(PassKind::HighPass, 48000, 120.0, 1.0, 2);
        let mut start = 0;
        while start < len {
            let end = (start + 333).min(len);
            b.process(&mut blocks, start..end);
            start = end;
        }

        assert_eq!(whole, blocks);
    }
}
