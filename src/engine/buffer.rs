//! PCM Buffer
//!
//! Immutable decoded audio: planar 32-bit float channels plus a sample rate.
//! Every other component consumes or produces this type. A buffer is never
//! mutated after construction; reprocessing produces a new one.

use crate::error::{QuieterError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Calculate the RMS level of a buffer in dB
///
/// Returns -f32::INFINITY for empty or silent buffers.
pub fn calculate_rms(buffer: &PcmBuffer) -> f32 {
    let total_samples = buffer.num_channels() * buffer.frame_count();
    if total_samples == 0 {
        return f32::NEG_INFINITY;
    }

    let sum_squares: f64 = buffer
        .channels
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| (s as f64) * (s as f64))
        .sum();

    let rms = (sum_squares / total_samples as f64).sqrt() as f32;
    linear_to_db(rms)
}

/// Calculate the peak level of a buffer in dB
pub fn calculate_peak(buffer: &PcmBuffer) -> f32 {
    let peak = buffer
        .channels
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| s.abs())
        .fold(0.0_f32, f32::max);

    linear_to_db(peak)
}

/// Check that a set of planar channels forms a well-shaped buffer
///
/// Used by the buffer constructor and by the WAV encoder's raw entry point.
pub(crate) fn check_channels(channels: &[Vec<f32>]) -> Result<usize> {
    let first = channels.first().ok_or_else(|| QuieterError::MalformedBuffer {
        reason: "buffer has no channels".to_string(),
    })?;
    let frame_count = first.len();

    if let Some((index, channel)) = channels
        .iter()
        .enumerate()
        .find(|(_, ch)| ch.len() != frame_count)
    {
        return Err(QuieterError::MalformedBuffer {
            reason: format!(
                "channel {} has {} frames, expected {}",
                index,
                channel.len(),
                frame_count
            ),
        });
    }

    Ok(frame_count)
}

// ============================================================================
// PCM Buffer
// ============================================================================

/// Decoded multi-channel audio
///
/// Stores audio as non-interleaved 32-bit floating point samples, nominally in
/// `[-1, 1]`. Invariants enforced at construction:
/// - at least one channel
/// - every channel holds exactly `frame_count()` samples
/// - a positive sample rate
///
/// # Example
/// ```
/// use quieter::engine::PcmBuffer;
///
/// let buffer = PcmBuffer::silence(2, 44100, 44100).unwrap();
/// assert_eq!(buffer.num_channels(), 2);
/// assert_eq!(buffer.frame_count(), 44100);
/// assert_eq!(buffer.duration_secs(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl PcmBuffer {
    /// Create a buffer from planar channel data
    ///
    /// # Errors
    /// `MalformedBuffer` if there are no channels, channel lengths differ,
    /// or the sample rate is zero.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        check_channels(&channels)?;
        if sample_rate == 0 {
            return Err(QuieterError::MalformedBuffer {
                reason: "sample rate must be positive".to_string(),
            });
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Create a buffer of silence
    pub fn silence(num_channels: usize, frame_count: usize, sample_rate: u32) -> Result<Self> {
        Self::new(vec![vec![0.0; frame_count]; num_channels], sample_rate)
    }

    /// Create a buffer from interleaved sample data (L, R, L, R, ... for stereo)
    pub fn from_interleaved(interleaved: &[f32], num_channels: usize, sample_rate: u32) -> Result<Self> {
        if num_channels == 0 {
            return Err(QuieterError::MalformedBuffer {
                reason: "buffer has no channels".to_string(),
            });
        }

        if interleaved.len() % num_channels != 0 {
            return Err(QuieterError::MalformedBuffer {
                reason: format!(
                    "interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
            });
        }

        let frames = interleaved.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(frames); num_channels];
        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                channels[ch].push(sample);
            }
        }

        Self::new(channels, sample_rate)
    }

    /// Number of channels
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.channels.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    /// Duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Samples of one channel, or None if out of range
    #[inline]
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(|ch| ch.as_slice())
    }

    /// All channels in order
    #[inline]
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Consume the buffer and hand back its channel storage
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }
}

/// Generate a sine tone on every channel
///
/// Useful for exercising the render chain without a decoded file.
pub fn generate_test_tone(
    frequency: f32,
    duration_secs: f32,
    sample_rate: u32,
    num_channels: usize,
) -> Result<PcmBuffer> {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
    let tone: Vec<f32> = (0..num_samples)
        .map(|i| (angular_freq * i as f32).sin())
        .collect();

    PcmBuffer::new(vec![tone; num_channels], sample_rate)
}

// ============================================================================
// Tests
// ============================================================================
