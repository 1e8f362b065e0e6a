//! WAV Encoder
//!
//! Serializes a PCM buffer into a canonical 16-bit linear-PCM RIFF/WAVE byte
//! stream: a fixed 44-byte header followed by interleaved little-endian
//! samples, frame-major and channel-minor.

use crate::engine::buffer::{check_channels, PcmBuffer};
use crate::error::{QuieterError, Result};

/// Size of the canonical RIFF/WAVE header in bytes
pub const HEADER_LEN: usize = 44;

/// Output bit depth
pub const BITS_PER_SAMPLE: u16 = 16;

/// WAVE_FORMAT_PCM
const FORMAT_PCM: u16 = 1;

const BYTES_PER_SAMPLE: usize = (BITS_PER_SAMPLE / 8) as usize;

/// Fields of the canonical 44-byte header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub num_channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// Length of the `data` payload in bytes
    pub data_len: u32,
}

impl WavHeader {
    /// Header for a 16-bit payload of `frame_count` frames
    pub fn new(num_channels: usize, sample_rate: u32, frame_count: usize) -> Result<Self> {
        let num_channels = u16::try_from(num_channels).map_err(|_| QuieterError::MalformedBuffer {
            reason: format!("{} channels exceed the WAV channel field", num_channels),
        })?;

        let data_len = frame_count
            .checked_mul(num_channels as usize * BYTES_PER_SAMPLE)
            .and_then(|len| u32::try_from(len).ok())
            .filter(|len| len.checked_add(36).is_some())
            .ok_or_else(|| QuieterError::MalformedBuffer {
                reason: format!("{} frames exceed the WAV size limit", frame_count),
            })?;

        Ok(Self {
            num_channels,
            sample_rate,
            bits_per_sample: BITS_PER_SAMPLE,
            data_len,
        })
    }

    /// Bytes per frame (all channels)
    pub fn block_align(&self) -> u16 {
        self.num_channels * (self.bits_per_sample / 8)
    }

    /// Bytes per second of audio
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }

    /// The RIFF `ChunkSize` field: everything after the first 8 bytes
    pub fn chunk_size(&self) -> u32 {
        36 + self.data_len
    }

    /// Append the 44 header bytes to `out`
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&self.chunk_size().to_le_bytes());
        out.extend_from_slice(b"WAVE");

        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
        out.extend_from_slice(&self.num_channels.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&self.byte_rate().to_le_bytes());
        out.extend_from_slice(&self.block_align().to_le_bytes());
        out.extend_from_slice(&self.bits_per_sample.to_le_bytes());

        out.extend_from_slice(b"data");
        out.extend_from_slice(&self.data_len.to_le_bytes());
    }
}

/// Quantize one float sample to signed 16-bit
///
/// Clamps to `[-1, 1]`, scales negatives by 32768 and non-negatives by 32767,
/// then rounds to nearest so both rails map onto the full i16 range.
#[inline]
pub fn quantize(sample: f32) -> i16 {
    let clamped = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    let scaled = if clamped < 0.0 {
        clamped * 32768.0
    } else {
        clamped * 32767.0
    };
    scaled.round() as i16
}

/// Encode a buffer as a 16-bit PCM WAV byte stream
///
/// # Example
/// ```
/// use quieter::engine::{wav, PcmBuffer};
///
/// let buffer = PcmBuffer::silence(2, 88200, 44100).unwrap();
/// let bytes = wav::encode(&buffer).unwrap();
/// assert_eq!(bytes.len(), 352_844);
/// ```
pub fn encode(buffer: &PcmBuffer) -> Result<Vec<u8>> {
    encode_channels(buffer.channels(), buffer.sample_rate())
}

/// Encode raw planar channels
///
/// # Errors
/// `MalformedBuffer` if the channels differ in length, there are none, or the
/// payload does not fit the 32-bit RIFF size fields.
pub fn encode_channels(channels: &[Vec<f32>], sample_rate: u32) -> Result<Vec<u8>> {
    let frame_count = check_channels(channels)?;
    let header = WavHeader::new(channels.len(), sample_rate, frame_count)?;

    let mut out = Vec::with_capacity(HEADER_LEN + header.data_len as usize);
    header.write_to(&mut out);

    for frame in 0..frame_count {
        for channel in channels {
            out.extend_from_slice(&quantize(channel[frame]).to_le_bytes());
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    #[test]
    fn test_quantize_rails() {
        assert_eq!(quantize(1.0), 32767);
        assert_eq!(quantize(-1.0), -32768);
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(2.5), 32767);
        assert_eq!(quantize(-7.0), -32768);
        assert_eq!(quantize(f32::NAN), 0);
    }

    #[test]
    fn test_quantize_rounds_to_nearest() {
        // 0.5 * 32767 = 16383.5 rounds away from zero
        assert_eq!(quantize(0.5), 16384);
        assert_eq!(quantize(-0.5), -16384);
        assert_eq!(quantize(1.0 / 32767.0 * 0.4), 0);
    }

    #[test]
    fn test_stereo_one_second_header() {
        let buffer = PcmBuffer::silence(2, 88200, 44100).unwrap();
        let bytes = encode(&buffer).unwrap();

        assert_eq!(bytes.len(), 44 + 88200 * 2 * 2);
        assert_eq!(bytes.len(), 352_844);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(&bytes, 4), 352_836);

        assert_eq!(&bytes[8..16], b"WAVEfmt ");
        assert_eq!(u16_at(&bytes, 20), 1);
        assert_eq!(u16_at(&bytes, 22), 2);
        assert_eq!(u32_at(&bytes, 24), 44100);
        assert_eq!(u32_at(&bytes, 28), 176_400);
        assert_eq!(u16_at(&bytes, 32), 4);
        assert_eq!(u16_at(&bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32_at(&bytes, 40), 352_800);
    }

    #[test]
    fn test_samples_are_interleaved_frame_major() {
        let buffer = PcmBuffer::new(vec![vec![1.0, 0.0], vec![-1.0, 0.5]], 8000).unwrap();
        let bytes = encode(&buffer).unwrap();
        let payload: Vec<i16> = bytes[HEADER_LEN..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(payload, vec![32767, -32768, 0, 16384]);
    }

    #[test]
    fn test_mismatched_channels_rejected() {
        let err = encode_channels(&[vec![0.0; 4], vec![0.0; 3]], 8000).unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_BUFFER");
    }

    #[test]
    fn test_empty_buffer_is_header_only() {
        let buffer = PcmBuffer::new(vec![Vec::new()], 22050).unwrap();
        let bytes = encode(&buffer).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(u32_at(&bytes, 4), 36);
        assert_eq!(u32_at(&bytes, 40), 0);
    }

    #[test]
    fn test_hound_reads_encoded_stream() {
        let tone: Vec<f32> = (0..1000).map(|i| ((i as f32) * 0.05).sin() * 0.8).collect();
        let buffer = PcmBuffer::new(vec![tone.clone(), tone.iter().map(|s| -s).collect()], 48000)
            .unwrap();
        let bytes = encode(&buffer).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 48000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.duration(), 1000);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        for (frame, pair) in samples.chunks_exact(2).enumerate() {
            let left = pair[0] as f32 / if pair[0] < 0 { 32768.0 } else { 32767.0 };
            assert!((left - tone[frame]).abs() <= 1.0 / 32768.0);
        }
    }
}
