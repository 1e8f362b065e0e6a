//! Audio file I/O for Quieter
//!
//! Decoding uses symphonia's default registry, so any common container the
//! upload boundary accepts (WAV, MP3, OGG/Vorbis, FLAC, AAC/M4A) lands here as
//! a planar f32 [`PcmBuffer`]. Output is always the 16-bit WAV from
//! [`crate::engine::wav`].

use std::fs;
use std::io::Cursor;
use std::path::Path;

use log::{debug, info};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::engine::buffer::PcmBuffer;
use crate::engine::wav;
use crate::error::{QuieterError, Result};

/// Decode an in-memory audio file
///
/// # Arguments
/// * `bytes` - The complete file contents
/// * `extension` - Optional file extension used as a probe hint ("mp3", "wav", ...)
///
/// # Errors
/// `DecodeFailed` if the container is not recognised, has no audio track,
/// fails mid-stream, or yields no frames.
pub fn decode_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<PcmBuffer> {
    let byte_len = bytes.len();
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| QuieterError::decode("unrecognised audio container", e))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| QuieterError::DecodeFailed {
            reason: "no audio track found".to_string(),
            source: None,
        })?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut num_channels = track.codec_params.channels.map(|c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| QuieterError::decode("unsupported codec", e))?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(QuieterError::decode("failed to read packet", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // Corrupt frames are skipped, the stream may recover
            Err(SymphoniaError::DecodeError(e)) => {
                debug!("skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(QuieterError::decode("decoder error", e)),
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        num_channels.get_or_insert(spec.channels.count());

        let buf = sample_buf
            .get_or_insert_with(|| SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        if buf.capacity() < decoded.capacity() * spec.channels.count() {
            *buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        }
        buf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(buf.samples());
    }

    let (num_channels, sample_rate) = match (num_channels, sample_rate) {
        (Some(ch), Some(sr)) if ch > 0 && sr > 0 => (ch, sr),
        _ => {
            return Err(QuieterError::DecodeFailed {
                reason: "stream does not declare channels and sample rate".to_string(),
                source: None,
            })
        }
    };

    if interleaved.is_empty() {
        return Err(QuieterError::DecodeFailed {
            reason: "no audio frames decoded".to_string(),
            source: None,
        });
    }

    let buffer = PcmBuffer::from_interleaved(&interleaved, num_channels, sample_rate).map_err(
        |e| QuieterError::DecodeFailed {
            reason: format!("decoded stream is ragged: {}", e),
            source: None,
        },
    )?;

    info!(
        "Decoded {} bytes: {} ch, {} Hz, {} frames ({:.3}s)",
        byte_len,
        buffer.num_channels(),
        buffer.sample_rate(),
        buffer.frame_count(),
        buffer.duration_secs()
    );

    Ok(buffer)
}

/// Read and decode an audio file, using its extension as the probe hint
pub fn decode_file(path: &Path) -> Result<PcmBuffer> {
    let bytes = fs::read(path)?;
    let extension = path.extension().and_then(|e| e.to_str());
    decode_bytes(bytes, extension)
}

/// Encode a buffer and write it to disk as a 16-bit WAV
pub fn write_wav(buffer: &PcmBuffer, path: &Path) -> Result<()> {
    let bytes = wav::encode(buffer)?;
    fs::write(path, &bytes)?;
    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
