//! Audio Engine Module
//!
//! Core audio plumbing:
//! - PCM buffer type
//! - Decoding and WAV file output
//! - 16-bit WAV encoder
//! - Playback transport

pub mod buffer;
pub mod io;
pub mod transport;
pub mod wav;

pub use buffer::{calculate_peak, calculate_rms, db_to_linear, generate_test_tone, linear_to_db, PcmBuffer};
pub use io::{decode_bytes, decode_file, write_wav};
pub use transport::{Transport, TransportState};
