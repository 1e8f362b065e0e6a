//! Quieter - Interactive Noise Reduction
//!
//! Decode a recording, mark a noise region, render the whole buffer through a
//! fixed denoise chain driven by one intensity knob, and swap the live audio
//! for the 16-bit WAV result.
//!
//! # Architecture
//!
//! - `engine`: PCM buffer, decoding, WAV encoding, playback transport
//! - `dsp`: intensity mapping and the filter/compressor/gain stages
//! - `render`: offline render with capped progress reporting
//! - `session`: the state machine that owns the live buffer

pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod render;
pub mod session;

pub use config::Config;
pub use error::{ErrorKind, QuieterError, Result};
pub use session::{Session, SessionSnapshot, SessionState};
