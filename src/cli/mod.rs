//! CLI Module
//!
//! Command-line front end for the noise-reduction session.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quieter - interactive noise reduction for recordings
#[derive(Parser, Debug)]
#[command(name = "quieter-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON config file with tuning overrides
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reduce noise in a recording and write a 16-bit WAV
    #[command(name = "denoise")]
    Denoise {
        /// Input audio file
        input: PathBuf,

        /// Noise region as START:END in seconds
        #[arg(short, long, value_parser = parse_region)]
        region: (f64, f64),

        /// Reduction strength, 0-100 (default from config)
        #[arg(short, long)]
        intensity: Option<f32>,

        /// Output WAV path (default: <input>_denoised.wav)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the chain parameters for an intensity as JSON
    #[command(name = "params")]
    Params {
        /// Reduction strength, 0-100
        intensity: f32,
    },

    /// Show format details and fingerprint of an audio file
    #[command(name = "info")]
    Info {
        /// Input audio file
        input: PathBuf,
    },
}

/// Parse `START:END` into a pair of seconds
pub fn parse_region(value: &str) -> Result<(f64, f64), String> {
    let (start, end) = value
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got '{}'", value))?;
    let start = start
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad region start '{}': {}", start, e))?;
    let end = end
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad region end '{}': {}", end, e))?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_region() {
        assert_eq!(parse_region("1.5:3").unwrap(), (1.5, 3.0));
        assert_eq!(parse_region(" 0 : 0.25 ").unwrap(), (0.0, 0.25));
        assert!(parse_region("1.5").is_err());
        assert!(parse_region("a:b").is_err());
    }

    #[test]
    fn test_parse_denoise_command() {
        let cli = Cli::try_parse_from([
            "quieter-cli",
            "denoise",
            "take1.mp3",
            "--region",
            "0.5:1.25",
            "--intensity",
            "80",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Denoise {
                input,
                region,
                intensity,
                output,
            }) => {
                assert_eq!(input, PathBuf::from("take1.mp3"));
                assert_eq!(region, (0.5, 1.25));
                assert_eq!(intensity, Some(80.0));
                assert!(output.is_none());
            }
            other => panic!("Expected denoise, got {:?}", other),
        }
    }
}
