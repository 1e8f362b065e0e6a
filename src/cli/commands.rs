//! CLI Command Implementations
//!
//! Each command drives the same [`Session`] a UI shell would.

use std::path::{Path, PathBuf};

use log::info;
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::engine::{decode_file, write_wav};
use crate::error::Result;
use crate::session::{format_time, Session};

/// Default output path: `<stem>_denoised.wav` next to the input
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    input.with_file_name(format!("{}_denoised.wav", stem))
}

/// Load, mark the region, render and write the result.
pub async fn denoise(
    config: Config,
    input: &Path,
    region: (f64, f64),
    intensity: Option<f32>,
    output: Option<&Path>,
) -> Result<PathBuf> {
    let session = Session::new(config);
    session.load_file(input).await?;

    let duration = session.duration()?;
    println!("Loaded: {} ({})", input.display(), format_time(duration));

    let region = session.select_region(region.0, region.1)?;
    println!(
        "Noise region: {} - {}",
        format_time(region.start()),
        format_time(region.end())
    );

    if let Some(value) = intensity {
        session.set_intensity(value)?;
    }
    println!("Intensity: {:.0}", session.intensity()?);

    session
        .render(|percent| info!("Processing... {}%", percent))
        .await?;

    let out_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input));

    match session.processed_wav()? {
        Some(bytes) => std::fs::write(&out_path, bytes.as_slice())?,
        None => {
            if let Some(buffer) = session.buffer()? {
                write_wav(&buffer, &out_path)?;
            }
        }
    }

    println!("Wrote: {}", out_path.display());
    Ok(out_path)
}

/// Print the mapped chain parameters as JSON.
pub fn params(config: &Config, intensity: f32) -> Result<()> {
    let params = config.tuning.map(intensity);
    println!("{}", serde_json::to_string_pretty(&params)?);
    Ok(())
}

/// Print format details of an audio file.
pub fn info(input: &Path) -> Result<()> {
    let bytes = std::fs::read(input)?;
    let fingerprint = format!("{:x}", Sha256::digest(&bytes));
    let buffer = decode_file(input)?;

    println!("File:        {}", input.display());
    println!("Channels:    {}", buffer.num_channels());
    println!("Sample rate: {} Hz", buffer.sample_rate());
    println!("Frames:      {}", buffer.frame_count());
    println!("Duration:    {}", format_time(buffer.duration_secs()));
    println!("SHA-256:     {}", fingerprint);

    Ok(())
}
