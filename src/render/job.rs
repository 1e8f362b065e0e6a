//! Render job
//!
//! One render attempt: the source buffer, the parameters it was mapped from,
//! the progress reached so far and, once finished, the outcome. A job runs
//! exactly once and is dropped after the session has taken its result.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use uuid::Uuid;

use super::progress::ProgressEstimator;
use crate::config::RenderConfig;
use crate::dsp::{denoise_stages, DenoiseParameters, EffectChain, Stage};
use crate::engine::PcmBuffer;
use crate::error::{QuieterError, Result};

/// Terminal result of a job
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Success,
    Failure(String),
}

/// A single offline render of a whole buffer
#[derive(Debug)]
pub struct RenderJob {
    id: Uuid,
    source: Arc<PcmBuffer>,
    params: DenoiseParameters,
    progress: ProgressEstimator,
    outcome: Option<RenderOutcome>,
}

impl RenderJob {
    pub fn new(source: Arc<PcmBuffer>, params: DenoiseParameters, progress_cap: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            params,
            progress: ProgressEstimator::new(progress_cap),
            outcome: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn params(&self) -> &DenoiseParameters {
        &self.params
    }

    pub fn source(&self) -> &PcmBuffer {
        &self.source
    }

    /// Progress percentage reached so far
    pub fn progress(&self) -> u8 {
        self.progress.current()
    }

    pub fn outcome(&self) -> Option<&RenderOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Stage list this job pushes the buffer through
    pub fn stages(&self) -> Vec<Stage> {
        denoise_stages(&self.params)
    }

    /// Run the job to completion
    ///
    /// `on_progress` sees a non-decreasing sequence; 100 is only reported when
    /// the returned result is `Ok`.
    ///
    /// # Errors
    /// * `DecodeFailed` - the source buffer is empty or contains non-finite samples
    /// * `RenderFailed` - the parameters are unusable, the chain produced
    ///   non-finite output, or the job already ran
    pub fn run<F>(&mut self, config: &RenderConfig, mut on_progress: F) -> Result<PcmBuffer>
    where
        F: FnMut(u8),
    {
        if self.outcome.is_some() {
            return Err(QuieterError::RenderFailed {
                reason: format!("render job {} already ran", self.id),
            });
        }

        let started = Instant::now();
        info!(
            "Render {} started: {} frames, {} channels @ {} Hz",
            self.id,
            self.source.frame_count(),
            self.source.num_channels(),
            self.source.sample_rate()
        );

        let result = self.execute(config, &mut on_progress);
        match &result {
            Ok(_) => {
                on_progress(self.progress.complete());
                self.outcome = Some(RenderOutcome::Success);
                info!(
                    "Render {} finished in {:.1} ms",
                    self.id,
                    started.elapsed().as_secs_f64() * 1000.0
                );
            }
            Err(e) => {
                self.outcome = Some(RenderOutcome::Failure(e.to_string()));
                warn!("Render {} failed: {}", self.id, e);
            }
        }
        result
    }

    fn execute<F>(&mut self, config: &RenderConfig, on_progress: &mut F) -> Result<PcmBuffer>
    where
        F: FnMut(u8),
    {
        if self.source.is_empty() {
            return Err(QuieterError::DecodeFailed {
                reason: "source buffer has no frames".to_string(),
                source: None,
            });
        }
        if !self.source.is_finite() {
            return Err(QuieterError::DecodeFailed {
                reason: "source buffer contains non-finite samples".to_string(),
                source: None,
            });
        }
        check_params(&self.params)?;

        let total = self.source.frame_count();
        let sample_rate = self.source.sample_rate();
        let block = config.block_frames.max(1);

        let stages = self.stages();
        let mut chain = EffectChain::from_stages(&stages, sample_rate, self.source.num_channels());
        debug!("Render {} chain: {:?}", self.id, chain.effect_types());

        let mut channels = self.source.channels().to_vec();
        on_progress(self.progress.current());

        let mut start = 0;
        while start < total {
            let end = (start + block).min(total);
            chain.process(&mut channels, start..end);
            if let Some(percent) = self.progress.update(end, total) {
                on_progress(percent);
            }
            start = end;
        }

        if channels.iter().flatten().any(|s| !s.is_finite()) {
            return Err(QuieterError::RenderFailed {
                reason: "processing produced non-finite samples".to_string(),
            });
        }

        PcmBuffer::new(channels, sample_rate).map_err(|e| QuieterError::RenderFailed {
            reason: e.to_string(),
        })
    }
}

fn check_params(params: &DenoiseParameters) -> Result<()> {
    let values = [
        params.compressor_threshold_db,
        params.compressor_knee_db,
        params.compressor_ratio,
        params.compressor_attack_s,
        params.compressor_release_s,
        params.lowpass_hz,
        params.highpass_hz,
        params.filter_q,
        params.makeup_gain_linear,
    ];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(QuieterError::RenderFailed {
            reason: "denoise parameters contain non-finite values".to_string(),
        });
    }
    Ok(())
}
