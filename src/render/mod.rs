//! Offline Render Engine
//!
//! Renders a whole buffer through the fixed denoise chain ahead of playback.
//! The render is CPU-bound, so the async entry point moves it onto tokio's
//! blocking pool and the caller only awaits the finished buffer.

mod job;
pub mod progress;

pub use job::{RenderJob, RenderOutcome};
pub use progress::{ProgressEstimator, COMPLETE, DEFAULT_PROGRESS_CAP};

use std::sync::Arc;

use crate::config::RenderConfig;
use crate::dsp::DenoiseParameters;
use crate::engine::PcmBuffer;
use crate::error::{QuieterError, Result};

/// Offline renderer for the denoise chain
#[derive(Debug, Clone, Default)]
pub struct RenderEngine {
    config: RenderConfig,
}

impl RenderEngine {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render a buffer synchronously
    ///
    /// # Example
    /// ```
    /// use quieter::dsp::map;
    /// use quieter::engine::generate_test_tone;
    /// use quieter::render::RenderEngine;
    ///
    /// let tone = generate_test_tone(440.0, 0.25, 44100, 2).unwrap();
    /// let mut last = 0;
    /// let out = RenderEngine::default()
    ///     .render(&tone, &map(50.0), |p| last = p)
    ///     .unwrap();
    /// assert_eq!(out.frame_count(), tone.frame_count());
    /// assert_eq!(last, 100);
    /// ```
    pub fn render<F>(
        &self,
        buffer: &PcmBuffer,
        params: &DenoiseParameters,
        on_progress: F,
    ) -> Result<PcmBuffer>
    where
        F: FnMut(u8),
    {
        let mut job = RenderJob::new(Arc::new(buffer.clone()), *params, self.config.progress_cap);
        job.run(&self.config, on_progress)
    }

    /// Render a shared buffer on the blocking pool
    pub async fn render_async<F>(
        &self,
        buffer: Arc<PcmBuffer>,
        params: DenoiseParameters,
        on_progress: F,
    ) -> Result<PcmBuffer>
    where
        F: FnMut(u8) + Send + 'static,
    {
        let config = self.config.clone();
        let mut job = RenderJob::new(buffer, params, config.progress_cap);

        tokio::task::spawn_blocking(move || job.run(&config, on_progress))
            .await
            .map_err(|e| QuieterError::RenderFailed {
                reason: format!("render task did not complete: {}", e),
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::map;
    use crate::engine::{calculate_rms, generate_test_tone};

    #[test]
    fn test_render_keeps_shape() {
        let tone = generate_test_tone(1000.0, 0.2, 48000, 3).unwrap();
        let out = RenderEngine::default()
            .render(&tone, &map(25.0), |_| {})
            .unwrap();

        assert_eq!(out.num_channels(), 3);
        assert_eq!(out.sample_rate(), 48000);
        assert_eq!(out.frame_count(), tone.frame_count());
        assert!(out.is_finite());
    }

    #[test]
    fn test_render_is_deterministic() {
        let tone = generate_test_tone(300.0, 0.2, 44100, 2).unwrap();
        let engine = RenderEngine::default();
        let a = engine.render(&tone, &map(70.0), |_| {}).unwrap();
        let b = engine.render(&tone, &map(70.0), |_| {}).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_high_intensity_removes_treble() {
        // 6 kHz sits above the 2 kHz lowpass at full intensity
        let tone = generate_test_tone(6000.0, 0.5, 44100, 1).unwrap();
        let engine = RenderEngine::default();
        let gentle = engine.render(&tone, &map(0.0), |_| {}).unwrap();
        let heavy = engine.render(&tone, &map(100.0), |_| {}).unwrap();
        assert!(calculate_rms(&heavy) < calculate_rms(&gentle));
    }

    #[test]
    fn test_progress_cap_from_config() {
        let engine = RenderEngine::new(RenderConfig {
            block_frames: 256,
            progress_cap: 50,
        });
        let tone = generate_test_tone(440.0, 0.1, 44100, 1).unwrap();
        let mut seen = Vec::new();
        engine.render(&tone, &map(50.0), |p| seen.push(p)).unwrap();

        let (last, rest) = seen.split_last().unwrap();
        assert_eq!(*last, 100);
        assert_eq!(rest.iter().max(), Some(&50));
    }

    #[tokio::test]
    async fn test_render_async() {
        let tone = Arc::new(generate_test_tone(440.0, 0.2, 44100, 2).unwrap());
        let out = RenderEngine::default()
            .render_async(Arc::clone(&tone), map(50.0), |_| {})
            .await
            .unwrap();
        assert_eq!(out.frame_count(), tone.frame_count());
    }
}
