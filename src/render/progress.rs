//! Render progress estimate
//!
//! The render reports a capped estimate rather than true completion: progress
//! follows the fraction of frames pushed through the chain, scaled into
//! `[0, cap]`, and only snaps to 100 once the output buffer exists. The value
//! never decreases.

/// Default ceiling for the estimate before completion
pub const DEFAULT_PROGRESS_CAP: u8 = 90;

/// Final progress value, reported only on success
pub const COMPLETE: u8 = 100;

/// Monotonic, capped progress estimator for one render
#[derive(Debug, Clone)]
pub struct ProgressEstimator {
    current: u8,
    cap: u8,
}

impl Default for ProgressEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_CAP)
    }
}

impl ProgressEstimator {
    /// Create an estimator; a cap of 100 or more is lowered to 99
    pub fn new(cap: u8) -> Self {
        Self {
            current: 0,
            cap: cap.min(COMPLETE - 1),
        }
    }

    /// Fold in a new measurement
    ///
    /// Returns the new percentage if it moved forward, None otherwise.
    pub fn update(&mut self, done_frames: usize, total_frames: usize) -> Option<u8> {
        let fraction = if total_frames == 0 {
            1.0
        } else {
            (done_frames as f64 / total_frames as f64).clamp(0.0, 1.0)
        };
        let estimate = (fraction * self.cap as f64).floor() as u8;

        if estimate > self.current {
            self.current = estimate;
            Some(estimate)
        } else {
            None
        }
    }

    /// Mark the render finished
    pub fn complete(&mut self) -> u8 {
        self.current = COMPLETE;
        COMPLETE
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn cap(&self) -> u8 {
        self.cap
    }
}
