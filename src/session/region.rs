//! Noise region selection
//!
//! At most one region exists per loaded buffer. Drawing a new region replaces
//! the old one; loading a new buffer clears it.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{QuieterError, Result};

/// A marked interval of the loaded audio, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseRegion {
    start: f64,
    end: f64,
}

impl NoiseRegion {
    /// Validate an interval against the buffer duration
    ///
    /// # Errors
    /// `InvalidRegion` unless `0 <= start < end <= duration`.
    pub fn new(start: f64, end: f64, duration: f64) -> Result<Self> {
        let valid = start.is_finite()
            && end.is_finite()
            && start >= 0.0
            && start < end
            && end <= duration;
        if !valid {
            return Err(QuieterError::InvalidRegion {
                start,
                end,
                duration,
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, seconds: f64) -> bool {
        seconds >= self.start && seconds <= self.end
    }
}

/// Owner of the single active region
#[derive(Debug, Clone, Default)]
pub struct RegionSelector {
    region: Option<NoiseRegion>,
    duration: f64,
}

impl RegionSelector {
    pub fn new(duration: f64) -> Self {
        Self {
            region: None,
            duration,
        }
    }

    /// Mark a region, replacing any existing one
    pub fn create(&mut self, start: f64, end: f64) -> Result<NoiseRegion> {
        let region = NoiseRegion::new(start, end, self.duration)?;
        if let Some(old) = self.region.replace(region) {
            debug!(
                "Region {:.3}..{:.3} replaced by {:.3}..{:.3}",
                old.start, old.end, start, end
            );
        } else {
            debug!("Region created: {:.3}..{:.3}", start, end);
        }
        Ok(region)
    }

    /// Move or resize the existing region
    ///
    /// # Errors
    /// `NoRegionSelected` if nothing is marked, `InvalidRegion` for bad bounds.
    pub fn update(&mut self, start: f64, end: f64) -> Result<NoiseRegion> {
        if self.region.is_none() {
            return Err(QuieterError::NoRegionSelected);
        }
        let region = NoiseRegion::new(start, end, self.duration)?;
        self.region = Some(region);
        debug!("Region updated: {:.3}..{:.3}", start, end);
        Ok(region)
    }

    pub fn clear(&mut self) {
        if self.region.take().is_some() {
            debug!("Region cleared");
        }
    }

    pub fn current(&self) -> Option<NoiseRegion> {
        self.region
    }

    /// Forget the region and bind to a new buffer duration
    pub fn reset(&mut self, duration: f64) {
        self.clear();
        self.duration = duration;
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }
}
