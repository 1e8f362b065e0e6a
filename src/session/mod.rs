//! Session Controller
//!
//! Owns the live buffer for one loaded file and drives it through
//! load → select region → render → replace. The [`Session`] handle is cheap to
//! clone; every clone talks to the same state, so a UI can keep polling
//! [`Session::snapshot`] while another task awaits a render.
//!
//! State machine:
//!
//! ```text
//! Empty → Loading → Ready ⇄ {Playing, Paused}
//!                   Ready → Rendering → Ready
//!         Loading → Error → (next load) Loading
//! ```

pub mod region;

pub use region::{NoiseRegion, RegionSelector};

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::dsp::params::clamp_intensity;
use crate::dsp::DenoiseParameters;
use crate::engine::{decode_bytes, wav, PcmBuffer, Transport};
use crate::error::{QuieterError, Result};
use crate::render::{RenderEngine, COMPLETE};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Empty,
    Loading,
    Ready,
    Playing,
    Paused,
    Rendering,
    Error,
}

impl SessionState {
    /// A buffer is loaded and usable
    pub fn has_buffer(&self) -> bool {
        matches!(
            self,
            SessionState::Ready
                | SessionState::Playing
                | SessionState::Paused
                | SessionState::Rendering
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Empty => "empty",
            SessionState::Loading => "loading",
            SessionState::Ready => "ready",
            SessionState::Playing => "playing",
            SessionState::Paused => "paused",
            SessionState::Rendering => "rendering",
            SessionState::Error => "in error",
        };
        write!(f, "{}", name)
    }
}

/// Point-in-time view of a session for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub current_time: f64,
    pub duration: f64,
    pub region: Option<NoiseRegion>,
    pub intensity: f32,
    pub progress: u8,
    pub last_error: Option<String>,
    /// SHA-256 of the loaded source bytes
    pub fingerprint: Option<String>,
    pub processed: bool,
}

#[derive(Debug, Default)]
struct SessionInner {
    state: SessionState,
    buffer: Option<Arc<PcmBuffer>>,
    transport: Option<Transport>,
    regions: RegionSelector,
    intensity: f32,
    last_error: Option<String>,
    fingerprint: Option<String>,
    processed_wav: Option<Arc<Vec<u8>>>,
    /// Progress of the current render; replaced on every load and render
    progress: Arc<AtomicU8>,
    /// Bumped on every load so stale decode/render results are dropped
    generation: u64,
}

impl SessionInner {
    fn require_buffer(&self, operation: &'static str) -> Result<()> {
        match self.state {
            SessionState::Ready | SessionState::Playing | SessionState::Paused => Ok(()),
            state => Err(QuieterError::InvalidState {
                operation,
                state: state.to_string(),
            }),
        }
    }

    fn transport_mut(&mut self, operation: &'static str) -> Result<&mut Transport> {
        let state = self.state;
        self.transport.as_mut().ok_or_else(|| QuieterError::InvalidState {
            operation,
            state: state.to_string(),
        })
    }

    /// Mirror the transport into the session state after a playback call
    fn sync_playback_state(&mut self) {
        if let Some(transport) = &self.transport {
            self.state = if transport.is_playing() {
                SessionState::Playing
            } else if transport.is_paused() {
                SessionState::Paused
            } else {
                SessionState::Ready
            };
        }
    }

    fn install(&mut self, buffer: PcmBuffer) {
        let duration = buffer.duration_secs();
        self.transport = Some(Transport::new(duration));
        self.buffer = Some(Arc::new(buffer));
        self.state = SessionState::Ready;
    }
}

/// Handle to one noise-reduction session
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
    config: Arc<Config>,
    engine: RenderEngine,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Session {
    pub fn new(config: Config) -> Self {
        let inner = SessionInner {
            intensity: clamp_intensity(config.default_intensity),
            ..SessionInner::default()
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            engine: RenderEngine::new(config.render.clone()),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionInner>> {
        self.inner.lock().map_err(|_| QuieterError::InvalidState {
            operation: "access session",
            state: "poisoned".to_string(),
        })
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load a new source from memory
    ///
    /// Tears down playback and the region, enters `Loading`, then decodes on
    /// the blocking pool. On failure the session lands in `Error` with the
    /// message "unable to load audio"; the next load starts over.
    pub async fn load_bytes(&self, bytes: Vec<u8>, extension: Option<&str>) -> Result<()> {
        let fingerprint = format!("{:x}", Sha256::digest(&bytes));
        let generation = self.begin_load(Some(fingerprint))?;

        let extension = extension.map(str::to_owned);
        let decoded = tokio::task::spawn_blocking(move || {
            decode_bytes(bytes, extension.as_deref())
        })
        .await
        .map_err(|e| QuieterError::DecodeFailed {
            reason: format!("decode task did not complete: {}", e),
            source: None,
        })
        .and_then(|result| result);

        self.finish_load(generation, decoded)
    }

    /// Load a new source from disk, using the extension as a format hint
    pub async fn load_file(&self, path: &Path) -> Result<()> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_owned);

        match tokio::fs::read(path).await {
            Ok(bytes) => self.load_bytes(bytes, extension.as_deref()).await,
            Err(e) => {
                let generation = self.begin_load(None)?;
                self.finish_load(
                    generation,
                    Err(QuieterError::decode(
                        format!("could not read {}", path.display()),
                        e,
                    )),
                )
            }
        }
    }

    fn begin_load(&self, fingerprint: Option<String>) -> Result<u64> {
        let mut inner = self.lock()?;
        if inner.state == SessionState::Rendering {
            warn!("New source loaded while rendering; the render result will be dropped");
        }

        inner.generation += 1;
        inner.state = SessionState::Loading;
        inner.transport = None;
        inner.buffer = None;
        inner.processed_wav = None;
        inner.regions.reset(0.0);
        inner.last_error = None;
        inner.fingerprint = fingerprint;
        inner.progress = Arc::new(AtomicU8::new(0));

        debug!("Loading source (generation {})", inner.generation);
        Ok(inner.generation)
    }

    fn finish_load(&self, generation: u64, decoded: Result<PcmBuffer>) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.generation != generation {
            debug!("Dropping stale load (generation {})", generation);
            return Err(QuieterError::InvalidState {
                operation: "finish loading",
                state: "superseded by a newer load".to_string(),
            });
        }

        match decoded {
            Ok(buffer) => {
                info!(
                    "Loaded {:.2}s of audio ({} channels @ {} Hz)",
                    buffer.duration_secs(),
                    buffer.num_channels(),
                    buffer.sample_rate()
                );
                inner.regions.reset(buffer.duration_secs());
                inner.install(buffer);
                Ok(())
            }
            Err(e) => {
                warn!("Load failed: {}", e);
                inner.state = SessionState::Error;
                inner.fingerprint = None;
                inner.last_error = Some(e.friendly_message());
                Err(e)
            }
        }
    }

    // ========================================================================
    // Region
    // ========================================================================

    /// Mark the noise region, replacing any existing one
    pub fn select_region(&self, start: f64, end: f64) -> Result<NoiseRegion> {
        let mut inner = self.lock()?;
        if !inner.state.has_buffer() {
            return Err(QuieterError::InvalidState {
                operation: "select a region",
                state: inner.state.to_string(),
            });
        }
        inner.regions.create(start, end)
    }

    /// Move or resize the existing region
    pub fn update_region(&self, start: f64, end: f64) -> Result<NoiseRegion> {
        self.lock()?.regions.update(start, end)
    }

    pub fn clear_region(&self) -> Result<()> {
        self.lock()?.regions.clear();
        Ok(())
    }

    pub fn region(&self) -> Result<Option<NoiseRegion>> {
        Ok(self.lock()?.regions.current())
    }

    // ========================================================================
    // Intensity
    // ========================================================================

    /// Set the knob, clamped to `[0, 100]`; returns the stored value
    pub fn set_intensity(&self, intensity: f32) -> Result<f32> {
        let mut inner = self.lock()?;
        inner.intensity = clamp_intensity(intensity);
        Ok(inner.intensity)
    }

    pub fn intensity(&self) -> Result<f32> {
        Ok(self.lock()?.intensity)
    }

    /// Parameters the next render would use
    pub fn parameters(&self) -> Result<DenoiseParameters> {
        let intensity = self.lock()?.intensity;
        Ok(self.config.tuning.map(intensity))
    }

    // ========================================================================
    // Playback
    // ========================================================================

    pub fn play(&self) -> Result<()> {
        let mut inner = self.lock()?;
        inner.require_buffer("play")?;
        inner.transport_mut("play")?.play();
        inner.sync_playback_state();
        Ok(())
    }

    pub fn pause(&self) -> Result<()> {
        let mut inner = self.lock()?;
        inner.require_buffer("pause")?;
        inner.transport_mut("pause")?.pause();
        inner.sync_playback_state();
        Ok(())
    }

    /// The single play/pause button
    pub fn toggle_playback(&self) -> Result<()> {
        let mut inner = self.lock()?;
        inner.require_buffer("toggle playback")?;
        inner.transport_mut("toggle playback")?.toggle();
        inner.sync_playback_state();
        Ok(())
    }

    /// Stop playback and rewind
    pub fn stop(&self) -> Result<()> {
        let mut inner = self.lock()?;
        inner.require_buffer("stop")?;
        inner.transport_mut("stop")?.stop();
        inner.sync_playback_state();
        Ok(())
    }

    /// Move the playhead; play/pause state is unchanged
    pub fn seek(&self, seconds: f64) -> Result<()> {
        let mut inner = self.lock()?;
        inner.require_buffer("seek")?;
        inner.transport_mut("seek")?.seek(seconds);
        Ok(())
    }

    /// Advance the playhead by host clock time
    ///
    /// Returns true when playback reached the end and the session went back
    /// to `Ready`.
    pub fn advance(&self, seconds: f64) -> Result<bool> {
        let mut inner = self.lock()?;
        if inner.state != SessionState::Playing {
            return Ok(false);
        }
        let finished = inner.transport_mut("advance")?.advance_secs(seconds);
        if finished {
            debug!("Playback finished");
            inner.sync_playback_state();
        }
        Ok(finished)
    }

    pub fn current_time(&self) -> Result<f64> {
        let inner = self.lock()?;
        Ok(inner
            .transport
            .as_ref()
            .map_or(0.0, |t| t.playhead_position()))
    }

    pub fn duration(&self) -> Result<f64> {
        let inner = self.lock()?;
        Ok(inner.buffer.as_ref().map_or(0.0, |b| b.duration_secs()))
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Run noise reduction over the live buffer and swap in the result
    ///
    /// Requires a marked region. Playback is stopped before the render starts.
    /// Only one render runs per session; a second call while one is in
    /// flight is refused with `RenderInProgress` and changes nothing.
    ///
    /// On success the live buffer becomes the decode of the encoded WAV and
    /// the session returns to `Ready` with the region kept. On failure the
    /// previous buffer stays, the session returns to `Ready` and the error
    /// message is kept for display.
    ///
    /// `on_progress` sees 100 only once the new buffer is installed. A render
    /// whose source was replaced by a newer load never reports 100 and does
    /// not touch the new source's progress.
    pub async fn render<F>(&self, on_progress: F) -> Result<()>
    where
        F: FnMut(u8) + Send + 'static,
    {
        let (source, params, generation, cell) = self.begin_render()?;

        let on_progress = Arc::new(Mutex::new(on_progress));
        let report = {
            let cell = Arc::clone(&cell);
            let on_progress = Arc::clone(&on_progress);
            move |percent: u8| {
                // Completion is reported below, after the buffer swap
                if percent >= COMPLETE {
                    return;
                }
                cell.fetch_max(percent, Ordering::SeqCst);
                if let Ok(mut callback) = on_progress.lock() {
                    (*callback)(percent);
                }
            }
        };

        let rendered = self.engine.render_async(source, params, report).await;
        let finished = match rendered {
            Ok(output) => tokio::task::spawn_blocking(move || encode_output(&output))
                .await
                .map_err(|e| QuieterError::RenderFailed {
                    reason: format!("encode task did not complete: {}", e),
                })
                .and_then(|result| result),
            Err(e) => Err(e),
        };

        self.finish_render(generation, &cell, finished)?;
        if let Ok(mut callback) = on_progress.lock() {
            (*callback)(COMPLETE);
        }
        Ok(())
    }

    fn begin_render(&self) -> Result<(Arc<PcmBuffer>, DenoiseParameters, u64, Arc<AtomicU8>)> {
        let mut inner = self.lock()?;

        match inner.state {
            SessionState::Rendering => {
                warn!("Render requested while another is in flight; ignoring");
                return Err(QuieterError::RenderInProgress);
            }
            SessionState::Ready | SessionState::Playing | SessionState::Paused => {}
            state => {
                return Err(QuieterError::InvalidState {
                    operation: "render",
                    state: state.to_string(),
                })
            }
        }

        if inner.regions.current().is_none() {
            let err = QuieterError::NoRegionSelected;
            inner.last_error = Some(err.friendly_message());
            return Err(err);
        }

        let source = match &inner.buffer {
            Some(buffer) => Arc::clone(buffer),
            None => {
                return Err(QuieterError::InvalidState {
                    operation: "render",
                    state: inner.state.to_string(),
                })
            }
        };

        if let Some(transport) = inner.transport.as_mut() {
            if !transport.is_stopped() {
                debug!("Stopping playback for render");
                transport.stop();
            }
        }

        let params = self.config.tuning.map(inner.intensity);
        inner.state = SessionState::Rendering;
        inner.last_error = None;
        inner.progress = Arc::new(AtomicU8::new(0));

        info!("Rendering at intensity {:.0}", inner.intensity);
        Ok((source, params, inner.generation, Arc::clone(&inner.progress)))
    }

    fn finish_render(
        &self,
        generation: u64,
        cell: &AtomicU8,
        finished: Result<(Vec<u8>, PcmBuffer)>,
    ) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.generation != generation {
            debug!("Dropping render result for a replaced source");
            return Err(QuieterError::InvalidState {
                operation: "apply render",
                state: "superseded by a newer load".to_string(),
            });
        }

        match finished {
            Ok((wav_bytes, live)) => {
                info!("Replacing live buffer with {} byte WAV", wav_bytes.len());
                inner.processed_wav = Some(Arc::new(wav_bytes));
                inner.install(live);
                cell.store(COMPLETE, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => {
                warn!("Render failed, keeping previous buffer: {}", e);
                inner.state = SessionState::Ready;
                inner.last_error = Some(e.friendly_message());
                Err(e)
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn state(&self) -> Result<SessionState> {
        Ok(self.lock()?.state)
    }

    /// Progress of the current source's latest render, 0..=100
    pub fn progress(&self) -> Result<u8> {
        Ok(self.lock()?.progress.load(Ordering::SeqCst))
    }

    pub fn last_error(&self) -> Result<Option<String>> {
        Ok(self.lock()?.last_error.clone())
    }

    /// The live buffer
    pub fn buffer(&self) -> Result<Option<Arc<PcmBuffer>>> {
        Ok(self.lock()?.buffer.clone())
    }

    /// Encoded WAV of the last successful render
    pub fn processed_wav(&self) -> Result<Option<Arc<Vec<u8>>>> {
        Ok(self.lock()?.processed_wav.clone())
    }

    pub fn fingerprint(&self) -> Result<Option<String>> {
        Ok(self.lock()?.fingerprint.clone())
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        let inner = self.lock()?;
        Ok(SessionSnapshot {
            state: inner.state,
            current_time: inner
                .transport
                .as_ref()
                .map_or(0.0, |t| t.playhead_position()),
            duration: inner.buffer.as_ref().map_or(0.0, |b| b.duration_secs()),
            region: inner.regions.current(),
            intensity: inner.intensity,
            progress: inner.progress.load(Ordering::SeqCst),
            last_error: inner.last_error.clone(),
            fingerprint: inner.fingerprint.clone(),
            processed: inner.processed_wav.is_some(),
        })
    }
}

/// Encode a render result and decode it back into the buffer the UI plays
fn encode_output(output: &PcmBuffer) -> Result<(Vec<u8>, PcmBuffer)> {
    let bytes = wav::encode(output)?;
    let live = decode_bytes(bytes.clone(), Some("wav")).map_err(|e| QuieterError::RenderFailed {
        reason: format!("encoded output did not read back: {}", e),
    })?;
    Ok((bytes, live))
}

/// Format seconds as `m:ss`
///
/// # Example
/// ```
/// use quieter::session::format_time;
/// assert_eq!(format_time(75.4), "1:15");
/// assert_eq!(format_time(5.0), "0:05");
/// ```
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
