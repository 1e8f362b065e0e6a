//! Playback Transport for Quieter
//!
//! Tracks play/pause state and the playhead over the loaded buffer. The
//! transport is a logical clock: the host drives it with `advance_*` calls
//! and the session reads it back for display.

use std::fmt;

use log::debug;

/// Transport states representing the current playback mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    /// Nothing playing, playhead parked (default state)
    #[default]
    Stopped,
    /// Audio is actively playing
    Playing,
    /// Playback suspended mid-buffer
    Paused,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportState::Stopped => write!(f, "Stopped"),
            TransportState::Playing => write!(f, "Playing"),
            TransportState::Paused => write!(f, "Paused"),
        }
    }
}

/// Playhead and play/pause state for one loaded buffer
#[derive(Debug, Clone)]
pub struct Transport {
    /// Current transport state
    state: TransportState,

    /// Current playhead position in seconds
    playhead_position: f64,

    /// Length of the loaded buffer in seconds
    duration: f64,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Transport {
    /// Create a transport over a buffer of the given duration
    ///
    /// # Example
    /// ```
    /// use quieter::engine::Transport;
    /// let transport = Transport::new(3.0);
    /// assert!(transport.is_stopped());
    /// ```
    pub fn new(duration: f64) -> Self {
        Self {
            state: TransportState::Stopped,
            playhead_position: 0.0,
            duration: duration.max(0.0),
        }
    }

    // ========================================================================
    // Transport Controls
    // ========================================================================

    /// Start or resume playback from the current position
    ///
    /// Starting at the very end rewinds to the start first.
    pub fn play(&mut self) {
        match self.state {
            TransportState::Stopped | TransportState::Paused => {
                if self.playhead_position >= self.duration {
                    self.playhead_position = 0.0;
                }
                self.state = TransportState::Playing;
                debug!("[TRANSPORT] Play from {:.3}s", self.playhead_position);
            }
            TransportState::Playing => {
                debug!("[TRANSPORT] Already playing");
            }
        }
    }

    /// Pause playback, keeping the playhead
    pub fn pause(&mut self) {
        match self.state {
            TransportState::Playing => {
                self.state = TransportState::Paused;
                debug!("[TRANSPORT] Paused at {:.3}s", self.playhead_position);
            }
            TransportState::Paused | TransportState::Stopped => {
                debug!("[TRANSPORT] Nothing to pause");
            }
        }
    }

    /// Play if not playing, pause if playing
    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Stop playback and rewind to the start
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.playhead_position = 0.0;
        debug!("[TRANSPORT] Stopped, playhead reset to 0");
    }

    /// Seek to a position in seconds, clamped to `[0, duration]`
    ///
    /// Seeking never changes the play/pause state.
    pub fn seek(&mut self, position: f64) {
        self.playhead_position = if position.is_nan() {
            0.0
        } else {
            position.clamp(0.0, self.duration)
        };
        debug!("[TRANSPORT] Seek to {:.3}s", self.playhead_position);
    }

    /// Move the playhead forward by wall-clock seconds
    ///
    /// Returns true if playback reached the end of the buffer, in which case
    /// the transport stops with the playhead parked at the end.
    pub fn advance_secs(&mut self, seconds: f64) -> bool {
        if self.state != TransportState::Playing || seconds <= 0.0 {
            return false;
        }

        self.playhead_position += seconds;
        if self.playhead_position >= self.duration {
            self.playhead_position = self.duration;
            self.state = TransportState::Stopped;
            debug!("[TRANSPORT] Finished at {:.3}s", self.duration);
            return true;
        }
        false
    }

    // ========================================================================
    // State Queries
    // ========================================================================

    /// Get the current playhead position in seconds
    pub fn playhead_position(&self) -> f64 {
        self.playhead_position
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == TransportState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.state == TransportState::Stopped
    }

    pub fn state(&self) -> TransportState {
        self.state
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_stopped() {
        let transport = Transport::new(10.0);
        assert!(transport.is_stopped());
        assert!(!transport.is_playing());
        assert_eq!(transport.playhead_position(), 0.0);
    }

    #[test]
    fn test_play_pause_cycle() {
        let mut transport = Transport::new(10.0);
        transport.play();
        assert!(transport.is_playing());

        transport.pause();
        assert!(transport.is_paused());

        transport.play();
        assert!(transport.is_playing());
    }

    #[test]
    fn test_toggle() {
        let mut transport = Transport::new(10.0);
        transport.toggle();
        assert!(transport.is_playing());
        transport.toggle();
        assert!(transport.is_paused());
    }

    #[test]
    fn test_pause_when_stopped_is_noop() {
        let mut transport = Transport::new(10.0);
        transport.pause();
        assert!(transport.is_stopped());
    }

    #[test]
    fn test_stop_resets_playhead() {
        let mut transport = Transport::new(30.0);
        transport.play();
        transport.seek(10.0);
        transport.stop();
        assert!(transport.is_stopped());
        assert_eq!(transport.playhead_position(), 0.0);
    }

    #[test]
    fn test_seek_clamped_to_duration() {
        let mut transport = Transport::new(5.0);
        transport.seek(-10.0);
        assert_eq!(transport.playhead_position(), 0.0);
        transport.seek(50.0);
        assert_eq!(transport.playhead_position(), 5.0);
    }

    #[test]
    fn test_seek_keeps_play_state() {
        let mut transport = Transport::new(30.0);
        transport.play();
        transport.seek(20.0);
        assert!(transport.is_playing());

        transport.pause();
        transport.seek(3.0);
        assert!(transport.is_paused());
        assert_eq!(transport.playhead_position(), 3.0);
    }

    #[test]
    fn test_advance_playhead_while_playing() {
        let mut transport = Transport::new(10.0);
        transport.play();
        assert!(!transport.advance_secs(1.0));
        assert!((transport.playhead_position() - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_advance_ignored_while_paused() {
        let mut transport = Transport::new(10.0);
        transport.advance_secs(1.0);
        assert_eq!(transport.playhead_position(), 0.0);
    }

    #[test]
    fn test_advance_past_end_finishes() {
        let mut transport = Transport::new(1.0);
        transport.play();
        assert!(transport.advance_secs(2.0));
        assert!(transport.is_stopped());
        assert_eq!(transport.playhead_position(), 1.0);

        // Playing again from the end rewinds
        transport.play();
        assert_eq!(transport.playhead_position(), 0.0);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(TransportState::Stopped.to_string(), "Stopped");
        assert_eq!(TransportState::Playing.to_string(), "Playing");
        assert_eq!(TransportState::Paused.to_string(), "Paused");
    }
}
