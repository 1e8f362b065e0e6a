//! Error handling for Quieter
//!
//! Every failure in the pipeline is recovered at the session boundary and
//! surfaced as a user-visible message; none of them tear the session down.

use thiserror::Error;

/// Result type alias for Quieter operations
pub type Result<T> = std::result::Result<T, QuieterError>;

/// Coarse error taxonomy used by the session and UI shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unreadable or corrupt input audio
    DecodeFailed,
    /// Malformed or out-of-range noise region
    InvalidRegion,
    /// Render requested without a noise region
    NoRegionSelected,
    /// DSP chain execution error
    RenderFailed,
    /// Internal buffer invariant violated
    MalformedBuffer,
    /// A render is already in flight
    Busy,
    /// Operation not valid in the current session state
    InvalidState,
    /// Configuration could not be loaded or is out of range
    Config,
    /// Filesystem or serialization failure
    Io,
}

/// Main error type for Quieter operations
#[derive(Error, Debug)]
pub enum QuieterError {
    // Input errors
    #[error("Decode failed: {reason}")]
    DecodeFailed {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Region errors
    #[error("Invalid region {start:.3}s..{end:.3}s (audio is {duration:.3}s long)")]
    InvalidRegion { start: f64, end: f64, duration: f64 },

    #[error("No noise region selected")]
    NoRegionSelected,

    // Processing errors
    #[error("Render failed: {reason}")]
    RenderFailed { reason: String },

    #[error("Malformed buffer: {reason}")]
    MalformedBuffer { reason: String },

    #[error("A render is already in progress")]
    RenderInProgress,

    #[error("Cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    // Configuration errors
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QuieterError {
    /// Build a decode failure wrapping an underlying error
    pub fn decode<E>(reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        QuieterError::DecodeFailed {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Map this error onto the pipeline taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuieterError::DecodeFailed { .. } => ErrorKind::DecodeFailed,
            QuieterError::InvalidRegion { .. } => ErrorKind::InvalidRegion,
            QuieterError::NoRegionSelected => ErrorKind::NoRegionSelected,
            QuieterError::RenderFailed { .. } => ErrorKind::RenderFailed,
            QuieterError::MalformedBuffer { .. } => ErrorKind::MalformedBuffer,
            QuieterError::RenderInProgress => ErrorKind::Busy,
            QuieterError::InvalidState { .. } => ErrorKind::InvalidState,
            QuieterError::Config { .. } => ErrorKind::Config,
            QuieterError::Io(_) | QuieterError::Serialization(_) => ErrorKind::Io,
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            QuieterError::DecodeFailed { .. } => "DECODE_FAILED",
            QuieterError::InvalidRegion { .. } => "INVALID_REGION",
            QuieterError::NoRegionSelected => "NO_REGION_SELECTED",
            QuieterError::RenderFailed { .. } => "RENDER_FAILED",
            QuieterError::MalformedBuffer { .. } => "MALFORMED_BUFFER",
            QuieterError::RenderInProgress => "RENDER_IN_PROGRESS",
            QuieterError::InvalidState { .. } => "INVALID_STATE",
            QuieterError::Config { .. } => "CONFIG_ERROR",
            QuieterError::Io(_) => "IO_ERROR",
            QuieterError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the user can recover by retrying or adjusting input
    ///
    /// Only an internal invariant violation is unrecoverable; nothing is
    /// retried automatically either way.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, QuieterError::MalformedBuffer { .. })
    }

    /// Get the message shown to the user
    pub fn friendly_message(&self) -> String {
        match self {
            QuieterError::DecodeFailed { .. } => "unable to load audio".to_string(),
            QuieterError::NoRegionSelected => "Please select a noise region first".to_string(),
            QuieterError::RenderFailed { .. } | QuieterError::MalformedBuffer { .. } => {
                "Failed to process audio".to_string()
            }
            QuieterError::InvalidRegion { .. } => {
                "The selected region is outside the audio. Try drawing it again.".to_string()
            }
            QuieterError::RenderInProgress => {
                "Noise reduction is already running. Wait for it to finish.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = QuieterError::InvalidRegion {
            start: 2.0,
            end: 1.0,
            duration: 3.0,
        };
        assert_eq!(err.error_code(), "INVALID_REGION");
        assert_eq!(err.kind(), ErrorKind::InvalidRegion);
    }

    #[test]
    fn test_friendly_messages() {
        let err = QuieterError::DecodeFailed {
            reason: "no audio track".to_string(),
            source: None,
        };
        assert_eq!(err.friendly_message(), "unable to load audio");
        assert_eq!(
            QuieterError::NoRegionSelected.friendly_message(),
            "Please select a noise region first"
        );
        assert_eq!(
            QuieterError::RenderFailed {
                reason: "NaN".to_string()
            }
            .friendly_message(),
            "Failed to process audio"
        );
    }

    #[test]
    fn test_recoverability() {
        assert!(QuieterError::NoRegionSelected.is_recoverable());
        assert!(QuieterError::RenderInProgress.is_recoverable());
        assert!(!QuieterError::MalformedBuffer {
            reason: "channel length".to_string()
        }
        .is_recoverable());
    }

    #[test]
    fn test_io_kind() {
        let err: QuieterError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
