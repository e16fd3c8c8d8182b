//! Error type shared by setup-time and audio-thread operations.
//!
//! Every variant is `Copy` and holds only static strings or plain numbers, so
//! an error can be built inside the audio callback without touching the
//! allocator.

use thiserror::Error;

/// Errors reported by the synthesis engine.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SynthError {
    /// Invalid engine configuration (table size, sample rate, pool size).
    ///
    /// Fatal at setup: the transport must not start streaming.
    #[error("configuration error: {0}")]
    Configuration(&'static str),

    /// A caller-supplied argument is malformed (harmonic list, note number).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A note event was scheduled outside the block it was delivered with.
    #[error("event offset {offset} outside block of {num_samples} samples")]
    OutOfRange {
        /// Offset carried by the event.
        offset: u32,
        /// Length of the block being rendered.
        num_samples: usize,
    },

    /// A fixed-size resource (voice pool, message queue) has no room left.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(&'static str),
}

/// Result alias used throughout the crate.
pub type SynthResult<T> = Result<T, SynthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_include_context() {
        let err = SynthError::OutOfRange {
            offset: 600,
            num_samples: 512,
        };
        assert_eq!(
            err.to_string(),
            "event offset 600 outside block of 512 samples"
        );

        let err = SynthError::Configuration("sample rate must be positive");
        assert_eq!(
            err.to_string(),
            "configuration error: sample rate must be positive"
        );
    }
}
