/// Core error types for Shelfnorm
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for Shelfnorm
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Sample rate of zero
    #[error("Invalid sample rate: {0} Hz (must be greater than 0)")]
    InvalidSampleRate(u32),

    /// Buffer without any channel
    #[error("Audio buffer has no channels")]
    NoChannels,

    /// Channels of unequal length
    #[error("Channel {channel} has {actual} samples, expected {expected}")]
    ChannelLengthMismatch {
        /// Index of the first channel whose length differs from channel 0
        channel: usize,
        /// Length of channel 0
        expected: usize,
        /// Length of the offending channel
        actual: usize,
    },

    /// NaN or infinite sample
    #[error("Channel {channel} has a non-finite sample at index {index}")]
    NonFiniteSample {
        /// Channel holding the sample
        channel: usize,
        /// Position of the first non-finite sample in that channel
        index: usize,
    },

    /// Loudness meter could not produce a value
    #[error("Loudness measurement failed: {0}")]
    MeasurementFailure(String),

    /// Loudness normalization could not be applied
    #[error("Loudness normalization failed: {0}")]
    Normalization(String),
}

impl CoreError {
    /// Create a measurement failure
    pub fn measurement(msg: impl Into<String>) -> Self {
        Self::MeasurementFailure(msg.into())
    }

    /// Create a normalization error
    pub fn normalization(msg: impl Into<String>) -> Self {
        Self::Normalization(msg.into())
    }
}
