//! Error types for loudness analysis

use shelfnorm_core::CoreError;
use thiserror::Error;

/// Result type for loudness operations
pub type Result<T> = std::result::Result<T, LoudnessError>;

/// Errors that can occur during loudness analysis
#[derive(Error, Debug)]
pub enum LoudnessError {
    /// Invalid sample rate
    #[error("Invalid sample rate: {0} Hz (must be between 16 and 2822400)")]
    InvalidSampleRate(u32),

    /// Invalid channel count
    #[error("Invalid channel count: {0} (must be 1-64)")]
    InvalidChannelCount(usize),

    /// EBU R128 analysis error
    #[error("EBU R128 analysis failed: {0}")]
    AnalysisError(String),

    /// No samples were provided for analysis
    #[error("No audio samples provided for analysis")]
    NoSamples,

    /// Signal shorter than one gating block
    #[error("Audio too short for integrated loudness: {duration_secs:.3} s (need at least 0.4 s)")]
    TooShort {
        /// Duration of the analyzed signal
        duration_secs: f64,
    },

    /// Audio is completely silent
    #[error("Audio is silent (no loudness data available)")]
    SilentAudio,
}

impl From<ebur128::Error> for LoudnessError {
    fn from(err: ebur128::Error) -> Self {
        Self::AnalysisError(format!("{:?}", err))
    }
}

impl From<LoudnessError> for CoreError {
    fn from(err: LoudnessError) -> Self {
        CoreError::measurement(err.to_string())
    }
}
