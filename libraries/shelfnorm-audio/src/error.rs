/// Audio-specific errors
use crate::pipeline::PipelineStage;
use shelfnorm_core::CoreError;
use shelfnorm_loudness::LoudnessError;
use thiserror::Error;

/// Result type alias using `AudioError`
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio error types
#[derive(Error, Debug)]
pub enum AudioError {
    /// Filter design input outside its valid domain
    #[error("Invalid filter parameter {parameter} = {value}: {reason}")]
    InvalidFilterParameter {
        /// Name of the offending parameter
        parameter: &'static str,
        /// Value that was rejected
        value: f64,
        /// Which constraint it violates
        reason: &'static str,
    },

    /// Pipeline stage out of order
    #[error("Invalid pipeline transition: {from:?} -> {to:?}")]
    InvalidTransition {
        /// Stage the pipeline was in
        from: PipelineStage,
        /// Stage it tried to enter
        to: PipelineStage,
    },

    /// Buffer construction, measurement or normalization error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// WAV reading/writing error
    #[error("WAV error: {0}")]
    Wav(String),

    /// Unsupported sample format or bit depth
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AudioError {
    /// Filter design rejected its input
    pub fn is_invalid_filter_parameter(&self) -> bool {
        matches!(self, Self::InvalidFilterParameter { .. })
    }

    /// Input channels had different lengths
    pub fn is_channel_length_mismatch(&self) -> bool {
        matches!(self, Self::Core(CoreError::ChannelLengthMismatch { .. }))
    }

    /// Loudness meter failed
    pub fn is_measurement_failure(&self) -> bool {
        matches!(self, Self::Core(CoreError::MeasurementFailure(_)))
    }
}

impl From<LoudnessError> for AudioError {
    fn from(err: LoudnessError) -> Self {
        Self::Core(err.into())
    }
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => Self::Io(e),
            hound::Error::Unsupported => Self::UnsupportedFormat("unsupported WAV layout".into()),
            other => Self::Wav(other.to_string()),
        }
    }
}
