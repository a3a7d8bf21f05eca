/// Collaborator traits for Shelfnorm
///
/// The processing core only talks to loudness metering, loudness
/// normalization and audio I/O through these traits.
use crate::error::Result;
use crate::types::AudioBuffer;

/// Integrated loudness meter
///
/// Implementers compute integrated perceptual loudness (LUFS) of a whole
/// buffer per a broadcast loudness standard (e.g. ITU-R BS.1770 / EBU R128).
pub trait LoudnessMeter {
    /// Measure the integrated loudness of `buffer` in LUFS
    ///
    /// # Errors
    /// Returns `CoreError::MeasurementFailure` when no loudness can be
    /// computed (silent or too-short signal, unsupported layout). Callers
    /// must not substitute a default value.
    fn measure(&self, buffer: &AudioBuffer) -> Result<f64>;
}

/// Loudness normalization routine
///
/// Applying it shifts the integrated loudness of a buffer from `measured`
/// to `target`, as seen by the meter that produced `measured`.
pub trait LoudnessNormalization {
    /// Return `buffer` rescaled from `measured_lufs` toward `target_lufs`
    ///
    /// # Errors
    /// Returns `CoreError::Normalization` if the gain cannot be derived.
    fn apply_gain(
        &self,
        buffer: AudioBuffer,
        measured_lufs: f64,
        target_lufs: f64,
    ) -> Result<AudioBuffer>;
}

impl<T: LoudnessMeter + ?Sized> LoudnessMeter for &T {
    fn measure(&self, buffer: &AudioBuffer) -> Result<f64> {
        (**self).measure(buffer)
    }
}

impl<T: LoudnessNormalization + ?Sized> LoudnessNormalization for &T {
    fn apply_gain(
        &self,
        buffer: AudioBuffer,
        measured_lufs: f64,
        target_lufs: f64,
    ) -> Result<AudioBuffer> {
        (**self).apply_gain(buffer, measured_lufs, target_lufs)
    }
}

/// Supplies the initial buffer to process
pub trait AudioSource {
    /// Error produced while reading
    type Error;

    /// Read the complete signal into memory
    fn read(&mut self) -> std::result::Result<AudioBuffer, Self::Error>;
}

/// Consumes the final, clipped buffer
pub trait AudioSink {
    /// Error produced while writing
    type Error;

    /// Persist the buffer
    fn write(&mut self, buffer: &AudioBuffer) -> std::result::Result<(), Self::Error>;
}
