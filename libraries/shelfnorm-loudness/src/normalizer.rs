//! Loudness normalization to a LUFS target
//!
//! Scales a whole buffer so that its integrated loudness moves from the
//! measured value to the target value.

use crate::{EBU_R128_BROADCAST_LUFS, EBU_R128_STREAMING_LUFS};
use shelfnorm_core::{AudioBuffer, CoreError, LoudnessMeter, LoudnessNormalization};

/// Convert dB to linear gain
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert linear gain to dB
pub fn linear_to_db(linear: f64) -> f64 {
    20.0 * linear.log10()
}

/// Default normalization collaborator
///
/// Multiplies every sample by `10^((target - measured) / 20)`. Integrated
/// loudness is scale-covariant, so re-measuring the result with the same
/// meter yields `target` up to the meter's own tolerance.
#[derive(Debug, Clone, Copy)]
pub struct GainNormalizer {
    /// Log a warning when the scaled signal exceeds full scale
    warn_on_clip: bool,
}

impl GainNormalizer {
    /// Create a normalizer that warns about clipping
    pub fn new() -> Self {
        Self { warn_on_clip: true }
    }

    /// Set whether a peak above 1.0 after gain is logged
    #[must_use]
    pub fn with_clip_warning(mut self, warn: bool) -> Self {
        self.warn_on_clip = warn;
        self
    }
}

impl Default for GainNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl LoudnessNormalization for GainNormalizer {
    fn apply_gain(
        &self,
        mut buffer: AudioBuffer,
        measured_lufs: f64,
        target_lufs: f64,
    ) -> shelfnorm_core::Result<AudioBuffer> {
        if !measured_lufs.is_finite() {
            return Err(CoreError::normalization(format!(
                "measured loudness is not finite ({measured_lufs})"
            )));
        }
        if !target_lufs.is_finite() {
            return Err(CoreError::normalization(format!(
                "target loudness is not finite ({target_lufs})"
            )));
        }

        let gain = db_to_linear(target_lufs - measured_lufs);
        buffer.scale(gain);

        if self.warn_on_clip {
            let peak = buffer.peak();
            if peak > 1.0 {
                tracing::warn!(
                    "Possible clipped samples in output: peak {:.3} ({:+.2} dBFS) after normalization",
                    peak,
                    linear_to_db(peak)
                );
            }
        }

        Ok(buffer)
    }
}

/// Result of a normalization pass
#[derive(Debug, Clone)]
pub struct NormalizedAudio {
    /// The rescaled buffer
    pub buffer: AudioBuffer,
    /// Loudness before normalization
    pub measured_lufs: f64,
    /// Loudness the buffer was moved to
    pub target_lufs: f64,
    /// Gain that the target implies, in dB
    pub gain_db: f64,
}

/// Loudness normalizer for whole buffers
///
/// Obtains the measured loudness from a `LoudnessMeter` and passes the
/// buffer with both loudness values to a `LoudnessNormalization`.
///
/// # Example
///
/// ```ignore
/// use shelfnorm_loudness::{EbuR128Meter, GainNormalizer, LoudnessNormalizer};
///
/// let normalizer = LoudnessNormalizer::new(-16.0);
/// let measured = normalizer.measure(&buffer, &EbuR128Meter::new())?;
/// let out = normalizer.apply(buffer, measured, &GainNormalizer::new())?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessNormalizer {
    target_lufs: f64,
}

impl LoudnessNormalizer {
    /// Create a normalizer for `target_lufs`
    pub fn new(target_lufs: f64) -> Self {
        Self { target_lufs }
    }

    /// Streaming level (-14 LUFS)
    pub fn streaming() -> Self {
        Self::new(EBU_R128_STREAMING_LUFS)
    }

    /// EBU R128 broadcast level (-23 LUFS)
    pub fn broadcast() -> Self {
        Self::new(EBU_R128_BROADCAST_LUFS)
    }

    /// Target loudness in LUFS
    pub fn target_lufs(&self) -> f64 {
        self.target_lufs
    }

    /// Gain in dB that moves `measured_lufs` to the target
    pub fn gain_db(&self, measured_lufs: f64) -> f64 {
        self.target_lufs - measured_lufs
    }

    /// Linear gain that moves `measured_lufs` to the target (always >= 0)
    pub fn linear_gain(&self, measured_lufs: f64) -> f64 {
        db_to_linear(self.gain_db(measured_lufs))
    }

    /// Measure `buffer` with `meter`
    ///
    /// Meter failures are returned as-is.
    pub fn measure<M>(&self, buffer: &AudioBuffer, meter: &M) -> shelfnorm_core::Result<f64>
    where
        M: LoudnessMeter + ?Sized,
    {
        meter.measure(buffer)
    }

    /// Hand `buffer` and the loudness pair to `normalization`
    pub fn apply<N>(
        &self,
        buffer: AudioBuffer,
        measured_lufs: f64,
        normalization: &N,
    ) -> shelfnorm_core::Result<NormalizedAudio>
    where
        N: LoudnessNormalization + ?Sized,
    {
        tracing::info!(
            "Measured loudness: {:.2} LUFS -> Target: {:.2} LUFS",
            measured_lufs,
            self.target_lufs
        );

        let buffer = normalization.apply_gain(buffer, measured_lufs, self.target_lufs)?;

        Ok(NormalizedAudio {
            buffer,
            measured_lufs,
            target_lufs: self.target_lufs,
            gain_db: self.gain_db(measured_lufs),
        })
    }

    /// Measure, then normalize
    pub fn normalize<M, N>(
        &self,
        buffer: AudioBuffer,
        meter: &M,
        normalization: &N,
    ) -> shelfnorm_core::Result<NormalizedAudio>
    where
        M: LoudnessMeter + ?Sized,
        N: LoudnessNormalization + ?Sized,
    {
        let measured = self.measure(&buffer, meter)?;
        self.apply(buffer, measured, normalization)
    }
}

impl Default for LoudnessNormalizer {
    fn default() -> Self {
        Self::streaming()
    }
}
