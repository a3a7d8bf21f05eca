//! Pipeline configuration
//!
//! Immutable settings handed to a `Pipeline` at construction.

use crate::effects::{FilterKind, FilterSpec, BUTTERWORTH_Q};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use shelfnorm_core::SampleRate;
use shelfnorm_loudness::EBU_R128_STREAMING_LUFS;

/// Shelf gains with an absolute value at or below this are not filtered at all
pub const BYPASS_THRESHOLD_DB: f64 = 1e-6;

/// One shelving stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShelfSettings {
    /// Shelf gain in dB (positive boosts, negative cuts)
    pub gain_db: f64,
    /// Corner frequency in Hz
    pub frequency_hz: f64,
    /// Transition steepness
    #[serde(default = "default_q")]
    pub q: f64,
}

fn default_q() -> f64 {
    BUTTERWORTH_Q
}

impl ShelfSettings {
    /// Create stage settings
    pub fn new(gain_db: f64, frequency_hz: f64, q: f64) -> Self {
        Self {
            gain_db,
            frequency_hz,
            q,
        }
    }

    /// Bass stage defaults: 0 dB at 100 Hz
    pub fn bass() -> Self {
        Self::new(0.0, 100.0, BUTTERWORTH_Q)
    }

    /// Treble stage defaults: -1 dB at 6 kHz
    pub fn treble() -> Self {
        Self::new(-1.0, 6000.0, BUTTERWORTH_Q)
    }

    /// Gain too small to be worth filtering
    pub fn is_bypassed(&self) -> bool {
        self.gain_db.abs() <= BYPASS_THRESHOLD_DB
    }

    /// Filter parameters for this stage
    pub fn to_spec(&self, kind: FilterKind) -> FilterSpec {
        FilterSpec {
            kind,
            frequency_hz: self.frequency_hz,
            gain_db: self.gain_db,
            q: self.q,
        }
    }
}

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Integrated loudness to normalize to (LUFS)
    pub target_lufs: f64,
    /// Low-shelf stage
    pub bass: ShelfSettings,
    /// High-shelf stage
    pub treble: ShelfSettings,
    /// Filter channels on the rayon pool
    pub parallel_channels: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_lufs: EBU_R128_STREAMING_LUFS,
            bass: ShelfSettings::bass(),
            treble: ShelfSettings::treble(),
            parallel_channels: true,
        }
    }
}

impl PipelineConfig {
    /// Config with both shelves bypassed
    pub fn flat(target_lufs: f64) -> Self {
        Self {
            target_lufs,
            bass: ShelfSettings {
                gain_db: 0.0,
                ..ShelfSettings::bass()
            },
            treble: ShelfSettings {
                gain_db: 0.0,
                ..ShelfSettings::treble()
            },
            parallel_channels: true,
        }
    }

    /// Low-shelf parameters, unless bypassed
    pub fn bass_spec(&self) -> Option<FilterSpec> {
        (!self.bass.is_bypassed()).then(|| self.bass.to_spec(FilterKind::LowShelf))
    }

    /// High-shelf parameters, unless bypassed
    pub fn treble_spec(&self) -> Option<FilterSpec> {
        (!self.treble.is_bypassed()).then(|| self.treble.to_spec(FilterKind::HighShelf))
    }

    /// Check every active stage against `sample_rate`
    ///
    /// Bypassed stages are not validated; they never reach the designer.
    pub fn validate(&self, sample_rate: SampleRate) -> Result<()> {
        for spec in self.bass_spec().iter().chain(self.treble_spec().iter()) {
            crate::effects::validate(sample_rate, spec.frequency_hz, spec.gain_db, spec.q)?;
        }
        Ok(())
    }
}
