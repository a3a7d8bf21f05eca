/// Shelving filter design
///
/// Closed-form second-order shelving filters after the RBJ Audio EQ Cookbook.
/// Every design yields exactly one normalized second-order section.
use crate::error::{AudioError, Result};
use serde::{Deserialize, Serialize};
use shelfnorm_core::SampleRate;
use std::f64::consts::PI;

/// Butterworth Q (maximally flat transition)
pub const BUTTERWORTH_Q: f64 = 0.707;

/// Filter type for shelving stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Low shelf - boosts/cuts below the corner frequency
    LowShelf,
    /// High shelf - boosts/cuts above the corner frequency
    HighShelf,
}

impl FilterKind {
    /// Label used in log output
    pub fn label(&self) -> &'static str {
        match self {
            Self::LowShelf => "low-shelf",
            Self::HighShelf => "high-shelf",
        }
    }
}

/// One second-order section, normalized so that `a0 == 1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SosCoefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a0: f64,
    pub a1: f64,
    pub a2: f64,
}

impl SosCoefficients {
    /// Normalize raw coefficients by `a0`
    pub fn from_raw(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a0: 1.0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Pass-through section
    pub fn identity() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a0: 1.0,
            a1: 0.0,
            a2: 0.0,
        }
    }

    /// Coefficients as one SOS row: `[b0, b1, b2, a0, a1, a2]`
    pub fn as_array(&self) -> [f64; 6] {
        [self.b0, self.b1, self.b2, self.a0, self.a1, self.a2]
    }

    /// Magnitude of the frequency response at `frequency_hz`
    pub fn magnitude_at(&self, frequency_hz: f64, sample_rate: SampleRate) -> f64 {
        let w = 2.0 * PI * frequency_hz / sample_rate.as_f64();
        let (s1, c1) = w.sin_cos();
        let (s2, c2) = (2.0 * w).sin_cos();

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = self.a0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        (num_re.hypot(num_im)) / (den_re.hypot(den_im))
    }

    /// Magnitude response in dB at `frequency_hz`
    pub fn gain_db_at(&self, frequency_hz: f64, sample_rate: SampleRate) -> f64 {
        20.0 * self.magnitude_at(frequency_hz, sample_rate).log10()
    }

    /// Both poles strictly inside the unit circle
    ///
    /// For a monic quadratic `z^2 + a1 z + a2` this is the stability
    /// triangle `|a2| < 1` and `|a1| < 1 + a2`.
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }
}

/// Shelving filter parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub kind: FilterKind,
    /// Corner frequency in Hz, strictly between 0 and Nyquist
    pub frequency_hz: f64,
    /// Shelf gain in dB
    pub gain_db: f64,
    /// Transition steepness, > 0
    pub q: f64,
}

impl FilterSpec {
    /// Low shelf
    pub fn low_shelf(frequency_hz: f64, gain_db: f64, q: f64) -> Self {
        Self {
            kind: FilterKind::LowShelf,
            frequency_hz,
            gain_db,
            q,
        }
    }

    /// High shelf
    pub fn high_shelf(frequency_hz: f64, gain_db: f64, q: f64) -> Self {
        Self {
            kind: FilterKind::HighShelf,
            frequency_hz,
            gain_db,
            q,
        }
    }

    /// Design the section for `sample_rate`
    pub fn design(&self, sample_rate: SampleRate) -> Result<SosCoefficients> {
        design(self.kind, sample_rate, self.frequency_hz, self.gain_db, self.q)
    }
}

/// Check design preconditions
pub fn validate(sample_rate: SampleRate, frequency_hz: f64, gain_db: f64, q: f64) -> Result<()> {
    let fs = sample_rate.as_f64();
    if sample_rate.as_hz() == 0 {
        return Err(AudioError::InvalidFilterParameter {
            parameter: "sample_rate",
            value: fs,
            reason: "must be greater than 0",
        });
    }
    if !(frequency_hz.is_finite() && frequency_hz > 0.0 && frequency_hz < sample_rate.nyquist()) {
        return Err(AudioError::InvalidFilterParameter {
            parameter: "frequency_hz",
            value: frequency_hz,
            reason: "must lie strictly between 0 and the Nyquist frequency",
        });
    }
    if !gain_db.is_finite() {
        return Err(AudioError::InvalidFilterParameter {
            parameter: "gain_db",
            value: gain_db,
            reason: "must be finite",
        });
    }
    if !(q.is_finite() && q > 0.0) {
        return Err(AudioError::InvalidFilterParameter {
            parameter: "q",
            value: q,
            reason: "must be greater than 0",
        });
    }
    Ok(())
}

/// Design a shelving section
///
/// Intermediate terms are computed in cookbook order:
/// `A = 10^(gain/40)`, `w0 = 2 pi f0 / fs`, `alpha = sin(w0) / (2Q)`, then
/// the raw `b`/`a` terms, which are finally divided by `a0`.
///
/// # Errors
/// `InvalidFilterParameter` if the sample rate is 0, the corner frequency is
/// outside (0, Nyquist), the gain is not finite, or `q <= 0`.
pub fn design(
    kind: FilterKind,
    sample_rate: SampleRate,
    frequency_hz: f64,
    gain_db: f64,
    q: f64,
) -> Result<SosCoefficients> {
    validate(sample_rate, frequency_hz, gain_db, q)?;

    let a = 10.0_f64.powf(gain_db / 40.0);
    let w0 = 2.0 * PI * frequency_hz / sample_rate.as_f64();
    let cos_w0 = w0.cos();
    let sin_w0 = w0.sin();
    let alpha = sin_w0 / (2.0 * q);
    let sqrt_a = a.sqrt();

    let coeffs = match kind {
        FilterKind::LowShelf => {
            let b0 = a * ((a + 1.0) - (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha);
            let b1 = 2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0);
            let b2 = a * ((a + 1.0) - (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha);
            let a0 = (a + 1.0) + (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha;
            let a1 = -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0);
            let a2 = (a + 1.0) + (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha;
            SosCoefficients::from_raw(b0, b1, b2, a0, a1, a2)
        }
        FilterKind::HighShelf => {
            let b0 = a * ((a + 1.0) + (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha);
            let b1 = -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0);
            let b2 = a * ((a + 1.0) + (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha);
            let a0 = (a + 1.0) - (a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha;
            let a1 = 2.0 * ((a - 1.0) - (a + 1.0) * cos_w0);
            let a2 = (a + 1.0) - (a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha;
            SosCoefficients::from_raw(b0, b1, b2, a0, a1, a2)
        }
    };

    Ok(coeffs)
}
