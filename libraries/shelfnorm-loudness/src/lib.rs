//! Loudness measurement and normalization for Shelfnorm
//!
//! This crate provides:
//! - EBU R128 loudness measurement (integrated LUFS, loudness range, peaks)
//! - `EbuR128Meter`, the default `LoudnessMeter` collaborator
//! - `GainNormalizer`, the default `LoudnessNormalization` collaborator
//! - `LoudnessNormalizer`, which measures a buffer and hands it to the
//!   normalization collaborator together with the target level
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ AudioBuffer │ ──► │  Meter       │ ──► │ measured LUFS │
//! └─────────────┘     └──────────────┘     └───────────────┘
//!                                                 │
//!                                                 ▼
//!                     ┌──────────────┐     ┌───────────────┐
//!                     │ Gain Apply   │ ◄── │ target LUFS   │
//!                     └──────────────┘     └───────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use shelfnorm_loudness::{EbuR128Meter, GainNormalizer, LoudnessNormalizer};
//!
//! let normalizer = LoudnessNormalizer::streaming();
//! let normalized = normalizer.normalize(buffer, &EbuR128Meter::new(), &GainNormalizer::new())?;
//!
//! println!("Measured {:.1} LUFS, applied {:+.2} dB", normalized.measured_lufs, normalized.gain_db);
//! ```

#![deny(unsafe_code)]

mod analyzer;
mod error;
mod normalizer;

pub use analyzer::{
    analyze, integrated_loudness, EbuR128Meter, LoudnessAnalyzer, LoudnessInfo, MAX_CHANNELS,
    SUPPORTED_SAMPLE_RATES,
};
pub use error::{LoudnessError, Result};
pub use normalizer::{db_to_linear, linear_to_db, GainNormalizer, LoudnessNormalizer, NormalizedAudio};

/// EBU R128 broadcast reference level (-23 LUFS)
pub const EBU_R128_BROADCAST_LUFS: f64 = -23.0;

/// Streaming reference level (-14 LUFS, common for streaming platforms)
pub const EBU_R128_STREAMING_LUFS: f64 = -14.0;

/// Length of one EBU R128 gating block in seconds
///
/// Integrated loudness is undefined for shorter signals.
pub const GATING_BLOCK_SECS: f64 = 0.4;
