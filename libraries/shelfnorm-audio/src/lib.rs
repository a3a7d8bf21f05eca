//! Shelfnorm Audio
//!
//! Tone shaping and loudness normalization for whole in-memory signals.
//!
//! This crate provides:
//! - RBJ low/high shelf design into normalized second-order sections
//! - Stateful per-channel section cascade filtering (optionally on rayon)
//! - The `Pipeline`: bass shelf, treble shelf, loudness measurement,
//!   normalization and final clipping, in that order
//! - WAV reading/writing via hound
//!
//! # Example: Designing a Shelf
//!
//! ```rust
//! use shelfnorm_audio::effects::{design, FilterKind};
//! use shelfnorm_core::SampleRate;
//!
//! let sos = design(FilterKind::LowShelf, SampleRate::CD_QUALITY, 100.0, 6.0, 0.707).unwrap();
//! assert_eq!(sos.a0, 1.0);
//! assert!((sos.gain_db_at(1.0, SampleRate::CD_QUALITY) - 6.0).abs() < 1e-3);
//! ```
//!
//! # Example: Running the Pipeline
//!
//! ```rust,no_run
//! use shelfnorm_audio::{read_wav, write_wav, Pipeline, PipelineConfig, WavFormat};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let input = read_wav("/music/track.wav")?;
//! let processed = Pipeline::new(PipelineConfig::default()).run(input)?;
//! write_wav("/music/track.norm.wav", &processed.buffer, WavFormat::Pcm16)?;
//! # Ok(())
//! # }
//! ```

pub mod effects;
mod error;
pub mod pipeline;
mod wav;

pub use error::{AudioError, Result};
pub use pipeline::{
    clip_buffer, Pipeline, PipelineConfig, PipelineStage, ProcessReport, ProcessedAudio,
    ShelfSettings, StageOutcome,
};
pub use wav::{read_wav, write_wav, WavFormat, WavSink, WavSource};
