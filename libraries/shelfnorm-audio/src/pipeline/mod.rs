//! Processing Pipeline
//!
//! ```text
//! Loaded -> BassFiltered -> TrebleFiltered -> Measured -> Normalized -> Clipped -> Done
//!              (low shelf)      (high shelf)    (meter)    (normalization)
//! ```
//!
//! Shelf stages with negligible gain are bypassed but still advance the
//! state. Measurement and normalization always run.

mod clip;
mod config;
mod runner;
mod state;

pub use clip::{clip_buffer, clip_sample, CLIP_MAX, CLIP_MIN};
pub use config::{PipelineConfig, ShelfSettings, BYPASS_THRESHOLD_DB};
pub use runner::{Pipeline, ProcessReport, ProcessedAudio, StageOutcome};
pub use state::{PipelineStage, StageRecord, StageTracker};
