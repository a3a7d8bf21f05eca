//! Pipeline State Machine
//!
//! Stages advance strictly in order. A skipped stage still advances the
//! state so the history always lists every stage once.

use crate::error::{AudioError, Result};

/// Pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelineStage {
    /// Input buffer accepted
    #[default]
    Loaded,
    /// Low shelf applied (or bypassed)
    BassFiltered,
    /// High shelf applied (or bypassed)
    TrebleFiltered,
    /// Integrated loudness measured
    Measured,
    /// Gain applied toward the target loudness
    Normalized,
    /// Samples clamped to [-1.0, 1.0]
    Clipped,
    /// Buffer ready for output
    Done,
}

impl PipelineStage {
    /// The only stage that may follow this one
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Loaded => Some(Self::BassFiltered),
            Self::BassFiltered => Some(Self::TrebleFiltered),
            Self::TrebleFiltered => Some(Self::Measured),
            Self::Measured => Some(Self::Normalized),
            Self::Normalized => Some(Self::Clipped),
            Self::Clipped => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Terminal stage
    pub fn is_terminal(self) -> bool {
        self == Self::Done
    }
}

/// One entry in the stage history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageRecord {
    pub stage: PipelineStage,
    /// Stage was bypassed instead of executed
    pub skipped: bool,
}

/// Tracks the current stage and rejects out-of-order transitions
#[derive(Debug)]
pub struct StageTracker {
    stage: PipelineStage,
    history: Vec<StageRecord>,
}

impl StageTracker {
    /// Start in `Loaded`
    pub fn new() -> Self {
        Self {
            stage: PipelineStage::Loaded,
            history: vec![StageRecord {
                stage: PipelineStage::Loaded,
                skipped: false,
            }],
        }
    }

    /// Current stage
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Stages visited so far, in order
    pub fn history(&self) -> &[StageRecord] {
        &self.history
    }

    /// Move to `to`, which must be the successor of the current stage
    pub fn advance(&mut self, to: PipelineStage, skipped: bool) -> Result<()> {
        if self.stage.next() != Some(to) {
            return Err(AudioError::InvalidTransition {
                from: self.stage,
                to,
            });
        }

        tracing::debug!(
            "Pipeline stage {:?} -> {:?}{}",
            self.stage,
            to,
            if skipped { " (bypassed)" } else { "" }
        );
        self.stage = to;
        self.history.push(StageRecord { stage: to, skipped });
        Ok(())
    }

    /// Consume the tracker, returning the history
    pub fn into_history(self) -> Vec<StageRecord> {
        self.history
    }
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_sequence() {
        let mut tracker = StageTracker::new();
        let mut stage = PipelineStage::Loaded;
        while let Some(next) = stage.next() {
            tracker.advance(next, false).unwrap();
            stage = next;
        }

        assert!(tracker.stage().is_terminal());
        assert_eq!(tracker.history().len(), 7);
    }

    #[test]
    fn skipping_a_stage_is_rejected() {
        let mut tracker = StageTracker::new();
        let err = tracker.advance(PipelineStage::Measured, false).unwrap_err();
        assert!(matches!(
            err,
            AudioError::InvalidTransition {
                from: PipelineStage::Loaded,
                to: PipelineStage::Measured
            }
        ));
        assert_eq!(tracker.stage(), PipelineStage::Loaded);
    }

    #[test]
    fn re_entering_is_rejected() {
        let mut tracker = StageTracker::new();
        tracker.advance(PipelineStage::BassFiltered, true).unwrap();
        assert!(tracker.advance(PipelineStage::BassFiltered, false).is_err());
    }

    #[test]
    fn done_has_no_successor() {
        assert_eq!(PipelineStage::Done.next(), None);
    }

    #[test]
    fn bypass_is_recorded() {
        let mut tracker = StageTracker::new();
        tracker.advance(PipelineStage::BassFiltered, true).unwrap();
        assert!(tracker.history()[1].skipped);
    }
}
