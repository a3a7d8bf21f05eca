//! Single-pass shelving EQ and loudness pipeline
//!
//! Drives one buffer through every `PipelineStage` in order. Filter design
//! happens up front, so an invalid stage aborts before any sample changes.

use super::clip::clip_buffer;
use super::config::{PipelineConfig, ShelfSettings};
use super::state::{PipelineStage, StageRecord, StageTracker};
use crate::effects::{filter_buffer, FilterKind, SosCoefficients};
use crate::error::{AudioError, Result};
use shelfnorm_core::{AudioBuffer, AudioSink, AudioSource, LoudnessMeter, LoudnessNormalization};
use shelfnorm_loudness::{linear_to_db, EbuR128Meter, GainNormalizer, LoudnessNormalizer};

/// What happened to one shelving stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageOutcome {
    /// Filter designed and run over every channel
    Applied(SosCoefficients),
    /// Gain was negligible; samples untouched
    Bypassed,
}

impl StageOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessReport {
    pub bass: StageOutcome,
    pub treble: StageOutcome,
    /// Loudness of the filtered signal, as reported by the meter
    pub measured_lufs: f64,
    pub target_lufs: f64,
    /// `target_lufs - measured_lufs`
    pub gain_db: f64,
    /// Largest absolute sample after normalization, before clipping
    pub peak_before_clip: f64,
    /// Samples changed by the clipping stage
    pub clipped_samples: usize,
    /// Every stage visited, in order
    pub stages: Vec<StageRecord>,
}

/// Output buffer together with its report
#[derive(Debug, Clone)]
pub struct ProcessedAudio {
    pub buffer: AudioBuffer,
    pub report: ProcessReport,
}

/// Shelving EQ + loudness normalization pipeline
///
/// `M` measures integrated loudness, `N` applies the normalization gain.
/// Both default to the EBU R128 implementations.
///
/// # Example
///
/// ```ignore
/// use shelfnorm_audio::{Pipeline, PipelineConfig};
///
/// let processed = Pipeline::new(PipelineConfig::default()).run(buffer)?;
/// println!("{:.1} LUFS", processed.report.measured_lufs);
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline<M = EbuR128Meter, N = GainNormalizer> {
    config: PipelineConfig,
    meter: M,
    normalization: N,
}

impl Pipeline {
    /// Pipeline with the EBU R128 meter and plain gain normalization
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_collaborators(config, EbuR128Meter::new(), GainNormalizer::new())
    }
}

impl<M, N> Pipeline<M, N>
where
    M: LoudnessMeter,
    N: LoudnessNormalization,
{
    /// Pipeline with caller-supplied loudness collaborators
    pub fn with_collaborators(config: PipelineConfig, meter: M, normalization: N) -> Self {
        Self {
            config,
            meter,
            normalization,
        }
    }

    /// Run every stage over `buffer`
    ///
    /// # Errors
    /// - `InvalidFilterParameter` if an active shelf cannot be designed for
    ///   the buffer's sample rate
    /// - `MeasurementFailure` when the meter cannot produce a value
    /// - `Normalization` when the normalization collaborator fails
    ///
    /// No buffer is returned on failure.
    pub fn run(self, mut buffer: AudioBuffer) -> Result<ProcessedAudio> {
        let sample_rate = buffer.sample_rate();
        self.config.validate(sample_rate)?;

        let bass = design_stage(&self.config.bass, FilterKind::LowShelf, &buffer)?;
        let treble = design_stage(&self.config.treble, FilterKind::HighShelf, &buffer)?;

        tracing::debug!(
            "Processing {} channel(s), {} frames @ {}",
            buffer.channel_count(),
            buffer.frames(),
            sample_rate
        );

        let mut tracker = StageTracker::new();

        self.shelf_stage(&mut buffer, &mut tracker, PipelineStage::BassFiltered, bass)?;
        self.shelf_stage(&mut buffer, &mut tracker, PipelineStage::TrebleFiltered, treble)?;

        let normalizer = LoudnessNormalizer::new(self.config.target_lufs);
        let measured_lufs = normalizer.measure(&buffer, &self.meter)?;
        tracker.advance(PipelineStage::Measured, false)?;

        let normalized = normalizer.apply(buffer, measured_lufs, &self.normalization)?;
        let mut buffer = normalized.buffer;
        tracker.advance(PipelineStage::Normalized, false)?;

        let peak_before_clip = buffer.peak();
        let clipped_samples = clip_buffer(&mut buffer);
        if clipped_samples > 0 {
            tracing::warn!(
                "Clipped {} sample(s); peak before clipping was {:.3} ({:+.2} dBFS)",
                clipped_samples,
                peak_before_clip,
                linear_to_db(peak_before_clip)
            );
        }
        tracker.advance(PipelineStage::Clipped, false)?;
        tracker.advance(PipelineStage::Done, false)?;

        Ok(ProcessedAudio {
            buffer,
            report: ProcessReport {
                bass,
                treble,
                measured_lufs,
                target_lufs: normalized.target_lufs,
                gain_db: normalized.gain_db,
                peak_before_clip,
                clipped_samples,
                stages: tracker.into_history(),
            },
        })
    }

    /// Read from `source`, run, and write the result to `sink`
    ///
    /// Nothing is written when any stage fails.
    pub fn process<S, K>(self, source: &mut S, sink: &mut K) -> Result<ProcessReport>
    where
        S: AudioSource,
        K: AudioSink,
        AudioError: From<S::Error> + From<K::Error>,
    {
        let buffer = source.read()?;
        let processed = self.run(buffer)?;
        sink.write(&processed.buffer)?;
        Ok(processed.report)
    }

    fn shelf_stage(
        &self,
        buffer: &mut AudioBuffer,
        tracker: &mut StageTracker,
        stage: PipelineStage,
        outcome: StageOutcome,
    ) -> Result<()> {
        match outcome {
            StageOutcome::Applied(section) => {
                filter_buffer(buffer, &[section], self.config.parallel_channels);

                let (kind, settings) = match stage {
                    PipelineStage::BassFiltered => (FilterKind::LowShelf, &self.config.bass),
                    _ => (FilterKind::HighShelf, &self.config.treble),
                };
                tracing::info!(
                    "Applied {} EQ: {:+.1} dB @ {} Hz",
                    kind.label(),
                    settings.gain_db,
                    settings.frequency_hz
                );
                tracker.advance(stage, false)
            }
            StageOutcome::Bypassed => tracker.advance(stage, true),
        }
    }
}

fn design_stage(
    settings: &ShelfSettings,
    kind: FilterKind,
    buffer: &AudioBuffer,
) -> Result<StageOutcome> {
    if settings.is_bypassed() {
        tracing::debug!("Bypassing {} EQ: gain {} dB is negligible", kind.label(), settings.gain_db);
        return Ok(StageOutcome::Bypassed);
    }

    let section = settings.to_spec(kind).design(buffer.sample_rate())?;
    Ok(StageOutcome::Applied(section))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfnorm_core::{CoreError, SampleRate};

    /// Reports a fixed loudness regardless of input
    struct FixedMeter(f64);

    impl LoudnessMeter for FixedMeter {
        fn measure(&self, _buffer: &AudioBuffer) -> shelfnorm_core::Result<f64> {
            Ok(self.0)
        }
    }

    struct FailingMeter;

    impl LoudnessMeter for FailingMeter {
        fn measure(&self, _buffer: &AudioBuffer) -> shelfnorm_core::Result<f64> {
            Err(CoreError::measurement("signal is silent"))
        }
    }

    fn ramp(frames: usize) -> Vec<f64> {
        (0..frames).map(|i| (i as f64 * 0.01).sin() * 0.1).collect()
    }

    fn buffer(channels: usize) -> AudioBuffer {
        AudioBuffer::new(vec![ramp(1024); channels], SampleRate::DVD_QUALITY).unwrap()
    }

    #[test]
    fn visits_every_stage_once() {
        let pipeline =
            Pipeline::with_collaborators(PipelineConfig::default(), FixedMeter(-20.0), GainNormalizer::new());
        let out = pipeline.run(buffer(2)).unwrap();

        let stages: Vec<_> = out.report.stages.iter().map(|r| r.stage).collect();
        assert_eq!(
            stages,
            vec![
                PipelineStage::Loaded,
                PipelineStage::BassFiltered,
                PipelineStage::TrebleFiltered,
                PipelineStage::Measured,
                PipelineStage::Normalized,
                PipelineStage::Clipped,
                PipelineStage::Done,
            ]
        );
        // Default bass gain is 0 dB
        assert!(out.report.stages[1].skipped);
        assert!(!out.report.stages[2].skipped);
    }

    #[test]
    fn default_config_bypasses_bass_only() {
        let pipeline =
            Pipeline::with_collaborators(PipelineConfig::default(), FixedMeter(-20.0), GainNormalizer::new());
        let report = pipeline.run(buffer(1)).unwrap().report;
        assert_eq!(report.bass, StageOutcome::Bypassed);
        assert!(report.treble.is_applied());
    }

    #[test]
    fn gain_follows_measurement() {
        let pipeline =
            Pipeline::with_collaborators(PipelineConfig::flat(-14.0), FixedMeter(-20.0), GainNormalizer::new());
        let input = buffer(1);
        let out = pipeline.run(input.clone()).unwrap();

        assert!((out.report.gain_db - 6.0).abs() < 1e-12);
        let expected = input.peak() * 10.0_f64.powf(6.0 / 20.0);
        assert!((out.report.peak_before_clip - expected).abs() < 1e-12);
        assert_eq!(out.report.clipped_samples, 0);
    }

    #[test]
    fn measurement_failure_aborts() {
        let pipeline =
            Pipeline::with_collaborators(PipelineConfig::default(), FailingMeter, GainNormalizer::new());
        let err = pipeline.run(buffer(1)).unwrap_err();
        assert!(err.is_measurement_failure());
    }

    #[test]
    fn invalid_treble_aborts_before_filtering() {
        let mut config = PipelineConfig::default();
        config.bass.gain_db = 3.0;
        config.treble.frequency_hz = 24000.0;
        let pipeline = Pipeline::with_collaborators(config, FixedMeter(-20.0), GainNormalizer::new());
        assert!(pipeline.run(buffer(1)).unwrap_err().is_invalid_filter_parameter());
    }

    #[test]
    fn loud_input_is_clipped() {
        let pipeline =
            Pipeline::with_collaborators(PipelineConfig::flat(0.0), FixedMeter(-30.0), GainNormalizer::new());
        let out = pipeline.run(buffer(2)).unwrap();
        assert!(out.report.peak_before_clip > 1.0);
        assert!(out.report.clipped_samples > 0);
        assert!(out.buffer.peak() <= 1.0);
    }
}
