//! End-to-end pipeline tests
//!
//! Runs complete buffers through `Pipeline` with both the EBU R128 meter and
//! a deterministic RMS meter, and checks the ordering and failure guarantees.

use shelfnorm_audio::effects::{apply, FilterSpec};
use shelfnorm_audio::{
    Pipeline, PipelineConfig, PipelineStage, ShelfSettings, StageOutcome, WavSink, WavSource,
};
use shelfnorm_core::{
    AudioBuffer, CoreError, LoudnessMeter, LoudnessNormalization, SampleRate,
};
use shelfnorm_loudness::{analyze, db_to_linear, GainNormalizer};
use std::cell::RefCell;
use std::f64::consts::PI;

// ========== Helpers ==========

fn sine(sample_rate: u32, frequency: f64, amplitude: f64, frames: usize) -> Vec<f64> {
    (0..frames)
        .map(|i| amplitude * (2.0 * PI * frequency * i as f64 / f64::from(sample_rate)).sin())
        .collect()
}

fn rms(buffer: &AudioBuffer) -> f64 {
    let n = buffer.channel_count() * buffer.frames();
    (buffer.samples().map(|s| s * s).sum::<f64>() / n as f64).sqrt()
}

/// Loudness = RMS in dB plus a fixed calibration offset
///
/// Scale-covariant like a real integrated loudness meter, but without a
/// minimum duration, so short test signals can be measured.
struct RmsMeter {
    offset_db: f64,
}

impl RmsMeter {
    /// Meter that reads `lufs` for `reference`
    fn calibrated(reference: &AudioBuffer, lufs: f64) -> Self {
        Self {
            offset_db: lufs - 20.0 * rms(reference).log10(),
        }
    }
}

impl LoudnessMeter for RmsMeter {
    fn measure(&self, buffer: &AudioBuffer) -> shelfnorm_core::Result<f64> {
        let level = rms(buffer);
        if level == 0.0 {
            return Err(CoreError::measurement("signal is silent"));
        }
        Ok(20.0 * level.log10() + self.offset_db)
    }
}

struct FixedMeter(f64);

impl LoudnessMeter for FixedMeter {
    fn measure(&self, _buffer: &AudioBuffer) -> shelfnorm_core::Result<f64> {
        Ok(self.0)
    }
}

/// Keeps a copy of the normalized buffer, before the pipeline clips it
#[derive(Default)]
struct RecordingNormalizer {
    last: RefCell<Option<AudioBuffer>>,
}

impl LoudnessNormalization for RecordingNormalizer {
    fn apply_gain(
        &self,
        buffer: AudioBuffer,
        measured_lufs: f64,
        target_lufs: f64,
    ) -> shelfnorm_core::Result<AudioBuffer> {
        let out = GainNormalizer::new().apply_gain(buffer, measured_lufs, target_lufs)?;
        *self.last.borrow_mut() = Some(out.clone());
        Ok(out)
    }
}

/// Normalization that corrupts a few samples with non-finite values
struct CorruptingNormalizer;

impl LoudnessNormalization for CorruptingNormalizer {
    fn apply_gain(
        &self,
        buffer: AudioBuffer,
        measured_lufs: f64,
        target_lufs: f64,
    ) -> shelfnorm_core::Result<AudioBuffer> {
        let mut out = GainNormalizer::new().apply_gain(buffer, measured_lufs, target_lufs)?;
        for (channel, bad) in out
            .channels_mut()
            .into_iter()
            .zip([f64::NAN, f64::INFINITY, f64::NEG_INFINITY])
        {
            channel[0] = bad;
        }
        Ok(out)
    }
}

// ========== Reference Scenario ==========

#[test]
fn unit_sine_bypassed_shelves_gains_6db() {
    let input = AudioBuffer::new(vec![sine(48000, 1000.0, 1.0, 480)], SampleRate::DVD_QUALITY)
        .unwrap();
    let meter = RmsMeter::calibrated(&input, -20.0);
    let recorder = RecordingNormalizer::default();

    let out = Pipeline::with_collaborators(PipelineConfig::flat(-14.0), &meter, &recorder)
        .run(input.clone())
        .unwrap();
    let report = &out.report;

    assert_eq!(report.bass, StageOutcome::Bypassed);
    assert_eq!(report.treble, StageOutcome::Bypassed);
    assert!((report.measured_lufs - -20.0).abs() < 1e-9);
    assert!((report.gain_db - 6.0).abs() < 1e-9);

    let factor = report.peak_before_clip / input.peak();
    assert!((factor - 1.9953).abs() < 1e-4, "peak grew by {factor}");

    let normalized = recorder.last.borrow_mut().take().unwrap();
    let remeasured = meter.measure(&normalized).unwrap();
    assert!((remeasured - -14.0).abs() < 1e-9);

    // Unit sine at +6 dB exceeds full scale
    assert!(report.clipped_samples > 0);
    assert!(out.buffer.samples().all(|s| (-1.0..=1.0).contains(&s)));
    assert_eq!(out.buffer.peak(), 1.0);
}

#[test]
fn default_config_with_ebu_meter() {
    let tone = sine(48000, 1000.0, 0.1, 48000 * 3);
    let input = AudioBuffer::new(vec![tone.clone(), tone], SampleRate::DVD_QUALITY).unwrap();

    let out = Pipeline::new(PipelineConfig::default()).run(input).unwrap();
    let report = &out.report;

    // Two channels of a -20 dBFS tone read about -20 LUFS
    assert!((report.measured_lufs - -20.0).abs() < 0.5, "{}", report.measured_lufs);
    assert_eq!(report.target_lufs, -14.0);
    assert_eq!(report.clipped_samples, 0);

    let remeasured = analyze(&out.buffer).unwrap().integrated_lufs;
    assert!((remeasured - -14.0).abs() < 0.1, "re-measured {remeasured}");
}

// ========== Errors ==========

#[test]
fn unequal_channels_rejected_before_processing() {
    let err = AudioBuffer::new(vec![vec![0.0; 480], vec![0.0; 479]], SampleRate::DVD_QUALITY)
        .unwrap_err();
    assert_eq!(
        err,
        CoreError::ChannelLengthMismatch {
            channel: 1,
            expected: 480,
            actual: 479
        }
    );
    assert!(shelfnorm_audio::AudioError::from(err).is_channel_length_mismatch());
}

#[test]
fn silent_input_is_a_measurement_failure() {
    let input = AudioBuffer::new(vec![vec![0.0; 48000]], SampleRate::DVD_QUALITY).unwrap();
    let err = Pipeline::new(PipelineConfig::default()).run(input).unwrap_err();
    assert!(err.is_measurement_failure(), "{err}");
}

#[test]
fn nyquist_corner_aborts_pipeline() {
    let mut config = PipelineConfig::default();
    config.treble = ShelfSettings::new(3.0, 24000.0, 0.707);
    let input = AudioBuffer::new(vec![sine(48000, 440.0, 0.5, 4800)], SampleRate::DVD_QUALITY)
        .unwrap();

    let err = Pipeline::with_collaborators(config, FixedMeter(-20.0), GainNormalizer::new())
        .run(input)
        .unwrap_err();
    assert!(err.is_invalid_filter_parameter());
}

#[test]
fn failed_measurement_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("silence.wav");
    let output_path = dir.path().join("out.wav");

    let silence = AudioBuffer::new(vec![vec![0.0; 48000]; 2], SampleRate::DVD_QUALITY).unwrap();
    shelfnorm_audio::write_wav(&input_path, &silence, shelfnorm_audio::WavFormat::Pcm16).unwrap();

    let err = Pipeline::new(PipelineConfig::default())
        .process(
            &mut WavSource::new(&input_path),
            &mut WavSink::new(&output_path, shelfnorm_audio::WavFormat::Pcm16),
        )
        .unwrap_err();

    assert!(err.is_measurement_failure());
    assert!(!output_path.exists());
}

// ========== Bypass ==========

#[test]
fn negligible_bass_matches_treble_only_processing() {
    let sample_rate = SampleRate::CD_QUALITY;
    let left = sine(44100, 80.0, 0.3, 4410);
    let right = sine(44100, 9000.0, 0.2, 4410);
    let input = AudioBuffer::new(vec![left.clone(), right.clone()], sample_rate).unwrap();

    let mut config = PipelineConfig::flat(-14.0);
    config.bass.gain_db = 5e-7;
    config.treble.gain_db = -3.0;

    let out = Pipeline::with_collaborators(config, FixedMeter(-18.0), GainNormalizer::new())
        .run(input)
        .unwrap();
    assert_eq!(out.report.bass, StageOutcome::Bypassed);

    let section = FilterSpec::high_shelf(6000.0, -3.0, 0.707)
        .design(sample_rate)
        .unwrap();
    let gain = db_to_linear(4.0);
    for (channel, original) in [left, right].iter().enumerate() {
        let expected: Vec<f64> = apply(&[section], original)
            .into_iter()
            .map(|s| (s * gain).clamp(-1.0, 1.0))
            .collect();
        assert_eq!(out.buffer.channel(channel).unwrap(), expected.as_slice());
    }
}

#[test]
fn stage_history_marks_bypassed_shelves() {
    let input = AudioBuffer::new(vec![sine(48000, 500.0, 0.5, 4800)], SampleRate::DVD_QUALITY)
        .unwrap();
    let mut config = PipelineConfig::default();
    config.bass.gain_db = 4.0;
    config.treble.gain_db = 0.0;

    let out = Pipeline::with_collaborators(config, FixedMeter(-10.0), GainNormalizer::new())
        .run(input)
        .unwrap();

    let skipped: Vec<(PipelineStage, bool)> =
        out.report.stages.iter().map(|r| (r.stage, r.skipped)).collect();
    assert_eq!(
        skipped,
        vec![
            (PipelineStage::Loaded, false),
            (PipelineStage::BassFiltered, false),
            (PipelineStage::TrebleFiltered, true),
            (PipelineStage::Measured, false),
            (PipelineStage::Normalized, false),
            (PipelineStage::Clipped, false),
            (PipelineStage::Done, false),
        ]
    );
}

#[test]
fn non_finite_normalizer_output_is_clipped_into_range() {
    let tone = sine(48000, 1000.0, 0.1, 4800);
    let input = AudioBuffer::new(vec![tone.clone(), tone.clone(), tone], SampleRate::DVD_QUALITY)
        .unwrap();

    let out = Pipeline::with_collaborators(
        PipelineConfig::flat(-14.0),
        FixedMeter(-20.0),
        CorruptingNormalizer,
    )
    .run(input)
    .unwrap();

    assert!(out.buffer.samples().all(|s| (-1.0..=1.0).contains(&s)));
    assert_eq!(out.buffer.channel(0).unwrap()[0], 0.0);
    assert_eq!(out.buffer.channel(1).unwrap()[0], 1.0);
    assert_eq!(out.buffer.channel(2).unwrap()[0], -1.0);
    assert_eq!(out.report.clipped_samples, 3);
}
