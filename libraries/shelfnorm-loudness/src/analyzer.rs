//! EBU R128 loudness analysis
//!
//! This module provides EBU R128-compliant loudness measurement using the ebur128 crate.
//! It measures:
//! - Integrated loudness (LUFS) - the overall perceived loudness
//! - Loudness range (LRA) - the variation in loudness
//! - True peak (dBTP) - the maximum inter-sample peak level
//! - Sample peak (dBFS) - the maximum sample value

use crate::error::{LoudnessError, Result};
use crate::GATING_BLOCK_SECS;
use ebur128::{EbuR128, Mode};
use shelfnorm_core::{AudioBuffer, LoudnessMeter};
use std::fmt;
use std::ops::RangeInclusive;

/// Information about the loudness characteristics of a signal
#[derive(Debug, Clone, PartialEq)]
pub struct LoudnessInfo {
    /// Integrated loudness in LUFS (Loudness Units Full Scale)
    pub integrated_lufs: f64,

    /// Loudness range in LU (Loudness Units)
    pub loudness_range_lu: f64,

    /// True peak in dBTP, measured with oversampling as per ITU-R BS.1770
    pub true_peak_dbfs: f64,

    /// Sample peak in dBFS (not accounting for inter-sample peaks)
    pub sample_peak_dbfs: f64,

    /// Duration of the analyzed audio in seconds
    pub duration_seconds: f64,

    /// Sample rate of the analyzed audio
    pub sample_rate: u32,

    /// Number of channels
    pub channels: u32,
}

impl LoudnessInfo {
    /// Check if the audio would clip when applying gain
    pub fn will_clip_at_gain(&self, gain_db: f64) -> bool {
        self.sample_peak_dbfs + gain_db > 0.0
    }

    /// Gain in dB that brings this signal to `target_lufs`
    pub fn gain_to(&self, target_lufs: f64) -> f64 {
        target_lufs - self.integrated_lufs
    }
}

impl fmt::Display for LoudnessInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loudness: {:.1} LUFS, Range: {:.1} LU, True Peak: {:.1} dBTP, Sample Peak: {:.1} dBFS",
            self.integrated_lufs,
            self.loudness_range_lu,
            self.true_peak_dbfs,
            self.sample_peak_dbfs
        )
    }
}

/// EBU R128 loudness analyzer
///
/// Analyzes audio samples to measure loudness according to EBU R128 / ITU-R BS.1770.
///
/// # Example
///
/// ```ignore
/// use shelfnorm_loudness::LoudnessAnalyzer;
///
/// let mut analyzer = LoudnessAnalyzer::new(44100, 2)?;
/// analyzer.add_buffer(&buffer)?;
///
/// let info = analyzer.finalize()?;
/// println!("Integrated loudness: {:.1} LUFS", info.integrated_lufs);
/// ```
pub struct LoudnessAnalyzer {
    ebur128: EbuR128,
    sample_rate: u32,
    channels: u32,
    /// Total samples processed (all channels)
    samples_processed: usize,
}

/// Sample rates accepted by `ebur128`
pub const SUPPORTED_SAMPLE_RATES: RangeInclusive<u32> = 16..=2_822_400;

/// Channel counts accepted by `ebur128`
pub const MAX_CHANNELS: usize = 64;

impl LoudnessAnalyzer {
    /// Create an analyzer reporting loudness, range and peaks
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz (16-2822400)
    /// * `channels` - Number of channels (1-64)
    pub fn new(sample_rate: u32, channels: u32) -> Result<Self> {
        Self::with_mode(
            sample_rate,
            channels,
            Mode::I | Mode::LRA | Mode::SAMPLE_PEAK | Mode::TRUE_PEAK,
        )
    }

    /// Create an analyzer that only tracks integrated loudness
    ///
    /// Skips the range histogram and true-peak oversampling. Use
    /// [`finalize_integrated`](Self::finalize_integrated) to read the result.
    pub fn integrated(sample_rate: u32, channels: u32) -> Result<Self> {
        Self::with_mode(sample_rate, channels, Mode::I)
    }

    fn with_mode(sample_rate: u32, channels: u32, mode: Mode) -> Result<Self> {
        if !SUPPORTED_SAMPLE_RATES.contains(&sample_rate) {
            return Err(LoudnessError::InvalidSampleRate(sample_rate));
        }
        if channels == 0 || channels as usize > MAX_CHANNELS {
            return Err(LoudnessError::InvalidChannelCount(channels as usize));
        }

        let ebur128 = EbuR128::new(channels, sample_rate, mode)?;

        Ok(Self {
            ebur128,
            sample_rate,
            channels,
            samples_processed: 0,
        })
    }

    /// Create a full analyzer matching the layout of `buffer`
    pub fn for_buffer(buffer: &AudioBuffer) -> Result<Self> {
        Self::new(buffer.sample_rate().as_hz(), channel_count(buffer)?)
    }

    /// Add interleaved f64 frames for analysis
    ///
    /// Length must be divisible by the channel count.
    pub fn add_frames(&mut self, samples: &[f64]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        if samples.len() % self.channels as usize != 0 {
            return Err(LoudnessError::AnalysisError(format!(
                "Sample count {} is not divisible by channel count {}",
                samples.len(),
                self.channels
            )));
        }

        self.ebur128.add_frames_f64(samples)?;
        self.samples_processed += samples.len();

        Ok(())
    }

    /// Add a whole planar buffer
    pub fn add_buffer(&mut self, buffer: &AudioBuffer) -> Result<()> {
        if buffer.channel_count() != self.channels as usize {
            return Err(LoudnessError::AnalysisError(format!(
                "Buffer has {} channels, analyzer expects {}",
                buffer.channel_count(),
                self.channels
            )));
        }
        self.add_frames(&buffer.to_interleaved())
    }

    /// Finalize analysis and get loudness information
    ///
    /// # Errors
    /// - `NoSamples` if nothing was added
    /// - `TooShort` if less than one gating block was added
    /// - `SilentAudio` if every block was gated out
    /// - `AnalysisError` if the analyzer was built with
    ///   [`integrated`](Self::integrated)
    pub fn finalize(self) -> Result<LoudnessInfo> {
        let (integrated_lufs, duration_seconds) = self.gated_loudness()?;

        let loudness_range_lu = self.ebur128.loudness_range()?;

        let mut true_peak_linear = 0.0_f64;
        let mut sample_peak_linear = 0.0_f64;
        for ch in 0..self.channels {
            true_peak_linear = true_peak_linear.max(self.ebur128.true_peak(ch)?);
            sample_peak_linear = sample_peak_linear.max(self.ebur128.sample_peak(ch)?);
        }

        Ok(LoudnessInfo {
            integrated_lufs,
            loudness_range_lu,
            true_peak_dbfs: peak_to_db(true_peak_linear),
            sample_peak_dbfs: peak_to_db(sample_peak_linear),
            duration_seconds,
            sample_rate: self.sample_rate,
            channels: self.channels,
        })
    }

    /// Finalize and return only the integrated loudness in LUFS
    ///
    /// Same errors as [`finalize`](Self::finalize) for the gating checks.
    pub fn finalize_integrated(self) -> Result<f64> {
        self.gated_loudness().map(|(lufs, _)| lufs)
    }

    /// Get the number of samples processed
    pub fn samples_processed(&self) -> usize {
        self.samples_processed
    }

    fn gated_loudness(&self) -> Result<(f64, f64)> {
        if self.samples_processed == 0 {
            return Err(LoudnessError::NoSamples);
        }

        let frames = self.samples_processed / self.channels as usize;
        let duration_seconds = frames as f64 / f64::from(self.sample_rate);
        if duration_seconds < GATING_BLOCK_SECS {
            return Err(LoudnessError::TooShort {
                duration_secs: duration_seconds,
            });
        }

        let integrated_lufs = self.ebur128.loudness_global()?;

        // ebur128 returns -inf when every block falls below the absolute gate
        if integrated_lufs.is_infinite() || integrated_lufs.is_nan() {
            return Err(LoudnessError::SilentAudio);
        }

        Ok((integrated_lufs, duration_seconds))
    }
}

fn channel_count(buffer: &AudioBuffer) -> Result<u32> {
    let count = buffer.channel_count();
    u32::try_from(count).map_err(|_| LoudnessError::InvalidChannelCount(count))
}

fn peak_to_db(linear: f64) -> f64 {
    if linear > 0.0 {
        20.0 * linear.log10()
    } else {
        f64::NEG_INFINITY
    }
}

/// Analyze a whole buffer in one call
pub fn analyze(buffer: &AudioBuffer) -> Result<LoudnessInfo> {
    let mut analyzer = LoudnessAnalyzer::for_buffer(buffer)?;
    analyzer.add_buffer(buffer)?;
    analyzer.finalize()
}

/// Integrated loudness of a whole buffer in LUFS
pub fn integrated_loudness(buffer: &AudioBuffer) -> Result<f64> {
    let mut analyzer =
        LoudnessAnalyzer::integrated(buffer.sample_rate().as_hz(), channel_count(buffer)?)?;
    analyzer.add_buffer(buffer)?;
    analyzer.finalize_integrated()
}

/// Integrated loudness meter backed by `ebur128`
///
/// Stateless: a fresh analyzer is created for every measurement.
#[derive(Debug, Clone, Copy, Default)]
pub struct EbuR128Meter;

impl EbuR128Meter {
    /// Create a meter
    pub fn new() -> Self {
        Self
    }

    /// Full loudness report for `buffer`
    pub fn analyze(&self, buffer: &AudioBuffer) -> Result<LoudnessInfo> {
        analyze(buffer)
    }
}

impl LoudnessMeter for EbuR128Meter {
    fn measure(&self, buffer: &AudioBuffer) -> shelfnorm_core::Result<f64> {
        Ok(integrated_loudness(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfnorm_core::{CoreError, SampleRate};

    fn sine(sample_rate: u32, frequency: f64, amplitude: f64, secs: f64) -> Vec<f64> {
        let n = (f64::from(sample_rate) * secs) as usize;
        (0..n)
            .map(|i| {
                let t = i as f64 / f64::from(sample_rate);
                amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_analyzer_creation() {
        assert!(LoudnessAnalyzer::new(44100, 2).is_ok());
        assert!(LoudnessAnalyzer::new(48000, 1).is_ok());
        assert!(LoudnessAnalyzer::new(96000, 6).is_ok());

        assert!(LoudnessAnalyzer::new(8000, 10).is_ok());
        assert!(LoudnessAnalyzer::new(705_600, 2).is_ok());

        assert!(matches!(
            LoudnessAnalyzer::new(8, 2),
            Err(LoudnessError::InvalidSampleRate(8))
        ));
        assert!(matches!(
            LoudnessAnalyzer::new(3_000_000, 2),
            Err(LoudnessError::InvalidSampleRate(3_000_000))
        ));
        assert!(matches!(
            LoudnessAnalyzer::new(44100, 0),
            Err(LoudnessError::InvalidChannelCount(0))
        ));
    }

    #[test]
    fn too_many_channels_reports_actual_count() {
        let buffer =
            AudioBuffer::new(vec![vec![0.1; 48000]; 65], SampleRate::DVD_QUALITY).unwrap();
        assert!(matches!(
            analyze(&buffer),
            Err(LoudnessError::InvalidChannelCount(65))
        ));
        assert!(matches!(
            integrated_loudness(&buffer),
            Err(LoudnessError::InvalidChannelCount(65))
        ));
    }

    #[test]
    fn integrated_only_analyzer_cannot_report_range() {
        let ch = sine(48000, 1000.0, 0.1, 1.0);
        let mut analyzer = LoudnessAnalyzer::integrated(48000, 1).unwrap();
        analyzer.add_frames(&ch).unwrap();
        assert!(matches!(
            analyzer.finalize(),
            Err(LoudnessError::AnalysisError(_))
        ));
    }

    #[test]
    fn meter_reading_matches_full_report() {
        let ch = sine(48000, 440.0, 0.25, 2.0);
        let buffer = AudioBuffer::new(vec![ch.clone(), ch], SampleRate::DVD_QUALITY).unwrap();

        let full = analyze(&buffer).unwrap().integrated_lufs;
        let measured = EbuR128Meter::new().measure(&buffer).unwrap();
        assert!((full - measured).abs() < 1e-9, "{full} vs {measured}");
    }

    #[test]
    fn integrated_only_keeps_gating_checks() {
        let silent = AudioBuffer::new(vec![vec![0.0; 48000]], SampleRate::DVD_QUALITY).unwrap();
        assert!(matches!(
            integrated_loudness(&silent),
            Err(LoudnessError::SilentAudio)
        ));

        let short =
            AudioBuffer::new(vec![sine(48000, 1000.0, 1.0, 0.1)], SampleRate::DVD_QUALITY).unwrap();
        assert!(matches!(
            integrated_loudness(&short),
            Err(LoudnessError::TooShort { .. })
        ));
    }

    #[test]
    fn test_silent_audio() {
        let buffer = AudioBuffer::new(vec![vec![0.0; 44100]; 2], SampleRate::CD_QUALITY).unwrap();
        assert!(matches!(analyze(&buffer), Err(LoudnessError::SilentAudio)));
    }

    #[test]
    fn test_too_short() {
        let buffer =
            AudioBuffer::new(vec![sine(48000, 1000.0, 1.0, 0.01)], SampleRate::DVD_QUALITY).unwrap();
        assert!(matches!(
            analyze(&buffer),
            Err(LoudnessError::TooShort { .. })
        ));
    }

    #[test]
    fn test_no_samples_error() {
        let analyzer = LoudnessAnalyzer::new(44100, 2).unwrap();
        assert!(matches!(analyzer.finalize(), Err(LoudnessError::NoSamples)));
    }

    #[test]
    fn test_invalid_sample_count() {
        let mut analyzer = LoudnessAnalyzer::new(44100, 2).unwrap();
        assert!(analyzer.add_frames(&[0.1; 5]).is_err());
    }

    #[test]
    fn test_sine_wave_loudness() {
        // -20 dBFS, 1 kHz, 3 seconds, stereo
        let ch = sine(44100, 1000.0, 0.1, 3.0);
        let buffer = AudioBuffer::new(vec![ch.clone(), ch], SampleRate::CD_QUALITY).unwrap();
        let info = analyze(&buffer).unwrap();

        // Stereo -20 dBFS sine sits around -20 LUFS after K-weighting and channel summing
        assert!(
            info.integrated_lufs > -24.0 && info.integrated_lufs < -16.0,
            "Expected loudness around -20 LUFS, got {:.1}",
            info.integrated_lufs
        );
        assert!((info.sample_peak_dbfs - (-20.0)).abs() < 0.1);
        assert!((info.duration_seconds - 3.0).abs() < 1e-9);
    }

    #[test]
    fn meter_maps_failures_to_measurement_failure() {
        let buffer = AudioBuffer::new(vec![vec![0.0; 48000]], SampleRate::DVD_QUALITY).unwrap();
        let err = EbuR128Meter::new().measure(&buffer).unwrap_err();
        assert!(matches!(err, CoreError::MeasurementFailure(_)));
    }

    #[test]
    fn test_loudness_info_clipping() {
        let info = LoudnessInfo {
            integrated_lufs: -20.0,
            loudness_range_lu: 5.0,
            true_peak_dbfs: -1.0,
            sample_peak_dbfs: -1.5,
            duration_seconds: 180.0,
            sample_rate: 44100,
            channels: 2,
        };

        assert!(info.will_clip_at_gain(2.0));
        assert!(!info.will_clip_at_gain(1.0));
        assert!((info.gain_to(-14.0) - 6.0).abs() < 1e-12);
    }
}
