/// Subcommand implementations
use crate::config::AppConfig;
use crate::error::Result;
use shelfnorm_audio::effects::{design, FilterKind, SosCoefficients};
use shelfnorm_audio::{read_wav, AudioError, Pipeline, ProcessReport, StageOutcome, WavSink, WavSource};
use shelfnorm_core::SampleRate;
use shelfnorm_loudness::{EbuR128Meter, LoudnessInfo};
use std::path::Path;

/// Filter, normalize and clip `input`, writing the result to `output`
pub fn process(input: &Path, output: &Path, config: &AppConfig) -> Result<ProcessReport> {
    let format = config.output.format()?;
    tracing::info!("Processing {} -> {}", input.display(), output.display());

    let report = Pipeline::new(config.pipeline.clone())
        .process(&mut WavSource::new(input), &mut WavSink::new(output, format))?;
    Ok(report)
}

/// EBU R128 report for `input`
pub fn analyze(input: &Path) -> Result<LoudnessInfo> {
    let buffer = read_wav(input)?;
    let info = EbuR128Meter::new()
        .analyze(&buffer)
        .map_err(AudioError::from)?;
    Ok(info)
}

/// Design one shelf section
pub fn coefficients(
    kind: FilterKind,
    sample_rate: u32,
    frequency_hz: f64,
    gain_db: f64,
    q: f64,
) -> Result<SosCoefficients> {
    Ok(design(kind, SampleRate::new(sample_rate), frequency_hz, gain_db, q)?)
}

/// One-line summary of a finished run
pub fn summary(report: &ProcessReport) -> String {
    let shelf = |outcome: &StageOutcome| if outcome.is_applied() { "on" } else { "bypassed" };
    format!(
        "{:.2} LUFS -> {:.2} LUFS ({:+.2} dB), bass {}, treble {}, {} clipped sample(s)",
        report.measured_lufs,
        report.target_lufs,
        report.gain_db,
        shelf(&report.bass),
        shelf(&report.treble),
        report.clipped_samples
    )
}

/// SOS row as six space-separated values: b0 b1 b2 a0 a1 a2
pub fn format_sos(sos: &SosCoefficients) -> String {
    sos.as_array()
        .iter()
        .map(|c| format!("{c:.17}"))
        .collect::<Vec<_>>()
        .join(" ")
}
