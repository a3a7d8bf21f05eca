//! WAV file input and output
//!
//! Reads integer PCM (8 to 32 bit) or 32-bit float WAV files into planar
//! `f64` buffers, and writes buffers back as 16/24-bit PCM or 32-bit float.

use crate::error::{AudioError, Result};
use crate::pipeline::clip_sample;
use shelfnorm_core::{AudioBuffer, AudioSink, AudioSource, SampleRate};
use std::path::{Path, PathBuf};

/// Output sample encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WavFormat {
    /// 16-bit signed integer PCM
    #[default]
    Pcm16,
    /// 24-bit signed integer PCM
    Pcm24,
    /// 32-bit IEEE float
    Float32,
}

impl WavFormat {
    /// Pick the format for a bit depth and sample type
    ///
    /// # Errors
    /// `UnsupportedFormat` for anything but 16/24-bit integer or 32-bit float.
    pub fn from_bits(bits_per_sample: u16, float: bool) -> Result<Self> {
        match (bits_per_sample, float) {
            (16, false) => Ok(Self::Pcm16),
            (24, false) => Ok(Self::Pcm24),
            (32, true) => Ok(Self::Float32),
            (bits, true) => Err(AudioError::UnsupportedFormat(format!(
                "{bits}-bit float output (only 32-bit float is supported)"
            ))),
            (bits, false) => Err(AudioError::UnsupportedFormat(format!(
                "{bits}-bit integer output (16 or 24 bit supported)"
            ))),
        }
    }

    pub fn bits_per_sample(self) -> u16 {
        match self {
            Self::Pcm16 => 16,
            Self::Pcm24 => 24,
            Self::Float32 => 32,
        }
    }

    fn sample_format(self) -> hound::SampleFormat {
        match self {
            Self::Float32 => hound::SampleFormat::Float,
            Self::Pcm16 | Self::Pcm24 => hound::SampleFormat::Int,
        }
    }
}

/// Read a whole WAV file into memory
///
/// Integer samples are scaled by `2^(bits - 1)`, so full-scale negative
/// maps to exactly -1.0.
pub fn read_wav(path: impl AsRef<Path>) -> Result<AudioBuffer> {
    let path = path.as_ref();
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                return Err(AudioError::UnsupportedFormat(format!(
                    "{}-bit float input",
                    spec.bits_per_sample
                )));
            }
            reader
                .into_samples::<f32>()
                .map(|s| s.map(f64::from))
                .collect::<std::result::Result<_, _>>()?
        }
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            if !(8..=32).contains(&bits) {
                return Err(AudioError::UnsupportedFormat(format!("{bits}-bit integer input")));
            }
            let max_val = f64::from(1u32 << (bits - 1));
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| f64::from(v) / max_val))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    tracing::debug!(
        "Read {} ({} ch, {} Hz, {}-bit {:?})",
        path.display(),
        spec.channels,
        spec.sample_rate,
        spec.bits_per_sample,
        spec.sample_format
    );

    let buffer = AudioBuffer::from_interleaved(
        &samples,
        usize::from(spec.channels),
        SampleRate::new(spec.sample_rate),
    )?;
    Ok(buffer)
}

/// Write `buffer` to `path` in `format`
///
/// Samples are clipped to [-1.0, 1.0] as in the pipeline; integer formats are scaled by
/// `2^(bits - 1) - 1` and rounded.
pub fn write_wav(path: impl AsRef<Path>, buffer: &AudioBuffer, format: WavFormat) -> Result<()> {
    let path = path.as_ref();
    let channels = u16::try_from(buffer.channel_count()).map_err(|_| {
        AudioError::UnsupportedFormat(format!("{} channels", buffer.channel_count()))
    })?;

    let spec = hound::WavSpec {
        channels,
        sample_rate: buffer.sample_rate().as_hz(),
        bits_per_sample: format.bits_per_sample(),
        sample_format: format.sample_format(),
    };
    let mut writer = hound::WavWriter::create(path, spec)?;

    match format {
        WavFormat::Float32 => {
            for sample in buffer.to_interleaved() {
                writer.write_sample(clip_sample(sample) as f32)?;
            }
        }
        WavFormat::Pcm16 | WavFormat::Pcm24 => {
            let scale = f64::from((1i32 << (format.bits_per_sample() - 1)) - 1);
            for sample in buffer.to_interleaved() {
                writer.write_sample((clip_sample(sample) * scale).round() as i32)?;
            }
        }
    }

    writer.finalize()?;
    tracing::debug!(
        "Wrote {} ({} frames, {:?})",
        path.display(),
        buffer.frames(),
        format
    );
    Ok(())
}

/// `AudioSource` backed by a WAV file
#[derive(Debug, Clone)]
pub struct WavSource {
    path: PathBuf,
}

impl WavSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AudioSource for WavSource {
    type Error = AudioError;

    fn read(&mut self) -> Result<AudioBuffer> {
        read_wav(&self.path)
    }
}

/// `AudioSink` that writes a WAV file
#[derive(Debug, Clone)]
pub struct WavSink {
    path: PathBuf,
    format: WavFormat,
}

impl WavSink {
    pub fn new(path: impl Into<PathBuf>, format: WavFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }
}

impl AudioSink for WavSink {
    type Error = AudioError;

    fn write(&mut self, buffer: &AudioBuffer) -> Result<()> {
        write_wav(&self.path, buffer, self.format)
    }
}
