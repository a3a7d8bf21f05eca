/// Audio-related types
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Sample rate in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleRate(pub u32);

impl SampleRate {
    /// Common sample rates
    pub const CD_QUALITY: Self = Self(44_100);
    pub const DVD_QUALITY: Self = Self(48_000);
    pub const HIGH_RES_96: Self = Self(96_000);

    /// Create a new sample rate
    #[must_use]
    pub fn new(hz: u32) -> Self {
        Self(hz)
    }

    /// Get the sample rate as Hz
    pub fn as_hz(&self) -> u32 {
        self.0
    }

    /// Get the sample rate as a float, for coefficient math
    pub fn as_f64(&self) -> f64 {
        f64::from(self.0)
    }

    /// Half the sample rate
    pub fn nyquist(&self) -> f64 {
        self.as_f64() / 2.0
    }
}

impl std::fmt::Display for SampleRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

/// Multi-channel audio held fully in memory
///
/// Samples are stored planar as f64, one `Vec` per channel. Nominal range is
/// [-1.0, 1.0], but intermediate stages (EQ boost, loudness gain) may exceed
/// it until the buffer is clipped.
///
/// Invariants, checked at construction:
/// - at least one channel
/// - sample rate > 0
/// - all channels hold the same number of samples
/// - every sample is finite
///
/// Mutable access only hands out slices, so the invariants hold for the
/// lifetime of the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f64>>,
    sample_rate: SampleRate,
}

impl AudioBuffer {
    /// Create a new audio buffer from planar channel data
    ///
    /// # Errors
    /// - `InvalidSampleRate` if the rate is 0
    /// - `NoChannels` if `channels` is empty
    /// - `ChannelLengthMismatch` naming the first channel whose length
    ///   differs from channel 0
    /// - `NonFiniteSample` for the first NaN or infinite sample
    pub fn new(channels: Vec<Vec<f64>>, sample_rate: SampleRate) -> Result<Self> {
        if sample_rate.as_hz() == 0 {
            return Err(CoreError::InvalidSampleRate(sample_rate.as_hz()));
        }
        let Some(first) = channels.first() else {
            return Err(CoreError::NoChannels);
        };

        let expected = first.len();
        if let Some((channel, data)) = channels
            .iter()
            .enumerate()
            .find(|(_, data)| data.len() != expected)
        {
            return Err(CoreError::ChannelLengthMismatch {
                channel,
                expected,
                actual: data.len(),
            });
        }

        for (channel, data) in channels.iter().enumerate() {
            if let Some(index) = data.iter().position(|s| !s.is_finite()) {
                return Err(CoreError::NonFiniteSample { channel, index });
            }
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Create a buffer from interleaved samples (L, R, L, R, ...)
    ///
    /// A trailing partial frame is reported as a `ChannelLengthMismatch`
    /// on the first channel that came up short.
    pub fn from_interleaved(
        samples: &[f64],
        channel_count: usize,
        sample_rate: SampleRate,
    ) -> Result<Self> {
        if channel_count == 0 {
            return Err(CoreError::NoChannels);
        }

        let frames = samples.len() / channel_count;
        let remainder = samples.len() % channel_count;
        if remainder != 0 {
            return Err(CoreError::ChannelLengthMismatch {
                channel: remainder,
                expected: frames + 1,
                actual: frames,
            });
        }

        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }

        Self::new(channels, sample_rate)
    }

    /// Sample rate of the buffer
    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Get the duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate.as_f64()
    }

    /// Check if the buffer holds no frames
    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Samples of one channel
    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Iterate over channels
    pub fn channels(&self) -> impl Iterator<Item = &[f64]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// Mutable slices for every channel, in channel order
    pub fn channels_mut(&mut self) -> Vec<&mut [f64]> {
        self.channels.iter_mut().map(Vec::as_mut_slice).collect()
    }

    /// Iterate over every sample of every channel
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.channels.iter().flat_map(|c| c.iter().copied())
    }

    /// Multiply every sample by `gain`
    pub fn scale(&mut self, gain: f64) {
        for channel in &mut self.channels {
            for sample in channel.iter_mut() {
                *sample *= gain;
            }
        }
    }

    /// Largest absolute sample value (0.0 for an empty buffer)
    pub fn peak(&self) -> f64 {
        self.samples().fold(0.0_f64, |peak, s| peak.max(s.abs()))
    }

    /// Interleave channels into a single vector (L, R, L, R, ...)
    pub fn to_interleaved(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.frames() * self.channel_count());
        for frame in 0..self.frames() {
            for channel in &self.channels {
                out.push(channel[frame]);
            }
        }
        out
    }
}
