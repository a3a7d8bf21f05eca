/// Application configuration
///
/// Layered with the `config` crate, lowest to highest precedence:
/// built-in defaults, a TOML file, `SHELFNORM_*` environment variables
/// (`__` between nested keys), then command-line flags.
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use shelfnorm_audio::{PipelineConfig, WavFormat};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "shelfnorm.toml";

/// Environment variable prefix, e.g. `SHELFNORM_PIPELINE__TARGET_LUFS=-16`
pub const ENV_PREFIX: &str = "SHELFNORM";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputSettings {
    #[serde(default = "default_bits_per_sample")]
    pub bits_per_sample: u16,

    /// Write IEEE float samples instead of integer PCM
    #[serde(default)]
    pub float: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            bits_per_sample: default_bits_per_sample(),
            float: false,
        }
    }
}

impl OutputSettings {
    pub fn format(&self) -> Result<WavFormat> {
        Ok(WavFormat::from_bits(self.bits_per_sample, self.float)?)
    }
}

fn default_bits_per_sample() -> u16 {
    16
}

/// Values given on the command line; `None` keeps the lower layers
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub target_lufs: Option<f64>,
    pub bass_gain_db: Option<f64>,
    pub bass_frequency_hz: Option<f64>,
    pub bass_q: Option<f64>,
    pub treble_gain_db: Option<f64>,
    pub treble_frequency_hz: Option<f64>,
    pub treble_q: Option<f64>,
    pub bits_per_sample: Option<u16>,
    pub float: Option<bool>,
}

impl AppConfig {
    /// Load configuration from file, process environment and `overrides`
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_with_environment(path, overrides, None)
    }

    /// Like `load`, reading environment variables from `env` when given
    pub fn load_with_environment(
        path: Option<&Path>,
        overrides: &Overrides,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let defaults = Self::default();
        let pipeline = &defaults.pipeline;

        // Full defaults, so a partial [pipeline.bass] table still deserializes
        let mut settings = config::Config::builder()
            .set_default("pipeline.target_lufs", pipeline.target_lufs)?
            .set_default("pipeline.parallel_channels", pipeline.parallel_channels)?
            .set_default("pipeline.bass.gain_db", pipeline.bass.gain_db)?
            .set_default("pipeline.bass.frequency_hz", pipeline.bass.frequency_hz)?
            .set_default("pipeline.bass.q", pipeline.bass.q)?
            .set_default("pipeline.treble.gain_db", pipeline.treble.gain_db)?
            .set_default("pipeline.treble.frequency_hz", pipeline.treble.frequency_hz)?
            .set_default("pipeline.treble.q", pipeline.treble.q)?
            .set_default(
                "output.bits_per_sample",
                i64::from(defaults.output.bits_per_sample),
            )?
            .set_default("output.float", defaults.output.float)?;

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env);

        let config = settings
            .add_source(environment)
            .set_override_option("pipeline.target_lufs", overrides.target_lufs)?
            .set_override_option("pipeline.bass.gain_db", overrides.bass_gain_db)?
            .set_override_option("pipeline.bass.frequency_hz", overrides.bass_frequency_hz)?
            .set_override_option("pipeline.bass.q", overrides.bass_q)?
            .set_override_option("pipeline.treble.gain_db", overrides.treble_gain_db)?
            .set_override_option(
                "pipeline.treble.frequency_hz",
                overrides.treble_frequency_hz,
            )?
            .set_override_option("pipeline.treble.q", overrides.treble_q)?
            .set_override_option(
                "output.bits_per_sample",
                overrides.bits_per_sample.map(i64::from),
            )?
            .set_override_option("output.float", overrides.float)?
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that do not depend on the input file
    ///
    /// Corner frequencies are checked against the input's Nyquist frequency
    /// once the sample rate is known.
    pub fn validate(&self) -> Result<()> {
        if !self.pipeline.target_lufs.is_finite() {
            return Err(CliError::Invalid(format!(
                "target loudness must be finite, got {}",
                self.pipeline.target_lufs
            )));
        }

        for (name, shelf) in [("bass", &self.pipeline.bass), ("treble", &self.pipeline.treble)] {
            if !(shelf.q.is_finite() && shelf.q > 0.0) {
                return Err(CliError::Invalid(format!(
                    "{name} Q must be greater than 0, got {}",
                    shelf.q
                )));
            }
            if !(shelf.frequency_hz.is_finite() && shelf.frequency_hz > 0.0) {
                return Err(CliError::Invalid(format!(
                    "{name} frequency must be greater than 0 Hz, got {}",
                    shelf.frequency_hz
                )));
            }
        }

        self.output.format()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_is_pcm16() {
        assert_eq!(OutputSettings::default().format().unwrap(), WavFormat::Pcm16);
    }

    #[test]
    fn float_output_needs_32_bits() {
        let output = OutputSettings {
            bits_per_sample: 24,
            float: true,
        };
        assert!(output.format().is_err());
    }

    #[test]
    fn non_positive_q_is_invalid() {
        let mut config = AppConfig::default();
        config.pipeline.treble.q = 0.0;
        assert!(matches!(config.validate(), Err(CliError::Invalid(_))));
    }
}
