/// Shelfnorm - shelving EQ and loudness normalization for WAV files
use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use shelfnorm_audio::effects::{FilterKind, BUTTERWORTH_Q};
use shelfnorm_cli::{commands, AppConfig, Overrides};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "shelfnorm")]
#[command(about = "Bass/treble shelving EQ and loudness normalization", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./shelfnorm.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter, normalize and clip a WAV file
    Process {
        /// Input WAV file
        input: PathBuf,
        /// Output WAV file
        output: PathBuf,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Print the EBU R128 loudness of a WAV file
    Analyze {
        /// Input WAV file
        input: PathBuf,
        /// Also print the gain needed to reach this loudness
        #[arg(long, allow_hyphen_values = true)]
        target_lufs: Option<f64>,
    },
    /// Print the normalized second-order section for one shelf
    Coefficients {
        #[arg(long, value_enum)]
        kind: ShelfKind,
        #[arg(long)]
        sample_rate: u32,
        /// Corner frequency in Hz
        #[arg(long)]
        freq: f64,
        /// Shelf gain in dB
        #[arg(long, allow_hyphen_values = true)]
        gain: f64,
        #[arg(long, default_value_t = BUTTERWORTH_Q)]
        q: f64,
    },
}

#[derive(Args)]
struct SettingsArgs {
    /// Target integrated loudness (LUFS)
    #[arg(long, allow_hyphen_values = true)]
    target_lufs: Option<f64>,
    /// Low-shelf gain (dB)
    #[arg(long, allow_hyphen_values = true)]
    bass_gain: Option<f64>,
    /// Low-shelf corner frequency (Hz)
    #[arg(long)]
    bass_freq: Option<f64>,
    #[arg(long)]
    bass_q: Option<f64>,
    /// High-shelf gain (dB)
    #[arg(long, allow_hyphen_values = true)]
    treble_gain: Option<f64>,
    /// High-shelf corner frequency (Hz)
    #[arg(long)]
    treble_freq: Option<f64>,
    #[arg(long)]
    treble_q: Option<f64>,
    /// Output bit depth (16 or 24, or 32 with --float)
    #[arg(long)]
    bits: Option<u16>,
    /// Write 32-bit float samples
    #[arg(long)]
    float: bool,
}

impl From<SettingsArgs> for Overrides {
    fn from(args: SettingsArgs) -> Self {
        Self {
            target_lufs: args.target_lufs,
            bass_gain_db: args.bass_gain,
            bass_frequency_hz: args.bass_freq,
            bass_q: args.bass_q,
            treble_gain_db: args.treble_gain,
            treble_frequency_hz: args.treble_freq,
            treble_q: args.treble_q,
            bits_per_sample: args.bits.or(args.float.then_some(32)),
            float: args.float.then_some(true),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ShelfKind {
    Low,
    High,
}

impl From<ShelfKind> for FilterKind {
    fn from(kind: ShelfKind) -> Self {
        match kind {
            ShelfKind::Low => FilterKind::LowShelf,
            ShelfKind::High => FilterKind::HighShelf,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelfnorm=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            settings,
        } => {
            let config = AppConfig::load(cli.config.as_deref(), &settings.into())
                .context("Failed to load configuration")?;
            let report = commands::process(&input, &output, &config)
                .with_context(|| format!("Failed to process {}", input.display()))?;
            println!("{}: {}", output.display(), commands::summary(&report));
        }
        Commands::Analyze { input, target_lufs } => {
            let info = commands::analyze(&input)
                .with_context(|| format!("Failed to analyze {}", input.display()))?;
            println!("{info}");
            if let Some(target) = target_lufs {
                let gain = info.gain_to(target);
                println!(
                    "Gain to {:.1} LUFS: {:+.2} dB{}",
                    target,
                    gain,
                    if info.will_clip_at_gain(gain) { " (would clip)" } else { "" }
                );
            }
        }
        Commands::Coefficients {
            kind,
            sample_rate,
            freq,
            gain,
            q,
        } => {
            let sos = commands::coefficients(kind.into(), sample_rate, freq, gain, q)
                .context("Invalid filter parameters")?;
            println!("{}", commands::format_sos(&sos));
        }
    }

    Ok(())
}
