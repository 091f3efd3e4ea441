//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::recording::{Duration, Quality};

/// Record audio into an Ogg/Vorbis file
#[derive(Parser, Debug)]
#[command(name = "vorbis-recorder")]
#[command(version)]
#[command(about = "Record audio from an input device into an Ogg/Vorbis file")]
#[command(long_about = None)]
pub struct Cli {
    /// Recording duration (e.g., 10s, 1m, 2m30s)
    #[arg(short = 'd', long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Output file (defaults to recording-<timestamp>.ogg in output_dir)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Vorbis VBR quality between 0.0 and 1.0
    #[arg(short = 'q', long, value_name = "Q")]
    pub quality: Option<String>,

    /// Input device name (defaults to the system input)
    #[arg(long, value_name = "NAME", conflicts_with = "tone")]
    pub device: Option<String>,

    /// Record a generated sine tone instead of a device
    #[arg(long, value_name = "HZ")]
    pub tone: Option<f32>,

    /// Channel count of the generated tone
    #[arg(long, value_name = "N", default_value_t = 1, requires = "tone")]
    pub channels: u16,

    /// Sample rate of the generated tone
    #[arg(long, value_name = "HZ", default_value_t = 48_000, requires = "tone")]
    pub sample_rate: u32,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Where samples come from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOptions {
    /// A cpal input device, by name or the default one
    Device { name: Option<String> },
    /// Generated sine tone
    Tone {
        frequency: f32,
        channels: u16,
        sample_rate: u32,
    },
}

/// Parsed record options
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub duration: Duration,
    pub output: PathBuf,
    pub quality: Quality,
    pub frames_per_buffer: usize,
    pub source: SourceOptions,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "duration",
    "quality",
    "output_dir",
    "device",
    "frames_per_buffer",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["vorbis-recorder"]);
        assert!(cli.duration.is_none());
        assert!(cli.output.is_none());
        assert!(cli.quality.is_none());
        assert!(cli.device.is_none());
        assert!(cli.tone.is_none());
        assert_eq!(cli.channels, 1);
        assert_eq!(cli.sample_rate, 48_000);
    }

    #[test]
    fn cli_parses_recording_flags() {
        let cli = Cli::parse_from([
            "vorbis-recorder",
            "-d",
            "30s",
            "-o",
            "take.ogg",
            "-q",
            "0.5",
            "--device",
            "USB Mic",
        ]);
        assert_eq!(cli.duration, Some("30s".to_string()));
        assert_eq!(cli.output, Some(PathBuf::from("take.ogg")));
        assert_eq!(cli.quality, Some("0.5".to_string()));
        assert_eq!(cli.device, Some("USB Mic".to_string()));
    }

    #[test]
    fn cli_parses_tone() {
        let cli = Cli::parse_from([
            "vorbis-recorder",
            "--tone",
            "440",
            "--channels",
            "2",
            "--sample-rate",
            "44100",
        ]);
        assert_eq!(cli.tone, Some(440.0));
        assert_eq!(cli.channels, 2);
        assert_eq!(cli.sample_rate, 44_100);
    }

    #[test]
    fn tone_conflicts_with_device() {
        let result = Cli::try_parse_from(["vorbis-recorder", "--tone", "440", "--device", "hw:0"]);
        assert!(result.is_err());
    }

    #[test]
    fn channels_require_tone() {
        let result = Cli::try_parse_from(["vorbis-recorder", "--channels", "2"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["vorbis-recorder", "config", "set", "quality", "0.4"]);
        if let Some(Commands::Config {
            action: ConfigAction::Set { key, value },
        }) = cli.command
        {
            assert_eq!(key, "quality");
            assert_eq!(value, "0.4");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("duration"));
        assert!(is_valid_config_key("frames_per_buffer"));
        assert!(!is_valid_config_key("api_key"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
