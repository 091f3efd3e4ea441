//! vorbis-recorder CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vorbis_recorder::cli::{
    app::{default_output_path, load_merged_config, run_record, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
    RecordOptions, SourceOptions,
};
use vorbis_recorder::domain::config::AppConfig;
use vorbis_recorder::domain::recording::{Duration, Quality};
use vorbis_recorder::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let presenter = Presenter::new();

    if let Some(Commands::Config { action }) = cli.command {
        let store = XdgConfigStore::new();
        if let Err(e) = handle_config_command(action, &store, &presenter).await {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        return ExitCode::SUCCESS;
    }

    // Validate quality before it is merged as a number
    let quality = match cli.quality.as_deref().map(str::parse::<Quality>) {
        Some(Ok(q)) => Some(q.value()),
        Some(Err(e)) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
        None => None,
    };

    let cli_config = AppConfig {
        duration: cli.duration.clone(),
        quality,
        output_dir: None,
        device: cli.device.clone(),
        frames_per_buffer: None,
    };
    let config = load_merged_config(cli_config).await;

    let duration = match config.duration.as_ref() {
        Some(s) => match s.parse::<Duration>() {
            Ok(d) => d,
            Err(e) => {
                presenter.error(&format!("Invalid duration: {}", e));
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        },
        None => Duration::default_duration(),
    };

    let source = match cli.tone {
        Some(frequency) if frequency > 0.0 && cli.channels > 0 && cli.sample_rate > 0 => {
            SourceOptions::Tone {
                frequency,
                channels: cli.channels,
                sample_rate: cli.sample_rate,
            }
        }
        Some(_) => {
            presenter.error("Tone frequency, channels and sample rate must be positive");
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
        None => SourceOptions::Device {
            name: config.device.clone(),
        },
    };

    let options = RecordOptions {
        duration,
        output: cli
            .output
            .unwrap_or_else(|| default_output_path(config.output_dir.as_deref())),
        quality: config.quality_or_default(),
        frames_per_buffer: config.frames_per_buffer_or_default(),
        source,
    };

    run_record(options).await
}
