//! Record command runner

use std::f32::consts::TAU;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration as TokioDuration};
use tracing::{debug, info};

use crate::application::ports::{ConfigStore, StreamError};
use crate::application::{MediaRecorder, RecorderError, RecorderOptions};
use crate::domain::audio::{AudioMimeType, Blob};
use crate::domain::config::AppConfig;
use crate::infrastructure::{CpalStream, ManualStream, XdgConfigStore};

use super::args::{RecordOptions, SourceOptions};
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Errors from a record run
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Audio input failed: {0}")]
    Stream(#[from] StreamError),

    #[error("Recorder failed: {0}")]
    Recorder(#[from] RecorderError),

    #[error("Recording could not start: {0}")]
    StartFailed(String),

    #[error("Recorder stopped without producing audio")]
    NoData,

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What the recorder's handlers report back to the run loop
#[derive(Debug)]
enum RecorderEvent {
    Started,
    Data(Blob),
    Stopped,
    Error(String),
}

/// Run one recording and write it to `options.output`
pub async fn run_record(options: RecordOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup().await {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    match record(&options, &shutdown, &mut presenter).await {
        Ok(blob) => match write_blob(&options.output, &blob).await {
            Ok(()) => {
                presenter.success(&format!(
                    "Saved {} ({}, {})",
                    options.output.display(),
                    blob.human_readable_size(),
                    blob.mime_type()
                ));
                presenter.output(&options.output.to_string_lossy());
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => {
                presenter.error(&e.to_string());
                ExitCode::from(EXIT_ERROR)
            }
        },
        Err(e) => {
            presenter.spinner_fail("Recording failed");
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn record(
    options: &RecordOptions,
    shutdown: &ShutdownSignal,
    presenter: &mut Presenter,
) -> Result<Blob, AppError> {
    let recorder_options = RecorderOptions::default().with_quality(options.quality);

    match &options.source {
        SourceOptions::Device { name } => {
            let stream = Arc::new(CpalStream::open(name.as_deref(), options.frames_per_buffer)?);
            let device = stream.device_name().unwrap_or("default input").to_string();
            let recorder = MediaRecorder::new(stream, recorder_options)?;
            let mut events = subscribe(&recorder);

            start(&recorder, &mut events).await?;
            presenter.start_spinner(&format!("Recording from {}...", device));

            let total_ms = options.duration.as_millis();
            let started = Instant::now();
            let mut ticker = interval(TokioDuration::from_millis(100));
            loop {
                ticker.tick().await;
                let elapsed_ms = started.elapsed().as_millis() as u64;
                presenter.update_recording_progress(elapsed_ms.min(total_ms), total_ms);
                if elapsed_ms >= total_ms || shutdown.is_shutdown() {
                    break;
                }
            }

            finish(&recorder, &mut events, presenter).await
        }
        SourceOptions::Tone {
            frequency,
            channels,
            sample_rate,
        } => {
            let stream = Arc::new(ManualStream::new(*channels, *sample_rate));
            let recorder = MediaRecorder::new(stream.clone(), recorder_options)?;
            let mut events = subscribe(&recorder);

            start(&recorder, &mut events).await?;
            presenter.start_spinner(&format!("Recording {} Hz tone...", frequency));

            let total = options.duration.frames_at(*sample_rate);
            let total_ms = options.duration.as_millis();
            let mut tone = ToneGenerator::new(*frequency, *channels, *sample_rate);
            // One block per block-length of audio, like a device callback
            let mut ticker = interval(block_period(options.frames_per_buffer, *sample_rate));
            let mut sent: u64 = 0;
            while sent < total && !shutdown.is_shutdown() {
                ticker.tick().await;
                let frames = (total - sent).min(options.frames_per_buffer as u64) as usize;
                stream.process_interleaved(&tone.next_block(frames));
                sent += frames as u64;
                let elapsed_ms = sent * 1000 / u64::from(*sample_rate);
                presenter.update_recording_progress(elapsed_ms.min(total_ms), total_ms);
            }
            debug!(frames = sent, "tone generated");

            finish(&recorder, &mut events, presenter).await
        }
    }
}

fn subscribe(recorder: &MediaRecorder) -> mpsc::UnboundedReceiver<RecorderEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    let sender = tx.clone();
    recorder.set_onstart(move |_| {
        let _ = sender.send(RecorderEvent::Started);
    });
    let sender = tx.clone();
    recorder.set_ondataavailable(move |event| {
        let _ = sender.send(RecorderEvent::Data(event.data().clone()));
    });
    let sender = tx.clone();
    recorder.set_onstop(move |_| {
        let _ = sender.send(RecorderEvent::Stopped);
    });
    recorder.set_onerror(move |event| {
        let _ = tx.send(RecorderEvent::Error(event.message().to_string()));
    });

    rx
}

/// Start and wait until the capture node is wired
async fn start(
    recorder: &MediaRecorder,
    events: &mut mpsc::UnboundedReceiver<RecorderEvent>,
) -> Result<(), AppError> {
    recorder.start(None)?;
    loop {
        match events.recv().await {
            Some(RecorderEvent::Started) => {
                info!(mime_type = %recorder.mime_type(), "recording");
                return Ok(());
            }
            Some(RecorderEvent::Error(message)) => return Err(AppError::StartFailed(message)),
            Some(other) => debug!(?other, "event before start"),
            None => return Err(AppError::NoData),
        }
    }
}

/// Stop and wait for the blob and the `stop` event
async fn finish(
    recorder: &MediaRecorder,
    events: &mut mpsc::UnboundedReceiver<RecorderEvent>,
    presenter: &mut Presenter,
) -> Result<Blob, AppError> {
    recorder.stop()?;
    presenter.update_spinner("Encoding...");

    let mut blob = None;
    while let Some(event) = events.recv().await {
        match event {
            RecorderEvent::Data(data) => blob = Some(data),
            RecorderEvent::Stopped => break,
            RecorderEvent::Error(message) => presenter.warn(&message),
            RecorderEvent::Started => {}
        }
    }

    let blob = blob.filter(|b| !b.is_empty()).ok_or(AppError::NoData)?;
    presenter.spinner_success(&format!("Recording complete ({})", blob.human_readable_size()));
    Ok(blob)
}

async fn write_blob(path: &Path, blob: &Blob) -> Result<(), AppError> {
    let write_error = |source| AppError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    tokio::fs::write(path, blob.data()).await.map_err(write_error)
}

/// Default file name inside `output_dir` (or the working directory)
pub fn default_output_path(output_dir: Option<&str>) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let file = format!("recording-{}.{}", stamp, AudioMimeType::Ogg.extension());
    match output_dir {
        Some(dir) => Path::new(dir).join(file),
        None => PathBuf::from(file),
    }
}

/// Load and merge configuration: defaults < file < CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable config file");
        AppConfig::empty()
    });

    AppConfig::defaults().merge(file_config).merge(cli_config)
}

/// Wall-clock length of one block of `frames` at `sample_rate`
fn block_period(frames: usize, sample_rate: u32) -> TokioDuration {
    TokioDuration::from_secs_f64(frames.max(1) as f64 / f64::from(sample_rate.max(1)))
}

/// Interleaved sine generator at half amplitude
struct ToneGenerator {
    step: f32,
    phase: f32,
    channels: u16,
}

impl ToneGenerator {
    fn new(frequency: f32, channels: u16, sample_rate: u32) -> Self {
        Self {
            step: TAU * frequency / sample_rate.max(1) as f32,
            phase: 0.0,
            channels: channels.max(1),
        }
    }

    fn next_block(&mut self, frames: usize) -> Vec<f32> {
        let mut block = Vec::with_capacity(frames * usize::from(self.channels));
        for _ in 0..frames {
            let sample = 0.5 * self.phase.sin();
            block.extend(std::iter::repeat(sample).take(usize::from(self.channels)));
            self.phase = (self.phase + self.step) % TAU;
        }
        block
    }
}
