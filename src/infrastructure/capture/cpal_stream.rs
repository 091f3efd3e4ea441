//! Microphone stream using cpal
//!
//! `cpal::Stream` is not `Send`, so each connection owns its stream on a
//! dedicated thread. Device callbacks vary in size; they are re-blocked into
//! fixed blocks before reaching the capture node.

use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use tracing::{debug, info, warn};

use crate::application::ports::{CaptureConnection, MediaStream, StreamError};
use crate::application::{BlockBuffer, CaptureNode};

/// Input device stream at the device's default configuration
#[derive(Debug, Clone)]
pub struct CpalStream {
    device_name: Option<String>,
    channels: u16,
    sample_rate: u32,
    sample_format: SampleFormat,
    frames_per_buffer: usize,
}

impl CpalStream {
    /// Probe `device` (or the default input) without opening it
    pub fn open(device: Option<&str>, frames_per_buffer: usize) -> Result<Self, StreamError> {
        let device = Self::find_device(device)?;
        let config = device
            .default_input_config()
            .map_err(|e| StreamError::ConnectFailed(format!("Failed to get config: {}", e)))?;

        let device_name = device.name().ok();
        info!(
            device = device_name.as_deref().unwrap_or("unknown"),
            channels = config.channels(),
            sample_rate = config.sample_rate().0,
            "input device selected"
        );

        Ok(Self {
            device_name,
            channels: config.channels(),
            sample_rate: config.sample_rate().0,
            sample_format: config.sample_format(),
            frames_per_buffer: frames_per_buffer.max(1),
        })
    }

    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    fn find_device(name: Option<&str>) -> Result<cpal::Device, StreamError> {
        let host = cpal::default_host();
        let Some(name) = name else {
            return host.default_input_device().ok_or(StreamError::NoDevice);
        };

        host.input_devices()
            .map_err(|e| StreamError::ConnectFailed(e.to_string()))?
            .find(|device| device.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| StreamError::DeviceNotFound(name.to_string()))
    }

    fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            channels: self.channels,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        }
    }

    fn build_stream(
        &self,
        device: &cpal::Device,
        node: CaptureNode,
        buffer: Arc<Mutex<BlockBuffer>>,
    ) -> Result<cpal::Stream, StreamError> {
        let config = self.stream_config();
        let on_error = |err: cpal::StreamError| warn!(error = %err, "audio stream error");

        let stream = match self.sample_format {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| feed(&buffer, &node, data),
                on_error,
                None,
            ),
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let samples: Vec<f32> =
                        data.iter().map(|&s| f32::from(s) / 32768.0).collect();
                    feed(&buffer, &node, &samples);
                },
                on_error,
                None,
            ),
            other => {
                return Err(StreamError::ConnectFailed(format!(
                    "Unsupported sample format: {other:?}"
                )))
            }
        };

        stream.map_err(|e| StreamError::ConnectFailed(e.to_string()))
    }
}

impl MediaStream for CpalStream {
    fn channel_count(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn connect(&self, node: CaptureNode) -> Result<Box<dyn CaptureConnection>, StreamError> {
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), StreamError>>();
        let this = self.clone();

        let thread = std::thread::Builder::new()
            .name("cpal-capture".to_string())
            .spawn(move || {
                let buffer = Arc::new(Mutex::new(BlockBuffer::new(
                    this.channels,
                    this.frames_per_buffer,
                )));

                let stream = CpalStream::find_device(this.device_name.as_deref())
                    .and_then(|device| this.build_stream(&device, node.clone(), Arc::clone(&buffer)))
                    .and_then(|stream| {
                        stream
                            .play()
                            .map(|()| stream)
                            .map_err(|e| StreamError::ConnectFailed(e.to_string()))
                    });
                let stream = match stream {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                // Runs until disconnect or until the connection is dropped
                let _ = stop_rx.recv();
                drop(stream);

                lock(&buffer).flush(|block| {
                    debug!(frames = block.frames(), "flushing capture tail");
                    node.push(block);
                });
            })
            .map_err(|e| StreamError::ConnectFailed(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(CpalConnection {
                stop: stop_tx,
                thread,
            })),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(StreamError::ConnectFailed("capture thread exited".into()))
            }
        }
    }
}

struct CpalConnection {
    stop: std_mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

impl CaptureConnection for CpalConnection {
    fn disconnect(self: Box<Self>) -> Result<(), StreamError> {
        let _ = self.stop.send(());
        self.thread
            .join()
            .map_err(|_| StreamError::DisconnectFailed("capture thread panicked".into()))
    }
}

fn feed(buffer: &Mutex<BlockBuffer>, node: &CaptureNode, data: &[f32]) {
    lock(buffer).push_interleaved(data, |block| {
        node.push(block);
    });
}

fn lock(buffer: &Mutex<BlockBuffer>) -> MutexGuard<'_, BlockBuffer> {
    buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
