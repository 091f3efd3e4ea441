//! Media recorder use case
//!
//! `start`/`stop` validate synchronously against the scheduled lifecycle and
//! enqueue a task. A controller task applies those tasks in call order, wires
//! the capture node and turns worker responses into events.

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::domain::audio::AudioMimeType;
use crate::domain::recording::{
    BlobEvent, ErrorEvent, Event, InvalidStateTransition, Lifecycle, Quality, RecordingState,
};

use super::capture::CaptureNode;
use super::chunks::ChunkAccumulator;
use super::events::EventHandlers;
use super::ports::{CaptureConnection, EncoderBackend, MediaStream, SessionConfig, StreamError};
use super::protocol::{Request, Response, SessionId};
use super::worker::{self, EncoderHandle, WorkerError};

/// Errors returned synchronously by the recorder
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),

    #[error("Timeslice-based recording is not implemented")]
    NotImplemented,

    #[error("MediaRecorder must be created inside a Tokio runtime")]
    NoRuntime,

    #[error("Recorder controller has shut down")]
    Closed,

    #[error(transparent)]
    Worker(#[from] WorkerError),
}

/// Construction-time recorder settings
pub struct RecorderOptions {
    /// VBR quality handed to every session
    pub quality: Quality,
    /// Encoder backend sent to the worker in `init`
    pub backend: Box<dyn EncoderBackend>,
}

impl RecorderOptions {
    pub fn new(backend: Box<dyn EncoderBackend>) -> Self {
        Self {
            quality: Quality::default(),
            backend,
        }
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }
}

enum Task {
    Start { epoch: u64 },
    Stop,
}

/// Lifecycle as it will be once every queued task has run
#[derive(Debug, Default)]
struct Schedule {
    lifecycle: Lifecycle,
    epoch: u64,
}

struct Shared {
    stream: Arc<dyn MediaStream>,
    mime_type: AudioMimeType,
    state: watch::Receiver<RecordingState>,
    schedule: Arc<Mutex<Schedule>>,
    tasks: mpsc::UnboundedSender<Task>,
    handlers: Arc<EventHandlers>,
}

/// Records a [`MediaStream`] into an Ogg/Vorbis blob.
///
/// Cloning yields another handle to the same recorder. Dropping the last
/// handle tears the capture wiring down and finishes any live session.
#[derive(Clone)]
pub struct MediaRecorder {
    inner: Arc<Shared>,
}

impl MediaRecorder {
    /// Spawn the encoder worker and the controller task
    pub fn new(
        stream: Arc<dyn MediaStream>,
        options: RecorderOptions,
    ) -> Result<Self, RecorderError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| RecorderError::NoRuntime)?;

        let worker::SpawnedWorker {
            handle: encoder,
            responses,
            thread: _,
        } = worker::spawn()?;
        encoder.send(Request::Init {
            backend: options.backend,
        })?;

        let (state_tx, state_rx) = watch::channel(RecordingState::Inactive);
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let schedule = Arc::new(Mutex::new(Schedule::default()));
        let handlers = Arc::new(EventHandlers::default());
        let mime_type = AudioMimeType::Ogg;

        let controller = Controller {
            stream: Arc::clone(&stream),
            quality: options.quality,
            encoder: Some(encoder),
            state: state_tx,
            schedule: Arc::clone(&schedule),
            connection: None,
            session: None,
            next_session: 1,
            chunks: ChunkAccumulator::new(mime_type),
            handlers: Arc::clone(&handlers),
            backend: None,
        };
        runtime.spawn(controller.run(task_rx, responses));

        Ok(Self {
            inner: Arc::new(Shared {
                stream,
                mime_type,
                state: state_rx,
                schedule,
                tasks: task_tx,
                handlers,
            }),
        })
    }

    /// Begin a session. Any `timeslice` is rejected.
    pub fn start(&self, timeslice: Option<StdDuration>) -> Result<(), RecorderError> {
        if timeslice.is_some() {
            return Err(RecorderError::NotImplemented);
        }

        let mut schedule = lock(&self.inner.schedule);
        let mut lifecycle = schedule.lifecycle;
        lifecycle.start()?;
        let epoch = schedule.epoch + 1;

        if self.inner.tasks.send(Task::Start { epoch }).is_err() {
            return Err(RecorderError::Closed);
        }
        schedule.lifecycle = lifecycle;
        schedule.epoch = epoch;
        debug!(epoch, "start scheduled");
        Ok(())
    }

    /// End the session; the blob arrives through `ondataavailable`
    pub fn stop(&self) -> Result<(), RecorderError> {
        let mut schedule = lock(&self.inner.schedule);
        let mut lifecycle = schedule.lifecycle;
        lifecycle.stop()?;

        if self.inner.tasks.send(Task::Stop).is_err() {
            return Err(RecorderError::Closed);
        }
        schedule.lifecycle = lifecycle;
        schedule.epoch += 1;
        debug!(epoch = schedule.epoch, "stop scheduled");
        Ok(())
    }

    /// State as applied by the controller
    pub fn state(&self) -> RecordingState {
        *self.inner.state.borrow()
    }

    /// Watch applied state changes
    pub fn subscribe_state(&self) -> watch::Receiver<RecordingState> {
        self.inner.state.clone()
    }

    pub fn mime_type(&self) -> AudioMimeType {
        self.inner.mime_type
    }

    pub fn stream(&self) -> Arc<dyn MediaStream> {
        Arc::clone(&self.inner.stream)
    }

    pub fn set_onstart<F>(&self, handler: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.handlers.onstart.set(handler);
    }

    pub fn clear_onstart(&self) {
        self.inner.handlers.onstart.clear();
    }

    pub fn set_ondataavailable<F>(&self, handler: F)
    where
        F: Fn(&BlobEvent) + Send + Sync + 'static,
    {
        self.inner.handlers.ondataavailable.set(handler);
    }

    pub fn clear_ondataavailable(&self) {
        self.inner.handlers.ondataavailable.clear();
    }

    pub fn set_onstop<F>(&self, handler: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.handlers.onstop.set(handler);
    }

    pub fn clear_onstop(&self) {
        self.inner.handlers.onstop.clear();
    }

    pub fn set_onerror<F>(&self, handler: F)
    where
        F: Fn(&ErrorEvent) + Send + Sync + 'static,
    {
        self.inner.handlers.onerror.set(handler);
    }

    pub fn clear_onerror(&self) {
        self.inner.handlers.onerror.clear();
    }
}

fn lock(schedule: &Mutex<Schedule>) -> std::sync::MutexGuard<'_, Schedule> {
    schedule.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Owns everything the scheduled tasks touch
struct Controller {
    stream: Arc<dyn MediaStream>,
    quality: Quality,
    /// Dropped on shutdown so the worker can exit
    encoder: Option<EncoderHandle>,
    state: watch::Sender<RecordingState>,
    schedule: Arc<Mutex<Schedule>>,
    connection: Option<Box<dyn CaptureConnection>>,
    session: Option<SessionId>,
    next_session: SessionId,
    chunks: ChunkAccumulator,
    handlers: Arc<EventHandlers>,
    /// Name reported by the worker once the backend loaded
    backend: Option<String>,
}

impl Controller {
    async fn run(
        mut self,
        mut tasks: mpsc::UnboundedReceiver<Task>,
        mut responses: mpsc::UnboundedReceiver<Response>,
    ) {
        let mut accepting = true;
        loop {
            tokio::select! {
                biased;

                task = tasks.recv(), if accepting => match task {
                    Some(Task::Start { epoch }) => self.begin_session(epoch).await,
                    Some(Task::Stop) => self.end_session().await,
                    None => {
                        accepting = false;
                        self.shutdown().await;
                    }
                },

                response = responses.recv() => match response {
                    Some(response) => self.on_response(response),
                    None => break,
                },
            }
        }
        debug!("recorder controller exiting");
    }

    async fn begin_session(&mut self, epoch: u64) {
        let Some(encoder) = self.encoder.clone() else {
            return;
        };

        let session = self.next_session;
        self.next_session += 1;
        self.chunks.begin(session);
        if self.backend.is_none() {
            debug!(session, "start queued behind encoder init");
        }

        let config = SessionConfig {
            channels: self.stream.channel_count(),
            sample_rate: self.stream.sample_rate(),
            quality: self.quality,
        };
        if let Err(e) = encoder.send(Request::Start { session, config }) {
            self.chunks.finish(session);
            self.fail_start(epoch, e.to_string());
            return;
        }
        self.session = Some(session);

        // Device wiring may block until the input is open
        let stream = Arc::clone(&self.stream);
        let node = CaptureNode::new(encoder.clone());
        let wired = tokio::task::spawn_blocking(move || stream.connect(node))
            .await
            .unwrap_or_else(|e| Err(StreamError::ConnectFailed(e.to_string())));

        match wired {
            Ok(connection) => {
                self.connection = Some(connection);
                self.state.send_replace(RecordingState::Recording);
                info!(
                    session,
                    channels = config.channels,
                    sample_rate = config.sample_rate,
                    "recording started"
                );
                self.handlers.onstart.dispatch(&Event::start());
            }
            Err(e) => {
                warn!(session, error = %e, "failed to wire capture node");
                self.session = None;
                let _ = encoder.send(Request::Finish { session });
                self.fail_start(epoch, e.to_string());
            }
        }
    }

    /// Roll the schedule back unless the caller has already moved on
    fn fail_start(&mut self, epoch: u64, message: String) {
        {
            let mut schedule = lock(&self.schedule);
            if schedule.epoch == epoch {
                schedule.lifecycle.reset();
            }
        }
        self.state.send_replace(RecordingState::Inactive);
        error!("recording could not start: {message}");
        self.handlers.onerror.dispatch(&ErrorEvent::new(message));
    }

    async fn end_session(&mut self) {
        self.state.send_replace(RecordingState::Inactive);

        if let Some(connection) = self.connection.take() {
            let disconnected = tokio::task::spawn_blocking(move || connection.disconnect())
                .await
                .unwrap_or_else(|e| Err(StreamError::DisconnectFailed(e.to_string())));
            if let Err(e) = disconnected {
                warn!(error = %e, "capture node did not disconnect cleanly");
            }
        }

        if let Some(session) = self.session.take() {
            info!(session, "recording stopped");
            let sent = self
                .encoder
                .as_ref()
                .map(|encoder| encoder.send(Request::Finish { session }));
            if let Some(Err(e)) = sent {
                error!(session, error = %e, "could not finish session");
            }
        }
    }

    /// Last handle dropped: finish what is live and let the worker exit
    async fn shutdown(&mut self) {
        debug!("recorder dropped, shutting down");
        self.end_session().await;
        self.encoder = None;
    }

    fn on_response(&mut self, response: Response) {
        match response {
            Response::Load { backend } => {
                debug!(%backend, "encoder ready");
                self.backend = Some(backend);
            }
            Response::Data { session, buffer } => {
                debug!(session, bytes = buffer.len(), "fragment");
                self.chunks.push(session, buffer);
            }
            Response::Finish { session } => match self.chunks.finish(session) {
                Some(blob) => {
                    info!(session, size = %blob.human_readable_size(), "blob ready");
                    self.handlers
                        .ondataavailable
                        .dispatch(&BlobEvent::new(blob));
                    self.handlers.onstop.dispatch(&Event::stop());
                }
                None => debug!(session, "finish for unknown session ignored"),
            },
            Response::Error { session, message } => {
                error!(?session, "encoder error: {message}");
                self.handlers.onerror.dispatch(&ErrorEvent::new(message));
            }
        }
    }
}
