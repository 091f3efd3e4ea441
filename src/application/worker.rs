//! Encoder worker
//!
//! Runs the native engine on a dedicated thread. Requests are handled one at a
//! time in arrival order, so an engine is never re-entered and every response
//! keeps the order of the request that caused it.

use std::thread::JoinHandle;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::audio::SampleBlock;

use super::ports::{EncoderBackend, EncoderEngine, EngineError, SessionConfig};
use super::protocol::{Request, Response, SessionId};

/// Worker lifecycle errors
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to spawn encoder worker: {0}")]
    Spawn(String),

    #[error("Encoder worker has shut down")]
    Closed,
}

/// Session currently owned by the worker
struct LiveSession {
    id: SessionId,
    channels: u16,
    /// `None` once the engine failed; the session still answers `finish`
    engine: Option<Box<dyn EncoderEngine>>,
}

/// Protocol state machine, independent of the thread that drives it
#[derive(Default)]
pub struct EncoderWorker {
    backend: Option<Box<dyn EncoderBackend>>,
    session: Option<LiveSession>,
}

impl EncoderWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the live session, if any
    pub fn live_session(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Handle one request, emitting its responses through `out` in order
    pub fn handle(&mut self, request: Request, out: &mut dyn FnMut(Response)) {
        debug!(kind = request.kind(), "worker request");
        match request {
            Request::Init { backend } => self.init(backend, out),
            Request::Start { session, config } => self.start(session, config, out),
            Request::Data(block) => self.data(block, out),
            Request::Finish { session } => self.finish(session, out),
        }
    }

    fn init(&mut self, mut backend: Box<dyn EncoderBackend>, out: &mut dyn FnMut(Response)) {
        match backend.load() {
            Ok(()) => {
                let name = backend.name().to_string();
                info!(backend = %name, "encoder backend loaded");
                self.backend = Some(backend);
                out(Response::Load { backend: name });
            }
            Err(e) => {
                warn!(error = %e, "encoder backend failed to load");
                out(Response::Error {
                    session: None,
                    message: e.to_string(),
                });
            }
        }
    }

    fn start(&mut self, id: SessionId, config: SessionConfig, out: &mut dyn FnMut(Response)) {
        if let Some(previous) = self.session.take() {
            let previous_id = previous.id;
            warn!(previous = previous_id, session = id, "start while a session is live");
            Self::close(previous, out);
            out(Response::Error {
                session: Some(previous_id),
                message: format!("session {id} started before session {previous_id} finished"),
            });
        }

        let Some(backend) = self.backend.as_ref() else {
            out(Response::Error {
                session: Some(id),
                message: EngineError::NotLoaded.to_string(),
            });
            return;
        };

        let engine = backend
            .create_session(&config)
            .and_then(|mut engine| engine.write_headers().map(|()| engine));

        let engine = match engine {
            Ok(mut engine) => {
                flush(engine.as_mut(), id, out);
                Some(engine)
            }
            Err(e) => {
                warn!(session = id, error = %e, "failed to create encoder engine");
                out(Response::Error {
                    session: Some(id),
                    message: e.to_string(),
                });
                None
            }
        };

        debug!(
            session = id,
            channels = config.channels,
            sample_rate = config.sample_rate,
            quality = config.quality.value(),
            "session started"
        );
        self.session = Some(LiveSession {
            id,
            channels: config.channels,
            engine,
        });
    }

    fn data(&mut self, block: SampleBlock, out: &mut dyn FnMut(Response)) {
        let Some(session) = self.session.as_mut() else {
            warn!(frames = block.frames(), "dropping data outside of a session");
            return;
        };
        let Some(engine) = session.engine.as_mut() else {
            debug!(session = session.id, "dropping data for failed engine");
            return;
        };

        if block.channels() != session.channels {
            out(Response::Error {
                session: Some(session.id),
                message: format!(
                    "block has {} channels, session expects {}",
                    block.channels(),
                    session.channels
                ),
            });
            return;
        }
        if block.is_empty() {
            return;
        }

        if let Err(e) = encode_block(engine.as_mut(), &block) {
            warn!(session = session.id, error = %e, "encode failed, releasing engine");
            session.engine = None;
            out(Response::Error {
                session: Some(session.id),
                message: e.to_string(),
            });
            return;
        }
        flush(engine.as_mut(), session.id, out);
    }

    fn finish(&mut self, id: SessionId, out: &mut dyn FnMut(Response)) {
        match self.session.take() {
            Some(session) if session.id == id => Self::close(session, out),
            other => {
                debug!(session = id, "finish without a matching live session");
                self.session = other;
                out(Response::Finish { session: id });
            }
        }
    }

    /// Drain trailing output, release the engine and answer `finish`
    fn close(session: LiveSession, out: &mut dyn FnMut(Response)) {
        let id = session.id;
        if let Some(mut engine) = session.engine {
            match engine.finish() {
                Ok(()) => flush(engine.as_mut(), id, out),
                Err(e) => out(Response::Error {
                    session: Some(id),
                    message: e.to_string(),
                }),
            }
        }
        debug!(session = id, "session finished");
        out(Response::Finish { session: id });
    }
}

fn encode_block(engine: &mut dyn EncoderEngine, block: &SampleBlock) -> Result<(), EngineError> {
    let frames = block.frames();
    engine.prepare_analysis(frames)?;
    for (channel, samples) in block.buffers().iter().enumerate() {
        let staging = engine.analysis_buffer(channel).ok_or_else(|| {
            EngineError::Native(format!("no analysis buffer for channel {channel}"))
        })?;
        let n = frames.min(staging.len());
        staging[..n].copy_from_slice(&samples[..n]);
    }
    engine.encode()
}

/// Move everything the engine has pending into one owned fragment.
/// Emits nothing when the pending region is empty.
fn flush(engine: &mut dyn EncoderEngine, session: SessionId, out: &mut dyn FnMut(Response)) {
    let len = engine.pending_len();
    if len == 0 {
        return;
    }
    let mut buffer = vec![0u8; len];
    engine.copy_pending(&mut buffer);
    engine.clear_pending();
    out(Response::Data { session, buffer });
}

/// Sending side of the worker's request channel. Sends never block.
#[derive(Debug, Clone)]
pub struct EncoderHandle {
    requests: mpsc::UnboundedSender<Request>,
}

impl EncoderHandle {
    pub(crate) fn from_sender(requests: mpsc::UnboundedSender<Request>) -> Self {
        Self { requests }
    }

    pub fn send(&self, request: Request) -> Result<(), WorkerError> {
        self.requests.send(request).map_err(|_| WorkerError::Closed)
    }
}

/// Spawned worker: its request handle, response stream and thread
pub struct SpawnedWorker {
    pub handle: EncoderHandle,
    pub responses: mpsc::UnboundedReceiver<Response>,
    pub thread: JoinHandle<()>,
}

/// Start the worker thread. It exits once every [`EncoderHandle`] is dropped,
/// releasing any engine still alive.
pub fn spawn() -> Result<SpawnedWorker, WorkerError> {
    let (request_tx, mut request_rx) = mpsc::unbounded_channel::<Request>();
    let (response_tx, response_rx) = mpsc::unbounded_channel();

    let thread = std::thread::Builder::new()
        .name("encoder-worker".to_string())
        .spawn(move || {
            let mut worker = EncoderWorker::new();
            let mut emit = |response: Response| {
                if response_tx.send(response).is_err() {
                    debug!("response dropped, controller is gone");
                }
            };
            while let Some(request) = request_rx.blocking_recv() {
                worker.handle(request, &mut emit);
            }
            debug!("encoder worker exiting");
        })
        .map_err(|e| WorkerError::Spawn(e.to_string()))?;

    Ok(SpawnedWorker {
        handle: EncoderHandle::from_sender(request_tx),
        responses: response_rx,
        thread,
    })
}
