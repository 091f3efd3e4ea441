//! Messages exchanged between the recorder and its encoder worker

use std::fmt;

use crate::domain::audio::SampleBlock;

use super::ports::{EncoderBackend, SessionConfig};

/// Tags every session-scoped request and response
pub type SessionId = u64;

/// Controller (and capture) to worker
pub enum Request {
    /// One-time bootstrap with the backend the recorder was built with
    Init { backend: Box<dyn EncoderBackend> },
    /// Open a session
    Start {
        session: SessionId,
        config: SessionConfig,
    },
    /// One captured block for the live session
    Data(SampleBlock),
    /// End of input for `session`
    Finish { session: SessionId },
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Start { .. } => "start",
            Self::Data(_) => "data",
            Self::Finish { .. } => "finish",
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init { backend } => f
                .debug_struct("Init")
                .field("backend", &backend.name())
                .finish(),
            Self::Start { session, config } => f
                .debug_struct("Start")
                .field("session", session)
                .field("config", config)
                .finish(),
            Self::Data(block) => f
                .debug_struct("Data")
                .field("frames", &block.frames())
                .field("channels", &block.channels())
                .finish(),
            Self::Finish { session } => {
                f.debug_struct("Finish").field("session", session).finish()
            }
        }
    }
}

/// Worker to controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Backend initialized and ready for sessions
    Load { backend: String },
    /// One compressed fragment, in emission order
    Data { session: SessionId, buffer: Vec<u8> },
    /// Every byte of `session` has been emitted and its engine released
    Finish { session: SessionId },
    /// Asynchronous fault, scoped to a session when one is involved
    Error {
        session: Option<SessionId>,
        message: String,
    },
}

impl Response {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Load { .. } => "load",
            Self::Data { .. } => "data",
            Self::Finish { .. } => "finish",
            Self::Error { .. } => "error",
        }
    }
}
