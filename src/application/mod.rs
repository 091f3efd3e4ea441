//! Application layer - Recorder use case and port interfaces
//!
//! Contains the recorder state machine, the encoder worker protocol and
//! the trait definitions for encoder engines and media streams.

pub mod capture;
pub mod chunks;
pub mod events;
pub mod ports;
pub mod protocol;
pub mod recorder;
pub mod worker;

// Re-export use cases
pub use capture::{BlockBuffer, CaptureNode};
pub use chunks::ChunkAccumulator;
pub use protocol::{Request, Response, SessionId};
pub use recorder::{MediaRecorder, RecorderError, RecorderOptions};
pub use worker::{EncoderHandle, EncoderWorker, WorkerError};
