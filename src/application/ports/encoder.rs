//! Encoder engine port interfaces
//!
//! These traits are the fixed entry points the worker protocol drives. An
//! engine owns its pending-output region and its analysis staging area; the
//! worker only ever copies into or out of them.

use thiserror::Error;

use crate::domain::recording::Quality;

/// Encoder engine errors
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("Encoder backend is not loaded")]
    NotLoaded,

    #[error("Failed to load encoder backend: {0}")]
    LoadFailed(String),

    #[error("Invalid session parameters: {0}")]
    InvalidConfig(String),

    #[error("Encoder engine failed: {0}")]
    Native(String),
}

/// Parameters of one encoding session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub channels: u16,
    pub sample_rate: u32,
    pub quality: Quality,
}

/// One live encoder instance. Dropping it releases every native resource.
pub trait EncoderEngine {
    /// Emit the stream header packets into the pending region
    fn write_headers(&mut self) -> Result<(), EngineError>;

    /// Number of compressed bytes waiting to be drained
    fn pending_len(&self) -> usize;

    /// Copy the first `dst.len()` pending bytes into `dst`
    fn copy_pending(&self, dst: &mut [u8]);

    /// Discard everything in the pending region
    fn clear_pending(&mut self);

    /// Size the analysis staging area for the next `frames` frames
    fn prepare_analysis(&mut self, frames: usize) -> Result<(), EngineError>;

    /// Staging slice for one channel, valid until the next `encode`
    fn analysis_buffer(&mut self, channel: usize) -> Option<&mut [f32]>;

    /// Run one encode pass over everything staged
    fn encode(&mut self) -> Result<(), EngineError>;

    /// Flush the final frame and the end-of-stream marker
    fn finish(&mut self) -> Result<(), EngineError>;
}

/// The encoder "module": loaded once per worker, then asked for one engine
/// per session.
pub trait EncoderBackend: Send {
    /// Human-readable backend name, reported in the `load` response
    fn name(&self) -> &str;

    /// One-time initialization before any session starts
    fn load(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Create a fresh engine for a session
    fn create_session(&self, config: &SessionConfig)
        -> Result<Box<dyn EncoderEngine>, EngineError>;
}
