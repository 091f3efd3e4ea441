//! Media stream port interfaces

use thiserror::Error;

use crate::application::capture::CaptureNode;

/// Audio graph errors
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    #[error("No audio input device available")]
    NoDevice,

    #[error("Audio input device not found: {0}")]
    DeviceNotFound(String),

    #[error("Capture node is already connected")]
    AlreadyConnected,

    #[error("Failed to connect capture node: {0}")]
    ConnectFailed(String),

    #[error("Failed to disconnect capture node: {0}")]
    DisconnectFailed(String),
}

/// Live input the recorder captures from.
///
/// The recorder reads channel count and sample rate when a session starts and
/// wires a [`CaptureNode`] in for the session's duration.
pub trait MediaStream: Send + Sync {
    fn channel_count(&self) -> u16;

    fn sample_rate(&self) -> u32;

    /// Start delivering callbacks to `node`
    fn connect(&self, node: CaptureNode) -> Result<Box<dyn CaptureConnection>, StreamError>;
}

/// An active capture wiring.
pub trait CaptureConnection: Send {
    /// Stop callbacks. Every block captured before this returns has been
    /// handed to the node.
    fn disconnect(self: Box<Self>) -> Result<(), StreamError>;
}
