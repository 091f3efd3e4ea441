//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod config;
pub mod encoder;
pub mod stream;

// Re-export common types
pub use config::ConfigStore;
pub use encoder::{EncoderBackend, EncoderEngine, EngineError, SessionConfig};
pub use stream::{CaptureConnection, MediaStream, StreamError};
