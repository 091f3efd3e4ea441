//! Domain layer - Core recorder vocabulary
//!
//! Contains value objects, lifecycle states, events and domain errors.
//! This layer has no dependencies on audio devices or encoder engines.

pub mod audio;
pub mod config;
pub mod error;
pub mod recording;

// Re-export common types
pub use audio::{AudioMimeType, Blob, SampleBlock};
pub use config::AppConfig;
pub use error::*;
pub use recording::{BlobEvent, Duration, ErrorEvent, Event, EventType, Quality, RecordingState};
