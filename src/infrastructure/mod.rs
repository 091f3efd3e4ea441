//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with audio devices, libvorbis and the config file.

pub mod capture;
pub mod config;
pub mod encoding;

// Re-export adapters
pub use capture::{CpalStream, ManualStream};
pub use config::XdgConfigStore;
pub use encoding::{VorbisBackend, VorbisEngine};
