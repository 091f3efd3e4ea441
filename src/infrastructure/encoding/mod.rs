//! Encoder engine adapters

mod vorbis;

pub use vorbis::{VorbisBackend, VorbisEngine};
