//! Audio payloads: raw sample blocks in, compressed blobs out

mod blob;
mod samples;

pub use blob::{AudioMimeType, Blob};
pub use samples::SampleBlock;
