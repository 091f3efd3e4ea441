//! Media stream adapters

mod cpal_stream;
mod manual;

pub use cpal_stream::CpalStream;
pub use manual::ManualStream;
