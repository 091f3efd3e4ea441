//! Recording domain module

mod duration;
mod event;
mod quality;
mod state;

pub use duration::{Duration, DEFAULT_DURATION_SECS};
pub use event::{BlobEvent, ErrorEvent, Event, EventType};
pub use quality::Quality;
pub use state::{InvalidStateTransition, Lifecycle, RecordingState};
