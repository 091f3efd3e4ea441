//! Caller-driven media stream
//!
//! Stands in for an audio device: whoever owns the stream pushes callback
//! blocks, and they reach the recorder only while a capture node is wired.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::application::ports::{CaptureConnection, MediaStream, StreamError};
use crate::application::CaptureNode;

type NodeSlot = Arc<Mutex<Option<CaptureNode>>>;

/// Stream whose callbacks are invoked by hand
#[derive(Debug)]
pub struct ManualStream {
    channels: u16,
    sample_rate: u32,
    node: NodeSlot,
}

impl ManualStream {
    pub fn new(channels: u16, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
            node: Arc::default(),
        }
    }

    /// Deliver one planar callback. Returns `false` when nothing is wired.
    pub fn process(&self, channels: &[&[f32]]) -> bool {
        lock(&self.node)
            .as_ref()
            .is_some_and(|node| node.process(channels))
    }

    /// Deliver one interleaved callback
    pub fn process_interleaved(&self, data: &[f32]) -> bool {
        lock(&self.node)
            .as_ref()
            .is_some_and(|node| node.process_interleaved(data, self.channels))
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.node).is_some()
    }
}

impl MediaStream for ManualStream {
    fn channel_count(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn connect(&self, node: CaptureNode) -> Result<Box<dyn CaptureConnection>, StreamError> {
        let mut slot = lock(&self.node);
        if slot.is_some() {
            return Err(StreamError::AlreadyConnected);
        }
        *slot = Some(node);
        Ok(Box::new(ManualConnection {
            node: Arc::clone(&self.node),
        }))
    }
}

struct ManualConnection {
    node: NodeSlot,
}

impl CaptureConnection for ManualConnection {
    fn disconnect(self: Box<Self>) -> Result<(), StreamError> {
        lock(&self.node).take();
        Ok(())
    }
}

fn lock(slot: &Mutex<Option<CaptureNode>>) -> MutexGuard<'_, Option<CaptureNode>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
