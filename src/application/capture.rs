//! Capture bridge: real-time callback to worker requests
//!
//! The node runs inside the audio callback. It copies the callback's samples
//! into owned per-channel buffers and moves them into the worker's request
//! channel without ever waiting.

use tracing::trace;

use crate::domain::audio::SampleBlock;

use super::protocol::Request;
use super::worker::EncoderHandle;

/// Sink an audio source pushes callback blocks into while wired.
#[derive(Debug, Clone)]
pub struct CaptureNode {
    encoder: EncoderHandle,
}

impl CaptureNode {
    pub(crate) fn new(encoder: EncoderHandle) -> Self {
        Self { encoder }
    }

    /// Forward one planar callback. Returns `false` once the worker is gone.
    pub fn process(&self, channels: &[&[f32]]) -> bool {
        self.push(SampleBlock::from_planar(channels))
    }

    /// Forward one interleaved callback
    pub fn process_interleaved(&self, data: &[f32], channels: u16) -> bool {
        self.push(SampleBlock::from_interleaved(data, channels))
    }

    /// Forward an already-owned block
    pub fn push(&self, block: SampleBlock) -> bool {
        trace!(frames = block.frames(), channels = block.channels(), "capture block");
        self.encoder.send(Request::Data(block)).is_ok()
    }
}

/// Re-blocks variable-sized interleaved callbacks into fixed-size planar
/// blocks. Whatever is left over is emitted by [`BlockBuffer::flush`].
#[derive(Debug)]
pub struct BlockBuffer {
    frames_per_block: usize,
    pending: Vec<Vec<f32>>,
}

impl BlockBuffer {
    pub fn new(channels: u16, frames_per_block: usize) -> Self {
        let frames_per_block = frames_per_block.max(1);
        Self {
            frames_per_block,
            pending: (0..channels.max(1))
                .map(|_| Vec::with_capacity(frames_per_block))
                .collect(),
        }
    }

    pub fn channels(&self) -> u16 {
        self.pending.len() as u16
    }

    /// Frames buffered but not yet emitted
    pub fn buffered_frames(&self) -> usize {
        self.pending.first().map_or(0, Vec::len)
    }

    /// Append interleaved samples, emitting every block that fills up
    pub fn push_interleaved(&mut self, data: &[f32], mut emit: impl FnMut(SampleBlock)) {
        let channels = self.pending.len();
        for frame in data.chunks_exact(channels) {
            for (buffer, &sample) in self.pending.iter_mut().zip(frame) {
                buffer.push(sample);
            }
            if self.buffered_frames() == self.frames_per_block {
                emit(self.take());
            }
        }
    }

    /// Emit the partial tail block, if any
    pub fn flush(&mut self, mut emit: impl FnMut(SampleBlock)) {
        if self.buffered_frames() > 0 {
            emit(self.take());
        }
    }

    fn take(&mut self) -> SampleBlock {
        let capacity = self.frames_per_block;
        let buffers = self
            .pending
            .iter_mut()
            .map(|buffer| std::mem::replace(buffer, Vec::with_capacity(capacity)))
            .collect();
        SampleBlock::from_channels(buffers)
    }
}
