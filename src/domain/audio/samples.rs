//! Owned per-channel sample payload

/// One capture callback's worth of audio, split per channel.
///
/// Every buffer is an independent copy holding exactly `frames` samples, so a
/// block can be moved across threads while the producer reuses its memory.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBlock {
    frames: usize,
    buffers: Vec<Vec<f32>>,
}

impl SampleBlock {
    /// Copy planar channel slices. Channels longer than the shortest one are
    /// truncated so all buffers share one frame count.
    pub fn from_planar(channels: &[&[f32]]) -> Self {
        let frames = channels.iter().map(|ch| ch.len()).min().unwrap_or(0);
        let buffers = channels.iter().map(|ch| ch[..frames].to_vec()).collect();
        Self { frames, buffers }
    }

    /// Split interleaved samples into per-channel copies. A trailing partial
    /// frame is ignored.
    pub fn from_interleaved(data: &[f32], channels: u16) -> Self {
        let channels = usize::from(channels.max(1));
        let frames = data.len() / channels;
        let mut buffers: Vec<Vec<f32>> = (0..channels).map(|_| Vec::with_capacity(frames)).collect();

        for frame in data.chunks_exact(channels) {
            for (buffer, &sample) in buffers.iter_mut().zip(frame) {
                buffer.push(sample);
            }
        }

        Self { frames, buffers }
    }

    /// Take ownership of already-separated channel buffers
    pub fn from_channels(mut buffers: Vec<Vec<f32>>) -> Self {
        let frames = buffers.iter().map(Vec::len).min().unwrap_or(0);
        for buffer in &mut buffers {
            buffer.truncate(frames);
        }
        Self { frames, buffers }
    }

    /// A block of digital silence
    pub fn silence(channels: u16, frames: usize) -> Self {
        Self {
            frames,
            buffers: vec![vec![0.0; frames]; usize::from(channels)],
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn channels(&self) -> u16 {
        self.buffers.len() as u16
    }

    pub fn buffers(&self) -> &[Vec<f32>] {
        &self.buffers
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_copies_each_channel() {
        let left = [0.1f32, 0.2, 0.3];
        let right = [-0.1f32, -0.2, -0.3];
        let block = SampleBlock::from_planar(&[&left, &right]);

        assert_eq!(block.frames(), 3);
        assert_eq!(block.channels(), 2);
        assert_eq!(block.buffers()[1], right.to_vec());
    }

    #[test]
    fn planar_truncates_to_shortest_channel() {
        let block = SampleBlock::from_planar(&[&[1.0, 2.0, 3.0], &[4.0, 5.0]]);
        assert_eq!(block.frames(), 2);
        assert_eq!(block.buffers()[0], vec![1.0, 2.0]);
    }

    #[test]
    fn interleaved_is_deinterleaved() {
        let data = [1.0f32, -1.0, 2.0, -2.0, 3.0, -3.0, 9.0];
        let block = SampleBlock::from_interleaved(&data, 2);

        assert_eq!(block.frames(), 3);
        assert_eq!(block.buffers()[0], vec![1.0, 2.0, 3.0]);
        assert_eq!(block.buffers()[1], vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn from_channels_equalizes_lengths() {
        let block = SampleBlock::from_channels(vec![vec![0.0; 4], vec![0.0; 3]]);
        assert_eq!(block.frames(), 3);
        assert!(block.buffers().iter().all(|b| b.len() == 3));
    }

    #[test]
    fn silence_has_requested_shape() {
        let block = SampleBlock::silence(1, 4096);
        assert_eq!(block.channels(), 1);
        assert_eq!(block.frames(), 4096);
        assert!(block.buffers()[0].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn empty_input_yields_empty_block() {
        assert!(SampleBlock::from_planar(&[]).is_empty());
        assert!(SampleBlock::from_interleaved(&[], 2).is_empty());
    }
}
