//! Vorbis encoder engine backed by libvorbis
//!
//! Ogg pages are written into a shared in-memory sink that plays the role of
//! the engine's pending-output region. The worker drains it after every call.

use std::cell::RefCell;
use std::io::{self, Write};
use std::num::{NonZeroU32, NonZeroU8};
use std::rc::Rc;

use tracing::debug;
use vorbis_rs::{VorbisBitrateManagementStrategy, VorbisEncoder, VorbisEncoderBuilder};

use crate::application::ports::{EncoderBackend, EncoderEngine, EngineError, SessionConfig};
use crate::application::RecorderOptions;

/// Bytes written by the encoder and not yet drained
#[derive(Debug, Clone, Default)]
struct PendingOutput(Rc<RefCell<Vec<u8>>>);

impl Write for PendingOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// libvorbis backend. Stateless; every session builds its own encoder.
#[derive(Debug, Default)]
pub struct VorbisBackend;

impl VorbisBackend {
    pub fn new() -> Self {
        Self
    }
}

impl EncoderBackend for VorbisBackend {
    fn name(&self) -> &str {
        "libvorbis"
    }

    fn create_session(
        &self,
        config: &SessionConfig,
    ) -> Result<Box<dyn EncoderEngine>, EngineError> {
        Ok(Box::new(VorbisEngine::new(config)?))
    }
}

impl Default for RecorderOptions {
    fn default() -> Self {
        RecorderOptions::new(Box::new(VorbisBackend::new()))
    }
}

/// One libvorbis encoder and its staging buffers
pub struct VorbisEngine {
    encoder: Option<VorbisEncoder<PendingOutput>>,
    pending: PendingOutput,
    staging: Vec<Vec<f32>>,
}

impl VorbisEngine {
    pub fn new(config: &SessionConfig) -> Result<Self, EngineError> {
        let sample_rate = NonZeroU32::new(config.sample_rate)
            .ok_or_else(|| EngineError::InvalidConfig("sample rate must be non-zero".into()))?;
        let channels = u8::try_from(config.channels)
            .ok()
            .and_then(NonZeroU8::new)
            .ok_or_else(|| {
                EngineError::InvalidConfig(format!("unsupported channel count {}", config.channels))
            })?;

        let pending = PendingOutput::default();
        let mut builder =
            VorbisEncoderBuilder::new_with_serial(sample_rate, channels, pending.clone(), rand_serial());
        builder.bitrate_management_strategy(VorbisBitrateManagementStrategy::QualityVbr {
            target_quality: config.quality.value(),
        });
        let encoder = builder
            .build()
            .map_err(|e| EngineError::Native(e.to_string()))?;

        debug!(
            channels = config.channels,
            sample_rate = config.sample_rate,
            quality = config.quality.value(),
            "vorbis encoder created"
        );

        Ok(Self {
            encoder: Some(encoder),
            pending,
            staging: vec![Vec::new(); usize::from(config.channels)],
        })
    }
}

impl EncoderEngine for VorbisEngine {
    /// Headers are emitted when the encoder is built
    fn write_headers(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn pending_len(&self) -> usize {
        self.pending.0.borrow().len()
    }

    fn copy_pending(&self, dst: &mut [u8]) {
        let pending = self.pending.0.borrow();
        let n = dst.len().min(pending.len());
        dst[..n].copy_from_slice(&pending[..n]);
    }

    fn clear_pending(&mut self) {
        self.pending.0.borrow_mut().clear();
    }

    fn prepare_analysis(&mut self, frames: usize) -> Result<(), EngineError> {
        for buffer in &mut self.staging {
            buffer.clear();
            buffer.resize(frames, 0.0);
        }
        Ok(())
    }

    fn analysis_buffer(&mut self, channel: usize) -> Option<&mut [f32]> {
        self.staging.get_mut(channel).map(Vec::as_mut_slice)
    }

    fn encode(&mut self) -> Result<(), EngineError> {
        // An empty block would mark end of stream
        if self.staging.first().map_or(true, Vec::is_empty) {
            return Ok(());
        }
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| EngineError::Native("encoder already finished".into()))?;
        encoder
            .encode_audio_block(&self.staging)
            .map_err(|e| EngineError::Native(e.to_string()))
    }

    fn finish(&mut self) -> Result<(), EngineError> {
        let encoder = self
            .encoder
            .take()
            .ok_or_else(|| EngineError::Native("encoder already finished".into()))?;
        encoder
            .finish()
            .map(|_| ())
            .map_err(|e| EngineError::Native(e.to_string()))
    }
}

/// Ogg logical stream serial derived from the clock
fn rand_serial() -> i32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    ((now.as_secs() as u32) ^ now.subsec_nanos()) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recording::Quality;

    fn config(channels: u16) -> SessionConfig {
        SessionConfig {
            channels,
            sample_rate: 48_000,
            quality: Quality::MAX,
        }
    }

    fn drain(engine: &mut VorbisEngine) -> Vec<u8> {
        let mut out = vec![0u8; engine.pending_len()];
        engine.copy_pending(&mut out);
        engine.clear_pending();
        out
    }

    #[test]
    fn finish_without_audio_still_produces_stream() {
        let mut engine = VorbisEngine::new(&config(1)).unwrap();
        engine.write_headers().unwrap();
        let mut output = drain(&mut engine);
        engine.finish().unwrap();
        output.extend(drain(&mut engine));

        assert!(output.starts_with(b"OggS"));
        assert_eq!(engine.pending_len(), 0);
    }

    #[test]
    fn encodes_and_finishes_stereo() {
        let mut engine = VorbisEngine::new(&config(2)).unwrap();
        let mut output = drain(&mut engine);

        for _ in 0..3 {
            engine.prepare_analysis(4096).unwrap();
            engine.analysis_buffer(0).unwrap().fill(0.25);
            engine.analysis_buffer(1).unwrap().fill(-0.25);
            engine.encode().unwrap();
            output.extend(drain(&mut engine));
        }
        engine.finish().unwrap();
        output.extend(drain(&mut engine));

        assert!(output.starts_with(b"OggS"));
        assert!(output.len() > 100);
        assert!(engine.finish().is_err());
    }

    #[test]
    fn empty_block_is_skipped() {
        let mut engine = VorbisEngine::new(&config(1)).unwrap();
        drain(&mut engine);
        engine.prepare_analysis(0).unwrap();
        engine.encode().unwrap();
        assert!(engine.analysis_buffer(1).is_none());
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let bad = SessionConfig {
            sample_rate: 0,
            ..config(1)
        };
        assert!(matches!(
            VorbisEngine::new(&bad),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_zero_channels() {
        assert!(matches!(
            VorbisEngine::new(&config(0)),
            Err(EngineError::InvalidConfig(_))
        ));
    }
}
