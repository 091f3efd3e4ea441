//! Shared fixtures for recorder integration tests

#![allow(dead_code)]

use std::time::Duration;

use tokio::sync::mpsc;

use vorbis_recorder::application::ports::{
    EncoderBackend, EncoderEngine, EngineError, SessionConfig,
};
use vorbis_recorder::application::MediaRecorder;
use vorbis_recorder::domain::audio::Blob;

/// Engine that writes readable markers instead of compressed audio:
/// `H` for headers, `E<frames>` per encode pass and `F` on finish.
pub struct ScriptedEngine {
    pending: Vec<u8>,
    staging: Vec<Vec<f32>>,
}

impl EncoderEngine for ScriptedEngine {
    fn write_headers(&mut self) -> Result<(), EngineError> {
        self.pending.extend_from_slice(b"H");
        Ok(())
    }

    fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn copy_pending(&self, dst: &mut [u8]) {
        dst.copy_from_slice(&self.pending[..dst.len()]);
    }

    fn clear_pending(&mut self) {
        self.pending.clear();
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
        let frames = self.staging.first().map_or(0, Vec::len);
        self.pending
            .extend_from_slice(format!("E{frames}").as_bytes());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), EngineError> {
        self.pending.extend_from_slice(b"F");
        Ok(())
    }
}

#[derive(Default)]
pub struct ScriptedBackend {
    pub fail_load: bool,
}

impl EncoderBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn load(&mut self) -> Result<(), EngineError> {
        if self.fail_load {
            return Err(EngineError::LoadFailed("scripted backend refused".into()));
        }
        Ok(())
    }

    fn create_session(
        &self,
        config: &SessionConfig,
    ) -> Result<Box<dyn EncoderEngine>, EngineError> {
        Ok(Box::new(ScriptedEngine {
            pending: Vec::new(),
            staging: vec![Vec::new(); usize::from(config.channels)],
        }))
    }
}

/// Everything a recorder's handlers observed, in dispatch order
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    Start,
    Data(Blob),
    Stop,
    Error(String),
}

/// Install handlers that forward every event into a channel
pub fn observe(recorder: &MediaRecorder) -> mpsc::UnboundedReceiver<Observed> {
    let (tx, rx) = mpsc::unbounded_channel();

    let sender = tx.clone();
    recorder.set_onstart(move |_| {
        let _ = sender.send(Observed::Start);
    });
    let sender = tx.clone();
    recorder.set_ondataavailable(move |event| {
        let _ = sender.send(Observed::Data(event.data().clone()));
    });
    let sender = tx.clone();
    recorder.set_onstop(move |_| {
        let _ = sender.send(Observed::Stop);
    });
    recorder.set_onerror(move |event| {
        let _ = tx.send(Observed::Error(event.message().to_string()));
    });

    rx
}

/// Next event, failing the test after two seconds
pub async fn next(events: &mut mpsc::UnboundedReceiver<Observed>) -> Observed {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for recorder event")
        .expect("event channel closed")
}

/// Assert nothing else arrives for a short while
pub async fn assert_quiet(events: &mut mpsc::UnboundedReceiver<Observed>) {
    let extra = tokio::time::timeout(Duration::from_millis(100), events.recv()).await;
    assert!(
        !matches!(extra, Ok(Some(_))),
        "unexpected event: {:?}",
        extra
    );
}
