//! Compressed fragment accumulator

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::domain::audio::{AudioMimeType, Blob};

use super::protocol::SessionId;

/// Collects each session's fragments in arrival order until its `finish`.
///
/// More than one session can be open while an earlier one is still draining;
/// fragments never cross between them.
#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    mime_type: AudioMimeType,
    sessions: VecDeque<(SessionId, Vec<Vec<u8>>)>,
}

impl ChunkAccumulator {
    pub fn new(mime_type: AudioMimeType) -> Self {
        Self {
            mime_type,
            sessions: VecDeque::new(),
        }
    }

    /// Open an empty collection for `session`
    pub fn begin(&mut self, session: SessionId) {
        if let Some(chunks) = self.chunks_mut(session) {
            chunks.clear();
            return;
        }
        self.sessions.push_back((session, Vec::new()));
    }

    /// Append one fragment. Fragments of unknown sessions are dropped.
    pub fn push(&mut self, session: SessionId, buffer: Vec<u8>) -> bool {
        match self.chunks_mut(session) {
            Some(chunks) => {
                chunks.push(buffer);
                true
            }
            None => {
                warn!(session, bytes = buffer.len(), "dropping fragment for unknown session");
                false
            }
        }
    }

    /// Concatenate and close `session`
    pub fn finish(&mut self, session: SessionId) -> Option<Blob> {
        let index = self.sessions.iter().position(|(id, _)| *id == session)?;
        let (_, chunks) = self.sessions.remove(index)?;
        debug!(session, fragments = chunks.len(), "assembling blob");
        Some(Blob::from_chunks(chunks, self.mime_type))
    }

    pub fn is_open(&self, session: SessionId) -> bool {
        self.sessions.iter().any(|(id, _)| *id == session)
    }

    /// Fragments collected so far for `session`
    pub fn fragment_count(&self, session: SessionId) -> usize {
        self.sessions
            .iter()
            .find(|(id, _)| *id == session)
            .map_or(0, |(_, chunks)| chunks.len())
    }

    fn chunks_mut(&mut self, session: SessionId) -> Option<&mut Vec<Vec<u8>>> {
        self.sessions
            .iter_mut()
            .find(|(id, _)| *id == session)
            .map(|(_, chunks)| chunks)
    }
}
