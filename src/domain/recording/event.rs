//! Events raised by the recorder

use std::fmt;

use crate::domain::audio::Blob;

/// Names of the events a recorder raises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Start,
    DataAvailable,
    Stop,
    Error,
}

impl EventType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::DataAvailable => "dataavailable",
            Self::Stop => "stop",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Generic lifecycle event (`start`, `stop`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    event_type: EventType,
}

impl Event {
    pub fn start() -> Self {
        Self {
            event_type: EventType::Start,
        }
    }

    pub fn stop() -> Self {
        Self {
            event_type: EventType::Stop,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }
}

/// `dataavailable` event carrying the finished recording
#[derive(Debug, Clone)]
pub struct BlobEvent {
    data: Blob,
}

impl BlobEvent {
    pub fn new(data: Blob) -> Self {
        Self { data }
    }

    pub fn event_type(&self) -> EventType {
        EventType::DataAvailable
    }

    pub fn data(&self) -> &Blob {
        &self.data
    }

    pub fn into_data(self) -> Blob {
        self.data
    }
}

/// Asynchronous failure reported by the encoder or the capture wiring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    message: String,
}

impl ErrorEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn event_type(&self) -> EventType {
        EventType::Error
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::AudioMimeType;

    #[test]
    fn event_type_names() {
        assert_eq!(Event::start().event_type().as_str(), "start");
        assert_eq!(Event::stop().event_type().to_string(), "stop");
        assert_eq!(EventType::DataAvailable.as_str(), "dataavailable");
        assert_eq!(ErrorEvent::new("boom").event_type(), EventType::Error);
    }

    #[test]
    fn blob_event_exposes_data() {
        let event = BlobEvent::new(Blob::new(vec![1, 2, 3], AudioMimeType::Ogg));
        assert_eq!(event.event_type(), EventType::DataAvailable);
        assert_eq!(event.data().size_bytes(), 3);
        assert_eq!(event.into_data().into_data(), vec![1, 2, 3]);
    }
}
