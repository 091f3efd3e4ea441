//! vorbis-recorder - Record live audio into Ogg/Vorbis
//!
//! This crate provides a media recorder that captures a live audio stream and
//! incrementally compresses it with libvorbis on a dedicated encoder thread,
//! raising `start`, `dataavailable`, `stop` and `error` events.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Recording states, events, blobs, sample blocks, config values
//! - **Application**: Recorder state machine, encoder worker protocol, ports
//! - **Infrastructure**: Adapter implementations (cpal, libvorbis, XDG config)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
