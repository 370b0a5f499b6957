//! Core library for the BeatDeck rotation engine.
//!
//! BeatDeck continuously plays one "active" video stream out of a small
//! rotating pool of playback decks, switching the active stream exactly on
//! precomputed beat timestamps while the non-active decks pre-buffer to a
//! randomized internal offset, so switches are visually seamless. Each
//! module owns a distinct subsystem: the beat map, the video catalog and
//! selection policy, the per-deck warmup state machine, the rotation
//! scheduler and the failure-recovery path. Rendering, UI and audio plumbing
//! live with the embedder behind the [`port`] traits.

pub mod beatmap;
pub mod catalog;
pub mod config;
pub mod deck;
pub mod error;
pub mod failure;
pub mod port;
pub mod rotation;
pub mod sim;
pub mod warmup;

pub use beatmap::BeatMap;
pub use catalog::{VideoCatalog, VideoId, VideoSelector};
pub use config::{EngineConfig, WarmupConfig};
pub use deck::{Deck, DeckId};
pub use error::{BeatDeckError, Result};
pub use port::{AudioClock, PlaybackPort, PortError, PortState};
pub use rotation::{RotationScheduler, TickReport};
pub use warmup::WarmupPhase;
