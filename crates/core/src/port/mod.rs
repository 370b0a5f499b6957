use std::fmt;

use serde::{Deserialize, Serialize};

use crate::VideoId;

/// Coarse playback state reported by a media player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortState {
    Unstarted,
    Playing,
    Paused,
    Buffering,
    Ended,
}

/// Error raised by a playback port, either synchronously by a command or
/// asynchronously by the player backend (surfaced through
/// [`PlaybackPort::take_error`]).
#[derive(Debug, Clone, thiserror::Error)]
#[error("playback port error: {reason}")]
pub struct PortError {
    pub reason: String,
}

impl PortError {
    pub fn new<T: Into<String>>(reason: T) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Abstraction over one controllable media player.
///
/// None of the commands are assumed to complete synchronously: after `load`
/// or `seek` the engine keeps polling [`state`](Self::state) and
/// [`duration`](Self::duration) until the player actually reaches the
/// expected state. Backend-reported load failures are delivered out of band;
/// the engine drains them once per tick via
/// [`take_error`](Self::take_error).
pub trait PlaybackPort {
    fn load(&mut self, video: &VideoId) -> Result<(), PortError>;
    fn play(&mut self) -> Result<(), PortError>;
    fn pause(&mut self) -> Result<(), PortError>;
    fn mute(&mut self) -> Result<(), PortError>;
    fn seek(&mut self, offset_seconds: f32) -> Result<(), PortError>;
    /// Duration of the loaded video in seconds, or `0.0` while the player
    /// has not published metadata yet.
    fn duration(&self) -> f32;
    fn state(&self) -> PortState;
    /// Removes and returns the most recent backend error, if any.
    fn take_error(&mut self) -> Option<PortError>;
}

/// Read access to the master audio track's clock. The separate audio track
/// carries all sound; video decks stay muted for the process lifetime.
pub trait AudioClock {
    /// Playback position in seconds. Expected to wrap back towards zero when
    /// the track loops.
    fn current_time(&self) -> f32;
    /// True exactly when the track's "ended" boundary has fired.
    fn has_ended(&self) -> bool;
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PortState::Unstarted => "unstarted",
            PortState::Playing => "playing",
            PortState::Paused => "paused",
            PortState::Buffering => "buffering",
            PortState::Ended => "ended",
        };
        f.write_str(name)
    }
}
