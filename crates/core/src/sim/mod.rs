//! Deterministic in-memory playback backend.
//!
//! [`SimulatedPort`] and [`SimClock`] stand in for a real player and the
//! master audio track. The command-line demo drives the engine against them,
//! and the scheduler tests use them to script load latencies, failures and
//! clock wraps without any real media. Each value is split into the handle
//! the engine owns and a control handle the embedder keeps for advancing
//! simulated time and injecting faults.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::port::{AudioClock, PlaybackPort, PortError, PortState};
use crate::VideoId;

/// Latency and duration profile for a simulated player.
#[derive(Debug, Clone)]
pub struct SimPortProfile {
    /// Seconds between `load` and metadata (duration + playing state)
    /// becoming observable.
    pub load_latency: f32,
    /// Seconds a seek spends buffering before playback resumes.
    pub seek_latency: f32,
    /// Duration reported for every loaded video.
    pub video_duration: f32,
}

impl Default for SimPortProfile {
    fn default() -> Self {
        Self {
            load_latency: 0.6,
            seek_latency: 0.3,
            video_duration: 120.0,
        }
    }
}

#[derive(Debug)]
struct PortInner {
    profile: SimPortProfile,
    video: Option<VideoId>,
    state: PortState,
    duration: f32,
    muted: bool,
    metadata_remaining: Option<f32>,
    seek_remaining: Option<f32>,
    last_seek: Option<f32>,
    failing: HashSet<VideoId>,
    pending_error: Option<PortError>,
}

impl PortInner {
    fn advance(&mut self, dt: f32) {
        if let Some(remaining) = self.metadata_remaining {
            let left = remaining - dt;
            if left <= 0.0 {
                self.metadata_remaining = None;
                self.duration = self.profile.video_duration;
                if self.state == PortState::Buffering {
                    self.state = PortState::Playing;
                }
            } else {
                self.metadata_remaining = Some(left);
            }
        }
        if let Some(remaining) = self.seek_remaining {
            let left = remaining - dt;
            if left <= 0.0 {
                self.seek_remaining = None;
                self.state = PortState::Playing;
            } else {
                self.seek_remaining = Some(left);
            }
        }
    }
}

/// Simulated media player. Commands behave like a real embedded player:
/// nothing completes synchronously, metadata appears only after the load
/// latency has elapsed, and scripted videos fail asynchronously.
#[derive(Debug)]
pub struct SimulatedPort {
    inner: Rc<RefCell<PortInner>>,
}

/// Embedder-side handle for one [`SimulatedPort`].
#[derive(Debug, Clone)]
pub struct SimPortControl {
    inner: Rc<RefCell<PortInner>>,
}

impl SimulatedPort {
    pub fn new() -> (Self, SimPortControl) {
        Self::with_profile(SimPortProfile::default())
    }

    pub fn with_profile(profile: SimPortProfile) -> (Self, SimPortControl) {
        let inner = Rc::new(RefCell::new(PortInner {
            profile,
            video: None,
            state: PortState::Unstarted,
            duration: 0.0,
            muted: false,
            metadata_remaining: None,
            seek_remaining: None,
            last_seek: None,
            failing: HashSet::new(),
            pending_error: None,
        }));
        (
            Self {
                inner: inner.clone(),
            },
            SimPortControl { inner },
        )
    }
}

impl PlaybackPort for SimulatedPort {
    fn load(&mut self, video: &VideoId) -> Result<(), PortError> {
        let mut inner = self.inner.borrow_mut();
        inner.video = Some(video.clone());
        inner.state = PortState::Unstarted;
        inner.duration = 0.0;
        inner.seek_remaining = None;
        if inner.failing.contains(video) {
            // The backend accepts the load and reports the failure later,
            // the way real players do.
            inner.metadata_remaining = None;
            inner.pending_error = Some(PortError::new(format!("failed to load {video}")));
        } else {
            inner.metadata_remaining = Some(inner.profile.load_latency);
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), PortError> {
        let mut inner = self.inner.borrow_mut();
        inner.state = if inner.metadata_remaining.is_some() || inner.seek_remaining.is_some() {
            PortState::Buffering
        } else if inner.duration > 0.0 {
            PortState::Playing
        } else {
            PortState::Buffering
        };
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PortError> {
        self.inner.borrow_mut().state = PortState::Paused;
        Ok(())
    }

    fn mute(&mut self) -> Result<(), PortError> {
        self.inner.borrow_mut().muted = true;
        Ok(())
    }

    fn seek(&mut self, offset_seconds: f32) -> Result<(), PortError> {
        let mut inner = self.inner.borrow_mut();
        inner.last_seek = Some(offset_seconds);
        inner.seek_remaining = Some(inner.profile.seek_latency);
        inner.state = PortState::Buffering;
        Ok(())
    }

    fn duration(&self) -> f32 {
        self.inner.borrow().duration
    }

    fn state(&self) -> PortState {
        self.inner.borrow().state
    }

    fn take_error(&mut self) -> Option<PortError> {
        self.inner.borrow_mut().pending_error.take()
    }
}

impl SimPortControl {
    /// Advances the player's internal timers by `dt` seconds.
    pub fn advance(&self, dt: f32) {
        self.inner.borrow_mut().advance(dt);
    }

    /// Scripts a video id to fail on its next load.
    pub fn fail_video(&self, video: VideoId) {
        self.inner.borrow_mut().failing.insert(video);
    }

    pub fn video(&self) -> Option<VideoId> {
        self.inner.borrow().video.clone()
    }

    pub fn state(&self) -> PortState {
        self.inner.borrow().state
    }

    pub fn is_muted(&self) -> bool {
        self.inner.borrow().muted
    }

    pub fn last_seek(&self) -> Option<f32> {
        self.inner.borrow().last_seek
    }
}

#[derive(Debug)]
struct ClockInner {
    time: f32,
    track_length: Option<f32>,
    ended: bool,
}

/// Simulated master audio clock. With a track length set it wraps back to
/// zero the way a looping audio element does.
#[derive(Debug)]
pub struct SimClock {
    inner: Rc<RefCell<ClockInner>>,
}

/// Embedder-side handle for a [`SimClock`].
#[derive(Debug, Clone)]
pub struct SimClockControl {
    inner: Rc<RefCell<ClockInner>>,
}

impl SimClock {
    /// A clock that runs forever without looping.
    pub fn new() -> (Self, SimClockControl) {
        Self::build(None)
    }

    /// A clock that wraps back to zero every `track_length` seconds.
    pub fn looping(track_length: f32) -> (Self, SimClockControl) {
        Self::build(Some(track_length))
    }

    fn build(track_length: Option<f32>) -> (Self, SimClockControl) {
        let inner = Rc::new(RefCell::new(ClockInner {
            time: 0.0,
            track_length,
            ended: false,
        }));
        (
            Self {
                inner: inner.clone(),
            },
            SimClockControl { inner },
        )
    }
}

impl AudioClock for SimClock {
    fn current_time(&self) -> f32 {
        self.inner.borrow().time
    }

    fn has_ended(&self) -> bool {
        self.inner.borrow().ended
    }
}

impl SimClockControl {
    pub fn advance(&self, dt: f32) {
        let mut inner = self.inner.borrow_mut();
        inner.time += dt;
        if let Some(length) = inner.track_length {
            while inner.time >= length {
                inner.time -= length;
            }
        }
    }

    pub fn set_time(&self, seconds: f32) {
        self.inner.borrow_mut().time = seconds;
    }

    pub fn mark_ended(&self) {
        self.inner.borrow_mut().ended = true;
    }

    pub fn time(&self) -> f32 {
        self.inner.borrow().time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_publishes_metadata_after_the_latency() {
        let (mut port, control) = SimulatedPort::new();
        port.load(&"v1".into()).unwrap();
        port.mute().unwrap();
        port.play().unwrap();

        assert_eq!(port.state(), PortState::Buffering);
        assert_eq!(port.duration(), 0.0);

        control.advance(1.0);
        assert_eq!(port.state(), PortState::Playing);
        assert!(port.duration() > 0.0);
        assert!(control.is_muted());
    }

    #[test]
    fn seek_buffers_then_resumes() {
        let (mut port, control) = SimulatedPort::new();
        port.load(&"v1".into()).unwrap();
        port.play().unwrap();
        control.advance(1.0);

        port.seek(42.0).unwrap();
        assert_eq!(port.state(), PortState::Buffering);
        control.advance(0.5);
        assert_eq!(port.state(), PortState::Playing);
        assert_eq!(control.last_seek(), Some(42.0));
    }

    #[test]
    fn scripted_failures_surface_asynchronously() {
        let (mut port, control) = SimulatedPort::new();
        control.fail_video("bad".into());
        port.load(&"bad".into()).unwrap();
        port.play().unwrap();

        control.advance(5.0);
        assert_eq!(port.duration(), 0.0);
        let error = port.take_error().expect("a load failure is pending");
        assert!(error.reason.contains("bad"));
        assert!(port.take_error().is_none());
    }

    #[test]
    fn looping_clock_wraps_to_zero() {
        let (clock, control) = SimClock::looping(120.0);
        control.advance(119.0);
        assert_eq!(clock.current_time(), 119.0);
        control.advance(1.2);
        assert!(clock.current_time() < 1.0);
    }
}
