use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::WarmupConfig;
use crate::deck::Deck;
use crate::port::{PlaybackPort, PortState};
use crate::VideoId;

/// Lifecycle of one deck between "told to load a new video" and "ready to
/// display".
///
/// `Ready` is best-effort: polling errors and timeouts both collapse to it
/// so a deck can never be stuck off-rotation. Real load failures travel the
/// separate port-error path handled by [`crate::failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarmupPhase {
    Idle,
    Loading,
    Seeking,
    Ready,
}

/// Book-keeping for a deck's live warmup poll. At most one exists per deck;
/// replacing it cancels the previous attempt.
#[derive(Debug, Clone, Copy)]
pub struct WarmupPoll {
    /// Pause the port once ready (background decks) instead of leaving it
    /// playing (the active deck).
    pub pause_when_ready: bool,
    /// Wall-clock second at which the next poll step is due.
    pub next_due: f32,
    /// Wall-clock second past which the attempt is abandoned and the deck is
    /// forced ready in a degraded state.
    pub deadline: f32,
}

/// Snapshot of the port observations a poll step decides on.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    pub state: PortState,
    pub duration: f32,
}

/// Decision produced by one poll step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Nothing to do yet; re-arm the poll.
    Wait,
    /// Metadata arrived: seek to a random offset inside the window and move
    /// to `Seeking`. The caller picks the offset so this function stays
    /// deterministic.
    BeginSeek { window: (f32, f32) },
    /// The seek resolved and playback resumed: the deck is ready.
    Finish,
}

/// Pure poll transition: `(phase, observation) -> outcome`, independent of
/// any timer primitive.
///
/// The phase order `Loading → Seeking → Ready` is strict; even a port that
/// reports playing with a known duration on the very first poll spends one
/// step in `Seeking` before the deck is considered ready.
pub fn step(phase: WarmupPhase, observation: &Observation, skip_margin: f32) -> StepOutcome {
    match phase {
        WarmupPhase::Loading => {
            if observation.state == PortState::Playing && observation.duration > 0.0 {
                StepOutcome::BeginSeek {
                    window: seek_window(observation.duration, skip_margin),
                }
            } else {
                StepOutcome::Wait
            }
        }
        WarmupPhase::Seeking => {
            if observation.state == PortState::Playing {
                StepOutcome::Finish
            } else {
                StepOutcome::Wait
            }
        }
        // Idle decks have no poll; Ready decks finished theirs.
        WarmupPhase::Idle | WarmupPhase::Ready => StepOutcome::Wait,
    }
}

/// Safe seekable window `[skip, duration - skip]`. Videos too short for the
/// margin collapse to their midpoint.
fn seek_window(duration: f32, skip_margin: f32) -> (f32, f32) {
    let low = skip_margin;
    let high = duration - skip_margin;
    if high > low {
        (low, high)
    } else {
        let mid = duration * 0.5;
        (mid, mid)
    }
}

/// Starts (or restarts) warmup for a deck: cancels any in-flight poll, loads
/// the new video muted, starts playback so metadata becomes available, and
/// arms a fresh poll.
pub fn begin<P: PlaybackPort>(
    deck: &mut Deck<P>,
    video: VideoId,
    pause_when_ready: bool,
    now: f32,
    config: &WarmupConfig,
) {
    deck.poll = None;
    deck.phase = WarmupPhase::Loading;
    tracing::debug!(deck = %deck.id, %video, pause_when_ready, "warmup started");

    let commands = deck
        .port
        .load(&video)
        .and_then(|_| deck.port.mute())
        .and_then(|_| deck.port.play());
    deck.video = Some(video);

    if let Err(error) = commands {
        degrade(deck, &error.reason);
        return;
    }

    deck.poll = Some(WarmupPoll {
        pause_when_ready,
        next_due: now + config.poll_interval_seconds,
        deadline: now + config.timeout_seconds,
    });
}

/// Runs the deck's poll if it is due. Call once per engine tick; ticks
/// before `next_due` are no-ops, so the effective cadence is the configured
/// poll interval regardless of the tick rate.
pub fn drive<P: PlaybackPort, R: Rng>(
    deck: &mut Deck<P>,
    now: f32,
    config: &WarmupConfig,
    rng: &mut R,
) {
    let Some(poll) = deck.poll else {
        return;
    };

    if now >= poll.deadline {
        tracing::warn!(deck = %deck.id, phase = ?deck.phase, "warmup timed out, forcing ready");
        deck.poll = None;
        deck.phase = WarmupPhase::Ready;
        return;
    }
    if now < poll.next_due {
        return;
    }

    let observation = Observation {
        state: deck.port.state(),
        duration: deck.port.duration(),
    };

    match step(deck.phase, &observation, config.skip_margin_seconds) {
        StepOutcome::Wait => rearm(deck, now, config),
        StepOutcome::BeginSeek { window: (low, high) } => {
            let offset = if high > low {
                rng.gen_range(low..high)
            } else {
                low
            };
            if let Err(error) = deck.port.seek(offset) {
                degrade(deck, &error.reason);
                return;
            }
            tracing::debug!(deck = %deck.id, offset, "seeking to warmup offset");
            deck.phase = WarmupPhase::Seeking;
            rearm(deck, now, config);
        }
        StepOutcome::Finish => {
            if poll.pause_when_ready {
                if let Err(error) = deck.port.pause() {
                    degrade(deck, &error.reason);
                    return;
                }
            }
            tracing::debug!(deck = %deck.id, "warmup complete");
            deck.phase = WarmupPhase::Ready;
            deck.poll = None;
        }
    }
}

fn rearm<P: PlaybackPort>(deck: &mut Deck<P>, now: f32, config: &WarmupConfig) {
    if let Some(poll) = deck.poll.as_mut() {
        poll.next_due = now + config.poll_interval_seconds;
    }
}

/// Terminal for this attempt: stop polling and report the deck ready in a
/// degraded state. Load failures proper are healed by the failure path, not
/// retried here.
fn degrade<P: PlaybackPort>(deck: &mut Deck<P>, reason: &str) {
    tracing::warn!(deck = %deck.id, reason, "port error during warmup, forcing ready");
    deck.poll = None;
    deck.phase = WarmupPhase::Ready;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::DeckId;
    use crate::port::PortError;
    use rand::{rngs::StdRng, SeedableRng};

    /// Minimal scriptable port: tests flip `state`/`duration` directly and
    /// inspect the recorded commands.
    #[derive(Debug, Default)]
    struct FakePort {
        state: Option<PortState>,
        duration: f32,
        loaded: Option<VideoId>,
        muted: bool,
        playing_commands: u32,
        pause_commands: u32,
        seeks: Vec<f32>,
        fail_seek: bool,
    }

    impl PlaybackPort for FakePort {
        fn load(&mut self, video: &VideoId) -> Result<(), PortError> {
            self.loaded = Some(video.clone());
            Ok(())
        }

        fn play(&mut self) -> Result<(), PortError> {
            self.playing_commands += 1;
            Ok(())
        }

        fn pause(&mut self) -> Result<(), PortError> {
            self.pause_commands += 1;
            Ok(())
        }

        fn mute(&mut self) -> Result<(), PortError> {
            self.muted = true;
            Ok(())
        }

        fn seek(&mut self, offset_seconds: f32) -> Result<(), PortError> {
            if self.fail_seek {
                return Err(PortError::new("seek refused"));
            }
            self.seeks.push(offset_seconds);
            Ok(())
        }

        fn duration(&self) -> f32 {
            self.duration
        }

        fn state(&self) -> PortState {
            self.state.unwrap_or(PortState::Unstarted)
        }

        fn take_error(&mut self) -> Option<PortError> {
            None
        }
    }

    fn deck() -> Deck<FakePort> {
        Deck::new(DeckId::A, FakePort::default())
    }

    fn config() -> WarmupConfig {
        WarmupConfig {
            skip_margin_seconds: 10.0,
            poll_interval_seconds: 0.25,
            timeout_seconds: 8.0,
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn begin_loads_muted_and_playing() {
        let mut deck = deck();
        begin(&mut deck, "v1".into(), true, 0.0, &config());

        assert_eq!(deck.phase, WarmupPhase::Loading);
        assert_eq!(deck.port.loaded.as_ref().unwrap().as_str(), "v1");
        assert!(deck.port.muted);
        assert_eq!(deck.port.playing_commands, 1);
        assert!(deck.poll.is_some());
    }

    #[test]
    fn successful_run_visits_each_phase_in_order() {
        let mut deck = deck();
        let cfg = config();
        let mut rng = rng();
        begin(&mut deck, "v1".into(), true, 0.0, &cfg);

        // Metadata not published yet: stay in Loading.
        drive(&mut deck, 0.3, &cfg, &mut rng);
        assert_eq!(deck.phase, WarmupPhase::Loading);

        deck.port.state = Some(PortState::Playing);
        deck.port.duration = 120.0;
        drive(&mut deck, 0.6, &cfg, &mut rng);
        assert_eq!(deck.phase, WarmupPhase::Seeking);
        let offset = deck.port.seeks[0];
        assert!((10.0..=110.0).contains(&offset));

        drive(&mut deck, 0.9, &cfg, &mut rng);
        assert_eq!(deck.phase, WarmupPhase::Ready);
        assert_eq!(deck.port.pause_commands, 1);
        assert!(deck.poll.is_none());
    }

    #[test]
    fn never_skips_the_seeking_phase() {
        let mut deck = deck();
        let cfg = config();
        let mut rng = rng();
        begin(&mut deck, "v1".into(), true, 0.0, &cfg);

        // Port is instantly playing with metadata, yet one poll step only
        // advances one phase.
        deck.port.state = Some(PortState::Playing);
        deck.port.duration = 60.0;
        drive(&mut deck, 0.3, &cfg, &mut rng);
        assert_eq!(deck.phase, WarmupPhase::Seeking);
    }

    #[test]
    fn active_deck_is_left_playing() {
        let mut deck = deck();
        let cfg = config();
        let mut rng = rng();
        begin(&mut deck, "v1".into(), false, 0.0, &cfg);

        deck.port.state = Some(PortState::Playing);
        deck.port.duration = 60.0;
        drive(&mut deck, 0.3, &cfg, &mut rng);
        drive(&mut deck, 0.6, &cfg, &mut rng);

        assert_eq!(deck.phase, WarmupPhase::Ready);
        assert_eq!(deck.port.pause_commands, 0);
    }

    #[test]
    fn short_video_seeks_to_its_midpoint() {
        let mut deck = deck();
        let cfg = config();
        let mut rng = rng();
        begin(&mut deck, "v1".into(), true, 0.0, &cfg);

        deck.port.state = Some(PortState::Playing);
        deck.port.duration = 12.0; // shorter than twice the margin
        drive(&mut deck, 0.3, &cfg, &mut rng);
        assert_eq!(deck.port.seeks, vec![6.0]);
    }

    #[test]
    fn timeout_forces_ready() {
        let mut deck = deck();
        let cfg = config();
        let mut rng = rng();
        begin(&mut deck, "v1".into(), true, 0.0, &cfg);

        // The port never reaches a playing state.
        drive(&mut deck, 8.5, &cfg, &mut rng);
        assert_eq!(deck.phase, WarmupPhase::Ready);
        assert!(deck.poll.is_none());
    }

    #[test]
    fn port_error_during_poll_degrades_to_ready() {
        let mut deck = deck();
        let cfg = config();
        let mut rng = rng();
        begin(&mut deck, "v1".into(), true, 0.0, &cfg);

        deck.port.state = Some(PortState::Playing);
        deck.port.duration = 120.0;
        deck.port.fail_seek = true;
        drive(&mut deck, 0.3, &cfg, &mut rng);

        assert_eq!(deck.phase, WarmupPhase::Ready);
        assert!(deck.poll.is_none());
    }

    #[test]
    fn restarting_warmup_replaces_the_previous_poll() {
        let mut deck = deck();
        let cfg = config();
        begin(&mut deck, "v1".into(), true, 0.0, &cfg);
        begin(&mut deck, "v2".into(), false, 1.0, &cfg);

        assert_eq!(deck.phase, WarmupPhase::Loading);
        assert_eq!(deck.port.loaded.as_ref().unwrap().as_str(), "v2");
        let poll = deck.poll.unwrap();
        assert!(!poll.pause_when_ready);
        assert!(poll.deadline > 1.0);
    }

    #[test]
    fn polls_respect_the_configured_interval() {
        let mut deck = deck();
        let cfg = config();
        let mut rng = rng();
        begin(&mut deck, "v1".into(), true, 0.0, &cfg);

        deck.port.state = Some(PortState::Playing);
        deck.port.duration = 120.0;
        // Due at 0.25; an earlier tick must not advance the machine.
        drive(&mut deck, 0.1, &cfg, &mut rng);
        assert_eq!(deck.phase, WarmupPhase::Loading);
        drive(&mut deck, 0.25, &cfg, &mut rng);
        assert_eq!(deck.phase, WarmupPhase::Seeking);
    }
}
