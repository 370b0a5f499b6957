use rand::{rngs::StdRng, SeedableRng};

use crate::beatmap::BeatMap;
use crate::catalog::{VideoCatalog, VideoSelector};
use crate::config::EngineConfig;
use crate::deck::{Deck, DeckId};
use crate::port::{AudioClock, PlaybackPort};
use crate::warmup::{self, WarmupPhase};
use crate::{failure, Result, VideoId};

/// What the engine tells the visual layer after every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// The single deck currently presented.
    pub active: DeckId,
    /// Progress through the beat map as an index/total pair.
    pub beat_index: usize,
    pub beat_total: usize,
    /// True exactly on the tick that crossed a beat, for one-shot visual
    /// pulses.
    pub beat_fired: bool,
}

/// The orchestrator: owns the deck ring, the active pointer and the beat
/// cursor, and advances the rotation on beat crossings.
///
/// The embedder calls [`tick`](Self::tick) once per frame with the current
/// wall-clock second. Per-deck warmup polls and the safety timeouts are
/// due-times checked inside the tick, so the whole engine is single-threaded
/// and deterministic under test. Beat crossings are processed strictly in
/// beat-map order and the ring advances exactly one position per crossing,
/// capped at one crossing per tick.
#[derive(Debug)]
pub struct RotationScheduler<P: PlaybackPort, C: AudioClock> {
    decks: [Deck<P>; DeckId::COUNT],
    clock: C,
    beat_map: BeatMap,
    catalog: VideoCatalog,
    selector: VideoSelector,
    rng: StdRng,
    config: EngineConfig,
    cursor: usize,
    active: DeckId,
    last_time: Option<f32>,
    paused: bool,
}

impl<P: PlaybackPort, C: AudioClock> RotationScheduler<P, C> {
    pub fn new(
        ports: [P; DeckId::COUNT],
        clock: C,
        beat_map: BeatMap,
        config: EngineConfig,
    ) -> Result<Self> {
        Self::build(
            ports,
            clock,
            beat_map,
            config,
            VideoSelector::new(),
            StdRng::from_entropy(),
        )
    }

    /// Deterministic engine for tests and reproducible runs: both the video
    /// selector and the warmup offset picker derive from `seed`.
    pub fn with_seed(
        ports: [P; DeckId::COUNT],
        clock: C,
        beat_map: BeatMap,
        config: EngineConfig,
        seed: u64,
    ) -> Result<Self> {
        Self::build(
            ports,
            clock,
            beat_map,
            config,
            VideoSelector::with_seed(seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        )
    }

    fn build(
        ports: [P; DeckId::COUNT],
        clock: C,
        beat_map: BeatMap,
        config: EngineConfig,
        selector: VideoSelector,
        rng: StdRng,
    ) -> Result<Self> {
        let catalog = VideoCatalog::new(config.catalog.iter().cloned())?;
        let [port_a, port_b, port_c, port_d] = ports;
        Ok(Self {
            decks: [
                Deck::new(DeckId::A, port_a),
                Deck::new(DeckId::B, port_b),
                Deck::new(DeckId::C, port_c),
                Deck::new(DeckId::D, port_d),
            ],
            clock,
            beat_map,
            catalog,
            selector,
            rng,
            config,
            cursor: 0,
            active: DeckId::A,
            last_time: None,
            paused: false,
        })
    }

    /// Assigns every deck a random initial video and starts warmup. Decks
    /// receive distinct videos whenever the catalog is large enough. The
    /// first ring slot becomes active and is left playing once ready; the
    /// rest are paused-and-primed in the background.
    pub fn start(&mut self, now: f32) {
        let active = self.active;
        let mut assigned: Vec<VideoId> = Vec::with_capacity(self.decks.len());
        for deck in &mut self.decks {
            let video = self.selector.pick_avoiding(&mut self.catalog, &assigned);
            assigned.push(video.clone());
            let pause_when_ready = deck.id != active;
            warmup::begin(deck, video, pause_when_ready, now, &self.config.warmup);
        }
        tracing::info!(active = %active, beats = self.beat_map.len(), "rotation started");
    }

    /// One scheduling tick. `now` is wall-clock seconds, used to pace warmup
    /// polls; beat crossings are judged against the audio clock. A report is
    /// produced on every tick, paused or not, so an idle visualizer stays
    /// alive.
    pub fn tick(&mut self, now: f32) -> TickReport {
        // Port errors and warmup polls run even while paused; only the beat
        // logic freezes.
        for deck in &mut self.decks {
            if let Some(error) = deck.port.take_error() {
                failure::recover_deck(
                    deck,
                    &error,
                    &mut self.catalog,
                    &mut self.selector,
                    now,
                    &self.config.warmup,
                );
            }
        }
        for deck in &mut self.decks {
            warmup::drive(deck, now, &self.config.warmup, &mut self.rng);
        }

        let mut beat_fired = false;
        if !self.paused {
            let time = self.clock.current_time();

            if self.clock.has_ended() {
                self.cursor = 0;
            } else if let Some(last) = self.last_time {
                // A sharp drop means the audio track looped back to the
                // start; restart the beat cursor with it.
                if last - time > self.config.loop_reset_drop_seconds {
                    tracing::debug!(last, time, "audio clock wrapped, resetting beat cursor");
                    self.cursor = 0;
                }
            }

            if let Some(beat) = self.beat_map.get(self.cursor) {
                if time >= beat {
                    self.cross_beat(now, beat);
                    beat_fired = true;
                }
            }
            self.last_time = Some(time);
        }

        TickReport {
            active: self.active,
            beat_index: self.cursor,
            beat_total: self.beat_map.len(),
            beat_fired,
        }
    }

    /// Promotes the ring successor and recycles the vacated deck. One ring
    /// step per crossing, never more.
    fn cross_beat(&mut self, now: f32, beat: f32) {
        let old = self.active;
        let next = old.successor();

        // The promoted deck is expected to be paused-and-primed; if warmup
        // has not finished it is commanded to play anyway.
        if let Err(error) = self.decks[next.index()].port.play() {
            tracing::warn!(deck = %next, reason = %error.reason, "play command failed on promotion");
        }
        self.active = next;

        let exclude = self.decks[old.index()].video.clone();
        let replacement = self.selector.pick(&mut self.catalog, exclude.as_ref());
        warmup::begin(
            &mut self.decks[old.index()],
            replacement,
            true,
            now,
            &self.config.warmup,
        );

        self.cursor += 1;
        tracing::info!(
            beat,
            cursor = self.cursor,
            total = self.beat_map.len(),
            active = %self.active,
            recycled = %old,
            "beat crossing"
        );
    }

    /// Freezes the beat logic. Ticks keep running and keep producing
    /// reports; warmup polls also keep running so background decks finish
    /// priming.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn active_deck(&self) -> DeckId {
        self.active
    }

    pub fn beat_cursor(&self) -> usize {
        self.cursor
    }

    pub fn phase(&self, deck: DeckId) -> WarmupPhase {
        self.decks[deck.index()].phase
    }

    pub fn video(&self, deck: DeckId) -> Option<&VideoId> {
        self.decks[deck.index()].video.as_ref()
    }
}
