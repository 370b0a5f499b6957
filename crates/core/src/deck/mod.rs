use std::fmt;

use serde::{Deserialize, Serialize};

use crate::port::PlaybackPort;
use crate::warmup::{WarmupPhase, WarmupPoll};
use crate::VideoId;

/// Identity of one slot in the rotation ring. Promotion order is fixed:
/// A→B→C→D→A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeckId {
    A,
    B,
    C,
    D,
}

impl DeckId {
    /// All deck identities in ring order.
    pub const ALL: [DeckId; 4] = [DeckId::A, DeckId::B, DeckId::C, DeckId::D];

    /// Number of slots in the ring.
    pub const COUNT: usize = Self::ALL.len();

    /// Position of this deck in the ring.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The deck promoted after this one: a modular increment over the ring.
    pub fn successor(self) -> DeckId {
        Self::ALL[(self.index() + 1) % Self::COUNT]
    }
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeckId::A => "A",
            DeckId::B => "B",
            DeckId::C => "C",
            DeckId::D => "D",
        };
        f.write_str(name)
    }
}

/// One slot of the rotation ring: a playback port binding plus the warmup
/// state the engine tracks for it.
///
/// Decks are created once at startup and never destroyed; they are recycled
/// by assigning a new video id and restarting warmup. At most one warmup
/// poll is live per deck; starting a new one replaces (and thereby cancels)
/// the previous one.
#[derive(Debug)]
pub struct Deck<P: PlaybackPort> {
    pub id: DeckId,
    pub port: P,
    pub video: Option<VideoId>,
    pub phase: WarmupPhase,
    pub poll: Option<WarmupPoll>,
}

impl<P: PlaybackPort> Deck<P> {
    pub fn new(id: DeckId, port: P) -> Self {
        Self {
            id,
            port,
            video: None,
            phase: WarmupPhase::Idle,
            poll: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_successor_wraps_around() {
        assert_eq!(DeckId::A.successor(), DeckId::B);
        assert_eq!(DeckId::D.successor(), DeckId::A);
    }

    #[test]
    fn ring_visits_every_deck_before_repeating() {
        let mut seen = Vec::new();
        let mut current = DeckId::A;
        for _ in 0..DeckId::COUNT {
            seen.push(current);
            current = current.successor();
        }
        assert_eq!(current, DeckId::A);
        assert_eq!(seen, DeckId::ALL);
    }
}
