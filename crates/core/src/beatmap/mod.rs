use std::path::Path;

use crate::{BeatDeckError, Result};

/// Ordered, immutable sequence of beat timestamps in seconds, relative to
/// the start of the audio track.
///
/// The on-disk format is the one the offline analyzer exports: a bare JSON
/// array of seconds, e.g. `[2.0, 5.0, 9.0]`. The map is validated once at
/// load time and never mutated afterwards; the rotation scheduler tracks its
/// own cursor into it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeatMap {
    beats: Vec<f32>,
}

impl BeatMap {
    /// A map without any beats. An engine running on an empty map idles
    /// forever without crossing a beat, which is the specified fallback when
    /// the beat map fails to load.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a map from raw timestamps, validating ordering and range.
    pub fn new(beats: Vec<f32>) -> Result<Self> {
        for (index, &beat) in beats.iter().enumerate() {
            if !beat.is_finite() {
                return Err(BeatDeckError::BeatMap(format!(
                    "timestamp #{index} is not finite"
                )));
            }
            if beat < 0.0 {
                return Err(BeatDeckError::BeatMap(format!(
                    "timestamp #{index} ({beat}) is negative"
                )));
            }
        }
        for (index, window) in beats.windows(2).enumerate() {
            if window[1] <= window[0] {
                return Err(BeatDeckError::BeatMap(format!(
                    "timestamps must be strictly increasing, but #{} ({}) >= #{} ({})",
                    index,
                    window[0],
                    index + 1,
                    window[1]
                )));
            }
        }
        Ok(Self { beats })
    }

    /// Parses the analyzer's JSON export.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let beats: Vec<f32> = serde_json::from_str(json)?;
        Self::new(beats)
    }

    /// Reads and parses a beat map file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn len(&self) -> usize {
        self.beats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    /// Timestamp at `index`, if the index is in range.
    pub fn get(&self, index: usize) -> Option<f32> {
        self.beats.get(index).copied()
    }

    pub fn timestamps(&self) -> &[f32] {
        &self.beats
    }
}
