use serde::{Deserialize, Serialize};

/// Top-level configuration structure for the rotation engine.
///
/// All values are fixed at construction time; the engine never mutates its
/// configuration while running.
///
/// [`Default`] supplies the tuning constants only and leaves the catalog
/// empty, which a scheduler rejects at construction. Use
/// [`with_catalog`](Self::with_catalog) to build a runnable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Candidate video ids handed to the catalog at startup.
    pub catalog: Vec<String>,
    pub warmup: WarmupConfig,
    /// How far the audio clock must fall between two consecutive ticks for
    /// the engine to conclude the track has looped back to the start.
    pub loop_reset_drop_seconds: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog: Vec::new(),
            warmup: WarmupConfig::default(),
            loop_reset_drop_seconds: 5.0,
        }
    }
}

impl EngineConfig {
    /// Default tuning with the given catalog. This is the usual way to
    /// construct a configuration the scheduler will accept.
    pub fn with_catalog<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            catalog: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Configuration specific to the per-deck warmup poller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarmupConfig {
    /// Margin excluded from both ends of a video when picking a random
    /// buffering offset, so intros and outros never show on screen.
    pub skip_margin_seconds: f32,
    /// Interval between two polls of the same deck's playback port.
    pub poll_interval_seconds: f32,
    /// Upper bound on a single warmup attempt. Once exceeded the deck is
    /// forced ready in a degraded state rather than staying off-rotation.
    pub timeout_seconds: f32,
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            skip_margin_seconds: 10.0,
            poll_interval_seconds: 0.25,
            timeout_seconds: 8.0,
        }
    }
}
