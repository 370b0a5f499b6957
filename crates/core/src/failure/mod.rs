use crate::catalog::{VideoCatalog, VideoSelector};
use crate::config::WarmupConfig;
use crate::deck::Deck;
use crate::port::{PlaybackPort, PortError};
use crate::warmup;

/// Heals a deck whose port reported a load or playback error.
///
/// The failing id joins the exclusion set, a replacement is picked with the
/// failing id explicitly avoided, and warmup is re-issued on the active path
/// (not paused when ready). With at least two catalog entries the same id is
/// therefore never retried twice in a row, and the deck rejoins rotation
/// without operator intervention.
pub fn recover_deck<P: PlaybackPort>(
    deck: &mut Deck<P>,
    error: &PortError,
    catalog: &mut VideoCatalog,
    selector: &mut VideoSelector,
    now: f32,
    config: &WarmupConfig,
) {
    let failed = deck.video.clone();
    match &failed {
        Some(video) => {
            tracing::warn!(deck = %deck.id, %video, reason = %error.reason, "port error, excluding video");
            catalog.exclude(video);
        }
        None => {
            tracing::warn!(deck = %deck.id, reason = %error.reason, "port error before any video was assigned");
        }
    }

    let replacement = selector.pick(catalog, failed.as_ref());
    warmup::begin(deck, replacement, false, now, config);
}
