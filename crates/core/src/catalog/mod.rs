use std::collections::HashSet;
use std::fmt;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{BeatDeckError, Result};

/// Opaque identifier of one candidate video stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(String);

impl VideoId {
    pub fn new<T: Into<String>>(id: T) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VideoId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for VideoId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Static pool of candidate video ids plus a mutable exclusion set of ids
/// that failed to load.
///
/// The pool itself never changes after construction. The exclusion set can
/// only grow via [`exclude`](Self::exclude) and is cleared wholesale when it
/// would otherwise starve selection: recovery always wins over remembering
/// failures.
#[derive(Debug, Clone)]
pub struct VideoCatalog {
    ids: Vec<VideoId>,
    excluded: HashSet<VideoId>,
}

impl VideoCatalog {
    pub fn new<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<VideoId>,
    {
        let ids: Vec<VideoId> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Err(BeatDeckError::EmptyCatalog);
        }
        Ok(Self {
            ids,
            excluded: HashSet::new(),
        })
    }

    pub fn ids(&self) -> &[VideoId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Marks an id as known to fail. If the exclusion would leave nothing to
    /// pick from, the whole exclusion set is cleared first and the id is
    /// recorded as the only exclusion.
    pub fn exclude(&mut self, id: &VideoId) {
        if !self.ids.contains(id) {
            return;
        }
        if !self.excluded.contains(id) && self.available() <= 1 {
            tracing::info!(%id, "exclusion would starve the catalog, clearing exclusion set");
            self.excluded.clear();
        }
        // A single-entry catalog can never afford an exclusion.
        if self.ids.len() > 1 {
            self.excluded.insert(id.clone());
        }
    }

    pub fn is_excluded(&self, id: &VideoId) -> bool {
        self.excluded.contains(id)
    }

    pub fn clear_exclusions(&mut self) {
        self.excluded.clear();
    }

    /// Number of ids currently selectable (pool minus exclusions).
    pub fn available(&self) -> usize {
        self.ids.len() - self.excluded.len()
    }
}

/// Uniform random choice over the catalog, honouring the exclusion set and
/// an optional extra id to avoid (typically the video a deck just played or
/// just failed on).
#[derive(Debug)]
pub struct VideoSelector {
    rng: StdRng,
}

impl Default for VideoSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSelector {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic selector for tests and reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Picks a uniformly random id from `catalog − exclusions − {exclude}`.
    ///
    /// If that set is empty the exclusion set is cleared and the pick is
    /// retried against the full pool, still avoiding `exclude` when more
    /// than one id exists. A non-empty catalog therefore always yields an
    /// id, and the same id is never returned right after being excluded
    /// unless it is the only one in the pool.
    pub fn pick(&mut self, catalog: &mut VideoCatalog, exclude: Option<&VideoId>) -> VideoId {
        let candidates: Vec<&VideoId> = catalog
            .ids()
            .iter()
            .filter(|id| !catalog.is_excluded(id) && Some(*id) != exclude)
            .collect();
        if let Some(id) = self.choose(&candidates) {
            return id;
        }

        if catalog.available() < catalog.len() {
            tracing::info!("selection pool exhausted, clearing exclusion set");
            catalog.clear_exclusions();
        }

        let candidates: Vec<&VideoId> = catalog
            .ids()
            .iter()
            .filter(|id| Some(*id) != exclude)
            .collect();
        if let Some(id) = self.choose(&candidates) {
            return id;
        }

        // Single-entry catalog: the only id is the excluded one.
        let index = self.rng.gen_range(0..catalog.len());
        catalog.ids()[index].clone()
    }

    /// Like [`pick`](Self::pick), but additionally avoids every id in
    /// `avoid`. Used at startup so decks receive distinct videos whenever
    /// the catalog is large enough; when it is not, it falls back to a
    /// plain pick and repeats are allowed.
    pub fn pick_avoiding(&mut self, catalog: &mut VideoCatalog, avoid: &[VideoId]) -> VideoId {
        let candidates: Vec<&VideoId> = catalog
            .ids()
            .iter()
            .filter(|id| !catalog.is_excluded(id) && !avoid.contains(id))
            .collect();
        if let Some(id) = self.choose(&candidates) {
            return id;
        }
        self.pick(catalog, None)
    }

    fn choose(&mut self, candidates: &[&VideoId]) -> Option<VideoId> {
        if candidates.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..candidates.len());
        Some(candidates[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(ids: &[&str]) -> VideoCatalog {
        VideoCatalog::new(ids.iter().copied()).unwrap()
    }

    #[test]
    fn rejects_empty_pool() {
        let err = VideoCatalog::new(Vec::<&str>::new()).unwrap_err();
        assert!(matches!(err, BeatDeckError::EmptyCatalog));
    }

    #[test]
    fn never_picks_an_excluded_id() {
        let mut pool = catalog(&["a", "b", "c", "d"]);
        pool.exclude(&"b".into());
        let mut selector = VideoSelector::with_seed(7);

        for _ in 0..100 {
            let picked = selector.pick(&mut pool, None);
            assert_ne!(picked.as_str(), "b");
        }
    }

    #[test]
    fn honours_the_extra_exclusion() {
        let mut pool = catalog(&["a", "b"]);
        let mut selector = VideoSelector::with_seed(7);
        let avoid = VideoId::new("a");

        for _ in 0..50 {
            assert_eq!(selector.pick(&mut pool, Some(&avoid)).as_str(), "b");
        }
    }

    #[test]
    fn clears_exclusions_instead_of_starving() {
        let mut pool = catalog(&["a", "b"]);
        pool.exclude(&"a".into());
        let mut selector = VideoSelector::with_seed(3);

        // "a" excluded and "b" avoided: the set is cleared and "a" comes back.
        let picked = selector.pick(&mut pool, Some(&"b".into()));
        assert_eq!(picked.as_str(), "a");
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn single_entry_catalog_always_yields_its_id() {
        let mut pool = catalog(&["only"]);
        let only = VideoId::new("only");
        pool.exclude(&only);
        let mut selector = VideoSelector::with_seed(1);

        assert_eq!(selector.pick(&mut pool, Some(&only)).as_str(), "only");
    }

    #[test]
    fn avoids_already_assigned_ids_while_the_pool_allows() {
        let mut pool = catalog(&["a", "b", "c", "d"]);
        let mut selector = VideoSelector::with_seed(13);
        let mut assigned: Vec<VideoId> = Vec::new();

        for _ in 0..4 {
            let picked = selector.pick_avoiding(&mut pool, &assigned);
            assert!(!assigned.contains(&picked));
            assigned.push(picked);
        }
    }

    #[test]
    fn allows_repeats_once_the_pool_is_smaller_than_the_avoid_set() {
        let mut pool = catalog(&["a", "b"]);
        let mut selector = VideoSelector::with_seed(13);
        let avoid = vec![VideoId::new("a"), VideoId::new("b")];

        // Not enough ids to stay distinct: the fallback still yields one.
        let picked = selector.pick_avoiding(&mut pool, &avoid);
        assert!(avoid.contains(&picked));
    }

    #[test]
    fn excluding_everything_clears_the_set() {
        let mut pool = catalog(&["a", "b"]);
        pool.exclude(&"a".into());
        pool.exclude(&"b".into());
        // Excluding the last available id cleared the set first.
        assert!(pool.available() >= 1);
        let mut selector = VideoSelector::with_seed(11);
        let _ = selector.pick(&mut pool, None);
    }
}
