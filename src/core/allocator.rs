//! Ephemeral identifier pool allocator.
//!
//! Consumes a [`StabilityMap`] and hands out full identifiers
//! (`starter + suffix`) with O(1) allocate and release. Allocation pressure
//! is tracked per starter, not per suffix: once a starter is consumed by
//! [`EphemeralIds::create`], all of its suffixes are unavailable together
//! until release, so an allocator can issue at most `|starters|` concurrent
//! identifiers.
//!
//! The free list is a fixed array of starters plus a cursor splitting the
//! available prefix from the used tail; removal swaps the chosen starter to
//! the end and shrinks the cursor, which keeps the remaining picks uniform
//! without scanning.
//!
//! The allocator is single-owner: nothing here synchronizes. Concurrent
//! callers must serialize access externally.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use super::cache::MapCache;
use super::generator::{generate_id_map, generate_id_map_cached, GenerateError, GenerateOptions};
use super::map::StabilityMap;
use super::tokenizer::TokenSource;

/// Errors raised by the allocator.
#[derive(Error, Debug)]
pub enum AllocError {
    #[error("identifier map is empty")]
    EmptyMap,
    #[error("identifier map starters do not share a single length")]
    MixedStarterLength,
    #[error("starter {0} has an empty suffix list")]
    EmptySuffixes(String),
    #[error("no available identifiers")]
    Exhausted,
}

/// Errors raised while composing a builder run with allocator construction.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

/// Pool allocator over the starters of a [`StabilityMap`].
pub struct EphemeralIds {
    map: StabilityMap,
    /// Starter arena; `[..num_available]` is the available region.
    starters: Vec<String>,
    num_available: usize,
    active: FxHashSet<String>,
    remapped: FxHashMap<String, String>,
    starter_len: usize,
    rng: StdRng,
}

impl EphemeralIds {
    /// Construct an allocator with OS-seeded randomness.
    pub fn new(map: StabilityMap) -> Result<Self, AllocError> {
        Self::with_rng(map, StdRng::from_os_rng())
    }

    /// Construct an allocator with an injected random source, so allocation
    /// sequences are reproducible in tests.
    pub fn with_rng(map: StabilityMap, rng: StdRng) -> Result<Self, AllocError> {
        if map.is_empty() {
            return Err(AllocError::EmptyMap);
        }
        if let Some((starter, _)) = map.iter().find(|(_, suffixes)| suffixes.is_empty()) {
            return Err(AllocError::EmptySuffixes(starter.to_string()));
        }
        let starter_len = map.starter_len().ok_or(AllocError::MixedStarterLength)?;
        let starters: Vec<String> = map.starters().map(str::to_string).collect();
        let num_available = starters.len();

        Ok(Self {
            map,
            starters,
            num_available,
            active: FxHashSet::default(),
            remapped: FxHashMap::default(),
            starter_len,
            rng,
        })
    }

    /// Build the stability map for `source` and construct an allocator from
    /// it. Plain sequential composition, no caching.
    pub fn from_source(
        source: &dyn TokenSource,
        options: &GenerateOptions,
    ) -> Result<Self, SetupError> {
        let map = generate_id_map(source, options)?;
        Ok(Self::new(map)?)
    }

    /// Like [`EphemeralIds::from_source`], short-circuiting through the
    /// cache on a hit.
    pub fn from_source_cached(
        source: &dyn TokenSource,
        options: &GenerateOptions,
        cache: &MapCache,
    ) -> Result<Self, SetupError> {
        let map = generate_id_map_cached(source, options, cache)?;
        Ok(Self::new(map)?)
    }

    /// Allocate a new ephemeral identifier.
    ///
    /// Picks an available starter uniformly at random, then one of its
    /// suffixes uniformly at random. The starter leaves the available
    /// region until the identifier is released.
    pub fn create(&mut self) -> Result<String, AllocError> {
        if self.num_available == 0 {
            return Err(AllocError::Exhausted);
        }

        let index = self.rng.random_range(0..self.num_available);
        let starter = self.starters[index].clone();
        // Suffix lists are non-empty, checked at construction.
        let suffix = match self.map.suffixes(&starter) {
            Some(list) if !list.is_empty() => list[self.rng.random_range(0..list.len())].clone(),
            _ => return Err(AllocError::Exhausted),
        };
        let id = format!("{starter}{suffix}");

        // Swap the chosen starter out of the available region.
        self.starters.swap(index, self.num_available - 1);
        self.num_available -= 1;

        self.active.insert(id.clone());
        Ok(id)
    }

    /// Release a previously allocated identifier.
    ///
    /// Releasing an identifier that is not currently active is a silent
    /// no-op. The specific suffix is forgotten; a later [`create`] for the
    /// same starter may draw a different one.
    ///
    /// [`create`]: EphemeralIds::create
    pub fn release(&mut self, id: &str) {
        if !self.active.remove(id) {
            return;
        }

        // Recover the starter and reinsert it at the available/used boundary.
        // starter_len is a char count, so take chars rather than slicing bytes.
        let starter: String = id.chars().take(self.starter_len).collect();
        self.starters[self.num_available] = starter;
        self.num_available += 1;
    }

    /// Restore the full starter pool and discard all active identifiers and
    /// remappings, regardless of what callers still hold.
    pub fn reset(&mut self) {
        self.starters.clear();
        self.starters.extend(self.map.starters().map(str::to_string));
        self.num_available = self.starters.len();
        self.active.clear();
        self.remapped.clear();
    }

    /// Map caller identifiers to ephemeral identifiers, allocating and
    /// releasing as the set changes between calls.
    ///
    /// Identifiers absent from `ids` since the previous call are released;
    /// new ones are allocated. Returns the full current mapping.
    pub fn remap(&mut self, ids: &[&str]) -> Result<BTreeMap<String, String>, AllocError> {
        let used: FxHashSet<&str> = ids.iter().copied().collect();

        let stale: Vec<String> = self
            .remapped
            .keys()
            .filter(|key| !used.contains(key.as_str()))
            .cloned()
            .collect();
        for key in stale {
            if let Some(ephemeral) = self.remapped.remove(&key) {
                self.release(&ephemeral);
            }
        }

        for &id in ids {
            if !self.remapped.contains_key(id) {
                let ephemeral = self.create()?;
                self.remapped.insert(id.to_string(), ephemeral);
            }
        }

        Ok(self
            .remapped
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    /// Number of starters currently available for allocation.
    pub fn num_available(&self) -> usize {
        self.num_available
    }

    /// Total number of starters in the pool.
    pub fn capacity(&self) -> usize {
        self.starters.len()
    }

    /// Number of currently active identifiers.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Whether an identifier is currently active.
    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains(id)
    }

    /// The fixed starter length recorded at construction.
    pub fn starter_len(&self) -> usize {
        self.starter_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(map: StabilityMap) -> EphemeralIds {
        EphemeralIds::with_rng(map, StdRng::seed_from_u64(7)).unwrap()
    }

    fn single_starter_map() -> StabilityMap {
        let mut map = StabilityMap::new();
        map.insert("Zq".to_string(), vec!["3f".to_string(), "9k".to_string()]);
        map
    }

    #[test]
    fn test_empty_map_rejected() {
        assert!(matches!(
            EphemeralIds::new(StabilityMap::new()),
            Err(AllocError::EmptyMap)
        ));
    }

    #[test]
    fn test_mixed_starter_lengths_rejected() {
        let mut map = single_starter_map();
        map.insert("Abc".to_string(), vec!["1b".to_string()]);
        assert!(matches!(
            EphemeralIds::new(map),
            Err(AllocError::MixedStarterLength)
        ));
    }

    #[test]
    fn test_empty_suffix_list_rejected() {
        // A hand-edited cache file can parse to a starter with no suffixes;
        // such a map must fail construction, not surface as spurious
        // exhaustion later.
        let mut map = single_starter_map();
        map.insert("Xw".to_string(), vec![]);
        assert!(matches!(
            EphemeralIds::new(map),
            Err(AllocError::EmptySuffixes(starter)) if starter == "Xw"
        ));
    }

    #[test]
    fn test_release_of_multibyte_starter() {
        let mut map = StabilityMap::new();
        map.insert("Éq".to_string(), vec!["3f".to_string()]);
        let mut ids = seeded(map);

        let id = ids.create().unwrap();
        assert_eq!(id, "Éq3f");
        ids.release(&id);
        assert!(!ids.is_active(&id));
        assert_eq!(ids.num_available(), 1);

        assert_eq!(ids.create().unwrap(), "Éq3f");
    }

    #[test]
    fn test_single_starter_lifecycle() {
        let mut ids = seeded(single_starter_map());
        assert_eq!(ids.num_available(), 1);

        let id = ids.create().unwrap();
        assert!(id == "Zq3f" || id == "Zq9k");
        assert!(ids.is_active(&id));
        assert_eq!(ids.num_available(), 0);

        assert!(matches!(ids.create(), Err(AllocError::Exhausted)));

        ids.release(&id);
        assert_eq!(ids.num_available(), 1);
        assert!(!ids.is_active(&id));

        let again = ids.create().unwrap();
        assert!(again == "Zq3f" || again == "Zq9k");
    }

    #[test]
    fn test_double_release_is_noop() {
        let mut ids = seeded(single_starter_map());
        let id = ids.create().unwrap();
        ids.release(&id);
        ids.release(&id);
        assert_eq!(ids.num_available(), 1);
        assert_eq!(ids.active_count(), 0);
    }

    #[test]
    fn test_release_unknown_is_noop() {
        let mut ids = seeded(single_starter_map());
        ids.release("unknown");
        assert_eq!(ids.num_available(), 1);
        assert_eq!(ids.active_count(), 0);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = seeded(single_starter_map());
        let mut b = seeded(single_starter_map());
        assert_eq!(a.create().unwrap(), b.create().unwrap());
    }
}
