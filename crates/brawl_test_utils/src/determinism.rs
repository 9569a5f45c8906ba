//! Determinism testing utilities.
//!
//! Provides a harness for verifying that battle resolution produces
//! byte-identical timelines given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays, balance sweeps and regression fixtures all assume that a
//! roster pair and a seed fully determine a battle. Sources of
//! non-determinism include:
//!
//! - **Floating-point math**: playback cursors use fixed-point arithmetic
//!   via [`brawl_core::math::Fixed`].
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   The engine only iterates fields in positional order and ordered sets.
//!
//! - **System randomness**: every roll comes from a seeded
//!   [`brawl_core::rng::BattleRng`].
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual hooks and event kinds
//! 2. **Property tests**: random rosters must still resolve deterministically
//! 3. **Integration tests**: literal battle scenarios are reproducible
//! 4. **Parallel tests**: running N battles on threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use brawl_core::config::BalanceConfig;
use brawl_core::context::BattleContext;
use brawl_core::simulation::simulate;
use brawl_core::timeline::Timeline;
use brawl_core::unit::RosterUnit;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Timeline length of the first run.
    pub entries: usize,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the battle was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Entries: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.entries,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a computation multiple times and verify every run hashes the same.
///
/// # Example
///
/// ```
/// use brawl_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(3, || 40 + 2, |n: &i32| *n as u64);
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, HashFn>(runs: usize, setup: Setup, hash: HashFn) -> DeterminismResult
where
    Setup: Fn() -> S,
    HashFn: Fn(&S) -> u64,
{
    let hashes: Vec<u64> = (0..runs).map(|_| hash(&setup())).collect();
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        entries: 0,
    }
}

/// Resolve a battle and encode its timeline.
///
/// Returns `None` if the battle fails to resolve or encode.
#[must_use]
pub fn battle_bytes(
    mine: &[RosterUnit],
    opponents: &[RosterUnit],
    seed: u64,
    config: &BalanceConfig,
) -> Option<Vec<u8>> {
    let context = BattleContext::new(mine.to_vec(), seed);
    let report = simulate(context, opponents, config).ok()?;
    report.timeline.to_bytes().ok()
}

/// Resolve the same battle `runs` times and compare the encoded timelines.
///
/// A run that fails to resolve hashes to zero, so a mix of failing and
/// succeeding runs is reported as non-deterministic.
#[must_use]
pub fn verify_battle_determinism(
    runs: usize,
    mine: &[RosterUnit],
    opponents: &[RosterUnit],
    seed: u64,
    config: &BalanceConfig,
) -> DeterminismResult {
    let encoded: Vec<Option<Vec<u8>>> = (0..runs)
        .map(|_| battle_bytes(mine, opponents, seed, config))
        .collect();
    let hashes: Vec<u64> = encoded
        .iter()
        .map(|bytes| bytes.as_ref().map_or(0, compute_hash))
        .collect();
    let is_deterministic = encoded.windows(2).all(|w| w[0] == w[1]);
    let entries = encoded
        .first()
        .and_then(Option::as_ref)
        .and_then(|bytes| Timeline::from_bytes(bytes).ok())
        .map_or(0, |timeline| timeline.len());

    DeterminismResult {
        is_deterministic,
        hashes,
        entries,
    }
}

/// Result of parallel battle runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Timeline hash from each battle.
    pub hashes: Vec<u64>,
    /// Number of battles run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all battles produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all battles matched.
    ///
    /// # Panics
    ///
    /// Panics if battles produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel battles diverged!\n\
                 Battles: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Resolve the same battle on `num_sims` scoped threads.
///
/// # Panics
///
/// Panics if a battle thread panics.
#[must_use]
pub fn run_parallel_battles(
    mine: &[RosterUnit],
    opponents: &[RosterUnit],
    seed: u64,
    config: &BalanceConfig,
    num_sims: usize,
) -> ParallelSimResult {
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    battle_bytes(mine, opponents, seed, config).map_or(0, |bytes| compute_hash(&bytes))
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("battle thread panicked"))
            .collect()
    });

    ParallelSimResult { hashes, num_sims }
}

/// Compare two timelines entry by entry, finding the first divergence.
///
/// # Returns
///
/// `None` if the timelines match, `Some(index)` for the first entry that
/// differs. A length mismatch diverges at the shorter length.
#[must_use]
pub fn find_first_divergence(a: &Timeline, b: &Timeline) -> Option<usize> {
    let shared = a.len().min(b.len());
    (0..shared)
        .find(|&index| a.entry(index) != b.entry(index))
        .or_else(|| (a.len() != b.len()).then_some(shared))
}

/// Verify that an encode/decode round trip preserves a timeline exactly.
#[must_use]
pub fn verify_serialization_determinism(timeline: &Timeline) -> bool {
    let Ok(bytes) = timeline.to_bytes() else {
        return false;
    };
    Timeline::from_bytes(&bytes).is_ok_and(|restored| &restored == timeline)
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for battle testing.
///
/// These strategies generate random but reproducible rosters for
/// property-based testing of the engine and replay layers.
pub mod strategies {
    use brawl_core::unit::{RosterUnit, UnitId, UnitKind, UnitOverrides};
    use proptest::prelude::*;

    /// Any archetype.
    pub fn arb_kind() -> impl Strategy<Value = UnitKind> {
        proptest::sample::select(UnitKind::ALL.to_vec())
    }

    /// Any archetype that always takes at least one damage from a
    /// positive attack.
    pub fn arb_unarmored_kind() -> impl Strategy<Value = UnitKind> {
        let kinds: Vec<UnitKind> = UnitKind::ALL
            .into_iter()
            .filter(|kind| *kind != UnitKind::ArmoredOrc)
            .collect();
        proptest::sample::select(kinds)
    }

    /// Attack values (1-6).
    pub fn arb_attack() -> impl Strategy<Value = i32> {
        1i32..=6
    }

    /// Health values (1-8).
    pub fn arb_health() -> impl Strategy<Value = i32> {
        1i32..=8
    }

    /// Experience values (1-5).
    pub fn arb_xp() -> impl Strategy<Value = u32> {
        1u32..=5
    }

    /// Roster drawn from `kinds`, with ids `first_id..`.
    pub fn arb_roster_of<K>(
        kinds: K,
        first_id: u32,
        max_len: usize,
    ) -> impl Strategy<Value = Vec<RosterUnit>>
    where
        K: Strategy<Value = UnitKind>,
    {
        proptest::collection::vec((kinds, arb_attack(), arb_health(), arb_xp()), 1..=max_len).prop_map(
            move |units| {
                units
                    .into_iter()
                    .zip(first_id..)
                    .map(|((kind, attack, health, xp), id)| {
                        RosterUnit::new(
                            kind,
                            UnitOverrides::new(UnitId(id))
                                .with_stats(attack, health)
                                .with_xp(xp),
                        )
                    })
                    .collect()
            },
        )
    }

    /// Roster of any archetypes with ids `first_id..`.
    pub fn arb_roster(first_id: u32, max_len: usize) -> impl Strategy<Value = Vec<RosterUnit>> {
        arb_roster_of(arb_kind(), first_id, max_len)
    }

    /// Player roster, opponent roster and seed, with disjoint ids.
    pub fn arb_matchup(
        max_len: usize,
    ) -> impl Strategy<Value = (Vec<RosterUnit>, Vec<RosterUnit>, u64)> {
        (arb_roster(1, max_len), arb_roster(100, max_len), any::<u64>())
    }

    /// Like [`arb_matchup`] but without damage-reducing archetypes, so
    /// every fight makes progress.
    pub fn arb_progressing_matchup(
        max_len: usize,
    ) -> impl Strategy<Value = (Vec<RosterUnit>, Vec<RosterUnit>, u64)> {
        (
            arb_roster_of(arb_unarmored_kind(), 1, max_len),
            arb_roster_of(arb_unarmored_kind(), 100, max_len),
            any::<u64>(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::strategies::arb_matchup;
    use super::*;
    use crate::fixtures;
    use proptest::prelude::*;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, || 100u64, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_battle_determinism_fixtures() {
        let config = fixtures::config();
        for (mine, theirs) in [
            fixtures::skeleton_mirror(),
            fixtures::golem_vs_skeleton(),
            fixtures::mixed_skirmish(),
        ] {
            let result = verify_battle_determinism(4, &mine, &theirs, 7, &config);
            result.assert_deterministic();
            assert!(result.entries >= 2);
        }
    }

    #[test]
    fn test_parallel_battles_match() {
        let (mine, theirs) = fixtures::mixed_skirmish();
        let result = run_parallel_battles(&mine, &theirs, 11, &fixtures::config(), 8);
        assert_eq!(result.hashes.len(), 8);
        result.assert_deterministic();
    }

    #[test]
    fn test_find_divergence() {
        let config = fixtures::config();
        let (mine, theirs) = fixtures::mixed_skirmish();
        let run = |seed| {
            simulate(BattleContext::new(mine.clone(), seed), &theirs, &config)
                .unwrap()
                .timeline
        };
        assert_eq!(find_first_divergence(&run(3), &run(3)), None);

        let (golem, skeleton) = fixtures::golem_vs_skeleton();
        let other = simulate(BattleContext::new(golem, 3), &skeleton, &config)
            .unwrap()
            .timeline;
        assert_eq!(find_first_divergence(&run(3), &other), Some(0));
    }

    #[test]
    fn test_serialization_preserves_timeline() {
        let (mine, theirs) = fixtures::mixed_skirmish();
        let report = simulate(BattleContext::new(mine, 5), &theirs, &fixtures::config()).unwrap();
        assert!(verify_serialization_determinism(&report.timeline));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_strategy_ids_are_disjoint((mine, theirs, _seed) in arb_matchup(6)) {
            for unit in &mine {
                prop_assert!(theirs.iter().all(|other| other.id() != unit.id()));
            }
        }
    }
}
