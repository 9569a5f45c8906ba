//! Battle resolution benchmarks for brawl_core.
//!
//! Run with: `cargo bench -p brawl_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use brawl_core::config::BalanceConfig;
use brawl_core::context::BattleContext;
use brawl_core::opponent::{OpponentGenerator, ScaledOpponentGenerator};
use brawl_core::replay::{NoopAnimator, ReplayPlayer};
use brawl_core::simulation::simulate;
use brawl_core::unit::{RosterUnit, UnitId, UnitKind, UnitOverrides};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn line_up(size: usize) -> Vec<RosterUnit> {
    UnitKind::ALL
        .iter()
        .cycle()
        .take(size)
        .zip(1u32..)
        .map(|(&kind, id)| RosterUnit::new(kind, UnitOverrides::new(UnitId(id)).with_stats(3, 6)))
        .collect()
}

/// Resolves full battles of growing roster size.
pub fn simulation_benchmark(c: &mut Criterion) {
    let config = BalanceConfig::default();
    let mut group = c.benchmark_group("simulate");
    for size in [1usize, 4, 7] {
        let mine = line_up(size);
        let theirs = ScaledOpponentGenerator::new(42).generate(size as u32 * 2);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let context = BattleContext::new(mine.clone(), 7);
                black_box(simulate(context, black_box(&theirs), &config))
            });
        });
    }
    group.finish();
}

/// Scrubs backward through a resolved timeline, syncing at every entry.
pub fn replay_benchmark(c: &mut Criterion) {
    let config = BalanceConfig::default();
    let theirs = ScaledOpponentGenerator::new(42)
        .with_pool(vec![UnitKind::Golem, UnitKind::Lizard, UnitKind::Skeleton])
        .generate(7);
    let Ok(report) = simulate(BattleContext::new(line_up(7), 7), &theirs, &config) else {
        return;
    };
    let mut player = ReplayPlayer::new(report.timeline, NoopAnimator);
    let len = player.timeline().len();

    c.bench_function("replay_seek_backward", |b| {
        b.iter(|| {
            for index in (0..len).rev() {
                black_box(player.seek(index));
            }
        });
    });
}

criterion_group!(benches, simulation_benchmark, replay_benchmark);
criterion_main!(benches);
