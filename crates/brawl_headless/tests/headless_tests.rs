//! Scenario files and batch runs driven through the public API.

use brawl_core::event::Outcome;
use brawl_core::timeline::Timeline;
use brawl_core::unit::UnitKind;
use brawl_headless::{
    run_batch, run_battle, run_summary, verify_determinism, BatchConfig, OpponentSetup, Scenario,
};
use brawl_test_utils::determinism::find_first_divergence;
use brawl_test_utils::fixtures::{self, unit_with};

fn golem_scenario() -> Scenario {
    let (mine, theirs) = fixtures::golem_vs_skeleton();
    Scenario {
        name: "golem".to_string(),
        description: String::new(),
        mine,
        opponents: OpponentSetup::Roster(theirs),
        gold: 2,
        balance: fixtures::config(),
    }
}

#[test]
fn scenario_file_resolves_like_in_memory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("golem.ron");
    let scenario = golem_scenario();
    scenario.save(&path).unwrap();

    let loaded = Scenario::resolve(path.to_str().unwrap()).unwrap();
    assert_eq!(loaded, scenario);

    let summary = run_summary(&loaded, 1).unwrap();
    assert_eq!(summary.outcome, Outcome::Win);
    assert_eq!(summary.steps, 2);
    assert_eq!(summary.gold_after, 2);
    assert_eq!(summary.survivors_mine, 1);
}

#[test]
fn saved_timeline_matches_fresh_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("skirmish.timeline");
    let scenario = Scenario::builtin("skirmish").unwrap();

    let report = run_battle(&scenario, 21).unwrap();
    report.timeline.save(&path).unwrap();
    let loaded = Timeline::load(&path).unwrap();
    let again = run_battle(&scenario, 21).unwrap();

    assert_eq!(find_first_divergence(&loaded, &again.timeline), None);
}

#[test]
fn balance_overrides_apply() {
    let mut scenario = golem_scenario();
    scenario.mine = vec![unit_with(UnitKind::OrcThief, 1, 3, 5)];
    scenario.opponents = OpponentSetup::Roster(vec![unit_with(UnitKind::Golem, 2, 1, 1)]);
    scenario.balance.abilities.kill_loot_gold = 4;

    let summary = run_summary(&scenario, 0).unwrap();
    assert_eq!(summary.outcome, Outcome::Win);
    assert_eq!(summary.gold_after, 6);
}

#[test]
fn batch_is_reproducible() {
    let scenario = golem_scenario();
    let first = run_batch(&scenario, BatchConfig::new("golem", 8).with_seed(100));
    let second = run_batch(&scenario, BatchConfig::new("golem", 8).with_seed(100));

    assert_eq!(first.battles, second.battles);
    assert_eq!(first.summary.wins, 8);
    assert!(first.summary.is_balanced(0.9, 1.0));
    assert!(verify_determinism(&scenario, 100, 3));
}
