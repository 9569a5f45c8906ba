//! Headless battle runner for balance sweeps, replay inspection and CI.
//!
//! This crate resolves battles without any presentation layer:
//!
//! - **Balance testing**: run thousands of seeds of a scenario in parallel
//! - **CI verification**: check that a seed always yields the same timeline
//! - **Replay inspection**: play back or scrub saved timeline files
//!
//! Machine-readable output (JSON summaries, RON rosters) goes to stdout,
//! logs go to stderr.
//!
//! # Example
//!
//! ```bash
//! # Resolve one battle and save its timeline
//! cargo run -p brawl_headless -- simulate --scenario skirmish --seed 7 --output battle.timeline
//!
//! # Scrub to the middle of the fourth event
//! cargo run -p brawl_headless -- scrub --file battle.timeline --position 3.5
//!
//! # Balance sweep
//! cargo run -p brawl_headless -- batch --scenario gauntlet --count 1000
//! ```

pub mod ascii_visualizer;
pub mod batch;
pub mod runner;
pub mod scenario;

pub use ascii_visualizer::{describe_event, render_entry, render_live, render_timeline, AsciiConfig};
pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, BatchSummary};
pub use runner::{run_battle, run_summary, BattleSummary};
pub use scenario::{OpponentSetup, Scenario, ScenarioError};
