//! Headless Swamp Brawl battle runner.
//!
//! # Usage
//!
//! ```bash
//! # Resolve a built-in scenario and print its summary as JSON
//! cargo run -p brawl_headless -- simulate --scenario skirmish --seed 3 --render
//!
//! # Print a generated opponent roster as RON
//! cargo run -p brawl_headless -- generate --turn 5 --seed 9
//!
//! # Verify determinism
//! cargo run -p brawl_headless -- verify --scenario gauntlet --seed 12345 --runs 5
//!
//! # Play back a saved timeline at double speed
//! cargo run -p brawl_headless -- play --file battle.timeline --speed 2
//!
//! # Run a batch balance test
//! cargo run -p brawl_headless -- batch --scenario skirmish --count 1000 --output results/
//! ```
//!
//! Output (stdout): JSON summaries, RON rosters and rendered fields
//! Logs (stderr): Debug information

use std::path::{Path, PathBuf};

use brawl_core::config::BalanceConfig;
use brawl_core::math::Fixed;
use brawl_core::opponent::{OpponentGenerator, ScaledOpponentGenerator};
use brawl_core::replay::{CursorTarget, NoopAnimator, PlaybackState, ReplayPlayer, StatAnimator};
use brawl_core::timeline::Timeline;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use brawl_headless::{
    ascii_visualizer::{render_entry, render_live, render_timeline, AsciiConfig},
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::{run_battle, BattleSummary},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "brawl_headless")]
#[command(about = "Headless Swamp Brawl battle runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a single battle
    Simulate {
        /// Built-in scenario name or RON scenario file
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Battle seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Save the timeline to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print every entry as ASCII
        #[arg(long)]
        render: bool,
    },

    /// Print a generated opponent roster as RON
    Generate {
        /// Turn whose scaling applies
        #[arg(short, long, default_value = "1")]
        turn: u32,

        /// Generator seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Verify determinism by resolving the same seed multiple times
    Verify {
        /// Built-in scenario name or RON scenario file
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Play a saved timeline through the stat animator
    Play {
        /// Timeline file
        #[arg(short, long)]
        file: PathBuf,

        /// Frames per tick
        #[arg(long, default_value = "1")]
        speed: Fixed,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Jump to a position in a saved timeline and print the live fields
    Scrub {
        /// Timeline file
        #[arg(short, long)]
        file: PathBuf,

        /// Entry index plus fraction, e.g. 3.5
        #[arg(short, long, allow_negative_numbers = true)]
        position: Fixed,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Run a batch of battles for balance testing
    Batch {
        /// Built-in scenario name or RON scenario file
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Number of battles to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel battles (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for results)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Simulate {
            scenario,
            seed,
            output,
            render,
        } => cmd_simulate(&scenario, seed, output, render),
        Commands::Generate { turn, seed } => cmd_generate(turn, seed),
        Commands::Verify {
            scenario,
            seed,
            runs,
        } => cmd_verify(&scenario, seed, runs),
        Commands::Play {
            file,
            speed,
            no_color,
        } => cmd_play(&file, speed, !no_color),
        Commands::Scrub {
            file,
            position,
            no_color,
        } => cmd_scrub(&file, position, !no_color),
        Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
        } => cmd_batch(&scenario, count, parallel, output, seed),
    }
}

fn fatal(message: &str) -> ! {
    tracing::error!("{message}");
    eprintln!("FATAL: {message}");
    std::process::exit(1);
}

fn load_scenario(name: &str) -> Scenario {
    Scenario::resolve(name).unwrap_or_else(|e| fatal(&format!("Cannot load scenario '{name}': {e}")))
}

fn load_timeline(file: &Path) -> Timeline {
    Timeline::load(file)
        .unwrap_or_else(|e| fatal(&format!("Cannot load timeline '{}': {e}", file.display())))
}

/// Resolve one battle
fn cmd_simulate(scenario: &str, seed: u64, output: Option<PathBuf>, render: bool) {
    let scenario = load_scenario(scenario);
    tracing::info!(scenario = %scenario.name, seed, "Resolving battle");

    let report = run_battle(&scenario, seed).unwrap_or_else(|e| fatal(&e.to_string()));
    let summary = BattleSummary::from_report(seed, &report).unwrap_or_else(|e| fatal(&e.to_string()));

    if render {
        println!("{}", render_timeline(&report.timeline, &AsciiConfig::default()));
    }
    if let Some(path) = output {
        if let Err(e) = report.timeline.save(&path) {
            fatal(&format!("Failed to save timeline: {e}"));
        }
        tracing::info!(path = %path.display(), entries = report.timeline.len(), "Saved timeline");
    }

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => fatal(&format!("Failed to encode summary: {e}")),
    }
}

/// Print a generated opponent roster
fn cmd_generate(turn: u32, seed: u64) {
    let roster = ScaledOpponentGenerator::new(seed).generate(turn);
    match ron::ser::to_string_pretty(&roster, ron::ser::PrettyConfig::default()) {
        Ok(text) => println!("{text}"),
        Err(e) => fatal(&format!("Failed to encode roster: {e}")),
    }
}

/// Verify determinism
fn cmd_verify(scenario: &str, seed: u64, runs: u32) {
    let scenario = load_scenario(scenario);
    tracing::info!(scenario = %scenario.name, seed, runs, "Verifying determinism");

    if verify_determinism(&scenario, seed, runs) {
        println!("PASS: {runs} runs of '{}' with seed {seed} are identical", scenario.name);
    } else {
        eprintln!("FAIL: '{}' with seed {seed} diverged", scenario.name);
        std::process::exit(1);
    }
}

/// Play back a timeline
fn cmd_play(file: &Path, speed: Fixed, use_color: bool) {
    let timeline = load_timeline(file);
    let config = AsciiConfig {
        use_color,
        ..AsciiConfig::default()
    };
    let mut player = ReplayPlayer::new(timeline, StatAnimator::new(BalanceConfig::default()));
    player.set_speed(speed);

    let mut shown = None;
    loop {
        if shown != Some(player.index()) {
            if let Some(entry) = player.current_entry() {
                println!("{}", render_entry(player.index(), entry, &config));
            }
            shown = Some(player.index());
        }
        if let PlaybackState::Finished(outcome) = player.tick() {
            match outcome {
                Some(outcome) => println!("Outcome: {outcome}"),
                None => println!("Outcome: unresolved"),
            }
            break;
        }
    }

    if player.drift_corrections() > 0 {
        tracing::warn!(corrections = player.drift_corrections(), "Playback drifted from snapshots");
    }
}

/// Scrub to a position
fn cmd_scrub(file: &Path, position: Fixed, use_color: bool) {
    let timeline = load_timeline(file);
    let config = AsciiConfig {
        use_color,
        ..AsciiConfig::default()
    };
    let mut player = ReplayPlayer::new(timeline, NoopAnimator);

    match player.scrub(position) {
        CursorTarget::Entry { index, fraction } => {
            println!("Entry {index} at {fraction}");
            if let Some(entry) = player.current_entry() {
                println!("{}", render_entry(index, entry, &config));
            }
            println!("Live: {}", render_live(player.fields(), &config));
        }
        CursorTarget::End => match player.result_signal() {
            Some(outcome) => println!("End of timeline. Outcome: {outcome}"),
            None => println!("End of timeline"),
        },
    }
}

/// Run batch of battles for balance testing
fn cmd_batch(scenario_name: &str, count: u32, parallel: u32, output: PathBuf, seed: u64) {
    let scenario = load_scenario(scenario_name);

    tracing::info!(
        scenario = %scenario.name,
        count = count,
        parallel = parallel,
        seed = seed,
        output = %output.display(),
        "Batch configuration"
    );

    if let Err(e) = std::fs::create_dir_all(&output) {
        fatal(&format!("Cannot create output directory '{}': {e}", output.display()));
    }

    let config = BatchConfig {
        scenario: scenario_name.to_string(),
        battle_count: count,
        parallel_battles: parallel,
        output_dir: output.clone(),
        seed_start: seed,
    };
    let results = run_batch(&scenario, config);

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        fatal(&format!("Failed to save results: {e}"));
    }

    // Print summary
    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Battles resolved: {}", summary.total_battles);
    if !results.errors.is_empty() {
        eprintln!("Battles failed: {}", results.errors.len());
    }
    eprintln!(
        "Wins: {}  Losses: {}  Draws: {}",
        summary.wins, summary.losses, summary.draws
    );
    eprintln!("Win rate: {:.1}%", summary.win_rate * 100.0);
    eprintln!("Average events per battle: {:.1}", summary.avg_steps);
    eprintln!("Results: {}", results_path.display());
}
