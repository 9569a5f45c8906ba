//! ASCII battle visualizer for terminal review of timelines.
//!
//! Both fields are drawn facing each other: the player's front unit sits
//! just left of the divider, the opponent's just right of it.

use std::fmt::Write as _;

use brawl_core::event::{BattleEvent, EventKind};
use brawl_core::replay::{LiveField, LiveFields};
use brawl_core::timeline::{ReducedUnit, Timeline, TimelineEntry};

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";

/// ASCII visualization configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Show unit ids next to archetype names.
    pub show_ids: bool,
    /// Show each event's frame count.
    pub show_frames: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            show_ids: true,
            show_frames: false,
            use_color: true,
        }
    }
}

/// Minimal per-unit view shared by snapshots and live units.
struct Cell<'a> {
    name: &'a str,
    id: u32,
    attack: i32,
    health: i32,
    visible: bool,
}

fn render_cell(cell: &Cell<'_>, config: &AsciiConfig) -> String {
    let mut text = if config.show_ids {
        format!("[{}#{} {}/{}]", cell.name, cell.id, cell.attack, cell.health)
    } else {
        format!("[{} {}/{}]", cell.name, cell.attack, cell.health)
    };
    if !cell.visible {
        text = if config.use_color {
            format!("{DIM}{RED}{text}{RESET}")
        } else {
            format!("({text})")
        };
    }
    text
}

fn render_row(mine: &[Cell<'_>], theirs: &[Cell<'_>], config: &AsciiConfig) -> String {
    let left: Vec<String> = mine.iter().rev().map(|cell| render_cell(cell, config)).collect();
    let right: Vec<String> = theirs.iter().map(|cell| render_cell(cell, config)).collect();
    format!("{} | {}", left.join(" "), right.join(" "))
}

fn snapshot_cells(units: &[ReducedUnit]) -> Vec<Cell<'_>> {
    units
        .iter()
        .map(|unit| Cell {
            name: unit.kind.name(),
            id: unit.id.0,
            attack: unit.attack,
            health: unit.health,
            visible: unit.visible,
        })
        .collect()
}

fn live_cells(field: &LiveField) -> Vec<Cell<'_>> {
    field
        .units()
        .iter()
        .map(|live| Cell {
            name: live.unit.kind.name(),
            id: live.unit.id.0,
            attack: live.unit.attack,
            health: live.unit.health,
            visible: live.visible,
        })
        .collect()
}

/// One-line description of an event.
#[must_use]
pub fn describe_event(event: &BattleEvent) -> String {
    let ids = |ids: &[brawl_core::unit::UnitId]| {
        ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    };
    let mut text = match &event.kind {
        EventKind::Fight => format!("Fight {}", ids(&event.affected_unit_ids)),
        EventKind::Buff {
            source,
            attack,
            health,
            until_end_of_battle_only,
        } => format!(
            "Buff from {source}: {attack:+}/{health:+} on {}{}",
            ids(&event.affected_unit_ids),
            if *until_end_of_battle_only { " (battle only)" } else { "" }
        ),
        EventKind::Ranged { source, attack } => format!(
            "Ranged from {source}: {attack} at {}",
            ids(&event.affected_unit_ids)
        ),
        EventKind::Resource {
            source,
            amount,
            start_amount,
            ..
        } => format!("Gold from {source}: {start_amount} -> {}", start_amount + amount),
        EventKind::Result { outcome } => format!("Result: {outcome}"),
    };
    if !event.perished_unit_ids.is_empty() {
        let _ = write!(text, " | perished {}", ids(&event.perished_unit_ids));
    }
    text
}

/// Render a timeline entry: the event line and the fields before it.
#[must_use]
pub fn render_entry(index: usize, entry: &TimelineEntry, config: &AsciiConfig) -> String {
    let mut out = format!("{index:>4}  {}", describe_event(&entry.event));
    if config.show_frames {
        let _ = write!(out, " ({} frames)", entry.event.duration);
    }
    out.push('\n');
    out.push_str("      ");
    out.push_str(&render_row(
        &snapshot_cells(&entry.my_units),
        &snapshot_cells(&entry.opponent_units),
        config,
    ));
    out
}

/// Render every entry of a timeline.
#[must_use]
pub fn render_timeline(timeline: &Timeline, config: &AsciiConfig) -> String {
    timeline
        .entries()
        .iter()
        .enumerate()
        .map(|(index, entry)| render_entry(index, entry, config))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the live fields of a replay player.
#[must_use]
pub fn render_live(fields: &LiveFields, config: &AsciiConfig) -> String {
    render_row(&live_cells(&fields.mine), &live_cells(&fields.opponents), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::run_battle;
    use crate::scenario::Scenario;

    fn plain() -> AsciiConfig {
        AsciiConfig {
            use_color: false,
            ..AsciiConfig::default()
        }
    }

    #[test]
    fn test_render_mirror() {
        let report = run_battle(&Scenario::skeleton_mirror(), 0).unwrap();
        let text = render_timeline(&report.timeline, &plain());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Fight #1, #100"));
        assert!(lines[0].contains("perished #1, #100"));
        assert_eq!(lines[1].trim(), "[Skeleton#1 2/1] | [Skeleton#100 2/1]");
        assert!(lines[2].contains("Result: Draw"));
        assert_eq!(lines[3].trim(), "|");
    }

    #[test]
    fn test_front_units_face_the_divider() {
        let report = run_battle(&Scenario::skirmish(), 3).unwrap();
        let entry = report.timeline.entry(0).unwrap();
        let row = render_entry(0, entry, &plain());
        let line = row.lines().nth(1).unwrap();
        let divider = line.find(" | ").unwrap();
        let front = format!("#{} ", entry.my_units[0].id.0);
        assert!(line[..divider].rfind(&front) > line[..divider].find("[Falcon"));
    }
}
