//! Timeline playback and field resynchronization.
//!
//! Playback never re-runs the engine. Presentation-owned [`LiveUnit`]s are
//! animated incrementally by an [`EventAnimator`], and at every entry
//! boundary (and on every seek or scrub) the live fields are re-synced to
//! the entry's recorded snapshot:
//!
//! - live units missing from the snapshot are destroyed;
//! - snapshot units missing from the live field are created through the
//!   [`UnitFactory`];
//! - existing units are corrected to the snapshot, with any disagreement
//!   in attack, health or visibility logged as drift.
//!
//! The result of a sync depends only on the snapshot, never on the
//! direction playback arrived from, so stepping backward reproduces
//! exactly the state forward playback would have produced.

use serde::{Deserialize, Serialize};

use crate::config::BalanceConfig;
use crate::event::{EventKind, EventKindTag, Outcome};
use crate::field::Side;
use crate::math::{split_position, AnimOffset, Fixed};
use crate::timeline::{ReducedUnit, Timeline, TimelineEntry};
use crate::unit::{ArchetypeFactory, LifeState, Unit, UnitFactory, UnitId};

/// Presentation-side copy of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveUnit {
    /// Displayed stats.
    pub unit: Unit,
    /// Whether the unit is drawn.
    pub visible: bool,
    /// Transient animation displacement.
    pub offset: AnimOffset,
}

impl LiveUnit {
    /// Wrap a unit with a neutral offset.
    #[must_use]
    pub fn new(unit: Unit) -> Self {
        let visible = unit.is_visible();
        Self {
            unit,
            visible,
            offset: AnimOffset::NEUTRAL,
        }
    }
}

/// A presentation object owned by an in-flight animation, such as a
/// floating damage number or a projectile sprite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationResource {
    /// Unit the resource is attached to.
    pub owner: Option<UnitId>,
    /// Event kind that spawned it.
    pub kind: EventKindTag,
    /// Frames until it should be released.
    pub remaining_frames: u32,
}

/// Live units of one side plus the animation resources attached to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveField {
    side: Side,
    units: Vec<LiveUnit>,
    resources: Vec<AnimationResource>,
}

impl LiveField {
    /// Empty field.
    #[must_use]
    pub const fn new(side: Side) -> Self {
        Self {
            side,
            units: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Side this field shows.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Live units in positional order.
    #[must_use]
    pub fn units(&self) -> &[LiveUnit] {
        &self.units
    }

    /// Look up a live unit.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&LiveUnit> {
        self.units.iter().find(|live| live.unit.id == id)
    }

    /// Look up a live unit mutably.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut LiveUnit> {
        self.units.iter_mut().find(|live| live.unit.id == id)
    }

    /// Number of live units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether no units are shown.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Resources still held by animations.
    #[must_use]
    pub fn resources(&self) -> &[AnimationResource] {
        &self.resources
    }

    /// Attach an animation resource.
    pub fn attach(&mut self, resource: AnimationResource) {
        self.resources.push(resource);
    }

    /// Advance every resource by one frame and release expired ones.
    pub fn tick_resources(&mut self) {
        for resource in &mut self.resources {
            resource.remaining_frames = resource.remaining_frames.saturating_sub(1);
        }
        self.resources.retain(|resource| resource.remaining_frames > 0);
    }

    /// Release every resource. Returns how many were dropped.
    pub fn release_resources(&mut self) -> usize {
        let count = self.resources.len();
        self.resources.clear();
        count
    }
}

/// Both live fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveFields {
    /// Player's side.
    pub mine: LiveField,
    /// Opponent's side.
    pub opponents: LiveField,
}

impl Default for LiveFields {
    fn default() -> Self {
        Self {
            mine: LiveField::new(Side::Mine),
            opponents: LiveField::new(Side::Opponent),
        }
    }
}

impl LiveFields {
    /// Field for one side.
    #[must_use]
    pub const fn field(&self, side: Side) -> &LiveField {
        match side {
            Side::Mine => &self.mine,
            Side::Opponent => &self.opponents,
        }
    }

    /// Live unit on either side.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut LiveUnit> {
        if self.mine.get(id).is_some() {
            self.mine.get_mut(id)
        } else {
            self.opponents.get_mut(id)
        }
    }

    /// Live unit on either side.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&LiveUnit> {
        self.mine.get(id).or_else(|| self.opponents.get(id))
    }

    /// Side holding a unit.
    #[must_use]
    pub fn side_of(&self, id: UnitId) -> Option<Side> {
        if self.mine.get(id).is_some() {
            Some(Side::Mine)
        } else if self.opponents.get(id).is_some() {
            Some(Side::Opponent)
        } else {
            None
        }
    }

    fn field_mut(&mut self, side: Side) -> &mut LiveField {
        match side {
            Side::Mine => &mut self.mine,
            Side::Opponent => &mut self.opponents,
        }
    }
}

/// What a sync changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Units instantiated from the snapshot.
    pub created: Vec<UnitId>,
    /// Live units with no snapshot counterpart.
    pub destroyed: Vec<UnitId>,
    /// Units whose stats drifted from the snapshot.
    pub corrected: Vec<UnitId>,
    /// Units whose animation offset was reset to neutral.
    pub offsets_reset: usize,
    /// Straggling animation resources that were forcibly released.
    pub stragglers: usize,
    /// Whether positional order had to be restored.
    pub reordered: bool,
}

impl SyncReport {
    /// True when the sync changed nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
            && self.destroyed.is_empty()
            && self.corrected.is_empty()
            && self.offsets_reset == 0
            && self.stragglers == 0
            && !self.reordered
    }

    fn merge(&mut self, other: Self) {
        self.created.extend(other.created);
        self.destroyed.extend(other.destroyed);
        self.corrected.extend(other.corrected);
        self.offsets_reset += other.offsets_reset;
        self.stragglers += other.stragglers;
        self.reordered |= other.reordered;
    }
}

/// Reconcile a live field with a recorded snapshot.
///
/// The snapshot is authoritative. The resulting field is a pure function
/// of `snapshot`, whatever state `live` was in.
pub fn sync_field<F: UnitFactory>(
    live: &mut LiveField,
    snapshot: &[ReducedUnit],
    factory: &F,
) -> SyncReport {
    let mut report = SyncReport::default();

    if !live.resources.is_empty() {
        report.stragglers = live.release_resources();
        tracing::warn!(
            side = ?live.side,
            count = report.stragglers,
            "Released straggling animation resources before sync"
        );
    }

    let previous_order: Vec<UnitId> = live.units.iter().map(|l| l.unit.id).collect();
    let mut remaining = std::mem::take(&mut live.units);
    let mut synced = Vec::with_capacity(snapshot.len());

    for reduced in snapshot {
        let expected = factory.create(reduced.kind, &reduced.to_overrides());
        match remaining.iter().position(|l| l.unit.id == reduced.id) {
            Some(index) => {
                let mut current = remaining.remove(index);
                if current.unit != expected || current.visible != reduced.visible {
                    log_drift(&current, reduced);
                    report.corrected.push(reduced.id);
                    current.unit = expected;
                    current.visible = reduced.visible;
                }
                if !current.offset.is_neutral() {
                    current.offset = AnimOffset::NEUTRAL;
                    report.offsets_reset += 1;
                }
                synced.push(current);
            }
            None => {
                report.created.push(reduced.id);
                let mut created = LiveUnit::new(expected);
                created.visible = reduced.visible;
                synced.push(created);
            }
        }
    }

    for stale in remaining {
        tracing::debug!(unit = %stale.unit.id, "Destroying live unit absent from snapshot");
        report.destroyed.push(stale.unit.id);
    }

    let kept_order: Vec<UnitId> = previous_order
        .iter()
        .copied()
        .filter(|id| synced.iter().any(|l| l.unit.id == *id))
        .collect();
    let synced_existing: Vec<UnitId> = synced
        .iter()
        .map(|l| l.unit.id)
        .filter(|id| !report.created.contains(id))
        .collect();
    report.reordered = kept_order != synced_existing;

    live.units = synced;
    report
}

fn log_drift(live: &LiveUnit, reduced: &ReducedUnit) {
    if live.unit.attack != reduced.attack {
        tracing::warn!(
            unit = %reduced.id,
            live = live.unit.attack,
            snapshot = reduced.attack,
            "Replay drift in attack"
        );
    }
    if live.unit.health != reduced.health {
        tracing::warn!(
            unit = %reduced.id,
            live = live.unit.health,
            snapshot = reduced.health,
            "Replay drift in health"
        );
    }
    if live.visible != reduced.visible {
        tracing::warn!(
            unit = %reduced.id,
            live = live.visible,
            snapshot = reduced.visible,
            "Replay drift in visibility"
        );
    }
    if live.unit.xp != reduced.xp || live.unit.facing != reduced.facing || live.unit.kind != reduced.kind {
        tracing::warn!(unit = %reduced.id, "Replay drift in identity fields");
    }
}

/// Where a continuous playback position lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorTarget {
    /// Inside the timeline.
    Entry {
        /// Entry to sync to.
        index: usize,
        /// Progress into that entry, in `[0, 1)`.
        fraction: Fixed,
    },
    /// Past the last entry: no more events.
    End,
}

/// Map a position to an entry index and a fractional remainder.
///
/// Negative positions clamp to the first entry. Positions at or past
/// `len` yield [`CursorTarget::End`].
#[must_use]
pub fn resolve_cursor(position: Fixed, len: usize) -> CursorTarget {
    let (index, fraction) = split_position(position);
    if index >= len {
        CursorTarget::End
    } else {
        CursorTarget::Entry { index, fraction }
    }
}

/// Frame being played within one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStep {
    /// 1-based frame number.
    pub frame: u32,
    /// Total frames of the event.
    pub duration: u32,
}

impl FrameStep {
    /// Progress through the event in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> Fixed {
        if self.duration == 0 {
            return Fixed::ONE;
        }
        Fixed::from_num(self.frame.min(self.duration)) / Fixed::from_num(self.duration)
    }

    /// Whether this is the event's final frame.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.frame >= self.duration
    }
}

/// Per-event animation contract.
///
/// Called once per frame while an entry plays. Receives the entry, the
/// live fields, the state returned by the previous frame (default at the
/// first frame) and the frame position, and returns the updated state.
pub trait EventAnimator {
    /// Animation state carried between frames of one entry.
    type State: Default;

    /// Animate one frame.
    fn animate(
        &mut self,
        entry: &TimelineEntry,
        fields: &mut LiveFields,
        prior: Self::State,
        step: FrameStep,
    ) -> Self::State;
}

/// Animator that does nothing. Every entry boundary becomes a pure
/// snapshot jump.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnimator;

impl EventAnimator for NoopAnimator {
    type State = ();

    fn animate(&mut self, _: &TimelineEntry, _: &mut LiveFields, (): (), _: FrameStep) {}
}

/// Animator that applies each event's stat effects on its final frame.
///
/// Playing a timeline with it keeps live units in lockstep with the
/// recorded snapshots, so any drift reported at sync is a real bug.
#[derive(Debug, Clone, Default)]
pub struct StatAnimator {
    config: BalanceConfig,
}

impl StatAnimator {
    /// Animator using the same balance config the battle was resolved with.
    #[must_use]
    pub const fn new(config: BalanceConfig) -> Self {
        Self { config }
    }

    fn apply(&self, entry: &TimelineEntry, fields: &mut LiveFields) {
        let event = &entry.event;
        match &event.kind {
            EventKind::Fight => {
                if let &[left, right] = event.affected_unit_ids.as_slice() {
                    let (Some(l), Some(r)) = (fields.get(left), fields.get(right)) else {
                        return;
                    };
                    let to_right = r.unit.calculate_damage(l.unit.effective_attack(), &self.config);
                    let to_left = l.unit.calculate_damage(r.unit.effective_attack(), &self.config);
                    if let Some(r) = fields.get_mut(right) {
                        r.unit.health -= to_right;
                    }
                    if let Some(l) = fields.get_mut(left) {
                        l.unit.health -= to_left;
                    }
                }
            }
            EventKind::Buff { attack, health, .. } => {
                for &id in &event.affected_unit_ids {
                    if let Some(live) = fields.get_mut(id) {
                        live.unit.attack += attack;
                        live.unit.health += health;
                    }
                }
            }
            EventKind::Ranged { attack, .. } => {
                for &id in &event.affected_unit_ids {
                    if let Some(live) = fields.get_mut(id) {
                        let damage = live.unit.calculate_damage(*attack, &self.config);
                        live.unit.health -= damage;
                    }
                }
            }
            EventKind::Resource { .. } | EventKind::Result { .. } => {}
        }
        for &id in &event.perished_unit_ids {
            if let Some(live) = fields.get_mut(id) {
                live.unit.life = LifeState::DeathPending;
                live.visible = false;
            }
        }
    }
}

/// Progress of a [`StatAnimator`] through one entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatAnimationState {
    /// Resources have been attached for this entry.
    pub started: bool,
}

impl EventAnimator for StatAnimator {
    type State = StatAnimationState;

    fn animate(
        &mut self,
        entry: &TimelineEntry,
        fields: &mut LiveFields,
        prior: StatAnimationState,
        step: FrameStep,
    ) -> StatAnimationState {
        let tag = entry.event.tag();
        if !prior.started {
            for &id in &entry.event.affected_unit_ids {
                if let Some(side) = fields.side_of(id) {
                    fields.field_mut(side).attach(AnimationResource {
                        owner: Some(id),
                        kind: tag,
                        remaining_frames: entry.event.duration.max(1),
                    });
                }
            }
        } else {
            fields.mine.tick_resources();
            fields.opponents.tick_resources();
        }

        if step.is_last() {
            self.apply(entry, fields);
            fields.mine.release_resources();
            fields.opponents.release_resources();
        }
        StatAnimationState { started: true }
    }
}

/// Result of a playback tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Currently animating an entry.
    Playing {
        /// Entry being played.
        index: usize,
        /// Frame within the entry.
        frame: u32,
    },
    /// Paused; the cursor did not move.
    Paused,
    /// No more events. Carries the battle outcome.
    Finished(Option<Outcome>),
}

/// Frame-driven playback cursor over a timeline.
#[derive(Debug)]
pub struct ReplayPlayer<A: EventAnimator, F: UnitFactory = ArchetypeFactory> {
    timeline: Timeline,
    fields: LiveFields,
    animator: A,
    animation: A::State,
    factory: F,
    index: usize,
    frame: u32,
    accumulator: Fixed,
    speed: Fixed,
    paused: bool,
    drift_corrections: usize,
}

impl<A: EventAnimator> ReplayPlayer<A, ArchetypeFactory> {
    /// Player positioned on the first entry.
    #[must_use]
    pub fn new(timeline: Timeline, animator: A) -> Self {
        Self::with_factory(timeline, animator, ArchetypeFactory)
    }
}

impl<A: EventAnimator, F: UnitFactory> ReplayPlayer<A, F> {
    /// Player with a custom unit factory, positioned on the first entry.
    #[must_use]
    pub fn with_factory(timeline: Timeline, animator: A, factory: F) -> Self {
        let mut player = Self {
            timeline,
            fields: LiveFields::default(),
            animator,
            animation: A::State::default(),
            factory,
            index: 0,
            frame: 0,
            accumulator: Fixed::ZERO,
            speed: Fixed::ONE,
            paused: false,
            drift_corrections: 0,
        };
        player.sync_to(0);
        player
    }

    /// Advance by one presentation tick.
    ///
    /// At speed 1 a tick is one frame. Completing an entry syncs the live
    /// fields to the next entry's snapshot.
    pub fn tick(&mut self) -> PlaybackState {
        if self.paused {
            return PlaybackState::Paused;
        }
        if self.is_finished() {
            return PlaybackState::Finished(self.timeline.outcome());
        }

        self.accumulator += self.speed;
        while self.accumulator >= Fixed::ONE && !self.is_finished() {
            self.accumulator -= Fixed::ONE;
            self.advance_frame();
        }

        if self.is_finished() {
            PlaybackState::Finished(self.timeline.outcome())
        } else {
            PlaybackState::Playing {
                index: self.index,
                frame: self.frame,
            }
        }
    }

    fn advance_frame(&mut self) {
        let Some(entry) = self.timeline.entry(self.index) else {
            return;
        };
        self.frame += 1;
        let step = FrameStep {
            frame: self.frame,
            duration: entry.event.duration,
        };
        let prior = std::mem::take(&mut self.animation);
        self.animation = self.animator.animate(entry, &mut self.fields, prior, step);

        if step.is_last() {
            self.index += 1;
            self.frame = 0;
            self.animation = A::State::default();
            self.sync_to(self.index);
        }
    }

    /// Jump to the next entry.
    pub fn step_forward(&mut self) -> CursorTarget {
        self.seek(self.index.saturating_add(1))
    }

    /// Jump to the previous entry, clamping at the first.
    pub fn step_backward(&mut self) -> CursorTarget {
        self.seek(self.index.saturating_sub(1))
    }

    /// Jump to an entry. Indices past the end finish playback.
    pub fn seek(&mut self, index: usize) -> CursorTarget {
        self.cancel_animation();
        if index >= self.timeline.len() {
            self.index = self.timeline.len();
            return CursorTarget::End;
        }
        self.index = index;
        self.sync_to(index);
        CursorTarget::Entry {
            index,
            fraction: Fixed::ZERO,
        }
    }

    /// Jump to a continuous position.
    ///
    /// Syncs to the floor entry and positions the frame counter by the
    /// fractional remainder. Interpolating within the entry is left to the
    /// presentation layer.
    pub fn scrub(&mut self, position: Fixed) -> CursorTarget {
        let target = resolve_cursor(position, self.timeline.len());
        match target {
            CursorTarget::Entry { index, fraction } => {
                self.seek(index);
                let duration = self
                    .timeline
                    .entry(index)
                    .map_or(0, |entry| entry.event.duration);
                self.frame = (fraction * Fixed::from_num(duration)).to_num::<u32>();
            }
            CursorTarget::End => {
                self.seek(self.timeline.len());
            }
        }
        target
    }

    fn cancel_animation(&mut self) {
        let released = self.fields.mine.release_resources() + self.fields.opponents.release_resources();
        if released > 0 {
            tracing::debug!(released, "Cancelled in-flight animation");
        }
        self.animation = A::State::default();
        self.frame = 0;
        self.accumulator = Fixed::ZERO;
    }

    fn sync_to(&mut self, index: usize) -> Option<SyncReport> {
        let entry = self.timeline.entry(index)?;
        let mut report = sync_field(&mut self.fields.mine, &entry.my_units, &self.factory);
        report.merge(sync_field(
            &mut self.fields.opponents,
            &entry.opponent_units,
            &self.factory,
        ));
        self.drift_corrections += report.corrected.len();
        Some(report)
    }

    /// Re-sync to the current entry without moving.
    pub fn resync(&mut self) -> Option<SyncReport> {
        self.sync_to(self.index)
    }

    /// Pause playback.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume playback.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Toggle pause state.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Whether playback is paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Set playback speed in frames per tick, clamped to `[0.1, 10]`.
    pub fn set_speed(&mut self, speed: Fixed) {
        self.speed = speed.clamp(Fixed::from_num(0.1), Fixed::from_num(10));
    }

    /// Playback speed.
    #[must_use]
    pub const fn speed(&self) -> Fixed {
        self.speed
    }

    /// Current entry index. Equals the timeline length once finished.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Frame within the current entry.
    #[must_use]
    pub const fn frame(&self) -> u32 {
        self.frame
    }

    /// Continuous position: entry index plus progress into the entry.
    #[must_use]
    pub fn position(&self) -> Fixed {
        let within = self.timeline.entry(self.index).map_or(Fixed::ZERO, |entry| {
            FrameStep {
                frame: self.frame,
                duration: entry.event.duration,
            }
            .progress()
        });
        Fixed::from_num(self.index) + within
    }

    /// Progress through the timeline in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> Fixed {
        if self.timeline.is_empty() {
            return Fixed::ONE;
        }
        (self.position() / Fixed::from_num(self.timeline.len())).min(Fixed::ONE)
    }

    /// Whether every entry has been played.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.index >= self.timeline.len()
    }

    /// Battle outcome, available once playback has finished.
    #[must_use]
    pub fn result_signal(&self) -> Option<Outcome> {
        if self.is_finished() {
            self.timeline.outcome()
        } else {
            None
        }
    }

    /// Entry being played.
    #[must_use]
    pub fn current_entry(&self) -> Option<&TimelineEntry> {
        self.timeline.entry(self.index)
    }

    /// Live fields.
    #[must_use]
    pub const fn fields(&self) -> &LiveFields {
        &self.fields
    }

    /// Live fields, for presentation code that moves units around.
    pub fn fields_mut(&mut self) -> &mut LiveFields {
        &mut self.fields
    }

    /// Timeline being played.
    #[must_use]
    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Total drift corrections applied since creation.
    #[must_use]
    pub const fn drift_corrections(&self) -> usize {
        self.drift_corrections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BattleContext;
    use crate::simulation::simulate;
    use crate::unit::{RosterUnit, UnitKind, UnitOverrides};

    fn timeline() -> Timeline {
        let mine = vec![
            RosterUnit::new(UnitKind::Skeleton, UnitOverrides::new(UnitId(1))),
            RosterUnit::new(UnitKind::Golem, UnitOverrides::new(UnitId(2))),
        ];
        let theirs = vec![
            RosterUnit::new(UnitKind::Lizard, UnitOverrides::new(UnitId(3))),
            RosterUnit::new(UnitKind::Orc, UnitOverrides::new(UnitId(4))),
        ];
        simulate(BattleContext::new(mine, 3), &theirs, &BalanceConfig::default())
            .unwrap()
            .timeline
    }

    fn fresh_synced(timeline: &Timeline, index: usize) -> LiveFields {
        let mut fields = LiveFields::default();
        let entry = timeline.entry(index).unwrap();
        sync_field(&mut fields.mine, &entry.my_units, &ArchetypeFactory);
        sync_field(&mut fields.opponents, &entry.opponent_units, &ArchetypeFactory);
        fields
    }

    #[test]
    fn test_sync_creates_and_destroys() {
        let timeline = timeline();
        let mut field = LiveField::new(Side::Mine);
        let first = &timeline.entry(0).unwrap().my_units;
        let report = sync_field(&mut field, first, &ArchetypeFactory);
        assert_eq!(report.created, vec![UnitId(1), UnitId(2)]);
        assert_eq!(field.len(), 2);

        let report = sync_field(&mut field, &[], &ArchetypeFactory);
        assert_eq!(report.destroyed, vec![UnitId(1), UnitId(2)]);
        assert!(field.is_empty());
    }

    #[test]
    fn test_sync_is_idempotent() {
        let timeline = timeline();
        let snapshot = &timeline.entry(1).unwrap().opponent_units;
        let mut field = LiveField::new(Side::Opponent);
        sync_field(&mut field, snapshot, &ArchetypeFactory);
        let before = field.clone();
        let second = sync_field(&mut field, snapshot, &ArchetypeFactory);
        assert!(second.is_noop());
        assert_eq!(field, before);
    }

    #[test]
    fn test_sync_corrects_drift_and_offsets() {
        let timeline = timeline();
        let snapshot = &timeline.entry(0).unwrap().my_units;
        let mut field = LiveField::new(Side::Mine);
        sync_field(&mut field, snapshot, &ArchetypeFactory);

        let live = field.get_mut(UnitId(2)).unwrap();
        live.unit.health += 7;
        live.offset = AnimOffset::new(Fixed::from_num(3), Fixed::ZERO, Fixed::ZERO);

        let report = sync_field(&mut field, snapshot, &ArchetypeFactory);
        assert_eq!(report.corrected, vec![UnitId(2)]);
        assert_eq!(report.offsets_reset, 1);
        let live = field.get(UnitId(2)).unwrap();
        assert_eq!(live.unit.health, snapshot[1].health);
        assert!(live.offset.is_neutral());
    }

    #[test]
    fn test_sync_releases_stragglers() {
        let timeline = timeline();
        let snapshot = &timeline.entry(0).unwrap().my_units;
        let mut field = LiveField::new(Side::Mine);
        field.attach(AnimationResource {
            owner: None,
            kind: EventKindTag::Fight,
            remaining_frames: 4,
        });
        let report = sync_field(&mut field, snapshot, &ArchetypeFactory);
        assert_eq!(report.stragglers, 1);
        assert!(field.resources().is_empty());
    }

    #[test]
    fn test_backward_matches_fresh_sync() {
        let timeline = timeline();
        assert!(timeline.len() >= 3);
        let mut player = ReplayPlayer::new(timeline.clone(), NoopAnimator);
        player.seek(2);
        player.step_backward();
        assert_eq!(player.index(), 1);
        assert_eq!(player.fields(), &fresh_synced(&timeline, 1));
    }

    #[test]
    fn test_stat_animator_plays_without_drift() {
        let timeline = timeline();
        let mut player = ReplayPlayer::new(timeline.clone(), StatAnimator::new(BalanceConfig::default()));
        let mut ticks = 0;
        while !matches!(player.tick(), PlaybackState::Finished(_)) {
            ticks += 1;
            assert!(ticks < 100_000);
        }
        assert_eq!(player.drift_corrections(), 0);
        assert_eq!(player.result_signal(), timeline.outcome());
        assert_eq!(u64::try_from(ticks).unwrap() + 1, timeline.total_duration());
    }

    #[test]
    fn test_noop_animator_is_corrected_by_sync() {
        let timeline = timeline();
        let mut player = ReplayPlayer::new(timeline, NoopAnimator);
        player.set_speed(Fixed::from_num(10));
        while !matches!(player.tick(), PlaybackState::Finished(_)) {}
        assert!(player.drift_corrections() > 0);
    }

    #[test]
    fn test_scrub_clamps_and_ends() {
        let timeline = timeline();
        let len = timeline.len();
        let mut player = ReplayPlayer::new(timeline.clone(), NoopAnimator);

        let target = player.scrub(Fixed::from_num(-3));
        assert_eq!(
            target,
            CursorTarget::Entry {
                index: 0,
                fraction: Fixed::ZERO
            }
        );
        assert_eq!(player.fields(), &fresh_synced(&timeline, 0));

        let target = player.scrub(Fixed::from_num(1.5));
        assert_eq!(
            target,
            CursorTarget::Entry {
                index: 1,
                fraction: Fixed::from_num(0.5)
            }
        );
        let duration = timeline.entry(1).unwrap().event.duration;
        assert_eq!(player.frame(), duration / 2);

        assert_eq!(player.scrub(Fixed::from_num(len)), CursorTarget::End);
        assert!(player.is_finished());
        assert_eq!(player.result_signal(), timeline.outcome());
        assert_eq!(player.step_forward(), CursorTarget::End);
    }

    #[test]
    fn test_pause_and_speed() {
        let timeline = timeline();
        let mut player = ReplayPlayer::new(timeline, NoopAnimator);
        player.pause();
        assert_eq!(player.tick(), PlaybackState::Paused);
        assert_eq!(player.frame(), 0);
        player.toggle_pause();
        assert_eq!(player.tick(), PlaybackState::Playing { index: 0, frame: 1 });

        player.set_speed(Fixed::from_num(100));
        assert_eq!(player.speed(), Fixed::from_num(10));
        player.set_speed(Fixed::from_num(0.5));
        assert_eq!(player.tick(), PlaybackState::Playing { index: 0, frame: 1 });
        assert_eq!(player.tick(), PlaybackState::Playing { index: 0, frame: 2 });
    }

    #[test]
    fn test_progress() {
        let timeline = timeline();
        let len = timeline.len();
        let mut player = ReplayPlayer::new(timeline, NoopAnimator);
        assert_eq!(player.progress(), Fixed::ZERO);
        player.seek(len);
        assert_eq!(player.progress(), Fixed::ONE);
        assert_eq!(resolve_cursor(Fixed::ZERO, 0), CursorTarget::End);
    }
}
