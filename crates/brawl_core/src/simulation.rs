//! Battle resolution.
//!
//! The [`BattleEngine`] resolves a battle to completion before any
//! playback starts. It owns the canonical fields, mutates unit stats only
//! while processing events, and appends every resolved event (with
//! snapshots of both fields taken before processing) to a [`Timeline`].
//!
//! # Ordering
//!
//! Pending events live on a [`ReactionStack`]. Reactions preempt the main
//! schedule: a death, kill or hit reaction pushed while processing an
//! event is resolved before the next scheduled fight, and cascades resolve
//! depth first. Only when the stack is empty does the scheduler add new
//! work, in this order:
//!
//! 1. a result, if either field is empty;
//! 2. pending before-battle triggers, one at a time;
//! 3. the second-position "before the front attacks" trigger of each side,
//!    at most once per round;
//! 4. the frontline fight.
//!
//! # Determinism
//!
//! - No wall clock and no system randomness. Random hook rolls come from a
//!   [`BattleRng`] seeded by the [`BattleContext`].
//! - Fields are scanned in positional order, mine before the opponent's.
//! - Hooks are pure functions of the fields, the config and the roll.
//!
//! # Example
//!
//! ```
//! use brawl_core::config::BalanceConfig;
//! use brawl_core::context::BattleContext;
//! use brawl_core::event::Outcome;
//! use brawl_core::simulation::simulate;
//! use brawl_core::unit::{RosterUnit, UnitId, UnitKind, UnitOverrides};
//!
//! let mine = vec![RosterUnit::new(UnitKind::Golem, UnitOverrides::new(UnitId(1)))];
//! let theirs = vec![RosterUnit::new(UnitKind::Skeleton, UnitOverrides::new(UnitId(2)))];
//!
//! let config = BalanceConfig::default();
//! let report = simulate(BattleContext::new(mine, 7), &theirs, &config).unwrap();
//! assert_eq!(report.outcome, Outcome::Win);
//! assert_eq!(report.timeline.len(), 2);
//! ```

use std::collections::BTreeSet;

use crate::abilities::{archetype, FiredHooks, HookContext, HookKind};
use crate::config::BalanceConfig;
use crate::context::BattleContext;
use crate::error::{BattleError, Result};
use crate::event::{BattleEvent, EventKind, Outcome};
use crate::field::{Field, Side};
use crate::rng::BattleRng;
use crate::timeline::{snapshot, Timeline, TimelineEntry};
use crate::unit::{ArchetypeFactory, Facing, LifeState, RosterUnit, Unit, UnitFactory, UnitId};

/// Engine state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// More events to resolve.
    Running,
    /// A result event has been recorded.
    Terminal(Outcome),
}

/// Why an event sits on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Added by the scheduler.
    Schedule,
    /// Kill or hit reaction.
    Reaction,
    /// Death reaction of this unit. The unit is removed once it resolves.
    Death(UnitId),
}

#[derive(Debug, Clone)]
struct Queued {
    event: BattleEvent,
    origin: Origin,
}

/// LIFO store of pending events.
///
/// Reactions preempt the main schedule: the most recently pushed event is
/// always resolved next.
#[derive(Debug, Clone, Default)]
pub struct ReactionStack {
    pending: Vec<Queued>,
}

impl ReactionStack {
    fn push(&mut self, event: BattleEvent, origin: Origin) {
        self.pending.push(Queued { event, origin });
    }

    /// Push a batch so that its first element resolves first.
    fn push_reactions(&mut self, reactions: Vec<Queued>) {
        self.pending.extend(reactions.into_iter().rev());
    }

    fn pop(&mut self) -> Option<Queued> {
        self.pending.pop()
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Everything a resolved battle produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleReport {
    /// Final outcome.
    pub outcome: Outcome,
    /// Immutable event record.
    pub timeline: Timeline,
    /// Context with gold and persistent buffs applied.
    pub context: BattleContext,
    /// Number of resolved events, including the result.
    pub steps: u32,
    /// Recoverable faults encountered along the way.
    pub faults: Vec<BattleError>,
}

/// Side effects of processing one event that may trigger reactions.
#[derive(Debug, Default)]
struct Effects {
    /// Units whose fight attack reduced a foe to zero health.
    kills: Vec<UnitId>,
    /// Surviving attackers and the unit they hit.
    hits: Vec<(UnitId, UnitId)>,
}

/// Deterministic battle resolver.
#[derive(Debug)]
pub struct BattleEngine<'c> {
    config: &'c BalanceConfig,
    mine: Field,
    opponents: Field,
    context: BattleContext,
    stack: ReactionStack,
    fired: FiredHooks,
    rng: BattleRng,
    timeline: Timeline,
    state: EngineState,
    steps: u32,
    battle_started: bool,
    departed: BTreeSet<UnitId>,
    faults: Vec<BattleError>,
}

impl<'c> BattleEngine<'c> {
    /// Build both fields from the context's roster and the opponent roster.
    ///
    /// # Errors
    /// Returns [`BattleError::DuplicateUnitId`] if an id appears twice
    /// within or across the rosters.
    pub fn new<F: UnitFactory>(
        context: BattleContext,
        opponents: &[RosterUnit],
        factory: &F,
        config: &'c BalanceConfig,
    ) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for entry in context.roster.iter().chain(opponents) {
            if !seen.insert(entry.id()) {
                return Err(BattleError::DuplicateUnitId(entry.id()));
            }
        }

        let deploy = |entry: &RosterUnit, facing: Facing| -> Unit {
            let mut unit = factory.from_roster(entry);
            unit.facing = facing;
            unit.life = LifeState::Alive;
            unit
        };
        let mine = Field::with_contents(
            Side::Mine,
            context.roster.iter().map(|e| deploy(e, Facing::Right)).collect(),
        );
        let opponents = Field::with_contents(
            Side::Opponent,
            opponents.iter().map(|e| deploy(e, Facing::Left)).collect(),
        );

        Ok(Self {
            config,
            mine,
            opponents,
            rng: BattleRng::new(context.seed),
            context,
            stack: ReactionStack::default(),
            fired: FiredHooks::new(),
            timeline: Timeline::new(),
            state: EngineState::Running,
            steps: 0,
            battle_started: false,
            departed: BTreeSet::new(),
            faults: Vec::new(),
        })
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// Events resolved so far.
    #[must_use]
    pub const fn steps(&self) -> u32 {
        self.steps
    }

    /// Timeline recorded so far.
    #[must_use]
    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Canonical field of one side.
    #[must_use]
    pub const fn field(&self, side: Side) -> &Field {
        match side {
            Side::Mine => &self.mine,
            Side::Opponent => &self.opponents,
        }
    }

    /// Context as mutated so far.
    #[must_use]
    pub const fn context(&self) -> &BattleContext {
        &self.context
    }

    /// Recoverable faults so far.
    #[must_use]
    pub fn faults(&self) -> &[BattleError] {
        &self.faults
    }

    /// Pending events.
    #[must_use]
    pub const fn pending(&self) -> &ReactionStack {
        &self.stack
    }

    /// Resolve until a result is recorded.
    ///
    /// # Errors
    /// Returns [`BattleError::DidNotReachFinality`] if the step limit is
    /// exhausted first.
    pub fn run(mut self) -> Result<BattleReport> {
        tracing::info!(
            mine = self.mine.len(),
            opponents = self.opponents.len(),
            seed = self.context.seed,
            "Battle started"
        );
        loop {
            if let EngineState::Terminal(outcome) = self.step()? {
                return Ok(BattleReport {
                    outcome,
                    timeline: self.timeline,
                    context: self.context,
                    steps: self.steps,
                    faults: self.faults,
                });
            }
        }
    }

    /// Resolve a single event.
    ///
    /// A reaction whose targets have all left the field is discarded
    /// without a timeline entry.
    ///
    /// # Errors
    /// Returns [`BattleError::DidNotReachFinality`] once the configured
    /// step limit has been used up.
    pub fn step(&mut self) -> Result<EngineState> {
        if let EngineState::Terminal(_) = self.state {
            return Ok(self.state);
        }
        if self.steps >= self.config.max_steps {
            tracing::error!(steps = self.steps, "Battle did not reach finality");
            return Err(BattleError::DidNotReachFinality { steps: self.steps });
        }

        if self.stack.is_empty() {
            self.schedule();
        }
        let Some(Queued { mut event, origin }) = self.stack.pop() else {
            return Err(BattleError::InvalidState(
                "scheduler produced no event".to_string(),
            ));
        };
        if !self.prune_departed(&mut event) {
            if let Origin::Death(id) = origin {
                self.remove_unit(id);
            }
            return Ok(self.state);
        }
        self.steps += 1;

        let my_units = snapshot(&self.mine);
        let opponent_units = snapshot(&self.opponents);
        tracing::debug!(
            step = self.steps,
            kind = %event.tag(),
            affected = ?event.affected_unit_ids,
            "Resolving event"
        );

        if let Some(outcome) = event.outcome() {
            self.timeline.push(TimelineEntry {
                event,
                my_units,
                opponent_units,
            });
            self.state = EngineState::Terminal(outcome);
            tracing::info!(%outcome, steps = self.steps, "Battle finished");
            return Ok(self.state);
        }

        match self.process(&mut event) {
            Ok(effects) => {
                // Hit and kill hooks read the fields before dead units leave them.
                let mut reactions = self.hit_reactions(&effects.hits);
                reactions.extend(self.kill_reactions(&effects.kills));
                reactions.extend(self.death_sweep(&mut event));
                self.stack.push_reactions(reactions);
            }
            Err(fault) => {
                tracing::error!(step = self.steps, %fault, "Skipping event");
                self.faults.push(fault);
            }
        }

        if let Origin::Death(id) = origin {
            self.remove_unit(id);
        }

        #[cfg(feature = "debug-validation")]
        self.validate();

        self.timeline.push(TimelineEntry {
            event,
            my_units,
            opponent_units,
        });
        Ok(self.state)
    }

    fn schedule(&mut self) {
        let config = self.config;
        if self.mine.is_empty() || self.opponents.is_empty() {
            let outcome = match (self.mine.is_empty(), self.opponents.is_empty()) {
                (false, true) => Outcome::Win,
                (true, false) => Outcome::Loss,
                _ => Outcome::Draw,
            };
            self.stack
                .push(BattleEvent::result(outcome, &config.pacing), Origin::Schedule);
            return;
        }

        if !self.battle_started {
            if let Some(event) = self.next_before_battle() {
                self.stack.push(event, Origin::Schedule);
                return;
            }
            self.battle_started = true;
        }

        if let Some(event) = self.next_before_ally_attacks() {
            self.stack.push(event, Origin::Schedule);
            return;
        }

        let (Some(mine), Some(theirs)) = (self.mine.front(), self.opponents.front()) else {
            return;
        };
        let fight = BattleEvent::fight(mine.id, theirs.id, &config.pacing);
        self.fired.clear_kind(HookKind::BeforeAllyAttacks);
        self.stack.push(fight, Origin::Schedule);
    }

    fn next_before_battle(&mut self) -> Option<BattleEvent> {
        loop {
            let (id, hook) = [Side::Mine, Side::Opponent]
                .into_iter()
                .flat_map(|side| self.field(side).alive())
                .filter(|unit| !self.fired.has_fired(unit.id, HookKind::BeforeBattle))
                .find_map(|unit| archetype(unit.kind).before_battle.map(|hook| (unit.id, hook)))?;
            self.fired.mark(id, HookKind::BeforeBattle);
            if let Some(event) = self.run_hook(id, hook) {
                return Some(event);
            }
        }
    }

    fn next_before_ally_attacks(&mut self) -> Option<BattleEvent> {
        for side in [Side::Mine, Side::Opponent] {
            let Some(unit) = self.field(side).second().filter(|unit| unit.is_alive()) else {
                continue;
            };
            let id = unit.id;
            let Some(hook) = archetype(unit.kind).before_ally_attacks else {
                continue;
            };
            if !self.fired.mark(id, HookKind::BeforeAllyAttacks) {
                continue;
            }
            if let Some(event) = self.run_hook(id, hook) {
                return Some(event);
            }
        }
        None
    }

    fn run_hook<H>(&mut self, id: UnitId, hook: H) -> Option<BattleEvent>
    where
        H: FnOnce(&HookContext<'_>) -> Option<BattleEvent>,
    {
        let side = self.locate(id)?;
        let roll = self.rng.next_u64();
        let (own, enemy) = match side {
            Side::Mine => (&self.mine, &self.opponents),
            Side::Opponent => (&self.opponents, &self.mine),
        };
        let unit = own.get(id)?;
        hook(&HookContext {
            unit,
            own,
            enemy,
            config: self.config,
            roll,
        })
    }

    fn locate(&self, id: UnitId) -> Option<Side> {
        if self.mine.contains(id) {
            Some(Side::Mine)
        } else if self.opponents.contains(id) {
            Some(Side::Opponent)
        } else {
            None
        }
    }

    fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.mine.get(id).or_else(|| self.opponents.get(id))
    }

    fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        match self.locate(id)? {
            Side::Mine => self.mine.get_mut(id),
            Side::Opponent => self.opponents.get_mut(id),
        }
    }

    fn remove_unit(&mut self, id: UnitId) {
        let removed = match self.locate(id) {
            Some(Side::Mine) => self.mine.remove_content(id),
            Some(Side::Opponent) => self.opponents.remove_content(id),
            None => None,
        };
        if removed.is_some() {
            self.departed.insert(id);
            tracing::debug!(unit = %id, "Unit removed");
        }
    }

    /// Drop targets that died and left the field after the event was queued.
    ///
    /// Returns `false` when no target is left, in which case the event is
    /// discarded without a timeline entry.
    fn prune_departed(&self, event: &mut BattleEvent) -> bool {
        let queued = event.affected_unit_ids.len();
        event
            .affected_unit_ids
            .retain(|id| !self.departed.contains(id));
        let remaining = event.affected_unit_ids.len();
        if remaining == queued {
            return true;
        }
        tracing::warn!(
            kind = %event.tag(),
            dropped = queued - remaining,
            remaining,
            "Dropped targets that already left the field"
        );
        if remaining == 0 {
            return false;
        }
        event.duration = self
            .config
            .pacing
            .duration_for_targets(event.kind.speed(), remaining);
        true
    }

    /// Apply an event to the canonical state.
    ///
    /// Every id is checked before anything is mutated, so a missing unit
    /// leaves the fields untouched.
    fn process(&mut self, event: &mut BattleEvent) -> Result<Effects> {
        let tag = event.tag();
        if let Some(&unit) = event
            .affected_unit_ids
            .iter()
            .find(|&&id| self.locate(id).is_none())
        {
            return Err(BattleError::MissingUnit { unit, event: tag });
        }

        let ids = &event.affected_unit_ids;
        match &mut event.kind {
            EventKind::Fight => return self.resolve_fight(ids),
            EventKind::Buff {
                attack,
                health,
                until_end_of_battle_only,
                ..
            } => {
                for &id in ids {
                    if let Some(unit) = self.unit_mut(id) {
                        unit.attack += *attack;
                        unit.health += *health;
                    }
                    if !*until_end_of_battle_only && self.locate(id) == Some(Side::Mine) {
                        self.context.persist_buff(id, *attack, *health);
                    }
                }
            }
            EventKind::Ranged { attack, .. } => {
                let config = self.config;
                for &id in ids {
                    if let Some(unit) = self.unit_mut(id) {
                        let damage = unit.calculate_damage(*attack, config);
                        unit.health -= damage;
                    }
                }
            }
            EventKind::Resource {
                source,
                amount,
                start_amount,
                ..
            } => {
                *start_amount = self.context.gold;
                if self.locate(*source) == Some(Side::Mine) {
                    self.context.gold += *amount;
                }
            }
            EventKind::Result { .. } => {}
        }
        Ok(Effects::default())
    }

    fn resolve_fight(&mut self, ids: &[UnitId]) -> Result<Effects> {
        let &[left_id, right_id] = ids else {
            return Err(BattleError::InvalidState(format!(
                "fight needs two units, got {}",
                ids.len()
            )));
        };
        let (Some(left), Some(right)) = (self.unit(left_id), self.unit(right_id)) else {
            return Err(BattleError::InvalidState("fight units vanished".to_string()));
        };
        let (left, right) = (left.clone(), right.clone());

        // Both sides strike with their pre-fight stats.
        let to_right = right.calculate_damage(left.effective_attack(), self.config);
        let to_left = left.calculate_damage(right.effective_attack(), self.config);
        if let Some(unit) = self.unit_mut(right_id) {
            unit.health -= to_right;
        }
        if let Some(unit) = self.unit_mut(left_id) {
            unit.health -= to_left;
        }

        let mut effects = Effects::default();
        for (attacker, taken, target, dealt) in [
            (&left, to_left, &right, to_right),
            (&right, to_right, &left, to_left),
        ] {
            if dealt > 0 && target.health > 0 && target.health - dealt <= 0 {
                effects.kills.push(attacker.id);
            }
            if attacker.health - taken > 0 && attacker.effective_attack() > 0 {
                effects.hits.push((attacker.id, target.id));
            }
        }
        Ok(effects)
    }

    fn hit_reactions(&mut self, hits: &[(UnitId, UnitId)]) -> Vec<Queued> {
        let mut reactions = Vec::new();
        for &(attacker, target) in hits {
            let Some(hook) = self.unit(attacker).and_then(|unit| archetype(unit.kind).on_hit_enemy)
            else {
                continue;
            };
            if let Some(event) = self.run_hook(attacker, |ctx| hook(ctx, target)) {
                reactions.push(Queued {
                    event,
                    origin: Origin::Reaction,
                });
            }
        }
        reactions
    }

    fn kill_reactions(&mut self, killers: &[UnitId]) -> Vec<Queued> {
        let mut reactions = Vec::new();
        for &killer in killers {
            let Some(hook) = self
                .unit(killer)
                .filter(|unit| unit.is_alive())
                .and_then(|unit| archetype(unit.kind).on_kill)
            else {
                continue;
            };
            if let Some(event) = self.run_hook(killer, hook) {
                reactions.push(Queued {
                    event,
                    origin: Origin::Reaction,
                });
            }
        }
        reactions
    }

    /// Mark every newly depleted unit as death-pending and collect their
    /// death reactions. Units without a reaction leave their field at once.
    fn death_sweep(&mut self, event: &mut BattleEvent) -> Vec<Queued> {
        let mut dying = Vec::new();
        for side in [Side::Mine, Side::Opponent] {
            let field = match side {
                Side::Mine => &mut self.mine,
                Side::Opponent => &mut self.opponents,
            };
            for unit in field.iter_mut() {
                if unit.life == LifeState::Alive && unit.health <= 0 {
                    unit.life = LifeState::DeathPending;
                    dying.push(unit.id);
                }
            }
        }
        event.perished_unit_ids.extend(dying.iter().copied());

        let mut reactions = Vec::new();
        for id in dying {
            let hook = self.unit(id).and_then(|unit| archetype(unit.kind).on_death);
            match hook.and_then(|hook| self.run_hook(id, hook)) {
                Some(reaction) => {
                    tracing::debug!(unit = %id, kind = %reaction.tag(), "Death reaction queued");
                    reactions.push(Queued {
                        event: reaction,
                        origin: Origin::Death(id),
                    });
                }
                None => self.remove_unit(id),
            }
        }
        reactions
    }

    #[cfg(feature = "debug-validation")]
    fn validate(&self) {
        let mut seen = BTreeSet::new();
        for unit in self.mine.contents().iter().chain(self.opponents.contents()) {
            if !seen.insert(unit.id) {
                tracing::error!(unit = %unit.id, "Duplicate unit on the battlefield");
            }
        }
    }
}

/// Resolve a battle with the default archetype factory.
///
/// # Errors
/// See [`simulate_with`].
pub fn simulate(
    context: BattleContext,
    opponents: &[RosterUnit],
    config: &BalanceConfig,
) -> Result<BattleReport> {
    simulate_with(context, opponents, &ArchetypeFactory, config)
}

/// Resolve a battle with a caller-supplied unit factory.
///
/// # Errors
/// Returns [`BattleError::DuplicateUnitId`] for invalid rosters and
/// [`BattleError::DidNotReachFinality`] if the step limit is exhausted.
pub fn simulate_with<F: UnitFactory>(
    context: BattleContext,
    opponents: &[RosterUnit],
    factory: &F,
    config: &BalanceConfig,
) -> Result<BattleReport> {
    BattleEngine::new(context, opponents, factory, config)?.run()
}
