//! The encounter state machine.
//!
//! [`EncounterRunner`] takes ownership of a finished [`Encounter`] and is the
//! only thing that mutates it afterwards. It tracks three views of the
//! roster:
//!
//! - `active`: everyone still eligible to act, in roster order
//! - `ordered`: who is still due to act this round
//! - `acted`: who has already acted this round
//!
//! A round ends whenever `ordered` runs dry, through turn taking, a skip, or
//! the last pending combatant dropping. At the boundary `acted` is cleared,
//! `ordered` is rebuilt from `active`, every effect on the full roster ticks
//! down once, and the round counter advances.
//!
//! Nothing here does I/O; see [`crate::play`] for the operator loop.

use crate::config::RoundOrder;
use crate::world::{CombatantId, Effect, Encounter, HitPoints};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from runner operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunnerError {
    #[error("Unknown combatant {0}")]
    UnknownCombatant(CombatantId),

    #[error("No pending turn {index} (only {pending} pending)")]
    NoSuchTurn { index: usize, pending: usize },
}

/// Where the runner is within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Someone is still due to act.
    RoundInProgress,
    /// Nobody is left to act; only reachable at rest when `active` is empty.
    RoundBoundary,
}

/// Result of applying damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    pub combatant: CombatantId,
    pub hit_points: HitPoints,
    /// The hit dropped this combatant to zero and out of the turn order.
    pub dropped: bool,
}

/// Result of healing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealOutcome {
    pub combatant: CombatantId,
    pub healed: u32,
    pub hit_points: HitPoints,
    /// The combatant was down and is back in the active roster.
    pub rejoined: bool,
}

/// An effect on a specific combatant, as listed for removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectEntry {
    pub combatant: CombatantId,
    pub effect: String,
}

/// Owns the encounter and drives its rounds.
#[derive(Debug, Clone)]
pub struct EncounterRunner {
    encounter: Encounter,
    round_order: RoundOrder,
    round: u32,
    active: Vec<CombatantId>,
    ordered: Vec<CombatantId>,
    acted: Vec<CombatantId>,
}

impl EncounterRunner {
    /// Start round one, ordered by initiative.
    pub fn new(encounter: Encounter, round_order: RoundOrder) -> Self {
        let mut runner = Self {
            encounter,
            round_order,
            round: 1,
            active: Vec::new(),
            ordered: Vec::new(),
            acted: Vec::new(),
        };
        runner.recompute_active();
        runner.ordered = runner.sort_by_initiative(&runner.active);
        debug!(pending = runner.ordered.len(), "Round 1 begins");
        runner
    }

    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn round_order(&self) -> RoundOrder {
        self.round_order
    }

    pub fn active(&self) -> &[CombatantId] {
        &self.active
    }

    pub fn ordered(&self) -> &[CombatantId] {
        &self.ordered
    }

    pub fn acted(&self) -> &[CombatantId] {
        &self.acted
    }

    pub fn state(&self) -> TurnState {
        if self.ordered.is_empty() {
            TurnState::RoundBoundary
        } else {
            TurnState::RoundInProgress
        }
    }

    /// Combatants at zero hit points, in roster order.
    pub fn down(&self) -> Vec<CombatantId> {
        self.encounter
            .iter()
            .filter(|(_, c)| c.is_down())
            .map(|(id, _)| id)
            .collect()
    }

    fn check(&self, id: CombatantId) -> Result<(), RunnerError> {
        match self.encounter.get(id) {
            Some(_) => Ok(()),
            None => Err(RunnerError::UnknownCombatant(id)),
        }
    }

    fn initiative(&self, id: CombatantId) -> i32 {
        self.encounter.get(id).map_or(i32::MIN, |c| c.initiative())
    }

    /// Highest initiative first. The sort is stable, so ties keep their
    /// relative order from `ids`.
    fn sort_by_initiative(&self, ids: &[CombatantId]) -> Vec<CombatantId> {
        let mut sorted = ids.to_vec();
        sorted.sort_by(|a, b| self.initiative(*b).cmp(&self.initiative(*a)));
        sorted
    }

    fn recompute_active(&mut self) {
        self.active = self
            .encounter
            .iter()
            .filter(|(_, c)| c.is_standing())
            .map(|(id, _)| id)
            .collect();
    }

    /// Mark the pending combatant at `index` (zero-based) as having acted.
    ///
    /// Ends the round if nobody is left to act.
    pub fn take_turn(&mut self, index: usize) -> Result<CombatantId, RunnerError> {
        if index >= self.ordered.len() {
            return Err(RunnerError::NoSuchTurn {
                index,
                pending: self.ordered.len(),
            });
        }

        let id = self.ordered.remove(index);
        self.acted.push(id);
        debug!(combatant = %id, round = self.round, "Turn taken");

        if self.ordered.is_empty() {
            self.advance_round();
        }
        Ok(id)
    }

    /// Drop everyone still pending and start the next round.
    pub fn skip_round(&mut self) {
        debug!(skipped = self.ordered.len(), round = self.round, "Round skipped");
        self.ordered.clear();
        self.advance_round();
    }

    /// Round-boundary transition.
    pub fn advance_round(&mut self) {
        self.acted.clear();
        self.ordered = match self.round_order {
            RoundOrder::BySide => self.active.clone(),
            RoundOrder::ByInitiative => self.sort_by_initiative(&self.active),
        };

        for (id, combatant) in self.encounter.iter_mut() {
            for effect in combatant.tick_effects() {
                debug!(combatant = %id, name = combatant.name(), %effect, "Effect expired");
            }
        }

        self.round += 1;
        debug!(round = self.round, pending = self.ordered.len(), "Round begins");
    }

    /// Apply damage. A tracked combatant that hits zero leaves both the
    /// active roster and this round's queue.
    pub fn damage(&mut self, id: CombatantId, amount: u32) -> Result<DamageOutcome, RunnerError> {
        let Some(combatant) = self.encounter.get_mut(id) else {
            return Err(RunnerError::UnknownCombatant(id));
        };

        let result = combatant.hit_points.take_damage(amount);
        let hit_points = combatant.hit_points;
        debug!(combatant = %id, amount, %hit_points, "Damage applied");

        if result.dropped_to_zero {
            info!(combatant = %id, name = combatant.name(), "Combatant down");
            let had_pending = !self.ordered.is_empty();
            self.active.retain(|&a| a != id);
            self.ordered.retain(|&o| o != id);
            if had_pending && self.ordered.is_empty() {
                self.advance_round();
            }
        }

        Ok(DamageOutcome {
            combatant: id,
            hit_points,
            dropped: result.dropped_to_zero,
        })
    }

    /// Heal up to maximum and recompute the active roster.
    ///
    /// A combatant healed back from zero rejoins `active` but not this
    /// round's queue; their next turn comes at the next round.
    pub fn heal(&mut self, id: CombatantId, amount: u32) -> Result<HealOutcome, RunnerError> {
        let was_active = self.active.contains(&id);
        let Some(combatant) = self.encounter.get_mut(id) else {
            return Err(RunnerError::UnknownCombatant(id));
        };

        let healed = combatant.hit_points.heal(amount);
        let hit_points = combatant.hit_points;
        debug!(combatant = %id, healed, %hit_points, "Healing applied");

        self.recompute_active();
        let rejoined = !was_active && self.active.contains(&id);
        if rejoined {
            info!(combatant = %id, "Combatant back in the fight");
        }

        Ok(HealOutcome {
            combatant: id,
            healed,
            hit_points,
            rejoined,
        })
    }

    /// Put `effect` on every target, replacing any same-named effect.
    pub fn add_effect(
        &mut self,
        targets: &[CombatantId],
        effect: &Effect,
    ) -> Result<(), RunnerError> {
        for &id in targets {
            self.check(id)?;
        }
        for &id in targets {
            if let Some(combatant) = self.encounter.get_mut(id) {
                combatant.add_effect(effect.clone());
                debug!(combatant = %id, effect = %effect, "Effect added");
            }
        }
        Ok(())
    }

    /// Every effect currently on the roster, by combatant then effect name.
    pub fn effect_entries(&self) -> Vec<EffectEntry> {
        self.encounter
            .iter()
            .flat_map(|(id, c)| {
                c.effects().map(move |e| EffectEntry {
                    combatant: id,
                    effect: e.name.clone(),
                })
            })
            .collect()
    }

    /// Remove the listed effects. Returns how many were actually removed.
    pub fn remove_effects(&mut self, entries: &[EffectEntry]) -> Result<usize, RunnerError> {
        for entry in entries {
            self.check(entry.combatant)?;
        }

        let mut removed = 0;
        for entry in entries {
            if let Some(combatant) = self.encounter.get_mut(entry.combatant) {
                if combatant.remove_effect(&entry.effect).is_some() {
                    debug!(combatant = %entry.combatant, effect = %entry.effect, "Effect removed");
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{combatant, skirmish};
    use std::collections::HashSet;

    fn names(runner: &EncounterRunner, ids: &[CombatantId]) -> Vec<String> {
        ids.iter()
            .map(|&id| runner.encounter().get(id).unwrap().name().to_string())
            .collect()
    }

    fn id(runner: &EncounterRunner, name: &str) -> CombatantId {
        runner.encounter().find(name).unwrap()
    }

    #[test]
    fn test_first_round_by_initiative() {
        let runner = EncounterRunner::new(skirmish(), RoundOrder::BySide);
        assert_eq!(
            names(&runner, runner.ordered()),
            ["Aria", "Goblin (Red)", "Bram", "Goblin (Blue)"]
        );
        assert_eq!(runner.round(), 1);
        assert_eq!(runner.state(), TurnState::RoundInProgress);
        assert!(runner.acted().is_empty());
    }

    #[test]
    fn test_initiative_ties_keep_roster_order() {
        let encounter = Encounter::new(
            vec![combatant("First", 10, 0), combatant("Second", 12, 0)],
            vec![combatant("Third", 10, 0), combatant("Fourth", 10, 0)],
        );
        let runner = EncounterRunner::new(encounter, RoundOrder::BySide);
        assert_eq!(names(&runner, runner.ordered()), ["Second", "First", "Third", "Fourth"]);
    }

    #[test]
    fn test_initiative_ties_stable_in_later_rounds() {
        let encounter = Encounter::new(
            vec![combatant("First", 10, 5), combatant("Second", 12, 0)],
            vec![combatant("Third", 10, 0), combatant("Fourth", 10, 0)],
        );
        let mut runner = EncounterRunner::new(encounter, RoundOrder::ByInitiative);
        let first = id(&runner, "First");

        // Drop and revive First, then act out of order so the queue churns
        runner.damage(first, 5).unwrap();
        runner.heal(first, 5).unwrap();
        runner.take_turn(2).unwrap();
        runner.take_turn(1).unwrap();
        runner.take_turn(0).unwrap();

        assert_eq!(runner.round(), 2);
        assert_eq!(names(&runner, runner.ordered()), ["Second", "First", "Third", "Fourth"]);

        runner.skip_round();
        assert_eq!(runner.round(), 3);
        assert_eq!(names(&runner, runner.ordered()), ["Second", "First", "Third", "Fourth"]);
    }

    #[test]
    fn test_take_turn() {
        let mut runner = EncounterRunner::new(skirmish(), RoundOrder::BySide);
        let taken = runner.take_turn(1).unwrap();
        assert_eq!(taken, id(&runner, "Goblin (Red)"));
        assert_eq!(names(&runner, runner.acted()), ["Goblin (Red)"]);
        assert_eq!(names(&runner, runner.ordered()), ["Aria", "Bram", "Goblin (Blue)"]);

        assert_eq!(
            runner.take_turn(3),
            Err(RunnerError::NoSuchTurn { index: 3, pending: 3 })
        );
    }

    #[test]
    fn test_round_boundary_by_side() {
        let mut runner = EncounterRunner::new(skirmish(), RoundOrder::BySide);
        for _ in 0..4 {
            runner.take_turn(0).unwrap();
        }
        assert_eq!(runner.round(), 2);
        assert!(runner.acted().is_empty());
        assert_eq!(
            names(&runner, runner.ordered()),
            ["Aria", "Bram", "Goblin (Red)", "Goblin (Blue)"]
        );
        assert_eq!(runner.ordered(), runner.active());
    }

    #[test]
    fn test_round_boundary_by_initiative() {
        let mut runner = EncounterRunner::new(skirmish(), RoundOrder::ByInitiative);
        runner.skip_round();
        assert_eq!(runner.round(), 2);
        assert_eq!(
            names(&runner, runner.ordered()),
            ["Aria", "Goblin (Red)", "Bram", "Goblin (Blue)"]
        );
    }

    #[test]
    fn test_ordered_and_acted_cover_active() {
        let mut runner = EncounterRunner::new(skirmish(), RoundOrder::BySide);
        let start: HashSet<_> = runner.active().iter().copied().collect();
        runner.take_turn(2).unwrap();
        runner.take_turn(0).unwrap();
        let seen: HashSet<_> = runner
            .ordered()
            .iter()
            .chain(runner.acted())
            .copied()
            .collect();
        assert_eq!(seen, start);
    }

    #[test]
    fn test_damage_drops_combatant() {
        let mut runner = EncounterRunner::new(skirmish(), RoundOrder::BySide);
        let bram = id(&runner, "Bram");

        let outcome = runner.damage(bram, 5).unwrap();
        assert!(!outcome.dropped);
        assert_eq!(outcome.hit_points, HitPoints::wounded(7, 12));

        let outcome = runner.damage(bram, 15).unwrap();
        assert!(outcome.dropped);
        assert_eq!(outcome.hit_points.current, 0);
        assert!(!runner.active().contains(&bram));
        assert!(!runner.ordered().contains(&bram));
        assert!(!runner.acted().contains(&bram));
        assert_eq!(runner.down(), vec![bram]);
        assert_eq!(runner.encounter().len(), 4);
    }

    #[test]
    fn test_damage_untracked_is_ignored() {
        let mut runner = EncounterRunner::new(skirmish(), RoundOrder::BySide);
        let aria = id(&runner, "Aria");
        let outcome = runner.damage(aria, 100).unwrap();
        assert!(!outcome.dropped);
        assert_eq!(outcome.hit_points, HitPoints::untracked());
        assert!(runner.ordered().contains(&aria));
    }

    #[test]
    fn test_dropping_last_pending_ends_round() {
        let mut runner = EncounterRunner::new(skirmish(), RoundOrder::BySide);
        for _ in 0..3 {
            runner.take_turn(0).unwrap();
        }
        let blue = id(&runner, "Goblin (Blue)");
        assert_eq!(runner.ordered(), [blue]);

        runner.damage(blue, 7).unwrap();
        assert_eq!(runner.round(), 2);
        assert_eq!(names(&runner, runner.ordered()), ["Aria", "Bram", "Goblin (Red)"]);
    }

    #[test]
    fn test_heal_readmits_next_round() {
        let mut runner = EncounterRunner::new(skirmish(), RoundOrder::BySide);
        let bram = id(&runner, "Bram");
        runner.damage(bram, 15).unwrap();

        let outcome = runner.heal(bram, 5).unwrap();
        assert!(outcome.rejoined);
        assert_eq!(outcome.hit_points, HitPoints::wounded(5, 12));
        assert!(runner.active().contains(&bram));
        assert!(!runner.ordered().contains(&bram));

        runner.skip_round();
        assert!(runner.ordered().contains(&bram));
    }

    #[test]
    fn test_heal_capped_at_maximum() {
        let mut runner = EncounterRunner::new(skirmish(), RoundOrder::BySide);
        let red = id(&runner, "Goblin (Red)");
        runner.damage(red, 2).unwrap();
        let outcome = runner.heal(red, 100).unwrap();
        assert_eq!(outcome.healed, 2);
        assert_eq!(outcome.hit_points, HitPoints::new(7));
        assert!(!outcome.rejoined);
    }

    #[test]
    fn test_effects_tick_at_boundary() {
        let mut runner = EncounterRunner::new(skirmish(), RoundOrder::BySide);
        let bram = id(&runner, "Bram");
        let blue = id(&runner, "Goblin (Blue)");
        runner.add_effect(&[bram, blue], &Effect::with_duration("Bless", 1)).unwrap();
        runner.add_effect(&[bram], &Effect::indefinite("Cursed")).unwrap();

        // Effects on downed combatants still tick
        runner.damage(blue, 7).unwrap();
        assert!(runner.encounter().get(bram).unwrap().has_effect("Bless"));

        runner.skip_round();
        let bram_c = runner.encounter().get(bram).unwrap();
        assert!(!bram_c.has_effect("Bless"));
        assert!(bram_c.has_effect("Cursed"));
        assert!(!runner.encounter().get(blue).unwrap().has_effect("Bless"));

        for _ in 0..10 {
            runner.skip_round();
        }
        assert!(runner.encounter().get(bram).unwrap().has_effect("Cursed"));
    }

    #[test]
    fn test_effect_entries_and_removal() {
        let mut runner = EncounterRunner::new(skirmish(), RoundOrder::BySide);
        let aria = id(&runner, "Aria");
        let red = id(&runner, "Goblin (Red)");
        runner.add_effect(&[red], &Effect::indefinite("Prone")).unwrap();
        runner.add_effect(&[aria, red], &Effect::with_duration("Bane", 3)).unwrap();

        let entries = runner.effect_entries();
        let listed: Vec<_> = entries
            .iter()
            .map(|e| (e.combatant, e.effect.as_str()))
            .collect();
        assert_eq!(listed, [(aria, "Bane"), (red, "Bane"), (red, "Prone")]);

        let removed = runner
            .remove_effects(&[entries[0].clone(), entries[2].clone(), entries[2].clone()])
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(runner.effect_entries().len(), 1);
    }

    #[test]
    fn test_everyone_down_stays_at_boundary() {
        let encounter = Encounter::new(vec![combatant("Solo", 5, 4)], Vec::new());
        let mut runner = EncounterRunner::new(encounter, RoundOrder::BySide);
        let solo = id(&runner, "Solo");

        runner.damage(solo, 4).unwrap();
        assert_eq!(runner.round(), 2);
        assert_eq!(runner.state(), TurnState::RoundBoundary);

        // Healing while nobody is pending does not start another round
        runner.heal(solo, 1).unwrap();
        assert_eq!(runner.round(), 2);
        assert!(runner.ordered().is_empty());

        runner.skip_round();
        assert_eq!(runner.round(), 3);
        assert_eq!(runner.ordered(), [solo]);
    }

    #[test]
    fn test_unknown_combatant() {
        let small = Encounter::new(vec![combatant("Solo", 5, 4)], Vec::new());
        let stranger = skirmish().id_at(3).unwrap();
        let mut runner = EncounterRunner::new(small, RoundOrder::BySide);
        assert_eq!(
            runner.damage(stranger, 1),
            Err(RunnerError::UnknownCombatant(stranger))
        );
        assert!(runner.add_effect(&[stranger], &Effect::indefinite("Prone")).is_err());
    }
}
