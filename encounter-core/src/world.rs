//! Combatants and the encounter roster.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Identity
// ============================================================================

/// Handle to a combatant in an [`Encounter`].
///
/// The roster's membership is fixed once setup finishes, so a handle stays
/// valid for the life of the encounter it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CombatantId(usize);

impl CombatantId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Hit Points
// ============================================================================

/// Error parsing operator hit point input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HitPointsParseError {
    #[error("Invalid hit points: {0}")]
    InvalidNumber(String),
    #[error("Current hit points {current} exceed maximum {maximum}")]
    CurrentAboveMaximum { current: u32, maximum: u32 },
}

/// Hit point tracking.
///
/// A maximum of zero means the combatant's hit points are not tracked: the
/// current value stays at zero and the combatant is never considered down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitPoints {
    pub current: u32,
    pub maximum: u32,
}

impl HitPoints {
    pub fn new(maximum: u32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    pub fn untracked() -> Self {
        Self::default()
    }

    /// Hit points that start below maximum (e.g. a wounded character).
    pub fn wounded(current: u32, maximum: u32) -> Self {
        Self {
            current: current.min(maximum),
            maximum,
        }
    }

    pub fn is_tracked(&self) -> bool {
        self.maximum != 0
    }

    /// Tracked and at zero.
    pub fn is_down(&self) -> bool {
        self.is_tracked() && self.current == 0
    }

    /// Whether the combatant still gets turns.
    pub fn is_standing(&self) -> bool {
        !self.is_tracked() || self.current > 0
    }

    /// Apply damage, flooring at zero. Untracked hit points are unaffected.
    pub fn take_damage(&mut self, amount: u32) -> DamageResult {
        if !self.is_tracked() {
            return DamageResult {
                damage_taken: 0,
                dropped_to_zero: false,
            };
        }

        let before = self.current;
        self.current = self.current.saturating_sub(amount);
        DamageResult {
            damage_taken: before - self.current,
            dropped_to_zero: before > 0 && self.current == 0,
        }
    }

    /// Heal up to the maximum, returning the amount actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let old = self.current;
        self.current = self.current.saturating_add(amount).min(self.maximum);
        self.current.saturating_sub(old)
    }
}

impl fmt::Display for HitPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current, self.maximum)
    }
}

/// Parses the operator syntax: blank for untracked, `n` for full health,
/// `x/y` for `x` out of `y`.
impl FromStr for HitPoints {
    type Err = HitPointsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(HitPoints::untracked());
        }

        let number = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| HitPointsParseError::InvalidNumber(s.to_string()))
        };

        match s.split_once('/') {
            Some((current, maximum)) => {
                let current = number(current)?;
                let maximum = number(maximum)?;
                if current > maximum {
                    return Err(HitPointsParseError::CurrentAboveMaximum { current, maximum });
                }
                Ok(HitPoints { current, maximum })
            }
            None => Ok(HitPoints::new(number(s)?)),
        }
    }
}

/// Result of taking damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageResult {
    pub damage_taken: u32,
    pub dropped_to_zero: bool,
}

// ============================================================================
// Effects
// ============================================================================

/// A named status effect with an optional duration in rounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    pub name: String,
    pub remaining_turns: Option<u32>,
}

impl Effect {
    /// An effect that lasts until removed.
    pub fn indefinite(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remaining_turns: None,
        }
    }

    pub fn with_duration(name: impl Into<String>, turns: u32) -> Self {
        Self {
            name: name.into(),
            remaining_turns: Some(turns),
        }
    }

    /// Count down one round. Returns true when the effect has run out.
    pub fn tick(&mut self) -> bool {
        match self.remaining_turns {
            None => false,
            Some(turns) if turns <= 1 => {
                self.remaining_turns = Some(0);
                true
            }
            Some(turns) => {
                self.remaining_turns = Some(turns - 1);
                false
            }
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.remaining_turns {
            Some(turns) => write!(f, "{} ({turns})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

// ============================================================================
// Combatants
// ============================================================================

/// A participant in the encounter.
#[derive(Debug, Clone)]
pub struct Combatant {
    name: String,
    initiative: i32,
    pub hit_points: HitPoints,
    effects: BTreeMap<String, Effect>,
}

impl Combatant {
    pub fn new(name: impl Into<String>, initiative: i32, hit_points: HitPoints) -> Self {
        Self {
            name: name.into(),
            initiative,
            hit_points,
            effects: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Initiative rolled at setup. Never changes afterwards.
    pub fn initiative(&self) -> i32 {
        self.initiative
    }

    pub fn is_standing(&self) -> bool {
        self.hit_points.is_standing()
    }

    pub fn is_down(&self) -> bool {
        self.hit_points.is_down()
    }

    pub fn effects(&self) -> impl Iterator<Item = &Effect> {
        self.effects.values()
    }

    pub fn effect(&self, name: &str) -> Option<&Effect> {
        self.effects.get(name)
    }

    pub fn has_effect(&self, name: &str) -> bool {
        self.effects.contains_key(name)
    }

    /// Add an effect, replacing any existing effect with the same name.
    pub fn add_effect(&mut self, effect: Effect) -> Option<Effect> {
        self.effects.insert(effect.name.clone(), effect)
    }

    pub fn remove_effect(&mut self, name: &str) -> Option<Effect> {
        self.effects.remove(name)
    }

    /// Count every effect down one round, returning the names that expired.
    pub fn tick_effects(&mut self) -> Vec<String> {
        let mut expired = Vec::new();
        self.effects.retain(|name, effect| {
            if effect.tick() {
                expired.push(name.clone());
                false
            } else {
                true
            }
        });
        expired
    }
}

// ============================================================================
// Encounter
// ============================================================================

/// The full roster: player characters first, then monsters in the order
/// they were declared. Membership is fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct Encounter {
    combatants: Vec<Combatant>,
    party_size: usize,
}

impl Encounter {
    pub fn new(party: Vec<Combatant>, monsters: Vec<Combatant>) -> Self {
        let party_size = party.len();
        let mut combatants = party;
        combatants.extend(monsters);
        Self {
            combatants,
            party_size,
        }
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Number of player characters at the front of the roster.
    pub fn party_size(&self) -> usize {
        self.party_size
    }

    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(id.0)
    }

    /// Handle for the combatant at `index` in roster order.
    pub fn id_at(&self, index: usize) -> Option<CombatantId> {
        (index < self.combatants.len()).then_some(CombatantId(index))
    }

    /// All handles in roster order.
    pub fn ids(&self) -> impl Iterator<Item = CombatantId> {
        (0..self.combatants.len()).map(CombatantId)
    }

    /// Combatants paired with their handles, in roster order.
    pub fn iter(&self) -> impl Iterator<Item = (CombatantId, &Combatant)> {
        self.combatants
            .iter()
            .enumerate()
            .map(|(i, c)| (CombatantId(i), c))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (CombatantId, &mut Combatant)> {
        self.combatants
            .iter_mut()
            .enumerate()
            .map(|(i, c)| (CombatantId(i), c))
    }

    /// Find a combatant by exact name.
    pub fn find(&self, name: &str) -> Option<CombatantId> {
        self.iter().find(|(_, c)| c.name() == name).map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hit_points() {
        assert_eq!("".parse::<HitPoints>(), Ok(HitPoints::untracked()));
        assert_eq!("  ".parse::<HitPoints>(), Ok(HitPoints::untracked()));
        assert_eq!("7".parse::<HitPoints>(), Ok(HitPoints::new(7)));
        assert_eq!(
            "3/12".parse::<HitPoints>(),
            Ok(HitPoints {
                current: 3,
                maximum: 12
            })
        );
        assert_eq!(" 3 / 12 ".parse::<HitPoints>(), Ok(HitPoints::wounded(3, 12)));
    }

    #[test]
    fn test_parse_hit_points_rejects_garbage() {
        assert!("seven".parse::<HitPoints>().is_err());
        assert!("-4".parse::<HitPoints>().is_err());
        assert!("3/".parse::<HitPoints>().is_err());
        assert!("1/2/3".parse::<HitPoints>().is_err());
        assert_eq!(
            "9/4".parse::<HitPoints>(),
            Err(HitPointsParseError::CurrentAboveMaximum {
                current: 9,
                maximum: 4
            })
        );
    }

    #[test]
    fn test_hit_points() {
        let mut hp = HitPoints::new(10);
        let result = hp.take_damage(4);
        assert_eq!(hp.current, 6);
        assert!(!result.dropped_to_zero);

        let result = hp.take_damage(15);
        assert_eq!(hp.current, 0);
        assert_eq!(result.damage_taken, 6);
        assert!(result.dropped_to_zero);
        assert!(hp.is_down());
        assert!(!hp.is_standing());

        assert_eq!(hp.heal(5), 5);
        assert_eq!(hp.current, 5);
        assert_eq!(hp.heal(50), 5);
        assert_eq!(hp.current, 10); // Capped at max
    }

    #[test]
    fn test_untracked_hit_points() {
        let mut hp = HitPoints::untracked();
        assert!(!hp.is_tracked());
        assert!(hp.is_standing());
        assert!(!hp.is_down());

        hp.take_damage(100);
        assert_eq!(hp.current, 0);
        assert!(hp.is_standing());

        assert_eq!(hp.heal(3), 0);
        assert_eq!(hp, HitPoints::untracked());
    }

    #[test]
    fn test_effect_tick() {
        let mut effect = Effect::with_duration("Bless", 2);
        assert!(!effect.tick());
        assert_eq!(effect.remaining_turns, Some(1));
        assert!(effect.tick());

        let mut zero = Effect::with_duration("Flash", 0);
        assert!(zero.tick());

        let mut forever = Effect::indefinite("Cursed");
        for _ in 0..50 {
            assert!(!forever.tick());
        }
        assert_eq!(forever.to_string(), "Cursed");
        assert_eq!(Effect::with_duration("Bless", 3).to_string(), "Bless (3)");
    }

    #[test]
    fn test_combatant_effects() {
        let mut goblin = Combatant::new("Goblin", 12, HitPoints::new(7));
        goblin.add_effect(Effect::with_duration("Prone", 1));
        goblin.add_effect(Effect::indefinite("Poisoned"));

        let replaced = goblin.add_effect(Effect::with_duration("Prone", 3));
        assert_eq!(replaced, Some(Effect::with_duration("Prone", 1)));
        assert_eq!(goblin.effect("Prone").unwrap().remaining_turns, Some(3));
        assert_eq!(goblin.effects().count(), 2);

        assert!(goblin.tick_effects().is_empty());
        assert_eq!(goblin.effect("Prone").unwrap().remaining_turns, Some(2));

        assert!(goblin.remove_effect("Poisoned").is_some());
        assert!(!goblin.has_effect("Poisoned"));
        assert!(goblin.remove_effect("Poisoned").is_none());
    }

    #[test]
    fn test_encounter_roster() {
        let encounter = Encounter::new(
            vec![Combatant::new("Circe", 9, HitPoints::untracked())],
            vec![
                Combatant::new("Goblin (Red)", 4, HitPoints::new(7)),
                Combatant::new("Goblin (Blue)", 6, HitPoints::new(7)),
            ],
        );
        assert_eq!(encounter.len(), 3);
        assert_eq!(encounter.party_size(), 1);

        let blue = encounter.find("Goblin (Blue)").unwrap();
        assert_eq!(blue.index(), 2);
        assert_eq!(encounter.get(blue).unwrap().initiative(), 6);
        assert_eq!(encounter.id_at(3), None);
        assert_eq!(encounter.ids().count(), 3);
    }
}
