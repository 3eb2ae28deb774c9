//! Encounter configuration.

use crate::dice::DieType;

/// Token colours used to tell apart members of a monster group.
pub const DEFAULT_PALETTE: [&str; 7] =
    ["Red", "Blue", "Green", "Purple", "Pink", "Yellow", "Brown"];

/// A player character and their initiative bonus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyMember {
    pub name: String,
    pub initiative_bonus: i32,
}

impl PartyMember {
    pub fn new(name: impl Into<String>, initiative_bonus: i32) -> Self {
        Self {
            name: name.into(),
            initiative_bonus,
        }
    }
}

/// How the pending queue is rebuilt at each round boundary.
///
/// The first round is always ordered by initiative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundOrder {
    /// Player characters first, then monsters, in roster order.
    #[default]
    BySide,
    /// Highest initiative first; ties keep roster order.
    ByInitiative,
}

/// Configuration for a new encounter.
#[derive(Debug, Clone)]
pub struct EncounterConfig {
    /// The fixed party, in display order.
    pub party: Vec<PartyMember>,

    /// Die rolled for initiative.
    pub initiative_die: DieType,

    /// Tags appended to monster names when a group has more than one member.
    pub palette: Vec<String>,

    /// Queue ordering for every round after the first.
    pub round_order: RoundOrder,
}

impl EncounterConfig {
    /// Create a config with an empty party and the default die and palette.
    pub fn new() -> Self {
        Self {
            party: Vec::new(),
            initiative_die: DieType::D10,
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            round_order: RoundOrder::BySide,
        }
    }

    /// Replace the whole party.
    pub fn with_party(mut self, party: Vec<PartyMember>) -> Self {
        self.party = party;
        self
    }

    /// Append one party member.
    pub fn with_member(mut self, name: impl Into<String>, initiative_bonus: i32) -> Self {
        self.party.push(PartyMember::new(name, initiative_bonus));
        self
    }

    /// Set the initiative die.
    pub fn with_initiative_die(mut self, die: DieType) -> Self {
        self.initiative_die = die;
        self
    }

    /// Set the monster tag palette.
    pub fn with_palette<I, S>(mut self, palette: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.palette = palette.into_iter().map(Into::into).collect();
        self
    }

    /// Set how later rounds are ordered.
    pub fn with_round_order(mut self, order: RoundOrder) -> Self {
        self.round_order = order;
        self
    }

    /// Largest monster group that still gets a unique tag per member.
    pub fn max_group_size(&self) -> usize {
        self.palette.len()
    }
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self::new()
            .with_member("Braaggi", 3)
            .with_member("Circe", 5)
            .with_member("Pipes", 7)
            .with_member("Tom", 6)
            .with_member("Vorbith", 2)
    }
}
