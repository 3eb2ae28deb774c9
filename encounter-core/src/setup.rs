//! Encounter setup: rolling initiative and building the roster.
//!
//! Setup runs once, before the first turn. It rolls initiative for the party,
//! asks the operator for everyone's starting hit points, collects monster
//! groups, and hands back a finished [`Encounter`]. Nothing here touches the
//! roster after that handoff.

use crate::config::EncounterConfig;
use crate::console::{prompt_until, Console, ConsoleError};
use crate::dice::{roll_initiative, DieType};
use crate::world::{Combatant, Encounter, HitPoints};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from encounter setup.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Console error: {0}")]
    Console(#[from] ConsoleError),

    #[error("Group size must be between 1 and {max}, got {count}")]
    InvalidGroupSize { count: usize, max: usize },
}

/// Roll initiative for one combatant.
pub fn initiative_for<R: Rng>(rng: &mut R, die: DieType, bonus: i32) -> i32 {
    let roll = roll_initiative(rng, die, bonus);
    debug!(%roll, "Rolled initiative");
    roll.total()
}

/// Build the members of a monster group.
///
/// A group of one keeps `name` as is. Larger groups get one palette tag per
/// member, in palette order, e.g. `Goblin (Red)`, `Goblin (Blue)`. Every
/// member rolls its own initiative and starts with the same hit points.
pub fn build_monster_group<R: Rng>(
    rng: &mut R,
    config: &EncounterConfig,
    name: &str,
    count: usize,
    bonus: i32,
    hit_points: HitPoints,
) -> Result<Vec<Combatant>, SetupError> {
    let max = config.max_group_size();
    if count == 0 || count > max {
        return Err(SetupError::InvalidGroupSize { count, max });
    }

    if count == 1 {
        let initiative = initiative_for(rng, config.initiative_die, bonus);
        return Ok(vec![Combatant::new(name, initiative, hit_points)]);
    }

    Ok(config
        .palette
        .iter()
        .take(count)
        .map(|tag| {
            let initiative = initiative_for(rng, config.initiative_die, bonus);
            Combatant::new(format!("{name} ({tag})"), initiative, hit_points)
        })
        .collect())
}

/// Parse a monster group size, with the message to show on rejection.
pub fn parse_group_size(input: &str, max: usize) -> Result<usize, String> {
    let count: usize = input.trim().parse().map_err(|_| "Try again".to_string())?;
    if count > max {
        return Err("Come on, switch it up".to_string());
    }
    if count == 0 {
        return Err("Try again".to_string());
    }
    Ok(count)
}

/// Interactive roster builder.
pub struct EncounterSetup<'a, C: Console + ?Sized, R: Rng> {
    config: &'a EncounterConfig,
    console: &'a mut C,
    rng: &'a mut R,
}

impl<'a, C: Console + ?Sized, R: Rng> EncounterSetup<'a, C, R> {
    pub fn new(config: &'a EncounterConfig, console: &'a mut C, rng: &'a mut R) -> Self {
        Self {
            config,
            console,
            rng,
        }
    }

    /// Run the whole setup: party first, then monsters.
    pub fn run(mut self) -> Result<Encounter, SetupError> {
        let party = self.build_party_combatants()?;
        let monsters = self.add_monsters()?;
        let encounter = Encounter::new(party, monsters);
        info!(
            party = encounter.party_size(),
            total = encounter.len(),
            "Encounter roster ready"
        );
        Ok(encounter)
    }

    /// Roll initiative and ask for hit points for every party member.
    pub fn build_party_combatants(&mut self) -> Result<Vec<Combatant>, SetupError> {
        let config = self.config;
        let mut party = Vec::with_capacity(config.party.len());
        for member in &config.party {
            let initiative =
                initiative_for(&mut *self.rng, config.initiative_die, member.initiative_bonus);
            let hit_points = self.prompt_hit_points(&member.name)?;
            debug!(name = %member.name, initiative, %hit_points, "Rolled party member");
            party.push(Combatant::new(member.name.clone(), initiative, hit_points));
        }
        Ok(party)
    }

    /// Collect monster groups until the operator enters an empty name.
    pub fn add_monsters(&mut self) -> Result<Vec<Combatant>, SetupError> {
        let mut monsters = Vec::new();
        loop {
            let name = self
                .console
                .read_line("Enter a monster name (leave empty to continue): ")?;
            let name = name.trim();
            if name.is_empty() {
                return Ok(monsters);
            }
            monsters.extend(self.add_monster_group(name)?);
        }
    }

    fn add_monster_group(&mut self, name: &str) -> Result<Vec<Combatant>, SetupError> {
        let max = self.config.max_group_size();
        let count = prompt_until(&mut *self.console, &format!("How many {name}?: "), |line| {
            parse_group_size(line, max)
        })?;

        let bonus = prompt_until(
            &mut *self.console,
            &format!("Enter initiative bonus for {name}: "),
            |line| line.parse::<i32>().map_err(|_| "Try again".to_string()),
        )?;

        let hit_points = self.prompt_hit_points(name)?;
        let group =
            build_monster_group(&mut *self.rng, self.config, name, count, bonus, hit_points)?;
        debug!(name, count, bonus, %hit_points, "Added monster group");
        Ok(group)
    }

    fn prompt_hit_points(&mut self, name: &str) -> Result<HitPoints, ConsoleError> {
        prompt_until(
            &mut *self.console,
            &format!("Enter HP for {name} (blank, max, or current/max): "),
            |line| line.parse::<HitPoints>().map_err(|e| e.to_string()),
        )
    }
}
