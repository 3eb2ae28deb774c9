//! The operator turn loop.
//!
//! Draws the turn menu, reads one command, and applies it to the
//! [`EncounterRunner`]. Damage, healing and effect changes each run a short
//! sub-flow of prompts. Bad input never ends the loop; it just asks again.
//! Only `q` at the turn prompt (or the input stream closing) stops play.

use crate::config::EncounterConfig;
use crate::console::{prompt_amount, prompt_until, Console, ConsoleError};
use crate::menu::{
    describe, numbered, parse_choice, parse_choices, render_turn_menu, Choice, CommandMenu,
    TurnCommand, TURN_PROMPT,
};
use crate::runner::{EncounterRunner, RunnerError};
use crate::setup::{EncounterSetup, SetupError};
use crate::world::{CombatantId, Effect};
use rand::Rng;
use thiserror::Error;
use tracing::debug;

/// Errors that end an encounter early.
#[derive(Debug, Error)]
pub enum PlayError {
    #[error("Setup failed: {0}")]
    Setup(#[from] SetupError),

    #[error("Console error: {0}")]
    Console(#[from] ConsoleError),

    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),
}

impl PlayError {
    /// The operator closed the input stream. Treated as quitting.
    pub fn is_input_closed(&self) -> bool {
        matches!(
            self,
            PlayError::Console(ConsoleError::InputClosed(_))
                | PlayError::Setup(SetupError::Console(ConsoleError::InputClosed(_)))
        )
    }
}

/// Build the roster through `console`, then play it until the operator quits.
///
/// Returns the runner so callers can inspect the final state.
pub fn run_encounter<C, R>(
    config: &EncounterConfig,
    console: &mut C,
    rng: &mut R,
) -> Result<EncounterRunner, PlayError>
where
    C: Console + ?Sized,
    R: Rng,
{
    let encounter = EncounterSetup::new(config, console, rng).run()?;
    let mut runner = EncounterRunner::new(encounter, config.round_order);
    play(&mut runner, console)?;
    Ok(runner)
}

/// Run the turn loop until the operator quits.
///
/// A sub-flow may leave a notice, such as who went down. It is shown under
/// the next menu so the screen clear does not wipe it.
pub fn play<C: Console + ?Sized>(
    runner: &mut EncounterRunner,
    console: &mut C,
) -> Result<(), PlayError> {
    let mut notice: Option<String> = None;
    loop {
        console.clear()?;
        for line in render_turn_menu(runner) {
            console.write_line(&line)?;
        }
        if let Some(message) = notice.take() {
            console.write_line("")?;
            console.write_line(&message)?;
        }

        let menu = CommandMenu::new(runner.ordered().len());
        let command = loop {
            let line = console.read_line(TURN_PROMPT)?;
            if let Some(command) = menu.parse(&line) {
                break command;
            }
        };
        debug!(?command, round = runner.round(), "Turn command");

        match command {
            TurnCommand::TakeTurn(index) => {
                runner.take_turn(index)?;
            }
            TurnCommand::Skip => runner.skip_round(),
            TurnCommand::Quit => return Ok(()),
            TurnCommand::Damage => notice = damage_flow(runner, console)?,
            TurnCommand::Heal => heal_flow(runner, console)?,
            TurnCommand::AddEffect => add_effect_flow(runner, console)?,
            TurnCommand::RemoveEffect => notice = remove_effect_flow(runner, console)?,
        }
    }
}

fn write_lines<C: Console + ?Sized>(
    console: &mut C,
    lines: &[String],
) -> Result<(), ConsoleError> {
    for line in lines {
        console.write_line(line)?;
    }
    Ok(())
}

/// Pick one combatant out of `ids`, or `None` if the operator backs out.
fn select_combatant<C: Console + ?Sized>(
    runner: &EncounterRunner,
    console: &mut C,
    ids: &[CombatantId],
    prompt: &str,
) -> Result<Option<CombatantId>, ConsoleError> {
    let encounter = runner.encounter();
    console.write_line("")?;
    write_lines(console, &numbered(ids.iter().filter_map(|&id| encounter.get(id))))?;

    let choice = prompt_until(console, prompt, |line| parse_choice(line, ids.len()))?;
    Ok(match choice {
        Choice::Back => None,
        Choice::Pick(index) => Some(ids[index]),
    })
}

/// Returns a notice naming the target when the hit drops them.
fn damage_flow<C: Console + ?Sized>(
    runner: &mut EncounterRunner,
    console: &mut C,
) -> Result<Option<String>, PlayError> {
    let targets = runner.active().to_vec();
    let prompt = "Damage whom? (b to go back): ";
    let Some(id) = select_combatant(runner, console, &targets, prompt)? else {
        return Ok(None);
    };

    let amount = prompt_amount(console, "Damage amount: ")?;
    let outcome = runner.damage(id, amount)?;
    if !outcome.dropped {
        return Ok(None);
    }
    Ok(runner
        .encounter()
        .get(id)
        .map(|combatant| format!("{} is down", combatant.name())))
}

fn heal_flow<C: Console + ?Sized>(
    runner: &mut EncounterRunner,
    console: &mut C,
) -> Result<(), PlayError> {
    let targets: Vec<_> = runner.encounter().ids().collect();
    let prompt = "Heal whom? (b to go back): ";
    let Some(id) = select_combatant(runner, console, &targets, prompt)? else {
        return Ok(());
    };

    let amount = prompt_amount(console, "Healing amount: ")?;
    runner.heal(id, amount)?;
    Ok(())
}

fn add_effect_flow<C: Console + ?Sized>(
    runner: &mut EncounterRunner,
    console: &mut C,
) -> Result<(), PlayError> {
    let name = prompt_until(console, "Effect name (b to go back): ", |line| match line {
        "" => Err("Try again".to_string()),
        "b" => Ok(None),
        name => Ok(Some(name.to_string())),
    })?;
    let Some(name) = name else {
        return Ok(());
    };

    let duration = prompt_until(console, "Duration in turns (blank for indefinite): ", |line| {
        if line.is_empty() {
            return Ok(None);
        }
        line.parse::<u32>().map(Some).map_err(|_| "Try again".to_string())
    })?;
    let effect = match duration {
        Some(turns) => Effect::with_duration(name, turns),
        None => Effect::indefinite(name),
    };

    let roster: Vec<_> = runner.encounter().ids().collect();
    console.write_line("")?;
    write_lines(console, &numbered(runner.encounter().iter().map(|(_, c)| c)))?;
    let choice = prompt_until(
        console,
        &format!("Apply {effect} to (comma-separated numbers, b to go back): "),
        |line| parse_choices(line, roster.len()),
    )?;

    if let Choice::Pick(indices) = choice {
        let targets: Vec<_> = indices.into_iter().map(|i| roster[i]).collect();
        runner.add_effect(&targets, &effect)?;
    }
    Ok(())
}

fn remove_effect_flow<C: Console + ?Sized>(
    runner: &mut EncounterRunner,
    console: &mut C,
) -> Result<Option<String>, PlayError> {
    let entries = runner.effect_entries();
    if entries.is_empty() {
        return Ok(Some("No active effects".to_string()));
    }

    console.write_line("")?;
    for (i, entry) in entries.iter().enumerate() {
        let owner = runner
            .encounter()
            .get(entry.combatant)
            .map(describe)
            .unwrap_or_default();
        console.write_line(&format!("{}. {}: {}", i + 1, entry.effect, owner))?;
    }

    let choice = prompt_until(
        console,
        "Remove which effects? (comma-separated numbers, b to go back): ",
        |line| parse_choices(line, entries.len()),
    )?;

    if let Choice::Pick(indices) = choice {
        let selected: Vec<_> = indices.into_iter().map(|i| entries[i].clone()).collect();
        runner.remove_effects(&selected)?;
    }
    Ok(None)
}
