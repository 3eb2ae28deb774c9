//! Turn menu: command parsing and rendering.
//!
//! Each turn the operator sees the round's progress and picks a command.
//! [`CommandMenu`] maps the raw line onto a [`TurnCommand`], accepting
//! exactly the turn numbers that are currently pending plus the fixed letter
//! commands. Anything else is "no match" and the prompt repeats.

use crate::runner::EncounterRunner;
use crate::world::Combatant;

pub const DONE_MARKER: &str = "\u{2713}";
pub const DOWN_MARKER: &str = "\u{2717}";

/// The turn-prompt text.
pub const TURN_PROMPT: &str = "Select number to take turn, (s)kip, (d)amage, (h)eal, \
    add (e)ffect, (r)emove effect, or (q)uit: ";

/// A command chosen at the turn prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnCommand {
    /// Zero-based index into the pending queue.
    TakeTurn(usize),
    Skip,
    Quit,
    Damage,
    Heal,
    AddEffect,
    RemoveEffect,
}

/// The commands valid for one prompt.
#[derive(Debug, Clone, Copy)]
pub struct CommandMenu {
    pending: usize,
}

impl CommandMenu {
    pub fn new(pending: usize) -> Self {
        Self { pending }
    }

    /// Match one line of input. Turn numbers are one-based.
    pub fn parse(&self, input: &str) -> Option<TurnCommand> {
        let input = input.trim();
        match input.to_ascii_lowercase().as_str() {
            "s" => Some(TurnCommand::Skip),
            "q" => Some(TurnCommand::Quit),
            "d" => Some(TurnCommand::Damage),
            "h" => Some(TurnCommand::Heal),
            "e" => Some(TurnCommand::AddEffect),
            "r" => Some(TurnCommand::RemoveEffect),
            _ => match input.parse::<usize>() {
                Ok(n) if (1..=self.pending).contains(&n) => Some(TurnCommand::TakeTurn(n - 1)),
                _ => None,
            },
        }
    }
}

/// Answer to a selection prompt inside a sub-flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice<T> {
    Back,
    Pick(T),
}

fn is_back(input: &str) -> bool {
    matches!(input.trim().to_ascii_lowercase().as_str(), "b" | "back")
}

fn parse_index(part: &str, len: usize) -> Option<usize> {
    match part.trim().parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Some(n - 1),
        _ => None,
    }
}

/// Parse a single one-based selection out of `len` options.
pub fn parse_choice(input: &str, len: usize) -> Result<Choice<usize>, String> {
    if is_back(input) {
        return Ok(Choice::Back);
    }
    parse_index(input, len)
        .map(Choice::Pick)
        .ok_or_else(|| "Try again".to_string())
}

/// Parse a comma-separated list of one-based selections.
///
/// Returns zero-based indices in the order given, without duplicates. Any
/// bad entry rejects the whole line.
pub fn parse_index_list(input: &str, len: usize) -> Result<Vec<usize>, String> {
    let mut indices = Vec::new();
    for part in input.split(',') {
        let index = parse_index(part, len)
            .ok_or_else(|| format!("Not a valid choice: {}", part.trim()))?;
        if !indices.contains(&index) {
            indices.push(index);
        }
    }
    Ok(indices)
}

/// Like [`parse_index_list`], but `b` goes back.
pub fn parse_choices(input: &str, len: usize) -> Result<Choice<Vec<usize>>, String> {
    if is_back(input) {
        return Ok(Choice::Back);
    }
    parse_index_list(input, len).map(Choice::Pick)
}

/// One-line summary: name, hit points when tracked, then effects.
pub fn describe(combatant: &Combatant) -> String {
    let mut line = combatant.name().to_string();
    if combatant.hit_points.is_tracked() {
        line.push_str(&format!(" ({})", combatant.hit_points));
    }

    let effects: Vec<String> = combatant.effects().map(|e| e.to_string()).collect();
    if !effects.is_empty() {
        line.push_str(&format!(" [{}]", effects.join(", ")));
    }
    line
}

/// Render the main menu shown before each turn prompt.
pub fn render_turn_menu(runner: &EncounterRunner) -> Vec<String> {
    let encounter = runner.encounter();
    let mut lines = vec![format!("Round {}", runner.round()), String::new()];

    for combatant in runner
        .acted()
        .iter()
        .filter_map(|&id| encounter.get(id))
        .filter(|c| !c.is_down())
    {
        lines.push(format!("{DONE_MARKER} {}", describe(combatant)));
    }
    lines.push(String::new());

    for (i, combatant) in runner
        .ordered()
        .iter()
        .filter_map(|&id| encounter.get(id))
        .enumerate()
    {
        lines.push(format!("{}. {}", i + 1, describe(combatant)));
    }

    let down: Vec<_> = encounter.iter().filter(|(_, c)| c.is_down()).collect();
    if !down.is_empty() {
        lines.push(String::new());
        for (_, combatant) in down {
            lines.push(format!("{DOWN_MARKER} {}", describe(combatant)));
        }
    }

    lines
}

/// Numbered list of combatants for a selection prompt.
pub fn numbered<'a>(combatants: impl Iterator<Item = &'a Combatant>) -> Vec<String> {
    combatants
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, describe(c)))
        .collect()
}
