//! Testing utilities for encounters.
//!
//! - `ScriptedConsole` for deterministic operator input without a terminal
//! - Roster fixtures with fixed initiative so turn order is predictable

use crate::console::{Console, ConsoleError};
use crate::world::{Combatant, Encounter, HitPoints};
use std::collections::VecDeque;

/// A console that replays scripted operator input.
///
/// Every prompt and printed line is captured so tests can assert on what
/// the operator would have seen. When the script runs out, reads fail with
/// [`ConsoleError::InputClosed`].
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    /// Lines still to be "typed".
    input: VecDeque<String>,
    /// Prompts shown, in order.
    prompts: Vec<String>,
    /// Lines written, in order.
    output: Vec<String>,
    /// Number of screen clears requested.
    clears: usize,
    /// Length of `output` at the most recent clear.
    last_clear_at: usize,
}

impl ScriptedConsole {
    pub fn new<I, S>(input: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: input.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn clears(&self) -> usize {
        self.clears
    }

    /// Whether every scripted line was consumed.
    pub fn is_exhausted(&self) -> bool {
        self.input.is_empty()
    }

    /// Count output lines containing `needle`.
    pub fn count_output(&self, needle: &str) -> usize {
        self.output.iter().filter(|line| line.contains(needle)).count()
    }

    /// Output written since the most recent screen clear.
    pub fn last_screen(&self) -> &[String] {
        &self.output[self.last_clear_at..]
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        self.prompts.push(prompt.to_string());
        self.input
            .pop_front()
            .ok_or_else(|| ConsoleError::InputClosed(prompt.trim().to_string()))
    }

    fn write_line(&mut self, line: &str) -> Result<(), ConsoleError> {
        self.output.push(line.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ConsoleError> {
        self.clears += 1;
        self.last_clear_at = self.output.len();
        Ok(())
    }
}

/// A combatant with a fixed initiative and full hit points (0 = untracked).
pub fn combatant(name: &str, initiative: i32, max_hp: u32) -> Combatant {
    Combatant::new(name, initiative, HitPoints::new(max_hp))
}

/// Two heroes and two goblins with distinct, known initiatives.
///
/// Roster order: Aria (15, untracked), Bram (8, 12 HP),
/// Goblin (Red) (11, 7 HP), Goblin (Blue) (3, 7 HP).
/// Initiative order: Aria, Goblin (Red), Bram, Goblin (Blue).
pub fn skirmish() -> Encounter {
    Encounter::new(
        vec![combatant("Aria", 15, 0), combatant("Bram", 8, 12)],
        vec![combatant("Goblin (Red)", 11, 7), combatant("Goblin (Blue)", 3, 7)],
    )
}
