//! Line-based operator console.
//!
//! The encounter engine talks to the operator only through the [`Console`]
//! trait: whole lines in, whole lines out, and a screen clear between menus.
//! [`StdConsole`] is the terminal implementation; tests use
//! [`crate::testing::ScriptedConsole`].

use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Errors from the operator console.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Input closed while waiting for: {0}")]
    InputClosed(String),
}

/// Text I/O collaborator used by setup and the turn loop.
pub trait Console {
    /// Show `prompt` and block until a full line is available.
    ///
    /// The returned line has its trailing newline removed.
    fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError>;

    /// Print one line of output.
    fn write_line(&mut self, line: &str) -> Result<(), ConsoleError>;

    /// Clear the screen before redrawing a menu.
    fn clear(&mut self) -> Result<(), ConsoleError>;
}

/// Console backed by the process's stdin and stdout.
pub struct StdConsole {
    stdin: io::Stdin,
    stdout: io::Stdout,
}

impl StdConsole {
    pub fn new() -> Self {
        Self {
            stdin: io::stdin(),
            stdout: io::stdout(),
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for StdConsole {
    fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        write!(self.stdout, "{prompt}")?;
        self.stdout.flush()?;

        let mut line = String::new();
        if self.stdin.lock().read_line(&mut line)? == 0 {
            return Err(ConsoleError::InputClosed(prompt.trim().to_string()));
        }

        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(line)
    }

    fn write_line(&mut self, line: &str) -> Result<(), ConsoleError> {
        writeln!(self.stdout, "{line}")?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ConsoleError> {
        execute!(self.stdout, Clear(ClearType::All), MoveTo(0, 0))?;
        Ok(())
    }
}

/// Prompt until `parse` accepts the input.
///
/// A rejected line prints the returned message and asks again; there is no
/// retry limit.
pub fn prompt_until<C, T, F>(console: &mut C, prompt: &str, mut parse: F) -> Result<T, ConsoleError>
where
    C: Console + ?Sized,
    F: FnMut(&str) -> Result<T, String>,
{
    loop {
        let line = console.read_line(prompt)?;
        match parse(line.trim()) {
            Ok(value) => return Ok(value),
            Err(message) => console.write_line(&message)?,
        }
    }
}

/// Prompt for a non-negative whole number.
pub fn prompt_amount<C: Console + ?Sized>(
    console: &mut C,
    prompt: &str,
) -> Result<u32, ConsoleError> {
    prompt_until(console, prompt, |line| {
        line.parse::<u32>().map_err(|_| "Try again".to_string())
    })
}
