//! Initiative and turn-order engine for tabletop combat encounters.
//!
//! This crate provides:
//! - Initiative rolls for a fixed party and operator-declared monster groups
//! - A round-based turn tracker with damage, healing and timed effects
//! - A line-based operator loop over a pluggable [`Console`]
//!
//! # Quick Start
//!
//! ```no_run
//! use encounter_core::{run_encounter, EncounterConfig, StdConsole};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EncounterConfig::default();
//!     let mut console = StdConsole::new();
//!     let mut rng = rand::thread_rng();
//!
//!     let runner = run_encounter(&config, &mut console, &mut rng)?;
//!     println!("Encounter ended in round {}", runner.round());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod console;
pub mod dice;
pub mod menu;
pub mod play;
pub mod runner;
pub mod setup;
pub mod testing;
pub mod world;

// Primary public API
pub use config::{EncounterConfig, PartyMember, RoundOrder, DEFAULT_PALETTE};
pub use console::{Console, ConsoleError, StdConsole};
pub use dice::{roll_initiative, DieType, InitiativeRoll};
pub use menu::{CommandMenu, TurnCommand};
pub use play::{play, run_encounter, PlayError};
pub use runner::{EncounterRunner, RunnerError, TurnState};
pub use setup::{build_monster_group, EncounterSetup, SetupError};
pub use testing::ScriptedConsole;
pub use world::{Combatant, CombatantId, Effect, Encounter, HitPoints};
