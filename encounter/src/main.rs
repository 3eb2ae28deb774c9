//! Console initiative tracker.
//!
//! Rolls initiative for the party and any monsters entered at startup, then
//! runs the turn loop until `q`.
//!
//! ```bash
//! cargo run -p encounter
//! cargo run -p encounter -- --initiative-order
//! RUST_LOG=encounter_core=debug cargo run -p encounter 2> encounter.log
//! ```

use encounter_core::{run_encounter, EncounterConfig, RoundOrder, StdConsole};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never mix with the menu
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let mut config = EncounterConfig::default();
    if args.iter().any(|a| a == "--initiative-order") {
        config = config.with_round_order(RoundOrder::ByInitiative);
    }

    let mut console = StdConsole::new();
    let mut rng = rand::thread_rng();

    match run_encounter(&config, &mut console, &mut rng) {
        Ok(runner) => {
            tracing::info!(round = runner.round(), "Encounter ended");
            Ok(())
        }
        Err(e) if e.is_input_closed() => {
            println!();
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_help() {
    println!("encounter - initiative tracker for tabletop combat");
    println!();
    println!("USAGE:");
    println!("  encounter [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help            Show this help message");
    println!("  --initiative-order    Order every round by initiative (default: party first)");
    println!();
    println!("TURN COMMANDS:");
    println!("  <number>   Mark that combatant's turn as done");
    println!("  s          Skip to the next round");
    println!("  d          Damage a combatant");
    println!("  h          Heal a combatant");
    println!("  e          Add an effect");
    println!("  r          Remove effects");
    println!("  q          Quit");
}
