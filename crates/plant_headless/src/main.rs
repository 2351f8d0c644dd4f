//! Headless plant runner binary.
//!
//! Runs the training-simulator plant without a front-end, controlled via
//! JSON on stdin/stdout. Designed for scripted drills, external
//! controllers, and CI determinism checks.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p plant_headless
//!
//! # Run a built-in or RON scenario
//! cargo run -p plant_headless -- run --scenario coolant_loss
//!
//! # Verify determinism across repeated runs
//! cargo run -p plant_headless -- verify --scenario full_power --runs 5
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plant_core::plant::Plant;
use plant_headless::{HeadlessConfig, HeadlessRunner, Scenario};

#[derive(Parser)]
#[command(name = "plant_headless")]
#[command(about = "Headless plant runner for training drills and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session, optionally seeded with a scenario script
    Run {
        /// Built-in scenario name or RON file to load
        #[arg(short, long)]
        scenario: Option<String>,

        /// Output state after every scripted tick
        #[arg(long)]
        auto_state: bool,
    },

    /// Verify determinism by running the same scenario multiple times
    Verify {
        /// Scenario to test
        #[arg(short, long, default_value = "full_power")]
        scenario: String,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logging goes to stderr; stdout is for the protocol.
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            auto_state,
        }) => {
            cmd_run(scenario, auto_state);
        }
        Some(Commands::Verify { scenario, runs }) => {
            cmd_verify(&scenario, runs);
        }
        None => {
            // Default: interactive mode
            cmd_run(None, false);
        }
    }
}

/// Run a single session
fn cmd_run(scenario: Option<String>, auto_state: bool) {
    tracing::info!("Starting headless session");

    let config = HeadlessConfig {
        auto_state_output: auto_state,
        scenario,
    };

    let runner = HeadlessRunner::with_config(config);
    if let Err(e) = runner.run() {
        eprintln!("Session failed: {e}");
        std::process::exit(1);
    }
}

/// Verify determinism
fn cmd_verify(scenario: &str, runs: u32) {
    tracing::info!(scenario = %scenario, runs = runs, "Verifying determinism");

    let scenario = match Scenario::resolve(scenario) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load scenario: {e}");
            std::process::exit(1);
        }
    };

    let mut hashes = Vec::new();
    for _ in 0..runs {
        let mut plant = Plant::new(scenario.plant.clone());
        for &inputs in &scenario.script {
            if let Err(e) = plant.step(inputs) {
                eprintln!("Scripted tick rejected: {e}");
                std::process::exit(1);
            }
        }
        hashes.push(plant.state_hash());
    }

    if hashes.windows(2).all(|w| w[0] == w[1]) {
        eprintln!("PASS: All {runs} runs produced identical results");
        if let Some(hash) = hashes.first() {
            eprintln!("State hash: {hash:016x}");
        }
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        for (i, hash) in hashes.iter().enumerate() {
            eprintln!("  Run {i}: {hash:016x}");
        }
        std::process::exit(1);
    }
}
